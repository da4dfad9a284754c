fn main() {
    cli::main();
}
