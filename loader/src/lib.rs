//! Reads traces and reference points from delimited text, and makes up reference points when
//! there are none on disk.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod points;
mod trace;

pub use self::points::{
    generate_points, load_points, load_points_file, save_points, save_points_file,
    DEFAULT_CURVE_RADIUS,
};
pub use self::trace::{load_trace, load_trace_file, TraceFormat, TIMESTAMP_FORMAT};

// Adds the path in the error message
fn open(path: &std::path::Path) -> anyhow::Result<fs_err::File> {
    fs_err::File::open(path).map_err(|err| anyhow!("{}: {err}", path.display()))
}
