#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
pub mod plot;
pub mod report;

use abstutil::Timer;
use anyhow::{Context, Result};
use structopt::StructOpt;

use loader::TraceFormat;
use model::{Interpolation, TraceError};

use self::config::delimiter;
pub use self::config::{Config, PointsSource, Step};
use self::report::Report;

#[derive(StructOpt)]
#[structopt(about = "Resamples a recorded trace and summarizes its velocity and center of mass")]
struct Args {
    /// A JSON config file. Any other flags override what's in it.
    #[structopt(long)]
    config: Option<String>,
    /// The path to a delimited trace file, with a timestamp column and x, y columns
    #[structopt(long)]
    trace: Option<String>,
    /// The delimiter of the trace file
    #[structopt(long)]
    separator: Option<char>,
    /// The timestamp column of the trace file, if it isn't the first
    #[structopt(long)]
    time_column: Option<String>,
    /// The path to a delimited file with x, y reference points
    #[structopt(long)]
    points: Option<String>,
    /// The delimiter of the reference points file
    #[structopt(long, default_value = ",")]
    points_separator: char,
    /// Instead of loading reference points, generate this many
    #[structopt(long)]
    generate_points: Option<usize>,
    /// Where to write plots, reports, and generated points
    #[structopt(long)]
    reports_dir: Option<String>,
    /// The filename of the GeoJSON plot, written in the reports directory
    #[structopt(long)]
    plot: Option<String>,
    /// Don't write a plot
    #[structopt(long)]
    no_plot: bool,
    /// Also write the report as JSON in the reports directory
    #[structopt(long)]
    report: Option<String>,
    /// The sampling frequency of the input
    #[structopt(long)]
    original_freq: Option<u32>,
    /// The sampling frequency to resample to
    #[structopt(long)]
    target_freq: Option<u32>,
    /// linear, nearest, previous, or next
    #[structopt(long)]
    method: Option<Interpolation>,
    /// Keep the original sampling
    #[structopt(long)]
    no_resample: bool,
    /// Multiply all coordinates by this
    #[structopt(long, allow_hyphen_values = true)]
    scale: Option<f64>,
    /// Subtract this from every x
    #[structopt(long, allow_hyphen_values = true)]
    translate_x: Option<f64>,
    /// Subtract this from every y
    #[structopt(long, allow_hyphen_values = true)]
    translate_y: Option<f64>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(path) = self.trace {
            config.trace_path = Some(path);
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if self.time_column.is_some() {
            config.time_column = self.time_column;
        }
        match (self.points, self.generate_points) {
            (Some(_), Some(_)) => {
                bail!("Specify only one of --points and --generate-points");
            }
            (Some(path), None) => {
                config.points = PointsSource::File {
                    path,
                    separator: self.points_separator,
                };
            }
            (None, Some(count)) => {
                config.points = PointsSource::Generated {
                    count,
                    radius: loader::DEFAULT_CURVE_RADIUS,
                    save_as: Some("predefined_points.csv".to_string()),
                };
            }
            (None, None) => {}
        }
        if let Some(dir) = self.reports_dir {
            config.reports_dir = dir;
        }
        if self.no_plot {
            if self.plot.is_some() {
                bail!("Specify only one of --plot and --no-plot");
            }
            config.plot_filename = None;
        } else if self.plot.is_some() {
            config.plot_filename = self.plot;
        }
        if self.report.is_some() {
            config.report_filename = self.report;
        }

        if self.no_resample {
            if self.original_freq.is_some() || self.target_freq.is_some() || self.method.is_some()
            {
                bail!("--no-resample can't be combined with resampling flags");
            }
            config.remove_resampling();
        } else if self.original_freq.is_some()
            || self.target_freq.is_some()
            || self.method.is_some()
        {
            let (original, target, method) = match config.resample_step() {
                Some(Step::Resample {
                    original_freq_hz,
                    target_freq_hz,
                    method,
                }) => (original_freq_hz, target_freq_hz, method),
                _ => (50, 20, Interpolation::Linear),
            };
            config.set_step(Step::Resample {
                original_freq_hz: self.original_freq.unwrap_or(original),
                target_freq_hz: self.target_freq.unwrap_or(target),
                method: self.method.unwrap_or(method),
            });
        }
        if let Some(factor) = self.scale {
            config.set_step(Step::Scale { factor });
        }
        if self.translate_x.is_some() || self.translate_y.is_some() {
            let (dx, dy) = config
                .steps
                .iter()
                .find_map(|step| match step {
                    Step::Translate { dx, dy } => Some((*dx, *dy)),
                    _ => None,
                })
                .unwrap_or((0.0, 0.0));
            config.set_step(Step::Translate {
                dx: self.translate_x.unwrap_or(dx),
                dy: self.translate_y.unwrap_or(dy),
            });
        }
        Ok(config)
    }
}

/// Loads the trace, applies every step in order, and summarizes the result. Writes the plot and
/// JSON report if the config asks for them. Stops at the first error; no partial statistics.
pub fn run(config: &Config, timer: &mut Timer) -> Result<Report> {
    let trace_path = match config.trace_path {
        Some(ref path) => path,
        None => bail!("No trace file specified; pass --trace or set trace_path in the config"),
    };
    let format = TraceFormat {
        delimiter: delimiter(config.separator)?,
        time_column: config.time_column.clone(),
    };

    timer.start("load trace");
    let loaded = loader::load_trace_file(trace_path, &format);
    timer.stop("load trace");
    let mut trace = loaded.with_context(|| format!("loading trace {trace_path}"))?;

    timer.start("transform trace");
    for step in &config.steps {
        if let Err(err) = step.apply(&mut trace) {
            timer.stop("transform trace");
            return Err(err).with_context(|| format!("trying to {step}"));
        }
        debug!("After {step}: {} samples", trace.len());
    }
    timer.stop("transform trace");

    let points = config.points.load(config)?;
    let report = Report::new(&trace, points.as_deref()).context("computing statistics")?;
    info!(
        "Centroid of {} samples is ({}, {})",
        trace.len(),
        report.centroid.x,
        report.centroid.y
    );

    if let Some(ref filename) = config.plot_filename {
        let plot = plot::render(&trace, report.centroid, points.as_deref());
        plot::write_plot(&config.reports_path(filename), &plot)?;
    }
    if let Some(ref filename) = config.report_filename {
        report.write_json(&config.reports_path(filename))?;
    }
    Ok(report)
}

/// Names the kind of failure, then the chain of what was being attempted.
fn describe_failure(err: &anyhow::Error) -> String {
    let kind = match err.downcast_ref::<TraceError>() {
        Some(TraceError::MalformedInput { .. }) => "Malformed input",
        Some(TraceError::UnsupportedFrequency { .. }) => "Unsupported frequency",
        Some(TraceError::EmptyTrace) => "Empty trace",
        None => "Error",
    };
    format!("{kind}: {err:#}")
}

pub fn main() {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    let result = args.into_config().and_then(|config| {
        let mut timer = Timer::new("trace statistics");
        run(&config, &mut timer)
    });
    match result {
        Ok(report) => {
            println!("{report}");
        }
        Err(err) => {
            error!("{}", describe_failure(&err));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use approx::assert_abs_diff_eq;

    use super::*;

    const DIAGONAL: &str = "\
time;x;y;
2018-01-01 00:00:01.000;1.0;-1.0;
2018-01-01 00:00:02.000;2.0;-2.0;
2018-01-01 00:00:03.000;3.0;-3.0;
2018-01-01 00:00:04.000;4.0;-4.0;
";

    fn args(flags: &[&str]) -> Args {
        Args::from_iter_safe(std::iter::once("trace-stats").chain(flags.iter().copied())).unwrap()
    }

    fn fixture(dir: &Path) -> Config {
        let trace_path = dir.join("trace.csv");
        let points_path = dir.join("points.csv");
        std::fs::write(&trace_path, DIAGONAL).unwrap();
        std::fs::write(&points_path, ";x;y\n0;1;1\n1;2;2\n2;3;3\n3;4;4\n").unwrap();
        Config {
            trace_path: Some(trace_path.display().to_string()),
            separator: ';',
            points: PointsSource::File {
                path: points_path.display().to_string(),
                separator: ';',
            },
            reports_dir: dir.join("reports").display().to_string(),
            report_filename: Some("report.json".to_string()),
            steps: Vec::new(),
            ..Default::default()
        }
    }

    #[test]
    fn flags_override_defaults() {
        let config = args(&[
            "--trace",
            "data.csv",
            "--separator",
            ";",
            "--target-freq",
            "25",
            "--scale",
            "-2",
            "--translate-y",
            "-1.5",
            "--no-plot",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.trace_path, Some("data.csv".to_string()));
        assert_eq!(config.separator, ';');
        assert_eq!(config.plot_filename, None);
        assert_eq!(
            config.steps,
            vec![
                Step::Resample {
                    original_freq_hz: 50,
                    target_freq_hz: 25,
                    method: Interpolation::Linear,
                },
                Step::Scale { factor: -2.0 },
                Step::Translate { dx: 5.0, dy: -1.5 },
            ]
        );
    }

    #[test]
    fn conflicting_flags() {
        assert!(args(&["--points", "p.csv", "--generate-points", "10"])
            .into_config()
            .is_err());
        assert!(args(&["--no-resample", "--method", "nearest"])
            .into_config()
            .is_err());
        assert!(args(&["--plot", "a.geojson", "--no-plot"])
            .into_config()
            .is_err());
    }

    #[test]
    fn no_resample_and_generated_points() {
        let config = args(&["--no-resample", "--generate-points", "20"])
            .into_config()
            .unwrap();
        assert_eq!(config.resample_step(), None);
        assert!(matches!(
            config.points,
            PointsSource::Generated { count: 20, .. }
        ));
    }

    #[test]
    fn end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let report = run(&config, &mut Timer::throwaway()).unwrap();

        assert_abs_diff_eq!(report.centroid.x, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(report.centroid.y, -2.5, epsilon = 1e-9);
        assert_eq!(report.velocity[0].speed, None);
        assert_abs_diff_eq!(report.mean_speed.unwrap(), 2.0_f64.sqrt(), epsilon = 1e-9);
        let distances = report.distances.unwrap();
        for (actual, expected) in distances.iter().zip([3.80788, 4.52769, 5.52268, 6.67083]) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-5);
        }

        assert!(config.reports_path("new_plot.geojson").exists());
        assert!(config.reports_path("report.json").exists());
    }

    #[test]
    fn steps_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixture(dir.path());
        config.plot_filename = None;
        config.steps = vec![
            Step::Resample {
                original_freq_hz: 1,
                target_freq_hz: 2,
                method: Interpolation::Linear,
            },
            Step::Translate { dx: 2.5, dy: -2.5 },
            Step::Scale { factor: 10.0 },
        ];
        let report = run(&config, &mut Timer::throwaway()).unwrap();
        assert_eq!(report.samples, 7);
        assert_abs_diff_eq!(report.centroid.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.centroid.y, 0.0, epsilon = 1e-9);
        // Half a second between samples, 10x the distance
        assert_abs_diff_eq!(
            report.velocity[1].speed.unwrap(),
            10.0 * 2.0_f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn failures_name_their_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixture(dir.path());
        config.steps = vec![Step::Resample {
            original_freq_hz: 0,
            target_freq_hz: 20,
            method: Interpolation::Linear,
        }];
        let err = run(&config, &mut Timer::throwaway()).unwrap_err();
        let described = describe_failure(&err);
        assert!(described.starts_with("Unsupported frequency: trying to resample"));
        // Nothing partial was written
        assert!(!config.reports_path("report.json").exists());

        let mut config = fixture(dir.path());
        std::fs::write(
            config.trace_path.as_ref().unwrap(),
            "time;x;y\n2018-01-01 00:00:02;1;1\n2018-01-01 00:00:01;2;2\n",
        )
        .unwrap();
        config.report_filename = None;
        let err = run(&config, &mut Timer::throwaway()).unwrap_err();
        assert!(describe_failure(&err).starts_with("Malformed input: loading trace"));

        std::fs::write(config.trace_path.as_ref().unwrap(), "time;x;y\n").unwrap();
        let err = run(&config, &mut Timer::throwaway()).unwrap_err();
        assert!(describe_failure(&err).starts_with("Empty trace: computing statistics"));
    }
}
