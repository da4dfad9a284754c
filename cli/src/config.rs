use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use model::{Interpolation, Point, TraceError, TraceProcessor};

/// Everything one run needs to know. Nothing is read from global state; paths are relative to the
/// working directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delimited text with a timestamp column and x, y columns
    pub trace_path: Option<String>,
    pub separator: char,
    /// If None, timestamps are in the first column
    pub time_column: Option<String>,
    pub points: PointsSource,
    /// Plots, reports, and generated points go here
    pub reports_dir: String,
    pub plot_filename: Option<String>,
    pub report_filename: Option<String>,
    /// Applied to the trace in this order
    pub steps: Vec<Step>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace_path: None,
            separator: '\t',
            time_column: None,
            points: PointsSource::None,
            reports_dir: "reports".to_string(),
            plot_filename: Some("new_plot.geojson".to_string()),
            report_filename: None,
            steps: vec![
                Step::Resample {
                    original_freq_hz: 50,
                    target_freq_hz: 20,
                    method: Interpolation::Linear,
                },
                Step::Scale { factor: 10.0 },
                Step::Translate { dx: 5.0, dy: 0.0 },
            ],
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs_err::read_to_string(path)?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn reports_path(&self, filename: &str) -> PathBuf {
        Path::new(&self.reports_dir).join(filename)
    }

    /// Replaces the first step of the same kind, or appends if there's none.
    pub fn set_step(&mut self, step: Step) {
        match self
            .steps
            .iter_mut()
            .find(|s| std::mem::discriminant(&**s) == std::mem::discriminant(&step))
        {
            Some(existing) => {
                *existing = step;
            }
            None => {
                self.steps.push(step);
            }
        }
    }

    pub fn resample_step(&self) -> Option<Step> {
        self.steps
            .iter()
            .find(|s| matches!(s, Step::Resample { .. }))
            .cloned()
    }

    pub fn remove_resampling(&mut self) {
        self.steps.retain(|s| !matches!(s, Step::Resample { .. }));
    }
}

/// Where reference points come from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PointsSource {
    None,
    File {
        path: String,
        separator: char,
    },
    /// Points on the curve `r(t) = radius + cos(t)`, optionally saved into the reports directory
    Generated {
        count: usize,
        radius: f64,
        save_as: Option<String>,
    },
}

impl PointsSource {
    pub fn load(&self, config: &Config) -> Result<Option<Vec<Point>>> {
        match self {
            PointsSource::None => Ok(None),
            PointsSource::File { path, separator } => {
                let points = loader::load_points_file(path, delimiter(*separator)?)
                    .with_context(|| format!("loading reference points {path}"))?;
                Ok(Some(points))
            }
            PointsSource::Generated {
                count,
                radius,
                save_as,
            } => {
                let points = loader::generate_points(*count, *radius);
                if let Some(filename) = save_as {
                    fs_err::create_dir_all(&config.reports_dir)?;
                    loader::save_points_file(config.reports_path(filename), &points)?;
                }
                Ok(Some(points))
            }
        }
    }
}

/// One transformation of the trace
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Resample {
        original_freq_hz: u32,
        target_freq_hz: u32,
        method: Interpolation,
    },
    Scale {
        factor: f64,
    },
    Translate {
        dx: f64,
        dy: f64,
    },
}

impl Step {
    pub fn apply(&self, trace: &mut TraceProcessor) -> Result<(), TraceError> {
        match self {
            Step::Resample {
                original_freq_hz,
                target_freq_hz,
                method,
            } => trace.resample(*original_freq_hz, *target_freq_hz, *method)?,
            Step::Scale { factor } => trace.scale(*factor),
            Step::Translate { dx, dy } => trace.translate(Point::new(*dx, *dy)),
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Step::Resample {
                original_freq_hz,
                target_freq_hz,
                method,
            } => write!(
                f,
                "resample from {original_freq_hz} Hz to {target_freq_hz} Hz ({method})"
            ),
            Step::Scale { factor } => write!(f, "scale by {factor}"),
            Step::Translate { dx, dy } => write!(f, "translate by ({dx}, {dy})"),
        }
    }
}

/// The csv crate wants a single byte
pub fn delimiter(separator: char) -> Result<u8> {
    if !separator.is_ascii() {
        bail!("Separator {separator:?} must be a single ASCII character");
    }
    Ok(separator as u8)
}
