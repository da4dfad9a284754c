use std::fmt;
use std::path::Path;

use abstutil::prettyprint_usize;
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use model::{Point, TraceError, TraceProcessor};

/// Summary statistics of one trace
#[derive(Debug, Serialize)]
pub struct Report {
    pub samples: usize,
    pub centroid: Point,
    pub mean_speed: Option<f64>,
    pub velocity: Vec<Velocity>,
    /// Same order as the reference points. None if there weren't any.
    pub distances: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct Velocity {
    pub time: NaiveDateTime,
    // None for the first sample
    pub speed: Option<f64>,
}

impl Report {
    pub fn new(trace: &TraceProcessor, points: Option<&[Point]>) -> Result<Self, TraceError> {
        let centroid = trace.centroid()?;
        let distances = points.map(|pts| trace.distances_to(pts)).transpose()?;
        let velocity = trace
            .samples()
            .iter()
            .zip(trace.velocity())
            .map(|(sample, speed)| Velocity {
                time: sample.time,
                speed,
            })
            .collect();
        Ok(Self {
            samples: trace.len(),
            centroid,
            mean_speed: trace.mean_speed(),
            velocity,
            distances,
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs_err::create_dir_all(dir)?;
        }
        fs_err::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Wrote report to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Trace statistics:")?;
        writeln!(
            f,
            " 1. CENTER OF MASS: ({}, {}),",
            self.centroid.x, self.centroid.y
        )?;
        match self.mean_speed {
            Some(speed) => writeln!(
                f,
                " 2. MEAN VELOCITY: {speed} over {} samples,",
                prettyprint_usize(self.samples)
            )?,
            None => writeln!(
                f,
                " 2. MEAN VELOCITY: undefined for {} sample(s),",
                self.samples
            )?,
        }
        match self.distances {
            Some(ref distances) => write!(f, " 3. DISTANCES: {:?},", distances),
            None => write!(f, " 3. DISTANCES: no reference points,"),
        }
    }
}
