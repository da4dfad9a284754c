use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::TraceError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: NaiveDateTime,
    pub pos: Point,
}

impl Sample {
    pub fn new(time: NaiveDateTime, x: f64, y: f64) -> Self {
        Self {
            time,
            pos: Point::new(x, y),
        }
    }
}

/// Owns one recorded trace. Every transform mutates the samples in place, and every statistic is
/// calculated from whatever the samples currently are.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceProcessor {
    // Time strictly increases, and both coordinates are always finite
    pub(crate) samples: Vec<Sample>,
}

impl TraceProcessor {
    /// The input must already be in time order; it's validated, never sorted. No samples at all
    /// is fine.
    pub fn new(raw: Vec<Sample>) -> Result<Self, TraceError> {
        for (idx, sample) in raw.iter().enumerate() {
            if !sample.pos.x.is_finite() || !sample.pos.y.is_finite() {
                return Err(TraceError::malformed(format!(
                    "sample {idx} at {} has a missing coordinate: ({}, {})",
                    sample.time, sample.pos.x, sample.pos.y
                )));
            }
        }
        for (idx, pair) in raw.windows(2).enumerate() {
            if pair[0].time >= pair[1].time {
                return Err(TraceError::malformed(format!(
                    "timestamps must strictly increase, but sample {} is {} and then {}",
                    idx + 1,
                    pair[0].time,
                    pair[1].time
                )));
            }
        }
        Ok(Self { samples: raw })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(|s| s.time)
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.time)
    }

    /// Multiplies both coordinates of every sample. Zero collapses the trace onto the origin and
    /// a negative factor mirrors it.
    pub fn scale(&mut self, factor: f64) {
        for sample in &mut self.samples {
            sample.pos.x *= factor;
            sample.pos.y *= factor;
        }
    }

    /// Moves the reference frame, subtracting the displacement from each axis independently.
    pub fn translate(&mut self, displacement: Point) {
        for sample in &mut self.samples {
            sample.pos.x -= displacement.x;
            sample.pos.y -= displacement.y;
        }
    }
}
