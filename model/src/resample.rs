use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Point, Sample, TraceError, TraceProcessor};

/// Resampling refuses frequency pairs whose least common multiple is above this. Timestamps only
/// resolve nanoseconds, so a finer grid can't be told apart.
pub const MAX_GRID_HZ: u64 = 1_000_000_000;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// How to fill ticks of the intermediate grid that fall between two recorded samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Along the straight line between the two neighbours
    Linear,
    /// Copy the closer neighbour; the earlier one wins ties
    Nearest,
    /// Hold the last recorded value
    Previous,
    /// Take the next recorded value
    Next,
}

impl Interpolation {
    /// `offset` into a gap `gap` long between `from` and `to`, both in the same unit of time.
    fn fill(self, from: Point, to: Point, offset: i128, gap: i128) -> Point {
        if offset == 0 {
            return from;
        }
        match self {
            Interpolation::Linear => {
                let pct = offset as f64 / gap as f64;
                Point::new(
                    from.x + pct * (to.x - from.x),
                    from.y + pct * (to.y - from.y),
                )
            }
            Interpolation::Nearest => {
                if 2 * offset <= gap {
                    from
                } else {
                    to
                }
            }
            Interpolation::Previous => from,
            Interpolation::Next => to,
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Interpolation::Linear => "linear",
            Interpolation::Nearest => "nearest",
            Interpolation::Previous => "previous",
            Interpolation::Next => "next",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown interpolation method {0:?}; use linear, nearest, previous, or next")]
pub struct ParseInterpolationError(String);

impl FromStr for Interpolation {
    type Err = ParseInterpolationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Interpolation::Linear),
            "nearest" => Ok(Interpolation::Nearest),
            "previous" | "pad" | "ffill" => Ok(Interpolation::Previous),
            "next" | "bfill" => Ok(Interpolation::Next),
            _ => Err(ParseInterpolationError(s.to_string())),
        }
    }
}

impl TraceProcessor {
    /// Converts the trace to exactly `target_freq_hz`, in two stages. Conceptually every tick of
    /// a grid at the least common multiple of both frequencies, which represents both the source
    /// and target instants exactly, is filled from the recorded samples around it using
    /// `method`, and then every n-th tick of that grid is kept. Only the kept ticks are ever
    /// computed. Grid instants are counted from midnight of the first sample's day, and ticks
    /// are filled by the real time between samples, so samples don't need to sit on the grid.
    ///
    /// The output covers the target instants between the first and last sample. On any error,
    /// the trace is left unchanged.
    pub fn resample(
        &mut self,
        original_freq_hz: u32,
        target_freq_hz: u32,
        method: Interpolation,
    ) -> Result<(), TraceError> {
        let unsupported =
            |reason: String| TraceError::unsupported(original_freq_hz, target_freq_hz, reason);

        if original_freq_hz == 0 || target_freq_hz == 0 {
            return Err(unsupported("frequencies must be positive".to_string()));
        }
        let lcm = least_common_multiple(original_freq_hz, target_freq_hz);
        if lcm > MAX_GRID_HZ {
            return Err(unsupported(format!(
                "the {lcm} Hz grid is finer than the {MAX_GRID_HZ} Hz that timestamps resolve"
            )));
        }
        // How many fine ticks per target period
        let step = (lcm / u64::from(target_freq_hz)) as i128;
        let lcm = lcm as i128;

        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => {
                return Ok(());
            }
        };
        let anchor = first.date().and_time(NaiveTime::MIN);

        // Fine tick k sits at k * NANOS_PER_SECOND in these units, so comparisons stay exact
        let mut positions: Vec<i128> = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            let nanos = nanos_since(anchor, sample.time).ok_or_else(|| {
                unsupported(format!("{} is too far from {anchor}", sample.time))
            })?;
            positions.push(nanos * lcm);
        }

        let period = step * NANOS_PER_SECOND;
        let first_target = ceil_div(positions[0], period);
        let last_target = positions[positions.len() - 1] / period;
        if first_target > last_target {
            return Err(unsupported(format!(
                "the trace from {first} to {last} doesn't contain any {target_freq_hz} Hz instant"
            )));
        }

        debug!(
            "Resampling {} samples through a {lcm} Hz grid, keeping every {step}th tick",
            self.samples.len()
        );
        let mut samples = Vec::with_capacity((last_target - first_target + 1) as usize);
        // Index of the last recorded sample at or before the current tick
        let mut idx = 0;
        for j in first_target..=last_target {
            let tick = j * period;
            while idx + 1 < positions.len() && positions[idx + 1] <= tick {
                idx += 1;
            }
            let from = self.samples[idx].pos;
            let pos = match self.samples.get(idx + 1) {
                Some(next) => method.fill(
                    from,
                    next.pos,
                    tick - positions[idx],
                    positions[idx + 1] - positions[idx],
                ),
                None => from,
            };
            let nanos = round_div(j * NANOS_PER_SECOND, i128::from(target_freq_hz));
            samples.push(Sample {
                time: anchor + Duration::nanoseconds(nanos as i64),
                pos,
            });
        }
        debug!(
            "Resampled {} samples into {} at {target_freq_hz} Hz",
            self.samples.len(),
            samples.len()
        );
        self.samples = samples;
        Ok(())
    }
}

fn least_common_multiple(a: u32, b: u32) -> u64 {
    // Two u32s multiplied always fit in a u64
    u64::from(a) * u64::from(b) / greatest_common_divisor(u64::from(a), u64::from(b))
}

fn greatest_common_divisor(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

fn nanos_since(anchor: NaiveDateTime, time: NaiveDateTime) -> Option<i128> {
    (time - anchor).num_nanoseconds().map(i128::from)
}

// Both of these assume non-negative numerators and positive denominators
fn round_div(n: i128, d: i128) -> i128 {
    (n + d / 2) / d
}

fn ceil_div(n: i128, d: i128) -> i128 {
    (n + d - 1) / d
}
