#[macro_use]
extern crate log;

mod error;
mod resample;
mod stats;
mod trace;

pub use self::error::TraceError;
pub use self::resample::{Interpolation, ParseInterpolationError, MAX_GRID_HZ};
pub use self::trace::{Point, Sample, TraceProcessor};
