use thiserror::Error;

/// Everything that can go wrong while building or transforming a trace, or reading statistics
/// from it. Nothing here is retried; the caller gets the error as-is.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum TraceError {
    /// Input records failed parsing or validation. Construction never partially succeeds.
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Resampling was asked for with invalid or degenerate frequencies. The trace is unchanged.
    #[error("Can't resample from {original} Hz to {target} Hz: {reason}")]
    UnsupportedFrequency {
        original: u32,
        target: u32,
        reason: String,
    },

    /// A statistic that's undefined without samples was requested.
    #[error("The trace has no samples")]
    EmptyTrace,
}

impl TraceError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(original: u32, target: u32, reason: impl Into<String>) -> Self {
        Self::UnsupportedFrequency {
            original,
            target,
            reason: reason.into(),
        }
    }
}
