// Error type shared by every grid in this crate.
//
// All variants are fatal at the call site: nothing in the crate catches a
// `GridError` and retries. Recoverable conditions (mismatched durations,
// negative frequencies) are logged instead and never reach this enum.

use thiserror::Error;

/// Failures raised while building or querying a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// A generator was asked for a size it cannot produce.
    #[error("invalid size {size}: {reason}")]
    InvalidSize { size: usize, reason: &'static str },

    /// A step, ratio, tempo or subdivision that must be positive was not.
    #[error("invalid step {step}: {reason}")]
    InvalidStep { step: f64, reason: &'static str },

    /// A lower bound exceeded its upper bound.
    #[error("invalid range: low {low} is greater than high {high}")]
    InvalidRange { low: f64, high: f64 },

    /// A duration was negative or not a number.
    #[error("invalid duration {0}")]
    InvalidDuration(f64),

    #[error("cannot quantise: the grid is empty")]
    EmptyGrid,

    /// The query value has no ordering against the grid's elements.
    #[error("value {0} is not comparable with the grid's elements")]
    NotComparable(String),

    #[error("unknown subdivision {0}")]
    UnknownSubdivision(u32),

    #[error("unknown scale '{0}'")]
    UnknownScale(String),

    #[error("unknown tuning system '{0}'")]
    UnknownTuningSystem(String),

    #[error("cannot parse note name '{0}'")]
    InvalidNoteName(String),

    /// A time grid was requested without any duration.
    #[error("a time grid needs a duration in seconds or in beats")]
    MissingDuration,
}
