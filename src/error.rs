//! Crate-wide error type.
//!
//! Every failure mode is a dedicated variant so callers can match on the
//! kind instead of parsing messages. All failures are synchronous: they
//! surface at the call that detects them and nothing is retried
//! internally.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Binomial coefficient requested with `k > n`.
    #[error("invalid binomial coefficient C({n},{k}): k must not exceed n")]
    InvalidCoefficients { n: usize, k: usize },

    /// The simplex minimizer was handed a zero-length start vector.
    #[error("initial coefficient vector must not be empty")]
    InvalidInitialVector,

    /// A bounds box where some `min` exceeds the matching `max`, or the
    /// two corner vectors disagree on length.
    #[error("invalid search bounds: {reason}")]
    InvalidBounds { reason: &'static str },

    /// A reference dataset name outside the known set.
    #[error("unknown calibration dataset: {0:?}")]
    UnknownCalibrationData(String),

    /// A solution was requested from a job that never produced a
    /// feasible result.
    #[error("no feasible solution found")]
    NoSolutionFound,

    /// `stop()` was called on a job that was never started.
    #[error("cannot stop a job that was never started")]
    InvalidThread,
}
