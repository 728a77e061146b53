//! Error types for the wxcast library.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for rollout and verification operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while rolling out or scoring a forecast.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Length mismatch along a single axis.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Array shape mismatch.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Channel not present in the store or trajectory.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// Reduction method name not recognised.
    #[error("unknown error method '{0}': must be 'mse', 'mae', or 'rmse'")]
    UnknownMethod(String),

    /// Two-phase object used before `configure`.
    #[error("loss must be configured before evaluation")]
    NotConfigured,

    /// Ground truth needed by a strict rollout is absent from the store.
    #[error("missing data at {time}")]
    MissingData { time: DateTime<Utc> },

    /// The sequence predictor failed or returned malformed output.
    #[error("predictor failure: {0}")]
    PredictorFailure(String),
}
