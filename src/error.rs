// src/error.rs

//! Error taxonomy for the analysis engine.

use thiserror::Error;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while analyzing one axis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A channel is empty or too short for the requested operation
    #[error("Insufficient data in '{channel}': {reason}")]
    InsufficientData { channel: String, reason: String },

    /// Timestamps must be strictly increasing
    #[error("Time is not strictly increasing at sample {index}")]
    NonMonotonicTime { index: usize },

    /// A channel does not match the length of the time base
    #[error("Channel '{channel}' has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    /// Proportional gain cannot be used to derive the input signal
    #[error("Invalid P gain {gain} for axis '{axis}'")]
    InvalidGain { axis: String, gain: f64 },

    /// A histogram column has no mass; callers zero-fill it instead of dividing
    #[error("Histogram column {column} has zero maximum")]
    DegenerateHistogram { column: usize },

    /// Configuration values are out of range
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// A mandatory channel was not supplied by the log reader
    #[error("Missing channel: {0}")]
    MissingChannel(String),

    /// FFT planning or processing failed
    #[error("FFT error: {0}")]
    Fft(String),
}

impl AnalysisError {
    pub(crate) fn insufficient(channel: &str, reason: impl Into<String>) -> Self {
        AnalysisError::InsufficientData {
            channel: channel.to_string(),
            reason: reason.into(),
        }
    }
}

// src/error.rs
