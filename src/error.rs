//! Error types for the voxshift crate.

use thiserror::Error;

/// Errors that can occur while shifting pitch.
///
/// Every variant carries a human-readable reason. The type is `Clone` so the
/// engine can keep the failure reason in its terminal state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShiftError {
    /// Empty buffer, zero sample rate, or non-finite samples.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Shift out of bounds, unknown algorithm, or FFT window larger than the buffer.
    #[error("unsupported parameters: {0}")]
    UnsupportedParameters(String),

    /// Non-finite values in intermediate spectra (strict mode only).
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Unreadable or unsupported audio container.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Malformed configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<std::io::Error> for ShiftError {
    fn from(err: std::io::Error) -> Self {
        ShiftError::Io(err.to_string())
    }
}

impl From<hound::Error> for ShiftError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => ShiftError::Io(e.to_string()),
            other => ShiftError::InvalidFormat(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for ShiftError {
    fn from(err: toml::de::Error) -> Self {
        ShiftError::Config(err.to_string())
    }
}
