//! Error types shared across Scholar crates.

use thiserror::Error;

/// Result type alias using the Scholar error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for configuration and external service failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing credential (API key, token)
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// External service error
    #[error("External service error: {0}")]
    External(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Check if this is a missing-credential error.
    pub const fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }

    /// Check if this error is worth retrying (transient external failure).
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::External(_) | Self::Timeout)
    }
}
