//! Error types for Gatekeeper.

use thiserror::Error;

/// Common error type for Gatekeeper.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// I/O error while opening, reading or writing the credential file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The credential file is not a well-formed credential object.
    ///
    /// Raised for malformed JSON, bad identifiers, missing `hash`/`salt`
    /// fields, non-hex content or values of the wrong length.
    #[error("format error: {0}")]
    Format(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Logging could not be installed (usually because the host already
    /// installed a global subscriber).
    #[error("logging error: {0}")]
    Logging(String),
}

impl From<serde_json::Error> for GatekeeperError {
    fn from(e: serde_json::Error) -> Self {
        GatekeeperError::Format(e.to_string())
    }
}

/// Result type alias for Gatekeeper operations.
pub type Result<T> = std::result::Result<T, GatekeeperError>;
