//! Error types for the compliance engine.

use thiserror::Error;

/// Result type alias for compliance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for compliance operations
#[derive(Debug, Error)]
pub enum Error {
    /// Absent record where a placeholder is not applicable
    #[error("Not found: {0}")]
    NotFound(String),

    /// Processing purpose outside the fixed purpose set
    #[error("Invalid purpose: {0}")]
    InvalidPurpose(String),

    /// Underlying store unavailable
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Malformed caller input
    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Short machine-readable kind, used in structured responses and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidPurpose(_) => "invalid_purpose",
            Error::StorageFailure(_) => "storage_failure",
            Error::ValidationFailure(_) => "validation_failure",
            Error::Config(_) => "config",
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Reject empty or whitespace-only subject identifiers
pub(crate) fn ensure_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::ValidationFailure(
            "user_id must not be empty".to_string(),
        ));
    }
    Ok(())
}
