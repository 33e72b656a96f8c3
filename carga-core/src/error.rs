//! Error types for core report operations.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while turning external records into report input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The platform has no usable platform number.
    #[error("Platform number is missing")]
    MissingPlatformNumber,

    /// A required field was absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field was present but could not be interpreted.
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        /// Field name as it appears in the external record.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The evidence service reported a failed upload.
    #[error("Evidence upload rejected: {0}")]
    UploadRejected(String),

    /// JSON decoding error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
