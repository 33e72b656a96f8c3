//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while producing an artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// CSV writer failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// PDF document construction or serialization failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// A PDF section could not be built.
    #[error("PDF section '{section}' failed: {reason}")]
    Section {
        /// Section name.
        section: &'static str,
        /// Failure description.
        reason: String,
    },

    /// Drawing surface or rasterization failure.
    #[error("Raster rendering failed: {0}")]
    Raster(String),

    /// Output could not be encoded.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}
