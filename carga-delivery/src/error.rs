//! Delivery error types.

use thiserror::Error;

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Errors surfaced by the delivery host or the URL registry.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A new window could not be opened.
    #[error("Popup blocked: the print window could not be opened")]
    PopupBlocked,

    /// Clipboard write was refused.
    #[error("Clipboard access denied")]
    ClipboardDenied,

    /// Native sharing is unavailable.
    #[error("Native share is not supported")]
    ShareUnsupported,

    /// The object URL was never created or is already revoked.
    #[error("Unknown object URL: {0}")]
    UnknownUrl(String),

    /// The window handle does not refer to an open window.
    #[error("Unknown window: {0}")]
    UnknownWindow(String),

    /// File system failure in a host.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
