//! Error types for platform secret storage.

use serde::{Deserialize, Serialize};

/// Result type alias for secret storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during secret storage operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", content = "message")]
pub enum Error {
    /// Secure storage is not available on this platform/device.
    #[error("Secure storage not available: {0}")]
    NotAvailable(String),

    /// User failed to authenticate (wrong biometric, bad session, etc.)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Biometric enrollment changed since the secret was stored.
    /// The stored secret is no longer accessible and must be re-enrolled.
    #[error("Biometric enrollment changed - stored secret is now inaccessible")]
    EnrollmentChanged,

    /// No secret is stored under the requested credential id.
    #[error("No secret found in secure storage")]
    SecretNotFound,

    /// Access to secure storage was denied by the OS.
    #[error("Access denied to secure storage")]
    AccessDenied,

    /// User cancelled the platform verification prompt.
    #[error("User cancelled authentication")]
    UserCancelled,

    /// I/O error during keyring operations.
    #[error("I/O error: {0}")]
    Io(String),

    /// Platform-specific internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
