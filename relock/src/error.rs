//! Error taxonomy for vault and unlock operations.
//!
//! The variants are deliberately coarse on the outside: a wrong PIN and a
//! tampered ciphertext both surface as [`VaultError::WrongSecret`], and no
//! variant ever carries the PIN, the password, or key material.

use thiserror::Error;

use crate::pin::PinPolicyError;

/// Result type alias for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The chosen PIN fails the strength policy at setup.
    #[error("PIN rejected: {0}")]
    Validation(#[from] PinPolicyError),

    /// Authenticated decryption failed: the supplied PIN or biometric key
    /// material is wrong. Does not imply the record is missing.
    #[error("Wrong PIN")]
    WrongSecret,

    /// No credential record exists for this user.
    #[error("No saved credentials for this user")]
    NoRecord,

    /// A record exists but cannot be decoded for a reason other than a wrong
    /// secret (schema drift, truncated file, invalid UTF-8 payload).
    #[error("Saved credentials are corrupted: {0}")]
    DataCorruption(String),

    /// The underlying store is inaccessible. Callers degrade to fresh login.
    #[error("Credential store unavailable: {0}")]
    StorageUnavailable(String),

    /// A biometric factor failed; always recoverable via the PIN path.
    #[error(transparent)]
    Biometric(#[from] BiometricError),
}

/// Errors raised by a platform biometric factor.
///
/// All three are non-fatal by contract: the unlock flow answers every one of
/// them by falling back to PIN entry.
#[derive(Debug, Clone, Error)]
pub enum BiometricError {
    /// No usable biometric factor on this platform/device.
    #[error("Biometric factor unavailable: {0}")]
    Unavailable(String),

    /// The user dismissed the platform verification prompt.
    #[error("Biometric prompt cancelled")]
    Cancelled,

    /// Verification ran and failed, or the stored platform secret is gone.
    #[error("Biometric verification failed: {0}")]
    Failed(String),
}

impl From<relock_secret::Error> for BiometricError {
    fn from(err: relock_secret::Error) -> Self {
        use relock_secret::Error as E;
        match err {
            E::NotAvailable(reason) => BiometricError::Unavailable(reason),
            E::AccessDenied => BiometricError::Unavailable("access to secure storage denied".into()),
            E::UserCancelled => BiometricError::Cancelled,
            E::AuthenticationFailed(reason) => BiometricError::Failed(reason),
            E::EnrollmentChanged => {
                BiometricError::Failed("platform enrollment changed; re-enroll to continue".into())
            }
            E::SecretNotFound => BiometricError::Failed("no platform secret for this record".into()),
            E::Io(msg) | E::Internal(msg) => BiometricError::Failed(msg),
        }
    }
}
