//! Desktop implementation using the OS keyring.
//!
//! Secrets are stored in platform-native keyrings:
//! - **macOS**: Keychain Access
//! - **Windows**: Credential Manager
//! - **Linux**: Secret Service API (GNOME Keyring, KWallet)
//!
//! Each stored secret lives under a per-credential account name so that
//! several user records can hold independent platform-backed secrets.

use keyring::Entry;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::models::{SecretStorageMethod, SecretStorageStatus};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "dev.relock.vault";

/// Account name used only to probe keyring availability.
const PROBE_ACCOUNT: &str = "availability-probe";

/// Secret storage backed by the OS keyring.
#[derive(Debug, Clone, Default)]
pub struct KeyringStore {
    _private: (),
}

impl KeyringStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Check whether the OS keyring is reachable.
    ///
    /// Never returns `Err`: an unreachable keyring is reported as an
    /// unavailable status with a reason, so callers can degrade to other
    /// unlock paths.
    pub fn check_availability(&self) -> SecretStorageStatus {
        debug!("Checking keyring availability for service: {}", SERVICE_NAME);

        let entry = match Entry::new(SERVICE_NAME, PROBE_ACCOUNT) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Keyring not available: {}", e);
                return SecretStorageStatus::unavailable(format!("OS keyring not available: {e}"));
            }
        };
        let method = Self::platform_method();
        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!("Keyring available, method: {:?}", method);
                SecretStorageStatus::available(method)
            }
            Err(e) => {
                warn!("Keyring not accessible: {:?}", e);
                SecretStorageStatus::unavailable(format!("OS keyring not accessible: {e}"))
            }
        }
    }

    /// Store a secret in the OS keyring under the given credential id.
    ///
    /// The secret is stored base64-encoded because keyring APIs expect
    /// strings. The write is verified by reading it back through a fresh
    /// `Entry`, so a silently failing backend cannot report success.
    pub fn store_secret(&self, credential_id: &str, secret: &[u8]) -> crate::Result<()> {
        info!(
            "Storing {} byte secret in keyring (account: {})",
            secret.len(),
            credential_id
        );

        let entry = Entry::new(SERVICE_NAME, credential_id).map_err(|e| {
            error!("Failed to create keyring entry: {}", e);
            Self::map_keyring_error(e)
        })?;

        let encoded = Zeroizing::new(base64_encode(secret));
        entry.set_password(&encoded).map_err(|e| {
            error!("Failed to store secret in keyring: {:?}", e);
            Self::map_keyring_error(e)
        })?;

        // Read back with a NEW Entry so we are not seeing a cached value
        // from the handle we just wrote through.
        let verify_entry = Entry::new(SERVICE_NAME, credential_id).map_err(|e| {
            error!("Failed to create verification entry: {}", e);
            Self::map_keyring_error(e)
        })?;
        match verify_entry.get_password() {
            Ok(readback) => {
                let readback = Zeroizing::new(readback);
                if *readback == *encoded {
                    debug!("Secret verified and stored in OS keyring");
                    Ok(())
                } else {
                    error!("Keyring readback mismatch after store");
                    Err(Error::Internal(
                        "Keyring verification failed: data mismatch".into(),
                    ))
                }
            }
            Err(e) => {
                error!("Keyring readback failed after store: {:?}", e);
                Err(Error::Internal(format!(
                    "Keyring verification failed: stored entry cannot be read back: {e:?}"
                )))
            }
        }
    }

    /// Retrieve a secret from the OS keyring.
    pub fn retrieve_secret(&self, credential_id: &str) -> crate::Result<Zeroizing<Vec<u8>>> {
        debug!("Retrieving secret from keyring (account: {})", credential_id);

        let entry =
            Entry::new(SERVICE_NAME, credential_id).map_err(Self::map_keyring_error)?;

        let encoded = Zeroizing::new(entry.get_password().map_err(|e| {
            warn!("Failed to retrieve secret from keyring: {:?}", e);
            Self::map_keyring_error(e)
        })?);

        let secret = base64_decode(&encoded)
            .map_err(|e| Error::Internal(format!("Failed to decode stored secret: {e}")))?;

        debug!("Secret retrieved from OS keyring ({} bytes)", secret.len());
        Ok(Zeroizing::new(secret))
    }

    /// Delete a secret from the OS keyring.
    ///
    /// Idempotent: deleting a missing entry is not an error.
    pub fn delete_secret(&self, credential_id: &str) -> crate::Result<()> {
        debug!("Deleting secret from keyring (account: {})", credential_id);

        let entry =
            Entry::new(SERVICE_NAME, credential_id).map_err(Self::map_keyring_error)?;

        match entry.delete_credential() {
            Ok(()) => {
                info!("Secret deleted from OS keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No secret to delete (already gone)");
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete secret from keyring: {:?}", e);
                Err(Self::map_keyring_error(e))
            }
        }
    }

    /// The storage method backing the current platform.
    fn platform_method() -> SecretStorageMethod {
        #[cfg(target_os = "macos")]
        {
            SecretStorageMethod::MacOSKeychain
        }
        #[cfg(target_os = "windows")]
        {
            SecretStorageMethod::WindowsCredentialManager
        }
        #[cfg(target_os = "linux")]
        {
            SecretStorageMethod::LinuxSecretService
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            SecretStorageMethod::LinuxSecretService
        }
    }

    /// Map keyring errors to our error type.
    fn map_keyring_error(err: keyring::Error) -> Error {
        match err {
            keyring::Error::NoEntry => Error::SecretNotFound,
            keyring::Error::Ambiguous(_) => Error::Internal("Multiple keyring entries found".into()),
            keyring::Error::NoStorageAccess(e) => {
                Error::NotAvailable(format!("Keyring access denied: {e:?}"))
            }
            keyring::Error::PlatformFailure(e) => {
                let msg = format!("{e:?}");
                if msg.contains("Dbus") || msg.contains("dbus") || msg.contains("D-Bus") {
                    Error::NotAvailable(format!("System keyring not available (D-Bus error): {msg}"))
                } else {
                    Error::Internal(format!("Keyring error: {msg}"))
                }
            }
            keyring::Error::BadEncoding(e) => {
                Error::Internal(format!("Keyring encoding error: {e:?}"))
            }
            _ => Error::Internal(format!("Keyring error: {err}")),
        }
    }
}

/// Base64 encode bytes to string.
fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Base64 decode string to bytes.
fn base64_decode(encoded: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| e.to_string())
}
