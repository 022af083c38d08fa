//! Local credential vault with PIN and biometric unlock.
//!
//! Stores one username/password pair per user, encrypted on the local
//! filesystem with AES-256-GCM under a key derived from a six-digit PIN via
//! Argon2id. Biometric unlock parks that same key in platform secure storage
//! (OS keyring on desktop) so both paths open the same ciphertext, and the
//! PIN always remains a working fallback.
//!
//! The [`unlock::UnlockController`] drives the interactive flow: routing at
//! launch, method selection, digit-at-a-time PIN entry, failure messaging,
//! and the one-shot handoff of the decrypted pair to a [`session::SessionBridge`].
//! The [`vault::Vault`] underneath exposes the record lifecycle directly for
//! hosts that manage their own UI state.
//!
//! Nothing here talks to the network. Plaintext exists only in zeroized
//! buffers between decryption and the session handshake.

pub mod biometric;
pub mod config;
pub mod crypto;
pub mod error;
pub mod kdf;
pub mod pin;
pub mod session;
pub mod store;
pub mod unlock;
pub mod vault;

pub use biometric::{BiometricAvailability, BiometricCredentialId, BiometricFactor};
pub use config::VaultConfig;
pub use error::{BiometricError, VaultError, VaultResult};
pub use pin::{validate_pin, PinBuffer, PinPolicyError, PIN_LENGTH};
pub use session::{SessionBridge, SessionError, SessionToken};
pub use store::{LastUser, LastUserStore};
pub use unlock::{UnlockController, UnlockMessage, UnlockRoute, UnlockState};
pub use vault::{PlaintextCredential, Vault};
