//! Key derivation: stretch a low-entropy secret into an AES-256 key.
//!
//! A 6-digit PIN carries roughly 20 bits of entropy. No derivation cost makes
//! up for that; the cost parameters here only raise the per-guess price, and
//! the real protections are device possession, the unlock flow's lockout
//! messaging, and authenticated encryption giving attackers nothing better
//! than accept/reject.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{VaultError, VaultResult};

/// Salt size in bytes (128 bits).
pub const SALT_SIZE: usize = 16;

/// Derived key size in bytes (256-bit key for AES-256-GCM).
pub const KEY_SIZE: usize = 32;

/// Argon2id cost parameters.
///
/// Tuned per device class; the same profile must be used for setup and
/// unlock of a given record, so profiles are a build-time choice rather than
/// per-record metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of passes.
    pub time_cost: u32,
    /// Number of lanes.
    pub parallelism: u32,
}

impl KdfParams {
    /// Desktop profile: 64 MiB, 3 passes, 4 lanes.
    pub fn desktop() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Reduced-memory profile for phones and tablets: 16 MiB, 3 passes.
    pub fn mobile() -> Self {
        Self {
            memory_cost: 16384,
            time_cost: 3,
            parallelism: 2,
        }
    }

    /// Cheap profile for tests only. Not exported outside the crate.
    #[cfg(test)]
    pub(crate) fn insecure_test() -> Self {
        Self {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// A 256-bit vault encryption key, erased from memory on drop.
///
/// The key only ever exists in process memory; it is never serialized,
/// logged, or exposed through `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_SIZE],
}

impl VaultKey {
    /// Wrap raw key material. Fails if the material is not exactly 32 bytes,
    /// which is how a truncated platform secret surfaces.
    pub fn from_material(material: &[u8]) -> VaultResult<Self> {
        let key: [u8; KEY_SIZE] = material
            .try_into()
            .map_err(|_| VaultError::WrongSecret)?;
        Ok(Self { key })
    }

    /// Key bytes for cipher construction.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey").field("key", &"[REDACTED]").finish()
    }
}

/// Derive a vault key from a secret and a per-record salt via Argon2id.
///
/// Deterministic: identical `(secret, salt)` always yields the identical key,
/// and any different salt yields a statistically independent one.
pub fn derive_key(secret: &[u8], salt: &[u8; SALT_SIZE], params: &KdfParams) -> VaultResult<VaultKey> {
    let argon_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| VaultError::DataCorruption(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key_bytes = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(secret, salt, &mut key_bytes[..])
        .map_err(|e| VaultError::DataCorruption(format!("key derivation failed: {e}")))?;

    VaultKey::from_material(&key_bytes[..])
}

/// Run derivation on the blocking pool.
///
/// Argon2id at the production profile costs real CPU and memory; it must not
/// stall the async executor the interactive surface runs on.
pub async fn derive_key_async(
    secret: Zeroizing<Vec<u8>>,
    salt: [u8; SALT_SIZE],
    params: KdfParams,
) -> VaultResult<VaultKey> {
    tokio::task::spawn_blocking(move || derive_key(&secret, &salt, &params))
        .await
        .map_err(|e| VaultError::StorageUnavailable(format!("key derivation task failed: {e}")))?
}
