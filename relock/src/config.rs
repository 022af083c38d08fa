//! Vault configuration: data directory, KDF profile, failure floor.

use std::path::PathBuf;
use std::time::Duration;

use crate::kdf::KdfParams;

/// Minimum elapsed time before any unlock failure is surfaced.
///
/// Sits inside the 400-600ms band so "wrong PIN" and "no record" cannot be
/// told apart by response timing. Success paths are never delayed.
pub const DEFAULT_FAILURE_FLOOR: Duration = Duration::from_millis(500);

/// Configuration for a [`crate::vault::Vault`].
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Directory holding credential records and the last-user marker.
    pub data_dir: PathBuf,
    /// Argon2id cost profile for PIN key derivation.
    pub kdf: KdfParams,
    /// Minimum elapsed time for failure responses.
    pub failure_floor: Duration,
}

impl VaultConfig {
    /// Production configuration rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            kdf: KdfParams::desktop(),
            failure_floor: DEFAULT_FAILURE_FLOOR,
        }
    }

    /// Use the reduced-memory KDF profile for constrained devices.
    pub fn for_mobile(mut self) -> Self {
        self.kdf = KdfParams::mobile();
        self
    }
}
