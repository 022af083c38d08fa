//! Persistent storage for credential records and the last-user marker.
//!
//! Everything lives as JSON files under one data directory. Writes go
//! through atomic replace (temp file + rename), so a record is always either
//! the old version or the new one, even with several instances open on the
//! same directory.

mod last_user;
mod records;

pub use last_user::{LastUser, LastUserStore};
pub use records::{CredentialRecord, CredentialStore};

use std::path::Path;

use crate::error::{VaultError, VaultResult};

/// Write `bytes` to `path` via the filesystem's atomic replace primitive.
///
/// Unix permissions are tightened to 0o600 after the rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> VaultResult<()> {
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, bytes).map_err(io_unavailable)?;
    std::fs::rename(&temp_path, path).map_err(io_unavailable)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path).map_err(io_unavailable)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms).map_err(io_unavailable)?;
    }

    Ok(())
}

/// I/O failures mean the store itself is unreachable, not that data is bad.
pub(crate) fn io_unavailable(err: std::io::Error) -> VaultError {
    VaultError::StorageUnavailable(err.to_string())
}
