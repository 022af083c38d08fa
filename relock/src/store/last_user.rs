//! Last-user marker: decides unlock screen vs fresh login at launch.
//!
//! The marker is deliberately minimal - user id and display name only, never
//! any credential material - so it can live outside the encrypted record.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{VaultError, VaultResult};

use super::{io_unavailable, write_atomic};

/// File name for the last-user marker.
const LAST_USER_FILE: &str = "last-user.json";

/// The returning user shown on the unlock screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUser {
    pub user_id: String,
    pub display_name: String,
}

/// File-backed storage of the [`LastUser`] marker.
#[derive(Debug, Clone)]
pub struct LastUserStore {
    path: PathBuf,
}

impl LastUserStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(LAST_USER_FILE),
        }
    }

    /// Load the marker, if one is set.
    pub fn load(&self) -> VaultResult<Option<LastUser>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(io_unavailable)?;
        let marker: LastUser = serde_json::from_str(&content)
            .map_err(|e| VaultError::DataCorruption(format!("last-user marker decode failed: {e}")))?;
        Ok(Some(marker))
    }

    /// Set the marker (atomically replaces any previous one).
    pub fn save(&self, marker: &LastUser) -> VaultResult<()> {
        let content = serde_json::to_string_pretty(marker)
            .map_err(|e| VaultError::DataCorruption(format!("last-user marker encode failed: {e}")))?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!(user_id = %marker.user_id, "last-user marker saved");
        Ok(())
    }

    /// Clear the marker. Idempotent; normal sign-out does NOT call this -
    /// only "forgot PIN" and "switch account" do.
    pub fn clear(&self) -> VaultResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(io_unavailable)?;
            debug!("last-user marker cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn marker_lifecycle() {
        let dir = tempdir().unwrap();
        let store = LastUserStore::open(dir.path());

        assert!(store.load().unwrap().is_none());

        let marker = LastUser {
            user_id: "u1".into(),
            display_name: "Alice".into(),
        };
        store.save(&marker).unwrap();
        assert_eq!(store.load().unwrap(), Some(marker));

        store.clear().unwrap();
        store.clear().unwrap(); // idempotent
        assert!(store.load().unwrap().is_none());
    }
}
