//! Credential record persistence: one JSON file per user id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::crypto::NONCE_SIZE;
use crate::error::{VaultError, VaultResult};
use crate::kdf::SALT_SIZE;

use super::{io_unavailable, write_atomic};

/// One encrypted credential record per user id.
///
/// Salt and IV are not secret and are stored in the clear next to the
/// ciphertext; the plaintext credential is never embedded in any form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: String,
    /// AES-256-GCM ciphertext including the 16-byte auth tag.
    #[serde(with = "hex")]
    pub ciphertext: Vec<u8>,
    /// 12-byte AES-GCM nonce, fresh per write.
    #[serde(with = "hex")]
    pub iv: [u8; NONCE_SIZE],
    /// 16-byte KDF salt, fresh per write.
    #[serde(with = "hex")]
    pub salt: [u8; SALT_SIZE],
    /// Opaque platform credential id, present only while biometric unlock is
    /// enrolled for this record.
    pub biometric_credential_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File-backed store of [`CredentialRecord`]s, keyed by user id.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    data_dir: PathBuf,
}

impl CredentialStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> VaultResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(io_unavailable)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Record file path for a user id. The id is hex-encoded so arbitrary
    /// ids (emails, numeric codes) stay filesystem-safe.
    fn record_path(&self, user_id: &str) -> PathBuf {
        self.data_dir.join(format!("cred-{}.json", hex::encode(user_id)))
    }

    /// Whether a record exists for this user.
    pub fn exists(&self, user_id: &str) -> bool {
        self.record_path(user_id).exists()
    }

    /// Load the record for a user, if any.
    ///
    /// A present-but-unreadable file is [`VaultError::DataCorruption`]; an
    /// unreachable filesystem is [`VaultError::StorageUnavailable`].
    pub fn load(&self, user_id: &str) -> VaultResult<Option<CredentialRecord>> {
        let path = self.record_path(user_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(io_unavailable)?;
        let record: CredentialRecord = serde_json::from_str(&content)
            .map_err(|e| VaultError::DataCorruption(format!("record decode failed: {e}")))?;

        debug!(user_id = %record.user_id, "credential record loaded");
        Ok(Some(record))
    }

    /// Insert or replace the record for `record.user_id` atomically.
    pub fn save(&self, record: &CredentialRecord) -> VaultResult<()> {
        let path = self.record_path(&record.user_id);
        let content = serde_json::to_string_pretty(record)
            .map_err(|e| VaultError::DataCorruption(format!("record encode failed: {e}")))?;
        write_atomic(&path, content.as_bytes())?;

        debug!(user_id = %record.user_id, "credential record saved");
        Ok(())
    }

    /// Delete the record for a user. Idempotent.
    pub fn delete(&self, user_id: &str) -> VaultResult<()> {
        let path = self.record_path(user_id);
        if path.exists() {
            std::fs::remove_file(&path).map_err(io_unavailable)?;
            info!("credential record deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record(user_id: &str) -> CredentialRecord {
        let now = Utc::now();
        CredentialRecord {
            user_id: user_id.to_string(),
            ciphertext: vec![0xDE, 0xAD, 0xBE, 0xEF],
            iv: [1u8; NONCE_SIZE],
            salt: [2u8; SALT_SIZE],
            biometric_credential_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();

        let record = sample_record("user@example.com");
        store.save(&record).unwrap();

        let loaded = store.load("user@example.com").unwrap().unwrap();
        assert_eq!(loaded.ciphertext, record.ciphertext);
        assert_eq!(loaded.iv, record.iv);
        assert_eq!(loaded.salt, record.salt);
    }

    #[test]
    fn load_missing_record_is_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();
        assert!(store.load("nobody").unwrap().is_none());
        assert!(!store.exists("nobody"));
    }

    #[test]
    fn save_is_upsert() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();

        store.save(&sample_record("u1")).unwrap();
        let mut replacement = sample_record("u1");
        replacement.ciphertext = vec![0x11];
        store.save(&replacement).unwrap();

        let loaded = store.load("u1").unwrap().unwrap();
        assert_eq!(loaded.ciphertext, vec![0x11]);
    }

    #[test]
    fn delete_twice_is_fine() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();

        store.save(&sample_record("u1")).unwrap();
        assert!(store.exists("u1"));
        store.delete("u1").unwrap();
        store.delete("u1").unwrap();
        assert!(!store.exists("u1"));
    }

    #[test]
    fn garbage_record_is_corruption() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();

        let path = dir.path().join(format!("cred-{}.json", hex::encode("u1")));
        std::fs::write(&path, b"not json").unwrap();

        let err = store.load("u1").unwrap_err();
        assert!(matches!(err, VaultError::DataCorruption(_)));
    }

    #[cfg(unix)]
    #[test]
    fn record_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();
        store.save(&sample_record("u1")).unwrap();

        let path = dir.path().join(format!("cred-{}.json", hex::encode("u1")));
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
