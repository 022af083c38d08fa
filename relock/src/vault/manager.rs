//! Vault lifecycle: setup, unlock, biometric enrollment, PIN change, removal.
//!
//! One ciphertext per user, decryptable by exactly one mechanism: an
//! AES-256-GCM key that is either re-derived from the PIN or handed back by
//! the platform factor that stored it at enrollment. A wrong PIN, a tampered
//! record, and a stale enrollment all collapse into a single accept/reject
//! signal, and every failure path takes at least `failure_floor` to answer
//! so "wrong PIN" and "no record" are not timing-distinguishable.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::biometric::{BiometricCredentialId, BiometricFactor, KeyMaterial};
use crate::config::VaultConfig;
use crate::crypto;
use crate::error::{VaultError, VaultResult};
use crate::kdf::{self, VaultKey};
use crate::pin::validate_pin;
use crate::store::{CredentialRecord, CredentialStore};
use crate::vault::PlaintextCredential;

/// The credential vault. Cheap to clone-construct per flow; all state lives
/// in the store.
pub struct Vault {
    config: VaultConfig,
    store: CredentialStore,
    factor: Arc<dyn BiometricFactor>,
}

impl Vault {
    /// Open a vault rooted at `config.data_dir`.
    pub fn new(config: VaultConfig, factor: Arc<dyn BiometricFactor>) -> VaultResult<Self> {
        let store = CredentialStore::open(&config.data_dir)?;
        Ok(Self {
            config,
            store,
            factor,
        })
    }

    /// Whether a credential record exists for this user. Fast, no unlocking.
    pub fn exists(&self, user_id: &str) -> bool {
        self.store.exists(user_id)
    }

    /// The biometric enrollment on this user's record, if any.
    pub fn biometric_enrollment(&self, user_id: &str) -> VaultResult<Option<BiometricCredentialId>> {
        Ok(self
            .store
            .load(user_id)?
            .and_then(|r| r.biometric_credential_id)
            .map(BiometricCredentialId::from))
    }

    /// Create (or replace) the encrypted record for a user.
    ///
    /// A fresh salt and nonce are generated on every call; re-setup therefore
    /// rotates the key, which revokes any previous biometric enrollment.
    pub async fn setup(
        &self,
        user_id: &str,
        username: &str,
        password: &str,
        pin: &str,
    ) -> VaultResult<()> {
        validate_pin(pin)?;

        // A corrupt existing record must not block re-setup; it is being
        // replaced wholesale.
        let existing = self.store.load(user_id).ok().flatten();
        if let Some(old_id) = existing
            .as_ref()
            .and_then(|r| r.biometric_credential_id.clone())
        {
            self.revoke_best_effort(&BiometricCredentialId::from(old_id)).await;
        }

        let salt = crypto::generate_salt();
        let key = self.derive_pin_key(pin, salt).await?;

        let payload = Zeroizing::new(
            serde_json::to_vec(&PlaintextCredential {
                username: username.to_string(),
                password: password.to_string(),
            })
            .map_err(|e| VaultError::DataCorruption(format!("payload encode failed: {e}")))?,
        );
        let (ciphertext, iv) = crypto::seal(&key, &payload)?;

        let now = Utc::now();
        let record = CredentialRecord {
            user_id: user_id.to_string(),
            ciphertext,
            iv,
            salt,
            biometric_credential_id: None,
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.store.save(&record)?;

        info!(user_id = %user_id, "credential record set up");
        Ok(())
    }

    /// Unlock with a PIN. Returns the decrypted pair on success.
    pub async fn unlock(&self, user_id: &str, pin: &str) -> VaultResult<PlaintextCredential> {
        let started = Instant::now();
        match self.try_unlock_with_pin(user_id, pin).await {
            Ok(credential) => {
                debug!(user_id = %user_id, "vault unlocked with PIN");
                Ok(credential)
            }
            Err(e) => {
                self.enforce_floor(started).await;
                Err(e)
            }
        }
    }

    /// Unlock with key material supplied by the biometric factor.
    ///
    /// Same ciphertext, same open path as the PIN route; stale material (for
    /// example after a re-setup the platform missed) is a plain
    /// [`VaultError::WrongSecret`].
    pub async fn unlock_with_key(
        &self,
        user_id: &str,
        material: &KeyMaterial,
    ) -> VaultResult<PlaintextCredential> {
        let started = Instant::now();
        let result = (|| {
            let record = self.store.load(user_id)?.ok_or(VaultError::NoRecord)?;
            let key = VaultKey::from_material(material)?;
            Self::open_record(&record, &key)
        })();
        match result {
            Ok(credential) => {
                debug!(user_id = %user_id, "vault unlocked with biometric key material");
                Ok(credential)
            }
            Err(e) => {
                self.enforce_floor(started).await;
                Err(e)
            }
        }
    }

    /// Enroll a biometric factor for this record.
    ///
    /// The PIN is verified first; the derived key is then parked in platform
    /// secure storage and the returned opaque id stored on the record.
    pub async fn enroll_biometric(
        &self,
        user_id: &str,
        pin: &str,
    ) -> VaultResult<BiometricCredentialId> {
        let started = Instant::now();
        match self.try_enroll_biometric(user_id, pin).await {
            Ok(id) => Ok(id),
            Err(e) => {
                self.enforce_floor(started).await;
                Err(e)
            }
        }
    }

    /// Re-encrypt the record under a new PIN.
    ///
    /// Fresh salt and nonce; an enrolled biometric credential is re-enrolled
    /// under the new key so both paths keep opening the same ciphertext.
    pub async fn change_pin(
        &self,
        user_id: &str,
        old_pin: &str,
        new_pin: &str,
    ) -> VaultResult<()> {
        validate_pin(new_pin)?;

        let started = Instant::now();
        match self.try_change_pin(user_id, old_pin, new_pin).await {
            Ok(()) => {
                info!(user_id = %user_id, "PIN changed");
                Ok(())
            }
            Err(e) => {
                self.enforce_floor(started).await;
                Err(e)
            }
        }
    }

    /// Delete the record and revoke any platform enrollment. Idempotent.
    pub async fn remove(&self, user_id: &str) -> VaultResult<()> {
        let existing = self.store.load(user_id).ok().flatten();
        if let Some(old_id) = existing.and_then(|r| r.biometric_credential_id) {
            self.revoke_best_effort(&BiometricCredentialId::from(old_id)).await;
        }
        self.store.delete(user_id)?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    async fn try_unlock_with_pin(
        &self,
        user_id: &str,
        pin: &str,
    ) -> VaultResult<PlaintextCredential> {
        let record = self.store.load(user_id)?.ok_or(VaultError::NoRecord)?;
        let key = self.derive_pin_key(pin, record.salt).await?;
        Self::open_record(&record, &key)
    }

    async fn try_enroll_biometric(
        &self,
        user_id: &str,
        pin: &str,
    ) -> VaultResult<BiometricCredentialId> {
        let mut record = self.store.load(user_id)?.ok_or(VaultError::NoRecord)?;
        let key = self.derive_pin_key(pin, record.salt).await?;

        // Wrong PIN must not reach the platform layer.
        Self::open_record(&record, &key)?;

        if let Some(old_id) = record.biometric_credential_id.take() {
            self.revoke_best_effort(&BiometricCredentialId::from(old_id)).await;
        }

        let credential_id = self.factor.enroll(user_id, &key).await?;
        record.biometric_credential_id = Some(credential_id.as_str().to_string());
        record.updated_at = Utc::now();
        self.store.save(&record)?;

        info!(user_id = %user_id, credential_id = %credential_id, "biometric unlock enrolled");
        Ok(credential_id)
    }

    async fn try_change_pin(&self, user_id: &str, old_pin: &str, new_pin: &str) -> VaultResult<()> {
        let record = self.store.load(user_id)?.ok_or(VaultError::NoRecord)?;
        let old_key = self.derive_pin_key(old_pin, record.salt).await?;
        let credential = Self::open_record(&record, &old_key)?;

        let salt = crypto::generate_salt();
        let new_key = self.derive_pin_key(new_pin, salt).await?;
        let payload = Zeroizing::new(
            serde_json::to_vec(&credential)
                .map_err(|e| VaultError::DataCorruption(format!("payload encode failed: {e}")))?,
        );
        let (ciphertext, iv) = crypto::seal(&new_key, &payload)?;

        let mut biometric_credential_id = None;
        if let Some(old_id) = record.biometric_credential_id.clone() {
            self.revoke_best_effort(&BiometricCredentialId::from(old_id)).await;
            let new_id = self.factor.enroll(user_id, &new_key).await?;
            biometric_credential_id = Some(new_id.as_str().to_string());
        }

        self.store.save(&CredentialRecord {
            user_id: record.user_id,
            ciphertext,
            iv,
            salt,
            biometric_credential_id,
            created_at: record.created_at,
            updated_at: Utc::now(),
        })
    }

    /// Decrypt and decode a record's payload with the given key.
    fn open_record(record: &CredentialRecord, key: &VaultKey) -> VaultResult<PlaintextCredential> {
        let payload = crypto::open(key, &record.iv, &record.ciphertext)?;
        serde_json::from_slice(&payload)
            .map_err(|e| VaultError::DataCorruption(format!("payload decode failed: {e}")))
    }

    async fn derive_pin_key(&self, pin: &str, salt: [u8; kdf::SALT_SIZE]) -> VaultResult<VaultKey> {
        kdf::derive_key_async(
            Zeroizing::new(pin.as_bytes().to_vec()),
            salt,
            self.config.kdf,
        )
        .await
    }

    /// Sleep out the remainder of the failure floor.
    async fn enforce_floor(&self, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed < self.config.failure_floor {
            tokio::time::sleep(self.config.failure_floor - elapsed).await;
        }
    }

    /// Platform revocation failures must never block record operations.
    async fn revoke_best_effort(&self, credential_id: &BiometricCredentialId) {
        if let Err(e) = self.factor.revoke(credential_id).await {
            warn!(credential_id = %credential_id, "platform credential revocation failed: {e}");
        }
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("data_dir", &self.config.data_dir)
            .finish()
    }
}
