//! Unlock flow state machine.
//!
//! Orchestrates method selection (biometric first when enrolled and
//! supported), digit-at-a-time PIN entry with auto-verify, failure counting
//! with lockout messaging, recovery ("forgot PIN"), and the one-shot handoff
//! of the decrypted credential to the session bridge.
//!
//! There is no timed lockout: `Locked` changes the messaging, not the
//! machine - a correct PIN still unlocks on the next attempt. The derivation
//! cost per attempt is the actual rate limit.

use std::sync::Arc;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::biometric::BiometricFactor;
use crate::error::{BiometricError, VaultError, VaultResult};
use crate::pin::PinBuffer;
use crate::session::{SessionBridge, SessionToken};
use crate::store::{LastUser, LastUserStore};
use crate::unlock::UnlockAttempts;
use crate::vault::{PlaintextCredential, Vault};

/// Failure count at which the lockout hint is shown.
pub const LOCKOUT_HINT_AFTER: u32 = 3;

/// Where the host application should route after `start` or recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockRoute {
    /// No returning user (or unusable store): show the fresh login screen.
    FreshLogin,
    /// Returning user with a credential record: show the unlock screen.
    UnlockScreen,
}

/// States of the unlock flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    Idle,
    /// User is picking between the enrolled biometric factor and PIN.
    ChoosingMethod,
    /// Waiting on the platform verification prompt.
    BiometricPending,
    PinEntry,
    Verifying,
    Unlocked,
    /// Too many consecutive failures; messaging only, attempts continue.
    Locked,
    /// "Forgot PIN" confirmation: resetting discards the saved credential.
    RecoveryConfirm,
}

/// User-facing feedback produced by the flow. Never carries the PIN, the
/// password, or key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockMessage {
    /// Wrong PIN; how many attempts remain before the lockout hint.
    WrongPin { remaining: u32 },
    /// Third consecutive failure: suggest recovery, keep accepting attempts.
    TooManyAttempts,
    /// The biometric factor failed or was dismissed; continue with PIN.
    BiometricFallback,
    /// Saved credentials are unusable (corrupt record or unreachable store);
    /// offer to reset them.
    ResetOffer,
    /// The remote login handshake failed after a successful unlock.
    SessionFailed(String),
}

/// The unlock flow controller.
///
/// Owns all process-scoped flow state explicitly - the returning-user
/// marker handle, the failure counters, the PIN buffer - so the component is
/// constructible and testable in isolation.
pub struct UnlockController {
    vault: Vault,
    factor: Arc<dyn BiometricFactor>,
    session: Arc<dyn SessionBridge>,
    last_user: LastUserStore,
    attempts: UnlockAttempts,
    state: UnlockState,
    pin: PinBuffer,
    user: Option<LastUser>,
    message: Option<UnlockMessage>,
}

impl UnlockController {
    pub fn new(
        vault: Vault,
        factor: Arc<dyn BiometricFactor>,
        session: Arc<dyn SessionBridge>,
        last_user: LastUserStore,
    ) -> Self {
        Self {
            vault,
            factor,
            session,
            last_user,
            attempts: UnlockAttempts::new(),
            state: UnlockState::Idle,
            pin: PinBuffer::new(),
            user: None,
            message: None,
        }
    }

    pub fn state(&self) -> UnlockState {
        self.state
    }

    pub fn message(&self) -> Option<&UnlockMessage> {
        self.message.as_ref()
    }

    /// Digits entered so far, for masked UI dots.
    pub fn pin_digits(&self) -> usize {
        self.pin.len()
    }

    /// The returning user being unlocked, once `start` chose the unlock path.
    pub fn user(&self) -> Option<&LastUser> {
        self.user.as_ref()
    }

    /// The vault backing this flow (for host-driven operations such as
    /// biometric enrollment from a settings screen).
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Decide the launch route from the last-user marker and record state.
    ///
    /// An unreadable marker store degrades to fresh login; a marker without
    /// a matching record is stale and gets cleared.
    pub async fn start(&mut self) -> VaultResult<UnlockRoute> {
        let marker = match self.last_user.load() {
            Ok(marker) => marker,
            Err(e) => {
                warn!("last-user marker unreadable, forcing fresh login: {e}");
                self.state = UnlockState::Idle;
                return Ok(UnlockRoute::FreshLogin);
            }
        };

        let Some(marker) = marker else {
            self.state = UnlockState::Idle;
            return Ok(UnlockRoute::FreshLogin);
        };

        if !self.vault.exists(&marker.user_id) {
            debug!(user_id = %marker.user_id, "stale last-user marker, clearing");
            self.last_user.clear()?;
            self.state = UnlockState::Idle;
            return Ok(UnlockRoute::FreshLogin);
        }

        self.state = if self.biometric_offered(&marker.user_id) {
            UnlockState::BiometricPending
        } else {
            UnlockState::PinEntry
        };
        info!(user_id = %marker.user_id, state = ?self.state, "unlock flow started");
        self.user = Some(marker);
        self.message = None;
        self.pin.clear();
        Ok(UnlockRoute::UnlockScreen)
    }

    /// Open the method chooser; only meaningful when both factors are on
    /// offer.
    pub fn open_method_chooser(&mut self) {
        let both_offered = self
            .user
            .as_ref()
            .is_some_and(|u| self.biometric_offered(&u.user_id));
        if both_offered
            && matches!(self.state, UnlockState::PinEntry | UnlockState::BiometricPending)
        {
            self.state = UnlockState::ChoosingMethod;
        }
    }

    /// Continue with PIN entry.
    pub fn choose_pin(&mut self) {
        if matches!(
            self.state,
            UnlockState::ChoosingMethod | UnlockState::BiometricPending
        ) {
            self.state = UnlockState::PinEntry;
            self.pin.clear();
        }
    }

    /// Continue with the biometric factor, if it is still on offer.
    pub fn choose_biometric(&mut self) {
        let offered = self
            .user
            .as_ref()
            .is_some_and(|u| self.biometric_offered(&u.user_id));
        if offered
            && matches!(self.state, UnlockState::ChoosingMethod | UnlockState::PinEntry)
        {
            self.state = UnlockState::BiometricPending;
        }
    }

    /// Run the platform verification prompt and, on success, unlock.
    ///
    /// Every biometric failure - unavailable, cancelled, failed, stale key
    /// material - lands in `PinEntry`; none of them touches vault state.
    pub async fn authenticate_biometric(&mut self) -> VaultResult<Option<SessionToken>> {
        if self.state != UnlockState::BiometricPending {
            return Ok(None);
        }
        let Some(user_id) = self.user.as_ref().map(|u| u.user_id.clone()) else {
            return Ok(None);
        };

        let enrollment = self.vault.biometric_enrollment(&user_id).ok().flatten();
        let Some(credential_id) = enrollment else {
            self.fall_back_to_pin("no biometric enrollment on record");
            return Ok(None);
        };

        let material = match self.factor.authenticate(&credential_id).await {
            Ok(material) => material,
            Err(BiometricError::Cancelled) => {
                debug!(user_id = %user_id, "biometric prompt dismissed");
                self.fall_back_to_pin("prompt cancelled");
                return Ok(None);
            }
            Err(e) => {
                warn!(user_id = %user_id, "biometric factor failed: {e}");
                self.fall_back_to_pin("factor failed");
                return Ok(None);
            }
        };

        self.state = UnlockState::Verifying;
        match self.vault.unlock_with_key(&user_id, &material).await {
            Ok(credential) => self.complete_unlock(&user_id, credential).await,
            // Stale enrolled material (for example after a missed revocation)
            // is a biometric-path failure, not a PIN failure: fall back
            // without charging the attempt counter.
            Err(VaultError::WrongSecret) => {
                warn!(user_id = %user_id, "enrolled key material no longer opens the record");
                self.fall_back_to_pin("stale key material");
                Ok(None)
            }
            Err(e) => {
                self.handle_verify_failure(&user_id, e);
                Ok(None)
            }
        }
    }

    /// Feed one PIN digit; a full buffer auto-triggers verification.
    ///
    /// Accepted in `PinEntry` and in `Locked` - the lockout is messaging,
    /// not a gate.
    pub async fn enter_digit(&mut self, digit: char) -> VaultResult<Option<SessionToken>> {
        if !matches!(self.state, UnlockState::PinEntry | UnlockState::Locked) {
            return Ok(None);
        }
        let Some(user_id) = self.user.as_ref().map(|u| u.user_id.clone()) else {
            return Ok(None);
        };

        if !self.pin.push(digit) {
            return Ok(None);
        }
        let Some(pin) = self.pin.pin().map(|p| Zeroizing::new(p.to_owned())) else {
            return Ok(None);
        };
        self.pin.clear();

        self.state = UnlockState::Verifying;
        match self.vault.unlock(&user_id, pin.as_str()).await {
            Ok(credential) => self.complete_unlock(&user_id, credential).await,
            Err(e) => {
                self.handle_verify_failure(&user_id, e);
                Ok(None)
            }
        }
    }

    /// Remove the most recently entered digit.
    pub fn erase_digit(&mut self) {
        if matches!(self.state, UnlockState::PinEntry | UnlockState::Locked) {
            self.pin.erase();
        }
    }

    /// Enter the "forgot PIN" confirmation.
    pub fn forgot_pin(&mut self) {
        if matches!(
            self.state,
            UnlockState::PinEntry
                | UnlockState::Locked
                | UnlockState::BiometricPending
                | UnlockState::ChoosingMethod
        ) {
            self.state = UnlockState::RecoveryConfirm;
            self.pin.clear();
        }
    }

    /// Confirm recovery: discard the saved credential and the returning-user
    /// marker, then route to fresh login.
    pub async fn confirm_recovery(&mut self) -> VaultResult<UnlockRoute> {
        if self.state != UnlockState::RecoveryConfirm {
            return Ok(UnlockRoute::FreshLogin);
        }
        if let Some(user) = self.user.take() {
            self.vault.remove(&user.user_id).await?;
            self.attempts.clear(&user.user_id);
            info!(user_id = %user.user_id, "saved credentials reset via recovery");
        }
        self.last_user.clear()?;
        self.state = UnlockState::Idle;
        self.message = None;
        self.pin.clear();
        Ok(UnlockRoute::FreshLogin)
    }

    /// Abandon recovery and return to PIN entry.
    pub fn cancel_recovery(&mut self) {
        if self.state == UnlockState::RecoveryConfirm {
            self.state = UnlockState::PinEntry;
        }
    }

    /// Switch account: forget who was here, keep their record so a later
    /// opt-in login restores the unlock path without re-enrollment.
    pub fn switch_account(&mut self) -> VaultResult<UnlockRoute> {
        self.last_user.clear()?;
        self.user = None;
        self.state = UnlockState::Idle;
        self.message = None;
        self.pin.clear();
        Ok(UnlockRoute::FreshLogin)
    }

    /// Opt in after a successful fresh login: store the encrypted record and
    /// mark this user as the returning user.
    pub async fn remember(
        &mut self,
        user_id: &str,
        display_name: &str,
        username: &str,
        password: &str,
        pin: &str,
    ) -> VaultResult<()> {
        self.vault.setup(user_id, username, password, pin).await?;
        self.last_user.save(&LastUser {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
        })?;
        Ok(())
    }

    /// Acknowledge a finished unlock and return the machine to idle.
    pub fn finish(&mut self) {
        if self.state == UnlockState::Unlocked {
            self.state = UnlockState::Idle;
            self.message = None;
        }
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn biometric_offered(&self, user_id: &str) -> bool {
        self.factor.availability().supported
            && self
                .vault
                .biometric_enrollment(user_id)
                .ok()
                .flatten()
                .is_some()
    }

    fn fall_back_to_pin(&mut self, reason: &str) {
        debug!("falling back to PIN entry: {reason}");
        self.message = Some(UnlockMessage::BiometricFallback);
        self.state = UnlockState::PinEntry;
        self.pin.clear();
    }

    /// Hand the decrypted pair to the session bridge exactly once, then drop
    /// it. The credential's lifetime ends inside this function either way.
    async fn complete_unlock(
        &mut self,
        user_id: &str,
        credential: PlaintextCredential,
    ) -> VaultResult<Option<SessionToken>> {
        self.attempts.clear(user_id);
        self.pin.clear();

        let result = self
            .session
            .login(&credential.username, &credential.password)
            .await;
        drop(credential);

        match result {
            Ok(token) => {
                info!(user_id = %user_id, "unlock complete, session established");
                self.state = UnlockState::Unlocked;
                self.message = None;
                Ok(Some(token))
            }
            Err(e) => {
                warn!(user_id = %user_id, "session handshake failed after unlock: {e}");
                self.state = UnlockState::PinEntry;
                self.message = Some(UnlockMessage::SessionFailed(e.to_string()));
                Ok(None)
            }
        }
    }

    fn handle_verify_failure(&mut self, user_id: &str, err: VaultError) {
        self.pin.clear();
        match err {
            VaultError::WrongSecret => {
                let count = self.attempts.record_failure(user_id);
                if count >= LOCKOUT_HINT_AFTER {
                    debug!(user_id = %user_id, count, "lockout hint threshold reached");
                    self.message = Some(UnlockMessage::TooManyAttempts);
                    self.state = UnlockState::Locked;
                } else {
                    self.message = Some(UnlockMessage::WrongPin {
                        remaining: LOCKOUT_HINT_AFTER - count,
                    });
                    self.state = UnlockState::PinEntry;
                }
            }
            VaultError::NoRecord
            | VaultError::DataCorruption(_)
            | VaultError::StorageUnavailable(_) => {
                warn!(user_id = %user_id, "unlock failed: {err}");
                self.message = Some(UnlockMessage::ResetOffer);
                self.state = UnlockState::PinEntry;
            }
            other => {
                warn!(user_id = %user_id, "unexpected unlock failure: {other}");
                self.message = Some(UnlockMessage::ResetOffer);
                self.state = UnlockState::PinEntry;
            }
        }
    }
}

impl std::fmt::Debug for UnlockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockController")
            .field("state", &self.state)
            .field("user", &self.user)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::biometric::mock::MockFactor;
    use crate::config::VaultConfig;
    use crate::kdf::KdfParams;
    use crate::session::SessionError;

    struct MockSession {
        logins: Mutex<Vec<(String, String)>>,
        fail_next: Mutex<Option<SessionError>>,
    }

    impl MockSession {
        fn new() -> Self {
            Self {
                logins: Mutex::new(Vec::new()),
                fail_next: Mutex::new(None),
            }
        }

        fn script_failure(&self, err: SessionError) {
            *self.fail_next.lock().unwrap() = Some(err);
        }

        fn logins(&self) -> Vec<(String, String)> {
            self.logins.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionBridge for MockSession {
        async fn login(
            &self,
            username: &str,
            password: &str,
        ) -> Result<SessionToken, SessionError> {
            if let Some(err) = self.fail_next.lock().unwrap().take() {
                return Err(err);
            }
            self.logins
                .lock()
                .unwrap()
                .push((username.to_string(), password.to_string()));
            Ok(SessionToken(format!("token-{username}")))
        }
    }

    fn test_config(dir: &TempDir) -> VaultConfig {
        let mut config = VaultConfig::new(dir.path().to_path_buf());
        config.kdf = KdfParams::insecure_test();
        config.failure_floor = std::time::Duration::from_millis(1);
        config
    }

    struct Fixture {
        controller: UnlockController,
        factor: Arc<MockFactor>,
        session: Arc<MockSession>,
        dir: TempDir,
    }

    fn fixture(biometric_supported: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let factor = if biometric_supported {
            Arc::new(MockFactor::supported())
        } else {
            Arc::new(MockFactor::default())
        };
        let session = Arc::new(MockSession::new());
        let vault = Vault::new(config, factor.clone()).unwrap();
        let last_user = LastUserStore::open(dir.path());
        let controller =
            UnlockController::new(vault, factor.clone(), session.clone(), last_user);
        Fixture {
            controller,
            factor,
            session,
            dir,
        }
    }

    async fn enter_pin(
        controller: &mut UnlockController,
        pin: &str,
    ) -> VaultResult<Option<SessionToken>> {
        let mut outcome = Ok(None);
        for digit in pin.chars() {
            outcome = controller.enter_digit(digit).await;
        }
        outcome
    }

    #[tokio::test]
    async fn start_without_marker_routes_to_fresh_login() {
        let mut fx = fixture(false);
        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);
        assert_eq!(fx.controller.state(), UnlockState::Idle);
    }

    #[tokio::test]
    async fn remembered_user_routes_to_pin_entry() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();

        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::UnlockScreen);
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        assert_eq!(fx.controller.user().unwrap().display_name, "Alice");
    }

    #[tokio::test]
    async fn correct_pin_unlocks_and_hands_off_once() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        let token = enter_pin(&mut fx.controller, "704152").await.unwrap();
        assert_eq!(token, Some(SessionToken("token-alice".to_string())));
        assert_eq!(fx.controller.state(), UnlockState::Unlocked);
        assert_eq!(
            fx.session.logins(),
            vec![("alice".to_string(), "s3cr3t!".to_string())]
        );
    }

    #[tokio::test]
    async fn three_failures_lock_then_correct_pin_still_works() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        enter_pin(&mut fx.controller, "000000").await.unwrap();
        assert_eq!(
            fx.controller.message(),
            Some(&UnlockMessage::WrongPin { remaining: 2 })
        );
        enter_pin(&mut fx.controller, "000000").await.unwrap();
        assert_eq!(
            fx.controller.message(),
            Some(&UnlockMessage::WrongPin { remaining: 1 })
        );
        enter_pin(&mut fx.controller, "000000").await.unwrap();
        assert_eq!(fx.controller.state(), UnlockState::Locked);
        assert_eq!(fx.controller.message(), Some(&UnlockMessage::TooManyAttempts));

        // Lockout is advisory. The fourth attempt with the right PIN succeeds.
        let token = enter_pin(&mut fx.controller, "704152").await.unwrap();
        assert!(token.is_some());
        assert_eq!(fx.controller.state(), UnlockState::Unlocked);
    }

    #[tokio::test]
    async fn biometric_cancel_falls_back_to_pin() {
        let mut fx = fixture(true);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller
            .vault()
            .enroll_biometric("u1", "704152")
            .await
            .unwrap();

        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::UnlockScreen);
        assert_eq!(fx.controller.state(), UnlockState::BiometricPending);

        fx.factor.script_failure(BiometricError::Cancelled);
        let token = fx.controller.authenticate_biometric().await.unwrap();
        assert_eq!(token, None);
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        assert_eq!(
            fx.controller.message(),
            Some(&UnlockMessage::BiometricFallback)
        );

        // The PIN path is fully intact after the dismissal.
        let token = enter_pin(&mut fx.controller, "704152").await.unwrap();
        assert!(token.is_some());
    }

    #[tokio::test]
    async fn biometric_success_unlocks() {
        let mut fx = fixture(true);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller
            .vault()
            .enroll_biometric("u1", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        let token = fx.controller.authenticate_biometric().await.unwrap();
        assert_eq!(token, Some(SessionToken("token-alice".to_string())));
        assert_eq!(fx.controller.state(), UnlockState::Unlocked);
        assert_eq!(fx.session.logins().len(), 1);
    }

    #[tokio::test]
    async fn recovery_discards_record_and_marker() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        fx.controller.forgot_pin();
        assert_eq!(fx.controller.state(), UnlockState::RecoveryConfirm);
        let route = fx.controller.confirm_recovery().await.unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);
        assert!(!fx.controller.vault().exists("u1"));

        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);
    }

    #[tokio::test]
    async fn cancel_recovery_returns_to_pin_entry() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        fx.controller.forgot_pin();
        fx.controller.cancel_recovery();
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        assert!(fx.controller.vault().exists("u1"));
    }

    #[tokio::test]
    async fn switch_account_keeps_record() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        let route = fx.controller.switch_account().unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);
        assert!(fx.controller.vault().exists("u1"));

        // Marker is gone, so the next launch is a fresh login.
        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);
    }

    #[tokio::test]
    async fn session_failure_reports_without_counting_against_pin() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        fx.session
            .script_failure(SessionError::Unreachable("server offline".to_string()));
        let token = enter_pin(&mut fx.controller, "704152").await.unwrap();
        assert_eq!(token, None);
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        assert!(matches!(
            fx.controller.message(),
            Some(UnlockMessage::SessionFailed(_))
        ));

        // The decryption succeeded, so the next attempt still has the full
        // allowance before any lockout hint.
        enter_pin(&mut fx.controller, "000000").await.unwrap();
        assert_eq!(
            fx.controller.message(),
            Some(&UnlockMessage::WrongPin { remaining: 2 })
        );
    }

    #[tokio::test]
    async fn stale_marker_is_cleared() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.vault().remove("u1").await.unwrap();

        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);

        // The marker itself was discarded, not just ignored.
        let route = fx.controller.start().await.unwrap();
        assert_eq!(route, UnlockRoute::FreshLogin);
    }

    #[tokio::test]
    async fn method_chooser_round_trip() {
        let mut fx = fixture(true);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller
            .vault()
            .enroll_biometric("u1", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();
        assert_eq!(fx.controller.state(), UnlockState::BiometricPending);

        fx.controller.open_method_chooser();
        assert_eq!(fx.controller.state(), UnlockState::ChoosingMethod);
        fx.controller.choose_pin();
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        fx.controller.choose_biometric();
        assert_eq!(fx.controller.state(), UnlockState::BiometricPending);
    }

    #[tokio::test]
    async fn corrupted_record_offers_reset() {
        let mut fx = fixture(false);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();

        let path = fx.dir.path().join(format!("cred-{}.json", hex::encode("u1")));
        std::fs::write(&path, b"{\"user_id\"").unwrap();

        let token = enter_pin(&mut fx.controller, "704152").await.unwrap();
        assert_eq!(token, None);
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        assert_eq!(fx.controller.message(), Some(&UnlockMessage::ResetOffer));
    }

    #[tokio::test]
    async fn stale_biometric_material_does_not_burn_pin_attempts() {
        let mut fx = fixture(true);
        fx.controller
            .remember("u1", "Alice", "alice", "s3cr3t!", "704152")
            .await
            .unwrap();
        fx.controller
            .vault()
            .enroll_biometric("u1", "704152")
            .await
            .unwrap();
        fx.controller.start().await.unwrap();
        assert_eq!(fx.controller.state(), UnlockState::BiometricPending);

        fx.factor.corrupt_enrolled_secrets();
        let token = fx.controller.authenticate_biometric().await.unwrap();
        assert_eq!(token, None);
        assert_eq!(fx.controller.state(), UnlockState::PinEntry);
        assert_eq!(
            fx.controller.message(),
            Some(&UnlockMessage::BiometricFallback)
        );

        // The counter was not charged: a wrong PIN afterwards still has the
        // full allowance.
        enter_pin(&mut fx.controller, "000000").await.unwrap();
        assert_eq!(
            fx.controller.message(),
            Some(&UnlockMessage::WrongPin { remaining: 2 })
        );
    }

    #[tokio::test]
    async fn digits_ignored_outside_pin_entry() {
        let mut fx = fixture(false);
        let token = fx.controller.enter_digit('1').await.unwrap();
        assert_eq!(token, None);
        assert_eq!(fx.controller.pin_digits(), 0);
    }
}
