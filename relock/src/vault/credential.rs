//! The decrypted credential pair, alive only between unlock and handoff.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A username/password pair in memory.
///
/// Exists only between successful decryption and the session handoff; the
/// serde impls feed the cipher, never a file or a log line. Holders must drop
/// it as soon as the handoff completes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PlaintextCredential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PlaintextCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaintextCredential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
