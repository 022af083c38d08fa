//! Collaborator contract for the one-time remote login handshake.
//!
//! The bridge consumes the decrypted pair exactly once per successful unlock
//! and must not retain it beyond the handshake. The vault side never performs
//! network I/O itself; transport security is the implementor's obligation.

use async_trait::async_trait;
use thiserror::Error;

/// Opaque session token returned by a successful remote login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Failures of the remote login handshake.
///
/// Messages must never echo the password; the controller forwards them
/// verbatim to the UI.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The remote system rejected the credential.
    #[error("Remote login failed")]
    AuthenticationFailed,

    /// The handshake could not be carried out (offline, server down).
    #[error("Login service unreachable: {0}")]
    Unreachable(String),
}

/// Receives the decrypted credential once per unlock and performs the login.
#[async_trait]
pub trait SessionBridge: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<SessionToken, SessionError>;
}
