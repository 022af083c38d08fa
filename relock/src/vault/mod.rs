//! Credential vault: encrypted at-rest storage of one username/password pair
//! per user, unlockable by PIN-derived or biometric-supplied key material.

mod credential;
mod manager;

pub use credential::PlaintextCredential;
pub use manager::Vault;
