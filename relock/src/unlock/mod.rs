//! The unlock flow: routing, method selection, PIN entry, recovery.

mod attempts;
mod controller;

pub use attempts::UnlockAttempts;
pub use controller::{
    UnlockController, UnlockMessage, UnlockRoute, UnlockState, LOCKOUT_HINT_AFTER,
};
