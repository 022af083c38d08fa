//! PIN entry surface and strength policy.
//!
//! PINs are exactly [`PIN_LENGTH`] digits. The policy rejects the values an
//! attacker tries first: repeated digits, straight runs, and a short
//! deny-list of perennial favourites.

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 6;

/// Trivial PINs rejected regardless of the structural checks.
const DENY_LIST: &[&str] = &["112233", "123123", "121212", "696969", "159753", "520520"];

/// Reasons a candidate PIN fails the strength policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinPolicyError {
    #[error("PIN must be exactly {PIN_LENGTH} digits")]
    WrongLength,
    #[error("PIN must contain only digits")]
    NonDigit,
    #[error("PIN must not repeat a single digit")]
    AllIdentical,
    #[error("PIN must not be an ascending or descending sequence")]
    Sequential,
    #[error("PIN is too common")]
    DenyListed,
}

/// Validate a candidate PIN against the strength policy.
pub fn validate_pin(pin: &str) -> Result<(), PinPolicyError> {
    if pin.len() != PIN_LENGTH {
        return Err(PinPolicyError::WrongLength);
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(PinPolicyError::NonDigit);
    }

    let digits: Vec<i16> = pin.bytes().map(|b| (b - b'0') as i16).collect();

    if digits.iter().all(|&d| d == digits[0]) {
        return Err(PinPolicyError::AllIdentical);
    }
    if digits.windows(2).all(|w| w[1] - w[0] == 1) || digits.windows(2).all(|w| w[0] - w[1] == 1) {
        return Err(PinPolicyError::Sequential);
    }
    if DENY_LIST.contains(&pin) {
        return Err(PinPolicyError::DenyListed);
    }

    Ok(())
}

/// Digit-at-a-time PIN entry buffer.
///
/// The unlock flow feeds digits in as the user types and auto-verifies when
/// the buffer is full; there is no explicit submit action. The buffer is
/// erased from memory on drop and never printed by `Debug`.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct PinBuffer {
    digits: String,
}

impl PinBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a digit. Non-digits and digits past the full length are
    /// ignored; returns whether the buffer is now complete.
    pub fn push(&mut self, c: char) -> bool {
        if c.is_ascii_digit() && self.digits.len() < PIN_LENGTH {
            self.digits.push(c);
        }
        self.is_complete()
    }

    /// Remove the most recently entered digit.
    pub fn erase(&mut self) {
        self.digits.pop();
    }

    /// Discard all entered digits.
    pub fn clear(&mut self) {
        self.digits.zeroize();
        self.digits.clear();
    }

    /// Number of digits entered so far (for masked UI dots).
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Whether all digits are present.
    pub fn is_complete(&self) -> bool {
        self.digits.len() == PIN_LENGTH
    }

    /// The entered PIN, only once complete.
    pub fn pin(&self) -> Option<&str> {
        self.is_complete().then_some(self.digits.as_str())
    }
}

impl std::fmt::Debug for PinBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinBuffer")
            .field("entered", &self.digits.len())
            .finish()
    }
}
