//! Process-local failure counters.
//!
//! Deliberately not persisted: a process restart resets the counts. The real
//! rate limit on guessing is the key-derivation cost per attempt, not this
//! counter - it exists for messaging, not throttling.

use std::collections::HashMap;

/// Consecutive unlock failures, per user id, created lazily on first failure.
#[derive(Debug, Default)]
pub struct UnlockAttempts {
    counts: HashMap<String, u32>,
}

impl UnlockAttempts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return the new consecutive count.
    pub fn record_failure(&mut self, user_id: &str) -> u32 {
        let count = self.counts.entry(user_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Current consecutive count (0 when no failures recorded).
    pub fn count(&self, user_id: &str) -> u32 {
        self.counts.get(user_id).copied().unwrap_or(0)
    }

    /// Clear on success or recovery.
    pub fn clear(&mut self, user_id: &str) {
        self.counts.remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_per_user_and_clear_on_success() {
        let mut attempts = UnlockAttempts::new();
        assert_eq!(attempts.count("u1"), 0);

        assert_eq!(attempts.record_failure("u1"), 1);
        assert_eq!(attempts.record_failure("u1"), 2);
        assert_eq!(attempts.record_failure("u2"), 1);

        attempts.clear("u1");
        assert_eq!(attempts.count("u1"), 0);
        assert_eq!(attempts.count("u2"), 1);
    }
}
