//! Nonce replay tracking

use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of nonces remembered before the oldest is dropped
pub const DEFAULT_CAPACITY: usize = 4096;

/// Set of nonce values seen during the process lifetime
///
/// Capacity-bounded FIFO: a long-lived process cannot grow without
/// limit, and a replay older than the window is no longer detected.
pub struct NonceTracker {
    seen: Mutex<VecDeque<Vec<u8>>>,
    capacity: usize,
}

impl NonceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record `nonce` if unseen; returns false on replay
    pub fn check_and_insert(&self, nonce: &[u8]) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        if seen.iter().any(|n| n == nonce) {
            return false;
        }
        if seen.len() == self.capacity {
            seen.pop_front();
        }
        seen.push_back(nonce.to_vec());
        true
    }
}

impl Default for NonceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
