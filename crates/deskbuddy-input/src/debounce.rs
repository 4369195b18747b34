//! Per-key cooldown.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::keymap::KeyCode;

/// Suppresses a key that fires again within `cooldown` of its last accepted
/// press. Each key code has its own window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown: Duration,
    last_fired: HashMap<KeyCode, Instant>,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns `true` and records the press if `key` is outside its window.
    ///
    /// A suppressed press does not extend the window.
    pub fn accept(&mut self, key: KeyCode, at: Instant) -> bool {
        if let Some(last) = self.last_fired.get(&key) {
            if at.saturating_duration_since(*last) < self.cooldown {
                return false;
            }
        }
        self.last_fired.insert(key, at);
        true
    }

    pub fn reset(&mut self) {
        self.last_fired.clear();
    }
}
