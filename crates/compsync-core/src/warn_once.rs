//! Per-session warning de-duplication.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::warn;

/// Emits each distinct warning message at most once.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: Mutex<HashSet<String>>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` unless the same text was already logged.
    ///
    /// Returns `true` if the warning was emitted.
    pub fn warn(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut seen = self.seen.lock();
        if seen.contains(&message) {
            return false;
        }
        warn!("{}", message);
        seen.insert(message);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
