//! Per-sender in-flight tracking for long-running commands.
//!
//! A [`BusyGuard`] marks `(class, sender)` as busy until it is dropped, so the
//! flag clears on success, error, and panic alike.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of `(command class, sender)` pairs currently being processed.
#[derive(Debug, Clone, Default)]
pub struct BusyRegistry {
    inner: Arc<Mutex<HashSet<(String, String)>>>,
}

/// Releases its slot in the registry on drop.
#[derive(Debug)]
pub struct BusyGuard {
    registry: BusyRegistry,
    key: (String, String),
}

impl BusyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<(String, String)>> {
        // A panic while holding the lock leaves the set itself consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark `sender` busy for `class`. Returns `None` if already busy.
    pub fn try_acquire(&self, class: &str, sender: &str) -> Option<BusyGuard> {
        let key = (class.to_string(), crate::phone::digits(sender));
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(BusyGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn is_busy(&self, class: &str, sender: &str) -> bool {
        self.lock()
            .contains(&(class.to_string(), crate::phone::digits(sender)))
    }

    /// Snapshot of busy pairs, for diagnostics.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.lock().iter().cloned().collect();
        pairs.sort();
        pairs
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
