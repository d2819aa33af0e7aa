//! Keyed trailing-edge debouncer
//!
//! Each key has at most one pending deadline. Scheduling a key again replaces
//! its deadline, so a burst of events collapses into a single firing once the
//! key has been quiet for the whole window. The caller supplies the clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    window: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Move a pending deadline from `old` to `new`.
    ///
    /// If both are pending the later deadline wins.
    pub fn rekey(&mut self, old: &K, new: K) -> bool {
        let Some(deadline) = self.pending.remove(old) else {
            return false;
        };
        let entry = self.pending.entry(new).or_insert(deadline);
        if *entry < deadline {
            *entry = deadline;
        }
        true
    }
}

#[cfg(any(feature = "watch", test))]
impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)start the window for `key` at `now`
    pub fn schedule(&mut self, key: K, now: Instant) {
        self.pending.insert(key, now + self.window);
    }

    /// Drop the pending deadline for `key`, returning whether one existed
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, K)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, key.clone()))
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);

        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
