//! Per-key mutual exclusion for check-then-write sequences.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A lazily-populated table of mutexes, one per key.
///
/// Enrollment saves hold the lock of every batch they touch across the
/// duplicate check, capacity check, write and seat recount. Payments hold
/// their invoice's lock from the draft entry to the reconciled invoice.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    table: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Clone + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &K) -> Arc<Mutex<()>> {
        // The table only holds `()` payloads, so a poisoned guard is still usable.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.entry(key.clone()).or_default().clone()
    }

    /// Run `f` while holding the locks of all `keys`.
    ///
    /// Keys are locked in sorted order so two callers locking overlapping
    /// sets cannot deadlock.
    pub fn with<T>(&self, keys: &[K], f: impl FnOnce() -> T) -> T {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        let mutexes: Vec<Arc<Mutex<()>>> = keys.iter().map(|k| self.entry(k)).collect();
        let _guards: Vec<MutexGuard<'_, ()>> = mutexes
            .iter()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        f()
    }
}
