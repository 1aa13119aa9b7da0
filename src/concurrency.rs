//! Per-key serialization of store mutations.

use crate::types::VariantKey;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Hands out one lock per (slot, entity) key.
///
/// Holders take the write side around every scan-then-transaction sequence so
/// concurrent regenerations for the same key cannot interleave their batches.
/// Callers hand the key back with [`KeyLockManager::release`] once they have
/// dropped their lock, which keeps the table bounded by the keys in flight.
#[derive(Debug, Default)]
pub struct KeyLockManager {
    locks: Mutex<HashMap<VariantKey, Arc<RwLock<()>>>>,
}

impl KeyLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for the key, created on first use
    pub fn get_lock(&self, key: &VariantKey) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Drop the entry for `key` when the table holds the only reference.
    ///
    /// An entry still cloned by another caller stays, so every holder keeps
    /// sharing the same lock.
    pub fn release(&self, key: &VariantKey) {
        let mut locks = self.locks.lock();
        if locks
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
