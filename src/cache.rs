//! In-process compute-once caches
//!
//! Both shared caches of a run (external image digests and git checkouts) are
//! `KeyedCache`s. The map lock is only held for the check-then-insert of a
//! per-key slot; the slot lock is held while the value is computed, so each
//! key is computed at most once while different keys proceed in parallel.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

type Slot<V> = Arc<Mutex<Option<V>>>;

/// Thread-safe cache that computes each key at most once
#[derive(Debug)]
pub struct KeyedCache<K, V> {
    name: &'static str,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new empty cache; `name` is used in lock-poisoning errors
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get a cached value, or compute and cache it if not present
    ///
    /// Concurrent callers asking for the same key block on the key's slot
    /// until the first caller has finished computing. A failed computation
    /// leaves the slot empty, so a later caller retries.
    pub fn get_or_compute<F>(&self, key: &K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| self.poisoned())?;
            Arc::clone(
                slots
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(None))),
            )
        };

        let mut value = slot.lock().map_err(|_| self.poisoned())?;
        if let Some(cached) = value.as_ref() {
            return Ok(cached.clone());
        }

        let computed = compute()?;
        *value = Some(computed.clone());
        Ok(computed)
    }

    /// Get a value from cache without computing
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let slot = {
            let slots = self.slots.lock().map_err(|_| self.poisoned())?;
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return Ok(None),
            }
        };
        let value = slot.lock().map_err(|_| self.poisoned())?;
        Ok(value.clone())
    }

    /// Number of keys with a computed value
    pub fn len(&self) -> Result<usize> {
        let slots = self.slots.lock().map_err(|_| self.poisoned())?;
        let mut count = 0;
        for slot in slots.values() {
            if slot.lock().map_err(|_| self.poisoned())?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Check if no value has been computed yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn poisoned(&self) -> Error {
        Error::LockPoisoned {
            context: format!("{} cache", self.name),
        }
    }
}

/// External image reference -> current digest
pub type DigestCache = KeyedCache<String, String>;

/// `url@branch` -> checked out working directory
pub type CheckoutCache = KeyedCache<String, PathBuf>;
