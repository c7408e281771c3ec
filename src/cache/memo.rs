//! Explicit input-keyed memoization.

use std::sync::{Arc, RwLock};

use crate::cache::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::memo";

/// Caches the result of one computation, keyed by its inputs.
///
/// Holds only the most recent `(key, value)` pair: recomputation happens
/// exactly when the key differs from the cached one, and invalidation is
/// an explicit call rather than hidden dependency tracking. The cell is
/// cheap to clone and clones share state.
#[derive(Debug, Clone)]
pub struct MemoCell<K, V> {
    slot: Arc<RwLock<Option<(K, V)>>>,
}

impl<K, V> MemoCell<K, V>
where
    K: PartialEq,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Return the cached value for `key`, computing and storing it when
    /// the key is absent or different.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        {
            let slot = rw_read(&self.slot, SOURCE, "get");
            if let Some((cached_key, value)) = slot.as_ref() {
                if *cached_key == key {
                    return value.clone();
                }
            }
        }
        let value = compute();
        *rw_write(&self.slot, SOURCE, "insert") = Some((key, value.clone()));
        value
    }

    /// Drop the cached pair, forcing the next lookup to recompute.
    pub fn invalidate(&self) {
        *rw_write(&self.slot, SOURCE, "invalidate") = None;
    }
}

impl<K, V> Default for MemoCell<K, V>
where
    K: PartialEq,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
