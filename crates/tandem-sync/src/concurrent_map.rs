//! Concurrent Hash Map
//!
//! A hash map guarded by a single reader/writer lock. Writers take the lock
//! exclusively for the whole map, so a write to any key blocks every reader
//! and writer until it completes; readers run concurrently with each other.
//!
//! Values are cloned out on read, so no reference into the store ever
//! outlives the lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

/// Reader/writer locked key/value store.
///
/// Every operation is linearizable: a reader never observes a half-applied
/// write, and writes to distinct keys never interfere with each other.
pub struct ConcurrentMap<K, V> {
    items: RwLock<HashMap<K, V>>,
}

impl<K: Hash + Eq, V> ConcurrentMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty map with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Insert or overwrite the entry for `key`, returning the replaced value
    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.items.write().insert(key, value)
    }

    /// Get a copy of the value for `key`.
    ///
    /// `None` is the "absent key" outcome, not an error.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.items.read().get(key).cloned()
    }

    /// Get the value for `key`, or `V::default()` when absent
    pub fn get_or_default<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone + Default,
    {
        self.get(key).unwrap_or_default()
    }

    /// Read-modify-write `key` under one exclusive lock.
    ///
    /// An absent key starts from `V::default()`. Returns the new value.
    pub fn update<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(&mut V),
        V: Clone + Default,
    {
        let mut items = self.items.write();
        let slot = items.entry(key).or_default();
        f(slot);
        slot.clone()
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.items.write().remove(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.items.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.items.write().clear();
    }

    /// Copy of the whole map taken under one shared lock
    pub fn snapshot(&self) -> HashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.items.read().clone()
    }
}

impl<K: Hash + Eq, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ConcurrentMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items.read().iter()).finish()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for ConcurrentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: RwLock::new(iter.into_iter().collect()),
        }
    }
}
