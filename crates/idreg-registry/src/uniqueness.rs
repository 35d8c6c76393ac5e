//! # Uniqueness Index
//!
//! `K → TokenId`, guaranteeing a key maps to at most one token. Used for
//! emails and external ids. Entries are permanent: a key, once used, cannot
//! be issued again even if its record turns out to be erroneous.

use serde::{Deserialize, Serialize};

use idreg_core::TokenId;

use crate::store::OrderedStore;

/// A permanent unique-key reservation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize + Ord",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct UniqueIndex<K> {
    entries: OrderedStore<K, TokenId>,
}

impl<K: Ord> UniqueIndex<K> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: OrderedStore::new(),
        }
    }

    /// Whether `key` is taken.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Token that reserved `key`.
    pub fn lookup(&self, key: &K) -> Option<&TokenId> {
        self.entries.get(key)
    }

    /// Number of reserved keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is reserved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All `(key, token)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &TokenId)> {
        self.entries.iter()
    }

    /// Reserve `key` for `token`. The caller has already checked
    /// [`contains`](Self::contains); the registry never overwrites.
    pub(crate) fn reserve(&mut self, key: K, token: TokenId) {
        let previous = self.entries.insert(key, token);
        debug_assert!(previous.is_none(), "uniqueness index entry overwritten");
    }
}

impl<K: Ord> Default for UniqueIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
