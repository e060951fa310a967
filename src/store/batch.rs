use std::collections::BTreeMap;

use parking_lot::MutexGuard;

use crate::store::Store;
use crate::Result;

/// Atomic batch with read-your-writes.
///
/// Reads consult the batch's own pending mutations before committed state.
/// The store's writer lock is held for the batch's whole lifetime; dropping
/// the batch without `commit` discards every pending mutation.
pub struct IndexedBatch<'a> {
    store: &'a Store,
    /// `None` marks a pending delete
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> IndexedBatch<'a> {
    pub(crate) fn new(store: &'a Store, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
            _guard: guard,
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.store.get(key),
        }
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.pending.insert(key.into(), Some(value.into()));
    }

    pub fn remove(&mut self, key: impl Into<Vec<u8>>) {
        self.pending.insert(key.into(), None);
    }

    /// Number of distinct keys this batch will write or delete.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Commit every pending mutation atomically. Returns the number of keys touched.
    pub fn commit(self) -> Result<usize> {
        let touched = self.pending.len();
        self.store.apply(self.pending.into_iter().collect())?;
        Ok(touched)
    }
}
