//! Dense ID remapping
//!
//! Bitmaps want small dense integers, callers hand us ULID strings. Each
//! identifier is assigned a `u64` from a persistent counter on first sight:
//! - `idmap/u/<identifier>` -> dense id
//! - `idmap/i/<dense id>` -> identifier
//! - `idmap/ctr` -> last dense id handed out
//!
//! The three keys are always written in one batch. Mappings are append-only:
//! nothing in the engine removes them, including record deletion.

use std::sync::Arc;

use tracing::debug;

use crate::store::keys::{self, COUNTER_KEY};
use crate::store::{IndexedBatch, Store};
use crate::{Result, TokenDbError};

/// Dense integer standing in for an external identifier in posting lists
pub type DenseId = u64;

#[derive(Clone)]
pub struct IdMap {
    store: Arc<Store>,
}

impl IdMap {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Forward lookup; `None` if the identifier was never allocated.
    pub fn lookup(&self, identifier: &str) -> Result<Option<DenseId>> {
        let key = keys::forward_key(identifier);
        self.store
            .get(&key)?
            .map(|v| keys::decode_u64(&key, &v))
            .transpose()
    }

    /// Reverse lookup; `None` if no identifier owns `dense_id`.
    pub fn reverse(&self, dense_id: DenseId) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&keys::reverse_key(dense_id))?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    /// Last dense id handed out, 0 for a fresh store.
    pub fn counter(&self) -> Result<DenseId> {
        match self.store.get(COUNTER_KEY)? {
            Some(v) => keys::decode_u64(COUNTER_KEY, &v),
            None => Ok(0),
        }
    }

    /// Return the existing mapping or allocate and commit a new one.
    pub fn get_or_allocate(&self, identifier: &str) -> Result<DenseId> {
        if let Some(existing) = self.lookup(identifier)? {
            return Ok(existing);
        }
        let mut batch = self.store.begin();
        let dense_id = Self::get_or_allocate_in(&mut batch, identifier)?;
        batch.commit()?;
        Ok(dense_id)
    }

    /// Allocate inside a caller's batch so the mapping commits (or is
    /// discarded) together with the caller's other writes.
    ///
    /// The forward key is re-read through the batch: with the writer lock
    /// held this makes allocation race-free.
    pub fn get_or_allocate_in(batch: &mut IndexedBatch<'_>, identifier: &str) -> Result<DenseId> {
        let forward = keys::forward_key(identifier);
        if let Some(v) = batch.get(&forward)? {
            return keys::decode_u64(&forward, &v);
        }

        let current = match batch.get(COUNTER_KEY)? {
            Some(v) => keys::decode_u64(COUNTER_KEY, &v)?,
            None => 0,
        };
        let next = current.checked_add(1).ok_or_else(|| {
            TokenDbError::Internal(format!("dense id counter exhausted at {}", current))
        })?;

        batch.insert(COUNTER_KEY, keys::encode_u64(next));
        batch.insert(forward, keys::encode_u64(next));
        batch.insert(keys::reverse_key(next), identifier.as_bytes());

        debug!(identifier, dense_id = next, "allocated dense id");
        Ok(next)
    }

    /// Forward lookup through a batch's view.
    pub fn lookup_in(batch: &IndexedBatch<'_>, identifier: &str) -> Result<Option<DenseId>> {
        let key = keys::forward_key(identifier);
        batch
            .get(&key)?
            .map(|v| keys::decode_u64(&key, &v))
            .transpose()
    }
}
