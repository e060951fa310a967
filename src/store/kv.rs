use std::sync::Arc;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use parking_lot::Mutex;

use crate::config::Durability;
use crate::error::{Result, TokenDbError};
use crate::store::IndexedBatch;

fn store_err(e: impl std::fmt::Display) -> TokenDbError {
    TokenDbError::Store(e.to_string())
}

/// Fjall keyspace holding every key of one record kind.
///
/// All mutation goes through [`IndexedBatch`], which holds `write_lock` from
/// its first read until commit, so read-modify-write cycles on shared posting
/// keys never interleave.
pub struct Store {
    db: Arc<Database>,
    keyspace: Keyspace,
    durability: Durability,
    write_lock: Mutex<()>,
}

impl Store {
    pub fn open(db: Arc<Database>, name: &str, durability: Durability) -> Result<Self> {
        let keyspace = db
            .keyspace(name, || KeyspaceCreateOptions::default())
            .map_err(|e| TokenDbError::Store(format!("failed to open keyspace {}: {}", name, e)))?;
        Ok(Self {
            db,
            keyspace,
            durability,
            write_lock: Mutex::new(()),
        })
    }

    /// Point read of committed state.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self
            .keyspace
            .get(key)
            .map_err(store_err)?
            .map(|v| v.as_ref().to_vec()))
    }

    /// Start a batch. Blocks until no other batch on this store is open.
    pub fn begin(&self) -> IndexedBatch<'_> {
        IndexedBatch::new(self, self.write_lock.lock())
    }

    /// Every committed key/value pair, in key order.
    pub fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        for kv in self.keyspace.iter() {
            let (key, value) = kv.into_inner().map_err(store_err)?;
            out.push((key.as_ref().to_vec(), value.as_ref().to_vec()));
        }
        Ok(out)
    }

    /// Apply pending mutations as one atomic fjall batch, then flush per the
    /// configured durability.
    pub(crate) fn apply(&self, pending: Vec<(Vec<u8>, Option<Vec<u8>>)>) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let mut batch = self.db.batch();
        for (key, value) in pending {
            match value {
                Some(value) => batch.insert(&self.keyspace, key, value),
                None => batch.remove(&self.keyspace, key),
            }
        }
        batch.commit().map_err(store_err)?;
        if let Some(mode) = self.durability.persist_mode() {
            self.db.persist(mode).map_err(store_err)?;
        }
        Ok(())
    }
}
