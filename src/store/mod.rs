//! Storage substrate: one fjall keyspace per record kind, the flat key layout
//! used inside it, and a read-your-writes batch that commits atomically.

mod batch;
pub mod keys;
mod kv;

pub use batch::IndexedBatch;
pub use kv::Store;

use crate::Result;

/// Point reads against either committed state or a batch's view of it.
pub trait KvRead {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

impl KvRead for Store {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Store::get(self, key)
    }
}

impl KvRead for IndexedBatch<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        IndexedBatch::get(self, key)
    }
}
