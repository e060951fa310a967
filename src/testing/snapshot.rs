use std::collections::BTreeMap;

use roaring::RoaringTreemap;

use crate::collection::Collection;
use crate::error::Result;
use crate::idmap::DenseId;
use crate::models::Record;
use crate::postings;
use crate::store::keys::{self, KeyClass};
use crate::tokenizer::{tokenize, Token};

/// Decoded copy of a whole keyspace, taken for invariant checking.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub kind: &'static str,
    /// 0 when the counter key is absent
    pub counter: DenseId,
    pub forward: BTreeMap<String, DenseId>,
    pub reverse: BTreeMap<DenseId, String>,
    /// Live record id -> its current tokenization
    pub records: BTreeMap<String, Vec<Token>>,
    pub postings: BTreeMap<String, RoaringTreemap>,
    /// Keys under `idmap/` with an unrecognized shape
    pub unknown: Vec<String>,
}

impl IndexSnapshot {
    pub fn capture<R: Record>(collection: &Collection<R>) -> Result<Self> {
        let mut snapshot = IndexSnapshot {
            kind: R::KIND,
            ..Default::default()
        };

        for (key, value) in collection.store().entries()? {
            match keys::classify(R::KIND, &key) {
                KeyClass::Counter => snapshot.counter = keys::decode_u64(&key, &value)?,
                KeyClass::Forward(id) => {
                    snapshot.forward.insert(id, keys::decode_u64(&key, &value)?);
                }
                KeyClass::Reverse(dense_id) => {
                    snapshot
                        .reverse
                        .insert(dense_id, String::from_utf8_lossy(&value).into_owned());
                }
                KeyClass::Primary(id) => {
                    let record: R = serde_json::from_slice(&value)?;
                    snapshot.records.insert(id, tokenize(&record));
                }
                KeyClass::Posting => {
                    let bitmap = postings::decode(&key, &value)?;
                    snapshot
                        .postings
                        .insert(String::from_utf8_lossy(&key).into_owned(), bitmap);
                }
                KeyClass::Unknown => snapshot
                    .unknown
                    .push(String::from_utf8_lossy(&key).into_owned()),
            }
        }

        Ok(snapshot)
    }

    /// Tokens whose posting list contains `dense_id`.
    pub fn tokens_posting(&self, dense_id: DenseId) -> Vec<&str> {
        self.postings
            .iter()
            .filter(|(_, bitmap)| bitmap.contains(dense_id))
            .map(|(token, _)| token.as_str())
            .collect()
    }
}
