//! Write pipeline and reads for one record kind.
//!
//! Every mutation runs as one [`IndexedBatch`]: the primary snapshot, the
//! posting list changes and (on create) the dense id allocation commit
//! together or not at all.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use roaring::RoaringTreemap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, TokenDbError};
use crate::idmap::{DenseId, IdMap};
use crate::metrics::EngineMetrics;
use crate::models::Record;
use crate::postings;
use crate::query::{self, Filters, QueryResult};
use crate::store::keys::{self, KeyClass};
use crate::store::{IndexedBatch, KvRead, Store};
use crate::tokenizer::{is_tokenized, tokenize, Token};

/// Handle to the records of kind `R`. Cheap to clone.
pub struct Collection<R: Record> {
    store: Arc<Store>,
    ids: IdMap,
    metrics: Arc<EngineMetrics>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ids: self.ids.clone(),
            metrics: self.metrics.clone(),
            _kind: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    pub fn new(store: Arc<Store>, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            ids: IdMap::new(store.clone()),
            store,
            metrics,
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> &'static str {
        R::KIND
    }

    pub fn id_map(&self) -> &IdMap {
        &self.ids
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    /// Dense id of `id`, if one was ever allocated.
    pub fn dense_id(&self, id: &str) -> Result<Option<DenseId>> {
        self.ids.lookup(id)
    }

    /// Store `record` and index it. An existing record with the same id is
    /// overwritten and its stale postings dropped.
    pub fn create(&self, record: &R) -> Result<String> {
        let start = Instant::now();
        let id = record.id();
        let mut batch = self.store.begin();

        let dense_id = IdMap::get_or_allocate_in(&mut batch, id)?;
        let previous = load::<R, _>(&batch, id)?;
        let changed = write_indexed(&mut batch, dense_id, previous.as_ref(), record)?;
        batch.commit()?;

        debug!(kind = R::KIND, id, dense_id, tokens = changed, "created record");
        self.metrics.record_create(start.elapsed().as_secs_f64());
        Ok(id.to_string())
    }

    pub fn read(&self, id: &str) -> Result<R> {
        load::<R, _>(self.store.as_ref(), id)?.ok_or_else(|| TokenDbError::not_found(R::KIND, id))
    }

    /// Point reads in order. Fails on the first missing id.
    pub fn read_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<R>> {
        ids.iter().map(|id| self.read(id.as_ref())).collect()
    }

    /// Read `id` only if it is posted under `scope_field:scope_value`.
    pub fn read_scoped(&self, scope_field: &str, scope_value: &str, id: &str) -> Result<R> {
        let dense_id = self
            .ids
            .lookup(id)?
            .ok_or_else(|| TokenDbError::not_found(R::KIND, id))?;
        let scope = self.bitmap_for_token(scope_field, scope_value)?;
        if !scope.contains(dense_id) {
            debug!(kind = R::KIND, id, scope_field, scope_value, "record outside scope");
            return Err(TokenDbError::not_found(R::KIND, id));
        }
        self.read(id)
    }

    /// Replace the stored record `id` with `record` and re-index the
    /// difference.
    pub fn update(&self, id: &str, record: &R) -> Result<()> {
        if record.id() != id {
            return Err(TokenDbError::InvalidRequest(format!(
                "record id '{}' does not match '{}'",
                record.id(),
                id
            )));
        }
        let start = Instant::now();
        let mut batch = self.store.begin();

        let dense_id =
            IdMap::lookup_in(&batch, id)?.ok_or_else(|| TokenDbError::not_found(R::KIND, id))?;
        let previous =
            load::<R, _>(&batch, id)?.ok_or_else(|| TokenDbError::not_found(R::KIND, id))?;
        let changed = write_indexed(&mut batch, dense_id, Some(&previous), record)?;
        batch.commit()?;

        debug!(kind = R::KIND, id, dense_id, tokens = changed, "updated record");
        self.metrics.record_update(start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Remove the record and its postings. Unknown ids are a no-op; the dense
    /// id mapping is kept.
    pub fn delete(&self, id: &str) -> Result<()> {
        let start = Instant::now();
        let mut batch = self.store.begin();

        let Some(dense_id) = IdMap::lookup_in(&batch, id)? else {
            return Ok(());
        };
        let Some(previous) = load::<R, _>(&batch, id)? else {
            return Ok(());
        };

        let tokens = tokenize(&previous);
        for token in &tokens {
            postings::remove(&mut batch, token, dense_id)?;
        }
        batch.remove(keys::primary_key(R::KIND, id));
        batch.commit()?;

        debug!(kind = R::KIND, id, dense_id, tokens = tokens.len(), "deleted record");
        self.metrics.record_delete(start.elapsed().as_secs_f64());
        Ok(())
    }

    pub fn query(&self, filters: &Filters) -> Result<QueryResult<R>> {
        let matches = query::matching::<R, _>(self.store.as_ref(), filters)?;
        self.metrics.record_query(matches.scanned_count);

        if matches.ids.is_empty() {
            debug!(kind = R::KIND, scanned = matches.scanned_count, "query matched nothing");
            return Ok(QueryResult {
                records: Vec::new(),
                scanned_count: matches.scanned_count,
            });
        }

        let mut records = Vec::with_capacity(matches.ids.len() as usize);
        for dense_id in matches.ids.iter() {
            if let Some(record) = self.resolve(dense_id)? {
                records.push(record);
            }
        }
        debug!(
            kind = R::KIND,
            matched = records.len(),
            scanned = matches.scanned_count,
            "query evaluated"
        );
        Ok(QueryResult {
            records,
            scanned_count: matches.scanned_count,
        })
    }

    /// Posting list of `field:value`. Fields `R` does not tokenize are empty.
    pub fn bitmap_for_token(&self, field: &str, value: &str) -> Result<RoaringTreemap> {
        if !is_tokenized::<R>(field) {
            return Ok(RoaringTreemap::new());
        }
        postings::bitmap_for_token(self.store.as_ref(), &Token::new(field, value))
    }

    /// True when no record is posted under `field:value`.
    pub fn is_vacant(&self, field: &str, value: &str) -> Result<bool> {
        Ok(self.bitmap_for_token(field, value)?.is_empty())
    }

    /// Record with the lowest dense id posted under `field:value`.
    pub fn find_first(&self, field: &str, value: &str) -> Result<Option<R>> {
        match self.bitmap_for_token(field, value)?.min() {
            Some(dense_id) => self.resolve(dense_id),
            None => Ok(None),
        }
    }

    /// Every key of this kind, decoded for inspection.
    pub fn dump(&self) -> Result<BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        for (key, value) in self.store.entries()? {
            let (name, rendered) = match keys::classify(R::KIND, &key) {
                KeyClass::Counter | KeyClass::Forward(_) => (
                    String::from_utf8_lossy(&key).into_owned(),
                    Value::from(keys::decode_u64(&key, &value)?),
                ),
                KeyClass::Reverse(dense_id) => (
                    format!("idmap/i/{}", dense_id),
                    Value::from(String::from_utf8_lossy(&value).into_owned()),
                ),
                KeyClass::Primary(_) => (
                    String::from_utf8_lossy(&key).into_owned(),
                    serde_json::from_slice(&value)?,
                ),
                KeyClass::Posting => (
                    String::from_utf8_lossy(&key).into_owned(),
                    Value::from(postings::decode(&key, &value)?.iter().collect::<Vec<u64>>()),
                ),
                KeyClass::Unknown => (
                    String::from_utf8_lossy(&key).into_owned(),
                    Value::from(String::from_utf8_lossy(&value).into_owned()),
                ),
            };
            out.insert(name, rendered);
        }
        Ok(out)
    }

    /// Reverse-map and read one posted dense id. Ghost references yield `None`.
    fn resolve(&self, dense_id: DenseId) -> Result<Option<R>> {
        let Some(id) = self.ids.reverse(dense_id)? else {
            warn!(kind = R::KIND, dense_id, "posted dense id has no identifier, skipping");
            self.metrics.record_ghost();
            return Ok(None);
        };
        let record = load::<R, _>(self.store.as_ref(), &id)?;
        if record.is_none() {
            warn!(kind = R::KIND, dense_id, id = %id, "posted record is missing, skipping");
            self.metrics.record_ghost();
        }
        Ok(record)
    }
}

fn load<R: Record, V: KvRead + ?Sized>(view: &V, id: &str) -> Result<Option<R>> {
    match view.get(&keys::primary_key(R::KIND, id))? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Write `next` under its primary key and move `dense_id` from the postings
/// of `previous` to those of `next`. Tokens shared by both are untouched.
/// Returns the number of posting lists changed.
fn write_indexed<R: Record>(
    batch: &mut IndexedBatch<'_>,
    dense_id: DenseId,
    previous: Option<&R>,
    next: &R,
) -> Result<usize> {
    let old: BTreeSet<Token> = previous.map(tokenize).unwrap_or_default().into_iter().collect();
    let new: BTreeSet<Token> = tokenize(next).into_iter().collect();

    let mut changed = 0;
    for token in old.difference(&new) {
        if postings::remove(batch, token, dense_id)? {
            changed += 1;
        }
    }
    for token in new.difference(&old) {
        if postings::add(batch, token, dense_id)? {
            changed += 1;
        }
    }
    batch.insert(
        keys::primary_key(R::KIND, next.id()),
        serde_json::to_vec(next)?,
    );
    Ok(changed)
}
