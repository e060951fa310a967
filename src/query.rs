//! Filtered lookup over posting lists.
//!
//! Values requested for one field are OR-ed, the per-field unions are AND-ed.
//! `{status: [draft, listed], city: [NYC]}` matches records that are draft or
//! listed, and in NYC. A field the record kind does not tokenize matches
//! nothing.

use std::collections::BTreeMap;

use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Record;
use crate::postings;
use crate::store::KvRead;
use crate::tokenizer::{is_tokenized, Token};

/// Requested values per field
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, Vec<String>>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one accepted value for `field`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(field, value);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(value.into());
    }

    /// True when no field carries a value, i.e. the query matches nothing.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl From<BTreeMap<String, Vec<String>>> for Filters {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Filters(map)
    }
}

impl<F: Into<String>, V: Into<String>> FromIterator<(F, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (field, value) in iter {
            filters.push(field, value);
        }
        filters
    }
}

/// Dense ids surviving the filter, before record resolution
#[derive(Debug, Default)]
pub struct Matches {
    pub ids: RoaringTreemap,
    /// Sum of the per-field union cardinalities
    pub scanned_count: u64,
}

/// Records matched by a query, in ascending dense-id order
#[derive(Debug)]
pub struct QueryResult<R> {
    pub records: Vec<R>,
    pub scanned_count: u64,
}

impl<R> QueryResult<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Evaluate `filters` against the posting lists visible through `view`.
///
/// Fields with no values are ignored; if every field is, nothing matches.
/// Fields `R` does not tokenize are never read from the store.
pub fn matching<R: Record, V: KvRead + ?Sized>(view: &V, filters: &Filters) -> Result<Matches> {
    let mut unions = Vec::new();
    let mut scanned_count = 0u64;

    for (field, values) in filters.iter() {
        if values.is_empty() {
            continue;
        }
        let mut union = RoaringTreemap::new();
        if !is_tokenized::<R>(field) {
            unions.push(union);
            continue;
        }
        for value in values {
            union |= postings::bitmap_for_token(view, &Token::new(field, value))?;
        }
        scanned_count += union.len();
        unions.push(union);
    }

    // Smallest first so the running intersection shrinks fast
    unions.sort_by_key(|b| b.len());
    let mut iter = unions.into_iter();
    let mut ids = match iter.next() {
        Some(first) => first,
        None => return Ok(Matches::default()),
    };
    for other in iter {
        if ids.is_empty() {
            break;
        }
        ids &= other;
    }

    Ok(Matches { ids, scanned_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Durability;
    use crate::models::Trip;
    use crate::store::Store;
    use fjall::Database;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn seeded_store(dir: &TempDir) -> Store {
        let db = Database::builder(dir.path()).open().unwrap();
        let store = Store::open(Arc::new(db), "trip", Durability::Buffered).unwrap();

        let mut batch = store.begin();
        for (token, ids) in [
            (Token::new("status", "draft"), vec![1u64, 2, 3]),
            (Token::new("status", "listed"), vec![4, 5]),
            (Token::new("org_id", "nyc"), vec![2, 4, 6]),
        ] {
            for id in ids {
                postings::add(&mut batch, &token, id).unwrap();
            }
        }
        batch.commit().unwrap();
        store
    }

    fn ids(m: &Matches) -> Vec<u64> {
        m.ids.iter().collect()
    }

    #[test]
    fn test_single_value() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let m = matching::<Trip, _>(&store, &Filters::new().with("status", "draft")).unwrap();
        assert_eq!(ids(&m), vec![1, 2, 3]);
        assert_eq!(m.scanned_count, 3);
    }

    #[test]
    fn test_values_within_a_field_are_unioned() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let filters = Filters::new()
            .with("status", "draft")
            .with("status", "listed");
        let m = matching::<Trip, _>(&store, &filters).unwrap();
        assert_eq!(ids(&m), vec![1, 2, 3, 4, 5]);
        assert_eq!(m.scanned_count, 5);
    }

    #[test]
    fn test_fields_are_intersected() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let filters = Filters::new()
            .with("status", "draft")
            .with("status", "listed")
            .with("org_id", "nyc");
        let m = matching::<Trip, _>(&store, &filters).unwrap();
        assert_eq!(ids(&m), vec![2, 4]);
        assert_eq!(m.scanned_count, 5 + 3);
    }

    #[test]
    fn test_unknown_token_empties_the_result() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let filters = Filters::new()
            .with("status", "draft")
            .with("org_id", "paris");
        let m = matching::<Trip, _>(&store, &filters).unwrap();
        assert!(m.ids.is_empty());
        assert_eq!(m.scanned_count, 3);
    }

    #[test]
    fn test_empty_filters_match_nothing() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let m = matching::<Trip, _>(&store, &Filters::new()).unwrap();
        assert!(m.ids.is_empty());
        assert_eq!(m.scanned_count, 0);

        let mut map = BTreeMap::new();
        map.insert("status".to_string(), Vec::new());
        let filters = Filters::from(map);
        assert!(filters.is_empty());
        let m = matching::<Trip, _>(&store, &filters).unwrap();
        assert!(m.ids.is_empty());
        assert_eq!(m.scanned_count, 0);
    }

    #[test]
    fn test_empty_value_list_is_ignored_next_to_others() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        let mut map = BTreeMap::new();
        map.insert("status".to_string(), vec!["listed".to_string()]);
        map.insert("org_id".to_string(), Vec::new());
        let m = matching::<Trip, _>(&store, &Filters::from(map)).unwrap();
        assert_eq!(ids(&m), vec![4, 5]);
    }

    #[test]
    fn test_untokenized_field_matches_nothing_without_reading() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        // A primary record lives at `trip_id:A`; it must not be read as a posting
        let mut batch = store.begin();
        batch.insert(b"trip_id:A".to_vec(), br#"{"id":"A"}"#.to_vec());
        batch.commit().unwrap();

        for field in ["trip_id", "name", "latitude"] {
            let filters = Filters::new().with("status", "draft").with(field, "A");
            let m = matching::<Trip, _>(&store, &filters).unwrap();
            assert!(m.ids.is_empty(), "{} matched", field);
            assert_eq!(m.scanned_count, 3);
        }
    }

    #[test]
    fn test_filters_from_pairs() {
        let filters: Filters = vec![("status", "draft"), ("status", "listed"), ("city", "NYC")]
            .into_iter()
            .collect();
        let fields: Vec<(&str, usize)> = filters.iter().map(|(f, v)| (f, v.len())).collect();
        assert_eq!(fields, vec![("city", 1), ("status", 2)]);
    }

    #[test]
    fn test_filters_deserialize_from_json_object() {
        let filters: Filters =
            serde_json::from_str(r#"{"status":["draft"],"city":["NYC","LA"]}"#).unwrap();
        assert_eq!(
            filters,
            Filters::new()
                .with("city", "NYC")
                .with("city", "LA")
                .with("status", "draft")
        );
    }
}
