//! Posting lists: one roaring treemap of dense ids per token.
//!
//! An absent key and an empty list are the same thing; mutations delete the
//! key instead of writing an empty bitmap.

use std::io::Cursor;

use roaring::RoaringTreemap;

use crate::error::{Result, TokenDbError};
use crate::idmap::DenseId;
use crate::store::{IndexedBatch, KvRead};
use crate::tokenizer::Token;

/// Decode a stored posting list. Empty input is an empty list.
pub fn decode(key: &[u8], bytes: &[u8]) -> Result<RoaringTreemap> {
    if bytes.is_empty() {
        return Ok(RoaringTreemap::new());
    }
    let mut cursor = Cursor::new(bytes);
    let bitmap = RoaringTreemap::deserialize_from(&mut cursor)
        .map_err(|e| TokenDbError::corrupt(key, e))?;
    if cursor.position() as usize != bytes.len() {
        return Err(TokenDbError::corrupt(
            key,
            format!(
                "{} trailing bytes after posting list",
                bytes.len() - cursor.position() as usize
            ),
        ));
    }
    Ok(bitmap)
}

/// Encode a posting list, run-compressing its containers first.
pub fn encode(bitmap: &RoaringTreemap) -> Result<Vec<u8>> {
    let optimized = RoaringTreemap::from_bitmaps(bitmap.bitmaps().map(|(hi, lo)| {
        let mut lo = lo.clone();
        lo.optimize();
        (hi, lo)
    }));
    let mut out = Vec::with_capacity(optimized.serialized_size());
    optimized.serialize_into(&mut out)?;
    Ok(out)
}

/// Current posting list for `token`; absent keys yield an empty list.
pub fn bitmap_for_token<V: KvRead + ?Sized>(view: &V, token: &Token) -> Result<RoaringTreemap> {
    match view.get(token.as_bytes())? {
        Some(bytes) => decode(token.as_bytes(), &bytes),
        None => Ok(RoaringTreemap::new()),
    }
}

/// Add `dense_id` to the posting list of `token`. Returns false if it was
/// already a member, in which case nothing is written.
pub fn add(batch: &mut IndexedBatch<'_>, token: &Token, dense_id: DenseId) -> Result<bool> {
    let mut bitmap = bitmap_for_token(&*batch, token)?;
    if !bitmap.insert(dense_id) {
        return Ok(false);
    }
    batch.insert(token.as_bytes(), encode(&bitmap)?);
    Ok(true)
}

/// Remove `dense_id` from the posting list of `token`, deleting the key once
/// the list is empty. Returns false if it was not a member.
pub fn remove(batch: &mut IndexedBatch<'_>, token: &Token, dense_id: DenseId) -> Result<bool> {
    let mut bitmap = bitmap_for_token(&*batch, token)?;
    if !bitmap.remove(dense_id) {
        return Ok(false);
    }
    if bitmap.is_empty() {
        batch.remove(token.as_bytes());
    } else {
        batch.insert(token.as_bytes(), encode(&bitmap)?);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Durability;
    use crate::store::Store;
    use fjall::Database;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> Store {
        let db = Database::builder(dir.path()).open().unwrap();
        Store::open(Arc::new(db), "trip", Durability::Buffered).unwrap()
    }

    #[test]
    fn test_decode_empty_input() {
        let bitmap = decode(b"status:draft", &[]).unwrap();
        assert!(bitmap.is_empty());
    }

    #[test]
    fn test_encode_decode() {
        let mut bitmap = RoaringTreemap::new();
        bitmap.insert_range(1..5_000);
        bitmap.insert(1 << 40);

        let bytes = encode(&bitmap).unwrap();
        let decoded = decode(b"k", &bytes).unwrap();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn test_dense_runs_compress() {
        let mut bitmap = RoaringTreemap::new();
        bitmap.insert_range(1..60_000);

        let bytes = encode(&bitmap).unwrap();
        // A bitset container alone is 8KB
        assert!(bytes.len() < 1024, "encoded {} bytes", bytes.len());
    }

    #[test]
    fn test_corrupt_input_is_rejected() {
        let err = decode(b"status:draft", &[0xde, 0xad, 0xbe, 0xef, 0x01]).unwrap_err();
        match err {
            TokenDbError::Corrupt { key, .. } => assert_eq!(key, "status:draft"),
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let mut bitmap = RoaringTreemap::new();
        bitmap.insert(7);
        let mut bytes = encode(&bitmap).unwrap();
        bytes.push(0);
        assert!(matches!(
            decode(b"k", &bytes),
            Err(TokenDbError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_absent_token_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let bitmap = bitmap_for_token(&store, &Token::new("status", "draft")).unwrap();
        assert!(bitmap.is_empty());
    }

    #[test]
    fn test_add_and_remove_in_batch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let token = Token::new("status", "draft");

        let mut batch = store.begin();
        assert!(add(&mut batch, &token, 1).unwrap());
        assert!(add(&mut batch, &token, 2).unwrap());
        assert!(!add(&mut batch, &token, 2).unwrap());
        assert_eq!(bitmap_for_token(&batch, &token).unwrap().len(), 2);
        batch.commit().unwrap();

        let committed = bitmap_for_token(&store, &token).unwrap();
        assert_eq!(committed.iter().collect::<Vec<_>>(), vec![1, 2]);

        let mut batch = store.begin();
        assert!(remove(&mut batch, &token, 1).unwrap());
        assert!(!remove(&mut batch, &token, 1).unwrap());
        batch.commit().unwrap();
        assert_eq!(
            bitmap_for_token(&store, &token).unwrap().iter().collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn test_emptied_list_deletes_key() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let token = Token::new("city", "NYC");

        let mut batch = store.begin();
        add(&mut batch, &token, 9).unwrap();
        batch.commit().unwrap();
        assert!(store.get(token.as_bytes()).unwrap().is_some());

        let mut batch = store.begin();
        remove(&mut batch, &token, 9).unwrap();
        batch.commit().unwrap();
        assert_eq!(store.get(token.as_bytes()).unwrap(), None);
    }

    #[test]
    fn test_corrupt_stored_list_fails_mutation() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let token = Token::new("status", "draft");

        let mut batch = store.begin();
        batch.insert(token.as_bytes(), vec![0xff, 0xff, 0xff]);
        batch.commit().unwrap();

        let mut batch = store.begin();
        assert!(matches!(
            add(&mut batch, &token, 1),
            Err(TokenDbError::Corrupt { .. })
        ));
    }
}
