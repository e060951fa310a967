use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::tokenizer::IndexedField;

/// A record kind the engine can store and index.
///
/// Implementors declare their indexed fields once, in a static table; the
/// tokenizer walks that table instead of inspecting the value at runtime.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity kind. Names the keyspace and the primary key prefix `<KIND>_id:`.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn index_fields() -> &'static [IndexedField<Self>];
}

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Fresh lexicographically sortable identifier
pub fn new_identifier() -> String {
    ulid::Ulid::new().to_string()
}
