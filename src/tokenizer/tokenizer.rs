use std::fmt;

use crate::models::Record;
use crate::tokenizer::{FieldIndex, IndexKind};

/// Width of a time bucket in seconds
pub const DAY_SECONDS: i64 = 86_400;

/// Start of the UTC day containing `timestamp`.
pub fn day_bucket(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(DAY_SECONDS)
}

/// Index key `field:value`, naming one indexable fact about a record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(field: &str, value: impl fmt::Display) -> Self {
        Token(format!("{}:{}", field, value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True if `R` declares `field` with an index kind that emits tokens. Any
/// other `field:value` key can never hold a posting list.
pub fn is_tokenized<R: Record>(field: &str) -> bool {
    R::index_fields()
        .iter()
        .any(|f| f.name == field && f.kind() != IndexKind::Geoposition)
}

/// Derive the index tokens of a record from its static index table.
///
/// Tokens come out in field declaration order, at most one per field, so the
/// result is duplicate-free as long as field names are.
pub fn tokenize<R: Record>(record: &R) -> Vec<Token> {
    let mut tokens = Vec::new();
    for field in R::index_fields() {
        match &field.index {
            FieldIndex::Equality(value) => {
                let value = value(record);
                if value.is_zero() {
                    continue;
                }
                tokens.push(Token::new(field.name, value));
            }
            // Epoch zero still yields `field:0`
            FieldIndex::Time(value) => {
                tokens.push(Token::new(field.name, day_bucket(value(record))));
            }
            // TODO: quantize coordinates into geohash cells
            FieldIndex::Geoposition(_) => {}
        }
    }
    tokens
}
