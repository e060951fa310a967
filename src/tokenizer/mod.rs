//! Index token derivation from a record's declared index fields.

mod field;
mod tokenizer;

pub use field::{FieldIndex, FieldValue, IndexKind, IndexedField};
pub use tokenizer::{day_bucket, is_tokenized, tokenize, Token, DAY_SECONDS};
