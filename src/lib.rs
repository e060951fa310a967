pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod idmap;
pub mod metrics;
pub mod models;
pub mod postings;
pub mod query;
pub mod store;
pub mod testing;
pub mod tokenizer;

pub use collection::Collection;
pub use config::{Durability, EngineConfig};
pub use engine::Engine;
pub use error::{Result, TokenDbError};
pub use idmap::{DenseId, IdMap};
pub use metrics::EngineMetrics;
pub use models::*;
pub use query::{Filters, QueryResult};
pub use tokenizer::{tokenize, Token};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
