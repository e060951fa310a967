//! Testing infrastructure for correctness verification
//!
//! Captures a collection's whole keyspace and checks the store-state
//! invariants against it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tokendb::testing::prelude::*;
//!
//! trips.create(&trip)?;
//! trips.delete(&other.id)?;
//!
//! let snapshot = IndexSnapshot::capture(&trips)?;
//! let violations = check_all_invariants(&snapshot, &default_invariants());
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **PostingsMatchRecords**: posting membership equals live record tokenization
//! - **NoEmptyPostings**: emptied posting lists are deleted
//! - **DenseIdBijection**: forward and reverse id maps are mutual inverses
//! - **CounterCoversAllocations**: the counter never lags an allocation

pub mod invariants;
pub mod snapshot;

pub use invariants::{
    check_all_invariants, default_invariants, CounterCoversAllocations, DenseIdBijection,
    Invariant, NoEmptyPostings, PostingsMatchRecords, Violation,
};
pub use snapshot::IndexSnapshot;

/// Prelude for easy imports
pub mod prelude {
    pub use super::invariants::{check_all_invariants, default_invariants, Invariant, Violation};
    pub use super::snapshot::IndexSnapshot;
}
