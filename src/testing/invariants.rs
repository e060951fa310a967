//! Invariant checking framework for store-state verification
//!
//! Each checker inspects an [`IndexSnapshot`] and reports at most one
//! [`Violation`] describing everything it found wrong.

use super::snapshot::IndexSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    pub context: HashMap<String, String>,
}

impl Violation {
    fn new(invariant: &str, description: String) -> Self {
        Self {
            invariant: invariant.to_string(),
            description,
            context: HashMap::new(),
        }
    }

    fn with(mut self, key: &str, value: impl fmt::Debug) -> Self {
        self.context.insert(key.to_string(), format!("{:?}", value));
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    /// Name of the invariant
    fn name(&self) -> &str;

    /// Check the invariant against a snapshot
    fn check(&self, snapshot: &IndexSnapshot) -> Result<(), Violation>;

    /// Human-readable description
    fn description(&self) -> &str {
        "No description provided"
    }
}

/// Check all invariants and return violations
pub fn check_all_invariants(
    snapshot: &IndexSnapshot,
    invariants: &[Box<dyn Invariant>],
) -> Vec<Violation> {
    invariants
        .iter()
        .filter_map(|invariant| invariant.check(snapshot).err())
        .collect()
}

/// All store-state invariants
pub fn default_invariants() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(PostingsMatchRecords),
        Box::new(NoEmptyPostings),
        Box::new(DenseIdBijection),
        Box::new(CounterCoversAllocations),
    ]
}

/// Invariant: a dense id is posted under a token iff the live record it
/// stands for tokenizes to it
///
/// Also flags dense ids posted for records that no longer exist.
pub struct PostingsMatchRecords;

impl Invariant for PostingsMatchRecords {
    fn name(&self) -> &str {
        "PostingsMatchRecords"
    }

    fn description(&self) -> &str {
        "Posting list membership equals the tokenization of live records"
    }

    fn check(&self, snapshot: &IndexSnapshot) -> Result<(), Violation> {
        let mut problems = Vec::new();
        let mut live = BTreeSet::new();

        for (id, tokens) in &snapshot.records {
            let Some(&dense_id) = snapshot.forward.get(id) else {
                problems.push(format!("record {} has no dense id", id));
                continue;
            };
            live.insert(dense_id);

            let expected: BTreeSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
            let actual: BTreeSet<&str> = snapshot.tokens_posting(dense_id).into_iter().collect();
            for missing in expected.difference(&actual) {
                problems.push(format!("{} ({}) missing from {}", id, dense_id, missing));
            }
            for stale in actual.difference(&expected) {
                problems.push(format!("{} ({}) stale in {}", id, dense_id, stale));
            }
        }

        for (token, bitmap) in &snapshot.postings {
            for dense_id in bitmap.iter().filter(|d| !live.contains(d)) {
                problems.push(format!("{} lists dense id {} with no live record", token, dense_id));
            }
        }

        if problems.is_empty() {
            return Ok(());
        }
        Err(Violation::new(
            self.name(),
            format!("{} posting mismatches in {}", problems.len(), snapshot.kind),
        )
        .with("problems", problems)
        .with("record_count", snapshot.records.len()))
    }
}

/// Invariant: emptied posting lists are deleted, never stored empty
pub struct NoEmptyPostings;

impl Invariant for NoEmptyPostings {
    fn name(&self) -> &str {
        "NoEmptyPostings"
    }

    fn description(&self) -> &str {
        "No posting key holds an empty bitmap"
    }

    fn check(&self, snapshot: &IndexSnapshot) -> Result<(), Violation> {
        let empty: Vec<&str> = snapshot
            .postings
            .iter()
            .filter(|(_, bitmap)| bitmap.is_empty())
            .map(|(token, _)| token.as_str())
            .collect();

        if empty.is_empty() {
            return Ok(());
        }
        Err(Violation::new(
            self.name(),
            format!("{} empty posting lists are stored", empty.len()),
        )
        .with("tokens", empty))
    }
}

/// Invariant: forward and reverse maps are mutual inverses
pub struct DenseIdBijection;

impl Invariant for DenseIdBijection {
    fn name(&self) -> &str {
        "DenseIdBijection"
    }

    fn description(&self) -> &str {
        "reverse(lookup(id)) == id for every allocated id, and vice versa"
    }

    fn check(&self, snapshot: &IndexSnapshot) -> Result<(), Violation> {
        let mut problems = Vec::new();

        for (id, dense_id) in &snapshot.forward {
            match snapshot.reverse.get(dense_id) {
                Some(back) if back == id => {}
                Some(back) => problems.push(format!("{} -> {} -> {}", id, dense_id, back)),
                None => problems.push(format!("{} -> {} has no reverse entry", id, dense_id)),
            }
        }
        for (dense_id, id) in &snapshot.reverse {
            if snapshot.forward.get(id) != Some(dense_id) {
                problems.push(format!("reverse {} -> {} has no matching forward entry", dense_id, id));
            }
        }
        if !snapshot.unknown.is_empty() {
            problems.push(format!("malformed id map keys: {:?}", snapshot.unknown));
        }

        if problems.is_empty() {
            return Ok(());
        }
        Err(Violation::new(
            self.name(),
            format!("{} id map inconsistencies", problems.len()),
        )
        .with("problems", problems))
    }
}

/// Invariant: the counter is at least every dense id handed out
pub struct CounterCoversAllocations;

impl Invariant for CounterCoversAllocations {
    fn name(&self) -> &str {
        "CounterCoversAllocations"
    }

    fn description(&self) -> &str {
        "The dense id counter is >= every allocated dense id"
    }

    fn check(&self, snapshot: &IndexSnapshot) -> Result<(), Violation> {
        let highest = snapshot
            .forward
            .values()
            .chain(snapshot.reverse.keys())
            .copied()
            .max()
            .unwrap_or(0);

        if highest <= snapshot.counter {
            return Ok(());
        }
        Err(Violation::new(
            self.name(),
            format!(
                "dense id {} allocated beyond counter {}",
                highest, snapshot.counter
            ),
        )
        .with("counter", snapshot.counter)
        .with("highest", highest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Token;
    use roaring::RoaringTreemap;

    fn bitmap(ids: &[u64]) -> RoaringTreemap {
        ids.iter().copied().collect()
    }

    fn consistent() -> IndexSnapshot {
        let mut s = IndexSnapshot {
            kind: "trip",
            counter: 2,
            ..Default::default()
        };
        for (id, dense) in [("A", 1u64), ("B", 2)] {
            s.forward.insert(id.to_string(), dense);
            s.reverse.insert(dense, id.to_string());
        }
        s.records
            .insert("A".to_string(), vec![Token::new("status", "draft")]);
        s.records.insert(
            "B".to_string(),
            vec![Token::new("status", "draft"), Token::new("city", "NYC")],
        );
        s.postings.insert("status:draft".to_string(), bitmap(&[1, 2]));
        s.postings.insert("city:NYC".to_string(), bitmap(&[2]));
        s
    }

    #[test]
    fn test_consistent_snapshot_passes() {
        let violations = check_all_invariants(&consistent(), &default_invariants());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_missing_and_stale_postings() {
        let mut s = consistent();
        s.postings.insert("city:NYC".to_string(), bitmap(&[1]));
        let violation = PostingsMatchRecords.check(&s).unwrap_err();
        // B missing from city:NYC, A stale in it
        assert!(violation.description.starts_with("2 posting mismatches"));
    }

    #[test]
    fn test_posting_for_deleted_record() {
        let mut s = consistent();
        s.records.remove("B");
        s.postings.remove("city:NYC");
        let violation = PostingsMatchRecords.check(&s).unwrap_err();
        assert!(violation.context["problems"].contains("status:draft lists dense id 2"));
    }

    #[test]
    fn test_empty_posting_detected() {
        let mut s = consistent();
        s.postings.insert("city:LA".to_string(), RoaringTreemap::new());
        assert!(NoEmptyPostings.check(&s).is_err());
    }

    #[test]
    fn test_broken_bijection_detected() {
        let mut s = consistent();
        s.reverse.insert(2, "A".to_string());
        let violation = DenseIdBijection.check(&s).unwrap_err();
        assert_eq!(violation.invariant, "DenseIdBijection");
    }

    #[test]
    fn test_counter_behind_allocations() {
        let mut s = consistent();
        s.counter = 1;
        let violation = CounterCoversAllocations.check(&s).unwrap_err();
        assert!(violation.to_string().contains("dense id 2 allocated beyond counter 1"));
    }
}
