use phish_common::is_hex_of_len;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Structural well-formedness per the hash/prefix shape invariants
/// (§3: every `HashPrefix` is 8 lowercase hex chars, every `Filter.hash`
/// is exactly 64). Checked on insert from an update delta, since that
/// is the only path through which unvalidated remote data reaches the
/// persisted set.
pub trait WellFormed {
    fn is_well_formed(&self) -> bool;
}

/// An 8-hex-character prefix of some `Filter::hash`. A bloom-like
/// acceleration index: presence is necessary but not sufficient for a
/// match, absence is conclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashPrefix(pub String);

impl HashPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl WellFormed for HashPrefix {
    fn is_well_formed(&self) -> bool {
        is_hex_of_len(&self.0, 8)
    }
}

impl std::fmt::Display for HashPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `(hostHash, regex)` rule. A URL is malicious if the SHA-256 of its
/// canonical host equals `hash` and its canonical URL matches `regex`.
/// Never mutated in place: inserted by update deltas or baseline load,
/// removed by delete deltas or full replace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub hash: String,
    pub regex: String,
}

impl WellFormed for Filter {
    fn is_well_formed(&self) -> bool {
        is_hex_of_len(&self.hash, 64)
    }
}

/// An insert/delete/replace update to a set, tagged with a target
/// revision. `replace = true` discards the local set wholesale;
/// otherwise `insert` is unioned in and `delete` is subtracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta<T> {
    pub insert: Vec<T>,
    pub delete: Vec<T>,
    pub revision: u64,
    pub replace: bool,
}

impl<T> Delta<T> {
    pub fn empty_at(revision: u64) -> Self {
        Delta {
            insert: Vec::new(),
            delete: Vec::new(),
            revision,
            replace: false,
        }
    }
}

/// Apply `delta` to `current`, returning the new set.
///
/// When an element is in both `insert` and `delete` of a non-replace
/// delta, the union is applied first and the difference second, so the
/// element ends up removed. Callers must not "simplify" this to a
/// symmetric union/difference without preserving that order.
///
/// Entries in `delta.insert` that fail [`WellFormed::is_well_formed`]
/// are dropped and logged rather than admitted into the set: this is
/// the only path through which the remote API's data reaches local
/// state, so it is where the hash/prefix shape invariants are enforced.
pub fn apply_delta<T>(current: &HashSet<T>, delta: &Delta<T>) -> HashSet<T>
where
    T: Eq + Hash + Clone + WellFormed,
{
    if delta.replace {
        return delta.insert.iter().filter(|item| well_formed_or_warn(item)).cloned().collect();
    }
    let mut next: HashSet<T> = current.clone();
    for item in &delta.insert {
        if well_formed_or_warn(item) {
            next.insert(item.clone());
        }
    }
    for removed in &delta.delete {
        next.remove(removed);
    }
    next
}

fn well_formed_or_warn<T: WellFormed>(item: &T) -> bool {
    let ok = item.is_well_formed();
    if !ok {
        tracing::warn!("dropping malformed entry from update delta");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(tag: &str) -> Filter {
        Filter {
            hash: tag.repeat(64 / tag.len()),
            regex: "^https://".to_string(),
        }
    }

    #[test]
    fn apply_delta_drops_malformed_inserts() {
        let current: HashSet<Filter> = HashSet::new();
        let malformed = Filter { hash: "not-a-hash".to_string(), regex: "^https://".to_string() };
        let delta = Delta { insert: vec![malformed], delete: vec![], revision: 1, replace: false };
        let next = apply_delta(&current, &delta);
        assert!(next.is_empty());
    }

    #[test]
    fn replace_discards_current_set() {
        let current: HashSet<Filter> = [filter("a"), filter("b")].into_iter().collect();
        let delta = Delta {
            insert: vec![filter("c")],
            delete: vec![],
            revision: 3,
            replace: true,
        };
        let next = apply_delta(&current, &delta);
        assert_eq!(next, [filter("c")].into_iter().collect());
    }

    #[test]
    fn union_then_subtract_removes_elements_present_in_both() {
        let current: HashSet<Filter> = [filter("a")].into_iter().collect();
        let delta = Delta {
            insert: vec![filter("b")],
            delete: vec![filter("b")],
            revision: 2,
            replace: false,
        };
        let next = apply_delta(&current, &delta);
        // "b" was inserted then deleted in the same delta: it must not survive.
        assert_eq!(next, [filter("a")].into_iter().collect());
    }

    #[test]
    fn union_adds_new_and_delete_removes_existing() {
        let current: HashSet<Filter> = [filter("a"), filter("b")].into_iter().collect();
        let delta = Delta {
            insert: vec![filter("c")],
            delete: vec![filter("a")],
            revision: 2,
            replace: false,
        };
        let next = apply_delta(&current, &delta);
        assert_eq!(next, [filter("b"), filter("c")].into_iter().collect());
    }
}
