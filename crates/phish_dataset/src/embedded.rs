//! The embedded baseline: two JSON resources compiled into the binary,
//! plus compile-time SHA-256 digests of those exact bytes. The baseline
//! is the trust anchor the rest of the system falls back to whenever
//! the on-disk store is missing, corrupt, or uninitialized — so a
//! corrupted baseline must never be loaded silently.

use crate::types::{Filter, HashPrefix};
use phish_common::sha256_hex;
use std::collections::HashSet;
use std::sync::OnceLock;

const FILTER_SET_JSON: &str = include_str!("../resources/filter_set.json");
const HASH_PREFIXES_JSON: &str = include_str!("../resources/hash_prefixes.json");

/// SHA-256 of the exact bytes of `resources/filter_set.json`.
const FILTER_SET_SHA256: &str = "a40627863a40b7c596861eada9ccc338974221cad521644891eadabce4c5ad7b";
/// SHA-256 of the exact bytes of `resources/hash_prefixes.json`.
const HASH_PREFIXES_SHA256: &str = "c614e7401659e8d767eb69d013591cae70441c6d7f6aa2711c2757e6f6808234";

/// Revision the embedded baseline claims to be at. Used to seed both
/// per-stream revisions when the store falls back to this baseline.
pub const EMBEDDED_REVISION: u64 = 1;

struct Baseline {
    filter_set: HashSet<Filter>,
    hash_prefixes: HashSet<HashPrefix>,
}

static BASELINE: OnceLock<Baseline> = OnceLock::new();

/// Verify and parse the embedded baseline on first access; subsequent
/// calls reuse the cached, already-verified result.
fn baseline() -> &'static Baseline {
    BASELINE.get_or_init(|| {
        let filter_set_digest = sha256_hex(FILTER_SET_JSON.as_bytes());
        if filter_set_digest != FILTER_SET_SHA256 {
            tracing::error!(
                expected = FILTER_SET_SHA256,
                got = %filter_set_digest,
                "embedded filter_set.json failed its integrity check"
            );
            panic!("embedded filter_set.json SHA-256 mismatch: the baseline is a trust anchor and cannot be loaded corrupted");
        }

        let hash_prefixes_digest = sha256_hex(HASH_PREFIXES_JSON.as_bytes());
        if hash_prefixes_digest != HASH_PREFIXES_SHA256 {
            tracing::error!(
                expected = HASH_PREFIXES_SHA256,
                got = %hash_prefixes_digest,
                "embedded hash_prefixes.json failed its integrity check"
            );
            panic!("embedded hash_prefixes.json SHA-256 mismatch: the baseline is a trust anchor and cannot be loaded corrupted");
        }

        let filter_set: Vec<Filter> = serde_json::from_str(FILTER_SET_JSON)
            .expect("embedded filter_set.json is valid JSON (checked at build time)");
        let hash_prefixes: Vec<HashPrefix> = serde_json::from_str(HASH_PREFIXES_JSON)
            .expect("embedded hash_prefixes.json is valid JSON (checked at build time)");

        Baseline {
            filter_set: filter_set.into_iter().collect(),
            hash_prefixes: hash_prefixes.into_iter().collect(),
        }
    })
}

/// The baseline filter set compiled into the binary. Panics if the
/// embedded resource bytes don't hash to the compiled-in digest.
pub fn embedded_filter_set() -> HashSet<Filter> {
    baseline().filter_set.clone()
}

/// The baseline hash-prefix set compiled into the binary. Panics if the
/// embedded resource bytes don't hash to the compiled-in digest.
pub fn embedded_hash_prefixes() -> HashSet<HashPrefix> {
    baseline().hash_prefixes.clone()
}

/// Force the integrity check to run (or re-confirm it already passed).
/// Used by the CLI's `verify-baseline` subcommand.
pub fn verify() {
    baseline();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_baseline_verifies_and_parses() {
        let filters = embedded_filter_set();
        let prefixes = embedded_hash_prefixes();
        assert!(!filters.is_empty());
        assert!(!prefixes.is_empty());
        assert_eq!(EMBEDDED_REVISION, 1);
    }
}
