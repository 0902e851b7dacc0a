//! phish_common
//!
//! SHA-256 hashing and URL canonicalization shared by the dataset, API
//! client, and classifier crates. Hashes here are plain lowercase hex
//! (no "sha256:" tag) because the wire format and on-disk format both
//! expect bare hex strings.

pub mod canonical;
pub mod hashing;

pub use canonical::{canonicalize, CanonicalUrl};
pub use hashing::{hash_prefix, is_hex_of_len, sha256_hex};
