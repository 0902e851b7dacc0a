use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes` (64 chars).
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// The leading `len` hex characters of `hash`.
///
/// Panics if `hash` is shorter than `len`; callers only ever pass full
/// 64-char digests produced by [`sha256_hex`].
pub fn hash_prefix(hash: &str, len: usize) -> &str {
    &hash[..len]
}

/// True iff `s` is exactly `len` lowercase hex characters.
pub fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
