//! Content hashing for the metadata catalog.
//!
//! The hash is the dedup lookup key only. Two documents are duplicates when
//! their bytes are equal; an equal hash just nominates a candidate.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded content hash.
pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 of `bytes`, lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
