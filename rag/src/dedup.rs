//! Content deduplication using xxhash.

use xxhash_rust::xxh3::xxh3_64;

/// Computes a content hash for deduplication.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}
