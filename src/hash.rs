//! Hashing utilities for bundle integrity
//!
//! Two digests are in use:
//! - SHA-256 (plain lowercase hex) for manifest sums, the value recorded in
//!   the lock file's `sum` and in each requirement's `h1`
//! - BLAKE3 (prefixed with `blake3:`) for module and whole-bundle content

use std::collections::BTreeMap;

use blake3::Hasher;
use sha2::{Digest, Sha256};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Hex SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Prefixed BLAKE3 hash of a byte slice
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{}{}", HASH_PREFIX, blake3::hash(bytes).to_hex())
}

/// Prefixed BLAKE3 hash over a set of files
///
/// Files are visited in path order. Each contributes its relative path, a
/// NUL separator, its content and another NUL, so renaming a file changes
/// the hash as well.
pub fn hash_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> String {
    let sorted: BTreeMap<&str, &[u8]> = files.into_iter().collect();

    let mut hasher = Hasher::new();
    for (path, content) in sorted {
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        hasher.update(content);
        hasher.update(b"\0");
    }

    format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())
}

/// Verify a hash matches the expected value
///
/// A missing `blake3:` prefix on either side is tolerated.
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    let normalize = |h: &str| {
        if h.starts_with(HASH_PREFIX) {
            h.to_string()
        } else {
            format!("{}{}", HASH_PREFIX, h)
        }
    };

    normalize(expected) == normalize(actual)
}
