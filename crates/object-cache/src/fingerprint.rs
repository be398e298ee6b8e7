use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_128_with_seed;

/// Seed for the fast digest; part of the on-disk record format.
const XXHASH_SEED: u64 = 69;

/// Deterministic object identifier for a file path.
///
/// Content-independent: the identifier is the SHA-256 of the absolute
/// path string, so a rename changes the identifier and is modeled as
/// delete-then-create rather than a move.
#[must_use]
pub fn object_id(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    hex_string(&digest)
}

/// The `(size, sha256, xxhash)` triple used to decide whether a file's
/// bytes changed.
///
/// A record counts as unchanged only when the size and both digests
/// match, so no single hash family carries the false-negative risk
/// alone. Files are re-read only on event or full rescan, which keeps
/// the double computation cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFingerprint {
    pub size: u64,
    pub sha256: String,
    pub xxhash: String,
}

impl ContentFingerprint {
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let sha256 = hex_string(&Sha256::digest(bytes));
        let xxhash = format!("{:032x}", xxh3_128_with_seed(bytes, XXHASH_SEED));
        Self {
            size: bytes.len() as u64,
            sha256,
            xxhash,
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
