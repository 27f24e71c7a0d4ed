use sha2::{Digest, Sha256};

use crate::config;

/// SHA-256 digest type.
pub type Sha256Digest = [u8; config::DIGEST_SIZE];

/// Compute SHA-256 hash of a byte slice.
pub fn sha256(data: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut digest = [0u8; config::DIGEST_SIZE];
    digest.copy_from_slice(&result);
    digest
}

/// Lowercase hex rendering of a digest, for log lines.
pub fn hex(digest: &Sha256Digest) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
