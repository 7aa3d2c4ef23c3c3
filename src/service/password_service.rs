use base64::Engine;
use sha2::{Digest, Sha256};

/// One-way credential hashing: SHA-256 digest, base64-encoded. The output is
/// deterministic for a given input, so verification is a recompute-and-compare
/// with no store round-trip.
pub struct PasswordService;

impl PasswordService {
    pub fn hash(plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
    }

    /// Constant time with respect to where the digests differ, so a wrong
    /// password cannot be probed byte by byte through response timing.
    pub fn verify(plaintext: &str, digest: &str) -> bool {
        let candidate = Self::hash(plaintext);
        constant_time_eq(candidate.as_bytes(), digest.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
