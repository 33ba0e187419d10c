//! Salted SHA-256 password hashing.
//!
//! Stored form is `{salt_hex}:{digest_hex}` where the digest covers
//! `{salt_hex}:{password}`. Verification compares in constant time.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_BYTES: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    let digest = digest_hex(&salt_hex, password);
    format!("{salt_hex}:{digest}")
}

/// Verify a password against a stored `{salt}:{digest}` hash.
/// Malformed stored hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once(':') else {
        return false;
    };
    if salt_hex.is_empty() || digest.is_empty() {
        return false;
    }
    let candidate = digest_hex(salt_hex, password);
    constant_time_eq(candidate.as_bytes(), digest.as_bytes())
}

fn digest_hex(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
