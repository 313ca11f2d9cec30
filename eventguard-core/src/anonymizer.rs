//! anonymizer.rs - Salted one-way hashing of sensitive values.
//!
//! License: MIT OR APACHE 2.0

use sha2::{Digest, Sha256};

/// Produces stable hexadecimal SHA-256 digests of `salt || plaintext`.
///
/// The salt is absorbed into a prototype hash engine at construction; each
/// call clones the prototype instead of re-initializing one from scratch,
/// which is cheaper and leaves no shared mutable state between callers.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    prototype: Sha256,
}

impl Anonymizer {
    pub fn new(salt: &[u8]) -> Self {
        let mut prototype = Sha256::new();
        prototype.update(salt);
        Self { prototype }
    }

    pub fn from_salt_str(salt: &str) -> Self {
        Self::new(salt.as_bytes())
    }

    /// Hashes `data` with the configured salt. Blank input is returned
    /// unchanged: hashing it would manufacture a pseudo-identifier for
    /// "no value".
    pub fn anonymize(&self, data: &str) -> String {
        if data.chars().all(char::is_whitespace) {
            return data.to_string();
        }
        let mut hasher = self.prototype.clone();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }
}
