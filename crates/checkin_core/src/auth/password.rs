//! Salted password digests for coach accounts.
//!
//! # Invariants
//! - Every stored digest has its own random salt.
//! - Plain passwords are never stored or logged.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Shortest password a coach may set.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Salt and SHA-256 digest, both hex encoded, as kept in the coach store.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub salt: String,
    pub digest: String,
}

impl PasswordHash {
    /// Hashes `password` under a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = digest(&salt, password);
        Self { salt, digest }
    }

    pub fn verify(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.digest
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash")
            .field("salt", &self.salt)
            .field("digest", &"<redacted>")
            .finish()
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
