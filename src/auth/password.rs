//! Password hashing

use anyhow::{Context, Result};
use tracing::debug;

/// One-way password hashing used by both credential stores
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// `false` for a mismatch and for a malformed stored hash
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// bcrypt with a configurable work factor
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("Stored password hash unusable: {}", e);
                false
            }
        }
    }
}
