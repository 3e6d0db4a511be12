//! bcrypt password hasher.
//!
//! Digests use the modular crypt format (`$2b$<cost>$<salt><digest>`), so the
//! cost and salt travel with each stored hash.

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Work factor applied to new digests.
pub const DEFAULT_COST: u32 = 10;

/// [`PasswordHasher`] adapter backed by `bcrypt`.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher using `cost` rounds (`2^cost` iterations) for new digests.
    /// Verification always honours the cost recorded in the stored hash.
    #[must_use]
    pub const fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::with_cost(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        bcrypt::hash(password, self.cost)
            .map(PasswordHash::new)
            .map_err(|err| PasswordHashError::hashing(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        bcrypt::verify(password, hash.as_str())
            .map_err(|err| PasswordHashError::malformed(err.to_string()))
    }
}
