//! Driven port for credential hashing.

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hasher adapters.
    pub enum PasswordHashError {
        /// The stored digest could not be decoded.
        Malformed { message: String } => "stored password hash is malformed: {message}",
        /// A new digest could not be produced.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Produces and checks opaque password digests.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Digest a plaintext password.
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError>;

    /// Check `password` against a stored digest.
    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError>;
}
