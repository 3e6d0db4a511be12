//! Identity store port.
use async_trait::async_trait;

use crate::domain::{User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the username.
        DuplicateUsername { username: String } => "username {username} is already taken",
        /// An update targeted a user that does not exist.
        Missing { user_id: String } => "user {user_id} does not exist",
    }
}

/// Keyed storage for [`User`] records.
///
/// Adapters guarantee read-after-write consistency for a single caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user. Fails with `DuplicateUsername` on a name clash.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by login name.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Replace an existing user record. Fails with `Missing` when absent.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;
}
