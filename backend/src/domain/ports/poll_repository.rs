//! Poll store port.
//!
//! Vote mutation is a single call so adapters can apply it under one per-poll
//! lock; services never read, modify, and write back a ledger themselves.

use async_trait::async_trait;

use crate::domain::{Poll, PollId, PollTitle, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by poll repository adapters.
    pub enum PollPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "poll repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "poll repository query failed: {message}",
        /// Another poll already uses the title.
        DuplicateTitle { title: String } => "poll title {title} is already taken",
        /// The poll does not exist.
        NotFound { poll_id: String } => "poll {poll_id} does not exist",
        /// The vote named an option the poll does not declare.
        UnknownOption { option: String } => "poll has no option {option}",
    }
}

/// Keyed storage for [`Poll`] records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Store a new poll. Titles are unique across all households.
    async fn insert(&self, poll: &Poll) -> Result<(), PollPersistenceError>;

    /// Fetch a poll by identifier.
    async fn find_by_id(&self, id: &PollId) -> Result<Option<Poll>, PollPersistenceError>;

    /// Fetch a poll by title.
    async fn find_by_title(&self, title: &PollTitle)
    -> Result<Option<Poll>, PollPersistenceError>;

    /// Every poll, oldest first.
    async fn list(&self) -> Result<Vec<Poll>, PollPersistenceError>;

    /// Move `voter` to `option`, removing any earlier choice, and return the
    /// updated poll.
    async fn cast_vote(
        &self,
        id: &PollId,
        voter: &UserId,
        option: &str,
    ) -> Result<Poll, PollPersistenceError>;

    /// Remove `voter` from `option` only and return the poll.
    async fn withdraw_vote(
        &self,
        id: &PollId,
        voter: &UserId,
        option: &str,
    ) -> Result<Poll, PollPersistenceError>;
}
