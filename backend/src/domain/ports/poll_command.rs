//! Driving port for poll creation and voting.

use async_trait::async_trait;

use crate::domain::{Error, HouseholdToken, Poll, PollId, PollOptions, PollTitle, UserId, Username};

/// Request to open a poll in a household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePollRequest {
    pub household_token: HouseholdToken,
    pub title: PollTitle,
    pub options: PollOptions,
    pub created_by: Username,
}

/// A voter acting on one option of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub poll_id: PollId,
    pub voter: UserId,
    pub option: String,
}

/// Poll mutations consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollCommand: Send + Sync {
    /// Open a poll with an empty voter set per option.
    ///
    /// # Errors
    /// - `not_found` when the household token is unknown.
    /// - `conflict` (`duplicate_poll_title`) when the title is taken.
    async fn create_poll(&self, request: CreatePollRequest) -> Result<Poll, Error>;

    /// Record the voter's choice, replacing any earlier one.
    ///
    /// # Errors
    /// - `not_found` when the poll is unknown.
    /// - `invalid_request` (`unknown_option`) when the option is not declared.
    async fn cast_vote(&self, request: VoteRequest) -> Result<Poll, Error>;

    /// Remove the voter from the named option only.
    ///
    /// # Errors
    /// `not_found` when the poll is unknown.
    async fn withdraw_vote(&self, request: VoteRequest) -> Result<Poll, Error>;
}
