//! Poll voting service.
//!
//! Mutates only the poll store. The household store is read to check that a
//! new poll's household exists; membership of voters is not checked.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    CreatePollRequest, HouseholdPersistenceError, HouseholdRepository, PollCommand,
    PollPersistenceError, PollQuery, PollRepository, VoteRequest,
};
use crate::domain::{Entity, Error, NewPoll, Poll};

/// Voting service implementing the poll driving ports.
#[derive(Clone)]
pub struct VotingService<P, H> {
    polls: Arc<P>,
    households: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<P, H> VotingService<P, H> {
    /// Create a new service over the poll and household stores.
    pub fn new(polls: Arc<P>, households: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            polls,
            households,
            clock,
        }
    }
}

impl<P, H> VotingService<P, H>
where
    P: PollRepository,
    H: HouseholdRepository,
{
    fn map_poll_error(error: PollPersistenceError) -> Error {
        match error {
            PollPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("poll repository unavailable: {message}"))
            }
            PollPersistenceError::Query { message } => {
                Error::internal(format!("poll repository error: {message}"))
            }
            PollPersistenceError::DuplicateTitle { title } => Self::duplicate_title(&title),
            PollPersistenceError::NotFound { .. } => Error::entity_not_found(Entity::Poll),
            PollPersistenceError::UnknownOption { option } => Error::invalid_input(
                "option",
                "unknown_option",
                format!("poll has no option '{option}'"),
            ),
        }
    }

    fn map_household_error(error: HouseholdPersistenceError) -> Error {
        match error {
            HouseholdPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("household repository unavailable: {message}"))
            }
            other => Error::internal(format!("household repository error: {other}")),
        }
    }

    fn duplicate_title(title: &str) -> Error {
        Error::already_exists(
            Entity::Poll,
            "duplicate_poll_title",
            format!("a poll titled '{title}' already exists"),
        )
    }
}

#[async_trait]
impl<P, H> PollCommand for VotingService<P, H>
where
    P: PollRepository,
    H: HouseholdRepository,
{
    async fn create_poll(&self, request: CreatePollRequest) -> Result<Poll, Error> {
        let household_exists = self
            .households
            .find_by_token(&request.household_token)
            .await
            .map_err(Self::map_household_error)?
            .is_some();
        if !household_exists {
            return Err(Error::entity_not_found(Entity::Household));
        }

        let title_taken = self
            .polls
            .find_by_title(&request.title)
            .await
            .map_err(Self::map_poll_error)?
            .is_some();
        if title_taken {
            return Err(Self::duplicate_title(request.title.as_ref()));
        }

        let poll = Poll::open(NewPoll {
            title: request.title,
            options: request.options,
            household_token: request.household_token,
            created_by: request.created_by,
            created_at: self.clock.utc(),
        });
        self.polls
            .insert(&poll)
            .await
            .map_err(Self::map_poll_error)?;
        info!(poll_id = %poll.id(), household_token = %poll.household_token(), "poll created");
        Ok(poll)
    }

    async fn cast_vote(&self, request: VoteRequest) -> Result<Poll, Error> {
        let poll = self
            .polls
            .cast_vote(&request.poll_id, &request.voter, &request.option)
            .await
            .map_err(Self::map_poll_error)?;
        debug!(poll_id = %request.poll_id, voter = %request.voter, "vote recorded");
        Ok(poll)
    }

    async fn withdraw_vote(&self, request: VoteRequest) -> Result<Poll, Error> {
        let poll = self
            .polls
            .withdraw_vote(&request.poll_id, &request.voter, &request.option)
            .await
            .map_err(Self::map_poll_error)?;
        debug!(poll_id = %request.poll_id, voter = %request.voter, "vote withdrawn");
        Ok(poll)
    }
}

#[async_trait]
impl<P, H> PollQuery for VotingService<P, H>
where
    P: PollRepository,
    H: HouseholdRepository,
{
    async fn list_polls(&self) -> Result<Vec<Poll>, Error> {
        self.polls.list().await.map_err(Self::map_poll_error)
    }
}

#[cfg(test)]
#[path = "voting_service_tests.rs"]
mod tests;
