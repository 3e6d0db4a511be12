//! Household store port.
//!
//! Membership changes go through [`HouseholdRepository::add_member`] and
//! [`HouseholdRepository::remove_member`], which adapters serialise per
//! household so concurrent joins never lose or duplicate a member.

use async_trait::async_trait;

use crate::domain::{Household, HouseholdId, HouseholdName, HouseholdToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by household repository adapters.
    pub enum HouseholdPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "household repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "household repository query failed: {message}",
        /// Another household already uses the name.
        DuplicateName { name: String } => "household name {name} is already taken",
        /// Another household already uses the join token.
        DuplicateToken { token: String } => "household token {token} is already in use",
    }
}

/// Outcome of [`HouseholdRepository::add_member`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAddition {
    /// The user was added; carries the updated household.
    Added(Household),
    /// The user was already listed; the household is unchanged.
    AlreadyMember(Household),
}

/// Keyed storage for [`Household`] records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HouseholdRepository: Send + Sync {
    /// Store a new household. Name and token must both be unused.
    async fn insert(&self, household: &Household) -> Result<(), HouseholdPersistenceError>;

    /// Fetch a household by identifier.
    async fn find_by_id(
        &self,
        id: &HouseholdId,
    ) -> Result<Option<Household>, HouseholdPersistenceError>;

    /// Fetch a household by join token.
    async fn find_by_token(
        &self,
        token: &HouseholdToken,
    ) -> Result<Option<Household>, HouseholdPersistenceError>;

    /// Fetch a household by name.
    async fn find_by_name(
        &self,
        name: &HouseholdName,
    ) -> Result<Option<Household>, HouseholdPersistenceError>;

    /// Find a household whose member list contains `user`.
    async fn find_by_member(
        &self,
        user: &UserId,
    ) -> Result<Option<Household>, HouseholdPersistenceError>;

    /// Atomically add `user` to the household. `None` when the token is
    /// unknown.
    async fn add_member(
        &self,
        token: &HouseholdToken,
        user: &UserId,
    ) -> Result<Option<MemberAddition>, HouseholdPersistenceError>;

    /// Atomically remove `user` from the household. `None` when the token is
    /// unknown; removing a non-member returns the household unchanged.
    async fn remove_member(
        &self,
        token: &HouseholdToken,
        user: &UserId,
    ) -> Result<Option<Household>, HouseholdPersistenceError>;
}
