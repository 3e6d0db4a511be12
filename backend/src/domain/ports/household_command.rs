//! Driving port for household membership changes.

use async_trait::async_trait;

use crate::domain::{Address, Capacity, Error, Household, HouseholdName, HouseholdToken, UserId};

/// Request to found a new household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateHouseholdRequest {
    /// User who founds the household and becomes its first member.
    pub creator: UserId,
    pub name: HouseholdName,
    pub address: Address,
    pub capacity: Capacity,
}

/// Membership mutations consumed by inbound adapters.
///
/// A user belongs to at most one household. Creating or joining a household
/// while attached to another detaches the user from the previous one first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HouseholdCommand: Send + Sync {
    /// Found a household with a fresh join token.
    ///
    /// # Errors
    /// - `not_found` when the creator is unknown.
    /// - `conflict` (`duplicate_name`) when the name is taken.
    async fn create_household(&self, request: CreateHouseholdRequest) -> Result<Household, Error>;

    /// Join the household identified by `token`.
    ///
    /// # Errors
    /// - `not_found` when the user or household is unknown.
    /// - `conflict` (`already_member`) when the user is already listed.
    async fn join_household(
        &self,
        user_id: &UserId,
        token: &HouseholdToken,
    ) -> Result<Household, Error>;

    /// Leave the current household. Succeeds when there is nothing to leave.
    async fn leave_household(&self, user_id: &UserId) -> Result<(), Error>;
}
