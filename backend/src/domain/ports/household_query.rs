//! Driving port for reading a user's household.

use async_trait::async_trait;

use crate::domain::{Error, Household, User, UserId};

/// Household with its members resolved.
///
/// `missing_member_ids` lists members the identity store no longer knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdRoster {
    pub household: Household,
    pub members: Vec<User>,
    pub missing_member_ids: Vec<UserId>,
}

/// Household reads consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HouseholdQuery: Send + Sync {
    /// Resolve the user's current household, repairing a stale pointer.
    ///
    /// # Errors
    /// `not_found` when the user is unknown.
    async fn current_household(&self, user_id: &UserId) -> Result<Option<Household>, Error>;

    /// Resolve the current household and load its members.
    async fn household_roster(&self, user_id: &UserId) -> Result<Option<HouseholdRoster>, Error>;
}
