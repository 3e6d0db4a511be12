//! Household membership service.
//!
//! Keeps the household member lists and the per-user household pointers in
//! step. The member list is authoritative; the pointer on the user record is
//! a cache that this service repairs whenever a read finds it stale. There is
//! no cross-store transaction, so every multi-step write is ordered so that a
//! failure part-way leaves a state the next resolve can repair.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CreateHouseholdRequest, HouseholdCommand, HouseholdPersistenceError, HouseholdQuery,
    HouseholdRepository, HouseholdRoster, MemberAddition, UserPersistenceError, UserRepository,
};
use crate::domain::{Entity, Error, Household, HouseholdToken, User, UserId};

/// Attempts made to draw an unused join token before giving up.
pub const TOKEN_ATTEMPTS: usize = 5;

/// Membership service implementing the household driving ports.
#[derive(Clone)]
pub struct MembershipService<U, H> {
    users: Arc<U>,
    households: Arc<H>,
}

impl<U, H> MembershipService<U, H> {
    /// Create a new service over the identity and household stores.
    pub fn new(users: Arc<U>, households: Arc<H>) -> Self {
        Self { users, households }
    }
}

impl<U, H> MembershipService<U, H>
where
    U: UserRepository,
    H: HouseholdRepository,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateUsername { username } => Error::already_exists(
                Entity::User,
                "duplicate_username",
                format!("username {username} is already taken"),
            ),
            UserPersistenceError::Missing { .. } => Error::entity_not_found(Entity::User),
        }
    }

    fn map_household_error(error: HouseholdPersistenceError) -> Error {
        match error {
            HouseholdPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("household repository unavailable: {message}"))
            }
            HouseholdPersistenceError::Query { message } => {
                Error::internal(format!("household repository error: {message}"))
            }
            HouseholdPersistenceError::DuplicateName { name } => Self::duplicate_name(&name),
            HouseholdPersistenceError::DuplicateToken { token } => {
                Error::internal(format!("unexpected household token clash: {token}"))
            }
        }
    }

    fn duplicate_name(name: &str) -> Error {
        Error::already_exists(
            Entity::Household,
            "duplicate_name",
            format!("household name {name} is already taken"),
        )
    }

    fn already_member() -> Error {
        Error::already_exists(
            Entity::Household,
            "already_member",
            "user is already a member of this household",
        )
    }

    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::entity_not_found(Entity::User))
    }

    async fn point_user_at(
        &self,
        user: User,
        token: Option<HouseholdToken>,
    ) -> Result<User, Error> {
        let updated = user.with_household_token(token);
        self.users
            .update(&updated)
            .await
            .map_err(Self::map_user_error)?;
        Ok(updated)
    }

    /// Repair a pointer that no longer resolves to a household listing the
    /// user. The member lists decide: the pointer moves to the household that
    /// lists the user, or is cleared when none does.
    async fn repair_dangling_pointer(&self, user: User) -> Result<Option<Household>, Error> {
        let listed = self
            .households
            .find_by_member(user.id())
            .await
            .map_err(Self::map_household_error)?;
        let repaired = listed.as_ref().map(|household| household.token().clone());
        warn!(
            user_id = %user.id(),
            household_token = ?user.household_token().map(ToString::to_string),
            repaired_token = ?repaired.as_ref().map(ToString::to_string),
            "repairing dangling household pointer"
        );
        self.point_user_at(user, repaired).await?;
        Ok(listed)
    }

    /// Best-effort pointer write after the member list has changed. The
    /// member list already reflects the change, so a failure here is left for
    /// the next resolve to repair.
    async fn sync_pointer(&self, user: User, token: &HouseholdToken) {
        let user_id = user.id().clone();
        if let Err(error) = self.point_user_at(user, Some(token.clone())).await {
            warn!(
                user_id = %user_id,
                household_token = %token,
                error = %error,
                "household pointer update failed; resolve will repair it"
            );
        }
    }

    /// Every household the user may belong to: the one named by the pointer
    /// and the one whose member list holds the user, when they differ.
    async fn memberships(&self, user: &User) -> Result<Vec<HouseholdToken>, Error> {
        let mut tokens: Vec<HouseholdToken> = user.household_token().cloned().into_iter().collect();
        let listed = self
            .households
            .find_by_member(user.id())
            .await
            .map_err(Self::map_household_error)?;
        if let Some(household) = listed.filter(|household| !tokens.contains(household.token())) {
            tokens.push(household.token().clone());
        }
        Ok(tokens)
    }

    /// Remove the user from every household in `previous` other than `next`.
    async fn detach_from_previous(
        &self,
        user_id: &UserId,
        previous: Vec<HouseholdToken>,
        next: &HouseholdToken,
    ) {
        for token in previous.into_iter().filter(|token| token != next) {
            match self.households.remove_member(&token, user_id).await {
                Ok(_) => info!(
                    user_id = %user_id,
                    household_token = %token,
                    "user left previous household"
                ),
                Err(error) => warn!(
                    user_id = %user_id,
                    household_token = %token,
                    error = %error,
                    "failed to leave previous household"
                ),
            }
        }
    }

    async fn insert_with_fresh_token(
        &self,
        request: CreateHouseholdRequest,
    ) -> Result<Household, Error> {
        for attempt in 1..=TOKEN_ATTEMPTS {
            let household = Household::found(
                request.name.clone(),
                request.address.clone(),
                request.capacity,
                HouseholdToken::generate(),
                request.creator.clone(),
            );
            match self.households.insert(&household).await {
                Ok(()) => return Ok(household),
                Err(HouseholdPersistenceError::DuplicateToken { token }) => {
                    debug!(attempt, household_token = %token, "join token clash, retrying");
                }
                Err(error) => return Err(Self::map_household_error(error)),
            }
        }
        Err(Error::internal("could not allocate a unique household token"))
    }

    /// Resolve the user's household, repairing the pointer where needed.
    ///
    /// - Unset pointer: re-derive it from the member lists, if any lists the
    ///   user.
    /// - Pointer to a missing household, or to one that no longer lists the
    ///   user: repair it from the member lists and return what they say.
    async fn resolve(&self, user_id: &UserId) -> Result<Option<Household>, Error> {
        let user = self.load_user(user_id).await?;

        let Some(token) = user.household_token().cloned() else {
            let listed = self
                .households
                .find_by_member(user_id)
                .await
                .map_err(Self::map_household_error)?;
            if let Some(household) = &listed {
                info!(
                    user_id = %user_id,
                    household_token = %household.token(),
                    "re-deriving household pointer from membership"
                );
                self.sync_pointer(user, household.token()).await;
            }
            return Ok(listed);
        };

        let found = self
            .households
            .find_by_token(&token)
            .await
            .map_err(Self::map_household_error)?;
        match found {
            Some(household) if household.is_member(user_id) => Ok(Some(household)),
            _ => self.repair_dangling_pointer(user).await,
        }
    }
}

#[async_trait]
impl<U, H> HouseholdCommand for MembershipService<U, H>
where
    U: UserRepository,
    H: HouseholdRepository,
{
    async fn create_household(&self, request: CreateHouseholdRequest) -> Result<Household, Error> {
        let user = self.load_user(&request.creator).await?;

        let name_taken = self
            .households
            .find_by_name(&request.name)
            .await
            .map_err(Self::map_household_error)?
            .is_some();
        if name_taken {
            return Err(Self::duplicate_name(request.name.as_ref()));
        }

        let previous = self.memberships(&user).await?;
        let household = self.insert_with_fresh_token(request).await?;
        info!(
            household_id = %household.id(),
            user_id = %user.id(),
            "household created"
        );

        self.detach_from_previous(user.id(), previous, household.token())
            .await;
        self.sync_pointer(user, household.token()).await;
        Ok(household)
    }

    async fn join_household(
        &self,
        user_id: &UserId,
        token: &HouseholdToken,
    ) -> Result<Household, Error> {
        let user = self.load_user(user_id).await?;
        let previous = self.memberships(&user).await?;

        let addition = self
            .households
            .add_member(token, user_id)
            .await
            .map_err(Self::map_household_error)?
            .ok_or_else(|| Error::entity_not_found(Entity::Household))?;
        let household = match addition {
            MemberAddition::Added(household) => household,
            MemberAddition::AlreadyMember(_) => return Err(Self::already_member()),
        };
        info!(household_id = %household.id(), user_id = %user_id, "user joined household");

        self.detach_from_previous(user_id, previous, token).await;
        self.sync_pointer(user, token).await;
        Ok(household)
    }

    async fn leave_household(&self, user_id: &UserId) -> Result<(), Error> {
        let Some(user) = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_user_error)?
        else {
            debug!(user_id = %user_id, "leave requested for unknown user");
            return Ok(());
        };

        for token in self.memberships(&user).await? {
            let remaining = self
                .households
                .remove_member(&token, user_id)
                .await
                .map_err(Self::map_household_error)?;
            if remaining.is_none() {
                debug!(household_token = %token, "left household no longer exists");
            }
            info!(user_id = %user_id, household_token = %token, "user left household");
        }

        if user.household_token().is_some() {
            self.point_user_at(user, None).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<U, H> HouseholdQuery for MembershipService<U, H>
where
    U: UserRepository,
    H: HouseholdRepository,
{
    async fn current_household(&self, user_id: &UserId) -> Result<Option<Household>, Error> {
        self.resolve(user_id).await
    }

    async fn household_roster(&self, user_id: &UserId) -> Result<Option<HouseholdRoster>, Error> {
        let Some(household) = self.resolve(user_id).await? else {
            return Ok(None);
        };

        let mut members = Vec::with_capacity(household.member_ids().len());
        let mut missing_member_ids = Vec::new();
        for member_id in household.member_ids() {
            match self
                .users
                .find_by_id(member_id)
                .await
                .map_err(Self::map_user_error)?
            {
                Some(member) => members.push(member),
                None => {
                    warn!(
                        household_id = %household.id(),
                        member_id = %member_id,
                        "household lists a member the identity store does not know"
                    );
                    missing_member_ids.push(member_id.clone());
                }
            }
        }

        Ok(Some(HouseholdRoster {
            household,
            members,
            missing_member_ids,
        }))
    }
}

#[cfg(test)]
#[path = "membership_service_tests.rs"]
mod tests;
