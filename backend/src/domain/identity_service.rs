//! Signup, login, and profile reads and edits over the identity store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{
    LoginService, PasswordHasher, ProfileCommand, ProfileUpdate, RegistrationCommand,
    UserPersistenceError, UserProfileQuery, UserRepository,
};
use crate::domain::{Entity, Error, LoginCredentials, SignupDetails, User, UserId, Username};

/// Identity service implementing the account driving ports.
#[derive(Clone)]
pub struct IdentityService<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<U> IdentityService<U> {
    /// Create a new service over the identity store.
    pub fn new(users: Arc<U>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }
}

impl<U> IdentityService<U>
where
    U: UserRepository,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateUsername { username } => Self::duplicate_username(&username),
            UserPersistenceError::Missing { .. } => Error::entity_not_found(Entity::User),
        }
    }

    fn duplicate_username(username: &str) -> Error {
        Error::already_exists(
            Entity::User,
            "duplicate_username",
            format!("username {username} is already taken"),
        )
    }

    fn invalid_credentials() -> Error {
        Error::unauthorized("invalid credentials")
    }
}

#[async_trait]
impl<U> RegistrationCommand for IdentityService<U>
where
    U: UserRepository,
{
    async fn register(&self, details: SignupDetails) -> Result<User, Error> {
        let taken = self
            .users
            .find_by_username(details.username())
            .await
            .map_err(Self::map_user_error)?
            .is_some();
        if taken {
            return Err(Self::duplicate_username(details.username().as_ref()));
        }

        let password_hash = self.hasher.hash(details.password()).map_err(|error| {
            warn!(error = %error, "password hashing failed");
            Error::internal("could not secure the password")
        })?;
        let user = User::new(
            UserId::random(),
            details.username().clone(),
            details.display_name().clone(),
            password_hash,
        );
        self.users
            .insert(&user)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id(), "user registered");
        Ok(user)
    }
}

#[async_trait]
impl<U> LoginService for IdentityService<U>
where
    U: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(Self::invalid_credentials());
        };
        let Some(user) = self
            .users
            .find_by_username(&username)
            .await
            .map_err(Self::map_user_error)?
        else {
            return Err(Self::invalid_credentials());
        };

        let verified = self
            .hasher
            .verify(credentials.password(), user.password_hash())
            .map_err(|error| {
                warn!(user_id = %user.id(), error = %error, "stored password hash unreadable");
                Error::internal("stored credentials are unreadable")
            })?;
        if !verified {
            return Err(Self::invalid_credentials());
        }
        Ok(user.id().clone())
    }
}

#[async_trait]
impl<U> UserProfileQuery for IdentityService<U>
where
    U: UserRepository,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::entity_not_found(Entity::User))
    }
}

#[async_trait]
impl<U> ProfileCommand for IdentityService<U>
where
    U: UserRepository,
{
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<User, Error> {
        let user = self.fetch_profile(user_id).await?;
        let Some(description) = update.description else {
            return Ok(user);
        };

        let updated = user.with_description(description);
        self.users
            .update(&updated)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user_id, "profile updated");
        Ok(updated)
    }
}
