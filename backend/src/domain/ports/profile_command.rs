//! Driving port for editing the signed-in user's profile.

use async_trait::async_trait;

use crate::domain::{Error, ProfileDescription, User, UserId};

/// Profile fields a user may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub description: Option<ProfileDescription>,
}

/// Domain use-case port for profile edits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileCommand: Send + Sync {
    /// Apply `update` and return the stored profile.
    ///
    /// # Errors
    /// `not_found` when the session refers to a user that no longer exists.
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate)
    -> Result<User, Error>;
}
