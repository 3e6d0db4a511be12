//! Driving port for signup.

use async_trait::async_trait;

use crate::domain::{Error, SignupDetails, User};

/// Account creation consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Create a user without a household.
    ///
    /// # Errors
    /// `conflict` (`duplicate_username`) when the username is taken.
    async fn register(&self, details: SignupDetails) -> Result<User, Error>;
}
