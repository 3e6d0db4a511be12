//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`PasswordHasher`]) are implemented by
//! outbound adapters. Driving ports (`*Command`, `*Query`, [`LoginService`])
//! are implemented by the domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod household_command;
mod household_query;
mod household_repository;
mod login_service;
mod password_hasher;
mod poll_command;
mod poll_query;
mod poll_repository;
mod profile_command;
mod registration_command;
mod user_profile_query;
mod user_repository;

#[cfg(test)]
pub use household_command::MockHouseholdCommand;
pub use household_command::{CreateHouseholdRequest, HouseholdCommand};
#[cfg(test)]
pub use household_query::MockHouseholdQuery;
pub use household_query::{HouseholdQuery, HouseholdRoster};
#[cfg(test)]
pub use household_repository::MockHouseholdRepository;
pub use household_repository::{HouseholdPersistenceError, HouseholdRepository, MemberAddition};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use poll_command::MockPollCommand;
pub use poll_command::{CreatePollRequest, PollCommand, VoteRequest};
#[cfg(test)]
pub use poll_query::MockPollQuery;
pub use poll_query::PollQuery;
#[cfg(test)]
pub use poll_repository::MockPollRepository;
pub use poll_repository::{PollPersistenceError, PollRepository};
#[cfg(test)]
pub use profile_command::MockProfileCommand;
pub use profile_command::{ProfileCommand, ProfileUpdate};
#[cfg(test)]
pub use registration_command::MockRegistrationCommand;
pub use registration_command::RegistrationCommand;
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::UserProfileQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
