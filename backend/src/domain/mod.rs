//! Domain primitives, aggregates, ports, and services.
//!
//! Purpose: define strongly typed household, poll, and user entities plus the
//! services that keep them consistent. Nothing here depends on Actix or on a
//! concrete store; adapters live under `inbound` and `outbound`.
//!
//! Public surface:
//! - Error / ErrorCode / Entity: transport-agnostic error payload.
//! - User, Household, Poll and their value types.
//! - MembershipService: household create/join/leave/resolve.
//! - VotingService: poll creation, listing, and voting.
//! - IdentityService: signup, login, and profile reads.

pub mod auth;
pub mod error;
pub mod household;
mod identity_service;
mod membership_service;
pub mod poll;
pub mod ports;
pub mod trace_id;
pub mod user;
mod voting_service;

pub use self::auth::{CredentialsValidationError, LoginCredentials, PASSWORD_MIN, SignupDetails};
pub use self::error::{Entity, Error, ErrorCode};
pub use self::household::{
    Address, Capacity, HOUSEHOLD_TOKEN_LEN, Household, HouseholdId, HouseholdName,
    HouseholdToken, HouseholdValidationError,
};
pub use self::identity_service::IdentityService;
pub use self::membership_service::{MembershipService, TOKEN_ATTEMPTS};
pub use self::poll::{
    NewPoll, OptionVoters, Poll, PollId, PollOption, PollOptions, PollTitle,
    PollValidationError, UnknownOption, VoteLedger,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DESCRIPTION_MAX, DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, DisplayName, PasswordHash,
    ProfileDescription, USERNAME_MAX, USERNAME_MIN, User, UserId, UserValidationError, Username,
};
pub use self::voting_service::VotingService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
