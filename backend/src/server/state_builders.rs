//! Builders wiring the in-memory stores into the shared HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use backend::domain::{IdentityService, MembershipService, VotingService};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::memory::{
    InMemoryHouseholdRepository, InMemoryPollRepository, InMemoryUserRepository,
};
use backend::outbound::password::BcryptPasswordHasher;

/// Build the shared HTTP state over fresh stores and the given clock.
///
/// The identity, membership, and voting services share one user store and one
/// household store so membership pointers and rosters stay in step.
pub(super) fn build_http_state(clock: Arc<dyn Clock>) -> web::Data<HttpState> {
    let users = Arc::new(InMemoryUserRepository::new());
    let households = Arc::new(InMemoryHouseholdRepository::new());
    let polls = Arc::new(InMemoryPollRepository::new());

    let identity = Arc::new(IdentityService::new(
        Arc::clone(&users),
        Arc::new(BcryptPasswordHasher::default()),
    ));
    let membership = Arc::new(MembershipService::new(users, Arc::clone(&households)));
    let voting = Arc::new(VotingService::new(polls, households, clock));

    web::Data::new(HttpState::new(HttpStatePorts {
        login: identity.clone(),
        registration: identity.clone(),
        profile: identity.clone(),
        profile_updates: identity,
        households: membership.clone(),
        households_query: membership,
        polls: voting.clone(),
        polls_query: voting,
    }))
}

/// Build the production state using the system clock.
pub(super) fn build_default_http_state() -> web::Data<HttpState> {
    build_http_state(Arc::new(DefaultClock))
}
