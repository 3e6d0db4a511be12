//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    HouseholdCommand, HouseholdQuery, LoginService, PollCommand, PollQuery, ProfileCommand,
    RegistrationCommand, UserProfileQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub profile_updates: Arc<dyn ProfileCommand>,
    pub households: Arc<dyn HouseholdCommand>,
    pub households_query: Arc<dyn HouseholdQuery>,
    pub polls: Arc<dyn PollCommand>,
    pub polls_query: Arc<dyn PollQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub profile_updates: Arc<dyn ProfileCommand>,
    pub households: Arc<dyn HouseholdCommand>,
    pub households_query: Arc<dyn HouseholdQuery>,
    pub polls: Arc<dyn PollCommand>,
    pub polls_query: Arc<dyn PollQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::{IdentityService, MembershipService, VotingService};
    /// use backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use backend::outbound::memory::{
    ///     InMemoryHouseholdRepository, InMemoryPollRepository, InMemoryUserRepository,
    /// };
    /// use backend::outbound::password::BcryptPasswordHasher;
    /// use mockable::DefaultClock;
    ///
    /// let users = Arc::new(InMemoryUserRepository::new());
    /// let households = Arc::new(InMemoryHouseholdRepository::new());
    /// let identity = Arc::new(IdentityService::new(
    ///     users.clone(),
    ///     Arc::new(BcryptPasswordHasher::default()),
    /// ));
    /// let membership = Arc::new(MembershipService::new(users, households.clone()));
    /// let voting = Arc::new(VotingService::new(
    ///     Arc::new(InMemoryPollRepository::new()),
    ///     households,
    ///     Arc::new(DefaultClock),
    /// ));
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     login: identity.clone(),
    ///     registration: identity.clone(),
    ///     profile: identity.clone(),
    ///     profile_updates: identity,
    ///     households: membership.clone(),
    ///     households_query: membership,
    ///     polls: voting.clone(),
    ///     polls_query: voting,
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            registration,
            profile,
            profile_updates,
            households,
            households_query,
            polls,
            polls_query,
        } = ports;
        Self {
            login,
            registration,
            profile,
            profile_updates,
            households,
            households_query,
            polls,
            polls_query,
        }
    }
}
