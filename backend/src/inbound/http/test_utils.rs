//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::BoxBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};

use crate::domain::{IdentityService, MembershipService, VotingService};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::{
    InMemoryHouseholdRepository, InMemoryPollRepository, InMemoryUserRepository,
};
use crate::outbound::password::BcryptPasswordHasher;

/// Mirrors bcrypt's private `MIN_COST`; the cheapest cost keeps tests fast.
const BCRYPT_MIN_COST: u32 = 4;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Clock pinned to a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Handles on the stores behind an in-memory [`HttpState`].
pub struct InMemoryStores {
    pub users: Arc<InMemoryUserRepository>,
    pub households: Arc<InMemoryHouseholdRepository>,
    pub polls: Arc<InMemoryPollRepository>,
}

/// Wire the real services over fresh in-memory stores.
pub fn in_memory_state() -> (HttpState, InMemoryStores) {
    let opened = Utc
        .with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
        .single()
        .expect("fixture timestamp");
    let stores = InMemoryStores {
        users: Arc::new(InMemoryUserRepository::new()),
        households: Arc::new(InMemoryHouseholdRepository::new()),
        polls: Arc::new(InMemoryPollRepository::new()),
    };
    let identity = Arc::new(IdentityService::new(
        Arc::clone(&stores.users),
        Arc::new(BcryptPasswordHasher::with_cost(BCRYPT_MIN_COST)),
    ));
    let membership = Arc::new(MembershipService::new(
        Arc::clone(&stores.users),
        Arc::clone(&stores.households),
    ));
    let voting = Arc::new(VotingService::new(
        Arc::clone(&stores.polls),
        Arc::clone(&stores.households),
        Arc::new(FixedClock(opened)),
    ));
    let state = HttpState::new(HttpStatePorts {
        login: identity.clone(),
        registration: identity.clone(),
        profile: identity.clone(),
        profile_updates: identity,
        households: membership.clone(),
        households_query: membership,
        polls: voting.clone(),
        polls_query: voting,
    });
    (state, stores)
}

/// Initialise the full `/api/v1` surface over `state`.
pub async fn init_api(
    state: HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await
}

/// Extract the session cookie set by a response.
pub fn session_cookie(res: &ServiceResponse<BoxBody>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Sign up `username` and return its session cookie plus the user payload.
pub async fn sign_up<S>(app: &S, username: &str) -> (Cookie<'static>, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(json!({
                "username": username,
                "displayName": format!("{username} display"),
                "password": "correct horse",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 201, "signup of {username} failed");
    let cookie = session_cookie(&res);
    let body = test::read_body_json(res).await;
    (cookie, body)
}

/// Found a household as the signed-in user and return its payload.
pub async fn found_household<S>(app: &S, cookie: &Cookie<'static>, name: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/households")
            .cookie(cookie.clone())
            .set_json(json!({
                "name": name,
                "address": "12 rue Oberkampf",
                "capacity": 4,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 201, "creating {name} failed");
    test::read_body_json(res).await
}
