//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers live under the `/api/v1` scope and share one JSON error handler
//! so malformed bodies produce the regular error payload.

use actix_web::web;

pub mod error;
pub mod health;
pub mod households;
pub mod polls;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on a scope.
///
/// Session middleware and [`state::HttpState`] are supplied by the caller.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use backend::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(users::signup)
        .service(users::login)
        .service(users::current_user)
        .service(users::update_profile)
        .service(households::create_household)
        .service(households::join_household)
        .service(households::current_household)
        .service(households::leave_household)
        .service(households::household_members)
        .service(polls::create_poll)
        .service(polls::list_polls)
        .service(polls::cast_vote)
        .service(polls::withdraw_vote);
}
