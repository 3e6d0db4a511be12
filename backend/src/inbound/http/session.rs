//! Cookie-session access for the coloc API.
//!
//! Signup and login call [`SessionContext::sign_in`]; every household and
//! poll route starts with [`SessionContext::require_signed_in`], which turns
//! an anonymous or unreadable cookie into `401 Unauthorized`. The cookie is
//! the client's only credential.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, UserId};

pub(crate) const SIGNED_IN_USER_KEY: &str = "signed_in_user";

/// Session handle passed to handlers in place of the raw Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`.
    ///
    /// Whatever the cookie carried before (anonymous state or another
    /// user) is discarded and the session is renewed.
    pub fn sign_in(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.clear();
        self.0.renew();
        self.0
            .insert(SIGNED_IN_USER_KEY, user_id.as_ref())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The signed-in user, if any. A cookie carrying a malformed id counts
    /// as anonymous.
    pub fn signed_in_user(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(SIGNED_IN_USER_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| {
            UserId::new(raw)
                .inspect_err(|error| tracing::warn!(%error, "ignoring malformed session user id"))
                .ok()
        }))
    }

    /// The signed-in user, or `401 Unauthorized`.
    pub fn require_signed_in(&self) -> Result<UserId, Error> {
        self.signed_in_user()?
            .ok_or_else(|| Error::unauthorized("sign in to use households and polls"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
