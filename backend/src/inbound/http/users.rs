//! Users API handlers.
//!
//! ```text
//! POST /api/v1/signup {"username":"ada","displayName":"Ada Lovelace","password":"..."}
//! POST /api/v1/login {"username":"ada","password":"..."}
//! GET /api/v1/users/me
//! PUT /api/v1/users/me {"description":"Night owl, loves board games"}
//! ```
//!
//! Signup and login both establish the session cookie used by every other
//! endpoint.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::ProfileUpdate;
use crate::domain::{LoginCredentials, ProfileDescription, SignupDetails, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{credentials_validation_error, user_validation_error};

/// Signup request body for `POST /api/v1/signup`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    #[schema(example = "correct horse")]
    pub password: String,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "correct horse")]
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Night owl, loves board games")]
    pub description: Option<String>,
    /// Join token of the household the user belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Ab3dE5gH7jK9mN1p")]
    pub household_token: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            username: user.username().to_string(),
            display_name: user.display_name().to_string(),
            description: user.description().map(|description| description.as_ref().to_owned()),
            household_token: user.household_token().map(ToString::to_string),
        }
    }
}

/// Profile edit body for `PUT /api/v1/users/me`. Omitted fields keep their
/// stored value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[schema(example = "Night owl, loves board games")]
    pub description: Option<String>,
}

/// Response body for `POST /api/v1/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    /// Whether the user currently belongs to a household.
    pub has_household: bool,
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Username already taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let SignupRequest {
        username,
        display_name,
        password,
    } = payload.into_inner();
    let details = SignupDetails::try_from_parts(&username, &display_name, &password)
        .map_err(credentials_validation_error)?;
    let user = state.registration.register(details).await?;
    session.sign_in(user.id())?;
    info!(user_id = %user.id(), "user signed up");
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Authenticate a user and establish a session.
///
/// The response reports whether the user currently belongs to a household; a
/// stale household pointer is repaired while answering.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let LoginRequest { username, password } = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&username, &password)
        .map_err(credentials_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    let household = state.households_query.current_household(&user_id).await?;
    let user = state.profile.fetch_profile(&user_id).await?;
    session.sign_in(&user_id)?;
    info!(user_id = %user_id, has_household = household.is_some(), "user logged in");
    Ok(web::Json(LoginResponse {
        user: UserResponse::from(&user),
        has_household: household.is_some(),
    }))
}

/// Return the signed-in user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_signed_in()?;
    let user = state.profile.fetch_profile(&user_id).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Edit the signed-in user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_signed_in()?;
    let description = payload
        .into_inner()
        .description
        .map(ProfileDescription::new)
        .transpose()
        .map_err(user_validation_error)?;
    let user = state
        .profile_updates
        .update_profile(&user_id, ProfileUpdate { description })
        .await?;
    Ok(web::Json(UserResponse::from(&user)))
}
