//! Household API handlers.
//!
//! ```text
//! POST   /api/v1/households               Found a household
//! POST   /api/v1/households/join          Join by token
//! GET    /api/v1/households/current       Resolve the caller's household
//! DELETE /api/v1/households/current       Leave the caller's household
//! GET    /api/v1/households/current/members  List members
//! ```
//!
//! The session user is always the creator, joiner, or leaver.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::{CreateHouseholdRequest, HouseholdRoster};
use crate::domain::{
    Address, Capacity, Entity, Error, Household, HouseholdName, HouseholdToken, User, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::household_validation_error;

/// Request body for `POST /api/v1/households`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHouseholdBody {
    #[schema(example = "Rue Oberkampf")]
    pub name: String,
    #[schema(example = "12 rue Oberkampf, 75011 Paris")]
    pub address: String,
    #[schema(example = 4)]
    pub capacity: u32,
}

/// Request body for `POST /api/v1/households/join`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinHouseholdBody {
    #[schema(example = "Ab3dE5gH7jK9mN1p")]
    pub token: String,
}

/// Household as returned to members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdResponse {
    pub id: String,
    pub name: String,
    pub address: String,
    pub capacity: u32,
    /// Join token to share with future housemates.
    pub token: String,
    pub member_ids: Vec<String>,
}

impl From<&Household> for HouseholdResponse {
    fn from(household: &Household) -> Self {
        Self {
            id: household.id().to_string(),
            name: household.name().to_string(),
            address: household.address().as_ref().to_owned(),
            capacity: household.capacity().get(),
            token: household.token().to_string(),
            member_ids: household
                .member_ids()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Response body for `GET /api/v1/households/current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentHouseholdResponse {
    /// `null` when the caller belongs to no household.
    pub household: Option<HouseholdResponse>,
}

/// Public member entry in a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

impl From<&User> for MemberResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            username: user.username().to_string(),
            display_name: user.display_name().to_string(),
        }
    }
}

/// Response body for `GET /api/v1/households/current/members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    pub household: HouseholdResponse,
    pub members: Vec<MemberResponse>,
    /// Members listed by the household whose accounts could not be found.
    pub missing_member_ids: Vec<String>,
}

impl From<&HouseholdRoster> for RosterResponse {
    fn from(roster: &HouseholdRoster) -> Self {
        Self {
            household: HouseholdResponse::from(&roster.household),
            members: roster.members.iter().map(MemberResponse::from).collect(),
            missing_member_ids: roster
                .missing_member_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

fn parse_create_body(
    creator: UserId,
    body: CreateHouseholdBody,
) -> Result<CreateHouseholdRequest, Error> {
    let CreateHouseholdBody {
        name,
        address,
        capacity,
    } = body;
    Ok(CreateHouseholdRequest {
        creator,
        name: HouseholdName::new(name).map_err(household_validation_error)?,
        address: Address::new(address).map_err(household_validation_error)?,
        capacity: Capacity::new(capacity).map_err(household_validation_error)?,
    })
}

/// Found a household with the caller as its first member.
#[utoipa::path(
    post,
    path = "/api/v1/households",
    request_body = CreateHouseholdBody,
    responses(
        (status = 201, description = "Household created", body = HouseholdResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 409, description = "Household name already taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["households"],
    operation_id = "createHousehold"
)]
#[post("/households")]
pub async fn create_household(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateHouseholdBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_signed_in()?;
    let request = parse_create_body(user_id, payload.into_inner())?;
    let household = state.households.create_household(request).await?;
    info!(household_id = %household.id(), "household created");
    Ok(HttpResponse::Created().json(HouseholdResponse::from(&household)))
}

/// Join the household identified by a token.
#[utoipa::path(
    post,
    path = "/api/v1/households/join",
    request_body = JoinHouseholdBody,
    responses(
        (status = 200, description = "Joined household", body = HouseholdResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Household or user not found", body = ErrorSchema),
        (status = 409, description = "Already a member", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["households"],
    operation_id = "joinHousehold"
)]
#[post("/households/join")]
pub async fn join_household(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<JoinHouseholdBody>,
) -> ApiResult<web::Json<HouseholdResponse>> {
    let user_id = session.require_signed_in()?;
    let token =
        HouseholdToken::new(payload.into_inner().token).map_err(household_validation_error)?;
    let household = state.households.join_household(&user_id, &token).await?;
    Ok(web::Json(HouseholdResponse::from(&household)))
}

/// Resolve the caller's current household.
#[utoipa::path(
    get,
    path = "/api/v1/households/current",
    responses(
        (status = 200, description = "Current household, or null", body = CurrentHouseholdResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["households"],
    operation_id = "currentHousehold"
)]
#[get("/households/current")]
pub async fn current_household(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CurrentHouseholdResponse>> {
    let user_id = session.require_signed_in()?;
    let household = state.households_query.current_household(&user_id).await?;
    Ok(web::Json(CurrentHouseholdResponse {
        household: household.as_ref().map(HouseholdResponse::from),
    }))
}

/// Leave the caller's current household. Succeeds when there is none.
#[utoipa::path(
    delete,
    path = "/api/v1/households/current",
    responses(
        (status = 204, description = "Left household"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["households"],
    operation_id = "leaveHousehold"
)]
#[delete("/households/current")]
pub async fn leave_household(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_signed_in()?;
    state.households.leave_household(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List the members of the caller's household.
#[utoipa::path(
    get,
    path = "/api/v1/households/current/members",
    responses(
        (status = 200, description = "Household roster", body = RosterResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Caller has no household", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["households"],
    operation_id = "householdMembers"
)]
#[get("/households/current/members")]
pub async fn household_members(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RosterResponse>> {
    let user_id = session.require_signed_in()?;
    let roster = state
        .households_query
        .household_roster(&user_id)
        .await?
        .ok_or_else(|| Error::entity_not_found(Entity::Household))?;
    Ok(web::Json(RosterResponse::from(&roster)))
}
