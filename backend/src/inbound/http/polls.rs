//! Poll API handlers.
//!
//! ```text
//! POST /api/v1/polls                {"title":"Dinner","options":["Pizza","Sushi"]}
//! GET  /api/v1/polls
//! PUT  /api/v1/polls/{id}/vote      {"option":"Pizza"}
//! PUT  /api/v1/polls/{id}/withdraw  {"option":"Pizza"}
//! ```
//!
//! The session user is the poll creator or voter. When a create request omits
//! `householdToken`, the poll is attached to the caller's current household.

use actix_web::{HttpResponse, get, post, put, web};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreatePollRequest, VoteRequest};
use crate::domain::{
    Entity, Error, HouseholdToken, OptionVoters, Poll, PollId, PollOptions, PollTitle, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, household_token_error, parse_uuid, poll_validation_error,
};

/// Request body for `POST /api/v1/polls`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollBody {
    /// Household the poll belongs to; defaults to the caller's household.
    #[serde(default)]
    #[schema(example = "Ab3dE5gH7jK9mN1p")]
    pub household_token: Option<String>,
    #[schema(example = "Dinner on Friday")]
    pub title: String,
    #[schema(example = json!(["Pizza", "Sushi"]))]
    pub options: Vec<String>,
}

/// Request body for the vote and withdraw endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    #[schema(example = "Pizza")]
    pub option: String,
}

/// Tally for a single option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option: String,
    pub count: usize,
    pub voter_ids: Vec<String>,
}

impl From<&OptionVoters> for OptionTally {
    fn from(entry: &OptionVoters) -> Self {
        Self {
            option: entry.option().to_string(),
            count: entry.count(),
            voter_ids: entry.voters().map(ToString::to_string).collect(),
        }
    }
}

/// Poll with its current tallies, options in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub title: String,
    pub household_token: String,
    /// Username of the member who opened the poll.
    pub created_by: String,
    /// RFC 3339 timestamp.
    #[schema(example = "2026-05-01T12:00:00Z")]
    pub created_at: String,
    pub options: Vec<OptionTally>,
}

impl From<&Poll> for PollResponse {
    fn from(poll: &Poll) -> Self {
        Self {
            id: poll.id().to_string(),
            title: poll.title().to_string(),
            household_token: poll.household_token().to_string(),
            created_by: poll.created_by().to_string(),
            created_at: poll.created_at().to_rfc3339_opts(SecondsFormat::Secs, true),
            options: poll.ledger().entries().iter().map(OptionTally::from).collect(),
        }
    }
}

async fn household_token_for(
    state: &HttpState,
    user_id: &UserId,
    supplied: Option<String>,
) -> Result<HouseholdToken, Error> {
    if let Some(raw) = supplied {
        return HouseholdToken::new(raw)
            .map_err(|err| household_token_error(err, FieldName::new("householdToken")));
    }
    state
        .households_query
        .current_household(user_id)
        .await?
        .map(|household| household.token().clone())
        .ok_or_else(|| Error::entity_not_found(Entity::Household))
}

fn poll_id_from_path(raw: &str) -> Result<PollId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(PollId::from_uuid)
}

/// Open a poll in a household.
#[utoipa::path(
    post,
    path = "/api/v1/polls",
    request_body = CreatePollBody,
    responses(
        (status = 201, description = "Poll created", body = PollResponse),
        (status = 400, description = "Invalid title or options", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Household not found", body = ErrorSchema),
        (status = 409, description = "Poll title already used", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["polls"],
    operation_id = "createPoll"
)]
#[post("/polls")]
pub async fn create_poll(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePollBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_signed_in()?;
    let CreatePollBody {
        household_token,
        title,
        options,
    } = payload.into_inner();
    let title = PollTitle::new(title).map_err(poll_validation_error)?;
    let options = PollOptions::new(options).map_err(poll_validation_error)?;
    let household_token = household_token_for(&state, &user_id, household_token).await?;
    let creator = state.profile.fetch_profile(&user_id).await?;

    let poll = state
        .polls
        .create_poll(CreatePollRequest {
            household_token,
            title,
            options,
            created_by: creator.username().clone(),
        })
        .await?;
    Ok(HttpResponse::Created().json(PollResponse::from(&poll)))
}

/// List every poll, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/polls",
    responses(
        (status = 200, description = "Polls", body = [PollResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["polls"],
    operation_id = "listPolls"
)]
#[get("/polls")]
pub async fn list_polls(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PollResponse>>> {
    session.require_signed_in()?;
    let polls = state.polls_query.list_polls().await?;
    Ok(web::Json(polls.iter().map(PollResponse::from).collect()))
}

/// Vote for an option, moving any earlier vote by the caller.
#[utoipa::path(
    put,
    path = "/api/v1/polls/{id}/vote",
    params(("id" = String, Path, description = "Poll identifier")),
    request_body = VoteBody,
    responses(
        (status = 200, description = "Updated tallies", body = PollResponse),
        (status = 400, description = "Unknown option or malformed id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Poll not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["polls"],
    operation_id = "castVote"
)]
#[put("/polls/{id}/vote")]
pub async fn cast_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<VoteBody>,
) -> ApiResult<web::Json<PollResponse>> {
    let voter = session.require_signed_in()?;
    let poll_id = poll_id_from_path(&path.into_inner())?;
    let poll = state
        .polls
        .cast_vote(VoteRequest {
            poll_id,
            voter,
            option: payload.into_inner().option,
        })
        .await?;
    Ok(web::Json(PollResponse::from(&poll)))
}

/// Withdraw the caller's vote from an option.
///
/// Withdrawing from an option the caller did not choose changes nothing.
#[utoipa::path(
    put,
    path = "/api/v1/polls/{id}/withdraw",
    params(("id" = String, Path, description = "Poll identifier")),
    request_body = VoteBody,
    responses(
        (status = 200, description = "Updated tallies", body = PollResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Poll not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["polls"],
    operation_id = "withdrawVote"
)]
#[put("/polls/{id}/withdraw")]
pub async fn withdraw_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<VoteBody>,
) -> ApiResult<web::Json<PollResponse>> {
    let voter = session.require_signed_in()?;
    let poll_id = poll_id_from_path(&path.into_inner())?;
    let poll = state
        .polls
        .withdraw_vote(VoteRequest {
            poll_id,
            voter,
            option: payload.into_inner().option,
        })
        .await?;
    Ok(web::Json(PollResponse::from(&poll)))
}
