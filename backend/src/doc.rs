//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every `/api/v1` handler plus the health probes
//! - **Schemas**: request/response bodies and the domain error wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`])
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::health::ProbeStatus;
use crate::inbound::http::households::{
    CreateHouseholdBody, CurrentHouseholdResponse, HouseholdResponse, JoinHouseholdBody,
    MemberResponse, RosterResponse,
};
use crate::inbound::http::polls::{CreatePollBody, OptionTally, PollResponse, VoteBody};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{
    LoginRequest, LoginResponse, SignupRequest, UpdateProfileRequest, UserResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/signup or POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Coloc backend API",
        description = "Shared-household coordination: accounts, households, and polls."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::signup,
        crate::inbound::http::users::login,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::households::create_household,
        crate::inbound::http::households::join_household,
        crate::inbound::http::households::current_household,
        crate::inbound::http::households::leave_household,
        crate::inbound::http::households::household_members,
        crate::inbound::http::polls::create_poll,
        crate::inbound::http::polls::list_polls,
        crate::inbound::http::polls::cast_vote,
        crate::inbound::http::polls::withdraw_vote,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        SignupRequest,
        LoginRequest,
        LoginResponse,
        UpdateProfileRequest,
        UserResponse,
        CreateHouseholdBody,
        JoinHouseholdBody,
        HouseholdResponse,
        CurrentHouseholdResponse,
        MemberResponse,
        RosterResponse,
        CreatePollBody,
        VoteBody,
        OptionTally,
        PollResponse,
        ProbeStatus,
    )),
    tags(
        (name = "users", description = "Signup, login, and profile edits"),
        (name = "households", description = "Founding, joining, and leaving households"),
        (name = "polls", description = "Household polls and voting"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI document structure.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn poll_response_uses_camel_case_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let poll = schemas.get("PollResponse").expect("PollResponse schema");

        assert_object_schema_has_field(poll, "householdToken");
        assert_object_schema_has_field(poll, "createdAt");
    }

    #[rstest]
    #[case("/api/v1/signup")]
    #[case("/api/v1/users/me")]
    #[case("/api/v1/households/current/members")]
    #[case("/api/v1/polls/{id}/vote")]
    #[case("/api/v1/polls/{id}/withdraw")]
    #[case("/health/ready")]
    fn documents_every_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }
}
