//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain value constructors report typed validation errors. This module turns
//! them into `invalid_request` payloads whose `details` name the offending
//! request field (camelCase, as it appears in the JSON body) and a stable
//! snake_case code.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    CredentialsValidationError, Error, HouseholdValidationError, PollValidationError,
    UserValidationError,
};

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_input(field.as_str(), code, message)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a valid UUID")).with_details(json!({
        "field": name,
        "value": value,
        "code": "invalid_uuid",
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Map a user value error onto the request field it came from.
pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    let (field, code) = match err {
        UserValidationError::EmptyId | UserValidationError::InvalidId => {
            (FieldName::new("id"), "invalid_id")
        }
        UserValidationError::EmptyUsername => (FieldName::new("username"), "empty_username"),
        UserValidationError::UsernameTooShort { .. } => {
            (FieldName::new("username"), "username_too_short")
        }
        UserValidationError::UsernameTooLong { .. } => {
            (FieldName::new("username"), "username_too_long")
        }
        UserValidationError::UsernameInvalidCharacters => {
            (FieldName::new("username"), "username_invalid_characters")
        }
        UserValidationError::EmptyDisplayName => {
            (FieldName::new("displayName"), "empty_display_name")
        }
        UserValidationError::DisplayNameTooShort { .. } => {
            (FieldName::new("displayName"), "display_name_too_short")
        }
        UserValidationError::DisplayNameTooLong { .. } => {
            (FieldName::new("displayName"), "display_name_too_long")
        }
        UserValidationError::DisplayNameInvalidCharacters => {
            (FieldName::new("displayName"), "display_name_invalid_characters")
        }
        UserValidationError::EmptyDescription => {
            (FieldName::new("description"), "empty_description")
        }
        UserValidationError::DescriptionTooLong { .. } => {
            (FieldName::new("description"), "description_too_long")
        }
    };
    field_error(field, code, err.to_string())
}

pub(crate) fn credentials_validation_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::EmptyUsername => {
            field_error(FieldName::new("username"), "empty_username", err.to_string())
        }
        CredentialsValidationError::EmptyPassword => {
            field_error(FieldName::new("password"), "empty_password", err.to_string())
        }
        CredentialsValidationError::PasswordTooShort { .. } => field_error(
            FieldName::new("password"),
            "password_too_short",
            err.to_string(),
        ),
        CredentialsValidationError::User(inner) => user_validation_error(inner),
    }
}

pub(crate) fn household_validation_error(err: HouseholdValidationError) -> Error {
    let (field, code) = match err {
        HouseholdValidationError::EmptyName => (FieldName::new("name"), "empty_name"),
        HouseholdValidationError::NameTooLong { .. } => (FieldName::new("name"), "name_too_long"),
        HouseholdValidationError::EmptyAddress => (FieldName::new("address"), "empty_address"),
        HouseholdValidationError::AddressTooLong { .. } => {
            (FieldName::new("address"), "address_too_long")
        }
        HouseholdValidationError::ZeroCapacity => (FieldName::new("capacity"), "zero_capacity"),
        HouseholdValidationError::InvalidToken => (FieldName::new("token"), "invalid_token"),
    };
    field_error(field, code, err.to_string())
}

/// Report a malformed household token under the given request field.
pub(crate) fn household_token_error(err: HouseholdValidationError, field: FieldName) -> Error {
    field_error(field, "invalid_token", err.to_string())
}

pub(crate) fn poll_validation_error(err: PollValidationError) -> Error {
    let (field, code) = match &err {
        PollValidationError::EmptyTitle => (FieldName::new("title"), "empty_title"),
        PollValidationError::TitleTooLong { .. } => (FieldName::new("title"), "title_too_long"),
        PollValidationError::NoOptions => (FieldName::new("options"), "no_options"),
        PollValidationError::BlankOption => (FieldName::new("options"), "blank_option"),
        PollValidationError::OptionTooLong { .. } => {
            (FieldName::new("options"), "option_too_long")
        }
        PollValidationError::DuplicateOption { .. } => {
            (FieldName::new("options"), "duplicate_option")
        }
    };
    field_error(field, code, err.to_string())
}
