//! Household ("coloc") model and join tokens.

use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

/// Length of a generated household join token.
pub const HOUSEHOLD_TOKEN_LEN: usize = 16;
/// Maximum allowed length for a household name.
pub const HOUSEHOLD_NAME_MAX: usize = 64;
/// Maximum allowed length for a postal address.
pub const ADDRESS_MAX: usize = 256;

/// Validation errors returned by the household value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HouseholdValidationError {
    EmptyName,
    NameTooLong { max: usize },
    EmptyAddress,
    AddressTooLong { max: usize },
    ZeroCapacity,
    InvalidToken,
}

impl fmt::Display for HouseholdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "household name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "household name must be at most {max} characters")
            }
            Self::EmptyAddress => write!(f, "address must not be empty"),
            Self::AddressTooLong { max } => {
                write!(f, "address must be at most {max} characters")
            }
            Self::ZeroCapacity => write!(f, "capacity must be at least 1"),
            Self::InvalidToken => write!(
                f,
                "household token must be {HOUSEHOLD_TOKEN_LEN} letters or digits",
            ),
        }
    }
}

impl std::error::Error for HouseholdValidationError {}

/// Internal household identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HouseholdId(Uuid);

impl HouseholdId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shareable join token. Unique across households and never changes.
///
/// # Examples
/// ```
/// use backend::domain::HouseholdToken;
///
/// let token = HouseholdToken::generate();
/// assert_eq!(token.as_ref().len(), 16);
/// assert!(HouseholdToken::new(token.as_ref()).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HouseholdToken(String);

impl HouseholdToken {
    /// Validate a token supplied by a client.
    pub fn new(token: impl AsRef<str>) -> Result<Self, HouseholdValidationError> {
        let token = token.as_ref().trim();
        let well_formed = token.len() == HOUSEHOLD_TOKEN_LEN
            && token.chars().all(|c| c.is_ascii_alphanumeric());
        if !well_formed {
            return Err(HouseholdValidationError::InvalidToken);
        }
        Ok(Self(token.to_owned()))
    }

    /// Draw a fresh random token.
    ///
    /// Uniqueness is not guaranteed here; the household store rejects
    /// collisions and the membership service retries.
    #[must_use]
    pub fn generate() -> Self {
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(HOUSEHOLD_TOKEN_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }
}

impl AsRef<str> for HouseholdToken {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for HouseholdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<HouseholdToken> for String {
    fn from(value: HouseholdToken) -> Self {
        value.0
    }
}

impl TryFrom<String> for HouseholdToken {
    type Error = HouseholdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Household name, unique across households. Surrounding whitespace is
/// trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HouseholdName(String);

impl HouseholdName {
    /// Validate and construct a [`HouseholdName`].
    pub fn new(name: impl AsRef<str>) -> Result<Self, HouseholdValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(HouseholdValidationError::EmptyName);
        }
        if trimmed.chars().count() > HOUSEHOLD_NAME_MAX {
            return Err(HouseholdValidationError::NameTooLong {
                max: HOUSEHOLD_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for HouseholdName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for HouseholdName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<HouseholdName> for String {
    fn from(value: HouseholdName) -> Self {
        value.0
    }
}

impl TryFrom<String> for HouseholdName {
    type Error = HouseholdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free-form postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validate and construct an [`Address`].
    pub fn new(address: impl AsRef<str>) -> Result<Self, HouseholdValidationError> {
        let trimmed = address.as_ref().trim();
        if trimmed.is_empty() {
            return Err(HouseholdValidationError::EmptyAddress);
        }
        if trimmed.chars().count() > ADDRESS_MAX {
            return Err(HouseholdValidationError::AddressTooLong { max: ADDRESS_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl TryFrom<String> for Address {
    type Error = HouseholdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Number of rooms in the household. Informational; joins do not check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Capacity(u32);

impl Capacity {
    /// Validate and construct a [`Capacity`].
    pub fn new(capacity: u32) -> Result<Self, HouseholdValidationError> {
        if capacity == 0 {
            return Err(HouseholdValidationError::ZeroCapacity);
        }
        Ok(Self(capacity))
    }

    /// Raw capacity.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<Capacity> for u32 {
    fn from(value: Capacity) -> Self {
        value.0
    }
}

impl TryFrom<u32> for Capacity {
    type Error = HouseholdValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Shared household.
///
/// ## Invariants
/// - `member_ids` never holds the same user twice.
/// - `token` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Household {
    id: HouseholdId,
    name: HouseholdName,
    address: Address,
    capacity: Capacity,
    token: HouseholdToken,
    member_ids: Vec<UserId>,
}

impl Household {
    /// Found a household with `founder` as its only member.
    #[must_use]
    pub fn found(
        name: HouseholdName,
        address: Address,
        capacity: Capacity,
        token: HouseholdToken,
        founder: UserId,
    ) -> Self {
        Self {
            id: HouseholdId::random(),
            name,
            address,
            capacity,
            token,
            member_ids: vec![founder],
        }
    }

    /// Internal identifier.
    #[must_use]
    pub fn id(&self) -> HouseholdId {
        self.id
    }

    /// Unique name.
    #[must_use]
    pub fn name(&self) -> &HouseholdName {
        &self.name
    }

    /// Postal address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Declared capacity.
    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Join token.
    #[must_use]
    pub fn token(&self) -> &HouseholdToken {
        &self.token
    }

    /// Members in join order.
    #[must_use]
    pub fn member_ids(&self) -> &[UserId] {
        &self.member_ids
    }

    /// Whether `user` is listed as a member.
    #[must_use]
    pub fn is_member(&self, user: &UserId) -> bool {
        self.member_ids.contains(user)
    }

    /// Add `user`; returns `false` when already present.
    pub fn add_member(&mut self, user: UserId) -> bool {
        if self.is_member(&user) {
            return false;
        }
        self.member_ids.push(user);
        true
    }

    /// Remove `user`; returns `false` when absent.
    pub fn remove_member(&mut self, user: &UserId) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|member| member != user);
        self.member_ids.len() != before
    }
}
