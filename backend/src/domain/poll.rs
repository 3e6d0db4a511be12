//! Single-choice household polls and their vote ledger.
//!
//! The ledger keeps one voter set per declared option. A voter appears in at
//! most one set; [`VoteLedger::move_voter_to`] is the only way to add a voter
//! and removes them from every other option in the same step. Counts are
//! always derived from set sizes.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{HouseholdToken, UserId, Username};

/// Maximum allowed length for a poll title.
pub const POLL_TITLE_MAX: usize = 120;
/// Maximum allowed length for a single option label.
pub const POLL_OPTION_MAX: usize = 80;

/// Validation errors returned by the poll value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    NoOptions,
    BlankOption,
    OptionTooLong { max: usize },
    DuplicateOption { option: String },
}

impl fmt::Display for PollValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "poll title must not be empty"),
            Self::TitleTooLong { max } => {
                write!(f, "poll title must be at most {max} characters")
            }
            Self::NoOptions => write!(f, "a poll needs at least one option"),
            Self::BlankOption => write!(f, "poll options must not be blank"),
            Self::OptionTooLong { max } => {
                write!(f, "poll options must be at most {max} characters")
            }
            Self::DuplicateOption { option } => {
                write!(f, "poll option '{option}' is listed more than once")
            }
        }
    }
}

impl std::error::Error for PollValidationError {}

/// Poll identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PollId(Uuid);

impl PollId {
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

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Poll title, unique across every household.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollTitle(String);

impl PollTitle {
    /// Validate and construct a [`PollTitle`].
    pub fn new(title: impl AsRef<str>) -> Result<Self, PollValidationError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PollValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > POLL_TITLE_MAX {
            return Err(PollValidationError::TitleTooLong {
                max: POLL_TITLE_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PollTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PollTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// One label a voter may choose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollOption(String);

impl PollOption {
    /// Validate and construct a [`PollOption`].
    pub fn new(option: impl AsRef<str>) -> Result<Self, PollValidationError> {
        let trimmed = option.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PollValidationError::BlankOption);
        }
        if trimmed.chars().count() > POLL_OPTION_MAX {
            return Err(PollValidationError::OptionTooLong {
                max: POLL_OPTION_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PollOption {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PollOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Ordered, non-empty list of distinct options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions(Vec<PollOption>);

impl PollOptions {
    /// Validate raw labels, preserving their order.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{PollOptions, PollValidationError};
    ///
    /// assert!(PollOptions::new(["Pizza", "Sushi"]).is_ok());
    /// assert_eq!(
    ///     PollOptions::new(["Pizza", "Pizza"]),
    ///     Err(PollValidationError::DuplicateOption { option: "Pizza".into() })
    /// );
    /// ```
    pub fn new<I, S>(options: I) -> Result<Self, PollValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<PollOption> = Vec::new();
        for raw in options {
            let option = PollOption::new(raw)?;
            if parsed.contains(&option) {
                return Err(PollValidationError::DuplicateOption {
                    option: option.0,
                });
            }
            parsed.push(option);
        }
        if parsed.is_empty() {
            return Err(PollValidationError::NoOptions);
        }
        Ok(Self(parsed))
    }

    /// Options in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[PollOption] {
        &self.0
    }
}

/// Returned when a vote names an option the poll does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption(pub String);

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "poll has no option '{}'", self.0)
    }
}

impl std::error::Error for UnknownOption {}

/// Voters currently backing one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionVoters {
    option: PollOption,
    voters: BTreeSet<UserId>,
}

impl OptionVoters {
    /// The option label.
    #[must_use]
    pub fn option(&self) -> &PollOption {
        &self.option
    }

    /// Voters in a stable order.
    pub fn voters(&self) -> impl Iterator<Item = &UserId> {
        self.voters.iter()
    }

    /// Number of voters backing this option.
    #[must_use]
    pub fn count(&self) -> usize {
        self.voters.len()
    }
}

/// Per-option voter sets of a poll.
///
/// # Examples
/// ```
/// use backend::domain::{PollOptions, UserId, VoteLedger};
///
/// let mut ledger = VoteLedger::new(&PollOptions::new(["Pizza", "Sushi"]).expect("options"));
/// let voter = UserId::random();
/// ledger.move_voter_to(&voter, "Pizza").expect("known option");
/// ledger.move_voter_to(&voter, "Sushi").expect("known option");
/// assert_eq!(ledger.choice_of(&voter).map(|o| o.as_ref()), Some("Sushi"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteLedger(Vec<OptionVoters>);

impl VoteLedger {
    /// Ledger with an empty voter set for every option.
    #[must_use]
    pub fn new(options: &PollOptions) -> Self {
        Self(
            options
                .as_slice()
                .iter()
                .map(|option| OptionVoters {
                    option: option.clone(),
                    voters: BTreeSet::new(),
                })
                .collect(),
        )
    }

    /// Record `voter` against `option`, dropping any earlier choice.
    ///
    /// The ledger is untouched when `option` is not declared.
    pub fn move_voter_to(&mut self, voter: &UserId, option: &str) -> Result<(), UnknownOption> {
        let target = self
            .position(option)
            .ok_or_else(|| UnknownOption(option.to_owned()))?;
        for entry in &mut self.0 {
            entry.voters.remove(voter);
        }
        if let Some(entry) = self.0.get_mut(target) {
            entry.voters.insert(voter.clone());
        }
        Ok(())
    }

    /// Remove `voter` from `option` only. Returns whether anything changed.
    pub fn withdraw(&mut self, voter: &UserId, option: &str) -> bool {
        self.position(option)
            .and_then(|index| self.0.get_mut(index))
            .is_some_and(|entry| entry.voters.remove(voter))
    }

    /// The option `voter` currently backs, if any.
    #[must_use]
    pub fn choice_of(&self, voter: &UserId) -> Option<&PollOption> {
        self.0
            .iter()
            .find(|entry| entry.voters.contains(voter))
            .map(|entry| &entry.option)
    }

    /// Options and their voters in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[OptionVoters] {
        &self.0
    }

    fn position(&self, option: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|entry| entry.option.as_ref() == option)
    }
}

/// A household poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    id: PollId,
    title: PollTitle,
    household_token: HouseholdToken,
    created_by: Username,
    created_at: DateTime<Utc>,
    ledger: VoteLedger,
}

/// Input for [`Poll::open`].
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub title: PollTitle,
    pub options: PollOptions,
    pub household_token: HouseholdToken,
    pub created_by: Username,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Open a poll with no votes.
    #[must_use]
    pub fn open(new: NewPoll) -> Self {
        Self {
            id: PollId::random(),
            ledger: VoteLedger::new(&new.options),
            title: new.title,
            household_token: new.household_token,
            created_by: new.created_by,
            created_at: new.created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> PollId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &PollTitle {
        &self.title
    }

    #[must_use]
    pub fn household_token(&self) -> &HouseholdToken {
        &self.household_token
    }

    #[must_use]
    pub fn created_by(&self) -> &Username {
        &self.created_by
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current votes.
    #[must_use]
    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    /// See [`VoteLedger::move_voter_to`].
    pub fn cast_vote(&mut self, voter: &UserId, option: &str) -> Result<(), UnknownOption> {
        self.ledger.move_voter_to(voter, option)
    }

    /// See [`VoteLedger::withdraw`].
    pub fn withdraw_vote(&mut self, voter: &UserId, option: &str) -> bool {
        self.ledger.withdraw(voter, option)
    }
}
