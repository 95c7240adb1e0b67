//! Filing, submission, and audit entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::SubmissionState;

/// Kind of audited user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserActionType {
    Create,
    Submit,
    Accept,
    Sign,
}

impl UserActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Submit => "SUBMIT",
            Self::Accept => "ACCEPT",
            Self::Sign => "SIGN",
        }
    }
}

impl std::fmt::Display for UserActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "SUBMIT" => Ok(Self::Submit),
            "ACCEPT" => Ok(Self::Accept),
            "SIGN" => Ok(Self::Sign),
            _ => Err(format!("Unknown user action type: {}", s)),
        }
    }
}

impl TryFrom<String> for UserActionType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilingType {
    Annual,
}

impl FilingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "ANNUAL",
        }
    }
}

impl std::str::FromStr for FilingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANNUAL" => Ok(Self::Annual),
            _ => Err(format!("Unknown filing type: {}", s)),
        }
    }
}

/// A reporting window institutions file against (e.g. `"2024"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingPeriod {
    pub code: String,
    pub description: String,
    pub start_period: DateTime<Utc>,
    pub end_period: DateTime<Utc>,
    pub due: DateTime<Utc>,
    pub filing_type: FilingType,
}

/// Identity forwarded by the upstream gateway; authentication is external.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

/// Append-only audit record of a create/submit/accept/sign event.
///
/// Never mutated after creation; referenced by `Submission.submitter_id`,
/// `Submission.accepter_id`, `Filing.creator_id`, and filing signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAction {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub action_type: UserActionType,
    pub timestamp: DateTime<Utc>,
}

/// Point of contact for a filing, replaced wholesale via the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub hq_address_street_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hq_address_street_2: Option<String>,
    pub hq_address_city: String,
    pub hq_address_state: String,
    pub hq_address_zip: String,
    pub email: String,
    pub phone: String,
}

/// One institution's obligation to report for one period.
///
/// Natural key is `(filing_period, lei)`; the surrogate id exists for
/// foreign keys only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filing {
    pub id: i64,
    pub filing_period: String,
    pub lei: String,
    pub institution_snapshot_id: Option<String>,
    pub contact_info: Option<ContactInfo>,
    /// Set at signing: `{lei}-{period}-{submission_id}-{unix_millis}`.
    pub confirmation_id: Option<String>,
    pub creator_id: i64,
    /// Tri-state: unset until the institution declares either way.
    pub is_voluntary: Option<bool>,
    /// SIGN actions, oldest first.
    pub signatures: Vec<UserAction>,
}

/// One attempt to upload and validate data for a filing.
///
/// `counter` is the per-filing attempt number, assigned at creation and
/// never reused; a failed attempt still consumes its counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub counter: i32,
    pub filing_id: i64,
    pub state: SubmissionState,
    pub filename: String,
    pub submitter_id: i64,
    pub accepter_id: Option<i64>,
    /// Stamped when validation starts, before any outcome is known.
    pub validation_ruleset_version: Option<String>,
    pub validation_summary: Option<ValidationSummary>,
    pub submission_time: DateTime<Utc>,
}

/// Compact counts persisted alongside the terminal validation state.
///
/// `total_records` is the input row count, independent of how many findings
/// were produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_records: u64,
    pub syntax_errors: u64,
    pub logic_errors: u64,
    pub logic_warnings: u64,
}

impl ValidationSummary {
    pub fn error_count(&self) -> u64 {
        self.syntax_errors + self.logic_errors
    }
}
