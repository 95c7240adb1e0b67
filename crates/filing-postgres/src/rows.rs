//! Row types bridging Postgres records to the domain model.
//!
//! Enum-typed and JSONB columns come back as text/value and are converted
//! here; a row that fails conversion is a corrupt record and surfaces as
//! an internal error.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use filing_core::{
    Filing, FilingError, FilingPeriod, FilingType, Submission, SubmissionState, UserAction,
    UserActionType, ValidationSummary,
};

#[derive(Debug, FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub counter: i32,
    pub filing: i64,
    pub state: String,
    pub filename: String,
    pub submitter_id: i64,
    pub accepter_id: Option<i64>,
    pub validation_ruleset_version: Option<String>,
    pub validation_summary: Option<serde_json::Value>,
    pub submission_time: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = FilingError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let state: SubmissionState = row
            .state
            .parse()
            .map_err(|e: String| FilingError::Internal(anyhow!(e)))?;
        let validation_summary = row
            .validation_summary
            .map(serde_json::from_value::<ValidationSummary>)
            .transpose()
            .map_err(|e| FilingError::Internal(anyhow!(e)))?;
        Ok(Submission {
            id: row.id,
            counter: row.counter,
            filing_id: row.filing,
            state,
            filename: row.filename,
            submitter_id: row.submitter_id,
            accepter_id: row.accepter_id,
            validation_ruleset_version: row.validation_ruleset_version,
            validation_summary,
            submission_time: row.submission_time,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct FilingRow {
    pub id: i64,
    pub filing_period: String,
    pub lei: String,
    pub institution_snapshot_id: Option<String>,
    pub contact_info: Option<serde_json::Value>,
    pub confirmation_id: Option<String>,
    pub creator_id: i64,
    pub is_voluntary: Option<bool>,
}

impl FilingRow {
    /// Signatures live in a join table and are loaded separately.
    pub fn into_filing(self, signatures: Vec<UserAction>) -> Result<Filing, FilingError> {
        let contact_info = self
            .contact_info
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| FilingError::Internal(anyhow!(e)))?;
        Ok(Filing {
            id: self.id,
            filing_period: self.filing_period,
            lei: self.lei,
            institution_snapshot_id: self.institution_snapshot_id,
            contact_info,
            confirmation_id: self.confirmation_id,
            creator_id: self.creator_id,
            is_voluntary: self.is_voluntary,
            signatures,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct FilingPeriodRow {
    pub code: String,
    pub description: String,
    pub start_period: DateTime<Utc>,
    pub end_period: DateTime<Utc>,
    pub due: DateTime<Utc>,
    pub filing_type: String,
}

impl TryFrom<FilingPeriodRow> for FilingPeriod {
    type Error = FilingError;

    fn try_from(row: FilingPeriodRow) -> Result<Self, Self::Error> {
        let filing_type: FilingType = row
            .filing_type
            .parse()
            .map_err(|e: String| FilingError::Internal(anyhow!(e)))?;
        Ok(FilingPeriod {
            code: row.code,
            description: row.description,
            start_period: row.start_period,
            end_period: row.end_period,
            due: row.due,
            filing_type,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct UserActionRow {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub action_type: String,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<UserActionRow> for UserAction {
    type Error = FilingError;

    fn try_from(row: UserActionRow) -> Result<Self, Self::Error> {
        let action_type: UserActionType = row
            .action_type
            .parse()
            .map_err(|e: String| FilingError::Internal(anyhow!(e)))?;
        Ok(UserAction {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            action_type,
            timestamp: row.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission_row(state: &str, summary: Option<serde_json::Value>) -> SubmissionRow {
        SubmissionRow {
            id: 1,
            counter: 1,
            filing: 10,
            state: state.to_string(),
            filename: "register.csv".into(),
            submitter_id: 100,
            accepter_id: None,
            validation_ruleset_version: Some("0.1.0".into()),
            validation_summary: summary,
            submission_time: Utc::now(),
        }
    }

    #[test]
    fn submission_row_converts_state_and_summary() {
        let summary = serde_json::json!({
            "total_records": 5,
            "syntax_errors": 0,
            "logic_errors": 1,
            "logic_warnings": 2
        });
        let submission: Submission = submission_row("VALIDATION_WITH_ERRORS", Some(summary))
            .try_into()
            .unwrap();
        assert_eq!(submission.state, SubmissionState::ValidationWithErrors);
        let s = submission.validation_summary.unwrap();
        assert_eq!(s.total_records, 5);
        assert_eq!(s.logic_errors, 1);
    }

    #[test]
    fn unknown_state_is_an_internal_error() {
        let result: Result<Submission, _> = submission_row("SHREDDED", None).try_into();
        assert!(matches!(result, Err(FilingError::Internal(_))));
    }

    #[test]
    fn filing_row_parses_contact_info() {
        let row = FilingRow {
            id: 3,
            filing_period: "2024".into(),
            lei: "TESTBANK123400000000".into(),
            institution_snapshot_id: None,
            contact_info: Some(serde_json::json!({
                "first_name": "Ada",
                "last_name": "Smith",
                "hq_address_street_1": "1 Main St",
                "hq_address_city": "Springfield",
                "hq_address_state": "IL",
                "hq_address_zip": "62701",
                "email": "ada@example.bank",
                "phone": "555-0100"
            })),
            confirmation_id: None,
            creator_id: 100,
            is_voluntary: Some(false),
        };
        let filing = row.into_filing(Vec::new()).unwrap();
        assert_eq!(filing.contact_info.unwrap().first_name, "Ada");
        assert_eq!(filing.is_voluntary, Some(false));
    }

    #[test]
    fn user_action_row_round_trips_action_type() {
        let row = UserActionRow {
            id: 9,
            user_id: "u-1".into(),
            user_name: "Ada Smith".into(),
            user_email: "ada@example.bank".into(),
            action_type: "SIGN".into(),
            timestamp: Utc::now(),
        };
        let action: UserAction = row.try_into().unwrap();
        assert_eq!(action.action_type, UserActionType::Sign);
    }
}
