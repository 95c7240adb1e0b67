//! Port traits implemented by the adapters.
//!
//! `filing-postgres` provides the store implementations; the institution
//! registry has an HTTP client in `filing-server`. Tests supply in-memory
//! doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Actor, Filing, FilingPeriod, Submission, UserAction, UserActionType};

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Create a submission in `SUBMISSION_STARTED`, assigning the next
    /// counter for the filing. Counters are serialized per filing and never
    /// reused.
    async fn create(
        &self,
        filing_id: i64,
        filename: &str,
        submitter_id: i64,
    ) -> Result<Submission>;

    /// Merge all mutable fields by id.
    async fn update(&self, submission: &Submission) -> Result<Submission>;

    async fn get(&self, id: i64) -> Result<Option<Submission>>;

    /// Highest counter for the filing, if any submission exists.
    async fn get_latest(&self, filing_id: i64) -> Result<Option<Submission>>;

    /// All submissions for the filing, newest first.
    async fn list(&self, filing_id: i64) -> Result<Vec<Submission>>;

    /// Direct `VALIDATION_EXPIRED` write. Only the expiry watchdog calls
    /// this; it bypasses the orchestrator on purpose.
    async fn expire(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait FilingStore: Send + Sync {
    async fn create(&self, period: &str, lei: &str, creator_id: i64) -> Result<Filing>;

    async fn get(&self, lei: &str, period: &str) -> Result<Option<Filing>>;

    /// Merge snapshot id, contact info, confirmation id, and the voluntary
    /// flag by id. Signatures are appended through `add_signature`.
    async fn update(&self, filing: &Filing) -> Result<Filing>;

    async fn add_signature(&self, filing_id: i64, action_id: i64) -> Result<()>;
}

#[async_trait]
pub trait FilingPeriodStore: Send + Sync {
    async fn list(&self) -> Result<Vec<FilingPeriod>>;

    async fn get(&self, code: &str) -> Result<Option<FilingPeriod>>;
}

#[async_trait]
pub trait UserActionStore: Send + Sync {
    /// Append one audit record. Audit rows are never mutated.
    async fn record(&self, actor: &Actor, action_type: UserActionType) -> Result<UserAction>;

    async fn get(&self, id: i64) -> Result<Option<UserAction>>;
}

/// Institution data as reported by the external registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub lei: String,
    pub name: String,
    /// TIN on record; sign checks require it to be present.
    pub tax_id: Option<String>,
    pub lei_status_code: String,
    /// Whether the LEI status permits filing.
    pub can_file: bool,
}

/// Lookup used by the sign checks; authoritative data lives elsewhere.
#[async_trait]
pub trait InstitutionRegistry: Send + Sync {
    async fn get_institution(&self, lei: &str) -> Result<Option<Institution>>;
}
