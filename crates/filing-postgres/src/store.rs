//! Postgres implementations of the filing-core port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) so builds never need a live database.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;

use filing_core::{
    Actor, Filing, FilingError, FilingPeriod, FilingPeriodStore, FilingStore, Result, Submission,
    SubmissionState, SubmissionStore, UserAction, UserActionStore, UserActionType,
};

use crate::rows::{FilingPeriodRow, FilingRow, SubmissionRow, UserActionRow};

fn map_unique_violation(e: sqlx::Error, conflict: String) -> FilingError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => FilingError::Conflict(conflict),
        _ => FilingError::Internal(anyhow!(e)),
    }
}

// ── PgSubmissionStore ─────────────────────────────────────────

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn create(
        &self,
        filing_id: i64,
        filename: &str,
        submitter_id: i64,
    ) -> Result<Submission> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        // Lock the filing row so concurrent uploads serialize on the counter.
        let filing = sqlx::query_scalar::<_, i64>(
            r#"SELECT id FROM filing WHERE id = $1 FOR UPDATE"#,
        )
        .bind(filing_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;
        if filing.is_none() {
            return Err(FilingError::NotFound(format!("filing {filing_id}")));
        }

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO submission (counter, filing, state, filename, submitter_id)
            SELECT COALESCE(MAX(counter), 0) + 1, $1, $2, $3, $4
            FROM submission
            WHERE filing = $1
            RETURNING id, counter, filing, state, filename, submitter_id, accepter_id,
                      validation_ruleset_version, validation_summary, submission_time
            "#,
        )
        .bind(filing_id)
        .bind(SubmissionState::SubmissionStarted.as_str())
        .bind(filename)
        .bind(submitter_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        row.try_into()
    }

    async fn update(&self, submission: &Submission) -> Result<Submission> {
        let summary = submission
            .validation_summary
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| anyhow!(e))?;

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            UPDATE submission
            SET state = $2,
                filename = $3,
                accepter_id = $4,
                validation_ruleset_version = $5,
                validation_summary = $6
            WHERE id = $1
            RETURNING id, counter, filing, state, filename, submitter_id, accepter_id,
                      validation_ruleset_version, validation_summary, submission_time
            "#,
        )
        .bind(submission.id)
        .bind(submission.state.as_str())
        .bind(&submission.filename)
        .bind(submission.accepter_id)
        .bind(&submission.validation_ruleset_version)
        .bind(summary)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?
        .ok_or_else(|| FilingError::NotFound(format!("submission {}", submission.id)))?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, counter, filing, state, filename, submitter_id, accepter_id,
                   validation_ruleset_version, validation_summary, submission_time
            FROM submission
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_latest(&self, filing_id: i64) -> Result<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, counter, filing, state, filename, submitter_id, accepter_id,
                   validation_ruleset_version, validation_summary, submission_time
            FROM submission
            WHERE filing = $1
            ORDER BY counter DESC
            LIMIT 1
            "#,
        )
        .bind(filing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filing_id: i64) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, counter, filing, state, filename, submitter_id, accepter_id,
                   validation_ruleset_version, validation_summary, submission_time
            FROM submission
            WHERE filing = $1
            ORDER BY counter DESC
            "#,
        )
        .bind(filing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn expire(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE submission
            SET state = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(SubmissionState::ValidationExpired.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        if result.rows_affected() == 0 {
            return Err(FilingError::NotFound(format!("submission {id}")));
        }
        Ok(())
    }
}

// ── PgFilingStore ─────────────────────────────────────────────

pub struct PgFilingStore {
    pool: PgPool,
}

impl PgFilingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn signatures(&self, filing_id: i64) -> Result<Vec<UserAction>> {
        let rows = sqlx::query_as::<_, UserActionRow>(
            r#"
            SELECT ua.id, ua.user_id, ua.user_name, ua.user_email,
                   ua.action_type, ua."timestamp"
            FROM filing_signature fs
            JOIN user_action ua ON ua.id = fs.user_action
            WHERE fs.filing = $1
            ORDER BY ua."timestamp", ua.id
            "#,
        )
        .bind(filing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[async_trait]
impl FilingStore for PgFilingStore {
    async fn create(&self, period: &str, lei: &str, creator_id: i64) -> Result<Filing> {
        let row = sqlx::query_as::<_, FilingRow>(
            r#"
            INSERT INTO filing (filing_period, lei, creator_id)
            VALUES ($1, $2, $3)
            RETURNING id, filing_period, lei, institution_snapshot_id, contact_info,
                      confirmation_id, creator_id, is_voluntary
            "#,
        )
        .bind(period)
        .bind(lei)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("filing already exists for {lei} in {period}"))
        })?;

        row.into_filing(Vec::new())
    }

    async fn get(&self, lei: &str, period: &str) -> Result<Option<Filing>> {
        let row = sqlx::query_as::<_, FilingRow>(
            r#"
            SELECT id, filing_period, lei, institution_snapshot_id, contact_info,
                   confirmation_id, creator_id, is_voluntary
            FROM filing
            WHERE lei = $1 AND filing_period = $2
            "#,
        )
        .bind(lei)
        .bind(period)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        match row {
            Some(row) => {
                let signatures = self.signatures(row.id).await?;
                Ok(Some(row.into_filing(signatures)?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, filing: &Filing) -> Result<Filing> {
        let contact_info = filing
            .contact_info
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| anyhow!(e))?;

        let row = sqlx::query_as::<_, FilingRow>(
            r#"
            UPDATE filing
            SET institution_snapshot_id = $2,
                contact_info = $3,
                confirmation_id = $4,
                is_voluntary = $5
            WHERE id = $1
            RETURNING id, filing_period, lei, institution_snapshot_id, contact_info,
                      confirmation_id, creator_id, is_voluntary
            "#,
        )
        .bind(filing.id)
        .bind(&filing.institution_snapshot_id)
        .bind(contact_info)
        .bind(&filing.confirmation_id)
        .bind(filing.is_voluntary)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?
        .ok_or_else(|| FilingError::NotFound(format!("filing {}", filing.id)))?;

        let signatures = self.signatures(row.id).await?;
        row.into_filing(signatures)
    }

    async fn add_signature(&self, filing_id: i64, action_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO filing_signature (filing, user_action)
            VALUES ($1, $2)
            "#,
        )
        .bind(filing_id)
        .bind(action_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("filing {filing_id} already has signature {action_id}"))
        })?;
        Ok(())
    }
}

// ── PgFilingPeriodStore ───────────────────────────────────────

pub struct PgFilingPeriodStore {
    pool: PgPool,
}

impl PgFilingPeriodStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FilingPeriodStore for PgFilingPeriodStore {
    async fn list(&self) -> Result<Vec<FilingPeriod>> {
        let rows = sqlx::query_as::<_, FilingPeriodRow>(
            r#"
            SELECT code, description, start_period, end_period, due, filing_type
            FROM filing_period
            ORDER BY start_period
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, code: &str) -> Result<Option<FilingPeriod>> {
        let row = sqlx::query_as::<_, FilingPeriodRow>(
            r#"
            SELECT code, description, start_period, end_period, due, filing_type
            FROM filing_period
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(TryInto::try_into).transpose()
    }
}

// ── PgUserActionStore ─────────────────────────────────────────

pub struct PgUserActionStore {
    pool: PgPool,
}

impl PgUserActionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserActionStore for PgUserActionStore {
    async fn record(&self, actor: &Actor, action_type: UserActionType) -> Result<UserAction> {
        let row = sqlx::query_as::<_, UserActionRow>(
            r#"
            INSERT INTO user_action (user_id, user_name, user_email, action_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, user_name, user_email, action_type, "timestamp"
            "#,
        )
        .bind(&actor.user_id)
        .bind(&actor.user_name)
        .bind(&actor.user_email)
        .bind(action_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<UserAction>> {
        let row = sqlx::query_as::<_, UserActionRow>(
            r#"
            SELECT id, user_id, user_name, user_email, action_type, "timestamp"
            FROM user_action
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(TryInto::try_into).transpose()
    }
}

// ── PgStores ──────────────────────────────────────────────────

/// All adapters over one pool, for wiring at startup.
pub struct PgStores {
    pub submissions: PgSubmissionStore,
    pub filings: PgFilingStore,
    pub periods: PgFilingPeriodStore,
    pub user_actions: PgUserActionStore,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            submissions: PgSubmissionStore::new(pool.clone()),
            filings: PgFilingStore::new(pool.clone()),
            periods: PgFilingPeriodStore::new(pool.clone()),
            user_actions: PgUserActionStore::new(pool),
        }
    }
}
