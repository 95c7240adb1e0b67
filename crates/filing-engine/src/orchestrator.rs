//! Drives one submission through parse, validation, report, and its final
//! state.
//!
//! The run is fire-and-forget from the caller's perspective; the watchdog
//! tracks the spawned task. Only the initial in-progress write propagates
//! an error; every later failure is recorded as a terminal submission
//! state instead.

use std::sync::Arc;

use filing_core::{FilingError, Submission, SubmissionState, SubmissionStore};
use tracing::{error, info, warn};

use crate::blob_store::{report_key, BlobStore};
use crate::handle::ExecutionHandle;
use crate::report;
use crate::rules::{classify, summarize, RuleValidator, ValidationContext};
use crate::table::DataTable;

pub const REPORT_EXTENSION: &str = "csv";
pub const REPORT_CONTENT_TYPE: &str = "text/csv";

enum PipelineFailure {
    Malformed(String),
    Validator(String),
}

pub struct ValidationOrchestrator {
    submissions: Arc<dyn SubmissionStore>,
    blobs: Arc<dyn BlobStore>,
    validator: Arc<dyn RuleValidator>,
}

impl ValidationOrchestrator {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        blobs: Arc<dyn BlobStore>,
        validator: Arc<dyn RuleValidator>,
    ) -> Self {
        Self {
            submissions,
            blobs,
            validator,
        }
    }

    /// Run the full validation pipeline for one submission.
    ///
    /// Marks the submission in progress, parses and validates on the
    /// blocking pool, stores the findings report, and writes the terminal
    /// state. Every terminal write goes through the execution handle's
    /// flag check, so a run the watchdog has expired discards its result.
    pub async fn run(
        &self,
        period: &str,
        lei: &str,
        mut submission: Submission,
        content: Vec<u8>,
        handle: ExecutionHandle,
    ) -> Result<(), FilingError> {
        let submission_id = submission.id;

        submission.state = SubmissionState::ValidationInProgress;
        submission.validation_ruleset_version =
            Some(self.validator.ruleset_version().to_string());
        submission = self.submissions.update(&submission).await?;

        let outcome = {
            let validator = Arc::clone(&self.validator);
            let ctx = ValidationContext {
                lei: lei.to_string(),
            };
            tokio::task::spawn_blocking(move || {
                let table = DataTable::parse(&content)
                    .map_err(|e| PipelineFailure::Malformed(e.to_string()))?;
                let total_records = table.record_count();
                validator
                    .validate(&table, &ctx)
                    .map(|outcome| (total_records, outcome))
                    .map_err(|e| PipelineFailure::Validator(e.to_string()))
            })
            .await
        };

        let (total_records, outcome) = match outcome {
            Ok(Ok(v)) => v,
            Ok(Err(PipelineFailure::Malformed(e))) => {
                error!(submission_id, error = %e, "uploaded file could not be parsed");
                submission.state = SubmissionState::SubmissionUploadMalformed;
                return self.finalize(submission, &handle).await;
            }
            Ok(Err(PipelineFailure::Validator(e))) => {
                error!(submission_id, error = %e, "rule validator failed");
                submission.state = SubmissionState::ValidationError;
                return self.finalize(submission, &handle).await;
            }
            Err(join_err) => {
                error!(submission_id, error = %join_err, "validation task panicked");
                submission.state = SubmissionState::ValidationError;
                return self.finalize(submission, &handle).await;
            }
        };

        submission.state = classify(&outcome.findings);
        submission.validation_summary = Some(summarize(total_records, &outcome.findings));

        let report_bytes = match report::to_csv(&outcome.findings) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(submission_id, error = %e, "failed to serialize validation report");
                submission.state = SubmissionState::ValidationError;
                submission.validation_summary = None;
                return self.finalize(submission, &handle).await;
            }
        };

        let key = report_key(period, lei, submission_id, REPORT_EXTENSION);
        if let Err(e) = self
            .blobs
            .store(&key, &report_bytes, REPORT_CONTENT_TYPE)
            .await
        {
            error!(submission_id, key = %key, error = %e, "failed to store validation report");
            submission.state = SubmissionState::ValidationError;
            submission.validation_summary = None;
            return self.finalize(submission, &handle).await;
        }

        info!(
            submission_id,
            state = %submission.state,
            phase = %outcome.worst_phase,
            total_records,
            finding_count = outcome.findings.len(),
            "validation finished"
        );
        self.finalize(submission, &handle).await
    }

    /// Terminal state write, guarded by the continue flag.
    ///
    /// When the watchdog has already expired the submission the result is
    /// dropped with a single warning; the expiry write is authoritative.
    async fn finalize(
        &self,
        submission: Submission,
        handle: &ExecutionHandle,
    ) -> Result<(), FilingError> {
        if !handle.should_continue() {
            warn!(
                submission_id = submission.id,
                discarded_state = %submission.state,
                "submission already expired, discarding validation result"
            );
            return Ok(());
        }
        self.submissions.update(&submission).await?;
        Ok(())
    }
}
