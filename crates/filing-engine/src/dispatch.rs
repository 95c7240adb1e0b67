//! Launches the validation pipeline off the request path.

use std::sync::Arc;

use filing_core::Submission;
use tracing::error;

use crate::handle::ExecutionHandle;
use crate::orchestrator::ValidationOrchestrator;
use crate::watchdog::ExpiryWatchdog;

/// Spawn the validation run and its watchdog for one submission.
///
/// Returns immediately with the run's [`ExecutionHandle`]; the upload
/// request does not wait for validation. The watchdog task owns the
/// run's [`JoinHandle`](tokio::task::JoinHandle), so an overrun can be
/// both detected and aborted.
pub fn spawn_validation(
    orchestrator: Arc<ValidationOrchestrator>,
    watchdog: Arc<ExpiryWatchdog>,
    period: String,
    lei: String,
    submission: Submission,
    content: Vec<u8>,
) -> ExecutionHandle {
    let handle = ExecutionHandle::new();
    let submission_id = submission.id;

    let run_handle = handle.clone();
    let task = tokio::spawn(async move {
        if let Err(e) = orchestrator
            .run(&period, &lei, submission, content, run_handle)
            .await
        {
            error!(submission_id, error = %e, "validation run aborted");
        }
    });

    let watch_handle = handle.clone();
    tokio::spawn(async move {
        watchdog.watch(task, submission_id, watch_handle).await;
    });

    handle
}
