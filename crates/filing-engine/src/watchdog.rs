//! Expires validation runs that exceed the configured deadline.

use std::sync::Arc;
use std::time::Duration;

use filing_core::SubmissionStore;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::handle::ExecutionHandle;

/// Watches one validation task and force-expires it after a fixed timeout.
///
/// One watchdog instance is shared across all submissions; each call to
/// [`watch`](ExpiryWatchdog::watch) monitors a single run. The check is
/// deliberately one-shot: sleep the full timeout, look at the task once,
/// and either stand down or expire.
pub struct ExpiryWatchdog {
    submissions: Arc<dyn SubmissionStore>,
    timeout: Duration,
}

impl ExpiryWatchdog {
    pub fn new(submissions: Arc<dyn SubmissionStore>, timeout: Duration) -> Self {
        Self {
            submissions,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sleep the timeout, then expire the submission if the task is still
    /// running. A finished task means the pipeline already wrote its
    /// terminal state, and the watchdog stands down without logging.
    pub async fn watch(&self, task: JoinHandle<()>, submission_id: i64, handle: ExecutionHandle) {
        tokio::time::sleep(self.timeout).await;

        if task.is_finished() {
            return;
        }

        // Revoking the flag is what actually wins the race: the pipeline
        // checks it before any terminal write. The abort is advisory, a
        // validator stuck on the blocking pool cannot be interrupted.
        handle.revoke();
        task.abort();

        if let Err(e) = self.submissions.expire(submission_id).await {
            error!(submission_id, error = %e, "failed to record submission expiry");
            return;
        }
        warn!(
            submission_id,
            timeout_secs = self.timeout.as_secs(),
            "validation exceeded deadline, submission moved to VALIDATION_EXPIRED"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filing_core::{Result, Submission};
    use std::sync::Mutex;

    struct ExpiryLog {
        expired: Mutex<Vec<i64>>,
    }

    impl ExpiryLog {
        fn new() -> Self {
            Self {
                expired: Mutex::new(Vec::new()),
            }
        }

        fn expired_ids(&self) -> Vec<i64> {
            self.expired.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SubmissionStore for ExpiryLog {
        async fn create(
            &self,
            _filing_id: i64,
            _filename: &str,
            _submitter_id: i64,
        ) -> Result<Submission> {
            unimplemented!("not exercised by watchdog tests")
        }

        async fn update(&self, submission: &Submission) -> Result<Submission> {
            Ok(submission.clone())
        }

        async fn get(&self, _id: i64) -> Result<Option<Submission>> {
            Ok(None)
        }

        async fn get_latest(&self, _filing_id: i64) -> Result<Option<Submission>> {
            Ok(None)
        }

        async fn list(&self, _filing_id: i64) -> Result<Vec<Submission>> {
            Ok(Vec::new())
        }

        async fn expire(&self, id: i64) -> Result<()> {
            self.expired.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn finished_task_is_left_alone() {
        let store = Arc::new(ExpiryLog::new());
        let watchdog = ExpiryWatchdog::new(store.clone(), Duration::from_millis(20));

        let task = tokio::spawn(async {});
        let handle = ExecutionHandle::new();
        watchdog.watch(task, 7, handle.clone()).await;

        assert!(store.expired_ids().is_empty());
        assert!(handle.should_continue());
    }

    #[tokio::test]
    async fn overrunning_task_is_revoked_and_expired() {
        let store = Arc::new(ExpiryLog::new());
        let watchdog = ExpiryWatchdog::new(store.clone(), Duration::from_millis(20));

        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        let handle = ExecutionHandle::new();
        watchdog.watch(task, 7, handle.clone()).await;

        assert_eq!(store.expired_ids(), vec![7]);
        assert!(!handle.should_continue());
    }
}
