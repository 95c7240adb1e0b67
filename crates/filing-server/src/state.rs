//! Shared handler state, injected as an axum `Extension`.

use std::sync::Arc;

use filing_core::{
    FilingPeriodStore, FilingStore, InstitutionRegistry, SubmissionStore, UserActionStore,
};
use filing_engine::{BlobStore, ExpiryWatchdog, ValidationOrchestrator};

use crate::actions::ActionRegistry;
use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub periods: Arc<dyn FilingPeriodStore>,
    pub filings: Arc<dyn FilingStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub user_actions: Arc<dyn UserActionStore>,
    pub institutions: Arc<dyn InstitutionRegistry>,
    /// Raw upload bytes, keyed by `{period}/{lei}/{id}.{ext}`.
    pub uploads: Arc<dyn BlobStore>,
    /// Validation reports, written by the orchestrator.
    pub reports: Arc<dyn BlobStore>,
    pub orchestrator: Arc<ValidationOrchestrator>,
    pub watchdog: Arc<ExpiryWatchdog>,
    pub actions: Arc<ActionRegistry>,
}
