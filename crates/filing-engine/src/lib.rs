//! Validation pipeline for uploaded submissions.
//!
//! The orchestrator drives one submission through parse, multi-phase rule
//! validation, report generation, and its final state, with the heavy work
//! on the blocking pool. A check-once watchdog expires runs that outlive
//! the configured timeout; the shared execution handle lets a revoked run
//! discard its late result instead of overwriting the expiry.

pub mod blob_store;
pub mod dispatch;
pub mod handle;
pub mod orchestrator;
pub mod report;
pub mod rules;
pub mod table;
pub mod watchdog;

pub use blob_store::{
    report_key, upload_key, BlobStore, BlobStoreError, LocalBlobStore, REPORT_QUALIFIER,
};
pub use dispatch::spawn_validation;
pub use handle::ExecutionHandle;
pub use orchestrator::{ValidationOrchestrator, REPORT_CONTENT_TYPE, REPORT_EXTENSION};
pub use rules::{
    classify, summarize, Finding, RegisterRuleValidator, RuleError, RuleValidator, Severity,
    ValidationContext, ValidationOutcome, ValidationPhase,
};
pub use table::{DataTable, TableError};
pub use watchdog::ExpiryWatchdog;
