//! Domain model for the small-business-lending filing backend.
//!
//! Entities, the submission state machine, the shared error type, and the
//! port traits the adapters implement. This crate knows nothing about HTTP,
//! Postgres, or the filesystem; those live in `filing-server`,
//! `filing-postgres`, and `filing-engine`.

pub mod error;
pub mod model;
pub mod ports;
pub mod state;

pub use error::{FilingError, Result};
pub use model::{
    Actor, ContactInfo, Filing, FilingPeriod, FilingType, Submission, UserAction, UserActionType,
    ValidationSummary,
};
pub use ports::{
    FilingPeriodStore, FilingStore, Institution, InstitutionRegistry, SubmissionStore,
    UserActionStore,
};
pub use state::SubmissionState;
