//! PostgreSQL adapter for the filing backend.
//!
//! Implements the `filing-core` port traits over sqlx. Schema migrations
//! are embedded; run [`MIGRATOR`] against the pool at startup.

pub mod rows;
pub mod store;

pub use store::{PgFilingPeriodStore, PgFilingStore, PgStores, PgSubmissionStore, PgUserActionStore};

/// Embedded schema migrations from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
