//! HTTP handlers, one module per resource.

pub mod filings;
pub mod health;
pub mod periods;
pub mod submissions;
