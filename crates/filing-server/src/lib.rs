//! REST server for the filing backend.
//!
//! Wires the Postgres stores, the blob stores, and the validation pipeline
//! into an axum router. The binary lives in `main.rs`; integration tests
//! build the router directly with in-memory ports.

pub mod actions;
pub mod actor;
pub mod config;
pub mod error;
pub mod handlers;
pub mod institution;
pub mod router;
pub mod state;
