//! Loan application submission service
//!
//! Accepts loan applications over HTTP, validates the required fields and
//! stores each one as a `pending` row in PostgreSQL.

pub mod application;
pub mod application_store;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod submission;

pub use application_store::{ApplicationStore, InMemoryApplicationStore, PgApplicationStore};
pub use submission::{SubmissionHandler, SubmissionRequest, SubmissionResponse};
