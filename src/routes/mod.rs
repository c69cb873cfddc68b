//! Route definitions for the loan submission API

use axum::{
    routing::{any, get, post},
    Router,
};

use crate::handlers::{health_check, invoke_submission, submit_loan_application};
use crate::middleware::request_tracing;
use crate::state::AppState;

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/", any(submit_loan_application))
        .route("/api/loan-applications", any(submit_loan_application))
        .route("/invoke", post(invoke_submission))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Full application router with middleware applied
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(submission_routes())
        .merge(health_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(request_tracing))
}
