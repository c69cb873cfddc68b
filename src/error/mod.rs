//! Submission error handling
//!
//! Every failure of a submission ends up as one of the variants below. Each
//! variant maps to a fixed HTTP status and renders as a JSON body of the form
//! `{"error": "<message>"}`.

use axum::http::StatusCode;
use thiserror::Error;

use crate::application::CoercionError;
use crate::application_store::StoreError;

/// Submission error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    MalformedInput,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Write failures, including payload values that cannot be coerced
    #[error("Database error: {0}")]
    Persistence(String),
}

impl SubmissionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SubmissionError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            SubmissionError::MalformedInput => "MALFORMED_INPUT",
            SubmissionError::MissingField(_) => "MISSING_FIELD",
            SubmissionError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubmissionError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SubmissionError::MalformedInput => StatusCode::BAD_REQUEST,
            SubmissionError::MissingField(_) => StatusCode::BAD_REQUEST,
            SubmissionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Serialized `{"error": ...}` body, logging server-side failures.
    pub fn to_body(&self) -> String {
        let message = self.to_string();
        let code = self.error_code();

        match self {
            SubmissionError::Persistence(_) => {
                tracing::error!(error = %message, code = %code, "Submission failed");
            }
            _ => {
                tracing::debug!(error = %message, code = %code, "Submission rejected");
            }
        }

        serde_json::json!({ "error": message }).to_string()
    }
}

impl From<CoercionError> for SubmissionError {
    fn from(err: CoercionError) -> Self {
        SubmissionError::Persistence(err.to_string())
    }
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        SubmissionError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SubmissionError {
    fn from(_: serde_json::Error) -> Self {
        SubmissionError::MalformedInput
    }
}

/// Result type alias using SubmissionError
pub type SubmissionResult<T> = Result<T, SubmissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SubmissionError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            SubmissionError::MalformedInput.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SubmissionError::MissingField("email").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SubmissionError::Persistence("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(
            SubmissionError::MalformedInput.to_body(),
            r#"{"error":"Invalid JSON"}"#
        );
        assert_eq!(
            SubmissionError::MissingField("term_months").to_body(),
            r#"{"error":"Missing required field: term_months"}"#
        );
    }

    #[test]
    fn test_coercion_failure_is_a_persistence_failure() {
        let err: SubmissionError = CoercionError::NotAnInteger {
            field: "amount",
            value: "\"abc\"".to_string(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Database error: invalid integer value for amount: \"abc\""
        );
    }
}
