//! Loan application submission
//!
//! [`SubmissionHandler`] turns a trigger request record into a response
//! record. It never fails outward: CORS preflight, method checks, JSON parsing,
//! field validation, coercion and the insert itself all end in a
//! [`SubmissionResponse`].

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::{first_missing_field, ApplicationStatus, NewLoanApplication, REQUIRED_FIELDS};
use crate::application_store::ApplicationStore;
use crate::error::{SubmissionError, SubmissionResult};

/// Method browsers use to negotiate cross-origin access
pub const PREFLIGHT_METHOD: &str = "OPTIONS";

/// The only method that creates an application
pub const ACCEPTED_METHOD: &str = "POST";

/// Confirmation shown to the applicant after a successful submission
pub const SUBMISSION_CONFIRMATION: &str = "Заявка успешно отправлена на рассмотрение";

const ALLOW_ORIGIN: (&str, &str) = ("Access-Control-Allow-Origin", "*");
const PREFLIGHT_HEADERS: [(&str, &str); 4] = [
    ALLOW_ORIGIN,
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, X-User-Id, X-Auth-Token, X-Session-Id",
    ),
    ("Access-Control-Max-Age", "86400"),
];

/// Request record handed over by the trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default = "default_method")]
    pub http_method: String,

    /// Forwarded as-is; session and auth headers are not inspected
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// JSON-encoded payload; absent or `null` reads as `{}`
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl SubmissionRequest {
    pub fn new(http_method: impl Into<String>, body: Option<String>) -> Self {
        Self {
            http_method: http_method.into(),
            headers: BTreeMap::new(),
            body,
        }
    }
}

/// Response record returned to the trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Body of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    pub application_id: i64,
    pub status: ApplicationStatus,
    pub message: String,
}

impl SubmissionResponse {
    fn with_headers(status: StatusCode, headers: &[(&str, &str)], body: String) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body,
        }
    }

    pub fn preflight() -> Self {
        Self::with_headers(StatusCode::OK, &PREFLIGHT_HEADERS, String::new())
    }

    pub fn accepted(receipt: &SubmissionReceipt) -> Self {
        match serde_json::to_string(receipt) {
            Ok(body) => Self::with_headers(
                StatusCode::OK,
                &[("Content-Type", "application/json"), ALLOW_ORIGIN],
                body,
            ),
            Err(e) => Self::from_error(&SubmissionError::Persistence(e.to_string())),
        }
    }

    pub fn from_error(err: &SubmissionError) -> Self {
        Self::with_headers(err.status_code(), &[ALLOW_ORIGIN], err.to_body())
    }

    /// Look up a header case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl IntoResponse for SubmissionResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let has_body = !self.body.is_empty();
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();

        // Every non-empty body is JSON, even when the record omits the header
        if has_body {
            headers.insert(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        } else {
            headers.remove(axum::http::header::CONTENT_TYPE);
        }

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping unrepresentable response header"),
            }
        }

        response
    }
}

/// Validates submissions and persists them as `pending` applications
#[derive(Clone)]
pub struct SubmissionHandler {
    store: Arc<dyn ApplicationStore>,
}

impl SubmissionHandler {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ApplicationStore> {
        &self.store
    }

    /// Handle one request record. Never panics, never returns an error.
    pub async fn handle(&self, request: &SubmissionRequest) -> SubmissionResponse {
        match request.http_method.as_str() {
            PREFLIGHT_METHOD => return SubmissionResponse::preflight(),
            ACCEPTED_METHOD => {}
            other => {
                tracing::warn!(method = %other, "Rejected submission with unsupported method");
                return SubmissionResponse::from_error(&SubmissionError::MethodNotAllowed);
            }
        }

        match self.submit(request.body.as_deref()).await {
            Ok(receipt) => SubmissionResponse::accepted(&receipt),
            Err(err) => SubmissionResponse::from_error(&err),
        }
    }

    async fn submit(&self, body: Option<&str>) -> SubmissionResult<SubmissionReceipt> {
        let payload: Value = serde_json::from_str(body.unwrap_or("{}"))?;

        if let Some(field) = first_missing_field(&payload) {
            return Err(SubmissionError::MissingField(field));
        }
        let Some(fields) = payload.as_object() else {
            return Err(SubmissionError::MissingField(REQUIRED_FIELDS[0]));
        };

        let application = NewLoanApplication::from_payload(fields)?;
        let application_id = self.store.insert(&application).await?;

        tracing::info!(
            application_id,
            amount = application.amount,
            term_months = application.term_months,
            "Loan application submitted"
        );

        Ok(SubmissionReceipt {
            success: true,
            application_id,
            status: ApplicationStatus::Pending,
            message: SUBMISSION_CONFIRMATION.to_string(),
        })
    }
}
