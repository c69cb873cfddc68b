//! Submission handlers
//!
//! Two ways in: plain HTTP, translated into a request record, and the
//! trigger envelope, where the record itself arrives as JSON.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    Json,
};

use crate::error::SubmissionError;
use crate::submission::{
    SubmissionHandler, SubmissionRequest, SubmissionResponse, ACCEPTED_METHOD,
};

/// ANY /api/loan-applications
pub async fn submit_loan_application(
    State(handler): State<Arc<SubmissionHandler>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> SubmissionResponse {
    let body = match String::from_utf8(body.to_vec()) {
        Ok(body) => body,
        // Only a submission reads its body; other methods never get that far
        Err(_) if method.as_str() == ACCEPTED_METHOD => {
            return SubmissionResponse::from_error(&SubmissionError::MalformedInput);
        }
        Err(_) => String::new(),
    };

    let request = SubmissionRequest {
        http_method: method.as_str().to_string(),
        headers: header_record(&headers),
        body: Some(body),
    };

    handler.handle(&request).await
}

/// POST /invoke - trigger envelope in, response record out
///
/// An envelope that does not deserialize still gets a response record.
pub async fn invoke_submission(
    State(handler): State<Arc<SubmissionHandler>>,
    body: Bytes,
) -> Json<SubmissionResponse> {
    match serde_json::from_slice::<SubmissionRequest>(&body) {
        Ok(request) => Json(handler.handle(&request).await),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected malformed trigger envelope");
            Json(SubmissionResponse::from_error(
                &SubmissionError::MalformedInput,
            ))
        }
    }
}

fn header_record(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}
