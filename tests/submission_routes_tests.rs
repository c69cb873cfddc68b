//! HTTP-level tests for the submission routes
//!
//! These run the full router against in-memory stores, so no database is
//! needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use loan_submit::application::{LoanApplication, NewLoanApplication};
use loan_submit::application_store::StoreError;
use loan_submit::routes::app;
use loan_submit::state::AppState;
use loan_submit::{ApplicationStore, InMemoryApplicationStore, SubmissionResponse};

/// Store whose database is never reachable
struct UnreachableStore;

#[async_trait]
impl ApplicationStore for UnreachableStore {
    async fn insert(&self, _application: &NewLoanApplication) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable(
            "connection to server at \"db\" (10.0.0.5), port 5432 failed".to_string(),
        ))
    }

    async fn fetch(&self, _id: i64) -> Result<Option<LoanApplication>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn router_with_memory() -> (Router, Arc<InMemoryApplicationStore>) {
    let store = Arc::new(InMemoryApplicationStore::new());
    (app(AppState::new(store.clone())), store)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header("x-session-id", "session-123")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn read_json(response: Response) -> Value {
    serde_json::from_str(&read_body(response).await).expect("JSON body")
}

const VALID_SUBMISSION: &str =
    r#"{"email":"a@b.com","amount":"1000","term_months":"12","monthly_payment":"100"}"#;

#[tokio::test]
async fn preflight_request_gets_cors_headers() {
    let (router, _) = router_with_memory();

    let response = router
        .oneshot(
            Request::options("/api/loan-applications")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, X-User-Id, X-Auth-Token, X-Session-Id"
    );
    assert_eq!(headers["access-control-max-age"], "86400");
    assert_eq!(read_body(response).await, "");
}

#[tokio::test]
async fn get_request_is_method_not_allowed() {
    let (router, _) = router_with_memory();

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(read_json(response).await, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn empty_post_body_is_invalid_json() {
    let (router, _) = router_with_memory();

    let response = router
        .oneshot(post_json("/api/loan-applications", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await, json!({"error": "Invalid JSON"}));
}

#[tokio::test]
async fn missing_term_is_reported() {
    let (router, store) = router_with_memory();

    let response = router
        .oneshot(post_json("/", r#"{"email":"a@b.com","amount":"1000"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({"error": "Missing required field: term_months"})
    );
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn valid_submission_creates_pending_application() {
    let (router, store) = router_with_memory();

    let response = router
        .oneshot(post_json("/api/loan-applications", VALID_SUBMISSION))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let payload = read_json(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["status"], "pending");

    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(payload["application_id"], rows[0].id);
    assert_eq!(rows[0].interest_rate, 12.5);
}

#[tokio::test]
async fn identical_submissions_create_distinct_rows() {
    let (router, store) = router_with_memory();

    let first = router
        .clone()
        .oneshot(post_json("/", VALID_SUBMISSION))
        .await
        .unwrap();
    let second = router
        .oneshot(post_json("/", VALID_SUBMISSION))
        .await
        .unwrap();

    let first_id = read_json(first).await["application_id"].as_i64().unwrap();
    let second_id = read_json(second).await["application_id"].as_i64().unwrap();

    assert_ne!(first_id, second_id);
    assert_eq!(store.rows().len(), 2);
}

#[tokio::test]
async fn unreachable_database_is_a_database_error() {
    let router = app(AppState::new(Arc::new(UnreachableStore)));

    let response = router
        .oneshot(post_json("/api/loan-applications", VALID_SUBMISSION))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await,
        json!({
            "error": "Database error: connection to server at \"db\" (10.0.0.5), port 5432 failed"
        })
    );
}

#[tokio::test]
async fn invoke_accepts_trigger_envelope() {
    let (router, store) = router_with_memory();
    let envelope = json!({
        "httpMethod": "POST",
        "headers": {"X-User-Id": "42", "X-Auth-Token": "token"},
        "body": VALID_SUBMISSION,
    });

    let response = router
        .oneshot(post_json("/invoke", &envelope.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record: SubmissionResponse =
        serde_json::from_str(&read_body(response).await).expect("response record");
    assert_eq!(record.status_code, 200);
    assert_eq!(record.header("Access-Control-Allow-Origin"), Some("*"));
    let body: Value = serde_json::from_str(&record.body).unwrap();
    assert_eq!(body["application_id"], store.rows()[0].id);
}

#[tokio::test]
async fn invoke_defaults_missing_method_to_get() {
    let (router, _) = router_with_memory();

    let response = router
        .oneshot(post_json("/invoke", r#"{"body":"{}"}"#))
        .await
        .unwrap();

    let record: SubmissionResponse =
        serde_json::from_str(&read_body(response).await).expect("response record");
    assert_eq!(record.status_code, 405);
}

#[tokio::test]
async fn invoke_preflight_returns_record_with_empty_body() {
    let (router, _) = router_with_memory();

    let response = router
        .oneshot(post_json("/invoke", r#"{"httpMethod":"OPTIONS","body":null}"#))
        .await
        .unwrap();

    let record: SubmissionResponse =
        serde_json::from_str(&read_body(response).await).expect("response record");
    assert_eq!(record.status_code, 200);
    assert_eq!(record.body, "");
    assert_eq!(record.headers.len(), 4);
}

#[tokio::test]
async fn health_reports_database_state() {
    let (router, _) = router_with_memory();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "healthy");
    assert_eq!(payload["database"], "connected");

    let router = app(AppState::new(Arc::new(UnreachableStore)));
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "unhealthy");
    assert_eq!(payload["database"], "error: connection refused");
}

fn post_bytes(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::post(uri).body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn non_utf8_body_is_invalid_json() {
    let (router, store) = router_with_memory();
    let mut body = br#"{"email":"a"#.to_vec();
    body.push(0xff);
    body.extend_from_slice(br#"@b.com","amount":"1000","term_months":"12","monthly_payment":"100"}"#);

    let response = router.oneshot(post_bytes("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(read_json(response).await, json!({"error": "Invalid JSON"}));
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn non_utf8_body_does_not_affect_preflight() {
    let (router, _) = router_with_memory();

    let response = router
        .oneshot(
            Request::options("/")
                .body(Body::from(vec![0xff, 0xfe]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_body(response).await, "");
}

#[tokio::test]
async fn invoke_malformed_envelope_returns_record() {
    let (router, store) = router_with_memory();
    let envelopes: [&[u8]; 3] = [
        br#"{"httpMethod":"POST","body":42}"#,
        br#"{"httpMethod":"POST","headers":{"X-User-Id":7},"body":"{}"}"#,
        b"not an envelope",
    ];

    for envelope in envelopes {
        // No content-type on purpose; the envelope is read as raw bytes
        let response = router
            .clone()
            .oneshot(post_bytes("/invoke", envelope.to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let record: SubmissionResponse =
            serde_json::from_str(&read_body(response).await).expect("response record");
        assert_eq!(record.status_code, 400);
        assert_eq!(record.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(record.body, r#"{"error":"Invalid JSON"}"#);
    }
    assert!(store.rows().is_empty());
}
