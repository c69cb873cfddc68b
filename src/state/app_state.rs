//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::application_store::ApplicationStore;
use crate::submission::SubmissionHandler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub submission_handler: Arc<SubmissionHandler>,
}

impl AppState {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self {
            submission_handler: Arc::new(SubmissionHandler::new(store)),
        }
    }
}

impl FromRef<AppState> for Arc<SubmissionHandler> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.submission_handler.clone()
    }
}
