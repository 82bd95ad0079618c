use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, create_loan, list_loans, return_loan};

/// Creates the API router with all loan endpoints
///
/// - POST /loans - Create a loan for the requesting user
/// - GET /loans - List the requesting user's loans
/// - POST /loans/:id/return - Return a loan (borrower only)
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/loans", post(create_loan).get(list_loans))
        .route("/loans/:id/return", post(return_loan))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
