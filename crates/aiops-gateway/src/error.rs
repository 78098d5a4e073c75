// crates/aiops-gateway/src/error.rs
// ============================================================================
// Module: Gateway API Errors
// Description: Single error type every route handler returns, mapped to an
//              HTTP status and a JSON body.
// Purpose: Keep route handlers free of manual status-code plumbing.
// Dependencies: axum, aiops-store-sqlite, aiops-core
// ============================================================================

use aiops_core::GraphStoreError;
use aiops_store_sqlite::SqliteStoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("incident store error: {0}")]
    Store(#[from] SqliteStoreError),
    #[error("graph store error: {0}")]
    Graph(#[from] GraphStoreError),
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Store(_) | ApiError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
