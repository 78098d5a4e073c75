// crates/aiops-gateway/src/routes/health.rs
// ============================================================================
// Module: Health Routes
// Description: Liveness and readiness probes (`spec.md` §6).
// Purpose: Let orchestrators distinguish "process is up" from "dependency
//          graph store is reachable".
// Dependencies: aiops-core
// ============================================================================

use std::sync::Arc;

use aiops_core::GraphHealth;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe: always `200` once the process can route requests.
pub async fn liveness() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub graph: &'static str,
}

/// Readiness probe: `503` when the graph store is unreachable.
pub async fn readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.deps.graph.health().await;
    let (code, graph_status) = match health {
        GraphHealth::Healthy => (StatusCode::OK, "healthy"),
        GraphHealth::Degraded => (StatusCode::OK, "degraded"),
        GraphHealth::Unreachable => (StatusCode::SERVICE_UNAVAILABLE, "unreachable"),
    };
    (code, Json(ReadinessResponse { status: if code == StatusCode::OK { "ready" } else { "not_ready" }, graph: graph_status }))
}
