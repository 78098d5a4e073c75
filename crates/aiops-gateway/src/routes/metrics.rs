// crates/aiops-gateway/src/routes/metrics.rs
// ============================================================================
// Module: Metrics Route
// Description: Prometheus text-exposition endpoint.
// Purpose: Render whatever counters/histograms the `metrics` facade has
//          recorded since startup.
// Dependencies: metrics-exporter-prometheus
// ============================================================================

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;

use crate::state::AppState;

pub async fn render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus.render()
}
