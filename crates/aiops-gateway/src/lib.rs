// crates/aiops-gateway/src/lib.rs
// ============================================================================
// Module: AIOps Gateway Library
// Description: Router assembly and shared state for the HTTP ingress.
// Purpose: Let both `main.rs` and `aiops-cli`'s `serve` subcommand build the
//          same axum app from an already-assembled `AppState`.
// Dependencies: axum, tower-http
// ============================================================================

//! ## Overview
//! `aiops-gateway` frames `aiops-broker`'s ingest pipeline and
//! `aiops-orchestrator`'s workflow deps over HTTP (`spec.md` §6):
//! alert webhooks, incident query endpoints, health probes, and metrics.

pub mod error;
pub mod routes;
pub mod startup;
pub mod state;

use std::sync::Arc;

use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use startup::build_state;
pub use startup::run;
pub use startup::GatewayError;
pub use state::AppState;

/// Builds the gateway's full route table over a shared [`AppState`].
///
/// `metrics_enabled` gates whether `/metrics` is mounted, per
/// `ServerConfig::metrics_enabled`.
#[must_use]
pub fn build_router(state: Arc<AppState>, metrics_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/api/v1/webhooks/alertmanager", post(routes::webhooks::alertmanager_webhook))
        .route("/api/v1/webhooks/grafana", post(routes::webhooks::grafana_webhook))
        .route("/api/v1/incidents", post(routes::incidents::create_incident).get(routes::incidents::list_incidents))
        .route("/api/v1/incidents/:id", get(routes::incidents::get_incident))
        .route("/api/v1/incidents/:id/graph", get(routes::incidents::get_incident_graph))
        .route("/api/v1/incidents/:id/hypotheses", get(routes::incidents::get_incident_hypotheses))
        .route("/health", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness));
    if metrics_enabled {
        router = router.route("/metrics", get(routes::metrics::render));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}
