// crates/aiops-gateway/src/state.rs
// ============================================================================
// Module: Gateway Application State
// Description: Shared handles every axum route reaches into.
// Purpose: One `Arc<AppState>` built at startup and cloned per request via
//          axum's `State` extractor.
// Dependencies: aiops-broker, aiops-config, aiops-core, aiops-orchestrator
// ============================================================================

use std::sync::Arc;

use aiops_broker::WorkflowDispatcher;
use aiops_config::GatewayConfig;
use aiops_core::interfaces::KeyValueStore;
use aiops_orchestrator::WorkflowDeps;
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state handed to every route handler.
pub struct AppState {
    /// Every backend a workflow run touches, reused here for direct
    /// incident/evidence/graph reads.
    pub deps: Arc<WorkflowDeps>,
    /// Fingerprint dedup cache and rate-limit counters.
    pub kv: Arc<dyn KeyValueStore>,
    /// Submits freshly persisted incidents to the workflow orchestrator.
    pub dispatcher: Arc<dyn WorkflowDispatcher>,
    /// Alert Gateway behavior knobs (dedup TTL, rate limit, default
    /// cluster).
    pub gateway: GatewayConfig,
    /// Prometheus metrics recorder handle, rendered by `/metrics`.
    pub prometheus: PrometheusHandle,
}
