// crates/aiops-gateway/src/startup.rs
// ============================================================================
// Module: Gateway Startup
// Description: Wires every backend from an already-loaded `AiopsConfig` and
//              serves the HTTP API until the process is signaled to stop.
// Purpose: Shared by the `aiops-gateway` binary and `aiops-cli serve`, so
//          there is exactly one place that assembles `AppState`.
// Dependencies: aiops-config, aiops-core, aiops-graph, aiops-orchestrator,
//               aiops-remediation, aiops-store-sqlite, axum, tokio
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aiops_config::AiopsConfig;
use aiops_config::GraphBackend;
use aiops_core::ChatSink;
use aiops_core::GraphStore;
use aiops_core::KeyValueStore;
use aiops_graph::InMemoryGraphStore;
use aiops_graph::Neo4jGraphStore;
use aiops_orchestrator::InProcessDispatcher;
use aiops_orchestrator::WorkflowDeps;
use aiops_remediation::HttpChatSink;
use aiops_store_sqlite::SqliteKeyValueStore;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::build_router;
use crate::state::AppState;

/// Failures constructing the gateway's backends or serving its HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("graph store error: {0}")]
    Graph(#[from] aiops_core::GraphStoreError),
    #[error("chat sink error: {0}")]
    ChatSink(#[from] aiops_core::ChatSinkError),
    #[error("workflow deps error: {0}")]
    Deps(#[from] aiops_orchestrator::DepsError),
    #[error("metrics recorder error: {0}")]
    Metrics(String),
    #[error("server bind address is invalid: {0}")]
    Bind(String),
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Builds every backend from `config` and returns the shared [`AppState`]
/// plus whether `/metrics` should be mounted, without binding a socket.
///
/// Used by both [`run`] and `aiops-cli`'s offline commands, which need the
/// same wiring but not the serve loop.
pub async fn build_state(config: AiopsConfig) -> Result<(Arc<AppState>, bool), GatewayError> {
    let graph: Arc<dyn GraphStore> = match config.graph.backend {
        GraphBackend::Neo4j => {
            let password = config.graph.read_password().map_err(|err| GatewayError::Bind(err.to_string()))?;
            Arc::new(Neo4jGraphStore::connect(&config.graph.uri, &config.graph.user, &password).await?)
        }
        GraphBackend::InMemory => Arc::new(InMemoryGraphStore::new()),
    };
    graph.ensure_constraints().await?;

    let chat_sink: Option<Arc<dyn ChatSink>> = if config.approval.chat_base_url.trim().is_empty() {
        None
    } else {
        Some(Arc::new(HttpChatSink::new(
            config.approval.chat_base_url.clone(),
            Duration::from_millis(config.orchestrator.activity_timeout_ms),
        )?))
    };

    let metrics_enabled = config.server.metrics_enabled;
    let gateway_config = config.gateway.clone();

    let deps = Arc::new(WorkflowDeps::new(config, graph, chat_sink)?);
    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(deps.store.clone()));
    let dispatcher = Arc::new(InProcessDispatcher::new(Arc::clone(&deps)));

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| GatewayError::Metrics(err.to_string()))?;

    let state = Arc::new(AppState { deps, kv, dispatcher, gateway: gateway_config, prometheus });
    Ok((state, metrics_enabled))
}

/// Builds every backend from `config` and serves the HTTP API until the
/// listener errors or the process is killed.
pub async fn run(config: AiopsConfig) -> Result<(), GatewayError> {
    let bind = config.server.bind.clone();
    let bind_addr: SocketAddr = bind.parse().map_err(|_| GatewayError::Bind(bind.clone()))?;

    let (state, metrics_enabled) = build_state(config).await?;
    let app = build_router(state, metrics_enabled);

    info!(%bind_addr, "aiops-gateway listening");
    let listener = tokio::net::TcpListener::bind(bind_addr).await.map_err(GatewayError::Serve)?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(GatewayError::Serve)?;
    Ok(())
}
