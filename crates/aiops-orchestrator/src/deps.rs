// crates/aiops-orchestrator/src/deps.rs
// ============================================================================
// Module: Workflow Dependencies
// Description: Bundles every concrete backend the 12-step workflow talks
//              to, built once at process startup from `AiopsConfig`.
// Purpose: Give `workflow::run_workflow` a single, already-wired handle
//          instead of threading a dozen constructor arguments through it.
// Dependencies: every other workspace crate
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use aiops_collectors::ChangeHistoryCollector;
use aiops_collectors::ClusterApiClient;
use aiops_collectors::ClusterApiError;
use aiops_collectors::ClusterStateCollector;
use aiops_collectors::LogStoreClient;
use aiops_collectors::LogStoreError;
use aiops_collectors::LogsCollector;
use aiops_collectors::MetricsCollector;
use aiops_collectors::MetricsStoreClient;
use aiops_collectors::MetricsStoreError;
use aiops_config::AiopsConfig;
use aiops_core::ActionHandler;
use aiops_core::ActionType;
use aiops_core::ChatSink;
use aiops_core::Collector;
use aiops_core::GraphStore;
use aiops_core::PolicyClient;
use aiops_core::PolicyError;
use aiops_core::TicketSink;
use aiops_core::TicketSinkError;
use aiops_remediation::HttpPolicyClient;
use aiops_remediation::HttpTicketSink;
use aiops_store_sqlite::SqliteIncidentStore;
use aiops_store_sqlite::SqliteStoreConfig;
use aiops_store_sqlite::SqliteStoreError;
use aiops_store_sqlite::SqliteSyncMode;

use crate::progress::ProgressTable;

/// Failures building the workflow's concrete backends from configuration.
#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    /// The `SQLite` store could not be opened.
    #[error("incident store: {0}")]
    Store(#[from] SqliteStoreError),
    /// The cluster API client could not be built.
    #[error("cluster API client: {0}")]
    ClusterApi(#[from] ClusterApiError),
    /// The log store client could not be built.
    #[error("log store client: {0}")]
    LogStore(#[from] LogStoreError),
    /// The metrics store client could not be built.
    #[error("metrics store client: {0}")]
    MetricsStore(#[from] MetricsStoreError),
    /// The policy client could not be built.
    #[error("policy client: {0}")]
    Policy(#[from] PolicyError),
    /// The ticket sink client could not be built.
    #[error("ticket sink client: {0}")]
    Ticket(#[from] TicketSinkError),
}

/// Every backend and bit of shared state one incident workflow run needs.
///
/// Built once at process startup and shared behind an `Arc` across every
/// concurrently running workflow; cheap to clone the `Arc`, not the
/// contents.
pub struct WorkflowDeps {
    /// Incident/evidence/hypothesis/action/runbook persistence.
    pub store: SqliteIncidentStore,
    /// Dependency graph store (Neo4j-backed or in-memory).
    pub graph: Arc<dyn GraphStore>,
    /// The four evidence collectors, run concurrently per incident.
    pub collectors: Vec<Arc<dyn Collector>>,
    /// Shared cluster API client, reused for blast-radius queries and
    /// remediation execution.
    pub cluster_client: ClusterApiClient,
    /// Shared metrics store client, reused by the verifier's probes.
    pub metrics_client: MetricsStoreClient,
    /// External blast-radius policy decision client.
    pub policy_client: Arc<dyn PolicyClient>,
    /// Chat sink for approval requests; `None` resolves every approval to
    /// "not configured".
    pub chat_sink: Option<Arc<dyn ChatSink>>,
    /// Issue tracker sink for unresolved incidents; `None` skips ticket
    /// filing.
    pub ticket_sink: Option<Arc<dyn TicketSink>>,
    /// The five remediation action handlers, keyed by action type.
    pub action_handlers: BTreeMap<ActionType, Box<dyn ActionHandler>>,
    /// Live per-incident workflow status, polled by the gateway.
    pub progress: ProgressTable,
    /// Full control plane configuration, kept around for the knobs that
    /// vary per step (retry/timeout, approval wait, verification wait,
    /// dashboard base URL).
    pub config: AiopsConfig,
}

impl WorkflowDeps {
    /// Builds every concrete backend from `config`, using the given
    /// already-constructed graph store and optional chat sink (both vary
    /// by deployment: Neo4j vs. in-memory, and whether a chat backend is
    /// wired up at all).
    ///
    /// # Errors
    ///
    /// Returns [`DepsError`] when any backend client fails to construct or
    /// the `SQLite` store cannot be opened.
    pub fn new(
        config: AiopsConfig,
        graph: Arc<dyn GraphStore>,
        chat_sink: Option<Arc<dyn ChatSink>>,
    ) -> Result<Self, DepsError> {
        let store = SqliteIncidentStore::open(&sqlite_store_config(&config.store))?;

        let cluster_client = ClusterApiClient::new(
            config.collectors.cluster_api.base_url.clone(),
            Duration::from_millis(config.collectors.cluster_api.request_timeout_ms),
        )?;
        let log_client = LogStoreClient::new(
            config.collectors.log_store.base_url.clone(),
            Duration::from_millis(config.collectors.log_store.request_timeout_ms),
        )?;
        let metrics_client = MetricsStoreClient::new(
            config.collectors.metrics_store.base_url.clone(),
            Duration::from_millis(config.collectors.metrics_store.request_timeout_ms),
        )?;
        let change_history_client = ClusterApiClient::new(
            config.collectors.change_history.base_url.clone(),
            Duration::from_millis(config.collectors.change_history.request_timeout_ms),
        )?;

        let collectors: Vec<Arc<dyn Collector>> = vec![
            Arc::new(ClusterStateCollector::new(cluster_client.clone())),
            Arc::new(LogsCollector::new(log_client)),
            Arc::new(MetricsCollector::new(metrics_client.clone())),
            Arc::new(ChangeHistoryCollector::new(change_history_client)),
        ];

        let policy_client: Arc<dyn PolicyClient> = Arc::new(HttpPolicyClient::new(
            config.policy.base_url.clone(),
            Duration::from_millis(config.policy.request_timeout_ms),
        )?);

        let ticket_sink: Option<Arc<dyn TicketSink>> = if config.ticket.base_url.trim().is_empty() {
            None
        } else {
            Some(Arc::new(HttpTicketSink::new(
                config.ticket.base_url.clone(),
                Duration::from_millis(config.ticket.request_timeout_ms),
            )?))
        };

        let action_handlers = aiops_remediation::build_registry(cluster_client.clone());

        Ok(Self {
            store,
            graph,
            collectors,
            cluster_client,
            metrics_client,
            policy_client,
            chat_sink,
            ticket_sink,
            action_handlers,
            progress: ProgressTable::new(),
            config,
        })
    }
}

/// Adapts `aiops-config`'s `StoreConfig` to `aiops-store-sqlite`'s own
/// configuration shape; the two crates intentionally don't share a type so
/// the store crate stays usable without pulling in `aiops-config`.
fn sqlite_store_config(store: &aiops_config::StoreConfig) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: store.path.clone(),
        busy_timeout_ms: store.busy_timeout_ms,
        journal_mode: aiops_store_sqlite::SqliteStoreMode::default(),
        sync_mode: match store.sync_mode {
            aiops_config::StoreSyncMode::Full => SqliteSyncMode::Full,
            aiops_config::StoreSyncMode::Normal => SqliteSyncMode::Normal,
        },
    }
}
