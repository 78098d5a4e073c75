// crates/aiops-collectors/src/lib.rs
// ============================================================================
// Module: AIOps Evidence Collectors
// Description: Public API for the four evidence collectors and their HTTP
//              clients.
// Purpose: Give the orchestrator ready-to-run `Collector` implementations
//          over the cluster API, log store, metrics store, and the cluster
//          API's own change-history views.
// Dependencies: aiops-core, reqwest, regex
// ============================================================================

//! ## Overview
//! Each collector queries its own upstream source, reduces the response
//! into evidence with a deterministic `signal_strength`, and contributes
//! graph nodes/relations describing what it found. None of the four ever
//! fail the whole collection pass on a single upstream error: partial
//! results and an `errors` entry are always preferred over an empty pass.

mod change_history;
mod cluster_client;
mod cluster_state;
mod log_client;
mod logs;
mod metrics;
mod metrics_client;

pub use change_history::ChangeHistoryCollector;
pub use cluster_client::ClusterApiClient;
pub use cluster_client::ClusterApiError;
pub use cluster_client::ConfigMapInfo;
pub use cluster_client::DeploymentInfo;
pub use cluster_client::EventInfo;
pub use cluster_client::HpaInfo;
pub use cluster_client::NodeInfo;
pub use cluster_client::PodInfo;
pub use cluster_client::ReplicaSetInfo;
pub use cluster_state::ClusterStateCollector;
pub use log_client::LogLine;
pub use log_client::LogStoreClient;
pub use log_client::LogStoreError;
pub use logs::LogsCollector;
pub use metrics::MetricsCollector;
pub use metrics_client::MetricSeries;
pub use metrics_client::MetricsStoreClient;
pub use metrics_client::MetricsStoreError;
