// crates/aiops-config/src/lib.rs
// ============================================================================
// Module: AIOps Config Library
// Description: Public API surface for control plane configuration.
// Purpose: Expose the config types and loader used by every binary in the
//          workspace.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Every service binary in the workspace (`aiops-gateway`, `aiops-cli`)
//! loads one [`AiopsConfig`] at startup via [`AiopsConfig::load`] and wires
//! its sections into the corresponding crate's constructors.

mod config;

pub use config::AiopsConfig;
pub use config::ApprovalConfig;
pub use config::CollectorEndpointConfig;
pub use config::CollectorsConfig;
pub use config::ConfigError;
pub use config::GatewayConfig;
pub use config::GraphBackend;
pub use config::GraphConfig;
pub use config::LoggingConfig;
pub use config::OrchestratorConfig;
pub use config::PolicyConfig;
pub use config::RemediationConfig;
pub use config::ServerConfig;
pub use config::StoreConfig;
pub use config::StoreSyncMode;
pub use config::TicketConfig;
pub use config::CONFIG_ENV_VAR;
