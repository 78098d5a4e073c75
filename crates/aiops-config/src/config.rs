// crates/aiops-config/src/config.rs
// ============================================================================
// Module: Control Plane Configuration
// Description: Configuration loading and validation for every service in the
//              incident remediation control plane.
// Purpose: Provide strict, fail-closed config parsing with sane defaults.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a size limit, and every
//! section has defaults so a minimal or empty file still produces a usable
//! configuration. Values that gate risky behavior (dev auto-approve, policy
//! fail-open) default to the safe choice and must be explicitly opted into.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "aiops.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "AIOPS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length accepted for any configured path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum allowed HTTP client timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 50;
/// Maximum allowed HTTP client timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Top-Level Configuration
// ============================================================================

/// Root configuration for the incident remediation control plane.
#[derive(Debug, Clone, Deserialize)]
pub struct AiopsConfig {
    /// HTTP server configuration for the Alert Gateway.
    #[serde(default)]
    pub server: ServerConfig,
    /// Alert Gateway behavior (dedup, rate limiting).
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Evidence collector upstream endpoints.
    #[serde(default)]
    pub collectors: CollectorsConfig,
    /// Graph store (Neo4j) connection settings.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Incident/evidence/runbook store (SQLite) settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Blast-radius policy gate client settings.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Incident Closer ticket-sink client settings.
    #[serde(default)]
    pub ticket: TicketConfig,
    /// Approval Coordinator settings.
    #[serde(default)]
    pub approval: ApprovalConfig,
    /// Orchestrator retry/timeout settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Remediation executor and verifier settings.
    #[serde(default)]
    pub remediation: RemediationConfig,
    /// Structured logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AiopsConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path`, else `AIOPS_CONFIG`, else `./aiops.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, exceeds the
    /// size limit, fails to parse, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.gateway.validate()?;
        self.collectors.validate()?;
        self.graph.validate()?;
        self.store.validate()?;
        self.policy.validate()?;
        self.ticket.validate()?;
        self.approval.validate()?;
        self.orchestrator.validate()?;
        self.remediation.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server Configuration
// ============================================================================

/// HTTP server configuration for the Alert Gateway's axum listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the gateway HTTP API.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Enable the Prometheus `/metrics` endpoint.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let _: SocketAddr = self
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind must be a valid socket address".to_string()))?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Alert Gateway Configuration
// ============================================================================

/// Alert Gateway dedup and rate-limiting behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// How long a fingerprint is remembered for deduplication, in seconds.
    #[serde(default = "default_dedup_ttl_seconds")]
    pub dedup_ttl_seconds: u64,
    /// Maximum alerts accepted per source within `rate_limit_window_seconds`.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,
    /// Rate-limit sliding window, in seconds.
    #[serde(default = "default_rate_limit_window_seconds")]
    pub rate_limit_window_seconds: u64,
    /// Cluster name stamped onto incidents when an inbound alert carries no
    /// `cluster` label of its own.
    #[serde(default = "default_cluster_name")]
    pub cluster: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            dedup_ttl_seconds: default_dedup_ttl_seconds(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_seconds: default_rate_limit_window_seconds(),
            cluster: default_cluster_name(),
        }
    }
}

impl GatewayConfig {
    /// Validates gateway configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dedup_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "gateway.dedup_ttl_seconds must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit_max_requests == 0 {
            return Err(ConfigError::Invalid(
                "gateway.rate_limit_max_requests must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit_window_seconds == 0 {
            return Err(ConfigError::Invalid(
                "gateway.rate_limit_window_seconds must be greater than zero".to_string(),
            ));
        }
        if self.cluster.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.cluster must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Evidence Collector Configuration
// ============================================================================

/// Connection settings for a single upstream HTTP-speaking collector
/// source.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorEndpointConfig {
    /// Base URL for the upstream API.
    pub base_url: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl CollectorEndpointConfig {
    /// Validates a collector endpoint configuration.
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{field}.base_url must be non-empty")));
        }
        validate_timeout_range(&format!("{field}.connect_timeout_ms"), self.connect_timeout_ms)?;
        validate_timeout_range(&format!("{field}.request_timeout_ms"), self.request_timeout_ms)?;
        Ok(())
    }
}

/// Upstream endpoints for the four evidence collectors.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorsConfig {
    /// Kubernetes cluster API endpoint, used by the cluster-state collector.
    pub cluster_api: CollectorEndpointConfig,
    /// Log store endpoint, used by the logs collector.
    pub log_store: CollectorEndpointConfig,
    /// Metrics store endpoint, used by the metrics and verifier collectors.
    pub metrics_store: CollectorEndpointConfig,
    /// Change history endpoint, used by the change-history collector.
    pub change_history: CollectorEndpointConfig,
    /// Overall deadline for a single collection fan-out, in milliseconds.
    #[serde(default = "default_fan_out_deadline_ms")]
    pub fan_out_deadline_ms: u64,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        let placeholder = CollectorEndpointConfig {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        };
        Self {
            cluster_api: placeholder.clone(),
            log_store: placeholder.clone(),
            metrics_store: placeholder.clone(),
            change_history: placeholder,
            fan_out_deadline_ms: default_fan_out_deadline_ms(),
        }
    }
}

impl CollectorsConfig {
    /// Validates collector configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.cluster_api.validate("collectors.cluster_api")?;
        self.log_store.validate("collectors.log_store")?;
        self.metrics_store.validate("collectors.metrics_store")?;
        self.change_history.validate("collectors.change_history")?;
        if self.fan_out_deadline_ms == 0 {
            return Err(ConfigError::Invalid(
                "collectors.fan_out_deadline_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Graph Store Configuration
// ============================================================================

/// Which [`aiops_core::interfaces::GraphStore`] implementation the gateway
/// wires up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackend {
    /// `neo4rs`-backed, durable dependency graph (production default).
    #[default]
    Neo4j,
    /// In-process, non-durable graph store used by tests and the CLI's
    /// offline mode.
    InMemory,
}

/// Connection settings for the Neo4j-backed dependency graph store.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Which backend to construct.
    #[serde(default)]
    pub backend: GraphBackend,
    /// Bolt connection URI, e.g. `bolt://localhost:7687`.
    #[serde(default = "default_graph_uri")]
    pub uri: String,
    /// Database user.
    #[serde(default = "default_graph_user")]
    pub user: String,
    /// Name of the environment variable holding the database password.
    #[serde(default = "default_graph_password_env")]
    pub password_env: String,
    /// Named database to connect to.
    #[serde(default = "default_graph_database")]
    pub database: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::default(),
            uri: default_graph_uri(),
            user: default_graph_user(),
            password_env: default_graph_password_env(),
            database: default_graph_database(),
        }
    }
}

impl GraphConfig {
    /// Validates graph store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == GraphBackend::InMemory {
            return Ok(());
        }
        if self.uri.trim().is_empty() {
            return Err(ConfigError::Invalid("graph.uri must be non-empty".to_string()));
        }
        if self.password_env.trim().is_empty() {
            return Err(ConfigError::Invalid("graph.password_env must be non-empty".to_string()));
        }
        Ok(())
    }

    /// Reads the graph store password from the configured environment
    /// variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the variable is unset.
    pub fn read_password(&self) -> Result<String, ConfigError> {
        env::var(&self.password_env)
            .map_err(|_| ConfigError::Invalid(format!("{} is not set", self.password_env)))
    }
}

// ============================================================================
// SECTION: SQLite Store Configuration
// ============================================================================

/// Durability mode for `SQLite` writes, mirrored on the synchronous pragma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreSyncMode {
    /// `PRAGMA synchronous = FULL`.
    Full,
    /// `PRAGMA synchronous = NORMAL` (safe under WAL, default).
    #[default]
    Normal,
}

/// Incident/evidence/runbook store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Filesystem path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Synchronous durability mode.
    #[serde(default)]
    pub sync_mode: StoreSyncMode,
    /// Busy timeout applied to the connection, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            sync_mode: StoreSyncMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let text = self.path.to_string_lossy();
        if text.trim().is_empty() {
            return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
        }
        if text.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("store.path exceeds max length".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Policy Gate Configuration
// ============================================================================

/// Blast-radius policy gate client configuration.
///
/// # Invariants
/// - There is no configuration knob that makes the policy gate fail open;
///   any client-level error is always treated as deny (`spec.md` §4.7).
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Base URL of the external policy gate service.
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl PolicyConfig {
    /// Validates policy gate configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("policy.base_url must be non-empty".to_string()));
        }
        validate_timeout_range("policy.request_timeout_ms", self.request_timeout_ms)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Ticket Sink Configuration
// ============================================================================

/// Incident Closer ticket-sink client configuration.
///
/// # Invariants
/// - An empty `base_url` means no ticket sink is wired up; the Incident
///   Closer then skips ticket filing entirely rather than erroring, the
///   same posture `aiops-remediation`'s approval coordinator takes for an
///   absent chat sink.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketConfig {
    /// Base URL of the external issue tracker. Empty disables ticket
    /// filing.
    #[serde(default)]
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self { base_url: String::new(), request_timeout_ms: default_request_timeout_ms() }
    }
}

impl TicketConfig {
    /// Validates ticket sink configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Ok(());
        }
        validate_timeout_range("ticket.request_timeout_ms", self.request_timeout_ms)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Approval Coordinator Configuration
// ============================================================================

/// Approval Coordinator configuration.
///
/// # Invariants
/// - `dev_auto_approve` only takes effect when the action's environment is
///   `"dev"`; it never relaxes approval in any other environment
///   (`spec.md` §4.8).
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    /// Webhook/API base URL for the chat approval sink.
    pub chat_base_url: String,
    /// Maximum time to wait for a human response, in seconds.
    #[serde(default = "default_approval_wait_seconds")]
    pub wait_seconds: u64,
    /// Polling interval while waiting for a response, in seconds.
    #[serde(default = "default_approval_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// Auto-approve low-risk actions targeting the `dev` environment without
    /// waiting on a human response. Explicit opt-in, defaults to false.
    #[serde(default)]
    pub dev_auto_approve: bool,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            chat_base_url: "http://localhost:9091".to_string(),
            wait_seconds: default_approval_wait_seconds(),
            poll_interval_seconds: default_approval_poll_interval_seconds(),
            dev_auto_approve: false,
        }
    }
}

impl ApprovalConfig {
    /// Validates approval configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chat_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("approval.chat_base_url must be non-empty".to_string()));
        }
        if self.wait_seconds == 0 {
            return Err(ConfigError::Invalid("approval.wait_seconds must be greater than zero".to_string()));
        }
        if self.poll_interval_seconds == 0 || self.poll_interval_seconds > self.wait_seconds {
            return Err(ConfigError::Invalid(
                "approval.poll_interval_seconds must be > 0 and <= wait_seconds".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Orchestrator Configuration
// ============================================================================

/// Orchestrator retry and timeout configuration, shared by every workflow
/// activity (`spec.md` §5).
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum retry attempts per activity before the workflow fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff between retries, in milliseconds (doubled per attempt).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Per-activity timeout, in milliseconds.
    #[serde(default = "default_activity_timeout_ms")]
    pub activity_timeout_ms: u64,
    /// Observability stack web root the Runbook Generator builds dashboard
    /// URLs against.
    #[serde(default = "default_dashboard_base_url")]
    pub dashboard_base_url: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            activity_timeout_ms: default_activity_timeout_ms(),
            dashboard_base_url: default_dashboard_base_url(),
        }
    }
}

impl OrchestratorConfig {
    /// Validates orchestrator configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_backoff_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.retry_backoff_ms must be greater than zero".to_string(),
            ));
        }
        if self.activity_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.activity_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Remediation Configuration
// ============================================================================

/// Remediation executor and verifier configuration. Blast-radius weights
/// and multipliers are fixed constants owned by `aiops-remediation`
/// itself, not configurable here: only the verifier's mandatory wait is an
/// operational knob.
#[derive(Debug, Clone, Deserialize)]
pub struct RemediationConfig {
    /// Mandatory wait before the verifier runs its probes, in seconds.
    #[serde(default = "default_verification_wait_seconds")]
    pub verification_wait_seconds: u64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self { verification_wait_seconds: default_verification_wait_seconds() }
    }
}

impl RemediationConfig {
    /// Validates remediation configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.verification_wait_seconds == 0 {
            return Err(ConfigError::Invalid(
                "remediation.verification_wait_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging Configuration
// ============================================================================

/// Structured logging configuration, consumed at process startup to build
/// the `tracing-subscriber` registry.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` `EnvFilter` directive, e.g. `"info,aiops=debug"`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit newline-delimited JSON instead of human-readable text.
    #[serde(default = "default_log_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: default_log_json() }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the explicit argument or environment
/// defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    Ok(())
}

/// Validates that a millisecond timeout falls within the accepted range.
fn validate_timeout_range(field: &str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms < MIN_TIMEOUT_MS || value_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

fn default_bind() -> String {
    "127.0.0.1:8443".to_string()
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

const fn default_metrics_enabled() -> bool {
    true
}

const fn default_dedup_ttl_seconds() -> u64 {
    4 * 60 * 60
}

const fn default_rate_limit_max_requests() -> u32 {
    1_000
}

const fn default_rate_limit_window_seconds() -> u64 {
    60
}

fn default_cluster_name() -> String {
    "default-cluster".to_string()
}

const fn default_connect_timeout_ms() -> u64 {
    2_000
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}

const fn default_fan_out_deadline_ms() -> u64 {
    15_000
}

fn default_graph_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_graph_user() -> String {
    "neo4j".to_string()
}

fn default_graph_password_env() -> String {
    "AIOPS_GRAPH_PASSWORD".to_string()
}

fn default_graph_database() -> String {
    "neo4j".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("aiops.sqlite3")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_approval_wait_seconds() -> u64 {
    14_400
}

const fn default_verification_wait_seconds() -> u64 {
    120
}

const fn default_approval_poll_interval_seconds() -> u64 {
    15
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    500
}

const fn default_activity_timeout_ms() -> u64 {
    30_000
}

fn default_log_filter() -> String {
    "info".to_string()
}

const fn default_log_json() -> bool {
    true
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn empty_file_loads_with_defaults() {
        let file = write_config("");
        let config = AiopsConfig::load(Some(file.path())).expect("load config");
        assert_eq!(config.server.bind, default_bind());
        assert_eq!(config.gateway.dedup_ttl_seconds, 4 * 60 * 60);
        assert!(!config.approval.dev_auto_approve);
    }

    #[test]
    fn invalid_bind_address_fails_validation() {
        let file = write_config("[server]\nbind = \"not-an-address\"\n");
        let err = AiopsConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn dev_auto_approve_defaults_to_false() {
        let file = write_config("approval.chat_base_url = \"http://chat.local\"\n");
        let config = AiopsConfig::load(Some(file.path())).expect("load config");
        assert!(!config.approval.dev_auto_approve);
    }

    #[test]
    fn zero_dedup_ttl_is_rejected() {
        let file = write_config("[gateway]\ndedup_ttl_seconds = 0\n");
        let err = AiopsConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_ticket_base_url_is_allowed() {
        let file = write_config("");
        let config = AiopsConfig::load(Some(file.path())).expect("load config");
        assert!(config.ticket.base_url.is_empty());
    }

    #[test]
    fn ticket_timeout_out_of_range_is_rejected() {
        let file = write_config("[ticket]\nbase_url = \"http://tracker.local\"\nrequest_timeout_ms = 1\n");
        let err = AiopsConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
