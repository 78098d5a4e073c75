// crates/aiops-core/src/interfaces/mod.rs
// ============================================================================
// Module: Control Plane Interfaces
// Description: Backend-agnostic interfaces for evidence collection, graph
//              storage, policy evaluation, approval, and remediation
//              dispatch.
// Purpose: Define the contract surfaces the orchestrator drives without
//          embedding backend-specific details.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the control plane integrates with clusters, stores,
//! and human approval channels without embedding backend-specific details.
//! Implementations must fail closed on missing or invalid data. Collection
//! and dispatch interfaces are async because they are I/O bound; policy and
//! ranking math stay synchronous.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::evidence::Evidence;
use crate::core::graph::GraphEntity;
use crate::core::graph::GraphRelation;
use crate::core::identifiers::IncidentId;
use crate::core::incident::Incident;
use crate::core::remediation::RemediationAction;
use crate::core::time::TimeWindow;

// ============================================================================
// SECTION: Evidence Collector
// ============================================================================

/// Context handed to a collector for a single collection pass.
///
/// # Invariants
/// - `window` bounds the evidence the collector should return; collectors
///   must not silently widen it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorContext {
    /// Cluster to query.
    pub cluster: String,
    /// Namespace to query.
    pub namespace: String,
    /// Optional service scope.
    pub service: Option<String>,
    /// Time window to collect evidence within.
    pub window: TimeWindow,
}

/// Collector errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The upstream source returned an error or was unreachable.
    #[error("collector source error: {0}")]
    Source(String),
    /// The upstream source timed out.
    #[error("collector timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// The shared result envelope every collector returns, per `spec.md` §2/§4.2:
/// `(evidence[], graphEntities[], graphRelations[], errors[])` plus the time
/// the collection pass took.
///
/// # Invariants
/// - A non-empty `errors` list does not mean the run failed — [`Self::success`]
///   reflects it, but whatever was collected in `evidence`/`entities`/
///   `relations` is still usable by downstream stages.
#[derive(Debug, Clone, Default)]
pub struct CollectionOutcome {
    /// Evidence gathered during this pass.
    pub evidence: Vec<Evidence>,
    /// Graph nodes to upsert from this pass's findings.
    pub entities: Vec<GraphEntity>,
    /// Graph relations to upsert from this pass's findings.
    pub relations: Vec<GraphRelation>,
    /// Non-fatal errors encountered while querying the upstream source.
    pub errors: Vec<String>,
    /// Wall-clock time this collection pass took.
    pub duration: std::time::Duration,
}

impl CollectionOutcome {
    /// `true` when no errors were recorded during this pass (`spec.md` §4.2:
    /// "returning a non-empty errors list ... marks success = false").
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A single async evidence collector. Each of the four collectors named in
/// `spec.md` §4.2 implements this trait.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short, stable collector name used in logs and metrics labels.
    fn name(&self) -> &str;

    /// Collects evidence and graph updates for one incident within `ctx`'s
    /// window.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] only when the collector cannot even begin
    /// (e.g. no client configured). Per-query upstream failures are
    /// collected into [`CollectionOutcome::errors`] instead; collectors must
    /// never panic on malformed upstream data, preferring partial evidence
    /// with reduced `signal_strength` over a hard failure.
    async fn collect(
        &self,
        ctx: &CollectorContext,
        incident: &Incident,
    ) -> Result<CollectionOutcome, CollectorError>;
}

// ============================================================================
// SECTION: Graph Store
// ============================================================================

/// Graph store errors.
#[derive(Debug, Error)]
pub enum GraphStoreError {
    /// The backend reported an error.
    #[error("graph store error: {0}")]
    Backend(String),
    /// The backend connection is unavailable.
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
}

/// Health of the graph store backend, returned by readiness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphHealth {
    /// Backend reachable and schema constraints present.
    Healthy,
    /// Backend reachable but schema constraints are missing.
    Degraded,
    /// Backend unreachable.
    Unreachable,
}

/// Backend-agnostic dependency graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Idempotently upserts an entity, merging `properties` into any
    /// existing node with the same composite id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] when the upsert fails.
    async fn upsert_entity(&self, entity: &GraphEntity) -> Result<(), GraphStoreError>;

    /// Idempotently upserts a relation between two previously upserted
    /// entities.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] when the upsert fails.
    async fn upsert_relation(&self, relation: &GraphRelation) -> Result<(), GraphStoreError>;

    /// Returns all entities and relations reachable from the incident node
    /// within `depth` hops (`spec.md` §4.3's subgraph query, also exposed
    /// as `GetIncidentGraph(id, depth)` in §4.1).
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] when the query fails.
    async fn neighborhood(
        &self,
        incident_id: &IncidentId,
        depth: u32,
    ) -> Result<(Vec<GraphEntity>, Vec<GraphRelation>), GraphStoreError>;

    /// Ensures required uniqueness constraints exist; called once at
    /// startup.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] when constraints cannot be verified or
    /// created.
    async fn ensure_constraints(&self) -> Result<(), GraphStoreError>;

    /// Reports backend health for readiness probes.
    async fn health(&self) -> GraphHealth;
}

// ============================================================================
// SECTION: Key/Value Store
// ============================================================================

/// Key/value store errors, used by the gateway's rate limiter and dedup
/// cache.
#[derive(Debug, Error)]
pub enum KeyValueError {
    /// The backend reported an error.
    #[error("key/value store error: {0}")]
    Backend(String),
}

/// A minimal async key/value abstraction with TTL support, backing the
/// gateway's fingerprint dedup cache and rate limiter counters.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetches a value if present and not expired.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueError`] when the backend cannot be queried.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueError>;

    /// Sets a value with a time-to-live.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueError`] when the backend cannot be written.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: std::time::Duration,
    ) -> Result<(), KeyValueError>;

    /// Atomically increments a counter, creating it with the given TTL if
    /// absent, and returns the post-increment value. Used for the rate
    /// limiter's sliding window counters.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueError`] when the backend cannot be written.
    async fn incr_with_expiry(
        &self,
        key: &str,
        ttl: std::time::Duration,
    ) -> Result<u64, KeyValueError>;
}

// ============================================================================
// SECTION: Policy Gate Client
// ============================================================================

/// Policy gate decision for a single remediation action, per `spec.md`
/// §4.7's `{allow, requires_approval, deny:[reason]}` response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    /// Whether the action may proceed at all.
    pub allow: bool,
    /// Whether a human approval is required before execution.
    pub requires_approval: bool,
    /// Denial or fail-closed reason, present when `allow` is false.
    pub reason: Option<String>,
}

impl PolicyDecision {
    /// The fail-closed decision used when the policy backend cannot be
    /// reached or its response cannot be parsed: `allow=false,
    /// requires_approval=true, reason=error` (`spec.md` §4.7).
    #[must_use]
    pub fn fail_closed(reason: impl Into<String>) -> Self {
        Self { allow: false, requires_approval: true, reason: Some(reason.into()) }
    }
}

/// Policy gate client errors.
///
/// # Invariants
/// - Implementations must fail closed: any error here is treated by the
///   orchestrator as [`PolicyDecision::Deny`].
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy backend returned an error or was unreachable.
    #[error("policy gate error: {0}")]
    Backend(String),
    /// The policy backend timed out.
    #[error("policy gate timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Client for the external blast-radius policy gate.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Evaluates whether `action` may proceed given its computed blast
    /// radius.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the backend cannot be reached or its
    /// response cannot be parsed; callers must treat this the same as
    /// [`PolicyDecision::fail_closed`] (fail closed).
    async fn evaluate(&self, action: &RemediationAction) -> Result<PolicyDecision, PolicyError>;
}

// ============================================================================
// SECTION: Approval Sinks
// ============================================================================

/// Chat sink errors.
#[derive(Debug, Error)]
pub enum ChatSinkError {
    /// The chat backend returned an error or was unreachable.
    #[error("chat sink error: {0}")]
    Backend(String),
}

/// Sink used by the Approval Coordinator to post approval requests and
/// receive operator responses.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Posts an approval request for `action` and returns an opaque
    /// message handle the backend can later correlate a response to.
    ///
    /// # Errors
    ///
    /// Returns [`ChatSinkError`] when the message cannot be posted.
    async fn post_approval_request(
        &self,
        action: &RemediationAction,
    ) -> Result<String, ChatSinkError>;

    /// Polls for a response to a previously posted approval request.
    ///
    /// # Errors
    ///
    /// Returns [`ChatSinkError`] when the backend cannot be queried.
    async fn poll_response(&self, message_handle: &str) -> Result<Option<bool>, ChatSinkError>;
}

// ============================================================================
// SECTION: Ticket Sink
// ============================================================================

/// An issue to file against an external tracker, opaque beyond these three
/// fields (`spec.md` §6: "create-issue with summary/description/priority").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    /// Short issue summary.
    pub summary: String,
    /// Longer free-form description, typically the incident's evidence and
    /// hypothesis summary.
    pub description: String,
    /// Tracker-defined priority string (e.g. `"P1"`, `"high"`).
    pub priority: String,
}

/// Ticket sink errors.
#[derive(Debug, Error)]
pub enum TicketSinkError {
    /// The ticket backend returned an error or was unreachable.
    #[error("ticket sink error: {0}")]
    Backend(String),
}

/// Sink used by the Incident Closer to file a ticket when an incident
/// closes unresolved.
#[async_trait]
pub trait TicketSink: Send + Sync {
    /// Creates an issue and returns its tracker-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TicketSinkError`] when the issue cannot be created.
    async fn create_issue(&self, request: &TicketRequest) -> Result<String, TicketSinkError>;
}

// ============================================================================
// SECTION: Remediation Executor
// ============================================================================

/// Outcome of dispatching a remediation action to its target cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// Whether the underlying cluster API call succeeded.
    pub succeeded: bool,
    /// Backend-reported message, for audit logging.
    pub message: String,
}

/// Remediation executor errors.
#[derive(Debug, Error)]
pub enum ActionHandlerError {
    /// The target cluster API returned an error.
    #[error("action handler error: {0}")]
    Backend(String),
}

/// A single action handler, one per [`crate::core::remediation::ActionType`].
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Executes `action` against its target, keyed by
    /// `action.idempotency_key` so retries do not double-apply.
    ///
    /// # Errors
    ///
    /// Returns [`ActionHandlerError`] when the target cluster API call
    /// fails.
    async fn execute(
        &self,
        action: &RemediationAction,
    ) -> Result<ExecutionReceipt, ActionHandlerError>;
}

// ============================================================================
// SECTION: Retryability
// ============================================================================

/// Classifies whether an error is worth retrying, used by the orchestrator's
/// retry policy to distinguish transient backend hiccups from permanent
/// failures.
pub trait Retryability {
    /// Returns true when the orchestrator should retry the operation that
    /// produced this error.
    fn is_retryable(&self) -> bool;
}

impl Retryability for CollectorError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl Retryability for PolicyError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl Retryability for ActionHandlerError {
    fn is_retryable(&self) -> bool {
        true
    }
}

impl Retryability for GraphStoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
