// crates/aiops-core/src/lib.rs
// ============================================================================
// Module: AIOps Core Library
// Description: Public API surface for the incident remediation control
//              plane's domain model.
// Purpose: Expose core types and backend-agnostic interfaces shared by every
//          other crate in the workspace.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! `aiops-core` provides the domain model (incidents, evidence, graph
//! entities, hypotheses, remediation actions, verification results) and the
//! interface contracts (collectors, graph store, policy client, approval
//! sinks, action handlers) that the rest of the control plane integrates
//! through. It is backend-agnostic: no HTTP client, no SQL, no Bolt
//! protocol code lives here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::evidence::Evidence;
pub use core::evidence::EvidenceType;
pub use core::fingerprint::compute_fingerprint;
pub use core::graph::EntityKind;
pub use core::graph::GraphEntity;
pub use core::graph::GraphRelation;
pub use core::graph::RelationKind;
pub use core::hypothesis::Category;
pub use core::hypothesis::Hypothesis;
pub use core::identifiers::ClusterId;
pub use core::identifiers::EvidenceId;
pub use core::identifiers::Fingerprint;
pub use core::identifiers::GraphEntityId;
pub use core::identifiers::HypothesisId;
pub use core::identifiers::IncidentId;
pub use core::identifiers::NamespaceId;
pub use core::identifiers::new_uuid_string;
pub use core::identifiers::RemediationActionId;
pub use core::identifiers::RunbookId;
pub use core::identifiers::ServiceId;
pub use core::incident::Incident;
pub use core::incident::IncidentStatus;
pub use core::incident::Severity;
pub use core::log_patterns;
pub use core::remediation::ActionStatus;
pub use core::remediation::ActionType;
pub use core::remediation::ApprovalAudit;
pub use core::remediation::RemediationAction;
pub use core::remediation::RiskLevel;
pub use core::remediation::Target;
pub use core::time::TimeWindow;
pub use core::time::Timestamp;
pub use core::verification::PodHealthSnapshot;
pub use core::verification::VerificationResult;

pub use interfaces::ActionHandler;
pub use interfaces::ActionHandlerError;
pub use interfaces::ChatSink;
pub use interfaces::ChatSinkError;
pub use interfaces::Collector;
pub use interfaces::CollectionOutcome;
pub use interfaces::CollectorContext;
pub use interfaces::CollectorError;
pub use interfaces::ExecutionReceipt;
pub use interfaces::GraphHealth;
pub use interfaces::GraphStore;
pub use interfaces::GraphStoreError;
pub use interfaces::KeyValueError;
pub use interfaces::KeyValueStore;
pub use interfaces::PolicyClient;
pub use interfaces::PolicyDecision;
pub use interfaces::PolicyError;
pub use interfaces::Retryability;
pub use interfaces::TicketRequest;
pub use interfaces::TicketSink;
pub use interfaces::TicketSinkError;
