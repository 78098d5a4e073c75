// crates/aiops-broker/src/lib.rs
// ============================================================================
// Module: AIOps Alert Broker
// Description: Normalization, deduplication, rate limiting, and workflow
//              dispatch shared by every ingest webhook.
// Purpose: Backend-agnostic ingestion pipeline consumed by aiops-gateway.
// Dependencies: crate::{ingest, dedup, rate_limit, dispatch}
// ============================================================================

//! ## Overview
//! `aiops-broker` is the Alert Gateway's core logic (`spec.md` §4.1) with no
//! HTTP framing: normalize an alert payload into an [`aiops_core::Incident`],
//! deduplicate by fingerprint, rate-limit by caller key, and dispatch the
//! result to the workflow orchestrator. `aiops-gateway` wires this to axum.

pub mod dedup;
pub mod dispatch;
pub mod ingest;
pub mod rate_limit;

pub use dedup::DedupOutcome;
pub use dedup::DEFAULT_DEDUP_TTL;
pub use dedup::check_duplicate;
pub use dedup::register_with_ttl;
pub use dispatch::DispatchError;
pub use dispatch::WorkflowDispatcher;
pub use ingest::AlertmanagerPayload;
pub use ingest::RawAlert;
pub use rate_limit::RateLimitOutcome;
