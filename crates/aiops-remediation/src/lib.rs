// crates/aiops-remediation/src/lib.rs
// ============================================================================
// Module: AIOps Remediation
// Description: Public API for blast-radius scoring, the Policy Gate client,
//              the Approval Coordinator, the five action handlers, and the
//              Verifier.
// Purpose: Give the orchestrator everything between "approved hypothesis"
//          and "verified outcome".
// Dependencies: aiops-collectors, aiops-config, aiops-core, reqwest, time
// ============================================================================

//! ## Overview
//! The happy path through this crate mirrors the Policy Gate through
//! Verifier steps of the workflow: compute [`blast_radius::compute`], gate
//! it through a [`policy_client::HttpPolicyClient`], route approval
//! requirements through [`approval::await_approval`], dispatch to the
//! [`handlers::build_registry`] table, and finally [`verifier::verify`] the
//! outcome.

mod approval;
mod blast_radius;
mod chat_sink;
mod handlers;
mod policy_client;
mod ticket;
mod verifier;

pub use approval::NO_CHAT_SINK_REASON;
pub use approval::await_approval;
pub use blast_radius::compute as compute_blast_radius;
pub use blast_radius::fail_closed_score as blast_radius_fail_closed_score;
pub use chat_sink::HttpChatSink;
pub use chat_sink::render_approval_text;
pub use handlers::CordonNodeHandler;
pub use handlers::RestartDeploymentHandler;
pub use handlers::RestartPodHandler;
pub use handlers::RollbackDeploymentHandler;
pub use handlers::ScaleReplicasHandler;
pub use handlers::build_registry;
pub use policy_client::HttpPolicyClient;
pub use ticket::HttpTicketSink;
pub use verifier::VerifierError;
pub use verifier::verify;
