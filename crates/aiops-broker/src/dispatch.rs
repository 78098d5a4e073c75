// crates/aiops-broker/src/dispatch.rs
// ============================================================================
// Module: Workflow Dispatch
// Description: Submits a persisted incident to the workflow orchestrator.
// Purpose: A single "submit a workflow" seam between ingestion and the
//          orchestrator, decoupled so either side can be swapped or mocked.
// Dependencies: aiops-core
// ============================================================================

use aiops_core::IncidentId;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised submitting an incident to the workflow orchestrator.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The orchestrator could not be reached or rejected the submission.
    #[error("workflow dispatch failed: {0}")]
    Backend(String),
}

/// Builds the workflow id for an incident, `"incident-<uuid>"` (`spec.md`
/// §4.1).
#[must_use]
pub fn workflow_id(incident_id: &IncidentId) -> String {
    format!("incident-{}", incident_id.as_str())
}

/// Submits incidents to the workflow orchestrator. Implemented by
/// `aiops-orchestrator` in-process, or by a test double in unit tests.
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    /// Starts (or resumes) the workflow for `incident_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the orchestrator cannot accept the
    /// submission. Per `spec.md` §4.1, the gateway logs this but does not
    /// fail the ingest response.
    async fn submit(&self, incident_id: &IncidentId) -> Result<(), DispatchError>;
}

/// Dispatches `incident_id` and logs, rather than propagates, failure —
/// the exact fire-and-forget posture `spec.md` §4.1 requires of the
/// gateway's ingest path.
pub async fn dispatch_best_effort(dispatcher: &dyn WorkflowDispatcher, incident_id: &IncidentId) {
    if let Err(error) = dispatcher.submit(incident_id).await {
        tracing::warn!(incident_id = %incident_id, error = %error, "workflow dispatch failed");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    struct CountingDispatcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WorkflowDispatcher for CountingDispatcher {
        async fn submit(&self, _incident_id: &IncidentId) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DispatchError::Backend("orchestrator unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn dispatch_failure_does_not_panic() {
        let dispatcher = CountingDispatcher { calls: AtomicUsize::new(0) };
        dispatch_best_effort(&dispatcher, &IncidentId::new("inc-1")).await;
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn workflow_id_has_expected_prefix() {
        assert_eq!(workflow_id(&IncidentId::new("abc")), "incident-abc");
    }
}
