// crates/aiops-orchestrator/src/dispatcher.rs
// ============================================================================
// Module: In-Process Workflow Dispatcher
// Description: Implements aiops_broker::WorkflowDispatcher by spawning
//              run_workflow on the shared tokio runtime.
// Purpose: Let the gateway hand off a freshly-persisted incident without
//          blocking the ingest response on the full workflow run.
// Dependencies: aiops-broker, aiops-core, tokio, tracing
// ============================================================================

use std::sync::Arc;

use aiops_broker::DispatchError;
use aiops_broker::WorkflowDispatcher;
use aiops_core::IncidentId;
use async_trait::async_trait;

use crate::deps::WorkflowDeps;
use crate::workflow::run_workflow;

/// Spawns `run_workflow` on the tokio runtime and returns immediately.
///
/// `submit` never observes the workflow's own outcome: once spawned, a
/// run's failures are visible only through [`crate::progress::ProgressTable`]
/// and the process logs, matching the fire-and-forget posture
/// `aiops_broker::dispatch_best_effort` already assumes of its caller.
pub struct InProcessDispatcher {
    deps: Arc<WorkflowDeps>,
}

impl InProcessDispatcher {
    /// Builds a dispatcher over the given shared workflow dependencies.
    #[must_use]
    pub fn new(deps: Arc<WorkflowDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl WorkflowDispatcher for InProcessDispatcher {
    async fn submit(&self, incident_id: &IncidentId) -> Result<(), DispatchError> {
        let deps = Arc::clone(&self.deps);
        let incident_id = incident_id.clone();
        tokio::spawn(async move {
            if let Err(err) = run_workflow(&deps, &incident_id).await {
                tracing::error!(incident_id = %incident_id, error = %err, "workflow run failed");
            }
        });
        Ok(())
    }
}
