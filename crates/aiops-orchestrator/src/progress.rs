// crates/aiops-orchestrator/src/progress.rs
// ============================================================================
// Module: Workflow Progress
// Description: The workflow-local state machine status, held in memory and
//              exposed via query handles.
// Purpose: Per REDESIGN FLAGS, durability is delegated to an external
//          execution service; this crate owns only the in-memory progress
//          struct and its query surface.
// Dependencies: aiops-core, tokio::sync::RwLock
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use aiops_core::Hypothesis;
use aiops_core::IncidentId;
use tokio::sync::RwLock;

/// Workflow-local lifecycle status, per the state machine:
/// `initialized -> collecting_evidence -> building_graph -> analyzing ->
/// generating_runbook -> evaluating_policy -> (remediating -> verifying)? |
/// approval_denied -> creating_ticket? -> closing -> completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Accepted, not yet started.
    Initialized,
    /// Fanning out to the four evidence collectors.
    CollectingEvidence,
    /// Upserting collected entities/relations into the graph store.
    BuildingGraph,
    /// Generating and ranking hypotheses.
    Analyzing,
    /// Generating the investigation runbook.
    GeneratingRunbook,
    /// Evaluating the blast-radius policy gate.
    EvaluatingPolicy,
    /// Policy denied the action outright; no remediation will run.
    ApprovalDenied,
    /// Approved action is executing and verifying.
    Remediating,
    /// Verifying the executed action's outcome.
    Verifying,
    /// Filing a ticket for an unresolved outcome.
    CreatingTicket,
    /// Persisting the terminal incident status.
    Closing,
    /// Reached a terminal, successful outcome.
    Completed,
    /// Reached a terminal, failed outcome (a step exhausted retries on a
    /// permanent error).
    Failed,
}

/// The full workflow-local progress record for one incident's run, exposed
/// via [`ProgressTable`]'s `status`/`hypotheses`/`evidence_count` queries.
#[derive(Debug, Clone)]
pub struct WorkflowProgress {
    /// Current lifecycle status.
    pub status: WorkflowStatus,
    /// Evidence items collected so far.
    pub evidence_count: usize,
    /// Ranked hypotheses, once analysis has run.
    pub hypotheses: Vec<Hypothesis>,
    /// Step-level error messages accumulated along the way (not
    /// necessarily fatal; see `spec.md` §5's partial-failure posture).
    pub errors: Vec<String>,
}

impl WorkflowProgress {
    fn initial() -> Self {
        Self { status: WorkflowStatus::Initialized, evidence_count: 0, hypotheses: Vec::new(), errors: Vec::new() }
    }
}

/// In-memory table of per-incident workflow progress, the query surface a
/// real durable-execution backend's `status()`/`hypotheses()`/
/// `evidenceCount()` handles would be backed by.
#[derive(Debug, Clone, Default)]
pub struct ProgressTable {
    inner: Arc<RwLock<HashMap<IncidentId, WorkflowProgress>>>,
}

impl ProgressTable {
    /// Builds an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh, `Initialized` progress record for `incident_id`,
    /// overwriting any prior record (a resumed or retried run starts its
    /// progress over).
    pub async fn start(&self, incident_id: IncidentId) {
        self.inner.write().await.insert(incident_id, WorkflowProgress::initial());
    }

    /// Updates `incident_id`'s status.
    pub async fn set_status(&self, incident_id: &IncidentId, status: WorkflowStatus) {
        if let Some(progress) = self.inner.write().await.get_mut(incident_id) {
            progress.status = status;
        }
    }

    /// Records the evidence count collected for `incident_id`.
    pub async fn set_evidence_count(&self, incident_id: &IncidentId, count: usize) {
        if let Some(progress) = self.inner.write().await.get_mut(incident_id) {
            progress.evidence_count = count;
        }
    }

    /// Records `incident_id`'s ranked hypotheses.
    pub async fn set_hypotheses(&self, incident_id: &IncidentId, hypotheses: Vec<Hypothesis>) {
        if let Some(progress) = self.inner.write().await.get_mut(incident_id) {
            progress.hypotheses = hypotheses;
        }
    }

    /// Appends a non-fatal step error to `incident_id`'s progress.
    pub async fn push_error(&self, incident_id: &IncidentId, error: impl Into<String>) {
        if let Some(progress) = self.inner.write().await.get_mut(incident_id) {
            progress.errors.push(error.into());
        }
    }

    /// Query handle: current status, if the incident has a run recorded.
    pub async fn status(&self, incident_id: &IncidentId) -> Option<WorkflowStatus> {
        self.inner.read().await.get(incident_id).map(|progress| progress.status)
    }

    /// Query handle: ranked hypotheses, if analysis has run.
    pub async fn hypotheses(&self, incident_id: &IncidentId) -> Vec<Hypothesis> {
        self.inner.read().await.get(incident_id).map(|progress| progress.hypotheses.clone()).unwrap_or_default()
    }

    /// Query handle: evidence count collected so far.
    pub async fn evidence_count(&self, incident_id: &IncidentId) -> usize {
        self.inner.read().await.get(incident_id).map(|progress| progress.evidence_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[tokio::test]
    async fn fresh_incident_starts_initialized() {
        let table = ProgressTable::new();
        let id = IncidentId::new("incident-1");
        table.start(id.clone()).await;
        assert_eq!(table.status(&id).await, Some(WorkflowStatus::Initialized));
        assert_eq!(table.evidence_count(&id).await, 0);
        assert!(table.hypotheses(&id).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_incident_has_no_status() {
        let table = ProgressTable::new();
        assert_eq!(table.status(&IncidentId::new("missing")).await, None);
    }

    #[tokio::test]
    async fn updates_are_visible_to_query_handles() {
        let table = ProgressTable::new();
        let id = IncidentId::new("incident-2");
        table.start(id.clone()).await;
        table.set_status(&id, WorkflowStatus::CollectingEvidence).await;
        table.set_evidence_count(&id, 12).await;
        assert_eq!(table.status(&id).await, Some(WorkflowStatus::CollectingEvidence));
        assert_eq!(table.evidence_count(&id).await, 12);
    }
}
