// crates/aiops-core/src/core/remediation.rs
// ============================================================================
// Module: Remediation Action
// Description: A concrete, executable remediation step and its lifecycle.
// Purpose: Give the Policy Gate, Approval Coordinator, and Remediation
//          Executor a single shape to reason about, gate, and mutate.
// Dependencies: crate::core::identifiers, crate::core::time, serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::RemediationActionId;
use crate::core::time::Timestamp;

/// The kind of remediation an action performs, per `spec.md` §4.9's action
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Delete one pod matching `app=<service>` (first non-Running, else
    /// first).
    RestartPod,
    /// Patch the pod template annotation `restartedAt` on a deployment.
    RestartDeployment,
    /// Roll a deployment's pod template back to the previous revision.
    RollbackDeployment,
    /// Patch `spec.replicas` on a deployment.
    ScaleReplicas,
    /// Patch a node's `spec.unschedulable`.
    CordonNode,
}

/// The resource a remediation action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Cluster name, when the action spans clusters; empty otherwise.
    pub cluster: String,
    /// Namespace, empty for cluster-scoped targets (e.g. a node).
    pub namespace: String,
    /// Resource kind (`"deployment"`, `"pod"`, `"node"`, ...).
    pub kind: String,
    /// Resource name.
    pub name: String,
}

/// Remediation action lifecycle status, per `spec.md` §3's state machine:
/// `proposed -> pending_approval -> approved|rejected -> executing ->
/// completed|failed|rolled_back|skipped`.
///
/// # Invariants
/// - Transitions are monotonic in the listed order except that `executing`
///   (or a terminal state reached from it) may transition to `rolled_back`
///   as an explicit rollback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Proposed by a ranked hypothesis, not yet gated.
    Proposed,
    /// Policy requires human approval; awaiting a response.
    PendingApproval,
    /// Approved, either by a human or policy/dev auto-approval.
    Approved,
    /// Denied by policy or a human; terminal.
    Rejected,
    /// Dispatched to the executor.
    Executing,
    /// Executor reported success.
    Completed,
    /// Executor reported failure; terminal.
    Failed,
    /// Explicitly rolled back after execution.
    RolledBack,
    /// Not executed because another action already resolved the incident.
    Skipped,
}

/// Audit trail of the approval decision for a remediation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalAudit {
    /// Whether the action required human approval at all.
    pub required: bool,
    /// Opaque handle to the posted approval request, if any.
    pub request_handle: Option<String>,
    /// Final approval outcome, once known.
    pub approved: Option<bool>,
    /// Free-form reason (e.g. `"Slack not configured"`, a policy denial
    /// reason, or the identity of the approving operator).
    pub reason: Option<String>,
    /// When the approval decision (or timeout) was recorded.
    pub decided_at: Option<Timestamp>,
}

impl ApprovalAudit {
    /// The audit state for an action that was never routed to approval.
    #[must_use]
    pub const fn not_required() -> Self {
        Self { required: false, request_handle: None, approved: None, reason: None, decided_at: None }
    }
}

/// Coarse risk bucket derived from `blast_radius_score`, consumed by the
/// Policy Gate and Approval Coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl RiskLevel {
    /// Buckets a `[0, 100]` blast-radius score: `< 30` low, `< 70` medium,
    /// else high.
    #[must_use]
    pub fn from_blast_radius(score: f64) -> Self {
        if score < 30.0 {
            Self::Low
        } else if score < 70.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// A concrete remediation action derived from a ranked hypothesis.
///
/// # Invariants
/// - `idempotency_key` is stable across retries of the same logical action
///   (`"<incident>_<type>_<target>_<hour>"`) so the executor can safely
///   retry without double-applying.
/// - `blast_radius_score` is within `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationAction {
    /// Remediation action identifier.
    pub id: RemediationActionId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Hypothesis this action was recommended by, if any (a human-triggered
    /// action may have none).
    pub hypothesis_id: Option<HypothesisId>,
    /// Action kind.
    pub action_type: ActionType,
    /// Target resource.
    pub target: Target,
    /// Free-form action parameters (e.g. `pod_name`, `replicas`).
    pub parameters: BTreeMap<String, String>,
    /// Lifecycle status.
    pub status: ActionStatus,
    /// Risk level derived from blast radius, used by the Policy Gate.
    pub risk_level: RiskLevel,
    /// Computed blast-radius score, `[0, 100]` (`spec.md` §4.7).
    pub blast_radius_score: f64,
    /// Number of replicas/pods this action would affect.
    pub affected_replicas: u32,
    /// Deployment environment of the target (`"dev"`, `"staging"`, `"uat"`,
    /// `"prod"`, ...).
    pub environment: String,
    /// Stable key used to dedupe retried execution attempts.
    pub idempotency_key: String,
    /// Approval decision audit trail.
    pub approval: ApprovalAudit,
}

/// `YYYYMMDDHH` hour-bucket format for idempotency keys (`spec.md`
/// Glossary).
const HOUR_BUCKET_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year][month][day][hour]");

impl RemediationAction {
    /// Builds the idempotency key `"<incidentId>_<actionType>_<target>_<YYYYMMDDHH>"`
    /// per `spec.md` Glossary, where the hour bucket is the UTC hour the
    /// action was proposed in.
    #[must_use]
    pub fn idempotency_key(
        incident_id: &IncidentId,
        action_type: ActionType,
        target_name: &str,
        proposed_at: Timestamp,
    ) -> String {
        let type_str = match action_type {
            ActionType::RestartPod => "restart_pod",
            ActionType::RestartDeployment => "restart_deployment",
            ActionType::RollbackDeployment => "rollback_deployment",
            ActionType::ScaleReplicas => "scale_replicas",
            ActionType::CordonNode => "cordon_node",
        };
        let hour_bucket = proposed_at
            .into_offset_date_time()
            .format(HOUR_BUCKET_FORMAT)
            .unwrap_or_else(|_| proposed_at.unix_timestamp().div_euclid(3_600).to_string());
        format!("{}_{type_str}_{target_name}_{hour_bucket}", incident_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use time::macros::datetime;

    use super::*;

    #[test]
    fn idempotency_key_uses_yyyymmddhh_hour_bucket() {
        let incident_id = IncidentId::new("inc-1");
        let proposed_at = Timestamp::from_offset_date_time(datetime!(2026-01-05 05:42:00 UTC));
        let key = RemediationAction::idempotency_key(&incident_id, ActionType::RestartPod, "api-7d-xyz", proposed_at);
        assert_eq!(key, "inc-1_restart_pod_api-7d-xyz_2026010505");
    }

    #[test]
    fn idempotency_key_stable_within_same_hour() {
        let incident_id = IncidentId::new("inc-1");
        let earlier = Timestamp::from_offset_date_time(datetime!(2026-01-05 05:00:01 UTC));
        let later = Timestamp::from_offset_date_time(datetime!(2026-01-05 05:59:59 UTC));
        let a = RemediationAction::idempotency_key(&incident_id, ActionType::ScaleReplicas, "api", earlier);
        let b = RemediationAction::idempotency_key(&incident_id, ActionType::ScaleReplicas, "api", later);
        assert_eq!(a, b);
    }
}
