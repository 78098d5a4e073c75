// crates/aiops-core/src/core/verification.rs
// ============================================================================
// Module: Verification Result
// Description: The outcome of post-remediation health probing.
// Purpose: Give the Orchestrator a single pass/fail signal plus the
//          before/after snapshots it was derived from.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::IncidentId;
use crate::core::identifiers::RemediationActionId;

/// Pod health snapshot for `app=<service>`, per `spec.md` §4.10's pod-health
/// probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PodHealthSnapshot {
    /// Total pods matching the service selector.
    pub total: u32,
    /// Pods with `phase=Running` and all conditions `Ready=True`.
    pub healthy: u32,
    /// `healthy / total`, `0.0` when `total` is zero.
    pub percentage: f64,
    /// True when every pod is healthy.
    pub all_healthy: bool,
}

impl PodHealthSnapshot {
    /// Builds a snapshot from raw counts, computing `percentage` and
    /// `all_healthy`.
    #[must_use]
    pub fn new(total: u32, healthy: u32) -> Self {
        let percentage = if total == 0 { 0.0 } else { f64::from(healthy) / f64::from(total) };
        Self { total, healthy, percentage, all_healthy: total > 0 && healthy == total }
    }
}

/// The aggregate outcome of verifying a remediation action, produced exactly
/// once per executed action.
///
/// # Invariants
/// - `metrics_improved = error_rate_improved || restart_rate_improved ||
///   pods_after.all_healthy` (`spec.md` §4.10).
/// - `success = metrics_improved && pods_after.all_healthy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Action that was verified.
    pub action_id: RemediationActionId,
    /// Incident this verification belongs to.
    pub incident_id: IncidentId,
    /// Overall success: metrics improved and pods are fully healthy.
    pub success: bool,
    /// Whether any of the three probes showed improvement.
    pub metrics_improved: bool,
    /// 5xx error-rate ratio observed 15 minutes before remediation.
    pub error_rate_before: f64,
    /// 5xx error-rate ratio observed after the wait.
    pub error_rate_after: f64,
    /// p99 latency observed 15 minutes before remediation, informational
    /// only (not part of the improvement formula).
    pub latency_p99_before: f64,
    /// p99 latency observed after the wait, informational only.
    pub latency_p99_after: f64,
    /// Restart count observed 15 minutes before remediation.
    pub restart_count_before: f64,
    /// Restart count observed after the wait.
    pub restart_count_after: f64,
    /// Pod health snapshot before remediation.
    pub pods_before: PodHealthSnapshot,
    /// Pod health snapshot after the wait.
    pub pods_after: PodHealthSnapshot,
    /// How long the verifier waited before probing, in seconds.
    pub wait_duration_seconds: u64,
}

impl VerificationResult {
    /// True when the current error rate is strictly lower than the prior
    /// window's, per `spec.md` §4.10.
    #[must_use]
    pub fn error_rate_improved(&self) -> bool {
        self.error_rate_after < self.error_rate_before
    }

    /// True when the current restart count is no higher than the prior
    /// window's, per `spec.md` §4.10.
    #[must_use]
    pub fn restart_rate_improved(&self) -> bool {
        self.restart_count_after <= self.restart_count_before
    }

    /// Computes `metrics_improved` from the three probes.
    #[must_use]
    pub fn compute_metrics_improved(&self) -> bool {
        self.error_rate_improved() || self.restart_rate_improved() || self.pods_after.all_healthy
    }
}
