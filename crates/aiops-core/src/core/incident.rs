// crates/aiops-core/src/core/incident.rs
// ============================================================================
// Module: Incident
// Description: The incident aggregate and its lifecycle status.
// Purpose: Canonical shape persisted by the gateway and mutated by workflow
//          activities.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! An [`Incident`] is created once per non-duplicate alert by the Alert
//! Gateway and then mutated only by workflow activities as it moves through
//! [`IncidentStatus`]. See invariant (I1) in `spec.md` §3: at most one
//! incident exists per active fingerprint within its TTL window.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ClusterId;
use crate::core::identifiers::Fingerprint;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::NamespaceId;
use crate::core::identifiers::ServiceId;
use crate::core::time::Timestamp;

/// Alert severity, normalized from the source's free-form severity string.
///
/// # Invariants
/// - Variants are stable for serialization and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, no operator action implied.
    Info,
    /// Low impact.
    Low,
    /// Degraded but not customer-impacting.
    Medium,
    /// Customer-impacting.
    High,
    /// Outage-level impact.
    Critical,
}

impl Severity {
    /// Maps a raw severity string through the fixed normalization table in
    /// `spec.md` §4.1: `critical|high` as-is, `warning|warn -> medium`,
    /// `error|alerting -> high`, `info|low` as-is, anything else `-> medium`.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "warning" | "warn" => Self::Medium,
            "error" | "alerting" => Self::High,
            "info" => Self::Info,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// Incident lifecycle status.
///
/// # Invariants
/// - Transitions are monotonic in the order listed except for explicit
///   rollback paths documented on [`crate::core::remediation::RemediationAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Created, not yet picked up by the workflow.
    Open,
    /// Evidence collection and graph assembly in progress.
    Investigating,
    /// Hypotheses ranked and runbook generated.
    Identified,
    /// Policy allowed and remediation is executing.
    Remediating,
    /// Verification confirmed improvement.
    Resolved,
    /// Terminal state reached without a confirmed resolution (policy denied,
    /// approval denied, remediation failed, or verification failed).
    Closed,
}

/// The incident aggregate.
///
/// # Invariants
/// - `fingerprint` is unique among open incidents within the dedup TTL
///   window (I1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Incident identifier.
    pub id: IncidentId,
    /// Stable dedup fingerprint.
    pub fingerprint: Fingerprint,
    /// Human-readable title.
    pub title: String,
    /// Normalized severity.
    pub severity: Severity,
    /// Lifecycle status.
    pub status: IncidentStatus,
    /// Alert source identifier (e.g. `"alertmanager"`, `"grafana"`, `"manual"`).
    pub source: String,
    /// Cluster the alert originated from.
    pub cluster: ClusterId,
    /// Namespace the alert originated from.
    pub namespace: NamespaceId,
    /// Optional service name.
    pub service: Option<ServiceId>,
    /// Alert labels.
    pub labels: BTreeMap<String, String>,
    /// Alert annotations.
    pub annotations: BTreeMap<String, String>,
    /// When the underlying condition started, per the alert payload.
    pub started_at: Timestamp,
    /// When this incident row was created.
    pub created_at: Timestamp,
    /// When this incident row was last updated.
    pub updated_at: Timestamp,
}

impl Incident {
    /// Builds the title per `spec.md` §4.1: `"<alertname>: <pod>"` if a pod
    /// label exists, else `"<alertname>: <service>"`, else `<alertname>`.
    #[must_use]
    pub fn derive_title(alertname: &str, labels: &BTreeMap<String, String>) -> String {
        if let Some(pod) = labels.get("pod") {
            return format!("{alertname}: {pod}");
        }
        if let Some(service) = labels.get("service") {
            return format!("{alertname}: {service}");
        }
        alertname.to_string()
    }
}
