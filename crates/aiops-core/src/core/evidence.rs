// crates/aiops-core/src/core/evidence.rs
// ============================================================================
// Module: Evidence
// Description: Evidence records gathered by collectors during investigation.
// Purpose: Give every collector a single, uniform shape to emit so the
//          rules engine never has to special-case a collector's source.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::IncidentId;
use crate::core::time::Timestamp;

/// The collector family that produced a piece of evidence.
///
/// # Invariants
/// - Matches one of the four collectors named in `spec.md` §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    /// Pod/deployment/node state from the cluster API.
    ClusterState,
    /// Recent log lines from the log store.
    Logs,
    /// Time-series samples from the metrics store.
    Metrics,
    /// Recent deploys/config changes from the change history source.
    ChangeHistory,
}

/// A single piece of evidence collected for an incident.
///
/// # Invariants
/// - `signal_strength` is within `[0.0, 1.0]` (I4 in `spec.md` §3).
/// - `collected_at` falls within `time_window` plus the collector's
///   allowed clock-skew epsilon (I3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Evidence identifier.
    pub id: EvidenceId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Which collector produced this evidence.
    pub evidence_type: EvidenceType,
    /// Collector-defined source label (e.g. `"cluster-api"`,
    /// `"loki"`, `"prometheus"`, `"argo-rollouts"`).
    pub source: String,
    /// Name of the entity this evidence is about (a pod, deployment,
    /// node, ...).
    pub entity_name: String,
    /// Namespace of the entity this evidence is about; empty for
    /// cluster-scoped entities.
    pub entity_namespace: String,
    /// Free-form, collector-defined raw payload (e.g. raw log lines, a
    /// metric series, a pod status snapshot), opaque to the rules engine.
    pub data: Value,
    /// How strongly this evidence supports whatever hypothesis cites it,
    /// in `[0.0, 1.0]`. Collector-specific; see each collector's table in
    /// `spec.md` §4.2.
    pub signal_strength: f64,
    /// The time window this evidence was collected over.
    pub time_window: crate::core::time::TimeWindow,
    /// When this evidence record was produced.
    pub collected_at: Timestamp,
}

impl Evidence {
    /// Clamps `signal_strength` into `[0.0, 1.0]`, as required by I4.
    ///
    /// Collectors should call this before constructing an [`Evidence`]
    /// rather than trusting an upstream source's scale.
    #[must_use]
    pub fn clamp_signal_strength(raw: f64) -> f64 {
        raw.clamp(0.0, 1.0)
    }
}
