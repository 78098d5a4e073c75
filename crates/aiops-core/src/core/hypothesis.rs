// crates/aiops-core/src/core/hypothesis.rs
// ============================================================================
// Module: Hypothesis
// Description: A ranked explanation of an incident's root cause, produced by
//              the Rules Engine and ordered by the Ranker.
// Purpose: Carry enough structure for the Runbook Generator to pick templates
//          without re-deriving anything the rule already computed.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::IncidentId;

/// Root-cause category, used both for display and as the Ranker's
/// `categoryWeight` lookup key (`spec.md` §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Resource exhaustion (CPU/memory/disk); weight 1.20.
    ResourceExhaustion,
    /// A bad deploy or config change; weight 1.15.
    BadDeployment,
    /// A misconfiguration (bad image, bad config map, ...); weight 1.10.
    ConfigurationError,
    /// Node or cluster infrastructure failure; weight 1.05.
    InfrastructureIssue,
    /// A downstream dependency failure; weight 1.00.
    DependencyFailure,
    /// A network-layer failure; weight 0.95.
    NetworkIssue,
    /// Traffic spike or autoscaler saturation; weight 0.90.
    ScalingIssue,
    /// A security-relevant condition; weight 0.85.
    SecurityIssue,
    /// An external (off-cluster) dependency failure; weight 0.80.
    ExternalDependency,
    /// A data-layer issue (corruption, migration, ...); weight 0.75.
    DataIssue,
    /// No rule matched with sufficient confidence; weight 0.50.
    Unknown,
}

impl Category {
    /// The Ranker's fixed `categoryWeight` table (`spec.md` §4.5).
    #[must_use]
    pub const fn ranker_weight(self) -> f64 {
        match self {
            Self::ResourceExhaustion => 1.20,
            Self::BadDeployment => 1.15,
            Self::ConfigurationError => 1.10,
            Self::InfrastructureIssue => 1.05,
            Self::DependencyFailure => 1.00,
            Self::NetworkIssue => 0.95,
            Self::ScalingIssue => 0.90,
            Self::SecurityIssue => 0.85,
            Self::ExternalDependency => 0.80,
            Self::DataIssue => 0.75,
            Self::Unknown => 0.50,
        }
    }
}

/// A candidate explanation for an incident's root cause.
///
/// # Invariants
/// - `confidence` is within `[0.0, 1.0]`.
/// - `rank` starts at `1` for the top hypothesis and is assigned by the
///   Ranker, stable-by-insertion on ties (see Open Question resolution in
///   `DESIGN.md`); `None` before ranking has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Hypothesis identifier.
    pub id: HypothesisId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Root-cause category.
    pub category: Category,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-form explanation.
    pub description: String,
    /// Confidence that this hypothesis explains the incident, `[0.0, 1.0]`.
    pub confidence: f64,
    /// Position after ranking; `1` is the top hypothesis. `None` before
    /// ranking has run.
    pub rank: Option<u32>,
    /// Evidence items this hypothesis cites.
    pub supporting_evidence_ids: Vec<EvidenceId>,
    /// Number of distinct evidence items that support this hypothesis;
    /// equal to `supporting_evidence_ids.len()`.
    pub support_count: u32,
    /// Sum of supporting evidence's `signal_strength`.
    pub signal_strength: f64,
    /// Remediation action types this hypothesis recommends, in priority
    /// order.
    pub recommended_actions: Vec<crate::core::remediation::ActionType>,
    /// Free-form tag identifying which generator logic produced this
    /// hypothesis (e.g. `"rule"` or `"fallback"`).
    pub generator_tag: String,
    /// Identifier of the static rule that produced this hypothesis, if any.
    pub rule_id: Option<String>,
}

impl Hypothesis {
    /// Computes the Ranker's `final` score (`spec.md` §4.5):
    /// `confidence * categoryWeight * (1 + 0.05*min(supportCount,5)) *
    /// (1 + 0.20*signalStrength)`.
    #[must_use]
    pub fn ranking_score(&self) -> f64 {
        let support_bonus = 1.0 + 0.05 * f64::from(self.support_count.min(5));
        let signal_bonus = 1.0 + 0.20 * self.signal_strength;
        self.confidence * self.category.ranker_weight() * support_bonus * signal_bonus
    }
}
