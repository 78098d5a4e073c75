// crates/aiops-rules/src/catalog.rs
// ============================================================================
// Module: Rule Catalog
// Description: The fixed, static diagnostic rule catalog named in spec.md
//              §4.4. No DSL: conditions are plain predicate functions over
//              a SignalBundle.
// Purpose: Match a signal bundle against every rule and score matches.
// Dependencies: crate::signals, aiops-core
// ============================================================================

use aiops_core::ActionType;
use aiops_core::Category;
use aiops_core::log_patterns;

use crate::signals::SignalBundle;

/// One typed condition a rule requires, with its fixed strength
/// contribution (`spec.md` §4.4's condition table).
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Any of `reasons` intersects `SignalBundle::waiting_reasons`.
    WaitingReason(&'static [&'static str]),
    /// Any of `reasons` intersects `SignalBundle::terminated_reasons`.
    TerminatedReason(&'static [&'static str]),
    /// `SignalBundle::has_recent_deploy` is true.
    RecentDeploy,
    /// `SignalBundle::has_recent_deploy` is false.
    NoRecentDeploy,
    /// `SignalBundle::memory_usage_high` is true.
    MemoryUsageHigh,
    /// `SignalBundle::hpa_at_max` is true.
    HpaAtMax,
    /// `SignalBundle::latency_high` is true.
    LatencyHigh,
    /// Any of `patterns` intersects `SignalBundle::log_patterns`.
    LogPattern(&'static [&'static str]),
    /// `SignalBundle::node_issues` has at least one entry.
    NodeUnhealthy,
}

impl Condition {
    /// Strength contribution when this condition kind matches (`spec.md`
    /// §4.4's condition table).
    #[must_use]
    pub const fn strength(self) -> f64 {
        match self {
            Self::WaitingReason(_) | Self::TerminatedReason(_) => 0.90,
            Self::RecentDeploy => 0.80,
            Self::NoRecentDeploy => 0.60,
            Self::MemoryUsageHigh => 0.85,
            Self::HpaAtMax => 0.75,
            Self::LatencyHigh => 0.70,
            Self::LogPattern(_) => 0.65,
            Self::NodeUnhealthy => 0.80,
        }
    }

    /// Whether this condition matches `bundle`.
    #[must_use]
    pub fn matches(self, bundle: &SignalBundle) -> bool {
        match self {
            Self::WaitingReason(reasons) => reasons.iter().any(|reason| bundle.waiting_reasons.contains(*reason)),
            Self::TerminatedReason(reasons) => {
                reasons.iter().any(|reason| bundle.terminated_reasons.contains(*reason))
            }
            Self::RecentDeploy => bundle.has_recent_deploy,
            Self::NoRecentDeploy => !bundle.has_recent_deploy,
            Self::MemoryUsageHigh => bundle.memory_usage_high,
            Self::HpaAtMax => bundle.hpa_at_max,
            Self::LatencyHigh => bundle.latency_high,
            Self::LogPattern(patterns) => patterns.iter().any(|pattern| bundle.log_patterns.contains(*pattern)),
            Self::NodeUnhealthy => !bundle.node_issues.is_empty(),
        }
    }
}

/// A static diagnostic rule: fires only when every condition matches.
#[derive(Debug, Clone, Copy)]
pub struct RuleDefinition {
    /// Stable rule identifier, surfaced on the resulting [`aiops_core::Hypothesis::rule_id`].
    pub id: &'static str,
    /// Conditions that must all match for this rule to fire.
    pub conditions: &'static [Condition],
    /// Root-cause category this rule explains.
    pub category: Category,
    /// Base confidence before the `avgStrength` blend (`spec.md` §4.4).
    pub base_confidence: f64,
    /// Human-readable title template.
    pub title: &'static str,
    /// Human-readable description template.
    pub description: &'static str,
    /// Recommended remediation actions, in priority order.
    pub recommended_actions: &'static [ActionType],
}

/// The fixed rule catalog named in `spec.md` §4.4, in catalog order. Order
/// matters only for the stable-by-insertion tie-break the Ranker applies to
/// hypotheses with equal `final` scores.
pub static RULE_CATALOG: &[RuleDefinition] = &[
    RuleDefinition {
        id: "crashloop_recent_deploy",
        conditions: &[Condition::WaitingReason(&["CrashLoopBackOff"]), Condition::RecentDeploy],
        category: Category::BadDeployment,
        base_confidence: 0.90,
        title: "Crash loop following a recent deploy",
        description: "The pod is crash-looping and a deploy or config change landed within the collection window.",
        recommended_actions: &[ActionType::RollbackDeployment, ActionType::RestartPod],
    },
    RuleDefinition {
        id: "crashloop_no_change",
        conditions: &[Condition::WaitingReason(&["CrashLoopBackOff"]), Condition::NoRecentDeploy],
        category: Category::ExternalDependency,
        base_confidence: 0.75,
        title: "Crash loop with no recent change",
        description: "The pod is crash-looping but no deploy or config change preceded it; a dependency is likely at fault.",
        recommended_actions: &[ActionType::RestartPod],
    },
    RuleDefinition {
        id: "oom_killed",
        conditions: &[Condition::TerminatedReason(&["OOMKilled"])],
        category: Category::ResourceExhaustion,
        base_confidence: 0.95,
        title: "Container killed for exceeding its memory limit",
        description: "The container was terminated with reason OOMKilled.",
        recommended_actions: &[ActionType::RestartPod, ActionType::ScaleReplicas],
    },
    RuleDefinition {
        id: "oom_high_memory",
        conditions: &[Condition::MemoryUsageHigh],
        category: Category::ResourceExhaustion,
        base_confidence: 0.80,
        title: "Memory usage approaching the container limit",
        description: "Memory usage crossed the collector's high-usage threshold without an observed OOM kill yet.",
        recommended_actions: &[ActionType::ScaleReplicas, ActionType::RestartPod],
    },
    RuleDefinition {
        id: "image_pull_failure",
        conditions: &[Condition::WaitingReason(&["ImagePullBackOff", "ErrImagePull"])],
        category: Category::ConfigurationError,
        base_confidence: 0.95,
        title: "Container image cannot be pulled",
        description: "The pod is waiting on ImagePullBackOff or ErrImagePull.",
        recommended_actions: &[ActionType::RollbackDeployment],
    },
    RuleDefinition {
        id: "node_failure_isolated",
        conditions: &[Condition::NodeUnhealthy],
        category: Category::InfrastructureIssue,
        base_confidence: 0.85,
        title: "Node reporting unhealthy conditions",
        description: "One or more nodes scheduling affected pods report unhealthy conditions.",
        recommended_actions: &[ActionType::CordonNode],
    },
    RuleDefinition {
        id: "hpa_maxed",
        conditions: &[Condition::HpaAtMax],
        category: Category::ScalingIssue,
        base_confidence: 0.80,
        title: "Autoscaler pinned at its maximum replica count",
        description: "The service's HPA is at maxReplicas and cannot scale further.",
        recommended_actions: &[ActionType::ScaleReplicas],
    },
    RuleDefinition {
        id: "readiness_probe_failing",
        conditions: &[Condition::LogPattern(&[log_patterns::CONNECTION_REFUSED, log_patterns::READINESS_PROBE_FAILED])],
        category: Category::DependencyFailure,
        base_confidence: 0.75,
        title: "Readiness probe failing against a downstream dependency",
        description: "Logs show connection failures consistent with a failing readiness probe.",
        recommended_actions: &[ActionType::RestartPod],
    },
    RuleDefinition {
        id: "config_error",
        conditions: &[Condition::WaitingReason(&["CreateContainerConfigError"])],
        category: Category::ConfigurationError,
        base_confidence: 0.90,
        title: "Container cannot start due to a config error",
        description: "The pod is waiting on CreateContainerConfigError.",
        recommended_actions: &[ActionType::RollbackDeployment],
    },
    RuleDefinition {
        id: "network_error",
        conditions: &[Condition::LogPattern(&[log_patterns::IO_TIMEOUT, log_patterns::DIAL_TCP])],
        category: Category::NetworkIssue,
        base_confidence: 0.70,
        title: "Network-layer errors in application logs",
        description: "Logs show timeout or dial errors consistent with a network-layer failure.",
        recommended_actions: &[ActionType::RestartPod],
    },
];

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn catalog_has_exactly_the_ten_named_rules() {
        let ids: Vec<&str> = RULE_CATALOG.iter().map(|rule| rule.id).collect();
        assert_eq!(
            ids,
            vec![
                "crashloop_recent_deploy",
                "crashloop_no_change",
                "oom_killed",
                "oom_high_memory",
                "image_pull_failure",
                "node_failure_isolated",
                "hpa_maxed",
                "readiness_probe_failing",
                "config_error",
                "network_error",
            ]
        );
    }

    #[test]
    fn every_rule_requires_at_least_one_condition() {
        assert!(RULE_CATALOG.iter().all(|rule| !rule.conditions.is_empty()));
    }

    #[test]
    fn log_pattern_conditions_match_the_shared_pattern_constants() {
        let mut bundle = SignalBundle::default();
        bundle.log_patterns.insert(log_patterns::CONNECTION_REFUSED.to_string());
        let readiness_rule = RULE_CATALOG.iter().find(|rule| rule.id == "readiness_probe_failing").expect("rule exists");
        assert!(readiness_rule.conditions.iter().all(|condition| condition.matches(&bundle)));

        let mut bundle = SignalBundle::default();
        bundle.log_patterns.insert(log_patterns::DIAL_TCP.to_string());
        let network_rule = RULE_CATALOG.iter().find(|rule| rule.id == "network_error").expect("rule exists");
        assert!(network_rule.conditions.iter().all(|condition| condition.matches(&bundle)));
    }
}
