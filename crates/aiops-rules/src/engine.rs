// crates/aiops-rules/src/engine.rs
// ============================================================================
// Module: Rules Engine
// Description: Matches a signal bundle against the static rule catalog and
//              builds candidate hypotheses.
// Purpose: Implement spec.md §4.4's confidence formula and unknown-rule
//          fallback.
// Dependencies: crate::{catalog, signals}, aiops-core
// ============================================================================

use aiops_core::Category;
use aiops_core::Evidence;
use aiops_core::Hypothesis;
use aiops_core::HypothesisId;
use aiops_core::IncidentId;
use aiops_core::new_uuid_string;

use crate::catalog::RULE_CATALOG;
use crate::catalog::RuleDefinition;
use crate::signals::SignalBundle;
use crate::signals::extract;

/// Confidence contribution threshold above which `spec.md` §4.4's "more
/// than two conditions matched" bonus applies.
const BONUS_CONDITION_COUNT: usize = 2;
const BONUS_MULTIPLIER: f64 = 1.1;
const CONFIDENCE_CAP: f64 = 0.99;
const UNKNOWN_CONFIDENCE: f64 = 0.30;

fn rule_confidence(rule: &RuleDefinition) -> f64 {
    let avg_strength =
        rule.conditions.iter().map(|condition| condition.strength()).sum::<f64>() / rule.conditions.len() as f64;
    let confidence = 0.6 * rule.base_confidence + 0.4 * avg_strength;
    if rule.conditions.len() > BONUS_CONDITION_COUNT {
        (confidence * BONUS_MULTIPLIER).min(CONFIDENCE_CAP)
    } else {
        confidence.min(CONFIDENCE_CAP)
    }
}

fn average_signal_strength(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    evidence.iter().map(|item| item.signal_strength).sum::<f64>() / evidence.len() as f64
}

fn build_hypothesis(
    incident_id: &IncidentId,
    rule: Option<&RuleDefinition>,
    bundle: &SignalBundle,
    evidence: &[Evidence],
) -> Hypothesis {
    let signal_strength = average_signal_strength(evidence);
    let support_count = u32::try_from(bundle.evidence_ids.len()).unwrap_or(u32::MAX);
    match rule {
        Some(rule) => Hypothesis {
            id: HypothesisId::new(new_uuid_string()),
            incident_id: incident_id.clone(),
            category: rule.category,
            title: rule.title.to_string(),
            description: rule.description.to_string(),
            confidence: rule_confidence(rule),
            rank: None,
            supporting_evidence_ids: bundle.evidence_ids.clone(),
            support_count,
            signal_strength,
            recommended_actions: rule.recommended_actions.to_vec(),
            generator_tag: "rule".to_string(),
            rule_id: Some(rule.id.to_string()),
        },
        None => Hypothesis {
            id: HypothesisId::new(new_uuid_string()),
            incident_id: incident_id.clone(),
            category: Category::Unknown,
            title: "Cause not determined by the rule catalog".to_string(),
            description: "No diagnostic rule matched the collected evidence.".to_string(),
            confidence: UNKNOWN_CONFIDENCE,
            rank: None,
            supporting_evidence_ids: bundle.evidence_ids.clone(),
            support_count,
            signal_strength,
            recommended_actions: vec![aiops_core::ActionType::RestartPod],
            generator_tag: "fallback".to_string(),
            rule_id: None,
        },
    }
}

/// Matches `evidence` against the static rule catalog and returns one
/// hypothesis per firing rule, in catalog order. When no rule fires,
/// returns a single `unknown` hypothesis (`spec.md` §4.4).
///
/// Ranks are left unset; call [`crate::ranker::rank`] to assign them.
#[must_use]
pub fn generate_hypotheses(incident_id: &IncidentId, evidence: &[Evidence]) -> Vec<Hypothesis> {
    let bundle = extract(evidence);
    let fired: Vec<&RuleDefinition> = RULE_CATALOG.iter().filter(|rule| rule.conditions.iter().all(|c| c.matches(&bundle))).collect();
    if fired.is_empty() {
        tracing::debug!(incident_id = %incident_id, "no rule fired, emitting unknown hypothesis");
        return vec![build_hypothesis(incident_id, None, &bundle, evidence)];
    }
    fired.into_iter().map(|rule| build_hypothesis(incident_id, Some(rule), &bundle, evidence)).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use aiops_core::EvidenceId;
    use aiops_core::EvidenceType;
    use aiops_core::TimeWindow;
    use aiops_core::Timestamp;
    use serde_json::json;

    use super::*;

    fn evidence(data: serde_json::Value, signal_strength: f64) -> Evidence {
        let now = Timestamp::now();
        Evidence {
            id: EvidenceId::new(new_uuid_string()),
            incident_id: IncidentId::new("inc-1"),
            evidence_type: EvidenceType::ClusterState,
            source: "cluster-api".to_string(),
            entity_name: "api-1".to_string(),
            entity_namespace: "default".to_string(),
            data,
            signal_strength,
            time_window: TimeWindow::new(now, now),
            collected_at: now,
        }
    }

    #[test]
    fn crashloop_with_recent_deploy_fires_bad_deployment_rule() {
        let incident_id = IncidentId::new("inc-1");
        let evidence = vec![
            evidence(json!({"waiting_reason": "CrashLoopBackOff"}), 0.9),
            evidence(json!({"has_recent_deploy": true}), 0.8),
        ];
        let hypotheses = generate_hypotheses(&incident_id, &evidence);
        assert_eq!(hypotheses.len(), 1);
        assert_eq!(hypotheses[0].rule_id.as_deref(), Some("crashloop_recent_deploy"));
        assert_eq!(hypotheses[0].category, Category::BadDeployment);
        assert!(hypotheses[0].confidence <= CONFIDENCE_CAP);
    }

    #[test]
    fn oom_killed_and_hpa_maxed_both_fire_independently() {
        let incident_id = IncidentId::new("inc-1");
        let evidence =
            vec![evidence(json!({"terminated_reason": "OOMKilled", "hpa_at_max": true}), 0.9)];
        let hypotheses = generate_hypotheses(&incident_id, &evidence);
        let rule_ids: Vec<&str> = hypotheses.iter().filter_map(|h| h.rule_id.as_deref()).collect();
        assert!(rule_ids.contains(&"oom_killed"));
        assert!(rule_ids.contains(&"hpa_maxed"));
    }

    #[test]
    fn no_matching_rule_emits_unknown_hypothesis() {
        let incident_id = IncidentId::new("inc-1");
        let evidence = vec![evidence(json!({}), 0.5)];
        let hypotheses = generate_hypotheses(&incident_id, &evidence);
        assert_eq!(hypotheses.len(), 1);
        assert_eq!(hypotheses[0].category, Category::Unknown);
        assert!((hypotheses[0].confidence - UNKNOWN_CONFIDENCE).abs() < f64::EPSILON);
    }
}
