// crates/aiops-rules/src/signals.rs
// ============================================================================
// Module: Signal Bundle Extraction
// Description: Reduces an incident's evidence list into the discrete signal
//              bundle the rule catalog matches against.
// Purpose: Give every rule a single, flat shape to read instead of each
//          re-parsing `Evidence::data` itself.
// Dependencies: aiops-core
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use aiops_core::Evidence;
use aiops_core::EvidenceId;

/// Flat signal bundle extracted from an incident's evidence list, matched
/// against the static rule catalog (`spec.md` §4.4).
///
/// # Invariants
/// - `evidence_ids` is in the same order as the input evidence list.
#[derive(Debug, Clone, Default)]
pub struct SignalBundle {
    /// Container waiting reasons seen (e.g. `CrashLoopBackOff`, `ImagePullBackOff`).
    pub waiting_reasons: BTreeSet<String>,
    /// Container terminated reasons seen (e.g. `OOMKilled`, `Error`).
    pub terminated_reasons: BTreeSet<String>,
    /// Log line patterns matched by collectors (e.g. `connection refused`).
    pub log_patterns: BTreeSet<String>,
    /// Whether a deploy/config change landed within the collection window.
    pub has_recent_deploy: bool,
    /// Whether the recent change touched the container image.
    pub has_image_change: bool,
    /// Whether memory usage crossed the collector's high-usage threshold.
    pub memory_usage_high: bool,
    /// Whether the service's HPA is pinned at `maxReplicas`.
    pub hpa_at_max: bool,
    /// Whether p99 latency crossed the collector's high-latency threshold.
    pub latency_high: bool,
    /// Unhealthy node conditions, keyed by node name.
    pub node_issues: BTreeMap<String, Vec<String>>,
    /// Total container restart count across affected pods.
    pub restart_count: u32,
    /// Total error count observed in logs/metrics.
    pub error_count: u32,
    /// Evidence ids that contributed to this bundle, in collection order.
    pub evidence_ids: Vec<EvidenceId>,
}

fn str_field<'a>(data: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(serde_json::Value::as_str)
}

fn bool_field(data: &serde_json::Value, key: &str) -> bool {
    data.get(key).and_then(serde_json::Value::as_bool).unwrap_or(false)
}

fn u32_field(data: &serde_json::Value, key: &str) -> u32 {
    data.get(key)
        .and_then(serde_json::Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

fn str_array_field<'a>(data: &'a serde_json::Value, key: &str) -> impl Iterator<Item = &'a str> {
    data.get(key).and_then(serde_json::Value::as_array).into_iter().flatten().filter_map(serde_json::Value::as_str)
}

/// Extracts a [`SignalBundle`] from an incident's evidence list.
///
/// Each collector's `Evidence::data` payload is read defensively: a missing
/// or mis-typed field contributes nothing rather than failing the whole
/// extraction, matching the collectors' "partial evidence over hard
/// failure" contract (see `aiops_core::interfaces::Collector::collect`).
#[must_use]
pub fn extract(evidence: &[Evidence]) -> SignalBundle {
    let mut bundle = SignalBundle::default();
    for item in evidence {
        bundle.evidence_ids.push(item.id.clone());
        let data = &item.data;

        if let Some(reason) = str_field(data, "waiting_reason") {
            bundle.waiting_reasons.insert(reason.to_string());
        }
        for reason in str_array_field(data, "waiting_reasons") {
            bundle.waiting_reasons.insert(reason.to_string());
        }
        if let Some(reason) = str_field(data, "terminated_reason") {
            bundle.terminated_reasons.insert(reason.to_string());
        }
        for reason in str_array_field(data, "terminated_reasons") {
            bundle.terminated_reasons.insert(reason.to_string());
        }
        for pattern in str_array_field(data, "log_patterns") {
            bundle.log_patterns.insert(pattern.to_string());
        }

        if bool_field(data, "has_recent_deploy") {
            bundle.has_recent_deploy = true;
        }
        if bool_field(data, "has_image_change") {
            bundle.has_image_change = true;
        }
        if bool_field(data, "memory_usage_high") {
            bundle.memory_usage_high = true;
        }
        if bool_field(data, "hpa_at_max") {
            bundle.hpa_at_max = true;
        }
        if bool_field(data, "latency_high") {
            bundle.latency_high = true;
        }

        if let Some(node_name) = str_field(data, "node_name") {
            let conditions: Vec<String> =
                str_array_field(data, "node_conditions").map(ToString::to_string).collect();
            bundle.node_issues.entry(node_name.to_string()).or_default().extend(conditions);
        }

        bundle.restart_count = bundle.restart_count.saturating_add(u32_field(data, "restart_count"));
        bundle.error_count = bundle.error_count.saturating_add(u32_field(data, "error_count"));
    }
    bundle
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use aiops_core::EvidenceType;
    use aiops_core::IncidentId;
    use aiops_core::TimeWindow;
    use aiops_core::Timestamp;
    use serde_json::json;

    use super::*;

    fn evidence(data: serde_json::Value) -> Evidence {
        let now = Timestamp::now();
        Evidence {
            id: EvidenceId::new(aiops_core::new_uuid_string()),
            incident_id: IncidentId::new("inc-1"),
            evidence_type: EvidenceType::ClusterState,
            source: "cluster-api".to_string(),
            entity_name: "api-1".to_string(),
            entity_namespace: "default".to_string(),
            data,
            signal_strength: 1.0,
            time_window: TimeWindow::new(now, now),
            collected_at: now,
        }
    }

    #[test]
    fn aggregates_waiting_reasons_and_restart_counts_across_evidence() {
        let items = vec![
            evidence(json!({"waiting_reason": "CrashLoopBackOff", "restart_count": 4})),
            evidence(json!({"waiting_reason": "ImagePullBackOff", "restart_count": 2})),
        ];
        let bundle = extract(&items);
        assert_eq!(bundle.waiting_reasons.len(), 2);
        assert_eq!(bundle.restart_count, 6);
        assert_eq!(bundle.evidence_ids.len(), 2);
    }

    #[test]
    fn missing_fields_contribute_nothing() {
        let items = vec![evidence(json!({}))];
        let bundle = extract(&items);
        assert!(bundle.waiting_reasons.is_empty());
        assert!(!bundle.has_recent_deploy);
        assert_eq!(bundle.restart_count, 0);
    }

    #[test]
    fn node_issues_collect_conditions_per_node() {
        let items = vec![evidence(json!({
            "node_name": "node-a",
            "node_conditions": ["DiskPressure", "MemoryPressure"],
        }))];
        let bundle = extract(&items);
        assert_eq!(bundle.node_issues.get("node-a").unwrap().len(), 2);
    }
}
