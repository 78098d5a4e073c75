// crates/aiops-broker/src/ingest.rs
// ============================================================================
// Module: Alert Normalization
// Description: Maps alert-manager-shaped webhook payloads into Incident rows.
// Purpose: Shared normalization for the alertmanager and grafana webhooks.
// Dependencies: aiops-core, serde, serde_json
// ============================================================================

use std::collections::BTreeMap;

use aiops_core::ClusterId;
use aiops_core::Fingerprint;
use aiops_core::Incident;
use aiops_core::IncidentId;
use aiops_core::IncidentStatus;
use aiops_core::NamespaceId;
use aiops_core::ServiceId;
use aiops_core::Severity;
use aiops_core::Timestamp;
use aiops_core::compute_fingerprint;
use aiops_core::new_uuid_string;
use serde::Deserialize;
use serde::Serialize;

/// A single alert as delivered by an alertmanager-shaped webhook.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAlert {
    /// `"firing"` or `"resolved"`.
    pub status: String,
    /// Alert labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Alert annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// When the underlying condition started, RFC 3339.
    #[serde(rename = "startsAt")]
    pub starts_at: String,
    /// When the underlying condition ended, RFC 3339, if resolved.
    #[serde(rename = "endsAt", default)]
    pub ends_at: Option<String>,
}

/// The alertmanager/grafana webhook envelope (`spec.md` §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertmanagerPayload {
    /// Overall batch status (unused for normalization, carried for parity
    /// with the upstream schema).
    #[serde(default)]
    pub status: String,
    /// Individual alerts in the batch.
    pub alerts: Vec<RawAlert>,
}

/// Merges Grafana's `commonLabels`/`commonAnnotations` into every alert in
/// the batch, per `spec.md` §6's "behavior identical" note for the grafana
/// webhook. Per-alert keys win on conflict.
pub fn merge_common_fields(
    mut payload: AlertmanagerPayload,
    common_labels: &BTreeMap<String, String>,
    common_annotations: &BTreeMap<String, String>,
) -> AlertmanagerPayload {
    for alert in &mut payload.alerts {
        for (key, value) in common_labels {
            alert.labels.entry(key.clone()).or_insert_with(|| value.clone());
        }
        for (key, value) in common_annotations {
            alert.annotations.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    payload
}

/// Normalizes a single [`RawAlert`] into a fresh [`Incident`], per `spec.md`
/// §4.1.
///
/// The `alertname` label defaults to `"unknown_alert"` when absent, which
/// keeps normalization total rather than fallible.
#[must_use]
pub fn normalize_alert(alert: &RawAlert, source: &str, cluster: &str) -> Incident {
    let alertname = alert.labels.get("alertname").map_or("unknown_alert", String::as_str);
    let namespace = alert.labels.get("namespace").map_or("", String::as_str);
    let service = alert.labels.get("service").map(String::as_str);
    let severity_raw = alert.labels.get("severity").map_or("", String::as_str);

    let fingerprint = compute_fingerprint(source, alertname, namespace, service);
    let title = Incident::derive_title(alertname, &alert.labels);
    let started_at = Timestamp::parse_rfc3339_or_now(&alert.starts_at);
    let now = Timestamp::now();

    Incident {
        id: IncidentId::new(new_uuid_string()),
        fingerprint,
        title,
        severity: Severity::from_raw(severity_raw),
        status: IncidentStatus::Open,
        source: source.to_string(),
        cluster: ClusterId::new(cluster),
        namespace: NamespaceId::new(namespace),
        service: service.map(ServiceId::new),
        labels: alert.labels.clone(),
        annotations: alert.annotations.clone(),
        started_at,
        created_at: now,
        updated_at: now,
    }
}

/// Stable dedup key used by the fingerprint cache, `"aiops:fingerprint:<fp>"`
/// (`spec.md` §6's persisted-state key scheme).
#[must_use]
pub fn fingerprint_cache_key(fingerprint: &Fingerprint) -> String {
    format!("aiops:fingerprint:{}", fingerprint.as_str())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    fn alert_with(labels: &[(&str, &str)]) -> RawAlert {
        RawAlert {
            status: "firing".to_string(),
            labels: labels.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
            annotations: BTreeMap::new(),
            starts_at: "2026-01-05T05:00:00Z".to_string(),
            ends_at: None,
        }
    }

    #[test]
    fn derives_title_from_pod_label() {
        let alert = alert_with(&[("alertname", "PodCrashLooping"), ("pod", "api-7d-xyz")]);
        let incident = normalize_alert(&alert, "alertmanager", "prod-1");
        assert_eq!(incident.title, "PodCrashLooping: api-7d-xyz");
        assert_eq!(incident.severity, Severity::Medium);
    }

    #[test]
    fn falls_back_to_now_on_unparseable_starts_at() {
        let mut alert = alert_with(&[("alertname", "X")]);
        alert.starts_at = "not-a-timestamp".to_string();
        let incident = normalize_alert(&alert, "alertmanager", "prod-1");
        assert!(incident.started_at.unix_timestamp() > 0);
    }

    #[test]
    fn fingerprint_is_stable_for_identical_inputs() {
        let alert = alert_with(&[("alertname", "PodCrashLooping"), ("namespace", "default"), ("service", "api")]);
        let a = normalize_alert(&alert, "alertmanager", "prod-1");
        let b = normalize_alert(&alert, "alertmanager", "prod-1");
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn merges_common_fields_without_overwriting_per_alert_values() {
        let mut common_labels = BTreeMap::new();
        common_labels.insert("namespace".to_string(), "default".to_string());
        common_labels.insert("cluster".to_string(), "prod-1".to_string());
        let payload = AlertmanagerPayload {
            status: "firing".to_string(),
            alerts: vec![alert_with(&[("alertname", "X"), ("namespace", "override")])],
        };
        let merged = merge_common_fields(payload, &common_labels, &BTreeMap::new());
        assert_eq!(merged.alerts[0].labels.get("namespace").unwrap(), "override");
        assert_eq!(merged.alerts[0].labels.get("cluster").unwrap(), "prod-1");
    }
}
