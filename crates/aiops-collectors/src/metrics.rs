// crates/aiops-collectors/src/metrics.rs
// ============================================================================
// Module: Metrics Collector
// Description: Runs a fixed catalog of range queries against the metrics
//              store and reduces each series into evidence.
// Purpose: Turn time-series data into evidence scored against per-metric
//          threshold tables, decimated to a bounded point count.
// Dependencies: crate::metrics_client, aiops-core
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use aiops_core::CollectionOutcome;
use aiops_core::Collector;
use aiops_core::CollectorContext;
use aiops_core::CollectorError;
use aiops_core::Evidence;
use aiops_core::EvidenceType;
use aiops_core::Incident;
use aiops_core::Timestamp;
use aiops_core::new_uuid_string;
use async_trait::async_trait;

use crate::metrics_client::MetricSeries;
use crate::metrics_client::MetricsStoreClient;

/// The maximum number of samples kept in a decimated series returned to the
/// rules engine.
const MAX_METRIC_POINTS: usize = 500;
const MIN_STEP_SECONDS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricKind {
    ResourceUsage,
    ErrorRate,
    Latency,
    RestartCount,
    HpaReplicaRatio,
}

impl MetricKind {
    fn signal_strength(self, last_value: f64) -> f64 {
        match self {
            Self::ResourceUsage => {
                if last_value > 90.0 {
                    0.9
                } else if last_value > 75.0 {
                    0.7
                } else if last_value > 50.0 {
                    0.5
                } else {
                    0.3
                }
            }
            Self::ErrorRate => {
                if last_value > 0.10 {
                    0.9
                } else if last_value > 0.05 {
                    0.7
                } else if last_value > 0.01 {
                    0.5
                } else {
                    0.2
                }
            }
            Self::Latency => {
                if last_value > 2.0 {
                    0.9
                } else if last_value > 1.0 {
                    0.7
                } else if last_value > 0.5 {
                    0.5
                } else {
                    0.2
                }
            }
            Self::RestartCount => {
                if last_value > 5.0 {
                    0.9
                } else if last_value > 2.0 {
                    0.6
                } else if last_value > 0.0 {
                    0.4
                } else {
                    0.2
                }
            }
            Self::HpaReplicaRatio => {
                if last_value >= 1.0 {
                    0.8
                } else if last_value >= 0.8 {
                    0.6
                } else {
                    0.3
                }
            }
        }
    }
}

struct QueryTemplate {
    name: &'static str,
    template: &'static str,
    kind: MetricKind,
    /// When `Some`, the query only runs if the incident's title or
    /// alertname label contains this keyword (case-insensitive).
    keyword_gate: Option<&'static str>,
}

const QUERY_CATALOG: &[QueryTemplate] = &[
    QueryTemplate {
        name: "deployment_replica_availability",
        template: r#"kube_deployment_status_replicas_unavailable{namespace="{{namespace}}",deployment="{{deployment}}"}"#,
        kind: MetricKind::ResourceUsage,
        keyword_gate: None,
    },
    QueryTemplate {
        name: "container_memory_usage_percent",
        template: r#"100 * container_memory_working_set_bytes{namespace="{{namespace}}",pod=~"{{pod_prefix}}.*"} / container_spec_memory_limit_bytes{namespace="{{namespace}}",pod=~"{{pod_prefix}}.*"}"#,
        kind: MetricKind::ResourceUsage,
        keyword_gate: None,
    },
    QueryTemplate {
        name: "container_restart_rate",
        template: r#"increase(kube_pod_container_status_restarts_total{namespace="{{namespace}}",pod=~"{{pod_prefix}}.*"}[5m])"#,
        kind: MetricKind::RestartCount,
        keyword_gate: Some("crashloop"),
    },
    QueryTemplate {
        name: "oom_kill_count",
        template: r#"increase(container_oom_events_total{namespace="{{namespace}}",pod=~"{{pod_prefix}}.*"}[15m])"#,
        kind: MetricKind::RestartCount,
        keyword_gate: Some("oom"),
    },
    QueryTemplate {
        name: "http_error_rate",
        template: r#"sum(rate(http_requests_total{namespace="{{namespace}}",deployment="{{deployment}}",status=~"5.."}[5m])) / sum(rate(http_requests_total{namespace="{{namespace}}",deployment="{{deployment}}"}[5m]))"#,
        kind: MetricKind::ErrorRate,
        keyword_gate: Some("error"),
    },
    QueryTemplate {
        name: "http_latency_p99_seconds",
        template: r#"histogram_quantile(0.99, sum(rate(http_request_duration_seconds_bucket{namespace="{{namespace}}",deployment="{{deployment}}"}[5m])) by (le))"#,
        kind: MetricKind::Latency,
        keyword_gate: Some("latency"),
    },
    QueryTemplate {
        name: "node_not_ready",
        template: r#"kube_node_status_condition{condition="Ready",status="false"}"#,
        kind: MetricKind::ResourceUsage,
        keyword_gate: Some("node"),
    },
    QueryTemplate {
        name: "hpa_replica_ratio",
        template: r#"kube_horizontalpodautoscaler_status_current_replicas{namespace="{{namespace}}",deployment="{{deployment}}"} / kube_horizontalpodautoscaler_spec_max_replicas{namespace="{{namespace}}",deployment="{{deployment}}"}"#,
        kind: MetricKind::HpaReplicaRatio,
        keyword_gate: Some("hpa"),
    },
];

fn substitute(template: &str, ctx: &CollectorContext) -> String {
    let pod_prefix = ctx.service.clone().unwrap_or_default();
    let deployment = ctx.service.clone().unwrap_or_default();
    template
        .replace("{{namespace}}", &ctx.namespace)
        .replace("{{pod_prefix}}", &pod_prefix)
        .replace("{{deployment}}", &deployment)
}

fn gate_matches(gate: Option<&str>, incident: &Incident) -> bool {
    let Some(keyword) = gate else { return true };
    let haystack = format!(
        "{} {}",
        incident.title.to_ascii_lowercase(),
        incident.labels.get("alertname").cloned().unwrap_or_default().to_ascii_lowercase()
    );
    haystack.contains(keyword)
}

/// Maps a query's name and last observed value to the flat signal flag the
/// rules engine reads off evidence, if that query drives one.
fn metric_flag(query_name: &str, last_value: f64) -> Option<(&'static str, bool)> {
    match query_name {
        "container_memory_usage_percent" => Some(("memory_usage_high", last_value > 80.0)),
        "hpa_replica_ratio" => Some(("hpa_at_max", last_value >= 1.0)),
        "http_latency_p99_seconds" => Some(("latency_high", last_value > 1.0)),
        _ => None,
    }
}

fn decimate(series: MetricSeries) -> MetricSeries {
    if series.samples.len() <= MAX_METRIC_POINTS {
        return series;
    }
    let stride = series.samples.len().div_ceil(MAX_METRIC_POINTS);
    let samples = series.samples.into_iter().step_by(stride.max(1)).collect();
    MetricSeries { labels: series.labels, samples }
}

/// Collector that runs a fixed catalog of range queries against the
/// metrics store.
pub struct MetricsCollector {
    client: MetricsStoreClient,
}

impl MetricsCollector {
    /// Builds a collector over the given metrics store client.
    #[must_use]
    pub const fn new(client: MetricsStoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Collector for MetricsCollector {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn collect(
        &self,
        ctx: &CollectorContext,
        incident: &Incident,
    ) -> Result<CollectionOutcome, CollectorError> {
        let start = Instant::now();
        let mut outcome = CollectionOutcome::default();

        let start_unix = ctx.window.start.unix_timestamp() as f64;
        let end_unix = ctx.window.end.unix_timestamp() as f64;
        let span = (end_unix - start_unix).max(1.0);
        let step = Duration::from_secs_f64((span / 100.0).max(MIN_STEP_SECONDS));

        for query in QUERY_CATALOG {
            if !gate_matches(query.keyword_gate, incident) {
                continue;
            }
            let rendered = substitute(query.template, ctx);
            let series = match self.client.query_range(&rendered, start_unix, end_unix, step).await {
                Ok(series) => series,
                Err(err) => {
                    outcome.errors.push(format!("{}: {err}", query.name));
                    continue;
                }
            };

            for raw_series in series {
                let decimated = decimate(raw_series);
                let Some(&(_, last_value)) = decimated.samples.last() else { continue };
                let signal_strength = query.kind.signal_strength(last_value);
                let entity_name = decimated
                    .labels
                    .get("pod")
                    .or_else(|| decimated.labels.get("deployment"))
                    .or_else(|| decimated.labels.get("node"))
                    .cloned()
                    .unwrap_or_else(|| ctx.namespace.clone());

                let mut data = serde_json::json!({
                    "query": query.name,
                    "labels": decimated.labels,
                    "samples": decimated.samples,
                    "last_value": last_value,
                });
                if let Some((flag, value)) = metric_flag(query.name, last_value) {
                    data[flag] = serde_json::json!(value);
                }

                outcome.evidence.push(Evidence {
                    id: new_uuid_string().into(),
                    incident_id: incident.id.clone(),
                    evidence_type: EvidenceType::Metrics,
                    source: "prometheus".to_string(),
                    entity_name,
                    entity_namespace: ctx.namespace.clone(),
                    data,
                    signal_strength: Evidence::clamp_signal_strength(signal_strength),
                    time_window: ctx.window,
                    collected_at: Timestamp::now(),
                });
            }
        }

        outcome.duration = start.elapsed();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn resource_usage_signal_thresholds() {
        assert!((MetricKind::ResourceUsage.signal_strength(95.0) - 0.9).abs() < f64::EPSILON);
        assert!((MetricKind::ResourceUsage.signal_strength(80.0) - 0.7).abs() < f64::EPSILON);
        assert!((MetricKind::ResourceUsage.signal_strength(10.0) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn decimate_keeps_series_within_bound() {
        let samples: Vec<(f64, f64)> = (0..2000).map(|index| (f64::from(index), 1.0)).collect();
        let series = MetricSeries { labels: std::collections::BTreeMap::new(), samples };
        let decimated = decimate(series);
        assert!(decimated.samples.len() <= MAX_METRIC_POINTS);
    }

    #[test]
    fn keyword_gate_requires_match_in_title_or_alertname() {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert("alertname".to_string(), "PodCrashLoopBackOff".to_string());
        let incident = Incident {
            id: "i".into(),
            fingerprint: aiops_core::Fingerprint::from_hex("a".repeat(32)),
            title: "PodCrashLoopBackOff: checkout".into(),
            severity: aiops_core::Severity::High,
            status: aiops_core::IncidentStatus::Open,
            source: "alertmanager".into(),
            cluster: "prod".into(),
            namespace: "checkout".into(),
            service: None,
            labels,
            annotations: std::collections::BTreeMap::new(),
            started_at: Timestamp::now(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };
        assert!(gate_matches(Some("crashloop"), &incident));
        assert!(!gate_matches(Some("latency"), &incident));
    }

    #[test]
    fn metric_flag_derives_high_usage_and_latency_booleans() {
        assert_eq!(metric_flag("container_memory_usage_percent", 92.0), Some(("memory_usage_high", true)));
        assert_eq!(metric_flag("container_memory_usage_percent", 40.0), Some(("memory_usage_high", false)));
        assert_eq!(metric_flag("hpa_replica_ratio", 1.0), Some(("hpa_at_max", true)));
        assert_eq!(metric_flag("http_latency_p99_seconds", 3.0), Some(("latency_high", true)));
        assert_eq!(metric_flag("container_restart_rate", 9.0), None);
    }

    #[test]
    fn substitute_fills_all_placeholders() {
        let ctx = CollectorContext {
            cluster: "prod".into(),
            namespace: "checkout".into(),
            service: Some("checkout-api".into()),
            window: aiops_core::TimeWindow::new(Timestamp::now(), Timestamp::now()),
        };
        let rendered = substitute("{{namespace}}/{{pod_prefix}}/{{deployment}}", &ctx);
        assert_eq!(rendered, "checkout/checkout-api/checkout-api");
    }
}
