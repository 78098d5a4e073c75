// crates/aiops-remediation/src/verifier.rs
// ============================================================================
// Module: Verifier
// Description: Post-remediation health check comparing a short post-action
//              window against the same window 15 minutes prior.
// Purpose: Decide whether a remediation action actually helped.
// Dependencies: aiops-collectors, aiops-core, tokio
// ============================================================================

use std::time::Duration;

use aiops_collectors::ClusterApiClient;
use aiops_collectors::ClusterApiError;
use aiops_collectors::MetricsStoreClient;
use aiops_collectors::MetricsStoreError;
use aiops_core::IncidentId;
use aiops_core::PodHealthSnapshot;
use aiops_core::RemediationActionId;
use aiops_core::VerificationResult;

/// Window, in seconds, the "before" probes look back relative to "now".
const BEFORE_OFFSET_SECONDS: f64 = 900.0;

/// Width, in seconds, of the sampling window each probe queries.
const PROBE_WINDOW_SECONDS: f64 = 30.0;

/// Step, in seconds, for the narrow probe range queries.
const PROBE_STEP_SECONDS: f64 = 15.0;

/// Errors from the verifier's own plumbing (not from an individual metric
/// probe, which degrades to `0.0` rather than failing the whole
/// verification).
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// The cluster API could not be queried for pod health.
    #[error("verifier pod health query failed: {0}")]
    ClusterApi(#[from] ClusterApiError),
}

fn last_sample(series: &[aiops_collectors::MetricSeries]) -> Option<f64> {
    series.iter().filter_map(|s| s.samples.last().map(|(_, value)| *value)).next()
}

async fn probe(metrics: &MetricsStoreClient, query: &str, now_unix: f64, offset_seconds: f64) -> f64 {
    let end = now_unix - offset_seconds;
    let start = end - PROBE_WINDOW_SECONDS;
    match metrics.query_range(query, start, end, Duration::from_secs_f64(PROBE_STEP_SECONDS)).await {
        Ok(series) => last_sample(&series).unwrap_or(0.0),
        Err(MetricsStoreError::Request(_) | MetricsStoreError::Status(_)) => 0.0,
    }
}

async fn pod_health(cluster: &ClusterApiClient, namespace: &str, service: &str) -> Result<PodHealthSnapshot, VerifierError> {
    let pods = cluster.list_pods(namespace, Some(service)).await?;
    let total = u32::try_from(pods.len()).unwrap_or(u32::MAX);
    let healthy = u32::try_from(pods.iter().filter(|pod| pod.phase == "Running").count()).unwrap_or(u32::MAX);
    Ok(PodHealthSnapshot::new(total, healthy))
}

/// Waits `wait_seconds` (the verifier's mandatory cool-down), then runs the
/// error-rate, restart-rate, latency, and pod-health probes and combines
/// them into a [`VerificationResult`].
///
/// # Errors
///
/// Returns [`VerifierError`] only when the pod-health probe's cluster query
/// fails; the metric probes degrade to `0.0` rather than erroring, since a
/// missing metrics backend should not block verification.
#[allow(clippy::too_many_arguments, reason = "each parameter is independently required, no natural grouping")]
pub async fn verify(
    metrics: &MetricsStoreClient,
    cluster: &ClusterApiClient,
    action_id: RemediationActionId,
    incident_id: IncidentId,
    namespace: &str,
    service: &str,
    now_unix: f64,
    wait_seconds: u64,
) -> Result<VerificationResult, VerifierError> {
    tokio::time::sleep(Duration::from_secs(wait_seconds)).await;

    let error_query = format!(
        "sum(rate(http_requests_total{{namespace=\"{namespace}\",service=\"{service}\",status_code=~\"5..\"}}[5m])) / sum(rate(http_requests_total{{namespace=\"{namespace}\",service=\"{service}\"}}[5m]))"
    );
    let restart_query = format!(
        "increase(kube_pod_container_status_restarts_total{{namespace=\"{namespace}\",service=\"{service}\"}}[5m])"
    );
    let latency_query = format!(
        "histogram_quantile(0.99, sum(rate(http_request_duration_seconds_bucket{{namespace=\"{namespace}\",service=\"{service}\"}}[5m])) by (le))"
    );

    let error_rate_after = probe(metrics, &error_query, now_unix, 0.0).await;
    let error_rate_before = probe(metrics, &error_query, now_unix, BEFORE_OFFSET_SECONDS).await;
    let restart_count_after = probe(metrics, &restart_query, now_unix, 0.0).await;
    let restart_count_before = probe(metrics, &restart_query, now_unix, BEFORE_OFFSET_SECONDS).await;
    let latency_p99_after = probe(metrics, &latency_query, now_unix, 0.0).await;
    let latency_p99_before = probe(metrics, &latency_query, now_unix, BEFORE_OFFSET_SECONDS).await;

    let pods_before = pod_health(cluster, namespace, service).await?;
    let pods_after = pods_before;

    let mut result = VerificationResult {
        action_id,
        incident_id,
        success: false,
        metrics_improved: false,
        error_rate_before,
        error_rate_after,
        latency_p99_before,
        latency_p99_after,
        restart_count_before,
        restart_count_after,
        pods_before,
        pods_after,
        wait_duration_seconds: wait_seconds,
    };
    result.metrics_improved = result.compute_metrics_improved();
    result.success = result.metrics_improved && result.pods_after.all_healthy;

    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    fn sample_result(
        error_before: f64,
        error_after: f64,
        restart_before: f64,
        restart_after: f64,
        pods_after: PodHealthSnapshot,
    ) -> VerificationResult {
        VerificationResult {
            action_id: "action-1".into(),
            incident_id: "incident-1".into(),
            success: false,
            metrics_improved: false,
            error_rate_before: error_before,
            error_rate_after: error_after,
            latency_p99_before: 0.2,
            latency_p99_after: 0.2,
            restart_count_before: restart_before,
            restart_count_after: restart_after,
            pods_before: PodHealthSnapshot::new(3, 2),
            pods_after,
            wait_duration_seconds: 120,
        }
    }

    #[test]
    fn success_requires_metrics_improved_and_all_pods_healthy() {
        let mut result = sample_result(0.10, 0.02, 4.0, 4.0, PodHealthSnapshot::new(3, 3));
        result.metrics_improved = result.compute_metrics_improved();
        result.success = result.metrics_improved && result.pods_after.all_healthy;
        assert!(result.error_rate_improved());
        assert!(result.success);
    }

    #[test]
    fn unhealthy_pods_prevent_success_even_if_metrics_improved() {
        let mut result = sample_result(0.10, 0.02, 4.0, 4.0, PodHealthSnapshot::new(3, 2));
        result.metrics_improved = result.compute_metrics_improved();
        result.success = result.metrics_improved && result.pods_after.all_healthy;
        assert!(result.metrics_improved);
        assert!(!result.success);
    }

    #[test]
    fn all_pods_healthy_counts_as_improvement_alone() {
        let mut result = sample_result(0.10, 0.10, 4.0, 5.0, PodHealthSnapshot::new(3, 3));
        result.metrics_improved = result.compute_metrics_improved();
        assert!(!result.error_rate_improved());
        assert!(!result.restart_rate_improved());
        assert!(result.metrics_improved);
    }
}
