// crates/aiops-collectors/src/metrics_client.rs
// ============================================================================
// Module: Metrics Store Client
// Description: Thin HTTP client over a Prometheus-shaped range-query API.
// Purpose: Give the Metrics collector a typed `query_range` call without
//          leaking the store's wire format into collector logic.
// Dependencies: reqwest, serde
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised by [`MetricsStoreClient`].
#[derive(Debug, Error)]
pub enum MetricsStoreError {
    /// The request could not be sent or the response could not be parsed.
    #[error("metrics store request failed: {0}")]
    Request(String),
    /// The metrics store responded with a non-success status, or its body
    /// reported a query error.
    #[error("metrics store returned status {0}")]
    Status(u16),
}

/// A single time series returned by a range query, with its label set and
/// `(unix_seconds, value)` samples in chronological order.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    /// Series labels (`__name__`, `pod`, `namespace`, ...).
    pub labels: std::collections::BTreeMap<String, String>,
    /// `(unix_seconds, value)` samples.
    pub samples: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    status: String,
    data: Option<QueryRangeData>,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    result: Vec<SeriesResult>,
}

#[derive(Debug, Deserialize)]
struct SeriesResult {
    metric: std::collections::BTreeMap<String, String>,
    values: Vec<(f64, String)>,
}

/// Client for the metrics store's range-query endpoint.
#[derive(Clone)]
pub struct MetricsStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl MetricsStoreClient {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsStoreError`] when the underlying HTTP client cannot
    /// be built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, MetricsStoreError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| MetricsStoreError::Request(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    /// Executes `query` between `start_unix`/`end_unix` seconds at `step`
    /// resolution, discarding non-finite samples (`+Inf`/`-Inf`/`NaN`).
    ///
    /// # Errors
    ///
    /// Returns [`MetricsStoreError`] when the request fails, the response
    /// cannot be parsed, or the backend reports a non-`"success"` status.
    pub async fn query_range(
        &self,
        query: &str,
        start_unix: f64,
        end_unix: f64,
        step: Duration,
    ) -> Result<Vec<MetricSeries>, MetricsStoreError> {
        let url = format!("{}/api/v1/query_range", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("query", query.to_string()),
                ("start", start_unix.to_string()),
                ("end", end_unix.to_string()),
                ("step", format!("{}s", step.as_secs_f64())),
            ])
            .send()
            .await
            .map_err(|err| MetricsStoreError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(MetricsStoreError::Status(response.status().as_u16()));
        }
        let parsed: QueryRangeResponse =
            response.json().await.map_err(|err| MetricsStoreError::Request(err.to_string()))?;
        if parsed.status != "success" {
            return Err(MetricsStoreError::Status(200));
        }

        let series = parsed
            .data
            .map(|data| {
                data.result
                    .into_iter()
                    .map(|series| {
                        let samples = series
                            .values
                            .into_iter()
                            .filter_map(|(timestamp, raw)| {
                                let value: f64 = raw.parse().ok()?;
                                value.is_finite().then_some((timestamp, value))
                            })
                            .collect();
                        MetricSeries { labels: series.metric, samples }
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(series)
    }
}
