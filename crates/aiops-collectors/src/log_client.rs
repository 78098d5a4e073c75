// crates/aiops-collectors/src/log_client.rs
// ============================================================================
// Module: Log Store Client
// Description: Thin HTTP client over a Loki-shaped log query API.
// Purpose: Give the Logs collector a typed `query_range` call without
//          leaking the store's wire format into collector logic.
// Dependencies: reqwest, serde
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised by [`LogStoreClient`].
#[derive(Debug, Error)]
pub enum LogStoreError {
    /// The request could not be sent or the response could not be parsed.
    #[error("log store request failed: {0}")]
    Request(String),
    /// The log store responded with a non-success status.
    #[error("log store returned status {0}")]
    Status(u16),
}

/// A single log line with its stream labels.
#[derive(Debug, Clone)]
pub struct LogLine {
    /// Stream labels (`pod`, `namespace`, `container`, ...).
    pub labels: std::collections::BTreeMap<String, String>,
    /// Line timestamp, nanoseconds since the epoch.
    pub timestamp_ns: i128,
    /// Raw log line text.
    pub line: String,
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    data: QueryRangeData,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    result: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
struct StreamResult {
    stream: std::collections::BTreeMap<String, String>,
    values: Vec<[String; 2]>,
}

/// Client for the log store's range-query endpoint.
#[derive(Clone)]
pub struct LogStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl LogStoreClient {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError`] when the underlying HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, LogStoreError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| LogStoreError::Request(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    /// Queries log lines matching `selector` (a stream selector like
    /// `{namespace="checkout",pod=~"checkout-.*"}`) between `start_ns` and
    /// `end_ns` (nanoseconds since the epoch), newest first, capped at
    /// `limit` lines.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn query_range(
        &self,
        selector: &str,
        start_ns: i128,
        end_ns: i128,
        limit: u32,
    ) -> Result<Vec<LogLine>, LogStoreError> {
        let url = format!("{}/loki/api/v1/query_range", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("query", selector.to_string()),
                ("start", start_ns.to_string()),
                ("end", end_ns.to_string()),
                ("limit", limit.to_string()),
                ("direction", "backward".to_string()),
            ])
            .send()
            .await
            .map_err(|err| LogStoreError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(LogStoreError::Status(response.status().as_u16()));
        }
        let parsed: QueryRangeResponse =
            response.json().await.map_err(|err| LogStoreError::Request(err.to_string()))?;

        let mut lines = Vec::new();
        for stream in parsed.data.result {
            for [timestamp, text] in stream.values {
                let timestamp_ns = timestamp.parse().unwrap_or(0);
                lines.push(LogLine { labels: stream.stream.clone(), timestamp_ns, line: text });
            }
        }
        Ok(lines)
    }
}
