// crates/aiops-remediation/src/ticket.rs
// ============================================================================
// Module: Ticket Sink Client
// Description: HTTP client for the external issue tracker the Incident
//              Closer escalates unresolved incidents to.
// Purpose: Implement `aiops_core::TicketSink` over a generic "create issue"
//          endpoint.
// Dependencies: aiops-core, reqwest, serde
// ============================================================================

use std::time::Duration;

use aiops_core::TicketRequest;
use aiops_core::TicketSink;
use aiops_core::TicketSinkError;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CreateIssueResponse {
    id: String,
}

/// Client for the external issue tracker, used when the Incident Closer
/// cannot confirm a resolution and escalates to a human queue.
pub struct HttpTicketSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTicketSink {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TicketSinkError`] when the underlying HTTP client cannot
    /// be built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, TicketSinkError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| TicketSinkError::Backend(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[async_trait]
impl TicketSink for HttpTicketSink {
    async fn create_issue(&self, request: &TicketRequest) -> Result<String, TicketSinkError> {
        let url = format!("{}/api/v1/issues", self.base_url);
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|err| TicketSinkError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TicketSinkError::Backend(format!("status {}", response.status())));
        }
        let parsed: CreateIssueResponse =
            response.json().await.map_err(|err| TicketSinkError::Backend(err.to_string()))?;
        Ok(parsed.id)
    }
}
