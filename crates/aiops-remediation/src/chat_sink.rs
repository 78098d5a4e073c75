// crates/aiops-remediation/src/chat_sink.rs
// ============================================================================
// Module: HTTP Chat Sink
// Description: HTTP-backed implementation of `aiops_core::ChatSink` over a
//              webhook-shaped chat API.
// Purpose: Post approval request messages and poll for operator responses.
// Dependencies: aiops-core, reqwest
// ============================================================================

use std::time::Duration;

use aiops_core::ActionType;
use aiops_core::ChatSink;
use aiops_core::ChatSinkError;
use aiops_core::RemediationAction;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ApprovalRequestBody {
    text: String,
    action_id: String,
    incident_id: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    message_handle: String,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    approved: Option<bool>,
}

fn action_type_label(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::RestartPod => "restart the pod",
        ActionType::RestartDeployment => "restart the deployment",
        ActionType::RollbackDeployment => "roll back the deployment",
        ActionType::ScaleReplicas => "scale replicas",
        ActionType::CordonNode => "cordon the node",
    }
}

/// Renders the approval request's block content for `action`.
#[must_use]
pub fn render_approval_text(action: &RemediationAction) -> String {
    format!(
        "Incident {} requests approval to {} on {} `{}` (blast radius {:.0}, risk {:?}).",
        action.incident_id,
        action_type_label(action.action_type),
        action.target.kind,
        action.target.name,
        action.blast_radius_score,
        action.risk_level,
    )
}

/// Chat sink backed by an HTTP webhook API.
pub struct HttpChatSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatSink {
    /// Builds a chat sink with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ChatSinkError`] when the underlying HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ChatSinkError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| ChatSinkError::Backend(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[async_trait]
impl ChatSink for HttpChatSink {
    async fn post_approval_request(&self, action: &RemediationAction) -> Result<String, ChatSinkError> {
        let url = format!("{}/api/v1/approvals", self.base_url);
        let body = ApprovalRequestBody {
            text: render_approval_text(action),
            action_id: action.id.as_str().to_string(),
            incident_id: action.incident_id.as_str().to_string(),
        };
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ChatSinkError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ChatSinkError::Backend(format!("status {}", response.status())));
        }
        let parsed: PostResponse =
            response.json().await.map_err(|err| ChatSinkError::Backend(err.to_string()))?;
        Ok(parsed.message_handle)
    }

    async fn poll_response(&self, message_handle: &str) -> Result<Option<bool>, ChatSinkError> {
        let url = format!("{}/api/v1/approvals/{message_handle}", self.base_url);
        let response = self.client.get(url).send().await.map_err(|err| ChatSinkError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ChatSinkError::Backend(format!("status {}", response.status())));
        }
        let parsed: PollResponse =
            response.json().await.map_err(|err| ChatSinkError::Backend(err.to_string()))?;
        Ok(parsed.approved)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::collections::BTreeMap;

    use aiops_core::ActionStatus;
    use aiops_core::ApprovalAudit;
    use aiops_core::RiskLevel;
    use aiops_core::Target;

    use super::*;

    #[test]
    fn render_approval_text_includes_target_and_score() {
        let action = RemediationAction {
            id: "action-1".into(),
            incident_id: "incident-1".into(),
            hypothesis_id: None,
            action_type: ActionType::RestartDeployment,
            target: Target {
                cluster: "prod".to_string(),
                namespace: "checkout".to_string(),
                kind: "deployment".to_string(),
                name: "checkout-api".to_string(),
            },
            parameters: BTreeMap::new(),
            status: ActionStatus::PendingApproval,
            risk_level: RiskLevel::High,
            blast_radius_score: 82.0,
            affected_replicas: 3,
            environment: "prod".to_string(),
            idempotency_key: "key".to_string(),
            approval: ApprovalAudit::not_required(),
        };
        let text = render_approval_text(&action);
        assert!(text.contains("checkout-api"));
        assert!(text.contains("82"));
    }
}
