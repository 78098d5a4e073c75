// crates/aiops-remediation/src/policy_client.rs
// ============================================================================
// Module: Policy Gate Client
// Description: HTTP client for the external blast-radius decision endpoint.
// Purpose: Implement `aiops_core::PolicyClient`, failing closed on any
//          transport or parse error.
// Dependencies: aiops-core, reqwest, serde, time
// ============================================================================

use std::time::Duration;

use aiops_core::ActionType;
use aiops_core::PolicyClient;
use aiops_core::PolicyDecision;
use aiops_core::PolicyError;
use aiops_core::RemediationAction;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
struct PolicyRequest {
    action_type: &'static str,
    environment: String,
    blast_radius_score: f64,
    namespace: String,
    affected_replicas: u32,
    current_hour: u8,
    is_weekend: bool,
    freeze_active: bool,
}

#[derive(Debug, Deserialize)]
struct PolicyResponse {
    allow: bool,
    requires_approval: bool,
    #[serde(default)]
    deny: Vec<String>,
}

fn action_type_str(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::RestartPod => "restart_pod",
        ActionType::RestartDeployment => "restart_deployment",
        ActionType::RollbackDeployment => "rollback_deployment",
        ActionType::ScaleReplicas => "scale_replicas",
        ActionType::CordonNode => "cordon_node",
    }
}

/// Client for the external blast-radius policy decision endpoint. A
/// `freeze_active` flag is not derivable from any local state today, so it
/// is always reported `false`; a deploy-freeze calendar is an external
/// collaborator this crate only defines the request shape for.
pub struct HttpPolicyClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPolicyClient {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the underlying HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, PolicyError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| PolicyError::Backend(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn evaluate(&self, action: &RemediationAction) -> Result<PolicyDecision, PolicyError> {
        let now = OffsetDateTime::now_utc();
        let request = PolicyRequest {
            action_type: action_type_str(action.action_type),
            environment: action.environment.clone(),
            blast_radius_score: action.blast_radius_score,
            namespace: action.target.namespace.clone(),
            affected_replicas: action.affected_replicas,
            current_hour: now.hour(),
            is_weekend: matches!(now.weekday(), time::Weekday::Saturday | time::Weekday::Sunday),
            freeze_active: false,
        };

        let url = format!("{}/api/v1/policy/evaluate", self.base_url);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| PolicyError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PolicyError::Backend(format!("status {}", response.status())));
        }
        let parsed: PolicyResponse =
            response.json().await.map_err(|err| PolicyError::Backend(err.to_string()))?;

        Ok(PolicyDecision {
            allow: parsed.allow,
            requires_approval: parsed.requires_approval,
            reason: parsed.deny.first().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn action_type_str_covers_all_variants() {
        assert_eq!(action_type_str(ActionType::RestartPod), "restart_pod");
        assert_eq!(action_type_str(ActionType::CordonNode), "cordon_node");
    }
}
