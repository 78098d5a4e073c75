// crates/aiops-remediation/src/approval.rs
// ============================================================================
// Module: Approval Coordinator
// Description: Routes a remediation action that requires human sign-off to
//              a chat sink, then bounded-waits for an operator response.
// Purpose: Implement the dev-auto-approve bypass and the "Slack not
//          configured" fallback semantics.
// Dependencies: aiops-core, aiops-config, tokio, tracing
// ============================================================================

use std::time::Duration;

use aiops_config::ApprovalConfig;
use aiops_core::ApprovalAudit;
use aiops_core::ChatSink;
use aiops_core::RemediationAction;
use tracing::info;
use tracing::warn;

/// Reason recorded when no chat sink is configured or the sink errors on
/// the initial post.
pub const NO_CHAT_SINK_REASON: &str = "Slack not configured";

/// Waits for approval on `action`, returning the completed [`ApprovalAudit`].
///
/// Bypasses the wait entirely when `action.environment == "dev"` and
/// `config.dev_auto_approve` is set. Otherwise posts to `sink` and polls
/// every `config.poll_interval_seconds` until a response arrives or
/// `config.wait_seconds` elapses, whichever comes first. A `None` sink, or a
/// sink error on the initial post, resolves immediately to
/// `approved=false, reason="Slack not configured"` rather than waiting out
/// the full timeout.
pub async fn await_approval(
    action: &RemediationAction,
    sink: Option<&dyn ChatSink>,
    config: &ApprovalConfig,
) -> ApprovalAudit {
    if action.environment == "dev" && config.dev_auto_approve {
        info!(incident_id = %action.incident_id, "bypassing approval wait: dev auto-approve");
        return ApprovalAudit {
            required: true,
            request_handle: None,
            approved: Some(true),
            reason: Some("dev auto-approve".to_string()),
            decided_at: Some(now()),
        };
    }

    let Some(sink) = sink else {
        return not_configured();
    };

    let handle = match sink.post_approval_request(action).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(incident_id = %action.incident_id, error = %err, "approval sink unavailable");
            return not_configured();
        }
    };

    let deadline = Duration::from_secs(config.wait_seconds);
    let poll_interval = Duration::from_secs(config.poll_interval_seconds.max(1));
    let mut waited = Duration::ZERO;

    loop {
        match sink.poll_response(&handle).await {
            Ok(Some(approved)) => {
                return ApprovalAudit {
                    required: true,
                    request_handle: Some(handle),
                    approved: Some(approved),
                    reason: None,
                    decided_at: Some(now()),
                };
            }
            Ok(None) => {}
            Err(err) => {
                warn!(incident_id = %action.incident_id, error = %err, "approval poll failed, retrying");
            }
        }

        if waited >= deadline {
            return ApprovalAudit {
                required: true,
                request_handle: Some(handle),
                approved: Some(false),
                reason: Some("approval timed out".to_string()),
                decided_at: Some(now()),
            };
        }

        let step = poll_interval.min(deadline - waited);
        tokio::time::sleep(step).await;
        waited += step;
    }
}

fn not_configured() -> ApprovalAudit {
    ApprovalAudit {
        required: true,
        request_handle: None,
        approved: Some(false),
        reason: Some(NO_CHAT_SINK_REASON.to_string()),
        decided_at: Some(now()),
    }
}

fn now() -> aiops_core::Timestamp {
    aiops_core::Timestamp::now()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use aiops_core::ActionStatus;
    use aiops_core::ActionType;
    use aiops_core::ChatSinkError;
    use aiops_core::RiskLevel;
    use aiops_core::Target;
    use async_trait::async_trait;

    use super::*;

    fn sample_action(environment: &str) -> RemediationAction {
        RemediationAction {
            id: "action-1".into(),
            incident_id: "incident-1".into(),
            hypothesis_id: None,
            action_type: ActionType::RestartPod,
            target: Target {
                cluster: String::new(),
                namespace: "checkout".to_string(),
                kind: "pod".to_string(),
                name: "checkout-api-abc".to_string(),
            },
            parameters: BTreeMap::new(),
            status: ActionStatus::PendingApproval,
            risk_level: RiskLevel::Medium,
            blast_radius_score: 40.0,
            affected_replicas: 1,
            environment: environment.to_string(),
            idempotency_key: "key".to_string(),
            approval: ApprovalAudit::not_required(),
        }
    }

    #[tokio::test]
    async fn dev_auto_approve_bypasses_wait() {
        let action = sample_action("dev");
        let config = ApprovalConfig {
            chat_base_url: "http://localhost".to_string(),
            wait_seconds: 3600,
            poll_interval_seconds: 30,
            dev_auto_approve: true,
        };
        let audit = await_approval(&action, None, &config).await;
        assert_eq!(audit.approved, Some(true));
    }

    #[tokio::test]
    async fn missing_sink_resolves_to_not_configured() {
        let action = sample_action("prod");
        let config = ApprovalConfig {
            chat_base_url: "http://localhost".to_string(),
            wait_seconds: 10,
            poll_interval_seconds: 1,
            dev_auto_approve: false,
        };
        let audit = await_approval(&action, None, &config).await;
        assert_eq!(audit.approved, Some(false));
        assert_eq!(audit.reason.as_deref(), Some(NO_CHAT_SINK_REASON));
    }

    struct ApprovesAfterNPolls {
        handle: &'static str,
        approve_on_poll: u32,
        poll_count: AtomicU32,
    }

    #[async_trait]
    impl ChatSink for ApprovesAfterNPolls {
        async fn post_approval_request(&self, _action: &RemediationAction) -> Result<String, ChatSinkError> {
            Ok(self.handle.to_string())
        }

        async fn poll_response(&self, _message_handle: &str) -> Result<Option<bool>, ChatSinkError> {
            let count = self.poll_count.fetch_add(1, Ordering::SeqCst) + 1;
            if count >= self.approve_on_poll { Ok(Some(true)) } else { Ok(None) }
        }
    }

    #[tokio::test]
    async fn polls_until_response_arrives() {
        let action = sample_action("prod");
        let config = ApprovalConfig {
            chat_base_url: "http://localhost".to_string(),
            wait_seconds: 5,
            poll_interval_seconds: 1,
            dev_auto_approve: false,
        };
        let sink = ApprovesAfterNPolls { handle: "h1", approve_on_poll: 2, poll_count: AtomicU32::new(0) };
        let audit = await_approval(&action, Some(&sink), &config).await;
        assert_eq!(audit.approved, Some(true));
        assert_eq!(audit.request_handle.as_deref(), Some("h1"));
    }

    struct NeverResponds;

    #[async_trait]
    impl ChatSink for NeverResponds {
        async fn post_approval_request(&self, _action: &RemediationAction) -> Result<String, ChatSinkError> {
            Ok("handle".to_string())
        }

        async fn poll_response(&self, _message_handle: &str) -> Result<Option<bool>, ChatSinkError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn times_out_to_denied() {
        let action = sample_action("prod");
        let config = ApprovalConfig {
            chat_base_url: "http://localhost".to_string(),
            wait_seconds: 1,
            poll_interval_seconds: 1,
            dev_auto_approve: false,
        };
        let audit = await_approval(&action, Some(&NeverResponds), &config).await;
        assert_eq!(audit.approved, Some(false));
        assert_eq!(audit.reason.as_deref(), Some("approval timed out"));
    }
}
