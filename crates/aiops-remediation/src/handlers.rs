// crates/aiops-remediation/src/handlers.rs
// ============================================================================
// Module: Action Handlers
// Description: One `ActionHandler` per `ActionType`, each a thin mutation
//              against the cluster API.
// Purpose: Turn an approved `RemediationAction` into the concrete cluster
//          call its type contracts for, per the action table.
// Dependencies: aiops-collectors, aiops-core, time
// ============================================================================

use std::collections::BTreeMap;

use aiops_collectors::ClusterApiClient;
use aiops_collectors::ClusterApiError;
use aiops_core::ActionHandler;
use aiops_core::ActionHandlerError;
use aiops_core::ExecutionReceipt;
use aiops_core::RemediationAction;
use async_trait::async_trait;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

impl From<ClusterApiError> for ActionHandlerError {
    fn from(err: ClusterApiError) -> Self {
        Self::Backend(err.to_string())
    }
}

fn service_from(action: &RemediationAction) -> &str {
    action.target.name.as_str()
}

fn param<'a>(action: &'a RemediationAction, key: &str) -> Option<&'a str> {
    action.parameters.get(key).map(String::as_str)
}

/// Deletes the first non-`Running` pod matching the target's app label,
/// falling back to the first pod in the list when all are `Running`.
pub struct RestartPodHandler {
    cluster: ClusterApiClient,
}

impl RestartPodHandler {
    #[must_use]
    pub const fn new(cluster: ClusterApiClient) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl ActionHandler for RestartPodHandler {
    async fn execute(&self, action: &RemediationAction) -> Result<ExecutionReceipt, ActionHandlerError> {
        let pod_name = if let Some(name) = param(action, "pod_name") {
            name.to_string()
        } else {
            let app = service_from(action);
            let pods = self.cluster.list_pods(&action.target.namespace, Some(app)).await?;
            let chosen = pods
                .iter()
                .find(|pod| pod.phase != "Running")
                .or_else(|| pods.first())
                .ok_or_else(|| ActionHandlerError::Backend(format!("no pods found for app={app}")))?;
            chosen.name.clone()
        };

        self.cluster.delete_pod(&action.target.namespace, &pod_name).await?;
        Ok(ExecutionReceipt { succeeded: true, message: format!("deleted pod {pod_name}") })
    }
}

/// Patches the deployment pod template's `restartedAt` annotation to the
/// current instant, triggering a rolling restart.
pub struct RestartDeploymentHandler {
    cluster: ClusterApiClient,
}

impl RestartDeploymentHandler {
    #[must_use]
    pub const fn new(cluster: ClusterApiClient) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl ActionHandler for RestartDeploymentHandler {
    async fn execute(&self, action: &RemediationAction) -> Result<ExecutionReceipt, ActionHandlerError> {
        let deployment_name = param(action, "deployment_name").unwrap_or_else(|| service_from(action));
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| ActionHandlerError::Backend(err.to_string()))?;
        self.cluster.patch_restarted_at(&action.target.namespace, deployment_name, &now).await?;
        Ok(ExecutionReceipt { succeeded: true, message: format!("restarted deployment {deployment_name}") })
    }
}

/// Rolls a deployment's pod template back to the previous replica set's
/// images. Requires at least two revisions to exist.
pub struct RollbackDeploymentHandler {
    cluster: ClusterApiClient,
}

impl RollbackDeploymentHandler {
    #[must_use]
    pub const fn new(cluster: ClusterApiClient) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl ActionHandler for RollbackDeploymentHandler {
    async fn execute(&self, action: &RemediationAction) -> Result<ExecutionReceipt, ActionHandlerError> {
        let deployment_name = param(action, "deployment_name").unwrap_or_else(|| service_from(action));
        let mut revisions = self.cluster.list_replica_sets(&action.target.namespace).await?;
        revisions.retain(|rs| rs.owner_deployment == deployment_name);
        revisions.sort_by_key(|rs| std::cmp::Reverse(rs.revision));

        if revisions.len() < 2 {
            return Err(ActionHandlerError::Backend(format!(
                "deployment {deployment_name} has fewer than 2 revisions, cannot roll back"
            )));
        }

        let previous = &revisions[1];
        self.cluster
            .replace_pod_template_images(&action.target.namespace, deployment_name, &previous.images)
            .await?;
        Ok(ExecutionReceipt {
            succeeded: true,
            message: format!("rolled back {deployment_name} to revision {}", previous.revision),
        })
    }
}

/// Patches `spec.replicas` to the `replicas` parameter, or `current + 1`
/// when unspecified.
pub struct ScaleReplicasHandler {
    cluster: ClusterApiClient,
}

impl ScaleReplicasHandler {
    #[must_use]
    pub const fn new(cluster: ClusterApiClient) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl ActionHandler for ScaleReplicasHandler {
    async fn execute(&self, action: &RemediationAction) -> Result<ExecutionReceipt, ActionHandlerError> {
        let deployment_name = param(action, "deployment_name").unwrap_or_else(|| service_from(action));
        let replicas = if let Some(value) = param(action, "replicas") {
            value.parse::<u32>().map_err(|err| ActionHandlerError::Backend(err.to_string()))?
        } else {
            let current = self.cluster.get_deployment(&action.target.namespace, deployment_name).await?;
            current.replicas_desired.saturating_add(1)
        };

        self.cluster.patch_replicas(&action.target.namespace, deployment_name, replicas).await?;
        Ok(ExecutionReceipt { succeeded: true, message: format!("scaled {deployment_name} to {replicas} replicas") })
    }
}

/// Patches a node's `spec.unschedulable` to `true`. `node_name` is
/// required.
pub struct CordonNodeHandler {
    cluster: ClusterApiClient,
}

impl CordonNodeHandler {
    #[must_use]
    pub const fn new(cluster: ClusterApiClient) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl ActionHandler for CordonNodeHandler {
    async fn execute(&self, action: &RemediationAction) -> Result<ExecutionReceipt, ActionHandlerError> {
        let node_name = param(action, "node_name")
            .ok_or_else(|| ActionHandlerError::Backend("cordon_node requires node_name".to_string()))?;
        self.cluster.patch_node_unschedulable(node_name, true).await?;
        Ok(ExecutionReceipt { succeeded: true, message: format!("cordoned node {node_name}") })
    }
}

/// Builds the handler table keyed on action type, one cluster client shared
/// across all five handlers.
#[must_use]
pub fn build_registry(cluster: ClusterApiClient) -> BTreeMap<aiops_core::ActionType, Box<dyn ActionHandler>> {
    let mut registry: BTreeMap<aiops_core::ActionType, Box<dyn ActionHandler>> = BTreeMap::new();
    registry.insert(aiops_core::ActionType::RestartPod, Box::new(RestartPodHandler::new(cluster.clone())));
    registry
        .insert(aiops_core::ActionType::RestartDeployment, Box::new(RestartDeploymentHandler::new(cluster.clone())));
    registry.insert(
        aiops_core::ActionType::RollbackDeployment,
        Box::new(RollbackDeploymentHandler::new(cluster.clone())),
    );
    registry.insert(aiops_core::ActionType::ScaleReplicas, Box::new(ScaleReplicasHandler::new(cluster.clone())));
    registry.insert(aiops_core::ActionType::CordonNode, Box::new(CordonNodeHandler::new(cluster)));
    registry
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use aiops_core::ActionType;

    use super::*;

    #[test]
    fn build_registry_covers_all_action_types() {
        let cluster = ClusterApiClient::new("http://localhost", std::time::Duration::from_secs(5)).unwrap();
        let registry = build_registry(cluster);
        assert_eq!(registry.len(), 5);
        assert!(registry.contains_key(&ActionType::RestartPod));
        assert!(registry.contains_key(&ActionType::RestartDeployment));
        assert!(registry.contains_key(&ActionType::RollbackDeployment));
        assert!(registry.contains_key(&ActionType::ScaleReplicas));
        assert!(registry.contains_key(&ActionType::CordonNode));
    }
}
