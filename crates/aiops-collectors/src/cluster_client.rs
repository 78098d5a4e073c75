// crates/aiops-collectors/src/cluster_client.rs
// ============================================================================
// Module: Cluster API Client
// Description: Thin HTTP client over the orchestrator's (Kubernetes-shaped)
//              control-plane API: pods, deployments, events, nodes, HPAs,
//              replica sets, and config maps.
// Purpose: Give every collector and the remediation executor one shared,
//          typed surface over the cluster API instead of each crafting its
//          own requests.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! `ClusterApiClient` wraps a single `reqwest::Client` pointed at the
//! orchestrator API's base URL. Every method is a bounded GET or PATCH with
//! the client's configured timeout; none retry internally — retry policy is
//! the caller's responsibility (the workflow's activity retry policy, or the
//! collector's own partial-failure accumulation).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by [`ClusterApiClient`] methods.
#[derive(Debug, Error)]
pub enum ClusterApiError {
    /// The request could not be sent or the response could not be parsed.
    #[error("cluster api request failed: {0}")]
    Request(String),
    /// The cluster API responded with a non-success status.
    #[error("cluster api returned status {0}")]
    Status(u16),
}

/// A single container's last-known waiting/terminated state within a pod.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerStatus {
    /// Container name.
    pub name: String,
    /// Restart count for this container.
    #[serde(default)]
    pub restart_count: u32,
    /// Waiting reason (`CrashLoopBackOff`, `ImagePullBackOff`, ...), if the
    /// container is currently waiting.
    #[serde(default)]
    pub waiting_reason: Option<String>,
    /// Terminated reason (`OOMKilled`, `Error`, ...), if the container's
    /// last termination is known.
    #[serde(default)]
    pub terminated_reason: Option<String>,
    /// Container image reference.
    #[serde(default)]
    pub image: String,
}

/// A pod as reported by the cluster API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodInfo {
    /// Pod name.
    pub name: String,
    /// Pod namespace.
    pub namespace: String,
    /// Pod labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Pod phase (`Running`, `Pending`, `Failed`, ...).
    pub phase: String,
    /// Node the pod is scheduled on, if assigned.
    #[serde(default)]
    pub node_name: Option<String>,
    /// Per-container status.
    #[serde(default)]
    pub containers: Vec<ContainerStatus>,
}

impl PodInfo {
    /// Total restart count across all containers.
    #[must_use]
    pub fn total_restart_count(&self) -> u32 {
        self.containers.iter().map(|container| container.restart_count).sum()
    }

    /// The first waiting reason across containers, if any.
    #[must_use]
    pub fn waiting_reason(&self) -> Option<&str> {
        self.containers.iter().find_map(|container| container.waiting_reason.as_deref())
    }

    /// The first terminated reason across containers, if any.
    #[must_use]
    pub fn terminated_reason(&self) -> Option<&str> {
        self.containers.iter().find_map(|container| container.terminated_reason.as_deref())
    }
}

/// A deployment as reported by the cluster API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// Deployment name.
    pub name: String,
    /// Deployment namespace.
    pub namespace: String,
    /// Desired replica count.
    pub replicas_desired: u32,
    /// Ready replica count.
    #[serde(default)]
    pub replicas_ready: u32,
    /// Unavailable replica count.
    #[serde(default)]
    pub replicas_unavailable: u32,
    /// Observed generation.
    #[serde(default)]
    pub observed_generation: u64,
    /// Current generation.
    #[serde(default)]
    pub generation: u64,
    /// Creation timestamp, RFC 3339.
    pub creation_timestamp: String,
    /// Container image references in the pod template, in container order.
    #[serde(default)]
    pub images: Vec<String>,
}

/// A cluster event (warning or normal).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventInfo {
    /// `"Warning"` or `"Normal"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event reason (`FailedScheduling`, `BackOff`, ...).
    pub reason: String,
    /// Free-form message.
    #[serde(default)]
    pub message: String,
    /// Name of the object the event concerns.
    pub involved_object_name: String,
    /// When this event was last observed, RFC 3339.
    pub last_timestamp: String,
}

/// A single node condition (`DiskPressure`, `MemoryPressure`, `Ready`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeCondition {
    /// Condition type.
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Condition status (`"True"`, `"False"`, `"Unknown"`).
    pub status: String,
}

/// A node as reported by the cluster API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node name.
    pub name: String,
    /// All reported conditions.
    #[serde(default)]
    pub conditions: Vec<NodeCondition>,
}

impl NodeInfo {
    /// Conditions that indicate the node is unhealthy: anything other than
    /// `Ready=True`, or any pressure condition reporting `True`.
    #[must_use]
    pub fn unhealthy_conditions(&self) -> Vec<String> {
        self.conditions
            .iter()
            .filter(|condition| {
                (condition.condition_type == "Ready" && condition.status != "True")
                    || (condition.condition_type != "Ready" && condition.status == "True")
            })
            .map(|condition| condition.condition_type.clone())
            .collect()
    }
}

/// A horizontal pod autoscaler as reported by the cluster API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HpaInfo {
    /// HPA name.
    pub name: String,
    /// HPA namespace.
    pub namespace: String,
    /// Current replica count.
    pub current_replicas: u32,
    /// Maximum configured replicas.
    pub max_replicas: u32,
    /// Desired replica count.
    #[serde(default)]
    pub desired_replicas: u32,
}

impl HpaInfo {
    /// True when the autoscaler is pinned at `max_replicas`.
    #[must_use]
    pub const fn at_max(&self) -> bool {
        self.current_replicas >= self.max_replicas && self.max_replicas > 0
    }
}

/// A replica set, grouped under its owning deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicaSetInfo {
    /// Replica set name.
    pub name: String,
    /// Replica set namespace.
    pub namespace: String,
    /// Name of the owning deployment.
    pub owner_deployment: String,
    /// Revision number (from the `deployment.kubernetes.io/revision`
    /// annotation).
    pub revision: u64,
    /// Container image references in the pod template, in container order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Creation timestamp, RFC 3339.
    pub creation_timestamp: String,
}

/// A config map, named for change-history correlation only; contents are
/// not inspected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigMapInfo {
    /// Config map name.
    pub name: String,
    /// Config map namespace.
    pub namespace: String,
    /// Creation timestamp, RFC 3339.
    pub creation_timestamp: String,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    items: Vec<T>,
}

/// Client for the orchestrator's cluster-state API.
#[derive(Clone)]
pub struct ClusterApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClusterApiClient {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the underlying HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ClusterApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| ClusterApiError::Request(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    async fn get_list<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ClusterApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| ClusterApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ClusterApiError::Status(response.status().as_u16()));
        }
        let envelope: ListEnvelope<T> =
            response.json().await.map_err(|err| ClusterApiError::Request(err.to_string()))?;
        Ok(envelope.items)
    }

    /// Lists pods in `namespace`, optionally filtered by `app=<service>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_pods(&self, namespace: &str, app: Option<&str>) -> Result<Vec<PodInfo>, ClusterApiError> {
        let mut query = vec![("namespace", namespace)];
        if let Some(app) = app {
            query.push(("app", app));
        }
        self.get_list("/api/v1/pods", &query).await
    }

    /// Lists deployments in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_deployments(&self, namespace: &str) -> Result<Vec<DeploymentInfo>, ClusterApiError> {
        self.get_list("/api/v1/deployments", &[("namespace", namespace)]).await
    }

    /// Fetches a single deployment by name.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails, the response
    /// cannot be parsed, or no such deployment exists.
    pub async fn get_deployment(&self, namespace: &str, name: &str) -> Result<DeploymentInfo, ClusterApiError> {
        let mut matches = self.list_deployments(namespace).await?;
        matches
            .iter()
            .position(|deployment| deployment.name == name)
            .map(|index| matches.swap_remove(index))
            .ok_or(ClusterApiError::Status(404))
    }

    /// Lists warning and normal events in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_events(&self, namespace: &str) -> Result<Vec<EventInfo>, ClusterApiError> {
        self.get_list("/api/v1/events", &[("namespace", namespace)]).await
    }

    /// Lists all cluster nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_nodes(&self) -> Result<Vec<NodeInfo>, ClusterApiError> {
        self.get_list("/api/v1/nodes", &[]).await
    }

    /// Lists horizontal pod autoscalers in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_hpas(&self, namespace: &str) -> Result<Vec<HpaInfo>, ClusterApiError> {
        self.get_list("/api/v1/hpas", &[("namespace", namespace)]).await
    }

    /// Lists replica sets in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSetInfo>, ClusterApiError> {
        self.get_list("/api/v1/replicasets", &[("namespace", namespace)]).await
    }

    /// Lists config maps in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the response
    /// cannot be parsed.
    pub async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMapInfo>, ClusterApiError> {
        self.get_list("/api/v1/configmaps", &[("namespace", namespace)]).await
    }

    /// Deletes a pod by name (used by the `restart_pod` remediation).
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the API
    /// reports a non-success status.
    pub async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterApiError> {
        let url = format!("{}/api/v1/pods/{namespace}/{name}", self.base_url);
        let response =
            self.client.delete(url).send().await.map_err(|err| ClusterApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ClusterApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Patches a deployment's pod template `restartedAt` annotation to
    /// `value` (used by the `restart_deployment` remediation).
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the API
    /// reports a non-success status.
    pub async fn patch_restarted_at(
        &self,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), ClusterApiError> {
        self.patch_deployment(namespace, name, &serde_json::json!({ "restartedAt": value })).await
    }

    /// Patches a deployment's `spec.replicas`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the API
    /// reports a non-success status.
    pub async fn patch_replicas(&self, namespace: &str, name: &str, replicas: u32) -> Result<(), ClusterApiError> {
        self.patch_deployment(namespace, name, &serde_json::json!({ "replicas": replicas })).await
    }

    /// Replaces a deployment's pod template image list with `images`, used
    /// by `rollback_deployment` to copy a previous replica set's template.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the API
    /// reports a non-success status.
    pub async fn replace_pod_template_images(
        &self,
        namespace: &str,
        name: &str,
        images: &[String],
    ) -> Result<(), ClusterApiError> {
        self.patch_deployment(namespace, name, &serde_json::json!({ "images": images })).await
    }

    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        body: &serde_json::Value,
    ) -> Result<(), ClusterApiError> {
        let url = format!("{}/api/v1/deployments/{namespace}/{name}", self.base_url);
        let response = self
            .client
            .patch(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClusterApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ClusterApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Patches a node's `spec.unschedulable` flag (used by `cordon_node`).
    ///
    /// # Errors
    ///
    /// Returns [`ClusterApiError`] when the request fails or the API
    /// reports a non-success status.
    pub async fn patch_node_unschedulable(&self, name: &str, unschedulable: bool) -> Result<(), ClusterApiError> {
        let url = format!("{}/api/v1/nodes/{name}", self.base_url);
        let response = self
            .client
            .patch(url)
            .json(&serde_json::json!({ "unschedulable": unschedulable }))
            .send()
            .await
            .map_err(|err| ClusterApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ClusterApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn hpa_at_max_requires_positive_max_replicas() {
        let hpa = HpaInfo { name: "h".into(), namespace: "default".into(), current_replicas: 0, max_replicas: 0, desired_replicas: 0 };
        assert!(!hpa.at_max());
    }

    #[test]
    fn node_unhealthy_conditions_flags_pressure_and_not_ready() {
        let node = NodeInfo {
            name: "n".into(),
            conditions: vec![
                NodeCondition { condition_type: "Ready".into(), status: "False".into() },
                NodeCondition { condition_type: "DiskPressure".into(), status: "True".into() },
                NodeCondition { condition_type: "MemoryPressure".into(), status: "False".into() },
            ],
        };
        let unhealthy = node.unhealthy_conditions();
        assert!(unhealthy.contains(&"Ready".to_string()));
        assert!(unhealthy.contains(&"DiskPressure".to_string()));
        assert!(!unhealthy.contains(&"MemoryPressure".to_string()));
    }

    #[test]
    fn pod_total_restart_count_sums_containers() {
        let pod = PodInfo {
            name: "p".into(),
            namespace: "default".into(),
            labels: BTreeMap::new(),
            phase: "Running".into(),
            node_name: None,
            containers: vec![
                ContainerStatus { restart_count: 2, ..Default::default() },
                ContainerStatus { restart_count: 5, ..Default::default() },
            ],
        };
        assert_eq!(pod.total_restart_count(), 7);
    }
}
