// crates/aiops-collectors/src/cluster_state.rs
// ============================================================================
// Module: Cluster State Collector
// Description: Collects pod, deployment, node, HPA, and event evidence from
//              the cluster API.
// Purpose: Turn live cluster state into evidence and graph updates the
//          rules engine and graph assembler can consume.
// Dependencies: crate::cluster_client, aiops-core, time
// ============================================================================

use std::collections::BTreeMap;
use std::time::Instant;

use aiops_core::CollectionOutcome;
use aiops_core::Collector;
use aiops_core::CollectorContext;
use aiops_core::CollectorError;
use aiops_core::EntityKind;
use aiops_core::Evidence;
use aiops_core::EvidenceType;
use aiops_core::GraphEntity;
use aiops_core::GraphRelation;
use aiops_core::Incident;
use aiops_core::RelationKind;
use aiops_core::Timestamp;
use aiops_core::new_uuid_string;
use async_trait::async_trait;

use crate::cluster_client::ClusterApiClient;
use crate::cluster_client::HpaInfo;
use crate::cluster_client::NodeInfo;
use crate::cluster_client::PodInfo;

/// Collector that turns pod/deployment/node/HPA/event state into evidence.
pub struct ClusterStateCollector {
    client: ClusterApiClient,
}

impl ClusterStateCollector {
    /// Builds a collector over the given cluster API client.
    #[must_use]
    pub const fn new(client: ClusterApiClient) -> Self {
        Self { client }
    }

    fn pod_signal_strength(pod: &PodInfo) -> f64 {
        if matches!(pod.waiting_reason(), Some("CrashLoopBackOff" | "ImagePullBackOff" | "ErrImagePull")) {
            return 0.95;
        }
        if pod.terminated_reason() == Some("OOMKilled") {
            return 0.95;
        }
        if pod.total_restart_count() > 3 {
            return 0.80;
        }
        if pod.phase != "Running" {
            return 0.70;
        }
        0.30
    }

    fn pod_evidence(incident: &Incident, pod: &PodInfo) -> Evidence {
        let signal_strength = Self::pod_signal_strength(pod);
        Evidence {
            id: new_uuid_string().into(),
            incident_id: incident.id.clone(),
            evidence_type: EvidenceType::ClusterState,
            source: "cluster-api".to_string(),
            entity_name: pod.name.clone(),
            entity_namespace: pod.namespace.clone(),
            data: serde_json::json!({
                "name": pod.name,
                "namespace": pod.namespace,
                "phase": pod.phase,
                "node_name": pod.node_name,
                "restart_count": pod.total_restart_count(),
                "waiting_reason": pod.waiting_reason(),
                "terminated_reason": pod.terminated_reason(),
            }),
            signal_strength: Evidence::clamp_signal_strength(signal_strength),
            time_window: incident_window(incident),
            collected_at: Timestamp::now(),
        }
    }

    fn pod_entity_and_relations(incident: &Incident, pod: &PodInfo) -> (GraphEntity, Vec<GraphRelation>) {
        let mut properties = BTreeMap::new();
        properties.insert("phase".to_string(), pod.phase.clone());
        properties.insert("restart_count".to_string(), pod.total_restart_count().to_string());
        if let Some(reason) = pod.waiting_reason() {
            properties.insert("waiting_reason".to_string(), reason.to_string());
        }
        if let Some(reason) = pod.terminated_reason() {
            properties.insert("terminated_reason".to_string(), reason.to_string());
        }

        let entity_id = GraphEntity::composite_id(EntityKind::Pod, &pod.namespace, &pod.name);
        let entity = GraphEntity {
            id: entity_id.clone(),
            kind: EntityKind::Pod,
            label: EntityKind::Pod.label().to_string(),
            namespace: pod.namespace.clone(),
            name: pod.name.clone(),
            properties,
        };

        let mut relations = vec![GraphRelation {
            from: GraphEntity::incident_node_id(incident.id.as_str()),
            to: entity_id.clone(),
            kind: RelationKind::Affects,
            properties: BTreeMap::new(),
        }];
        if let Some(node_name) = &pod.node_name {
            relations.push(GraphRelation {
                from: entity_id,
                to: GraphEntity::node_id(node_name),
                kind: RelationKind::ScheduledOn,
                properties: BTreeMap::new(),
            });
        }
        (entity, relations)
    }
}

fn incident_window(incident: &Incident) -> aiops_core::TimeWindow {
    aiops_core::TimeWindow::new(incident.started_at, Timestamp::now())
}

#[async_trait]
impl Collector for ClusterStateCollector {
    fn name(&self) -> &str {
        "cluster_state"
    }

    async fn collect(
        &self,
        ctx: &CollectorContext,
        incident: &Incident,
    ) -> Result<CollectionOutcome, CollectorError> {
        let start = Instant::now();
        let mut outcome = CollectionOutcome::default();

        match self.client.list_pods(&ctx.namespace, ctx.service.as_deref()).await {
            Ok(pods) => {
                for pod in &pods {
                    outcome.evidence.push(Self::pod_evidence(incident, pod));
                    let (entity, relations) = Self::pod_entity_and_relations(incident, pod);
                    outcome.entities.push(entity);
                    outcome.relations.extend(relations);
                }
            }
            Err(err) => outcome.errors.push(format!("list_pods: {err}")),
        }

        match self.client.list_deployments(&ctx.namespace).await {
            Ok(deployments) => {
                for deployment in &deployments {
                    let signal_strength = if deployment.replicas_unavailable > 0 {
                        0.80
                    } else if deployment.replicas_ready < deployment.replicas_desired {
                        0.70
                    } else {
                        0.30
                    };
                    outcome.evidence.push(Evidence {
                        id: new_uuid_string().into(),
                        incident_id: incident.id.clone(),
                        evidence_type: EvidenceType::ClusterState,
                        source: "cluster-api".to_string(),
                        entity_name: deployment.name.clone(),
                        entity_namespace: deployment.namespace.clone(),
                        data: serde_json::to_value(deployment).unwrap_or(serde_json::Value::Null),
                        signal_strength: Evidence::clamp_signal_strength(signal_strength),
                        time_window: incident_window(incident),
                        collected_at: Timestamp::now(),
                    });

                    let mut properties = BTreeMap::new();
                    properties.insert("replicas_desired".to_string(), deployment.replicas_desired.to_string());
                    properties.insert("replicas_ready".to_string(), deployment.replicas_ready.to_string());
                    let entity_id =
                        GraphEntity::composite_id(EntityKind::Deployment, &deployment.namespace, &deployment.name);
                    outcome.entities.push(GraphEntity {
                        id: entity_id.clone(),
                        kind: EntityKind::Deployment,
                        label: EntityKind::Deployment.label().to_string(),
                        namespace: deployment.namespace.clone(),
                        name: deployment.name.clone(),
                        properties,
                    });
                    outcome.relations.push(GraphRelation {
                        from: GraphEntity::incident_node_id(incident.id.as_str()),
                        to: entity_id,
                        kind: RelationKind::Affects,
                        properties: BTreeMap::new(),
                    });
                }
            }
            Err(err) => outcome.errors.push(format!("list_deployments: {err}")),
        }

        match self.client.list_events(&ctx.namespace).await {
            Ok(events) => {
                const ACTIONABLE_WARNING_REASONS: &[&str] =
                    &["FailedScheduling", "FailedMount", "BackOff", "Unhealthy", "Failed"];
                for event in &events {
                    let signal_strength = if event.event_type == "Warning"
                        && ACTIONABLE_WARNING_REASONS.contains(&event.reason.as_str())
                    {
                        0.90
                    } else if event.event_type == "Warning" {
                        0.70
                    } else {
                        0.40
                    };
                    outcome.evidence.push(Evidence {
                        id: new_uuid_string().into(),
                        incident_id: incident.id.clone(),
                        evidence_type: EvidenceType::ClusterState,
                        source: "cluster-api".to_string(),
                        entity_name: event.involved_object_name.clone(),
                        entity_namespace: ctx.namespace.clone(),
                        data: serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
                        signal_strength: Evidence::clamp_signal_strength(signal_strength),
                        time_window: incident_window(incident),
                        collected_at: Timestamp::now(),
                    });
                }
            }
            Err(err) => outcome.errors.push(format!("list_events: {err}")),
        }

        match self.client.list_hpas(&ctx.namespace).await {
            Ok(hpas) => {
                for hpa in &hpas {
                    if hpa.at_max() {
                        outcome.evidence.push(hpa_evidence(incident, hpa));
                        let entity_id = GraphEntity::composite_id(EntityKind::Hpa, &hpa.namespace, &hpa.name);
                        let mut properties = BTreeMap::new();
                        properties.insert("current_replicas".to_string(), hpa.current_replicas.to_string());
                        properties.insert("max_replicas".to_string(), hpa.max_replicas.to_string());
                        outcome.entities.push(GraphEntity {
                            id: entity_id,
                            kind: EntityKind::Hpa,
                            label: EntityKind::Hpa.label().to_string(),
                            namespace: hpa.namespace.clone(),
                            name: hpa.name.clone(),
                            properties,
                        });
                    }
                }
            }
            Err(err) => outcome.errors.push(format!("list_hpas: {err}")),
        }

        if let Ok(nodes) = self.client.list_nodes().await {
            for node in &nodes {
                let unhealthy = node.unhealthy_conditions();
                if unhealthy.is_empty() {
                    continue;
                }
                outcome.evidence.push(node_evidence(incident, node, &unhealthy));
                let mut properties = BTreeMap::new();
                properties.insert("unhealthy_conditions".to_string(), unhealthy.join(","));
                outcome.entities.push(GraphEntity {
                    id: GraphEntity::node_id(&node.name),
                    kind: EntityKind::Node,
                    label: EntityKind::Node.label().to_string(),
                    namespace: String::new(),
                    name: node.name.clone(),
                    properties,
                });
            }
        }

        outcome.duration = start.elapsed();
        Ok(outcome)
    }
}

fn hpa_evidence(incident: &Incident, hpa: &HpaInfo) -> Evidence {
    Evidence {
        id: new_uuid_string().into(),
        incident_id: incident.id.clone(),
        evidence_type: EvidenceType::ClusterState,
        source: "cluster-api".to_string(),
        entity_name: hpa.name.clone(),
        entity_namespace: hpa.namespace.clone(),
        data: serde_json::json!({
            "name": hpa.name,
            "namespace": hpa.namespace,
            "current_replicas": hpa.current_replicas,
            "max_replicas": hpa.max_replicas,
            "hpa_at_max": hpa.at_max(),
        }),
        signal_strength: 0.80,
        time_window: incident_window(incident),
        collected_at: Timestamp::now(),
    }
}

fn node_evidence(incident: &Incident, node: &NodeInfo, unhealthy: &[String]) -> Evidence {
    Evidence {
        id: new_uuid_string().into(),
        incident_id: incident.id.clone(),
        evidence_type: EvidenceType::ClusterState,
        source: "cluster-api".to_string(),
        entity_name: node.name.clone(),
        entity_namespace: String::new(),
        data: serde_json::json!({ "node_name": node.name, "node_conditions": unhealthy }),
        signal_strength: 0.85,
        time_window: incident_window(incident),
        collected_at: Timestamp::now(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;
    use crate::cluster_client::ContainerStatus;

    #[test]
    fn crash_loop_backoff_signals_high() {
        let pod = PodInfo {
            name: "p".into(),
            namespace: "default".into(),
            labels: BTreeMap::new(),
            phase: "Running".into(),
            node_name: None,
            containers: vec![ContainerStatus {
                waiting_reason: Some("CrashLoopBackOff".into()),
                ..Default::default()
            }],
        };
        assert!((ClusterStateCollector::pod_signal_strength(&pod) - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn healthy_running_pod_signals_low() {
        let pod = PodInfo {
            name: "p".into(),
            namespace: "default".into(),
            labels: BTreeMap::new(),
            phase: "Running".into(),
            node_name: None,
            containers: vec![ContainerStatus { restart_count: 0, ..Default::default() }],
        };
        assert!((ClusterStateCollector::pod_signal_strength(&pod) - 0.30).abs() < f64::EPSILON);
    }

    #[test]
    fn excessive_restarts_signal_high_without_waiting_reason() {
        let pod = PodInfo {
            name: "p".into(),
            namespace: "default".into(),
            labels: BTreeMap::new(),
            phase: "Running".into(),
            node_name: None,
            containers: vec![ContainerStatus { restart_count: 9, ..Default::default() }],
        };
        assert!((ClusterStateCollector::pod_signal_strength(&pod) - 0.80).abs() < f64::EPSILON);
    }

    fn test_incident() -> Incident {
        Incident {
            id: "i".into(),
            fingerprint: aiops_core::Fingerprint::from_hex("a".repeat(32)),
            title: "CrashLoopBackOff: checkout".into(),
            severity: aiops_core::Severity::High,
            status: aiops_core::IncidentStatus::Open,
            source: "alertmanager".into(),
            cluster: "prod".into(),
            namespace: "checkout".into(),
            service: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            started_at: Timestamp::now(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn pod_evidence_emits_flat_waiting_and_terminated_reasons() {
        let incident = test_incident();
        let pod = PodInfo {
            name: "checkout-api-abc".into(),
            namespace: "checkout".into(),
            labels: BTreeMap::new(),
            phase: "Running".into(),
            node_name: Some("node-1".into()),
            containers: vec![ContainerStatus {
                waiting_reason: Some("CrashLoopBackOff".into()),
                restart_count: 5,
                ..Default::default()
            }],
        };
        let evidence = ClusterStateCollector::pod_evidence(&incident, &pod);
        assert_eq!(evidence.data["waiting_reason"], "CrashLoopBackOff");
        assert_eq!(evidence.data["restart_count"], 5);
        assert!(evidence.data["terminated_reason"].is_null());
    }

    #[test]
    fn node_evidence_keys_match_the_signal_extractor() {
        let incident = test_incident();
        let node = NodeInfo { name: "node-1".into(), conditions: Vec::new() };
        let evidence = node_evidence(&incident, &node, &["DiskPressure".to_string()]);
        assert_eq!(evidence.data["node_name"], "node-1");
        assert_eq!(evidence.data["node_conditions"][0], "DiskPressure");
    }

    #[test]
    fn hpa_evidence_flags_hpa_at_max() {
        let incident = test_incident();
        let hpa = HpaInfo {
            name: "checkout-api".into(),
            namespace: "checkout".into(),
            current_replicas: 10,
            max_replicas: 10,
            desired_replicas: 10,
        };
        let evidence = hpa_evidence(&incident, &hpa);
        assert_eq!(evidence.data["hpa_at_max"], true);
    }
}
