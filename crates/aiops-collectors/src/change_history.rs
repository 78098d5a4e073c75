// crates/aiops-collectors/src/change_history.rs
// ============================================================================
// Module: Change History Collector
// Description: Collects recent deploys and config changes from the cluster
//              API's deployment/replica-set/config-map views.
// Purpose: Surface whether a recent change correlates with the incident's
//          time window, and detect image changes between the two newest
//          replica set revisions of a deployment.
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
use crate::cluster_client::DeploymentInfo;
use crate::cluster_client::ReplicaSetInfo;

const RECENT_CHANGE_WINDOW_MINUTES: i64 = 30;

/// Collector that surfaces recent deploys and config changes.
pub struct ChangeHistoryCollector {
    client: ClusterApiClient,
}

impl ChangeHistoryCollector {
    /// Builds a collector over the given cluster API client.
    #[must_use]
    pub const fn new(client: ClusterApiClient) -> Self {
        Self { client }
    }

    fn deployment_signal_strength(deployment: &DeploymentInfo, window: aiops_core::TimeWindow) -> f64 {
        if Self::deployment_is_recent(deployment, window) {
            let Ok(created) = Timestamp::parse_rfc3339(&deployment.creation_timestamp) else {
                return 0.30;
            };
            let minutes_since_window_end = (window.end.unix_timestamp() - created.unix_timestamp()) / 60;
            if minutes_since_window_end <= RECENT_CHANGE_WINDOW_MINUTES {
                return 0.95;
            }
            return 0.85;
        }
        if deployment.generation != deployment.observed_generation {
            return 0.70;
        }
        0.30
    }

    /// Whether `deployment` was created within the incident's collection
    /// window; this drives `SignalBundle::has_recent_deploy` independently
    /// of which signal-strength tier the deployment falls into.
    fn deployment_is_recent(deployment: &DeploymentInfo, window: aiops_core::TimeWindow) -> bool {
        Timestamp::parse_rfc3339(&deployment.creation_timestamp).is_ok_and(|created| created >= window.start)
    }
}

fn newest_two_revisions<'a>(
    replica_sets: &'a [ReplicaSetInfo],
    deployment_name: &str,
) -> Option<(&'a ReplicaSetInfo, &'a ReplicaSetInfo)> {
    let mut owned: Vec<&ReplicaSetInfo> =
        replica_sets.iter().filter(|replica_set| replica_set.owner_deployment == deployment_name).collect();
    owned.sort_by_key(|replica_set| std::cmp::Reverse(replica_set.revision));
    match owned.as_slice() {
        [newest, previous, ..] => Some((*newest, *previous)),
        _ => None,
    }
}

#[async_trait]
impl Collector for ChangeHistoryCollector {
    fn name(&self) -> &str {
        "change_history"
    }

    async fn collect(
        &self,
        ctx: &CollectorContext,
        incident: &Incident,
    ) -> Result<CollectionOutcome, CollectorError> {
        let start = Instant::now();
        let mut outcome = CollectionOutcome::default();

        let deployments = match self.client.list_deployments(&ctx.namespace).await {
            Ok(deployments) => deployments,
            Err(err) => {
                outcome.errors.push(format!("list_deployments: {err}"));
                outcome.duration = start.elapsed();
                return Ok(outcome);
            }
        };
        let replica_sets = match self.client.list_replica_sets(&ctx.namespace).await {
            Ok(replica_sets) => replica_sets,
            Err(err) => {
                outcome.errors.push(format!("list_replicasets: {err}"));
                Vec::new()
            }
        };

        for deployment in &deployments {
            if let Some(service) = incident.service.as_deref() {
                if !deployment.name.contains(service) {
                    continue;
                }
            }

            let signal_strength = Self::deployment_signal_strength(deployment, ctx.window);
            if signal_strength < 0.70 {
                continue;
            }

            let has_recent_deploy = Self::deployment_is_recent(deployment, ctx.window);
            outcome.evidence.push(Evidence {
                id: new_uuid_string().into(),
                incident_id: incident.id.clone(),
                evidence_type: EvidenceType::ChangeHistory,
                source: "cluster-api".to_string(),
                entity_name: deployment.name.clone(),
                entity_namespace: deployment.namespace.clone(),
                data: serde_json::json!({
                    "creation_timestamp": deployment.creation_timestamp,
                    "generation": deployment.generation,
                    "observed_generation": deployment.observed_generation,
                    "has_recent_deploy": has_recent_deploy,
                }),
                signal_strength: Evidence::clamp_signal_strength(signal_strength),
                time_window: ctx.window,
                collected_at: Timestamp::now(),
            });

            let Some((newest, previous)) = newest_two_revisions(&replica_sets, &deployment.name) else {
                continue;
            };

            let change_id = GraphEntity::change_event_id(&deployment.namespace, &deployment.name, newest.revision);
            let mut properties = BTreeMap::new();
            properties.insert("revision".to_string(), newest.revision.to_string());
            properties.insert("creation_timestamp".to_string(), newest.creation_timestamp.clone());
            outcome.entities.push(GraphEntity {
                id: change_id.clone(),
                kind: EntityKind::ChangeEvent,
                label: EntityKind::ChangeEvent.label().to_string(),
                namespace: deployment.namespace.clone(),
                name: format!("{}-{}", deployment.name, newest.revision),
                properties,
            });
            outcome.relations.push(GraphRelation {
                from: GraphEntity::composite_id(EntityKind::Deployment, &deployment.namespace, &deployment.name),
                to: change_id.clone(),
                kind: RelationKind::HasRecentChange,
                properties: BTreeMap::new(),
            });
            outcome.relations.push(GraphRelation {
                from: GraphEntity::incident_node_id(incident.id.as_str()),
                to: change_id,
                kind: RelationKind::CorrelatesWith,
                properties: BTreeMap::new(),
            });

            if newest.images != previous.images {
                outcome.evidence.push(Evidence {
                    id: new_uuid_string().into(),
                    incident_id: incident.id.clone(),
                    evidence_type: EvidenceType::ChangeHistory,
                    source: "cluster-api".to_string(),
                    entity_name: deployment.name.clone(),
                    entity_namespace: deployment.namespace.clone(),
                    data: serde_json::json!({
                        "kind": "image_change",
                        "previous_images": previous.images,
                        "current_images": newest.images,
                        "has_image_change": true,
                    }),
                    signal_strength: 0.85,
                    time_window: ctx.window,
                    collected_at: Timestamp::now(),
                });
            }
        }

        if let Ok(config_maps) = self.client.list_config_maps(&ctx.namespace).await {
            for config_map in &config_maps {
                let Ok(created) = Timestamp::parse_rfc3339(&config_map.creation_timestamp) else { continue };
                if created < ctx.window.start {
                    continue;
                }
                outcome.evidence.push(Evidence {
                    id: new_uuid_string().into(),
                    incident_id: incident.id.clone(),
                    evidence_type: EvidenceType::ChangeHistory,
                    source: "cluster-api".to_string(),
                    entity_name: config_map.name.clone(),
                    entity_namespace: config_map.namespace.clone(),
                    data: serde_json::json!({ "creation_timestamp": config_map.creation_timestamp }),
                    signal_strength: 0.70,
                    time_window: ctx.window,
                    collected_at: Timestamp::now(),
                });
            }
        }

        outcome.duration = start.elapsed();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn newest_two_revisions_picks_highest_by_revision() {
        let replica_sets = vec![
            ReplicaSetInfo {
                name: "d-1".into(),
                namespace: "default".into(),
                owner_deployment: "d".into(),
                revision: 1,
                images: vec!["app:v1".into()],
                creation_timestamp: String::new(),
            },
            ReplicaSetInfo {
                name: "d-3".into(),
                namespace: "default".into(),
                owner_deployment: "d".into(),
                revision: 3,
                images: vec!["app:v3".into()],
                creation_timestamp: String::new(),
            },
            ReplicaSetInfo {
                name: "d-2".into(),
                namespace: "default".into(),
                owner_deployment: "d".into(),
                revision: 2,
                images: vec!["app:v2".into()],
                creation_timestamp: String::new(),
            },
        ];
        let (newest, previous) = newest_two_revisions(&replica_sets, "d").expect("two revisions present");
        assert_eq!(newest.revision, 3);
        assert_eq!(previous.revision, 2);
    }

    #[test]
    fn newest_two_revisions_none_for_single_revision() {
        let replica_sets = vec![ReplicaSetInfo {
            name: "d-1".into(),
            namespace: "default".into(),
            owner_deployment: "d".into(),
            revision: 1,
            images: vec![],
            creation_timestamp: String::new(),
        }];
        assert!(newest_two_revisions(&replica_sets, "d").is_none());
    }

    #[test]
    fn deployment_is_recent_true_when_created_inside_the_window() {
        let now = Timestamp::now();
        let window = aiops_core::TimeWindow::new(now, now);
        let deployment = DeploymentInfo { creation_timestamp: now.to_string(), ..Default::default() };
        assert!(ChangeHistoryCollector::deployment_is_recent(&deployment, window));
    }

    #[test]
    fn deployment_is_recent_false_for_unparsable_timestamp() {
        let now = Timestamp::now();
        let window = aiops_core::TimeWindow::new(now, now);
        let deployment = DeploymentInfo { creation_timestamp: "not-a-timestamp".into(), ..Default::default() };
        assert!(!ChangeHistoryCollector::deployment_is_recent(&deployment, window));
    }

    #[test]
    fn single_revision_deployment_still_emits_recency_evidence() {
        let now = Timestamp::now();
        let window = aiops_core::TimeWindow::new(now, now);
        let deployment =
            DeploymentInfo { name: "checkout-api".into(), creation_timestamp: now.to_string(), ..Default::default() };
        let replica_sets: Vec<ReplicaSetInfo> = Vec::new();
        assert!(newest_two_revisions(&replica_sets, &deployment.name).is_none());
        let signal_strength = ChangeHistoryCollector::deployment_signal_strength(&deployment, window);
        assert!(signal_strength >= 0.70);
        assert!(ChangeHistoryCollector::deployment_is_recent(&deployment, window));
    }
}
