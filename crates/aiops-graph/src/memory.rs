// crates/aiops-graph/src/memory.rs
// ============================================================================
// Module: In-Memory Graph Store
// Description: A GraphStore implementation backed by in-process maps.
// Purpose: Deterministic test double and the CLI's offline-mode backend.
// Dependencies: aiops-core
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;

use aiops_core::GraphEntity;
use aiops_core::GraphEntityId;
use aiops_core::GraphRelation;
use aiops_core::IncidentId;
use aiops_core::interfaces::GraphHealth;
use aiops_core::interfaces::GraphStore;
use aiops_core::interfaces::GraphStoreError;
use async_trait::async_trait;

#[derive(Default)]
struct State {
    entities: HashMap<GraphEntityId, GraphEntity>,
    relations: HashMap<(GraphEntityId, String, GraphEntityId), GraphRelation>,
}

/// In-memory [`GraphStore`] with the same `MERGE`-on-id /
/// `MERGE`-on-`(source,type,target)` semantics as the Neo4j-backed store
/// (`spec.md` §3, I6), used by tests and the CLI's offline mode.
#[derive(Default)]
pub struct InMemoryGraphStore {
    state: Mutex<State>,
}

impl InMemoryGraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_entity(&self, entity: &GraphEntity) -> Result<(), GraphStoreError> {
        let mut state = self.state.lock().map_err(|_| GraphStoreError::Backend("poisoned lock".to_string()))?;
        match state.entities.get_mut(&entity.id) {
            Some(existing) => {
                existing.properties.extend(entity.properties.clone());
            }
            None => {
                state.entities.insert(entity.id.clone(), entity.clone());
            }
        }
        Ok(())
    }

    async fn upsert_relation(&self, relation: &GraphRelation) -> Result<(), GraphStoreError> {
        let mut state = self.state.lock().map_err(|_| GraphStoreError::Backend("poisoned lock".to_string()))?;
        if !state.entities.contains_key(&relation.from) || !state.entities.contains_key(&relation.to) {
            // Missing endpoints do not throw; the relation is skipped
            // (spec.md §4.3).
            return Ok(());
        }
        let key = (relation.from.clone(), format!("{:?}", relation.kind), relation.to.clone());
        state
            .relations
            .entry(key)
            .and_modify(|existing| existing.properties.extend(relation.properties.clone()))
            .or_insert_with(|| relation.clone());
        Ok(())
    }

    async fn neighborhood(
        &self,
        incident_id: &IncidentId,
        depth: u32,
    ) -> Result<(Vec<GraphEntity>, Vec<GraphRelation>), GraphStoreError> {
        let state = self.state.lock().map_err(|_| GraphStoreError::Backend("poisoned lock".to_string()))?;
        let start = GraphEntity::incident_node_id(incident_id.as_str());
        if !state.entities.contains_key(&start) {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut visited: BTreeMap<GraphEntityId, ()> = BTreeMap::new();
        visited.insert(start.clone(), ());
        let mut frontier = vec![start];
        for _ in 0 .. depth.max(1) {
            let mut next_frontier = Vec::new();
            for node in &frontier {
                for relation in state.relations.values() {
                    if &relation.from == node && !visited.contains_key(&relation.to) {
                        visited.insert(relation.to.clone(), ());
                        next_frontier.push(relation.to.clone());
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        let entities = visited.keys().filter_map(|id| state.entities.get(id)).cloned().collect();
        let relations = state
            .relations
            .values()
            .filter(|relation| visited.contains_key(&relation.from) && visited.contains_key(&relation.to))
            .cloned()
            .collect();
        Ok((entities, relations))
    }

    async fn ensure_constraints(&self) -> Result<(), GraphStoreError> {
        Ok(())
    }

    async fn health(&self) -> GraphHealth {
        GraphHealth::Healthy
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::collections::BTreeMap;

    use aiops_core::EntityKind;
    use aiops_core::RelationKind;

    use super::*;

    fn entity(kind: EntityKind, id: GraphEntityId, name: &str) -> GraphEntity {
        GraphEntity {
            id,
            kind,
            label: kind.label().to_string(),
            namespace: "default".to_string(),
            name: name.to_string(),
            properties: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn upserting_same_entity_twice_merges_properties() {
        let store = InMemoryGraphStore::new();
        let id = GraphEntity::composite_id(EntityKind::Pod, "default", "api-1");
        let mut first = entity(EntityKind::Pod, id.clone(), "api-1");
        first.properties.insert("phase".to_string(), "Running".to_string());
        store.upsert_entity(&first).await.unwrap();

        let mut second = first.clone();
        second.properties.insert("phase".to_string(), "CrashLoopBackOff".to_string());
        store.upsert_entity(&second).await.unwrap();

        let (entities, _) = store.neighborhood(&IncidentId::new("none"), 1).await.unwrap();
        assert!(entities.is_empty());
        let state = store.state.lock().unwrap();
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.entities[&id].properties.get("phase").unwrap(), "CrashLoopBackOff");
    }

    #[tokio::test]
    async fn relation_with_missing_endpoint_is_skipped_not_errored() {
        let store = InMemoryGraphStore::new();
        let pod_id = GraphEntity::composite_id(EntityKind::Pod, "default", "api-1");
        store.upsert_entity(&entity(EntityKind::Pod, pod_id.clone(), "api-1")).await.unwrap();
        let missing_node = GraphEntity::node_id("node-that-does-not-exist");
        let relation = GraphRelation {
            from: pod_id,
            to: missing_node,
            kind: RelationKind::ScheduledOn,
            properties: BTreeMap::new(),
        };
        assert!(store.upsert_relation(&relation).await.is_ok());
        let state = store.state.lock().unwrap();
        assert!(state.relations.is_empty());
    }

    #[tokio::test]
    async fn neighborhood_returns_incident_subgraph_within_depth() {
        let store = InMemoryGraphStore::new();
        let incident_id = IncidentId::new("inc-1");
        let incident_node = GraphEntity::incident_node_id("inc-1");
        let pod_id = GraphEntity::composite_id(EntityKind::Pod, "default", "api-1");
        store.upsert_entity(&entity(EntityKind::Incident, incident_node.clone(), "inc-1")).await.unwrap();
        store.upsert_entity(&entity(EntityKind::Pod, pod_id.clone(), "api-1")).await.unwrap();
        store
            .upsert_relation(&GraphRelation {
                from: incident_node,
                to: pod_id,
                kind: RelationKind::Affects,
                properties: BTreeMap::new(),
            })
            .await
            .unwrap();

        let (entities, relations) = store.neighborhood(&incident_id, 1).await.unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(relations.len(), 1);
    }
}
