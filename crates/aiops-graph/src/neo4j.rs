// crates/aiops-graph/src/neo4j.rs
// ============================================================================
// Module: Neo4j Graph Store
// Description: neo4rs-backed GraphStore with MERGE upsert semantics.
// Purpose: Durable dependency graph per spec.md §4.3.
// Dependencies: aiops-core, neo4rs
// ============================================================================

//! ## Overview
//! Grounded on the pack's `dashflow-neo4j` crate's `Neo4jGraph` connection
//! setup (`neo4rs::Graph::new`, `graph.execute(Query::new(..).param(..))`),
//! generalized from a generic Cypher-execution trait to the control plane's
//! `GraphStore` MERGE contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use aiops_core::EntityKind;
use aiops_core::GraphEntity;
use aiops_core::GraphRelation;
use aiops_core::IncidentId;
use aiops_core::interfaces::GraphHealth;
use aiops_core::interfaces::GraphStore;
use aiops_core::interfaces::GraphStoreError;
use async_trait::async_trait;
use neo4rs::Graph;
use neo4rs::Query;
use neo4rs::query;

/// Node labels requiring a uniqueness constraint on `id`, per `spec.md`
/// §4.3.
const CONSTRAINED_LABELS: &[&str] = &["Incident", "Pod", "Deployment", "Service", "Node", "ChangeEvent"];

/// neo4rs-backed dependency graph store.
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
}

impl Neo4jGraphStore {
    /// Connects to a Neo4j/Bolt-compatible graph database.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError`] when the connection cannot be
    /// established.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, GraphStoreError> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|error| GraphStoreError::Unavailable(error.to_string()))?;
        Ok(Self { graph: Arc::new(graph) })
    }
}

fn properties_query(properties: &BTreeMap<String, String>, prefix: &str) -> (String, Vec<(String, String)>) {
    let mut set_clauses = Vec::with_capacity(properties.len());
    let mut params = Vec::with_capacity(properties.len());
    for (key, value) in properties {
        let param_name = format!("{prefix}_{key}");
        set_clauses.push(format!("n.`{key}` = ${param_name}"));
        params.push((param_name, value.clone()));
    }
    (set_clauses.join(", "), params)
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn upsert_entity(&self, entity: &GraphEntity) -> Result<(), GraphStoreError> {
        let (extra_set, params) = properties_query(&entity.properties, "p");
        let core_set = "n.namespace = $namespace, n.name = $name, n.kind = $kind";
        let set_clause =
            if extra_set.is_empty() { core_set.to_string() } else { format!("{core_set}, {extra_set}") };
        let cypher = format!("MERGE (n:`{}` {{id: $id}}) SET {set_clause}", entity.label);
        let mut statement = Query::new(cypher)
            .param("id", entity.id.as_str())
            .param("namespace", entity.namespace.as_str())
            .param("name", entity.name.as_str())
            .param("kind", entity.label.as_str());
        for (name, value) in params {
            statement = statement.param(&name, value);
        }
        self.graph.run(statement).await.map_err(|error| GraphStoreError::Backend(error.to_string()))
    }

    async fn upsert_relation(&self, relation: &GraphRelation) -> Result<(), GraphStoreError> {
        let label = relation_label(relation.kind);
        let (set_clause, params) = properties_query(&relation.properties, "r");
        let cypher = if set_clause.is_empty() {
            format!(
                "MATCH (a {{id: $from}}), (b {{id: $to}}) MERGE (a)-[:`{label}`]->(b)"
            )
        } else {
            format!(
                "MATCH (a {{id: $from}}), (b {{id: $to}}) MERGE (a)-[r:`{label}`]->(b) SET {set_clause}"
            )
        };
        let mut statement = Query::new(cypher).param("from", relation.from.as_str()).param("to", relation.to.as_str());
        for (name, value) in params {
            statement = statement.param(&name, value);
        }
        // Missing endpoints do not throw; the MATCH simply yields zero rows
        // and the MERGE is a no-op, satisfying spec.md §4.3's "skipped" rule.
        self.graph.run(statement).await.map_err(|error| GraphStoreError::Backend(error.to_string()))
    }

    async fn neighborhood(
        &self,
        incident_id: &IncidentId,
        depth: u32,
    ) -> Result<(Vec<GraphEntity>, Vec<GraphRelation>), GraphStoreError> {
        let incident_node_id = GraphEntity::incident_node_id(incident_id.as_str());

        let nodes_cypher =
            format!("MATCH (start {{id: $id}})-[*0..{depth}]-(connected) RETURN DISTINCT connected");
        let nodes_statement = Query::new(nodes_cypher).param("id", incident_node_id.as_str());
        let mut nodes_result = self
            .graph
            .execute(nodes_statement)
            .await
            .map_err(|error| GraphStoreError::Backend(error.to_string()))?;
        let mut entities = Vec::new();
        while let Some(row) =
            nodes_result.next().await.map_err(|error| GraphStoreError::Backend(error.to_string()))?
        {
            if let Ok(node) = row.get::<neo4rs::Node>("connected") {
                if let Some(entity) = entity_from_node(&node) {
                    entities.push(entity);
                }
            }
        }

        let relations_cypher = format!(
            "MATCH (start {{id: $id}})-[*0..{depth}]-(connected) \
             WITH collect(DISTINCT connected) + collect(DISTINCT start) AS nodes \
             UNWIND nodes AS a MATCH (a)-[rel]->(b) WHERE b IN nodes \
             RETURN DISTINCT a.id AS from_id, type(rel) AS rel_type, b.id AS to_id"
        );
        let relations_statement = Query::new(relations_cypher).param("id", incident_node_id.as_str());
        let mut relations_result = self
            .graph
            .execute(relations_statement)
            .await
            .map_err(|error| GraphStoreError::Backend(error.to_string()))?;
        let mut relations = Vec::new();
        while let Some(row) =
            relations_result.next().await.map_err(|error| GraphStoreError::Backend(error.to_string()))?
        {
            let from = row.get::<String>("from_id");
            let rel_type = row.get::<String>("rel_type");
            let to = row.get::<String>("to_id");
            if let (Ok(from), Ok(rel_type), Ok(to)) = (from, rel_type, to) {
                if let Some(kind) = relation_kind_from_label(&rel_type) {
                    relations.push(GraphRelation {
                        from: from.into(),
                        to: to.into(),
                        kind,
                        properties: BTreeMap::new(),
                    });
                }
            }
        }

        Ok((entities, relations))
    }

    async fn ensure_constraints(&self) -> Result<(), GraphStoreError> {
        for label in CONSTRAINED_LABELS {
            let cypher = format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:`{label}`) REQUIRE n.id IS UNIQUE"
            );
            // Re-creation errors are swallowed per spec.md §4.3.
            let _ = self.graph.run(query(&cypher)).await;
        }
        let _ = self.graph.run(query("CREATE INDEX IF NOT EXISTS FOR (n:Incident) ON (n.fingerprint)")).await;
        let _ = self.graph.run(query("CREATE INDEX IF NOT EXISTS FOR (n:Pod) ON (n.namespace)")).await;
        Ok(())
    }

    async fn health(&self) -> GraphHealth {
        match self.graph.run(query("RETURN 1")).await {
            Ok(()) => GraphHealth::Healthy,
            Err(_) => GraphHealth::Unreachable,
        }
    }
}

fn relation_label(kind: aiops_core::RelationKind) -> &'static str {
    use aiops_core::RelationKind;
    match kind {
        RelationKind::Affects => "AFFECTS",
        RelationKind::Owns => "OWNS",
        RelationKind::ScheduledOn => "SCHEDULED_ON",
        RelationKind::Selects => "SELECTS",
        RelationKind::Calls => "CALLS",
        RelationKind::AppliesTo => "APPLIES_TO",
        RelationKind::HasRecentChange => "HAS_RECENT_CHANGE",
        RelationKind::CorrelatesWith => "CORRELATES_WITH",
    }
}

/// Reverses [`relation_label`], for decoding a Cypher `type(rel)` string
/// back into a [`aiops_core::RelationKind`].
fn relation_kind_from_label(label: &str) -> Option<aiops_core::RelationKind> {
    use aiops_core::RelationKind;
    match label {
        "AFFECTS" => Some(RelationKind::Affects),
        "OWNS" => Some(RelationKind::Owns),
        "SCHEDULED_ON" => Some(RelationKind::ScheduledOn),
        "SELECTS" => Some(RelationKind::Selects),
        "CALLS" => Some(RelationKind::Calls),
        "APPLIES_TO" => Some(RelationKind::AppliesTo),
        "HAS_RECENT_CHANGE" => Some(RelationKind::HasRecentChange),
        "CORRELATES_WITH" => Some(RelationKind::CorrelatesWith),
        _ => None,
    }
}

/// Decodes a `neo4rs::Node` back into a [`GraphEntity`], using the
/// `namespace`/`name`/`kind` columns `upsert_entity` always sets. Arbitrary
/// enrichment properties are not round-tripped: the neighborhood query is
/// consumed by the incident graph view, which only needs node identity.
fn entity_from_node(node: &neo4rs::Node) -> Option<GraphEntity> {
    let id: String = node.get("id").ok()?;
    let kind_label: String = node.get("kind").ok()?;
    let kind = EntityKind::from_label(&kind_label)?;
    let namespace: String = node.get("namespace").unwrap_or_default();
    let name: String = node.get("name").unwrap_or_default();
    Some(GraphEntity { id: id.into(), kind, label: kind_label, namespace, name, properties: BTreeMap::new() })
}
