// crates/aiops-core/src/core/graph.rs
// ============================================================================
// Module: Graph Entities and Relations
// Description: The dependency graph vocabulary assembled from evidence.
// Purpose: Give the Graph Assembler and Rules Engine a shared, backend
//          agnostic shape for nodes and edges, independent of Neo4j.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::GraphEntityId;

/// The label (node kind) of a graph entity, per `spec.md` §8's evidence
/// graph node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The incident itself, as a graph node.
    Incident,
    /// A Kubernetes pod.
    Pod,
    /// A Kubernetes deployment.
    Deployment,
    /// A Kubernetes service.
    Service,
    /// A Kubernetes node.
    Node,
    /// A horizontal pod autoscaler.
    Hpa,
    /// A deploy or config change event.
    ChangeEvent,
    /// A config map.
    ConfigMap,
}

impl EntityKind {
    /// The Neo4j node label used in `MERGE (n:<label> {id: $id})`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Incident => "Incident",
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::Node => "Node",
            Self::Hpa => "HPA",
            Self::ChangeEvent => "ChangeEvent",
            Self::ConfigMap => "ConfigMap",
        }
    }

    /// Reverses [`Self::label`], for decoding a Neo4j node's `kind` column
    /// back into an [`EntityKind`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Incident" => Some(Self::Incident),
            "Pod" => Some(Self::Pod),
            "Deployment" => Some(Self::Deployment),
            "Service" => Some(Self::Service),
            "Node" => Some(Self::Node),
            "HPA" => Some(Self::Hpa),
            "ChangeEvent" => Some(Self::ChangeEvent),
            "ConfigMap" => Some(Self::ConfigMap),
            _ => None,
        }
    }

    const fn id_prefix(self) -> &'static str {
        match self {
            Self::Incident => "incident",
            Self::Pod => "pod",
            Self::Deployment => "deployment",
            Self::Service => "service",
            Self::Node => "node",
            Self::Hpa => "hpa",
            Self::ChangeEvent => "change",
            Self::ConfigMap => "config_map",
        }
    }
}

/// A node in the dependency graph.
///
/// # Invariants
/// - `id` is unique across the store (I6 in `spec.md` §3); upserts merge
///   `properties` rather than replacing the node.
/// - `label` always equals `kind.label()`; kept as its own field because
///   `spec.md` §3 names it as a first-class column the graph store writes
///   verbatim into `MERGE (n:<label> {id: $id})`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntity {
    /// Composite entity id.
    pub id: GraphEntityId,
    /// Entity kind.
    pub kind: EntityKind,
    /// Node label, equal to `kind.label()`.
    pub label: String,
    /// Namespace the entity belongs to (empty for cluster-scoped nodes:
    /// `Node`, `Incident`).
    pub namespace: String,
    /// Entity name.
    pub name: String,
    /// Arbitrary key/value properties merged on upsert.
    pub properties: BTreeMap<String, String>,
}

impl GraphEntity {
    /// Builds the composite id `"<kind>:<namespace>:<name>"` used as the
    /// idempotency key for most graph upserts (`spec.md` §3/§4.3).
    #[must_use]
    pub fn composite_id(kind: EntityKind, namespace: &str, name: &str) -> GraphEntityId {
        GraphEntityId::new(format!("{}:{namespace}:{name}", kind.id_prefix()))
    }

    /// Builds a cluster-scoped node id, `"node:<name>"` (`spec.md` §3).
    #[must_use]
    pub fn node_id(name: &str) -> GraphEntityId {
        GraphEntityId::new(format!("node:{name}"))
    }

    /// Builds the incident node id, `"incident:<uuid>"` (`spec.md` §3).
    #[must_use]
    pub fn incident_node_id(incident_uuid: &str) -> GraphEntityId {
        GraphEntityId::new(format!("incident:{incident_uuid}"))
    }

    /// Builds a change-event id tied to a deployment revision,
    /// `"change:deployment:<ns>:<name>:<rev>"` (`spec.md` §3).
    #[must_use]
    pub fn change_event_id(namespace: &str, deployment_name: &str, revision: u64) -> GraphEntityId {
        GraphEntityId::new(format!("change:deployment:{namespace}:{deployment_name}:{revision}"))
    }
}

/// The kind of relation between two graph entities, per `spec.md` §8's
/// labeled-edge set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// An incident affects an entity.
    Affects,
    /// A deployment owns a pod, or a node owns a condition-bearing entity.
    Owns,
    /// A pod is scheduled on a node.
    ScheduledOn,
    /// A service selects a pod.
    Selects,
    /// A service calls another service.
    Calls,
    /// A change was applied to a deployment.
    AppliesTo,
    /// A deployment has a recent change event.
    HasRecentChange,
    /// An incident correlates with a change event.
    CorrelatesWith,
}

/// A directed edge between two [`GraphEntity`] nodes.
///
/// # Invariants
/// - The triple `(from, kind, to)` is unique per `spec.md` §3; upserts
///   `MERGE` on it rather than inserting duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRelation {
    /// Source entity id.
    pub from: GraphEntityId,
    /// Target entity id.
    pub to: GraphEntityId,
    /// Relation kind.
    pub kind: RelationKind,
    /// Arbitrary key/value properties merged on upsert.
    pub properties: BTreeMap<String, String>,
}
