// crates/aiops-graph/src/lib.rs
// ============================================================================
// Module: AIOps Graph Store
// Description: GraphStore implementations for the evidence dependency graph.
// Purpose: Export the Neo4j-backed and in-memory stores.
// Dependencies: crate::{neo4j, memory}
// ============================================================================

//! ## Overview
//! Two [`aiops_core::interfaces::GraphStore`] implementations: a
//! `neo4rs`-backed [`Neo4jGraphStore`] for production, and an
//! [`InMemoryGraphStore`] used by tests and the CLI's offline mode. Both
//! honor `spec.md` §3/§4.3's `MERGE`-on-id and
//! `MERGE`-on-`(source,type,target)` semantics.

mod memory;
mod neo4j;

pub use memory::InMemoryGraphStore;
pub use neo4j::Neo4jGraphStore;
