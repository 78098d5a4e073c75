// crates/aiops-rules/src/lib.rs
// ============================================================================
// Module: AIOps Rules Engine
// Description: Static rule catalog, signal extraction, and the Ranker.
// Purpose: Turn an incident's evidence list into ranked root-cause
//          hypotheses.
// Dependencies: crate::{catalog, engine, ranker, signals}, aiops-core
// ============================================================================

//! ## Overview
//! The Rules Engine reduces an incident's evidence into a flat
//! [`signals::SignalBundle`], matches it against the fixed catalog in
//! [`catalog::RULE_CATALOG`] (`spec.md` §4.4, no generic expression-tree
//! DSL per the REDESIGN FLAGS), and produces one [`aiops_core::Hypothesis`]
//! per firing rule. The Ranker ([`ranker::rank`]) then orders and numbers
//! them (§4.5).

pub mod catalog;
pub mod engine;
pub mod ranker;
pub mod signals;

pub use engine::generate_hypotheses;
pub use ranker::rank;
pub use signals::SignalBundle;
pub use signals::extract as extract_signals;
