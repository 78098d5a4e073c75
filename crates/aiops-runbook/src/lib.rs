// crates/aiops-runbook/src/lib.rs
// ============================================================================
// Module: AIOps Runbook Generator
// Description: Public API for generating and persisting investigation
//              runbooks.
// Purpose: Turn a ranked hypothesis list into a templated investigation
//          plan, query list, and dashboard URL set.
// Dependencies: crate::{templates, plan, dashboards, generator}
// ============================================================================

//! ## Overview
//! The runbook generator is purely templated: no templating engine, just
//! `{placeholder}` substitution over fixed `&'static str` tables keyed on
//! the top hypothesis's category. See [`generate`] for the entry point.

mod dashboards;
mod generator;
mod plan;
mod templates;

pub use dashboards::DashboardUrls;
pub use dashboards::build_dashboard_urls;
pub use generator::Runbook;
pub use generator::generate;
pub use plan::build_plan;
pub use templates::TemplateContext;
pub use templates::commands_for;
pub use templates::queries_for;
pub use templates::substitute;
