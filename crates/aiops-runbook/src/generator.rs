// crates/aiops-runbook/src/generator.rs
// ============================================================================
// Module: Runbook Generator
// Description: Reduces a ranked hypothesis list into a persisted runbook
//              document.
// Purpose: Select category-keyed templates for the top hypothesis,
//          substitute placeholders, and assemble the investigation plan
//          and dashboard URLs into one document.
// Dependencies: aiops-core, crate::{templates, plan, dashboards}
// ============================================================================

use aiops_core::Hypothesis;
use aiops_core::Incident;
use aiops_core::RunbookId;
use aiops_core::Timestamp;
use aiops_core::new_uuid_string;
use serde::Deserialize;
use serde::Serialize;

use crate::dashboards::DashboardUrls;
use crate::dashboards::build_dashboard_urls;
use crate::plan::build_plan;
use crate::templates::TemplateContext;
use crate::templates::commands_for;
use crate::templates::queries_for;
use crate::templates::substitute;

/// A generated investigation runbook, persisted keyed by [`RunbookId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runbook {
    /// Runbook identifier.
    pub id: RunbookId,
    /// Owning incident.
    pub incident_id: aiops_core::IncidentId,
    /// Category the runbook was generated for (the top hypothesis's).
    pub category: aiops_core::Category,
    /// Investigation commands, with placeholders substituted.
    pub commands: Vec<String>,
    /// Metrics-store queries, with placeholders substituted.
    pub queries: Vec<String>,
    /// The full investigation plan (fixed 9 steps plus category
    /// extensions), with placeholders substituted.
    pub plan: Vec<String>,
    /// Dashboard URLs scoped to the incident.
    pub dashboards: DashboardUrls,
    /// When this runbook was generated.
    pub generated_at: Timestamp,
}

/// Generates a runbook from `incident` and its ranked `hypotheses`
/// (ranked, so `hypotheses[0]` is the top hypothesis), using `dashboard_base_url`
/// as the observability stack's web root.
///
/// Returns `None` when `hypotheses` is empty; the orchestrator should not
/// call this before the ranker has produced at least one hypothesis (the
/// rules engine always emits one, even the `unknown` fallback).
#[must_use]
pub fn generate(incident: &Incident, hypotheses: &[Hypothesis], dashboard_base_url: &str) -> Option<Runbook> {
    let top = hypotheses.first()?;
    let ctx = TemplateContext {
        namespace: incident.namespace.as_str().to_string(),
        service: incident.service.as_ref().map(aiops_core::ServiceId::as_str).unwrap_or_default().to_string(),
        deployment: incident.service.as_ref().map(aiops_core::ServiceId::as_str).unwrap_or_default().to_string(),
        replicas: String::new(),
    };

    let commands = commands_for(top.category).iter().map(|template| substitute(template, &ctx)).collect();
    let queries = queries_for(top.category).iter().map(|template| substitute(template, &ctx)).collect();
    let plan = build_plan(top.category, &ctx);
    let dashboards = build_dashboard_urls(dashboard_base_url, &ctx);

    Some(Runbook {
        id: new_uuid_string().into(),
        incident_id: incident.id.clone(),
        category: top.category,
        commands,
        queries,
        plan,
        dashboards,
        generated_at: Timestamp::now(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::collections::BTreeMap;

    use aiops_core::Category;
    use aiops_core::Fingerprint;
    use aiops_core::IncidentStatus;
    use aiops_core::Severity;

    use super::*;

    fn sample_incident() -> Incident {
        Incident {
            id: "incident-1".into(),
            fingerprint: Fingerprint::from_hex("a".repeat(32)),
            title: "PodCrashLoopBackOff: checkout-api".to_string(),
            severity: Severity::High,
            status: IncidentStatus::Investigating,
            source: "alertmanager".to_string(),
            cluster: "prod".into(),
            namespace: "checkout".into(),
            service: Some("checkout-api".into()),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            started_at: Timestamp::now(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    fn sample_hypothesis(category: Category) -> Hypothesis {
        Hypothesis {
            id: "hyp-1".into(),
            incident_id: "incident-1".into(),
            category,
            title: "Sample hypothesis".to_string(),
            description: "Sample description".to_string(),
            confidence: 0.9,
            rank: Some(1),
            supporting_evidence_ids: Vec::new(),
            support_count: 1,
            signal_strength: 0.9,
            recommended_actions: Vec::new(),
            generator_tag: "rule:crashloop_recent_deploy".to_string(),
            rule_id: Some("crashloop_recent_deploy".to_string()),
        }
    }

    #[test]
    fn generate_returns_none_for_empty_hypotheses() {
        let incident = sample_incident();
        assert!(generate(&incident, &[], "https://grafana.internal").is_none());
    }

    #[test]
    fn generate_substitutes_service_and_namespace() {
        let incident = sample_incident();
        let hypotheses = vec![sample_hypothesis(Category::BadDeployment)];
        let runbook = generate(&incident, &hypotheses, "https://grafana.internal").expect("runbook generated");
        assert!(runbook.commands.iter().any(|command| command.contains("checkout-api")));
        assert!(runbook.dashboards.service_overview.contains("checkout"));
        assert_eq!(runbook.plan.len(), 9 + 1);
    }
}
