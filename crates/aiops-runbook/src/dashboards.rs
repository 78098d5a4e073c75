// crates/aiops-runbook/src/dashboards.rs
// ============================================================================
// Module: Dashboard URLs
// Description: Builds the four fixed dashboard URLs every runbook carries.
// Purpose: Give operators a one-click path from the runbook to live
//          observability dashboards, scoped to the incident.
// Dependencies: crate::templates
// ============================================================================

use crate::templates::TemplateContext;

/// The four fixed dashboards every runbook links, scoped with the
/// incident's namespace/service/deployment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DashboardUrls {
    /// Service overview (latency, traffic, errors, saturation).
    pub service_overview: String,
    /// Pod-level resource usage.
    pub pod_resources: String,
    /// Deployment rollout history.
    pub deployment_history: String,
    /// Cluster node health.
    pub node_health: String,
}

/// Builds the four dashboard URLs against `base_url` (the observability
/// stack's web root, e.g. `https://grafana.internal`).
#[must_use]
pub fn build_dashboard_urls(base_url: &str, ctx: &TemplateContext) -> DashboardUrls {
    let base = base_url.trim_end_matches('/');
    DashboardUrls {
        service_overview: format!(
            "{base}/d/service-overview?var-namespace={}&var-service={}",
            ctx.namespace, ctx.service
        ),
        pod_resources: format!("{base}/d/pod-resources?var-namespace={}&var-service={}", ctx.namespace, ctx.service),
        deployment_history: format!(
            "{base}/d/deployment-history?var-namespace={}&var-deployment={}",
            ctx.namespace, ctx.deployment
        ),
        node_health: format!("{base}/d/node-health"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let ctx = TemplateContext {
            namespace: "checkout".to_string(),
            service: "checkout-api".to_string(),
            deployment: "checkout-api".to_string(),
            replicas: "3".to_string(),
        };
        let urls = build_dashboard_urls("https://grafana.internal/", &ctx);
        assert!(urls.service_overview.starts_with("https://grafana.internal/d/"));
        assert!(!urls.service_overview.contains("internal//d"));
    }
}
