// crates/aiops-runbook/src/templates.rs
// ============================================================================
// Module: Investigation Templates
// Description: Category-keyed investigation command and query templates.
// Purpose: Give the runbook generator a fixed, allocation-light string
//          substitution surface with no templating engine.
// Dependencies: aiops-core
// ============================================================================

use aiops_core::Category;

/// Placeholders a template may reference. Unset placeholders render empty.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// `{namespace}` substitution value.
    pub namespace: String,
    /// `{service}` substitution value.
    pub service: String,
    /// `{deployment}` substitution value.
    pub deployment: String,
    /// `{replicas}` substitution value.
    pub replicas: String,
}

/// Substitutes `{namespace}`, `{service}`, `{deployment}`, `{replicas}` in
/// `template` with values from `ctx`.
#[must_use]
pub fn substitute(template: &str, ctx: &TemplateContext) -> String {
    template
        .replace("{namespace}", &ctx.namespace)
        .replace("{service}", &ctx.service)
        .replace("{deployment}", &ctx.deployment)
        .replace("{replicas}", &ctx.replicas)
}

/// Investigation commands (kubectl-shaped) for the given top-hypothesis
/// category.
#[must_use]
pub fn commands_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::ResourceExhaustion => &[
            "kubectl top pods -n {namespace} -l app={service}",
            "kubectl describe pod -n {namespace} -l app={service}",
        ],
        Category::BadDeployment => &[
            "kubectl rollout history deployment/{deployment} -n {namespace}",
            "kubectl rollout status deployment/{deployment} -n {namespace}",
        ],
        Category::ConfigurationError => &[
            "kubectl describe deployment/{deployment} -n {namespace}",
            "kubectl get configmaps -n {namespace}",
        ],
        Category::InfrastructureIssue => &[
            "kubectl get nodes -o wide",
            "kubectl describe node <node>",
        ],
        Category::DependencyFailure => &[
            "kubectl logs -n {namespace} -l app={service} --tail=200",
            "kubectl get endpoints -n {namespace}",
        ],
        Category::NetworkIssue => &[
            "kubectl get networkpolicies -n {namespace}",
            "kubectl exec -n {namespace} deploy/{deployment} -- nslookup <upstream>",
        ],
        Category::ScalingIssue => &[
            "kubectl get hpa -n {namespace}",
            "kubectl describe hpa -n {namespace}",
        ],
        Category::SecurityIssue => &[
            "kubectl get events -n {namespace} --field-selector reason=FailedMount",
            "kubectl describe pod -n {namespace} -l app={service}",
        ],
        Category::ExternalDependency => &["kubectl logs -n {namespace} -l app={service} --since=15m"],
        Category::DataIssue => &[
            "kubectl exec -n {namespace} deploy/{deployment} -- env | grep -i db",
        ],
        Category::Unknown => &[
            "kubectl get pods -n {namespace} -l app={service}",
            "kubectl describe pod -n {namespace} -l app={service}",
        ],
    }
}

/// Metrics-store query templates for the given top-hypothesis category.
#[must_use]
pub fn queries_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::ResourceExhaustion => &[
            r#"container_memory_working_set_bytes{namespace="{namespace}",pod=~"{service}.*"}"#,
        ],
        Category::BadDeployment | Category::ConfigurationError => &[
            r#"kube_deployment_status_replicas_unavailable{namespace="{namespace}",deployment="{deployment}"}"#,
        ],
        Category::InfrastructureIssue => &[r#"kube_node_status_condition{condition="Ready",status="false"}"#],
        Category::DependencyFailure | Category::ExternalDependency => &[
            r#"sum(rate(http_requests_total{namespace="{namespace}",deployment="{deployment}",status=~"5.."}[5m]))"#,
        ],
        Category::NetworkIssue => &[
            r#"histogram_quantile(0.99, rate(http_request_duration_seconds_bucket{namespace="{namespace}"}[5m]))"#,
        ],
        Category::ScalingIssue => &[
            r#"kube_horizontalpodautoscaler_status_current_replicas{namespace="{namespace}",deployment="{deployment}"}"#,
        ],
        Category::SecurityIssue | Category::DataIssue | Category::Unknown => &[
            r#"up{namespace="{namespace}",deployment="{deployment}"}"#,
        ],
    }
}

/// Category-specific extension steps appended to the fixed 9-step
/// investigation plan.
#[must_use]
pub fn category_extensions(category: Category) -> &'static [&'static str] {
    match category {
        Category::ResourceExhaustion => &["Check for a memory leak across the last 3 deploys of {deployment}."],
        Category::BadDeployment => &["Compare the current and previous replica set's pod template diff."],
        Category::ConfigurationError => &["Diff the active config map against the last known-good revision."],
        Category::InfrastructureIssue => &["Check for correlated incidents on the same node."],
        Category::DependencyFailure => &["Check the health of {deployment}'s declared upstream dependencies."],
        Category::NetworkIssue => &["Check network policies and DNS resolution for {namespace}."],
        Category::ScalingIssue => &["Check whether the HPA's max replicas ceiling needs raising."],
        Category::SecurityIssue => &["Escalate to the security on-call rotation."],
        Category::ExternalDependency => &["Check the declared third-party status page for {service}."],
        Category::DataIssue => &["Check for a pending or recently applied schema migration."],
        Category::Unknown => &[],
    }
}
