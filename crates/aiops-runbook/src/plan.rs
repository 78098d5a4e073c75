// crates/aiops-runbook/src/plan.rs
// ============================================================================
// Module: Investigation Plan
// Description: The fixed 9-step investigation plan every runbook carries,
//              plus category-specific extension steps.
// Purpose: Give operators a consistent starting checklist regardless of
//          which category the top hypothesis fell into.
// Dependencies: aiops-core, crate::templates
// ============================================================================

use aiops_core::Category;

use crate::templates::TemplateContext;
use crate::templates::substitute;

/// The fixed 9-step investigation plan, in order, before any
/// category-specific extensions.
const BASE_PLAN: [&str; 9] = [
    "Confirm the incident is still active and review current severity.",
    "Review the top-ranked hypothesis and its supporting evidence.",
    "Inspect pod status and recent restarts for {service} in {namespace}.",
    "Review recent deploys and config changes to {deployment}.",
    "Check dashboards for {service} error rate, latency, and saturation.",
    "Run the category-specific investigation commands listed above.",
    "Run the category-specific metrics queries listed above.",
    "Decide whether the recommended remediation action is appropriate.",
    "If remediation proceeds, monitor the verifier's post-action probes.",
];

/// Builds the full investigation plan: the fixed 9 steps followed by any
/// category-specific extensions, with placeholders substituted.
#[must_use]
pub fn build_plan(category: Category, ctx: &TemplateContext) -> Vec<String> {
    BASE_PLAN
        .iter()
        .chain(crate::templates::category_extensions(category))
        .map(|step| substitute(step, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn plan_has_nine_base_steps_plus_extensions() {
        let ctx = TemplateContext::default();
        let plan = build_plan(Category::ResourceExhaustion, &ctx);
        assert_eq!(plan.len(), 9 + 1);
    }

    #[test]
    fn unknown_category_has_no_extensions() {
        let ctx = TemplateContext::default();
        let plan = build_plan(Category::Unknown, &ctx);
        assert_eq!(plan.len(), 9);
    }

    #[test]
    fn plan_steps_substitute_placeholders() {
        let ctx = TemplateContext {
            namespace: "checkout".to_string(),
            service: "checkout-api".to_string(),
            deployment: "checkout-api".to_string(),
            replicas: "3".to_string(),
        };
        let plan = build_plan(Category::BadDeployment, &ctx);
        assert!(plan[2].contains("checkout-api"));
        assert!(plan[2].contains("checkout"));
    }
}
