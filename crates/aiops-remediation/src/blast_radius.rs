// crates/aiops-remediation/src/blast_radius.rs
// ============================================================================
// Module: Blast Radius
// Description: Computes how broad a remediation action's impact would be.
// Purpose: Feed a `[0, 100]` score into the Policy Gate and the risk level
//          stored on every remediation action.
// Dependencies: aiops-core
// ============================================================================

/// Namespaces whose blast radius is weighted 1.5x: shared or
/// platform-critical namespaces where even a small action has outsized
/// impact.
const HIGH_IMPACT_NAMESPACES: &[&str] = &["default", "platform", "core-services"];

/// Environment multiplier table. Unrecognized environments fall back to the
/// `default` multiplier.
fn environment_multiplier(environment: &str) -> f64 {
    match environment {
        "dev" => 1.0,
        "staging" => 2.0,
        "uat" => 2.5,
        "prod" => 5.0,
        _ => 3.0,
    }
}

/// Computes the blast-radius score: `base = 5*affected_pods +
/// 10*affected_deployments`, times 1.5 for high-impact namespaces, times
/// the environment multiplier, clamped to `[0, 100]`.
#[must_use]
pub fn compute(namespace: &str, environment: &str, affected_pods: u32, affected_deployments: u32) -> f64 {
    let base = 5.0 * f64::from(affected_pods) + 10.0 * f64::from(affected_deployments);
    let namespace_multiplier = if HIGH_IMPACT_NAMESPACES.contains(&namespace) { 1.5 } else { 1.0 };
    let score = base * namespace_multiplier * environment_multiplier(environment);
    score.clamp(0.0, 100.0)
}

/// The fail-closed blast-radius score used when the cluster query needed to
/// compute `affected_pods`/`affected_deployments` fails: maximum score,
/// `is_acceptable=false`.
#[must_use]
pub const fn fail_closed_score() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn prod_default_namespace_clamps_to_one_hundred() {
        let score = compute("default", "prod", 2, 1);
        assert!((score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dev_namespace_stays_low() {
        let score = compute("checkout", "dev", 1, 0);
        assert!((score - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn score_never_exceeds_one_hundred() {
        let score = compute("default", "prod", 50, 50);
        assert!((score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrecognized_environment_uses_default_multiplier() {
        let score = compute("checkout", "canary", 1, 0);
        assert!((score - 15.0).abs() < f64::EPSILON);
    }
}
