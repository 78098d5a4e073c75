// crates/aiops-rules/src/ranker.rs
// ============================================================================
// Module: Ranker
// Description: Orders candidate hypotheses by their ranking score and
//              assigns ranks.
// Purpose: Implement spec.md §4.5's stable, deterministic sort exactly
//          once per run.
// Dependencies: aiops-core
// ============================================================================

use aiops_core::Hypothesis;

/// Sorts `hypotheses` descending by [`Hypothesis::ranking_score`] (stable on
/// ties, preserving insertion order) and assigns `rank = 1..N` in place.
///
/// Ranking runs exactly once per incident analysis pass (`spec.md` §4.5);
/// calling it again on an already-ranked list simply re-sorts and
/// re-assigns ranks from the current scores.
pub fn rank(hypotheses: &mut Vec<Hypothesis>) {
    hypotheses.sort_by(|a, b| b.ranking_score().partial_cmp(&a.ranking_score()).unwrap_or(std::cmp::Ordering::Equal));
    for (index, hypothesis) in hypotheses.iter_mut().enumerate() {
        hypothesis.rank = Some(u32::try_from(index + 1).unwrap_or(u32::MAX));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use aiops_core::Category;
    use aiops_core::HypothesisId;
    use aiops_core::IncidentId;
    use aiops_core::new_uuid_string;

    use super::*;

    fn hypothesis(category: Category, confidence: f64) -> Hypothesis {
        Hypothesis {
            id: HypothesisId::new(new_uuid_string()),
            incident_id: IncidentId::new("inc-1"),
            category,
            title: "t".to_string(),
            description: "d".to_string(),
            confidence,
            rank: None,
            supporting_evidence_ids: Vec::new(),
            support_count: 0,
            signal_strength: 0.0,
            recommended_actions: Vec::new(),
            generator_tag: "rule".to_string(),
            rule_id: None,
        }
    }

    #[test]
    fn ranks_by_score_descending_and_starts_at_one() {
        let mut hypotheses = vec![
            hypothesis(Category::Unknown, 0.30),
            hypothesis(Category::ResourceExhaustion, 0.95),
            hypothesis(Category::NetworkIssue, 0.70),
        ];
        rank(&mut hypotheses);
        assert_eq!(hypotheses[0].category, Category::ResourceExhaustion);
        assert_eq!(hypotheses[0].rank, Some(1));
        assert_eq!(hypotheses[1].category, Category::NetworkIssue);
        assert_eq!(hypotheses[2].category, Category::Unknown);
        assert_eq!(hypotheses[2].rank, Some(3));
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let mut hypotheses = vec![
            hypothesis(Category::DependencyFailure, 0.80),
            hypothesis(Category::DependencyFailure, 0.80),
        ];
        let first_id = hypotheses[0].id.clone();
        rank(&mut hypotheses);
        assert_eq!(hypotheses[0].id, first_id);
        assert_eq!(hypotheses[0].rank, Some(1));
        assert_eq!(hypotheses[1].rank, Some(2));
    }
}
