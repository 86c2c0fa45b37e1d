/// Inputs to the quality scorer, decoupled from `akashi-models` so this
/// crate stays a pure-function leaf with no database/serde coupling beyond
/// what callers hand it.
pub struct QualityInputs<'a> {
    pub reasoning: Option<&'a str>,
    /// `(selected, has_rejection_reason)` per alternative.
    pub alternatives: &'a [(bool, bool)],
    /// `true` per evidence item that carries a relevance score.
    pub evidence_has_relevance: &'a [bool],
}

/// Deterministic, total, [0,1]-bounded completeness score. Every component
/// is an absolute count (never a ratio over a shrinking denominator) so
/// that adding any single input — more reasoning, another alternative with
/// a rejection reason, another evidence item — can only raise or hold the
/// score, never lower it.
pub fn quality_score(inputs: &QualityInputs) -> f64 {
    let reasoning_len = inputs.reasoning.map(|r| r.chars().count()).unwrap_or(0);
    let reasoning_score = (reasoning_len as f64 / 200.0).min(1.0) * 0.30;

    let alternatives_score = (inputs.alternatives.len() as f64 / 3.0).min(1.0) * 0.25;

    let non_selected_with_reason = inputs
        .alternatives
        .iter()
        .filter(|(selected, has_reason)| !selected && *has_reason)
        .count();
    let rejection_score = (non_selected_with_reason as f64 / 2.0).min(1.0) * 0.15;

    let evidence_count_score = (inputs.evidence_has_relevance.len() as f64 / 3.0).min(1.0) * 0.20;

    let evidence_with_relevance = inputs.evidence_has_relevance.iter().filter(|v| **v).count();
    let evidence_richness_score = (evidence_with_relevance as f64 / 3.0).min(1.0) * 0.10;

    (reasoning_score + alternatives_score + rejection_score + evidence_count_score + evidence_richness_score)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_decision_scores_zero() {
        let inputs = QualityInputs {
            reasoning: None,
            alternatives: &[],
            evidence_has_relevance: &[],
        };
        assert_eq!(quality_score(&inputs), 0.0);
    }

    #[test]
    fn rich_decision_scores_high() {
        let inputs = QualityInputs {
            reasoning: Some(&"x".repeat(300)),
            alternatives: &[(true, false), (false, true), (false, true)],
            evidence_has_relevance: &[true, true, true],
        };
        assert_eq!(quality_score(&inputs), 1.0);
    }

    #[test]
    fn adding_evidence_never_lowers_the_score() {
        let before = QualityInputs {
            reasoning: Some("short"),
            alternatives: &[(true, false)],
            evidence_has_relevance: &[],
        };
        let score_before = quality_score(&before);

        let after = QualityInputs {
            reasoning: Some("short"),
            alternatives: &[(true, false)],
            evidence_has_relevance: &[false],
        };
        let score_after = quality_score(&after);

        assert!(score_after >= score_before);
    }

    #[test]
    fn adding_an_unjustified_alternative_never_lowers_the_score() {
        let before = QualityInputs {
            reasoning: None,
            alternatives: &[(false, true)],
            evidence_has_relevance: &[],
        };
        let score_before = quality_score(&before);

        let after = QualityInputs {
            reasoning: None,
            alternatives: &[(false, true), (false, false)],
            evidence_has_relevance: &[],
        };
        let score_after = quality_score(&after);

        assert!(score_after >= score_before);
    }

    #[test]
    fn score_is_deterministic() {
        let inputs = QualityInputs {
            reasoning: Some("consistent reasoning text"),
            alternatives: &[(true, false), (false, true)],
            evidence_has_relevance: &[true, false],
        };
        assert_eq!(quality_score(&inputs), quality_score(&inputs));
    }
}
