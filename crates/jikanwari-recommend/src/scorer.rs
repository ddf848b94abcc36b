//! Generic weighted multi-reason scorer.
//!
//! A candidate passes every *gate* or it is excluded from the ranking
//! outright (infeasible candidates are never merely penalized). The
//! survivors are scored by the weighted sum of their *graded* features,
//! and each contributing feature leaves a reason string, in feature
//! order, so the host can explain the ranking to the user.

use serde::Serialize;

/// Result of evaluating one feature against one candidate.
pub enum FeatureValue {
    /// Hard eligibility: `false` removes the candidate from the ranking.
    Gate(bool),
    /// Graded contribution, multiplied by the feature weight.
    Graded(f64),
}

/// One scoring feature: a label (surfaced as the reason string), a
/// weight, and an evaluation function.
pub struct Feature<T> {
    label: String,
    weight: f64,
    eval: Box<dyn Fn(&T) -> FeatureValue>,
}

impl<T> Feature<T> {
    /// A hard eligibility gate. Weight does not apply; a passed gate
    /// contributes its label as a reason.
    pub fn gate(label: impl Into<String>, eval: impl Fn(&T) -> bool + 'static) -> Self {
        Feature {
            label: label.into(),
            weight: 0.0,
            eval: Box::new(move |candidate| FeatureValue::Gate(eval(candidate))),
        }
    }

    /// A graded feature contributing `weight * value` to the score.
    pub fn graded(
        label: impl Into<String>,
        weight: f64,
        eval: impl Fn(&T) -> f64 + 'static,
    ) -> Self {
        Feature {
            label: label.into(),
            weight,
            eval: Box::new(move |candidate| FeatureValue::Graded(eval(candidate))),
        }
    }
}

/// A ranked candidate with its composite score and the reasons behind it.
#[derive(Clone, Debug, Serialize)]
pub struct ScoredCandidate<T> {
    pub candidate: T,
    pub score: f64,
    /// Always true for candidates returned by [`rank`]; kept so hosts
    /// can carry the record through their own filtering.
    pub feasible: bool,
    /// Reason strings in feature order.
    pub reasons: Vec<String>,
}

/// Ranks candidates by composite score, best first. Candidates failing
/// any gate are excluded. Equal scores keep input order, which makes the
/// ranking deterministic for identical inputs.
pub fn rank<T>(candidates: Vec<T>, features: &[Feature<T>]) -> Vec<ScoredCandidate<T>> {
    let mut scored: Vec<ScoredCandidate<T>> = Vec::new();

    'candidates: for candidate in candidates {
        let mut score = 0.0;
        let mut reasons = Vec::new();
        for feature in features {
            match (feature.eval)(&candidate) {
                FeatureValue::Gate(false) => continue 'candidates,
                FeatureValue::Gate(true) => reasons.push(feature.label.clone()),
                FeatureValue::Graded(value) => {
                    let contribution = feature.weight * value;
                    if contribution != 0.0 {
                        reasons.push(format!("{} ({:+.1})", feature.label, contribution));
                        score += contribution;
                    }
                }
            }
        }
        scored.push(ScoredCandidate {
            candidate,
            score,
            feasible: true,
            reasons,
        });
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_exclude_instead_of_penalizing() {
        let features = vec![
            Feature::gate("eligible", |n: &i32| *n % 2 == 0),
            Feature::graded("magnitude", 1.0, |n: &i32| *n as f64),
        ];
        let ranked = rank(vec![1, 2, 3, 4], &features);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].candidate, 4);
        assert_eq!(ranked[1].candidate, 2);
    }

    #[test]
    fn reasons_follow_feature_order() {
        let features = vec![
            Feature::gate("first", |_: &i32| true),
            Feature::graded("second", 2.0, |_: &i32| 1.0),
            Feature::graded("silent", 1.0, |_: &i32| 0.0),
        ];
        let ranked = rank(vec![7], &features);
        assert_eq!(ranked[0].reasons, vec!["first", "second (+2.0)"]);
        assert_eq!(ranked[0].score, 2.0);
        assert!(ranked[0].feasible);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let features = vec![Feature::graded("flat", 1.0, |_: &i32| 1.0)];
        let ranked = rank(vec![30, 10, 20], &features);
        let order: Vec<i32> = ranked.into_iter().map(|s| s.candidate).collect();
        assert_eq!(order, vec![30, 10, 20]);
    }
}
