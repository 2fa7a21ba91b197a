//! Ensemble combination of component results.
//!
//! Turns any number of component results into one trust score, a risk level
//! and a confidence estimate. Failed components are dropped and the weights of
//! the survivors are renormalized, so an outage never drags the score toward
//! the baseline by omission.

use crate::analysis::weights::{renormalize, WeightTable};
use crate::config::ScoringConfig;
use crate::models::{Component, ComponentResult, Explanation, Polarity, RiskLevel};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Combined outcome of a set of component results.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Clamped but unrounded score.
    pub exact_score: f64,
    pub trust_score: u8,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub weights_used: BTreeMap<Component, f64>,
    pub successful: usize,
    pub total: usize,
}

impl Verdict {
    /// True when some, but not all, attempted components contributed.
    pub fn is_partial(&self) -> bool {
        self.successful < self.total
    }
}

/// Weighted combiner over the active component set.
#[derive(Debug, Clone)]
pub struct EnsembleCombiner {
    scoring: ScoringConfig,
    weights: WeightTable,
}

impl EnsembleCombiner {
    pub fn new(scoring: ScoringConfig, weights: WeightTable) -> Self {
        Self { scoring, weights }
    }

    /// Combine results into a verdict.
    ///
    /// Returns `None` when no component succeeded: a baseline-only score
    /// would look like a real neutral verdict.
    pub fn combine(&self, results: &[ComponentResult]) -> Option<Verdict> {
        let succeeded: BTreeSet<_> = results
            .iter()
            .filter(|r| r.succeeded)
            .map(|r| r.component_name)
            .collect();

        let weights_used = renormalize(&self.weights, &succeeded);
        if weights_used.is_empty() {
            return None;
        }

        let exact_score = self.exact_score(results, &weights_used);
        let trust_score = to_trust_score(exact_score);
        let risk_level = self.classify(trust_score);

        let explanations: Vec<&Explanation> = results
            .iter()
            .filter(|r| r.succeeded)
            .flat_map(|r| r.explanations.iter())
            .collect();
        let confidence = self.confidence(succeeded.len(), results.len(), &explanations);

        debug!(
            "Combined {}/{} components: exact {:.3}, trust {}, confidence {}",
            succeeded.len(),
            results.len(),
            exact_score,
            trust_score,
            confidence
        );

        Some(Verdict {
            exact_score,
            trust_score,
            risk_level,
            confidence,
            weights_used,
            successful: succeeded.len(),
            total: results.len(),
        })
    }

    /// `clamp(baseline + Σ weight × score, 0, 100)`, not rounded.
    pub fn exact_score(
        &self,
        results: &[ComponentResult],
        weights_used: &BTreeMap<Component, f64>,
    ) -> f64 {
        let weighted: f64 = results
            .iter()
            .filter(|r| r.succeeded)
            .filter_map(|r| {
                weights_used
                    .get(&r.component_name)
                    .map(|weight| weight * f64::from(r.score))
            })
            .sum();

        (self.scoring.baseline + weighted).clamp(0.0, 100.0)
    }

    /// Map a trust score onto a risk level.
    pub fn classify(&self, trust_score: u8) -> RiskLevel {
        if trust_score >= self.scoring.low_threshold {
            RiskLevel::Low
        } else if trust_score >= self.scoring.medium_threshold {
            RiskLevel::Medium
        } else if trust_score >= self.scoring.high_threshold {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Confidence from breadth (modules that succeeded), strength (strong
    /// signals) and quantity (all non-neutral signals), independent of
    /// which direction the evidence points.
    pub fn confidence(&self, successful: usize, total: usize, explanations: &[&Explanation]) -> u8 {
        if total == 0 {
            return 0;
        }
        let s = &self.scoring;

        let breadth = successful as f64 * s.confidence_breadth_max / total as f64;

        let strong = explanations
            .iter()
            .filter(|e| match e.polarity {
                Polarity::Negative => e.points >= s.strong_negative_points,
                Polarity::Positive => e.points >= s.strong_positive_points,
                Polarity::Neutral => false,
            })
            .count() as u32;
        let strength = strong
            .saturating_mul(s.confidence_strength_per_signal)
            .min(s.confidence_strength_max);

        let signals = explanations
            .iter()
            .filter(|e| e.polarity != Polarity::Neutral)
            .count() as u32;
        let quantity = signals
            .saturating_mul(s.confidence_count_per_signal)
            .min(s.confidence_count_max);

        let total_confidence = breadth + f64::from(strength) + f64::from(quantity);
        total_confidence.floor().clamp(0.0, 100.0) as u8
    }
}

/// Round only after clamping, so values near the edges are not biased.
fn to_trust_score(exact_score: f64) -> u8 {
    exact_score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combiner() -> EnsembleCombiner {
        let weights = WeightTable::new(
            [
                (Component::Domain, 0.35),
                (Component::Content, 0.40),
                (Component::Technical, 0.25),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();
        EnsembleCombiner::new(ScoringConfig::default(), weights)
    }

    fn ok(component: Component, score: i32) -> ComponentResult {
        ComponentResult::success(component, score, vec![])
    }

    fn failed(component: Component) -> ComponentResult {
        ComponentResult::failed(component, "connection refused".to_string())
    }

    #[test]
    fn test_all_components_succeed() {
        let results = vec![
            ok(Component::Domain, 20),
            ok(Component::Content, -10),
            ok(Component::Technical, 5),
        ];

        let verdict = combiner().combine(&results).unwrap();
        assert!((verdict.exact_score - 74.25).abs() < 1e-9);
        assert_eq!(verdict.trust_score, 74);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert!(!verdict.is_partial());
    }

    #[test]
    fn test_failed_component_is_renormalized_away() {
        let results = vec![
            ok(Component::Domain, 20),
            failed(Component::Content),
            ok(Component::Technical, 5),
        ];

        let verdict = combiner().combine(&results).unwrap();
        assert!((verdict.exact_score - 83.75).abs() < 1e-9);
        assert_eq!(verdict.trust_score, 84);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert!(verdict.is_partial());
        assert!(!verdict.weights_used.contains_key(&Component::Content));
        assert!((verdict.weights_used[&Component::Domain] - 0.35 / 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_single_success_gets_full_weight() {
        let results = vec![
            failed(Component::Domain),
            ok(Component::Content, -30),
            failed(Component::Technical),
        ];

        let verdict = combiner().combine(&results).unwrap();
        assert_eq!(verdict.trust_score, 40);
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
        assert!(verdict.is_partial());
    }

    #[test]
    fn test_all_failed_yields_no_verdict() {
        let results = vec![
            failed(Component::Domain),
            failed(Component::Content),
            failed(Component::Technical),
        ];
        assert!(combiner().combine(&results).is_none());
        assert!(combiner().combine(&[]).is_none());
    }

    #[test]
    fn test_score_is_clamped() {
        let high = vec![ok(Component::Domain, 500), ok(Component::Content, 500)];
        assert_eq!(combiner().combine(&high).unwrap().trust_score, 100);

        let low = vec![ok(Component::Domain, -500), ok(Component::Technical, -500)];
        let verdict = combiner().combine(&low).unwrap();
        assert_eq!(verdict.trust_score, 0);
        assert_eq!(verdict.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_score_always_within_bounds_for_every_subset() {
        let components = [Component::Domain, Component::Content, Component::Technical];
        let scores = [-60, -17, 0, 23, 60];

        for mask in 1u8..8 {
            for &score in &scores {
                let results: Vec<_> = components
                    .iter()
                    .enumerate()
                    .map(|(i, c)| {
                        if mask & (1 << i) != 0 {
                            ok(*c, score * (i as i32 + 1))
                        } else {
                            failed(*c)
                        }
                    })
                    .collect();

                let verdict = combiner().combine(&results).unwrap();
                assert!(verdict.trust_score <= 100);
                assert!((0.0..=100.0).contains(&verdict.exact_score));
            }
        }
    }

    #[test]
    fn test_monotonic_in_each_component_score() {
        let combiner = combiner();
        let mut previous = f64::MIN;
        for domain_score in -40..=40 {
            let results = vec![
                ok(Component::Domain, domain_score),
                ok(Component::Content, -5),
                failed(Component::Technical),
            ];
            let exact = combiner.combine(&results).unwrap().exact_score;
            assert!(exact > previous);
            previous = exact;
        }
    }

    #[test]
    fn test_weight_ratios_not_magnitudes_decide() {
        let scaled = EnsembleCombiner::new(
            ScoringConfig::default(),
            WeightTable::new(
                [
                    (Component::Domain, 7.0),
                    (Component::Content, 8.0),
                    (Component::Technical, 5.0),
                ]
                .into_iter()
                .collect(),
            )
            .unwrap(),
        );
        let results = vec![
            ok(Component::Domain, 13),
            failed(Component::Content),
            ok(Component::Technical, -27),
        ];

        let a = combiner().combine(&results).unwrap();
        let b = scaled.combine(&results).unwrap();
        assert!((a.exact_score - b.exact_score).abs() < 1e-9);
        assert_eq!(a.trust_score, b.trust_score);
    }

    #[test]
    fn test_risk_level_boundaries() {
        let combiner = combiner();
        assert_eq!(combiner.classify(100), RiskLevel::Low);
        assert_eq!(combiner.classify(70), RiskLevel::Low);
        assert_eq!(combiner.classify(69), RiskLevel::Medium);
        assert_eq!(combiner.classify(40), RiskLevel::Medium);
        assert_eq!(combiner.classify(39), RiskLevel::High);
        assert_eq!(combiner.classify(20), RiskLevel::High);
        assert_eq!(combiner.classify(19), RiskLevel::Critical);
        assert_eq!(combiner.classify(0), RiskLevel::Critical);
    }

    #[test]
    fn test_confidence_rewards_breadth() {
        let combiner = combiner();
        assert_eq!(combiner.confidence(3, 3, &[]), 60);
        assert_eq!(combiner.confidence(2, 3, &[]), 40);
        assert_eq!(combiner.confidence(1, 3, &[]), 20);
    }

    #[test]
    fn test_confidence_counts_strong_and_total_signals() {
        let explanations = vec![
            Explanation::negative("High-risk TLD", 15, ".tk"),
            Explanation::negative("Contains hyphens", 3, "a-b.tk"),
            Explanation::positive("Valid certificate", 8, "issuer"),
            Explanation::positive("Basic DNS", 2, "A record"),
            Explanation::neutral("Domain age unknown", "WHOIS unavailable"),
        ];
        let refs: Vec<&Explanation> = explanations.iter().collect();

        // 60 breadth + 2 strong × 8 + 4 signals × 2
        assert_eq!(combiner().confidence(3, 3, &refs), 84);
    }

    #[test]
    fn test_confidence_never_exceeds_100() {
        let explanations: Vec<Explanation> = (0..20)
            .map(|i| Explanation::negative(format!("signal {}", i), 25, ""))
            .collect();
        let refs: Vec<&Explanation> = explanations.iter().collect();

        let confidence = combiner().confidence(3, 3, &refs);
        assert_eq!(confidence, 100);
    }

    #[test]
    fn test_partial_result_is_less_confident() {
        let explanation = Explanation::negative("Login form over HTTP", 12, "form");
        let full = vec![
            ComponentResult::success(Component::Domain, 0, vec![explanation.clone()]),
            ok(Component::Content, 0),
            ok(Component::Technical, 0),
        ];
        let partial = vec![
            ComponentResult::success(Component::Domain, 0, vec![explanation]),
            failed(Component::Content),
            ok(Component::Technical, 0),
        ];

        let combiner = combiner();
        let full_confidence = combiner.combine(&full).unwrap().confidence;
        let partial_confidence = combiner.combine(&partial).unwrap().confidence;
        assert!(partial_confidence < full_confidence);
    }
}
