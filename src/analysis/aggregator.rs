//! Explanation aggregation and presentation helpers.
//!
//! `merge_explanations` is the data-model operation: it concatenates the
//! evidence of every succeeded component in configured order, keeping the
//! source tag and never deduplicating. The remaining functions group and
//! summarize for presentation without altering the merged sequence.

use crate::models::{Component, ComponentResult, Explanation, Polarity};
use std::collections::BTreeMap;

/// Merge evidence from all succeeded components in configured order.
///
/// Completion order of the analyzers does not matter; results are sorted by
/// component before merging.
pub fn merge_explanations(results: &[ComponentResult]) -> Vec<Explanation> {
    let mut ordered: Vec<&ComponentResult> = results.iter().filter(|r| r.succeeded).collect();
    ordered.sort_by_key(|r| r.component_name);

    ordered
        .into_iter()
        .flat_map(|r| {
            r.explanations
                .iter()
                .map(move |e| e.clone().with_source(r.component_name.name()))
        })
        .collect()
}

/// Explanations split by polarity, strongest first within each group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolarityGroups<'a> {
    pub negative: Vec<&'a Explanation>,
    pub positive: Vec<&'a Explanation>,
    pub neutral: Vec<&'a Explanation>,
}

/// Group explanations by polarity.
///
/// Negative and positive groups are sorted by points, highest first; ties
/// keep merge order. Neutral entries keep merge order.
pub fn group_by_polarity(explanations: &[Explanation]) -> PolarityGroups<'_> {
    let mut groups = PolarityGroups::default();

    for explanation in explanations {
        match explanation.polarity {
            Polarity::Negative => groups.negative.push(explanation),
            Polarity::Positive => groups.positive.push(explanation),
            Polarity::Neutral => groups.neutral.push(explanation),
        }
    }

    groups.negative.sort_by_key(|e| std::cmp::Reverse(e.points));
    groups.positive.sort_by_key(|e| std::cmp::Reverse(e.points));

    groups
}

/// Group explanations by the component that produced them.
pub fn group_by_source(explanations: &[Explanation]) -> BTreeMap<String, Vec<&Explanation>> {
    let mut grouped: BTreeMap<String, Vec<&Explanation>> = BTreeMap::new();

    for explanation in explanations {
        grouped
            .entry(explanation.source_component.clone())
            .or_default()
            .push(explanation);
    }

    grouped
}

/// Headline numbers for a set of explanations.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationSummary<'a> {
    pub total_negative_points: u32,
    pub total_positive_points: u32,
    pub top_concerns: Vec<&'a Explanation>,
    pub top_positives: Vec<&'a Explanation>,
    /// Component with the most negative signals, if any.
    pub most_problematic: Option<Component>,
}

/// Summarize explanations: point totals, top three each way, and the
/// component raising the most concerns.
pub fn summarize(explanations: &[Explanation]) -> ExplanationSummary<'_> {
    let groups = group_by_polarity(explanations);

    let total_negative_points = groups.negative.iter().map(|e| e.points).sum();
    let total_positive_points = groups.positive.iter().map(|e| e.points).sum();

    let mut negatives_by_component: BTreeMap<Component, usize> = BTreeMap::new();
    for explanation in &groups.negative {
        if let Ok(component) = explanation.source_component.parse::<Component>() {
            *negatives_by_component.entry(component).or_default() += 1;
        }
    }
    // Earliest component wins ties
    let most_problematic = negatives_by_component
        .into_iter()
        .fold(None::<(Component, usize)>, |best, (component, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((component, count)),
        })
        .map(|(component, _)| component);

    ExplanationSummary {
        total_negative_points,
        total_positive_points,
        top_concerns: groups.negative.into_iter().take(3).collect(),
        top_positives: groups.positive.into_iter().take(3).collect(),
        most_problematic,
    }
}
