//! Component weight table and renormalization.
//!
//! The table is declared once from configuration and validated up front.
//! Renormalization is a pure function of the table and the set of components
//! that succeeded, kept apart from the score arithmetic so each can be tested
//! on its own.

use crate::config::Config;
use crate::models::Component;
use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Validated, positive weights for a set of components.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<Component, f64>,
}

impl WeightTable {
    /// Build a table, rejecting empty tables and non-positive or non-finite weights.
    pub fn new(weights: BTreeMap<Component, f64>) -> Result<Self> {
        if weights.is_empty() {
            bail!("weight table must contain at least one component");
        }
        for (component, weight) in &weights {
            if !weight.is_finite() || *weight <= 0.0 {
                bail!("weight for {} must be a positive number, got {}", component, weight);
            }
        }
        Ok(Self { weights })
    }

    /// Weights of the enabled components in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let enabled = config.enabled_components();
        let weights = config
            .component_weights()
            .into_iter()
            .filter(|(component, _)| enabled.contains(component))
            .collect();
        Self::new(weights)
    }

    /// Configured weight of a component, if it is in the table.
    pub fn get(&self, component: Component) -> Option<f64> {
        self.weights.get(&component).copied()
    }
}

/// Rescale the weights of `succeeded` so they sum to 1.0.
///
/// Components outside the table are ignored. An empty result means nothing
/// succeeded, in which case no score may be produced.
pub fn renormalize(table: &WeightTable, succeeded: &BTreeSet<Component>) -> BTreeMap<Component, f64> {
    let surviving: Vec<(Component, f64)> = succeeded
        .iter()
        .filter_map(|component| table.get(*component).map(|weight| (*component, weight)))
        .collect();

    let total: f64 = surviving.iter().map(|(_, weight)| weight).sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }

    surviving
        .into_iter()
        .map(|(component, weight)| (component, weight / total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_table() -> WeightTable {
        WeightTable::new(
            [
                (Component::Domain, 0.35),
                (Component::Content, 0.40),
                (Component::Technical, 0.25),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap()
    }

    fn set(components: &[Component]) -> BTreeSet<Component> {
        components.iter().copied().collect()
    }

    #[test]
    fn test_rejects_invalid_weights() {
        assert!(WeightTable::new(BTreeMap::new()).is_err());
        assert!(WeightTable::new([(Component::Domain, 0.0)].into_iter().collect()).is_err());
        assert!(WeightTable::new([(Component::Domain, -0.2)].into_iter().collect()).is_err());
        assert!(WeightTable::new([(Component::Domain, f64::NAN)].into_iter().collect()).is_err());
    }

    #[test]
    fn test_from_config_uses_enabled_components_only() {
        let table = WeightTable::from_config(&Config::default()).unwrap();
        assert_eq!(table.get(Component::Domain), Some(0.35));
        assert_eq!(table.get(Component::Visual), None);
        assert_eq!(table.get(Component::Content), Some(0.40));
        assert_eq!(table.get(Component::Technical), Some(0.25));
    }

    #[test]
    fn test_full_success_keeps_weights() {
        let table = spec_table();
        let weights = renormalize(
            &table,
            &set(&[Component::Domain, Component::Content, Component::Technical]),
        );
        assert!((weights[&Component::Domain] - 0.35).abs() < 1e-9);
        assert!((weights[&Component::Content] - 0.40).abs() < 1e-9);
        assert!((weights[&Component::Technical] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_partial_success_rescales_to_one() {
        let table = spec_table();
        let weights = renormalize(&table, &set(&[Component::Domain, Component::Technical]));

        assert_eq!(weights.len(), 2);
        assert!((weights[&Component::Domain] - 0.35 / 0.60).abs() < 1e-9);
        assert!((weights[&Component::Technical] - 0.25 / 0.60).abs() < 1e-9);
        assert!((weights.values().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_success_gets_full_weight() {
        let weights = renormalize(&spec_table(), &set(&[Component::Content]));
        assert_eq!(weights.len(), 1);
        assert!((weights[&Component::Content] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_succeeded_yields_empty() {
        assert!(renormalize(&spec_table(), &BTreeSet::new()).is_empty());
        assert!(renormalize(&spec_table(), &set(&[Component::Visual])).is_empty());
    }

    #[test]
    fn test_scaling_weights_does_not_change_renormalized_result() {
        let scaled = WeightTable::new(
            [
                (Component::Domain, 3.5),
                (Component::Content, 4.0),
                (Component::Technical, 2.5),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();
        let succeeded = set(&[Component::Domain, Component::Content]);

        let a = renormalize(&spec_table(), &succeeded);
        let b = renormalize(&scaled, &succeeded);
        for component in succeeded {
            assert!((a[&component] - b[&component]).abs() < 1e-12);
        }
    }
}
