//! Utility distribution of a strategy.

use crate::diagram::InfluenceDiagram;
use crate::paths::CompatiblePaths;
use crate::strategy::DecisionStrategy;
use dp_common::{FixedStates, Result};
use dp_math::{cmp_f64, neumaier_sum};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Distinct utilities in increasing order with their probability mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UtilityDistribution {
    utilities: Vec<f64>,
    probabilities: Vec<f64>,
}

impl UtilityDistribution {
    /// Distribution over the compatible paths of `strategy`.
    ///
    /// Zero-probability paths are dropped and exactly equal utilities merged.
    pub fn new<D: InfluenceDiagram + ?Sized>(
        diagram: &D,
        strategy: &DecisionStrategy,
    ) -> Result<Self> {
        let paths = CompatiblePaths::for_diagram(diagram, strategy, FixedStates::new())?;
        let outcomes = paths
            .iter()
            .map(|path| (diagram.path_utility(&path), diagram.path_probability(&path)));
        Ok(Self::from_outcomes(outcomes))
    }

    /// Distribution of `(utility, probability)` outcomes.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut outcomes: Vec<(f64, f64)> =
            outcomes.into_iter().filter(|&(_, p)| p > 0.0).collect();
        outcomes.sort_by(|a, b| cmp_f64(&a.0, &b.0));

        let mut utilities: Vec<f64> = Vec::new();
        let mut probabilities: Vec<f64> = Vec::new();
        for (u, p) in outcomes {
            match (utilities.last(), probabilities.last_mut()) {
                (Some(&last), Some(mass)) if last == u => *mass += p,
                _ => {
                    utilities.push(u);
                    probabilities.push(p);
                }
            }
        }
        Self {
            utilities,
            probabilities,
        }
    }

    pub fn utilities(&self) -> &[f64] {
        &self.utilities
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.utilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.utilities
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }

    pub fn total_mass(&self) -> f64 {
        neumaier_sum(self.probabilities.iter().copied())
    }

    pub fn expected_value(&self) -> f64 {
        neumaier_sum(self.iter().map(|(u, p)| u * p))
    }
}
