//! Marginal state probabilities under a strategy.

use crate::diagram::InfluenceDiagram;
use crate::paths::CompatiblePaths;
use crate::strategy::DecisionStrategy;
use dp_common::{Error, FixedStates, NodeIndex, Result, State};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-node state probabilities of every chance and decision node,
/// optionally conditioned on chance-node states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StateProbabilities {
    probabilities: Vec<Vec<f64>>,
    fixed: FixedStates,
}

impl StateProbabilities {
    /// Unconditional marginals.
    pub fn new<D: InfluenceDiagram + ?Sized>(
        diagram: &D,
        strategy: &DecisionStrategy,
    ) -> Result<Self> {
        let (probabilities, _) = marginals(diagram, strategy, &FixedStates::new())?;
        Ok(Self {
            probabilities,
            fixed: FixedStates::new(),
        })
    }

    /// Marginals conditioned additionally on `node` being in `state`.
    ///
    /// Conditions accumulate: conditioning a conditioned result keeps the
    /// earlier fixed states. Conditioning again on an already fixed node is
    /// a no-op for the same state and impossible for another one.
    pub fn condition<D: InfluenceDiagram + ?Sized>(
        &self,
        diagram: &D,
        strategy: &DecisionStrategy,
        node: NodeIndex,
        state: State,
    ) -> Result<Self> {
        match self.fixed.get(&node) {
            Some(&s) if s == state => return Ok(self.clone()),
            Some(_) => return Err(Error::ImpossibleCondition { node, state }),
            None => {}
        }

        let mut fixed = self.fixed.clone();
        fixed.insert(node, state);
        let (probabilities, mass) = marginals(diagram, strategy, &fixed)?;
        if mass <= 0.0 {
            return Err(Error::ImpossibleCondition { node, state });
        }
        Ok(Self {
            probabilities,
            fixed,
        })
    }

    /// Probabilities of each state of `node`.
    pub fn get(&self, node: NodeIndex) -> Option<&[f64]> {
        self.probabilities.get(node).map(Vec::as_slice)
    }

    /// The conditioning events, empty when unconditional.
    pub fn fixed(&self) -> &FixedStates {
        &self.fixed
    }

    /// Nodes with their state probabilities, in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &[f64])> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(node, p)| (node, p.as_slice()))
    }
}

/// Marginals over the compatible paths with `fixed`, normalized by the
/// total mass of those paths, and that mass.
fn marginals<D: InfluenceDiagram + ?Sized>(
    diagram: &D,
    strategy: &DecisionStrategy,
    fixed: &FixedStates,
) -> Result<(Vec<Vec<f64>>, f64)> {
    let states = diagram.states();
    let paths = CompatiblePaths::for_diagram(diagram, strategy, fixed.clone())?;
    let mut probabilities: Vec<Vec<f64>> =
        states.as_slice().iter().map(|&c| vec![0.0; c]).collect();
    let mut mass = 0.0;

    for path in &paths {
        let p = diagram.path_probability(&path);
        if p <= 0.0 {
            continue;
        }
        for (node, &s) in path.iter().enumerate() {
            probabilities[node][s] += p;
        }
        mass += p;
    }

    if mass > 0.0 {
        for row in &mut probabilities {
            for p in row.iter_mut() {
                *p /= mass;
            }
        }
    }
    Ok((probabilities, mass))
}
