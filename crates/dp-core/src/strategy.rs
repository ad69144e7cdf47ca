//! Deterministic decision strategies and their extraction from a solution.

use crate::diagram::InfluenceDiagram;
use crate::model::DecisionVariables;
use crate::solver::Solution;
use dp_common::{DecisionNode, Error, MixedRadix, NodeIndex, Result, State, StateSpace};
use dp_math::round_to_int;
use rand::Rng;

/// Deterministic policy of one decision node: one chosen state per
/// information-state row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecisionStrategy {
    node: DecisionNode,
    rows: MixedRadix,
    states: usize,
    choices: Vec<State>,
}

impl LocalDecisionStrategy {
    /// Validate a 0/1 indicator array.
    ///
    /// `dims` are the state counts of the information set followed by the
    /// node's own count; `data` is laid out row-major over `dims`, the own
    /// state varying fastest. Every row must hold exactly one 1.
    pub fn new(node: DecisionNode, dims: Vec<usize>, data: Vec<u8>) -> Result<Self> {
        let index = node.index;
        let invalid = |message: String| Error::InvalidStrategy {
            node: index,
            message,
        };

        if dims.len() != node.information_set.len() + 1 {
            return Err(invalid(format!(
                "expected {} dimensions, got {}",
                node.information_set.len() + 1,
                dims.len()
            )));
        }
        let (row_dims, own) = dims.split_at(dims.len() - 1);
        let states = own[0];
        if states == 0 {
            return Err(invalid("decision node has no states".to_string()));
        }
        let rows = MixedRadix::new(row_dims.to_vec());
        if data.len() != rows.len() * states {
            return Err(invalid(format!(
                "expected {} entries, got {}",
                rows.len() * states,
                data.len()
            )));
        }

        let mut choices = Vec::with_capacity(rows.len());
        for (row, chunk) in data.chunks(states).enumerate() {
            if chunk.iter().any(|&v| v > 1) {
                return Err(invalid(format!("row {} holds a value other than 0 or 1", row)));
            }
            let selected = chunk.iter().filter(|&&v| v == 1).count();
            match chunk.iter().position(|&v| v == 1) {
                Some(choice) if selected == 1 => choices.push(choice),
                _ => {
                    return Err(invalid(format!(
                        "row {} selects {} states, expected exactly one",
                        row, selected
                    )))
                }
            }
        }

        Ok(Self {
            node,
            rows,
            states,
            choices,
        })
    }

    /// Build from the chosen state of each row, rows ordered as in [`new`](Self::new).
    pub fn from_choices(
        node: DecisionNode,
        row_dims: Vec<usize>,
        states: usize,
        choices: Vec<State>,
    ) -> Result<Self> {
        let rows = MixedRadix::new(row_dims);
        let invalid = |message: String| Error::InvalidStrategy {
            node: node.index,
            message,
        };
        if rows.dims().len() != node.information_set.len() {
            return Err(invalid(format!(
                "expected {} information dimensions, got {}",
                node.information_set.len(),
                rows.dims().len()
            )));
        }
        if choices.len() != rows.len() {
            return Err(invalid(format!(
                "expected {} rows, got {}",
                rows.len(),
                choices.len()
            )));
        }
        if let Some(row) = choices.iter().position(|&c| c >= states) {
            return Err(invalid(format!(
                "row {} chooses state {} of {}",
                row, choices[row], states
            )));
        }
        Ok(Self {
            node,
            rows,
            states,
            choices,
        })
    }

    /// Uniformly random deterministic strategy for `node`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, node: DecisionNode, states: &StateSpace) -> Result<Self> {
        let row_dims = states.counts_of(&node.information_set);
        let own = states.count(node.index);
        if own == 0 {
            return Err(Error::InvalidStrategy {
                node: node.index,
                message: "decision node has no states".to_string(),
            });
        }
        let rows: usize = row_dims.iter().product();
        let choices = (0..rows).map(|_| rng.random_range(0..own)).collect();
        Self::from_choices(node, row_dims, own, choices)
    }

    pub fn node(&self) -> &DecisionNode {
        &self.node
    }

    /// State counts of the information set.
    pub fn row_dims(&self) -> &[usize] {
        self.rows.dims()
    }

    pub fn states(&self) -> usize {
        self.states
    }

    /// Chosen state per row.
    pub fn choices(&self) -> &[State] {
        &self.choices
    }

    /// State chosen when the information set is in `info`.
    pub fn choice(&self, info: &[State]) -> State {
        self.choices[self.rows.index(info)]
    }

    /// The strategy as a 0/1 array, laid out as accepted by [`new`](Self::new).
    pub fn indicator(&self) -> Vec<u8> {
        let mut data = vec![0; self.choices.len() * self.states];
        for (row, &choice) in self.choices.iter().enumerate() {
            data[row * self.states + choice] = 1;
        }
        data
    }

    fn fits(&self, states: &StateSpace) -> bool {
        states.contains(self.node.index)
            && self.node.information_set.iter().all(|&i| states.contains(i))
            && self.states == states.count(self.node.index)
            && self.rows.dims() == states.counts_of(&self.node.information_set).as_slice()
    }
}

/// One local strategy per decision node, in diagram order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecisionStrategy {
    locals: Vec<LocalDecisionStrategy>,
}

impl DecisionStrategy {
    pub fn new(locals: Vec<LocalDecisionStrategy>) -> Self {
        Self { locals }
    }

    /// Uniformly random strategy for every decision node of `diagram`.
    pub fn random<R, D>(rng: &mut R, diagram: &D) -> Result<Self>
    where
        R: Rng + ?Sized,
        D: InfluenceDiagram + ?Sized,
    {
        let locals = diagram
            .decision_nodes()
            .iter()
            .map(|d| LocalDecisionStrategy::random(rng, d.clone(), diagram.states()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { locals })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalDecisionStrategy> {
        self.locals.iter()
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    /// Local strategy of decision node `node`.
    pub fn get(&self, node: NodeIndex) -> Option<&LocalDecisionStrategy> {
        self.locals.iter().find(|l| l.node.index == node)
    }

    /// Overwrite the decision states of `path` with the strategy's choices.
    ///
    /// Local strategies are applied in order, so an information set may
    /// include earlier decision nodes.
    pub fn fill(&self, path: &mut [State]) {
        for local in &self.locals {
            let info: Vec<State> = local.node.information_set.iter().map(|&i| path[i]).collect();
            path[local.node.index] = local.choice(&info);
        }
    }

    /// Whether every decision state of `path` agrees with the strategy.
    pub fn is_compatible(&self, path: &[State]) -> bool {
        self.locals.iter().all(|local| {
            let info: Vec<State> = local.node.information_set.iter().map(|&i| path[i]).collect();
            path[local.node.index] == local.choice(&info)
        })
    }

    /// Check the strategy against a state space whose chance nodes are
    /// `chance_nodes`; every other node of `states` is a decision node.
    ///
    /// Each local strategy must match the shape of `states`, and there must
    /// be exactly one per decision node, in ascending node order, with an
    /// information set of earlier nodes only.
    pub fn validate(&self, states: &StateSpace, chance_nodes: &[NodeIndex]) -> Result<()> {
        let invalid = |node: NodeIndex, message: &str| Error::InvalidStrategy {
            node,
            message: message.to_string(),
        };

        if let Some(local) = self.locals.iter().find(|l| !l.fits(states)) {
            return Err(invalid(
                local.node.index,
                "shape does not match the diagram's state space",
            ));
        }

        let mut previous: Option<NodeIndex> = None;
        for local in &self.locals {
            let index = local.node.index;
            if chance_nodes.contains(&index) {
                return Err(invalid(index, "local strategy assigned to a chance node"));
            }
            if previous.is_some_and(|p| p >= index) {
                return Err(invalid(
                    index,
                    "local strategies must be unique and in diagram order",
                ));
            }
            if local.node.information_set.iter().any(|&i| i >= index) {
                return Err(invalid(
                    index,
                    "information set references a later node",
                ));
            }
            previous = Some(index);
        }

        let missing = (0..states.len())
            .filter(|n| !chance_nodes.contains(n))
            .find(|&n| self.get(n).is_none());
        match missing {
            Some(node) => Err(invalid(node, "decision node has no local strategy")),
            None => Ok(()),
        }
    }

    /// [`validate`](Self::validate) against `diagram`, additionally requiring
    /// each local strategy's node and information set to be the diagram's.
    pub fn validate_for<D: InfluenceDiagram + ?Sized>(&self, diagram: &D) -> Result<()> {
        self.validate(diagram.states(), diagram.chance_nodes())?;
        for (local, node) in self.locals.iter().zip(diagram.decision_nodes()) {
            if local.node != *node {
                return Err(Error::InvalidStrategy {
                    node: local.node.index,
                    message: format!(
                        "expected decision node {} observing {:?}",
                        node.index, node.information_set
                    ),
                });
            }
        }
        if self.locals.len() != diagram.decision_nodes().len() {
            let node = diagram
                .decision_nodes()
                .get(self.locals.len())
                .map_or(0, |d| d.index);
            return Err(Error::InvalidStrategy {
                node,
                message: format!(
                    "expected {} local strategies, got {}",
                    diagram.decision_nodes().len(),
                    self.locals.len()
                ),
            });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DecisionStrategy {
    type Item = &'a LocalDecisionStrategy;
    type IntoIter = std::slice::Iter<'a, LocalDecisionStrategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.locals.iter()
    }
}

/// Read a deterministic strategy from solved decision variables.
///
/// Each value is rounded to the nearest integer; every row must then hold
/// exactly one 1 and zeros elsewhere. A fractional or empty row means the
/// solver returned something that is not a strategy and is reported as
/// [`Error::MalformedStrategy`].
pub fn extract_strategy(z: &DecisionVariables, solution: &Solution) -> Result<DecisionStrategy> {
    let mut locals = Vec::with_capacity(z.len());

    for local in z {
        let node = local.node();
        let mut choices = Vec::with_capacity(local.rows());
        for row in 0..local.rows() {
            let values: Vec<f64> = local.row(row).iter().map(|&var| solution.value(var)).collect();
            let rounded: Vec<i64> = values.iter().map(|&v| round_to_int(v)).collect();
            let selected = rounded.iter().filter(|&&v| v == 1).count();
            let binary = values.iter().all(|v| v.is_finite())
                && rounded.iter().all(|&v| v == 0 || v == 1);
            if !binary || selected != 1 {
                return Err(Error::MalformedStrategy {
                    node: node.index,
                    row,
                    selected,
                });
            }
            let choice = rounded
                .iter()
                .position(|&v| v == 1)
                .ok_or(Error::MalformedStrategy {
                    node: node.index,
                    row,
                    selected,
                })?;
            choices.push(choice);
        }
        locals.push(LocalDecisionStrategy::from_choices(
            node.clone(),
            local.row_dims().to_vec(),
            local.states(),
            choices,
        )?);
    }

    Ok(DecisionStrategy::new(locals))
}
