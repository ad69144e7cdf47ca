//! Path enumeration.
//!
//! [`paths`] walks the whole state space; [`CompatiblePaths`] walks only the
//! paths a decision strategy can produce. Both enumerate in ascending state
//! order with the lowest-indexed free node varying fastest, and both are
//! restartable: iterating twice yields the same sequence.

use crate::diagram::InfluenceDiagram;
use crate::strategy::DecisionStrategy;
use dp_common::{Error, FixedStates, NodeIndex, NodeRole, Path, Result, State, StateSpace};

/// Iterator over every path of a state space, with some nodes held fixed.
#[derive(Debug, Clone)]
pub struct Paths {
    counts: Vec<usize>,
    free: Vec<NodeIndex>,
    next: Option<Vec<State>>,
}

/// All paths of `states` whose state at each fixed node equals the fixed one.
///
/// Fixed entries outside the state space are ignored; callers validate them.
pub fn paths(states: &StateSpace, fixed: &FixedStates) -> Paths {
    let counts = states.as_slice().to_vec();
    let mut start = vec![0; counts.len()];
    for (&node, &state) in fixed {
        if node < start.len() {
            start[node] = state;
        }
    }
    let free = (0..counts.len()).filter(|n| !fixed.contains_key(n)).collect();
    let empty = counts.iter().any(|&c| c == 0);
    Paths {
        counts,
        free,
        next: (!empty).then_some(start),
    }
}

/// Advance `digits` at `positions` like an odometer, the first position
/// fastest. Returns false after the last combination.
fn advance(digits: &mut [State], positions: &[NodeIndex], counts: &[usize]) -> bool {
    for &p in positions {
        digits[p] += 1;
        if digits[p] < counts[p] {
            return true;
        }
        digits[p] = 0;
    }
    false
}

impl Iterator for Paths {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        if advance(&mut succ, &self.free, &self.counts) {
            self.next = Some(succ);
        }
        Some(Path::new(current))
    }
}

/// The paths compatible with a decision strategy.
///
/// Not stored: every iteration enumerates the chance-state product afresh
/// and fills each decision node from its local strategy.
#[derive(Debug, Clone)]
pub struct CompatiblePaths<'a> {
    states: &'a StateSpace,
    chance_nodes: &'a [NodeIndex],
    strategy: &'a DecisionStrategy,
    fixed: FixedStates,
}

impl<'a> CompatiblePaths<'a> {
    /// Validate the query.
    ///
    /// Fixed states must reference chance nodes (`InvalidFixedState`
    /// otherwise) and lie within the node's state count (`InvalidState`);
    /// the strategy must hold exactly one local strategy per decision node
    /// (every node of `states` not in `chance_nodes`) and match its shape.
    pub fn new(
        states: &'a StateSpace,
        chance_nodes: &'a [NodeIndex],
        strategy: &'a DecisionStrategy,
        fixed: FixedStates,
    ) -> Result<Self> {
        for (&node, &state) in &fixed {
            if !chance_nodes.contains(&node) {
                let role = if states.contains(node) {
                    NodeRole::Decision
                } else {
                    NodeRole::Value
                };
                return Err(Error::InvalidFixedState { node, role });
            }
            let count = states.count(node);
            if state >= count {
                return Err(Error::InvalidState { node, state, count });
            }
        }
        strategy.validate(states, chance_nodes)?;

        Ok(Self {
            states,
            chance_nodes,
            strategy,
            fixed,
        })
    }

    /// Compatible paths of `diagram` under `strategy`, whose local
    /// strategies must be for the diagram's own decision nodes.
    pub fn for_diagram<D: InfluenceDiagram + ?Sized>(
        diagram: &'a D,
        strategy: &'a DecisionStrategy,
        fixed: FixedStates,
    ) -> Result<Self> {
        strategy.validate_for(diagram)?;
        Self::new(diagram.states(), diagram.chance_nodes(), strategy, fixed)
    }

    pub fn fixed(&self) -> &FixedStates {
        &self.fixed
    }

    /// Number of compatible paths, computed without enumerating.
    pub fn len(&self) -> usize {
        self.chance_nodes
            .iter()
            .filter(|c| !self.fixed.contains_key(c))
            .map(|&c| self.states.count(c))
            .product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> CompatiblePathIter<'_> {
        let mut start = vec![0; self.states.len()];
        for (&node, &state) in &self.fixed {
            start[node] = state;
        }
        let free: Vec<NodeIndex> = self
            .chance_nodes
            .iter()
            .copied()
            .filter(|c| !self.fixed.contains_key(c))
            .collect();
        let empty = self.is_empty();
        CompatiblePathIter {
            counts: self.states.as_slice(),
            free,
            strategy: self.strategy,
            next: (!empty).then_some(start),
        }
    }
}

impl<'p> IntoIterator for &'p CompatiblePaths<'_> {
    type Item = Path;
    type IntoIter = CompatiblePathIter<'p>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`CompatiblePaths::iter`].
#[derive(Debug, Clone)]
pub struct CompatiblePathIter<'p> {
    counts: &'p [usize],
    free: Vec<NodeIndex>,
    strategy: &'p DecisionStrategy,
    next: Option<Vec<State>>,
}

impl Iterator for CompatiblePathIter<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        let chance = self.next.take()?;
        let mut succ = chance.clone();
        if advance(&mut succ, &self.free, self.counts) {
            self.next = Some(succ);
        }
        let mut path = chance;
        self.strategy.fill(&mut path);
        Some(Path::new(path))
    }
}
