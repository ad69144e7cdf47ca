//! State space, paths and path filters.

use crate::node::{NodeIndex, State};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;

/// Number of states per chance/decision node, indexed by node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSpace(Vec<usize>);

impl StateSpace {
    pub fn new(counts: Vec<usize>) -> Self {
        StateSpace(counts)
    }

    /// Number of nodes carrying states.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// State count of `node`, or `None` outside the state space.
    pub fn get(&self, node: NodeIndex) -> Option<usize> {
        self.0.get(node).copied()
    }

    /// State count of `node`.
    ///
    /// Panics if `node` is outside the state space; use [`get`](Self::get)
    /// for unchecked indices.
    pub fn count(&self, node: NodeIndex) -> usize {
        self.0[node]
    }

    /// Whether `node` belongs to the state space.
    pub fn contains(&self, node: NodeIndex) -> bool {
        node < self.0.len()
    }

    /// State counts of the given nodes, in order.
    ///
    /// Panics like [`count`](Self::count) on a node outside the state space.
    pub fn counts_of(&self, nodes: &[NodeIndex]) -> Vec<usize> {
        nodes.iter().map(|&n| self.0[n]).collect()
    }

    /// Size of the full path space.
    pub fn path_count(&self) -> usize {
        self.0.iter().product()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for StateSpace {
    fn from(counts: Vec<usize>) -> Self {
        StateSpace(counts)
    }
}

/// One state per chance/decision node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<State>);

impl Path {
    pub fn new(states: Vec<State>) -> Self {
        Path(states)
    }

    /// States of `nodes`, in the given order.
    pub fn project(&self, nodes: &[NodeIndex]) -> Vec<State> {
        nodes.iter().map(|&n| self.0[n]).collect()
    }

    pub fn into_inner(self) -> Vec<State> {
        self.0
    }
}

impl Deref for Path {
    type Target = [State];

    fn deref(&self) -> &[State] {
        &self.0
    }
}

impl From<Vec<State>> for Path {
    fn from(states: Vec<State>) -> Self {
        Path(states)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "({})", parts.join(","))
    }
}

/// Nodes held at a single state, keyed by node.
pub type FixedStates = BTreeMap<NodeIndex, State>;

/// Rule excluding paths whose state at `node` falls inside `states`.
///
/// A path is forbidden only when every rule of a set matches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenPath {
    pub node: NodeIndex,
    pub states: BTreeSet<State>,
}

impl ForbiddenPath {
    pub fn new(node: NodeIndex, states: impl IntoIterator<Item = State>) -> Self {
        Self {
            node,
            states: states.into_iter().collect(),
        }
    }

    pub fn matches(&self, path: &[State]) -> bool {
        self.states.contains(&path[self.node])
    }
}

/// Whether `path` is removed by the conjunction of `rules`.
///
/// An empty rule set forbids nothing.
pub fn is_forbidden(path: &[State], rules: &[ForbiddenPath]) -> bool {
    !rules.is_empty() && rules.iter().all(|rule| rule.matches(path))
}

/// Row-major mixed-radix indexing over a tuple of state counts.
///
/// The last digit varies fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedRadix {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl MixedRadix {
    pub fn new(dims: Vec<usize>) -> Self {
        let mut strides = vec![1; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }
        Self { dims, strides }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of distinct tuples.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear index of a tuple.
    pub fn index(&self, digits: &[State]) -> usize {
        debug_assert_eq!(digits.len(), self.dims.len());
        digits
            .iter()
            .zip(&self.strides)
            .map(|(d, s)| d * s)
            .sum()
    }

    /// Tuple at a linear index.
    pub fn unravel(&self, mut index: usize) -> Vec<State> {
        let mut digits = Vec::with_capacity(self.dims.len());
        for stride in &self.strides {
            digits.push(index / stride);
            index %= stride;
        }
        digits
    }
}
