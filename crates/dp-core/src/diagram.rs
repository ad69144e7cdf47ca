//! The influence diagram contract consumed by the model builder and the
//! policy analyzer.
//!
//! Diagram authoring and validation live outside this crate. The core only
//! needs the state space, the node lists and two pure path functions.

use dp_common::{DecisionNode, NodeIndex, NodeRole, State, StateSpace};

/// Read-only view of an influence diagram.
///
/// Chance and decision nodes occupy indices `0..states().len()`; value nodes
/// are numbered after them.
pub trait InfluenceDiagram {
    /// State counts of chance and decision nodes.
    fn states(&self) -> &StateSpace;

    /// Chance node indices in ascending order.
    fn chance_nodes(&self) -> &[NodeIndex];

    /// Decision nodes in topological order, each with its information set.
    fn decision_nodes(&self) -> &[DecisionNode];

    /// Value node indices.
    fn value_nodes(&self) -> &[NodeIndex];

    /// Product of chance-node conditional probabilities along `path`.
    fn path_probability(&self, path: &[State]) -> f64;

    /// Sum of value-node contributions along `path`.
    fn path_utility(&self, path: &[State]) -> f64;

    /// Flattened conditional probability table of a chance node.
    fn probability_table(&self, node: NodeIndex) -> &[f64];

    /// Role of `node`, or `None` if the diagram has no such node.
    fn node_role(&self, node: NodeIndex) -> Option<NodeRole> {
        if self.chance_nodes().contains(&node) {
            Some(NodeRole::Chance)
        } else if self.decision_nodes().iter().any(|d| d.index == node) {
            Some(NodeRole::Decision)
        } else if self.value_nodes().contains(&node) {
            Some(NodeRole::Value)
        } else {
            None
        }
    }

    /// First chance node whose table contains a structural zero.
    fn chance_node_with_zero(&self) -> Option<NodeIndex> {
        self.chance_nodes()
            .iter()
            .copied()
            .find(|&c| self.probability_table(c).iter().any(|&p| p == 0.0))
    }

    /// Smallest strictly positive entry over all chance tables.
    fn min_positive_table_probability(&self) -> Option<f64> {
        self.chance_nodes()
            .iter()
            .flat_map(|&c| self.probability_table(c).iter().copied())
            .filter(|&p| p > 0.0)
            .min_by(dp_math::cmp_f64)
    }
}

impl<D: InfluenceDiagram + ?Sized> InfluenceDiagram for &D {
    fn states(&self) -> &StateSpace {
        (**self).states()
    }

    fn chance_nodes(&self) -> &[NodeIndex] {
        (**self).chance_nodes()
    }

    fn decision_nodes(&self) -> &[DecisionNode] {
        (**self).decision_nodes()
    }

    fn value_nodes(&self) -> &[NodeIndex] {
        (**self).value_nodes()
    }

    fn path_probability(&self, path: &[State]) -> f64 {
        (**self).path_probability(path)
    }

    fn path_utility(&self, path: &[State]) -> f64 {
        (**self).path_utility(path)
    }

    fn probability_table(&self, node: NodeIndex) -> &[f64] {
        (**self).probability_table(node)
    }
}
