//! Node identity and role types.
//!
//! Chance and decision nodes occupy indices `0..n` and make up the state
//! space; value nodes are numbered after them and carry no state.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in an influence diagram.
pub type NodeIndex = usize;

/// Index of a state within a node's state set.
pub type State = usize;

/// Role of a node in an influence diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Random variable with a conditional probability table.
    Chance,
    /// Variable chosen by the decision maker.
    Decision,
    /// Utility contribution, a function of its parents' states.
    Value,
}

impl NodeRole {
    /// All roles in declaration order.
    pub const ALL: [NodeRole; 3] = [NodeRole::Chance, NodeRole::Decision, NodeRole::Value];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Chance => "chance",
            NodeRole::Decision => "decision",
            NodeRole::Value => "value",
        }
    }

    /// Whether nodes of this role contribute a dimension to the state space.
    pub fn has_states(&self) -> bool {
        !matches!(self, NodeRole::Value)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NodeRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chance" | "c" => Ok(NodeRole::Chance),
            "decision" | "d" => Ok(NodeRole::Decision),
            "value" | "utility" | "v" => Ok(NodeRole::Value),
            _ => Err(Error::UnknownNodeClass(s.to_string())),
        }
    }
}

/// A decision node together with its information set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Index of the decision node itself.
    pub index: NodeIndex,
    /// Nodes whose realized states are known when the decision is made.
    pub information_set: Vec<NodeIndex>,
}

impl DecisionNode {
    pub fn new(index: NodeIndex, information_set: Vec<NodeIndex>) -> Self {
        Self {
            index,
            information_set,
        }
    }

    /// Information set followed by the node itself, the key layout of the
    /// node's local strategy and decision variables.
    pub fn key_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes = self.information_set.clone();
        nodes.push(self.index);
        nodes
    }
}
