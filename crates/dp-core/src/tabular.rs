//! Reference influence diagram backed by flat tables.
//!
//! A [`DiagramSpec`] lists nodes in topological order. Chance and decision
//! nodes are numbered `0..n` in declaration order and value nodes after
//! them. Tables are flattened row-major over the parents' states followed by
//! the node's own state (chance nodes) or over the parents' states alone
//! (value nodes), the last digit varying fastest.
//!
//! Only the shape checks needed to evaluate path probabilities and
//! utilities are made here.

use crate::diagram::InfluenceDiagram;
use crate::strategy::{DecisionStrategy, LocalDecisionStrategy};
use dp_common::{DecisionNode, Error, MixedRadix, NodeIndex, NodeRole, Result, State, StateSpace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One node of a [`DiagramSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub parents: Vec<String>,
    /// State labels (chance and decision nodes).
    #[serde(default)]
    pub states: Vec<String>,
    /// Conditional probability table (chance nodes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probabilities: Vec<f64>,
    /// Utility table (value nodes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub utilities: Vec<f64>,
}

/// Serialized form of a tabular influence diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSpec {
    pub nodes: Vec<NodeSpec>,
}

/// Serialized decision strategy: for each decision node, the chosen state
/// label per information-state row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategySpec {
    pub decisions: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct Table {
    nodes: Vec<NodeIndex>,
    radix: MixedRadix,
    data: Vec<f64>,
}

impl Table {
    fn lookup(&self, path: &[State]) -> f64 {
        let key: Vec<State> = self.nodes.iter().map(|&n| path[n]).collect();
        self.data[self.radix.index(&key)]
    }
}

/// Influence diagram with explicit probability and utility tables.
#[derive(Debug, Clone)]
pub struct TabularDiagram {
    names: Vec<String>,
    labels: Vec<Vec<String>>,
    states: StateSpace,
    chance: Vec<NodeIndex>,
    decisions: Vec<DecisionNode>,
    values: Vec<NodeIndex>,
    probability_tables: BTreeMap<NodeIndex, Table>,
    utility_tables: Vec<Table>,
}

impl TabularDiagram {
    pub fn from_spec(spec: &DiagramSpec) -> Result<Self> {
        let mut roles = Vec::with_capacity(spec.nodes.len());
        for node in &spec.nodes {
            roles.push(node.role.parse::<NodeRole>()?);
        }

        // Chance and decision nodes first, value nodes after.
        let state_count = roles.iter().filter(|r| r.has_states()).count();
        let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();
        let mut next_state = 0;
        let mut next_value = state_count;
        let mut indices = Vec::with_capacity(spec.nodes.len());
        for role in &roles {
            let index = if role.has_states() {
                next_state += 1;
                next_state - 1
            } else {
                next_value += 1;
                next_value - 1
            };
            indices.push(index);
        }

        let mut names = vec![String::new(); spec.nodes.len()];
        let mut labels = vec![Vec::new(); state_count];
        let mut counts = vec![0; state_count];
        let mut chance = Vec::new();
        let mut decisions = Vec::new();
        let mut values = Vec::new();
        let mut probability_tables = BTreeMap::new();
        let mut utility_tables = Vec::new();

        for ((node, role), &index) in spec.nodes.iter().zip(&roles).zip(&indices) {
            let invalid = |message: String| Error::InvalidDiagram(format!("node '{}': {}", node.name, message));

            let mut parents = Vec::with_capacity(node.parents.len());
            for parent in &node.parents {
                let &p = index_of
                    .get(parent.as_str())
                    .ok_or_else(|| invalid(format!("parent '{}' is not declared before it", parent)))?;
                if p >= state_count {
                    return Err(invalid(format!("parent '{}' is a value node", parent)));
                }
                parents.push(p);
            }
            let parent_counts: Vec<usize> = parents.iter().map(|&p| counts[p]).collect();

            match role {
                NodeRole::Chance | NodeRole::Decision => {
                    if node.states.is_empty() {
                        return Err(invalid("has no states".to_string()));
                    }
                    counts[index] = node.states.len();
                    labels[index] = node.states.clone();
                }
                NodeRole::Value => {
                    if !node.states.is_empty() {
                        return Err(invalid("value nodes carry no states".to_string()));
                    }
                }
            }

            match role {
                NodeRole::Chance => {
                    let mut dims = parent_counts;
                    dims.push(counts[index]);
                    let radix = MixedRadix::new(dims);
                    if node.probabilities.len() != radix.len() {
                        return Err(invalid(format!(
                            "expected {} probabilities, got {}",
                            radix.len(),
                            node.probabilities.len()
                        )));
                    }
                    if let Some(p) = node
                        .probabilities
                        .iter()
                        .find(|p| !(p.is_finite() && (0.0..=1.0).contains(*p)))
                    {
                        return Err(invalid(format!("probability {} outside [0, 1]", p)));
                    }
                    let mut nodes = parents;
                    nodes.push(index);
                    probability_tables.insert(
                        index,
                        Table {
                            nodes,
                            radix,
                            data: node.probabilities.clone(),
                        },
                    );
                    chance.push(index);
                }
                NodeRole::Decision => {
                    if !node.probabilities.is_empty() || !node.utilities.is_empty() {
                        return Err(invalid("decision nodes carry no table".to_string()));
                    }
                    decisions.push(DecisionNode::new(index, parents));
                }
                NodeRole::Value => {
                    let radix = MixedRadix::new(parent_counts);
                    if node.utilities.len() != radix.len() {
                        return Err(invalid(format!(
                            "expected {} utilities, got {}",
                            radix.len(),
                            node.utilities.len()
                        )));
                    }
                    utility_tables.push(Table {
                        nodes: parents,
                        radix,
                        data: node.utilities.clone(),
                    });
                    values.push(index);
                }
            }

            if index_of.insert(node.name.as_str(), index).is_some() {
                return Err(invalid("duplicate node name".to_string()));
            }
            names[index] = node.name.clone();
        }

        chance.sort_unstable();
        Ok(Self {
            names,
            labels,
            states: StateSpace::new(counts),
            chance,
            decisions,
            values,
            probability_tables,
            utility_tables,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let spec: DiagramSpec = serde_json::from_str(json)?;
        Self::from_spec(&spec)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.names.iter().position(|n| n == name)
    }

    pub fn node_name(&self, node: NodeIndex) -> &str {
        &self.names[node]
    }

    /// State labels of a chance or decision node.
    pub fn state_labels(&self, node: NodeIndex) -> &[String] {
        &self.labels[node]
    }

    /// State of `node` by label, or by 0-based index when no label matches.
    pub fn state_index(&self, node: NodeIndex, label: &str) -> Option<State> {
        let labels = self.labels.get(node)?;
        labels.iter().position(|l| l == label).or_else(|| {
            label
                .parse::<State>()
                .ok()
                .filter(|&s| s < labels.len())
        })
    }

    /// Resolve a `(node name, state label)` pair.
    pub fn lookup(&self, name: &str, label: &str) -> Result<(NodeIndex, State)> {
        let node = self
            .node_index(name)
            .filter(|&n| self.states.contains(n))
            .ok_or_else(|| Error::InvalidDiagram(format!("no chance or decision node named '{}'", name)))?;
        let state = self.state_index(node, label).ok_or_else(|| {
            Error::InvalidDiagram(format!("node '{}' has no state '{}'", name, label))
        })?;
        Ok((node, state))
    }

    /// Build a strategy from chosen state labels.
    pub fn strategy_from_spec(&self, spec: &StrategySpec) -> Result<DecisionStrategy> {
        if let Some(unknown) = spec
            .decisions
            .keys()
            .find(|name| !self.decisions.iter().any(|d| &self.names[d.index] == *name))
        {
            return Err(Error::InvalidDiagram(format!(
                "no decision node named '{}'",
                unknown
            )));
        }

        let mut locals = Vec::with_capacity(self.decisions.len());
        for node in &self.decisions {
            let name = &self.names[node.index];
            let chosen = spec.decisions.get(name).ok_or_else(|| Error::InvalidStrategy {
                node: node.index,
                message: format!("no choices given for '{}'", name),
            })?;
            let choices = chosen
                .iter()
                .map(|label| {
                    self.state_index(node.index, label)
                        .ok_or_else(|| Error::InvalidStrategy {
                            node: node.index,
                            message: format!("'{}' is not a state of '{}'", label, name),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            locals.push(LocalDecisionStrategy::from_choices(
                node.clone(),
                self.states.counts_of(&node.information_set),
                self.states.count(node.index),
                choices,
            )?);
        }
        Ok(DecisionStrategy::new(locals))
    }

    /// Chosen state labels of `strategy`.
    pub fn strategy_to_spec(&self, strategy: &DecisionStrategy) -> StrategySpec {
        let decisions = strategy
            .iter()
            .map(|local| {
                let node = local.node().index;
                let labels = local
                    .choices()
                    .iter()
                    .map(|&c| self.labels[node][c].clone())
                    .collect();
                (self.names[node].clone(), labels)
            })
            .collect();
        StrategySpec { decisions }
    }
}

impl InfluenceDiagram for TabularDiagram {
    fn states(&self) -> &StateSpace {
        &self.states
    }

    fn chance_nodes(&self) -> &[NodeIndex] {
        &self.chance
    }

    fn decision_nodes(&self) -> &[DecisionNode] {
        &self.decisions
    }

    fn value_nodes(&self) -> &[NodeIndex] {
        &self.values
    }

    fn path_probability(&self, path: &[State]) -> f64 {
        let mut p = 1.0;
        for table in self.probability_tables.values() {
            p *= table.lookup(path);
            if p == 0.0 {
                break;
            }
        }
        p
    }

    fn path_utility(&self, path: &[State]) -> f64 {
        dp_math::neumaier_sum(self.utility_tables.iter().map(|t| t.lookup(path)))
    }

    fn probability_table(&self, node: NodeIndex) -> &[f64] {
        self.probability_tables
            .get(&node)
            .map(|t| t.data.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USED_CAR: &str = r#"{"nodes": [
        {"name": "condition", "role": "chance", "states": ["lemon", "peach"], "probabilities": [0.2, 0.8]},
        {"name": "purchase", "role": "decision", "states": ["buy", "pass"]},
        {"name": "profit", "role": "value", "parents": ["condition", "purchase"], "utilities": [-100, 0, 60, 0]}
    ]}"#;

    #[test]
    fn indices_put_value_nodes_last() {
        let d = TabularDiagram::from_json(USED_CAR).unwrap();
        assert_eq!(d.states().as_slice(), &[2, 2]);
        assert_eq!(d.chance_nodes(), &[0]);
        assert_eq!(d.decision_nodes()[0], DecisionNode::new(1, vec![]));
        assert_eq!(d.value_nodes(), &[2]);
        assert_eq!(d.node_role(2), Some(NodeRole::Value));
        assert_eq!(d.node_role(3), None);
        assert_eq!(d.node_name(2), "profit");
    }

    #[test]
    fn path_functions_read_tables() {
        let d = TabularDiagram::from_json(USED_CAR).unwrap();
        assert_eq!(d.path_probability(&[1, 0]), 0.8);
        assert_eq!(d.path_utility(&[0, 0]), -100.0);
        assert_eq!(d.path_utility(&[1, 0]), 60.0);
        assert_eq!(d.path_utility(&[1, 1]), 0.0);
        assert_eq!(d.min_positive_table_probability(), Some(0.2));
        assert_eq!(d.chance_node_with_zero(), None);
    }

    #[test]
    fn strategy_spec_roundtrip() {
        let d = TabularDiagram::from_json(USED_CAR).unwrap();
        let mut spec = StrategySpec::default();
        spec.decisions
            .insert("purchase".to_string(), vec!["buy".to_string()]);
        let strategy = d.strategy_from_spec(&spec).unwrap();
        assert_eq!(strategy.get(1).unwrap().choices(), &[0]);
        assert_eq!(d.strategy_to_spec(&strategy), spec);
    }

    #[test]
    fn strategy_spec_errors() {
        let d = TabularDiagram::from_json(USED_CAR).unwrap();
        let mut spec = StrategySpec::default();
        assert!(matches!(
            d.strategy_from_spec(&spec),
            Err(Error::InvalidStrategy { node: 1, .. })
        ));
        spec.decisions
            .insert("purchase".to_string(), vec!["lease".to_string()]);
        assert!(d.strategy_from_spec(&spec).is_err());
        spec.decisions.insert("other".to_string(), vec![]);
        assert!(matches!(
            d.strategy_from_spec(&spec),
            Err(Error::InvalidDiagram(_))
        ));
    }

    #[test]
    fn lookup_accepts_labels_and_indices() {
        let d = TabularDiagram::from_json(USED_CAR).unwrap();
        assert_eq!(d.lookup("condition", "peach").unwrap(), (0, 1));
        assert_eq!(d.lookup("condition", "0").unwrap(), (0, 0));
        assert!(d.lookup("condition", "2").is_err());
        assert!(d.lookup("profit", "0").is_err());
    }

    #[test]
    fn shape_errors_are_reported() {
        let unknown_role = USED_CAR.replace("\"decision\"", "\"oracle\"");
        assert!(matches!(
            TabularDiagram::from_json(&unknown_role),
            Err(Error::UnknownNodeClass(_))
        ));

        let short_table = USED_CAR.replace("[0.2, 0.8]", "[1.0]");
        assert!(matches!(
            TabularDiagram::from_json(&short_table),
            Err(Error::InvalidDiagram(_))
        ));

        let late_parent = r#"{"nodes": [
            {"name": "A", "role": "chance", "parents": ["B"], "states": ["x"], "probabilities": [1.0]},
            {"name": "B", "role": "chance", "states": ["y"], "probabilities": [1.0]}
        ]}"#;
        assert!(TabularDiagram::from_json(late_parent).is_err());

        assert!(matches!(
            TabularDiagram::from_json("{"),
            Err(Error::Json(_))
        ));
    }
}
