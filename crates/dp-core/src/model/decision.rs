//! Decision variables `z_d[s_I, s_d]`.

use super::{Constraint, LinearExpr, Model, VarId};
use crate::diagram::InfluenceDiagram;
use dp_common::{DecisionNode, Error, FixedStates, MixedRadix, NodeRole, Result, State};

/// Binary variables of one decision node, one per
/// (information-state row, own state).
#[derive(Debug, Clone)]
pub struct LocalDecisionVariables {
    node: DecisionNode,
    rows: MixedRadix,
    states: usize,
    vars: Vec<VarId>,
}

impl LocalDecisionVariables {
    pub fn node(&self) -> &DecisionNode {
        &self.node
    }

    /// Number of information-state rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// State counts of the information set.
    pub fn row_dims(&self) -> &[usize] {
        self.rows.dims()
    }

    /// State count of the decision node.
    pub fn states(&self) -> usize {
        self.states
    }

    /// Variables of one row, indexed by own state.
    pub fn row(&self, row: usize) -> &[VarId] {
        &self.vars[row * self.states..(row + 1) * self.states]
    }

    /// Variable for information states `info` and own state `state`.
    pub fn get(&self, info: &[State], state: State) -> VarId {
        self.vars[self.rows.index(info) * self.states + state]
    }

    /// Variable for a path, keyed by the path's states at the information
    /// set and at the node itself.
    pub fn for_path(&self, path: &[State]) -> VarId {
        let info: Vec<State> = self.node.information_set.iter().map(|&i| path[i]).collect();
        self.get(&info, path[self.node.index])
    }

    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }
}

/// Decision variables of every decision node, in diagram order.
#[derive(Debug, Clone, Default)]
pub struct DecisionVariables(Vec<LocalDecisionVariables>);

impl DecisionVariables {
    pub fn iter(&self) -> std::slice::Iter<'_, LocalDecisionVariables> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a DecisionVariables {
    type Item = &'a LocalDecisionVariables;
    type IntoIter = std::slice::Iter<'a, LocalDecisionVariables>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Add `z_d` for every decision node with its "exactly one state per row"
/// constraints. A decision node present in `fixed` also gets its fixed
/// state's variable pinned to 1 in every row.
///
/// Fixed states must reference decision nodes and lie in range.
pub fn add_decision_variables<D: InfluenceDiagram + ?Sized>(
    model: &mut Model,
    diagram: &D,
    fixed: &FixedStates,
) -> Result<DecisionVariables> {
    validate_fixed_states(diagram, fixed)?;
    let states = diagram.states();
    let mut locals = Vec::with_capacity(diagram.decision_nodes().len());

    for node in diagram.decision_nodes() {
        let rows = MixedRadix::new(states.counts_of(&node.information_set));
        let own = states.count(node.index);
        let mut vars = Vec::with_capacity(rows.len() * own);

        for row in 0..rows.len() {
            let info = rows.unravel(row);
            let row_vars: Vec<VarId> = (0..own)
                .map(|s| model.add_binary(variable_name(node.index, &info, s)))
                .collect();

            let sum: LinearExpr = row_vars.iter().map(|&z| LinearExpr::from(z)).sum();
            model.add_constraint(
                Constraint::equal(sum, 1.0).named(format!("one_state_z{}[{}]", node.index, row)),
            );
            if let Some(&s) = fixed.get(&node.index) {
                model.add_constraint(
                    Constraint::equal(row_vars[s], 1.0)
                        .named(format!("fixed_z{}[{}]", node.index, row)),
                );
            }
            vars.extend(row_vars);
        }

        locals.push(LocalDecisionVariables {
            node: node.clone(),
            rows,
            states: own,
            vars,
        });
    }

    Ok(DecisionVariables(locals))
}

/// Fixed states may only hold decision nodes, each at a state it has.
pub(super) fn validate_fixed_states<D: InfluenceDiagram + ?Sized>(
    diagram: &D,
    fixed: &FixedStates,
) -> Result<()> {
    for (&node, &state) in fixed {
        match diagram.node_role(node) {
            Some(NodeRole::Decision) => {}
            Some(role) => return Err(Error::InvalidFixedState { node, role }),
            None => {
                return Err(Error::InvalidDiagram(format!(
                    "fixed state references unknown node {}",
                    node
                )))
            }
        }
        let count = diagram.states().count(node);
        if state >= count {
            return Err(Error::InvalidState { node, state, count });
        }
    }
    Ok(())
}

fn variable_name(node: usize, info: &[State], state: State) -> String {
    let key: Vec<String> = info
        .iter()
        .chain(std::iter::once(&state))
        .map(|s| s.to_string())
        .collect();
    format!("z{}[{}]", node, key.join(","))
}
