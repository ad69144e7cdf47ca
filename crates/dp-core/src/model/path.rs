//! Path compatibility variables `x_s` and their linking constraints.

use super::{Constraint, DecisionVariables, LinearExpr, Model, VarId};
use crate::diagram::InfluenceDiagram;
use crate::paths::paths;
use super::decision::validate_fixed_states;
use dp_common::{
    is_forbidden, Error, FixedStates, ForbiddenPath, MixedRadix, NodeIndex, Path, Result,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Typed mapping from path to its compatibility variable.
///
/// Paths without a variable (zero probability or forbidden) are implicitly
/// zero; use [`get`](Self::get) or [`contains`](Self::contains) to tell.
#[derive(Debug, Clone, Default)]
pub struct PathVariables {
    vars: BTreeMap<Path, VarId>,
}

impl PathVariables {
    pub fn get(&self, path: &Path) -> Option<VarId> {
        self.vars.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.vars.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Paths and their variables in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, VarId)> + '_ {
        self.vars.iter().map(|(p, &v)| (p, v))
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.vars.values().copied()
    }
}

/// Which paths get a variable.
#[derive(Debug, Clone, Copy)]
pub struct PathOptions<'a> {
    /// Rules whose conjunction removes a path.
    pub forbidden: &'a [ForbiddenPath],
    /// Decision nodes restricted to a single state.
    pub fixed: &'a FixedStates,
}

static NO_FIXED_STATES: FixedStates = FixedStates::new();

impl Default for PathOptions<'_> {
    fn default() -> Self {
        Self {
            forbidden: &[],
            fixed: &NO_FIXED_STATES,
        }
    }
}

/// Add `x_s ∈ [0, 1]` for every path with positive probability that is not
/// forbidden, plus the linking constraints tying paths to decisions.
///
/// For decision node `d` and each (information state, own state) pair with
/// at least one path variable, the sum of those variables is bounded by
/// `z_d[s_I, s_d]` times the smaller of the number of such variables and
/// the theoretical count `Π S / Π S[I_d ∪ {d}] / Π S[other decisions]`.
///
/// Fixed states and forbidden-path rules are checked against the diagram
/// before any variable is added.
pub fn add_path_variables<D: InfluenceDiagram + ?Sized>(
    model: &mut Model,
    diagram: &D,
    z: &DecisionVariables,
    options: &PathOptions<'_>,
) -> Result<PathVariables> {
    validate_fixed_states(diagram, options.fixed)?;
    validate_forbidden_paths(diagram, options.forbidden)?;
    let states = diagram.states();
    let mut vars = BTreeMap::new();

    for path in paths(states, options.fixed) {
        if diagram.path_probability(&path) <= 0.0 || is_forbidden(&path, options.forbidden) {
            continue;
        }
        let x = model.add_continuous(format!("x{}", path), 0.0, 1.0);
        vars.insert(path, x);
    }
    let x = PathVariables { vars };

    let decision_indices: Vec<NodeIndex> = z.iter().map(|l| l.node().index).collect();
    let total = states.path_count();

    for local in z {
        let node = local.node();
        let key_nodes = node.key_nodes();
        let key_radix = MixedRadix::new(states.counts_of(&key_nodes));

        let others: usize = decision_indices
            .iter()
            .filter(|&&d| d != node.index && !node.information_set.contains(&d))
            .map(|&d| states.count(d))
            .product();
        let theoretical = total / key_radix.len().max(1) / others.max(1);

        let mut buckets: Vec<Vec<VarId>> = vec![Vec::new(); key_radix.len()];
        for (path, var) in x.iter() {
            buckets[key_radix.index(&path.project(&key_nodes))].push(var);
        }

        for (key, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let digits = key_radix.unravel(key);
            let (info, own) = digits.split_at(digits.len() - 1);
            let z_var = local.get(info, own[0]);
            let bound = bucket.len().min(theoretical) as f64;

            let sum: LinearExpr = bucket.iter().map(|&v| LinearExpr::from(v)).sum();
            model.add_constraint(
                Constraint::le(sum, LinearExpr::term(z_var, bound))
                    .named(format!("link_z{}[{}]", node.index, key)),
            );
        }
    }

    debug!(
        path_variables = x.len(),
        path_space = total,
        "path compatibility variables added"
    );
    Ok(x)
}

/// Forbidden-path rules must reference nodes and states of the state space.
pub(super) fn validate_forbidden_paths<D: InfluenceDiagram + ?Sized>(
    diagram: &D,
    rules: &[ForbiddenPath],
) -> Result<()> {
    let states = diagram.states();
    for rule in rules {
        let count = states.get(rule.node).ok_or_else(|| {
            Error::InvalidDiagram(format!(
                "forbidden path rule references node {} outside the state space",
                rule.node
            ))
        })?;
        if let Some(&state) = rule.states.iter().find(|&&s| s >= count) {
            return Err(Error::InvalidState {
                node: rule.node,
                state,
                count,
            });
        }
    }
    Ok(())
}
