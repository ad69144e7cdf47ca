//! Shared helpers for dp-core integration tests.
//!
//! [`EnumerationSolver`] stands in for a branch-and-bound solver on small
//! diagrams: it tries every deterministic strategy, sets the decision and
//! path variables it implies, honors lazy cuts through
//! [`Model::on_candidate`] and keeps the best feasible assignment.

#![allow(dead_code)]

use dp_core::model::{Constraint, DecisionVariables, Model, PathVariables, Sense};
use dp_core::objective::CvarObjective;
use dp_core::solver::{Solution, SolveStatus, Solver};
use dp_core::strategy::LocalDecisionStrategy;
use dp_core::{DecisionStrategy, InfluenceDiagram};

pub const TOL: f64 = 1e-6;

pub fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_text(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture readable")
}

/// Every deterministic strategy of `diagram`.
pub fn all_strategies<D: InfluenceDiagram + ?Sized>(diagram: &D) -> Vec<DecisionStrategy> {
    let states = diagram.states();
    let mut partial: Vec<Vec<LocalDecisionStrategy>> = vec![Vec::new()];
    for node in diagram.decision_nodes() {
        let row_dims = states.counts_of(&node.information_set);
        let rows: usize = row_dims.iter().product();
        let own = states.count(node.index);
        let mut next = Vec::new();
        for choices in choice_vectors(rows, own) {
            let local =
                LocalDecisionStrategy::from_choices(node.clone(), row_dims.clone(), own, choices)
                    .expect("valid choices");
            for prefix in &partial {
                let mut extended = prefix.clone();
                extended.push(local.clone());
                next.push(extended);
            }
        }
        partial = next;
    }
    partial.into_iter().map(DecisionStrategy::new).collect()
}

fn choice_vectors(rows: usize, states: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new()];
    for _ in 0..rows {
        out = out
            .into_iter()
            .flat_map(|prefix: Vec<usize>| {
                (0..states).map(move |s| {
                    let mut v = prefix.clone();
                    v.push(s);
                    v
                })
            })
            .collect();
    }
    out
}

/// Variable values a strategy implies: its z rows one-hot and x = 1 on
/// every compatible path that has a variable. Other variables are 0.
pub fn strategy_values(
    model: &Model,
    z: &DecisionVariables,
    x: &PathVariables,
    strategy: &DecisionStrategy,
) -> Vec<f64> {
    let mut values = vec![0.0; model.num_variables()];
    for (local_vars, local) in z.iter().zip(strategy.iter()) {
        for row in 0..local_vars.rows() {
            let chosen = local.choices()[row];
            values[local_vars.row(row)[chosen].index()] = 1.0;
        }
    }
    for (path, var) in x.iter() {
        if strategy.is_compatible(path) {
            values[var.index()] = 1.0;
        }
    }
    values
}

/// Tail of a CVaR objective to complete for each candidate.
pub struct CvarCompletion<'a> {
    pub cvar: &'a CvarObjective,
    /// Amount subtracted from diagram utilities when the model was built.
    pub utility_offset: f64,
    pub scale: f64,
}

pub struct EnumerationSolver<'a, D: ?Sized> {
    diagram: &'a D,
    z: &'a DecisionVariables,
    x: &'a PathVariables,
    cvar: Option<CvarCompletion<'a>>,
    /// Cuts submitted through the callback so far.
    pub cut_pool: Vec<Constraint>,
    pub candidates: usize,
}

impl<'a, D: InfluenceDiagram + ?Sized> EnumerationSolver<'a, D> {
    pub fn new(diagram: &'a D, z: &'a DecisionVariables, x: &'a PathVariables) -> Self {
        Self {
            diagram,
            z,
            x,
            cvar: None,
            cut_pool: Vec::new(),
            candidates: 0,
        }
    }

    pub fn with_cvar(mut self, completion: CvarCompletion<'a>) -> Self {
        self.cvar = Some(completion);
        self
    }

    fn candidate(&self, model: &Model, strategy: &DecisionStrategy) -> Vec<f64> {
        let mut values = strategy_values(model, self.z, self.x, strategy);
        if let Some(completion) = &self.cvar {
            self.complete_tail(completion, &mut values);
        }
        values
    }

    /// The unique tail assignment for the chosen paths: η at the VaR and
    /// the mass at η split to fill α.
    fn complete_tail(&self, completion: &CvarCompletion<'_>, values: &mut [f64]) {
        let k = completion.scale;
        let alpha = completion.cvar.alpha;
        let mut outcomes: Vec<(f64, f64)> = self
            .x
            .iter()
            .filter(|(_, var)| values[var.index()] > 0.5)
            .map(|(path, _)| {
                (
                    self.diagram.path_utility(path) - completion.utility_offset,
                    self.diagram.path_probability(path),
                )
            })
            .collect();
        if outcomes.is_empty() {
            return;
        }
        outcomes.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut cumulative = 0.0;
        let mut eta = outcomes[outcomes.len() - 1].0;
        for &(u, p) in &outcomes {
            cumulative += p;
            if cumulative >= alpha - 1e-12 {
                eta = u;
                break;
            }
        }
        let below: f64 = outcomes
            .iter()
            .filter(|(u, _)| *u < eta)
            .map(|(_, p)| p)
            .sum();
        let at: f64 = outcomes
            .iter()
            .filter(|(u, _)| *u == eta)
            .map(|(_, p)| p)
            .sum();
        let share = if at > 0.0 { (alpha - below) / at } else { 0.0 };

        values[completion.cvar.eta.index()] = eta;
        // Indicators are tied to η on every path; mass only on chosen ones.
        for (path, vars) in &completion.cvar.tail {
            let u = self.diagram.path_utility(path) - completion.utility_offset;
            let chosen = self
                .x
                .get(path)
                .is_some_and(|x| values[x.index()] > 0.5);
            let mass = if chosen {
                self.diagram.path_probability(path) * k
            } else {
                0.0
            };
            if u < eta {
                values[vars.lambda.index()] = 1.0;
                values[vars.lambda_bar.index()] = 1.0;
                values[vars.rho.index()] = mass;
                values[vars.rho_bar.index()] = mass;
            } else if u == eta {
                values[vars.lambda_bar.index()] = 1.0;
                values[vars.rho_bar.index()] = mass * share;
            }
        }
    }

    fn accepts(&self, model: &Model, values: &[f64]) -> bool {
        model.is_feasible(values, TOL) && self.cut_pool.iter().all(|c| c.is_satisfied(values, TOL))
    }
}

impl<D: InfluenceDiagram + ?Sized> Solver for EnumerationSolver<'_, D> {
    type Error = String;

    fn solve(&mut self, model: &Model) -> Result<Solution, String> {
        let objective = model.objective().ok_or("model has no objective")?;
        let sense = objective.sense;
        let mut best: Option<(f64, Vec<f64>)> = None;

        for strategy in all_strategies(self.diagram) {
            let values = self.candidate(model, &strategy);
            self.candidates += 1;
            let cuts = model.on_candidate(&values);
            self.cut_pool.extend(cuts);
            if !self.accepts(model, &values) {
                continue;
            }
            let value = objective.expr.evaluate(&values);
            let better = match (&best, sense) {
                (None, _) => true,
                (Some((b, _)), Sense::Maximize) => value > *b + TOL,
                (Some((b, _)), Sense::Minimize) => value < *b - TOL,
            };
            if better {
                best = Some((value, values));
            }
        }

        Ok(match best {
            Some((value, values)) if self.accepts(model, &values) => {
                Solution::new(SolveStatus::Optimal, Some(value), values)
            }
            _ => Solution::new(SolveStatus::Infeasible, None, Vec::new()),
        })
    }
}
