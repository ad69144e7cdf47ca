//! Seam to an external branch-and-bound solver.

use crate::model::{Model, VarId};
use serde::Serialize;

/// Termination status reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// A feasible incumbent without a proof of optimality.
    Feasible,
    Infeasible,
    Unbounded,
    /// Stopped by the solver's own time or node limit.
    Interrupted,
}

impl SolveStatus {
    /// Whether the solution carries usable variable values.
    pub fn has_values(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Variable assignment returned by a solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    values: Vec<f64>,
}

impl Solution {
    pub fn new(status: SolveStatus, objective_value: Option<f64>, values: Vec<f64>) -> Self {
        Self {
            status,
            objective_value,
            values,
        }
    }

    /// Value of `var`; variables the solver did not report read as 0.
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// An external MIP solver.
///
/// Implementations must call [`Model::on_candidate`] at every
/// integer-feasible candidate and add the returned constraints globally.
/// Their errors are passed through unmodified.
pub trait Solver {
    type Error;

    fn solve(&mut self, model: &Model) -> Result<Solution, Self::Error>;
}
