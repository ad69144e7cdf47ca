//! Mixed-integer program representation.
//!
//! The crate does not solve the program. A [`Model`] holds variables, linear
//! constraints, lazily submitted cuts and an objective; an external
//! [`Solver`](crate::solver::Solver) reads it and answers candidate
//! callbacks through [`Model::on_candidate`].

pub mod builder;
pub mod decision;
pub mod lazy;
pub mod path;

pub use builder::{build_model, compile, BuildOptions, BuiltModel, CompiledModel};
pub use decision::{add_decision_variables, DecisionVariables, LocalDecisionVariables};
pub use lazy::{ActivePathsCutGenerator, Candidate, CutGenerator, LazyCut, ProbabilityCutGenerator};
pub use path::{add_path_variables, PathOptions, PathVariables};

use dp_math::{approx_eq, neumaier_sum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use tracing::debug;

/// Handle of a variable inside a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in a solution vector.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: Option<String>,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

impl Variable {
    pub fn is_free(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }
}

/// Affine expression `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn offset(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Value of the expression; variables missing from `values` count as 0.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let sum = neumaier_sum(
            self.terms
                .iter()
                .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0)),
        );
        sum + self.constant
    }

    /// Merge repeated variables and drop zero coefficients.
    pub fn simplified(&self) -> LinearExpr {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for &(var, coef) in &self.terms {
            *merged.entry(var).or_insert(0.0) += coef;
        }
        LinearExpr {
            terms: merged.into_iter().filter(|(_, c)| *c != 0.0).collect(),
            constant: self.constant,
        }
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl From<f64> for LinearExpr {
    fn from(value: f64) -> Self {
        LinearExpr::constant(value)
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + (-rhs)
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, k: f64) -> LinearExpr {
        for (_, coef) in &mut self.terms {
            *coef *= k;
        }
        self.constant *= k;
        self
    }
}

impl Sum for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> LinearExpr {
        iter.fold(LinearExpr::new(), |acc, e| acc + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Le => write!(f, "<="),
            Comparison::Ge => write!(f, ">="),
            Comparison::Eq => write!(f, "="),
        }
    }
}

/// Linear constraint normalized to `Σ coef·var (cmp) rhs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    name: Option<String>,
    lhs: LinearExpr,
    cmp: Comparison,
    rhs: f64,
}

impl Constraint {
    /// `lhs (cmp) rhs`, with every constant moved to the right-hand side.
    pub fn new(lhs: impl Into<LinearExpr>, cmp: Comparison, rhs: impl Into<LinearExpr>) -> Self {
        let mut expr = (lhs.into() - rhs.into()).simplified();
        // `+ 0.0` turns a negated zero into 0.
        let rhs = -expr.constant + 0.0;
        expr.constant = 0.0;
        Self {
            name: None,
            lhs: expr,
            cmp,
            rhs,
        }
    }

    pub fn le(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) -> Self {
        Self::new(lhs, Comparison::Le, rhs)
    }

    pub fn ge(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) -> Self {
        Self::new(lhs, Comparison::Ge, rhs)
    }

    pub fn equal(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) -> Self {
        Self::new(lhs, Comparison::Eq, rhs)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn lhs(&self) -> &LinearExpr {
        &self.lhs
    }

    pub fn comparison(&self) -> Comparison {
        self.cmp
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Amount by which `values` violate the constraint, 0 when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let activity = self.lhs.evaluate(values);
        match self.cmp {
            Comparison::Le => (activity - self.rhs).max(0.0),
            Comparison::Ge => (self.rhs - activity).max(0.0),
            Comparison::Eq => (activity - self.rhs).abs(),
        }
    }

    /// Satisfied within `tol`, relative to the magnitude of the right-hand side.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        self.violation(values) <= tol * self.rhs.abs().max(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

/// A way in which an assignment fails the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Bound { var: VarId, value: f64 },
    Integrality { var: VarId, value: f64 },
    Constraint { index: usize, amount: f64 },
}

/// Variable and constraint counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ModelStats {
    pub variables: usize,
    pub binaries: usize,
    pub continuous: usize,
    pub constraints: usize,
    pub lazy_cuts: usize,
}

/// A mixed-integer program under construction.
///
/// Construction takes `&mut self` and is single-threaded; once built, the
/// model can be shared with a multi-threaded solver, which only calls
/// [`Model::on_candidate`].
#[derive(Debug, Default)]
pub struct Model {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    lazy_cuts: Vec<LazyCut>,
    objective: Option<Objective>,
    names: bool,
}

impl Model {
    pub fn new() -> Self {
        Self::with_names(true)
    }

    /// Model that keeps variable names only when `names` is set.
    pub fn with_names(names: bool) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    pub fn keeps_names(&self) -> bool {
        self.names
    }

    fn add_variable(&mut self, name: String, kind: VarKind, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: self.names.then_some(name),
            kind,
            lower,
            upper,
        });
        id
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), VarKind::Binary, 0.0, 1.0)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_variable(name.into(), VarKind::Continuous, lower, upper)
    }

    pub fn add_free(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(
            name.into(),
            VarKind::Continuous,
            f64::NEG_INFINITY,
            f64::INFINITY,
        )
    }

    /// The variable behind `var`, or `None` if it was not created by this model.
    pub fn variable(&self, var: VarId) -> Option<&Variable> {
        self.variables.get(var.0)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Stored name of `var`, or a positional name when names are off or
    /// `var` belongs to another model.
    pub fn var_name(&self, var: VarId) -> String {
        match self.variables.get(var.0).and_then(|v| v.name.as_ref()) {
            Some(name) => name.clone(),
            None => format!("v{}", var.0),
        }
    }

    /// Add a constraint and return its index.
    pub fn add_constraint(&mut self, constraint: Constraint) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn add_lazy_cut(&mut self, cut: LazyCut) {
        self.lazy_cuts.push(cut);
    }

    pub fn lazy_cuts(&self) -> &[LazyCut] {
        &self.lazy_cuts
    }

    pub fn set_objective(&mut self, sense: Sense, expr: LinearExpr) {
        self.objective = Some(Objective {
            sense,
            expr: expr.simplified(),
        });
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Objective value of an assignment, `None` without an objective.
    pub fn evaluate(&self, values: &[f64]) -> Option<f64> {
        self.objective.as_ref().map(|o| o.expr.evaluate(values))
    }

    /// Every bound, integrality and constraint violation of `values`.
    ///
    /// Lazy cuts are not checked; they only exist once submitted.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<Violation> {
        let mut found = Vec::new();
        for (i, var) in self.variables.iter().enumerate() {
            let id = VarId(i);
            let value = values.get(i).copied().unwrap_or(0.0);
            if value < var.lower - tol || value > var.upper + tol {
                found.push(Violation::Bound { var: id, value });
            }
            if var.kind == VarKind::Binary && !(approx_eq(value, 0.0) || approx_eq(value, 1.0)) {
                found.push(Violation::Integrality { var: id, value });
            }
        }
        for (index, constraint) in self.constraints.iter().enumerate() {
            if !constraint.is_satisfied(values, tol) {
                found.push(Violation::Constraint {
                    index,
                    amount: constraint.violation(values),
                });
            }
        }
        found
    }

    pub fn is_feasible(&self, values: &[f64], tol: f64) -> bool {
        self.violations(values, tol).is_empty()
    }

    /// Solver callback at an integer-feasible candidate.
    ///
    /// Returns the cuts to add as global constraints. Each registered cut is
    /// returned at most once over the model's lifetime, whichever thread
    /// calls.
    pub fn on_candidate(&self, values: &[f64]) -> Vec<Constraint> {
        let candidate = Candidate::new(values);
        self.lazy_cuts
            .iter()
            .filter_map(|cut| {
                let constraint = cut.check(&candidate)?;
                debug!(cut = cut.name(), "lazy cut submitted");
                Some(constraint)
            })
            .collect()
    }

    pub fn stats(&self) -> ModelStats {
        let binaries = self
            .variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count();
        ModelStats {
            variables: self.variables.len(),
            binaries,
            continuous: self.variables.len() - binaries,
            constraints: self.constraints.len(),
            lazy_cuts: self.lazy_cuts.len(),
        }
    }
}
