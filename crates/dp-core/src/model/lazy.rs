//! Lazy cuts submitted through the solver candidate callback.
//!
//! A [`LazyCut`] pairs a pure [`CutGenerator`] with a one-shot flag. The
//! solver hands each integer-feasible candidate to
//! [`Model::on_candidate`](super::Model::on_candidate); a generator that
//! finds the candidate in violation returns the constraint to add, and the
//! flag guarantees the same global cut is never submitted twice.

use super::{Constraint, LinearExpr, VarId};
use dp_math::{approx_eq, neumaier_sum};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only snapshot of a candidate solution.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    values: &'a [f64],
}

impl<'a> Candidate<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self { values }
    }

    /// Candidate value of `var`, 0 if the solver did not report it.
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }
}

/// Evaluates a candidate and proposes a constraint it violates.
pub trait CutGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// The constraint this generator submits.
    fn constraint(&self) -> Constraint;

    /// `Some(constraint)` if the candidate needs the cut.
    fn evaluate(&self, candidate: &Candidate<'_>) -> Option<Constraint>;
}

/// A registered cut with its one-shot flag.
pub struct LazyCut {
    generator: Box<dyn CutGenerator>,
    added: AtomicBool,
}

impl LazyCut {
    pub fn new(generator: impl CutGenerator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
            added: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.generator.name()
    }

    /// Whether the cut has already been submitted.
    pub fn is_added(&self) -> bool {
        self.added.load(Ordering::Acquire)
    }

    pub fn constraint(&self) -> Constraint {
        self.generator.constraint()
    }

    /// Evaluate a candidate; returns the cut at most once.
    pub fn check(&self, candidate: &Candidate<'_>) -> Option<Constraint> {
        if self.is_added() {
            return None;
        }
        let constraint = self.generator.evaluate(candidate)?;
        self.added
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| constraint)
    }
}

impl fmt::Debug for LazyCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCut")
            .field("name", &self.name())
            .field("added", &self.is_added())
            .finish()
    }
}

/// `Σ x_s·P(s)·k = k`, submitted when a candidate's path mass is not 1.
#[derive(Debug, Clone)]
pub struct ProbabilityCutGenerator {
    terms: Vec<(VarId, f64)>,
    scale: f64,
}

impl ProbabilityCutGenerator {
    /// `terms` pairs each path variable with its path probability.
    pub fn new(terms: Vec<(VarId, f64)>, scale: f64) -> Self {
        Self { terms, scale }
    }
}

impl CutGenerator for ProbabilityCutGenerator {
    fn name(&self) -> &'static str {
        "probability_cut"
    }

    fn constraint(&self) -> Constraint {
        let lhs: LinearExpr = self
            .terms
            .iter()
            .map(|&(x, p)| LinearExpr::term(x, p * self.scale))
            .sum();
        Constraint::equal(lhs, self.scale).named("probability_cut")
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Option<Constraint> {
        let mass = neumaier_sum(self.terms.iter().map(|&(x, p)| candidate.value(x) * p));
        (!approx_eq(mass, 1.0)).then(|| self.constraint())
    }
}

/// `Σ x_s = n`, submitted when the number of active path variables drifts
/// from the number of compatible paths `n` by more than `tolerance`.
#[derive(Debug, Clone)]
pub struct ActivePathsCutGenerator {
    vars: Vec<VarId>,
    epsilon: f64,
    target: f64,
    tolerance: f64,
}

impl ActivePathsCutGenerator {
    /// `epsilon` is the smallest positive probability table entry; a path
    /// variable counts as active when its value exceeds it.
    pub fn new(vars: Vec<VarId>, epsilon: f64, target: usize, tolerance: f64) -> Self {
        Self {
            vars,
            epsilon,
            target: target as f64,
            tolerance,
        }
    }
}

impl CutGenerator for ActivePathsCutGenerator {
    fn name(&self) -> &'static str {
        "active_paths_cut"
    }

    fn constraint(&self) -> Constraint {
        let lhs: LinearExpr = self.vars.iter().map(|&x| LinearExpr::from(x)).sum();
        Constraint::equal(lhs, self.target).named("active_paths_cut")
    }

    fn evaluate(&self, candidate: &Candidate<'_>) -> Option<Constraint> {
        let active = self
            .vars
            .iter()
            .filter(|&&x| candidate.value(x) > self.epsilon)
            .count() as f64;
        ((active - self.target).abs() > self.tolerance).then(|| self.constraint())
    }
}
