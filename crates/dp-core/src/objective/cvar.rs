//! Conditional value-at-risk objective.
//!
//! The tail of the utility distribution is selected with indicator
//! variables. For each path `s` with a variable `x_s`, with `u_s = U(s)`,
//! `p_s = P(s)` and scale `k`:
//!
//! ```text
//! η - u_s ≤ M·λ_s                  η - u_s ≥ (M+ε)·λ_s - M
//! η - u_s ≤ (M+ε)·λ'_s - ε         η - u_s ≥ M·(λ'_s - 1)
//! 0 ≤ ρ_s ≤ λ_s·k                  0 ≤ ρ'_s ≤ λ'_s·k
//! ρ_s ≤ ρ'_s                       ρ'_s ≤ x_s·p_s·k
//! (x_s·p_s - (1 - λ_s))·k ≤ ρ_s
//! Σ ρ'_s = α·k
//! ```
//!
//! So `λ_s = 1` iff `u_s < η` and `λ'_s = 1` iff `u_s ≤ η`. The objective is
//! `Σ ρ'_s·u_s / (α·k)`. `M` is the utility range over the paths with a
//! variable and `ε` half the smallest gap between distinct utilities, which
//! keeps the strict and non-strict indicators apart.

use super::check_scale;
use crate::diagram::InfluenceDiagram;
use crate::model::{Constraint, LinearExpr, Model, PathVariables, VarId};
use dp_common::{Error, Path, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Indicator and tail-mass variables of one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailVariables {
    /// 1 iff the path's utility is strictly below η.
    pub lambda: VarId,
    /// 1 iff the path's utility is at most η.
    pub lambda_bar: VarId,
    /// Tail mass strictly below η.
    pub rho: VarId,
    /// Tail mass at or below η.
    pub rho_bar: VarId,
}

/// The CVaR expression and the variables created for it.
#[derive(Debug, Clone)]
pub struct CvarObjective {
    pub expr: LinearExpr,
    /// Value-at-risk threshold.
    pub eta: VarId,
    pub tail: BTreeMap<Path, TailVariables>,
    pub alpha: f64,
    pub big_m: f64,
    pub epsilon: f64,
}

/// Add the CVaR variables and constraints at level `alpha` and return the
/// objective expression.
///
/// `alpha` must lie in `(0, 1]` and `scale` must be positive.
pub fn conditional_value_at_risk<D: InfluenceDiagram + ?Sized>(
    model: &mut Model,
    diagram: &D,
    x: &PathVariables,
    alpha: f64,
    scale: f64,
) -> Result<CvarObjective> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(Error::InvalidRiskLevel {
            alpha,
            expected: "(0, 1]",
        });
    }
    check_scale(scale)?;

    let utilities: Vec<(&Path, VarId, f64, f64)> = x
        .iter()
        .map(|(path, var)| {
            (
                path,
                var,
                diagram.path_utility(path),
                diagram.path_probability(path),
            )
        })
        .collect();
    let values: Vec<f64> = utilities.iter().map(|u| u.2).collect();
    let (u_min, u_max) = dp_math::min_max(values.iter().copied()).ok_or_else(|| {
        Error::InvalidDiagram("no path variables to build a CVaR objective over".to_string())
    })?;
    let big_m = u_max - u_min;
    let epsilon = dp_math::min_positive_gap(&values).map_or(0.0, |gap| gap / 2.0);
    let k = scale;

    let eta = model.add_continuous("eta", u_min, u_max);
    let mut tail = BTreeMap::new();
    let mut rho_bar_sum = LinearExpr::new();
    let mut expr = LinearExpr::new();

    for (path, x_s, u, p) in utilities {
        let vars = TailVariables {
            lambda: model.add_binary(format!("lambda{}", path)),
            lambda_bar: model.add_binary(format!("lambda_bar{}", path)),
            rho: model.add_continuous(format!("rho{}", path), 0.0, f64::INFINITY),
            rho_bar: model.add_continuous(format!("rho_bar{}", path), 0.0, f64::INFINITY),
        };
        let gap = || LinearExpr::from(eta) - LinearExpr::constant(u);
        let TailVariables {
            lambda,
            lambda_bar,
            rho,
            rho_bar,
        } = vars;

        let rows = [
            Constraint::le(gap(), LinearExpr::term(lambda, big_m)),
            Constraint::ge(
                gap(),
                LinearExpr::term(lambda, big_m + epsilon) - LinearExpr::constant(big_m),
            ),
            Constraint::le(
                gap(),
                LinearExpr::term(lambda_bar, big_m + epsilon) - LinearExpr::constant(epsilon),
            ),
            Constraint::ge(
                gap(),
                LinearExpr::term(lambda_bar, big_m) - LinearExpr::constant(big_m),
            ),
            Constraint::le(rho, LinearExpr::term(lambda, k)),
            Constraint::le(rho_bar, LinearExpr::term(lambda_bar, k)),
            Constraint::le(rho, rho_bar),
            Constraint::le(rho_bar, LinearExpr::term(x_s, p * k)),
            Constraint::le(
                LinearExpr::term(x_s, p * k) + LinearExpr::term(lambda, k) - LinearExpr::constant(k),
                rho,
            ),
        ];
        for (i, row) in rows.into_iter().enumerate() {
            model.add_constraint(row.named(format!("cvar{}_{}", i, path)));
        }

        rho_bar_sum.add_term(rho_bar, 1.0);
        expr.add_term(rho_bar, u / (alpha * k));
        tail.insert(path.clone(), vars);
    }

    model.add_constraint(Constraint::equal(rho_bar_sum, alpha * k).named("cvar_tail_mass"));

    debug!(
        alpha,
        paths = tail.len(),
        big_m,
        epsilon,
        "CVaR objective built"
    );

    Ok(CvarObjective {
        expr,
        eta,
        tail,
        alpha,
        big_m,
        epsilon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{add_decision_variables, add_path_variables, PathOptions, Violation};
    use crate::tabular::TabularDiagram;
    use dp_common::FixedStates;

    fn setup() -> (TabularDiagram, Model, PathVariables) {
        let d = TabularDiagram::from_json(
            r#"{"nodes": [
                {"name": "C", "role": "chance", "states": ["a", "b", "c"], "probabilities": [0.2, 0.5, 0.3]},
                {"name": "V", "role": "value", "parents": ["C"], "utilities": [10, 40, 30]}
            ]}"#,
        )
        .unwrap();
        let mut model = Model::new();
        let z = add_decision_variables(&mut model, &d, &FixedStates::new()).unwrap();
        let x = add_path_variables(&mut model, &d, &z, &PathOptions::default()).unwrap();
        (d, model, x)
    }

    #[test]
    fn constants_follow_utilities() {
        let (d, mut model, x) = setup();
        let cvar = conditional_value_at_risk(&mut model, &d, &x, 0.5, 1.0).unwrap();
        assert_eq!(cvar.big_m, 30.0);
        assert_eq!(cvar.epsilon, 5.0);
        assert_eq!(cvar.tail.len(), 3);
        let eta = model.variable(cvar.eta).unwrap();
        assert_eq!((eta.lower, eta.upper), (10.0, 40.0));
        // 9 rows per path plus the tail mass row.
        assert_eq!(model.constraints().len(), 28);
    }

    #[test]
    fn tail_assignment_is_feasible_and_evaluates_cvar() {
        let (d, mut model, x) = setup();
        let alpha = 0.5;
        let cvar = conditional_value_at_risk(&mut model, &d, &x, alpha, 1.0).unwrap();

        // Sorted: 10 (0.2), 30 (0.3), 40 (0.5). VaR(0.5) = 30, CVaR = (2 + 9) / 0.5.
        let mut values = vec![0.0; model.num_variables()];
        for var in x.vars() {
            values[var.index()] = 1.0;
        }
        values[cvar.eta.index()] = 30.0;
        let at = |s: usize| cvar.tail[&Path::new(vec![s])];
        values[at(0).lambda.index()] = 1.0;
        values[at(0).lambda_bar.index()] = 1.0;
        values[at(0).rho.index()] = 0.2;
        values[at(0).rho_bar.index()] = 0.2;
        values[at(2).lambda_bar.index()] = 1.0;
        values[at(2).rho_bar.index()] = 0.3;

        assert!(model.is_feasible(&values, 1e-9), "{:?}", model.violations(&values, 1e-9));
        assert!((cvar.expr.evaluate(&values) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn indicators_cannot_lie() {
        let (d, mut model, x) = setup();
        let cvar = conditional_value_at_risk(&mut model, &d, &x, 0.5, 1.0).unwrap();
        let mut values = vec![0.0; model.num_variables()];
        values[cvar.eta.index()] = 30.0;
        // Utility 40 is above η, so λ' = 1 breaks η - u ≥ M·(λ' - 1).
        values[cvar.tail[&Path::new(vec![1])].lambda_bar.index()] = 1.0;
        let broken: Vec<&str> = model
            .violations(&values, 1e-9)
            .iter()
            .filter_map(|v| match v {
                Violation::Constraint { index, .. } => model.constraints()[*index].name(),
                _ => None,
            })
            .collect();
        assert!(broken.contains(&"cvar3_(1)"));
    }

    #[test]
    fn risk_level_and_scale_are_checked() {
        let (d, mut model, x) = setup();
        assert!(matches!(
            conditional_value_at_risk(&mut model, &d, &x, 0.0, 1.0),
            Err(Error::InvalidRiskLevel { .. })
        ));
        assert!(matches!(
            conditional_value_at_risk(&mut model, &d, &x, 1.5, 1.0),
            Err(Error::InvalidRiskLevel { .. })
        ));
        assert!(matches!(
            conditional_value_at_risk(&mut model, &d, &x, 0.5, -1.0),
            Err(Error::InvalidScaleFactor { .. })
        ));
    }

    #[test]
    fn equal_utilities_give_zero_epsilon() {
        let d = TabularDiagram::from_json(
            r#"{"nodes": [
                {"name": "C", "role": "chance", "states": ["a", "b"], "probabilities": [0.5, 0.5]},
                {"name": "V", "role": "value", "parents": ["C"], "utilities": [7, 7]}
            ]}"#,
        )
        .unwrap();
        let mut model = Model::new();
        let z = add_decision_variables(&mut model, &d, &FixedStates::new()).unwrap();
        let x = add_path_variables(&mut model, &d, &z, &PathOptions::default()).unwrap();
        let cvar = conditional_value_at_risk(&mut model, &d, &x, 1.0, 1.0).unwrap();
        assert_eq!(cvar.big_m, 0.0);
        assert_eq!(cvar.epsilon, 0.0);
    }
}
