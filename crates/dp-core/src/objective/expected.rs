//! Expected utility and weighted combinations.

use super::check_scale;
use crate::diagram::InfluenceDiagram;
use crate::model::{LinearExpr, PathVariables};
use dp_common::Result;

/// `Σ P(s)·U(s)·k·x_s` over the path variables.
pub fn expected_value<D: InfluenceDiagram + ?Sized>(
    diagram: &D,
    x: &PathVariables,
    scale: f64,
) -> Result<LinearExpr> {
    check_scale(scale)?;
    let mut expr = LinearExpr::new();
    for (path, var) in x.iter() {
        let weight = diagram.path_probability(path) * diagram.path_utility(path) * scale;
        expr.add_term(var, weight);
    }
    Ok(expr)
}

/// Linear combination `Σ w_i·expr_i`, e.g. `w·EV + (1 - w)·CVaR`.
pub fn weighted_objective(terms: &[(f64, &LinearExpr)]) -> LinearExpr {
    terms
        .iter()
        .map(|&(weight, expr)| expr.clone() * weight)
        .sum::<LinearExpr>()
        .simplified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{add_decision_variables, add_path_variables, Model, PathOptions};
    use crate::tabular::TabularDiagram;
    use dp_common::{Error, FixedStates, Path};

    fn setup() -> (TabularDiagram, Model, PathVariables) {
        let d = TabularDiagram::from_json(
            r#"{"nodes": [
                {"name": "C", "role": "chance", "states": ["lo", "hi"], "probabilities": [0.25, 0.75]},
                {"name": "D", "role": "decision", "states": ["a", "b"]},
                {"name": "V", "role": "value", "parents": ["C", "D"], "utilities": [4, 0, 8, 2]}
            ]}"#,
        )
        .unwrap();
        let mut model = Model::new();
        let z = add_decision_variables(&mut model, &d, &FixedStates::new()).unwrap();
        let x = add_path_variables(&mut model, &d, &z, &PathOptions::default()).unwrap();
        (d, model, x)
    }

    #[test]
    fn coefficients_are_probability_weighted_utilities() {
        let (d, _, x) = setup();
        let ev = expected_value(&d, &x, 1.0).unwrap();
        let coef = |path: Vec<usize>| {
            let var = x.get(&Path::new(path)).unwrap();
            ev.terms().iter().find(|(v, _)| *v == var).map(|&(_, c)| c)
        };
        assert_eq!(coef(vec![0, 0]), Some(1.0));
        assert_eq!(coef(vec![1, 0]), Some(6.0));
        assert_eq!(coef(vec![1, 1]), Some(1.5));
    }

    #[test]
    fn scale_multiplies_every_coefficient() {
        let (d, _, x) = setup();
        let plain = expected_value(&d, &x, 1.0).unwrap();
        let scaled = expected_value(&d, &x, 10.0).unwrap();
        for (a, b) in plain.terms().iter().zip(scaled.terms()) {
            assert_eq!(a.0, b.0);
            assert!((a.1 * 10.0 - b.1).abs() < 1e-12);
        }
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let (d, _, x) = setup();
        assert!(matches!(
            expected_value(&d, &x, 0.0),
            Err(Error::InvalidScaleFactor { .. })
        ));
        assert!(expected_value(&d, &x, f64::NAN).is_err());
    }

    #[test]
    fn weights_combine_expressions() {
        let (d, _, x) = setup();
        let ev = expected_value(&d, &x, 1.0).unwrap();
        let combined = weighted_objective(&[(0.5, &ev), (0.5, &ev)]);
        assert_eq!(combined, ev.simplified());
    }
}
