//! Property-based tests for path enumeration and strategy analysis.

use dp_common::FixedStates;
use dp_core::analysis::{
    conditional_value_at_risk, value_at_risk, StateProbabilities, UtilityDistribution,
};
use dp_core::tabular::{DiagramSpec, NodeSpec, TabularDiagram};
use dp_core::{paths, CompatiblePaths, DecisionStrategy, InfluenceDiagram};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

/// A -> B -> D -> V with V also depending on A.
#[derive(Debug, Clone)]
struct Shape {
    a: usize,
    b: usize,
    d: usize,
    a_weights: Vec<u32>,
    b_weights: Vec<u32>,
    utilities: Vec<i32>,
    seed: u64,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    (2usize..=3, 2usize..=3, 2usize..=3).prop_flat_map(|(a, b, d)| {
        (
            prop::collection::vec(1u32..10, a),
            prop::collection::vec(1u32..10, a * b),
            prop::collection::vec(-20i32..=20, a * d),
            any::<u64>(),
        )
            .prop_map(move |(a_weights, b_weights, utilities, seed)| Shape {
                a,
                b,
                d,
                a_weights,
                b_weights,
                utilities,
                seed,
            })
    })
}

fn normalized_rows(weights: &[u32], width: usize) -> Vec<f64> {
    weights
        .chunks(width)
        .flat_map(|row| {
            let total: u32 = row.iter().sum();
            row.iter().map(move |&w| w as f64 / total as f64)
        })
        .collect()
}

fn labels(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}{}", prefix, i)).collect()
}

fn build(shape: &Shape) -> (TabularDiagram, DecisionStrategy) {
    let node = |name: &str, role: &str, parents: &[&str]| NodeSpec {
        name: name.to_string(),
        role: role.to_string(),
        parents: parents.iter().map(|p| p.to_string()).collect(),
        states: Vec::new(),
        probabilities: Vec::new(),
        utilities: Vec::new(),
    };
    let spec = DiagramSpec {
        nodes: vec![
            NodeSpec {
                states: labels("a", shape.a),
                probabilities: normalized_rows(&shape.a_weights, shape.a),
                ..node("A", "chance", &[])
            },
            NodeSpec {
                states: labels("b", shape.b),
                probabilities: normalized_rows(&shape.b_weights, shape.b),
                ..node("B", "chance", &["A"])
            },
            NodeSpec {
                states: labels("d", shape.d),
                ..node("D", "decision", &["B"])
            },
            NodeSpec {
                utilities: shape.utilities.iter().map(|&u| u as f64).collect(),
                ..node("V", "value", &["A", "D"])
            },
        ],
    };
    let diagram = TabularDiagram::from_spec(&spec).expect("generated diagram is valid");
    let mut rng = StdRng::seed_from_u64(shape.seed);
    let strategy = DecisionStrategy::random(&mut rng, &diagram).expect("random strategy");
    (diagram, strategy)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn compatible_paths_cover_the_chance_product(shape in shape_strategy()) {
        let (diagram, strategy) = build(&shape);
        let compatible = CompatiblePaths::for_diagram(&diagram, &strategy, FixedStates::new()).unwrap();
        prop_assert_eq!(compatible.len(), shape.a * shape.b);

        let all: Vec<_> = compatible.iter().collect();
        prop_assert_eq!(all.len(), compatible.len());
        let distinct: BTreeSet<_> = all.iter().cloned().collect();
        prop_assert_eq!(distinct.len(), all.len());
        for path in &all {
            prop_assert!(strategy.is_compatible(path));
        }

        let total = paths(diagram.states(), &FixedStates::new()).count();
        prop_assert_eq!(total, shape.a * shape.b * shape.d);
    }

    #[test]
    fn distribution_is_a_probability_measure(shape in shape_strategy()) {
        let (diagram, strategy) = build(&shape);
        let dist = UtilityDistribution::new(&diagram, &strategy).unwrap();

        prop_assert!((dist.total_mass() - 1.0).abs() < 1e-9);
        prop_assert!(dist.utilities().windows(2).all(|w| w[0] < w[1]));
        prop_assert!(dist.probabilities().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn full_tail_risk_is_the_mean_and_the_max(shape in shape_strategy()) {
        let (diagram, strategy) = build(&shape);
        let dist = UtilityDistribution::new(&diagram, &strategy).unwrap();
        let max = dist.utilities()[dist.len() - 1];

        prop_assert!((value_at_risk(&dist, 1.0).unwrap() - max).abs() < 1e-9);
        let cvar = conditional_value_at_risk(&dist, 1.0).unwrap();
        prop_assert!((cvar - dist.expected_value()).abs() < 1e-6);
    }

    #[test]
    fn cvar_never_exceeds_the_mean(shape in shape_strategy(), alpha in 0.01f64..=1.0) {
        let (diagram, strategy) = build(&shape);
        let dist = UtilityDistribution::new(&diagram, &strategy).unwrap();
        let var = value_at_risk(&dist, alpha).unwrap();
        let cvar = conditional_value_at_risk(&dist, alpha).unwrap();

        prop_assert!(cvar <= var + 1e-6);
        prop_assert!(cvar <= dist.expected_value() + 1e-6);
        prop_assert!(cvar >= dist.utilities()[0] - 1e-6);
    }

    #[test]
    fn state_marginals_sum_to_one(shape in shape_strategy()) {
        let (diagram, strategy) = build(&shape);
        let probs = StateProbabilities::new(&diagram, &strategy).unwrap();
        for (_, row) in probs.iter() {
            let total: f64 = row.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }

        let given = probs.condition(&diagram, &strategy, 0, 1).unwrap();
        let a = given.get(0).unwrap();
        prop_assert!((a[1] - 1.0).abs() < 1e-12);
        for (_, row) in given.iter() {
            let total: f64 = row.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
