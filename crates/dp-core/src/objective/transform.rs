//! Affine utility shifts.

use crate::diagram::InfluenceDiagram;
use crate::paths::paths;
use dp_common::{DecisionNode, FixedStates, NodeIndex, State, StateSpace};
use dp_config::UtilityShift;

/// A diagram whose path utilities are shifted by a constant.
///
/// The offset is computed over the whole path space, zero-probability paths
/// included. `Positive` maps the smallest utility to 1 and `Negative` maps
/// the largest to -1. Probabilities and structure are those of the inner
/// diagram.
#[derive(Debug, Clone)]
pub struct ShiftedUtility<D> {
    inner: D,
    offset: f64,
}

impl<D: InfluenceDiagram> ShiftedUtility<D> {
    pub fn new(inner: D, shift: UtilityShift) -> Self {
        let offset = match shift {
            UtilityShift::None => 0.0,
            UtilityShift::Positive | UtilityShift::Negative => {
                let bounds = dp_math::min_max(
                    paths(inner.states(), &FixedStates::new()).map(|p| inner.path_utility(&p)),
                );
                match (shift, bounds) {
                    (UtilityShift::Positive, Some((min, _))) => min - 1.0,
                    (UtilityShift::Negative, Some((_, max))) => max + 1.0,
                    _ => 0.0,
                }
            }
        };
        Self { inner, offset }
    }

    /// Amount subtracted from every utility.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: InfluenceDiagram> InfluenceDiagram for ShiftedUtility<D> {
    fn states(&self) -> &StateSpace {
        self.inner.states()
    }

    fn chance_nodes(&self) -> &[NodeIndex] {
        self.inner.chance_nodes()
    }

    fn decision_nodes(&self) -> &[DecisionNode] {
        self.inner.decision_nodes()
    }

    fn value_nodes(&self) -> &[NodeIndex] {
        self.inner.value_nodes()
    }

    fn path_probability(&self, path: &[State]) -> f64 {
        self.inner.path_probability(path)
    }

    fn path_utility(&self, path: &[State]) -> f64 {
        self.inner.path_utility(path) - self.offset
    }

    fn probability_table(&self, node: NodeIndex) -> &[f64] {
        self.inner.probability_table(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::TabularDiagram;

    fn diagram() -> TabularDiagram {
        TabularDiagram::from_json(
            r#"{"nodes": [
                {"name": "C", "role": "chance", "states": ["a", "b", "c"], "probabilities": [0.5, 0.5, 0.0]},
                {"name": "V", "role": "value", "parents": ["C"], "utilities": [-3, 5, -10]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn positive_shift_maps_minimum_to_one() {
        let d = diagram();
        let shifted = ShiftedUtility::new(&d, UtilityShift::Positive);
        // The zero-probability path still sets the minimum.
        assert_eq!(shifted.offset(), -11.0);
        assert_eq!(shifted.path_utility(&[2]), 1.0);
        assert_eq!(shifted.path_utility(&[1]), 16.0);
        assert_eq!(shifted.path_probability(&[1]), 0.5);
    }

    #[test]
    fn negative_shift_maps_maximum_to_minus_one() {
        let d = diagram();
        let shifted = ShiftedUtility::new(&d, UtilityShift::Negative);
        assert_eq!(shifted.path_utility(&[1]), -1.0);
        assert_eq!(shifted.path_utility(&[0]), -9.0);
    }

    #[test]
    fn no_shift_is_identity() {
        let d = diagram();
        let shifted = ShiftedUtility::new(&d, UtilityShift::None);
        assert_eq!(shifted.offset(), 0.0);
        assert_eq!(shifted.path_utility(&[0]), -3.0);
        assert_eq!(shifted.chance_nodes(), d.chance_nodes());
    }
}
