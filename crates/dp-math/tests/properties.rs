//! Property-based tests for dp-math numerical functions.

use dp_math::{approx_eq_tol, checked_product, min_max, min_positive_gap, neumaier_sum};
use proptest::prelude::*;

// ============================================================================
// neumaier_sum properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Summation is insensitive to order up to rounding.
    #[test]
    fn neumaier_sum_order_invariant(mut values in prop::collection::vec(-1e6..1e6f64, 0..64)) {
        let forward = neumaier_sum(values.iter().copied());
        values.reverse();
        let backward = neumaier_sum(values.iter().copied());
        prop_assert!(approx_eq_tol(forward, backward, 1e-12, 1e-9),
            "forward={} backward={}", forward, backward);
    }

    /// A normalized probability vector sums to one.
    #[test]
    fn neumaier_normalized_weights(weights in prop::collection::vec(1e-9..1.0f64, 1..200)) {
        let total: f64 = weights.iter().sum();
        let probs = weights.iter().map(|w| w / total);
        let sum = neumaier_sum(probs);
        prop_assert!((sum - 1.0).abs() < 1e-12, "sum={}", sum);
    }
}

// ============================================================================
// order statistics
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Half the minimal gap never exceeds the range.
    #[test]
    fn gap_bounded_by_range(values in prop::collection::vec(-1e3..1e3f64, 2..32)) {
        if let (Some(gap), Some((lo, hi))) = (min_positive_gap(&values), min_max(values.iter().copied())) {
            prop_assert!(gap > 0.0);
            prop_assert!(gap <= hi - lo);
        }
    }

    /// checked_product agrees with the plain product when it fits.
    #[test]
    fn product_matches(counts in prop::collection::vec(1usize..8, 0..8)) {
        let expected: usize = counts.iter().product();
        prop_assert_eq!(checked_product(counts.iter().copied()), Some(expected));
    }
}
