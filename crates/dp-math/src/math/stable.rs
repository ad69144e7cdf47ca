//! Numerically careful summation and comparison.

/// Default relative tolerance for [`approx_eq`], `sqrt(f64::EPSILON)`.
pub const DEFAULT_RTOL: f64 = 1.490_116_119_384_765_6e-8;

/// Compensated (Neumaier) summation.
///
/// Path probabilities span many orders of magnitude; plain summation of
/// millions of them drifts far enough to trip equality checks against 1.
pub fn neumaier_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// `isapprox`-style comparison: `|a - b| <= max(atol, rtol * max(|a|, |b|))`.
///
/// NaN never compares equal; equal infinities do.
pub fn approx_eq_tol(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= atol.max(rtol * a.abs().max(b.abs()))
}

/// [`approx_eq_tol`] with the default relative tolerance and no absolute slack.
pub fn approx_eq(a: f64, b: f64) -> bool {
    approx_eq_tol(a, b, DEFAULT_RTOL, 0.0)
}

/// Round to the nearest integer, ties away from zero.
pub fn round_to_int(x: f64) -> i64 {
    x.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neumaier_recovers_small_terms() {
        let values = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(neumaier_sum(values), 2.0);
    }

    #[test]
    fn neumaier_sum_of_tenths() {
        let values = std::iter::repeat(0.1).take(10);
        assert_eq!(neumaier_sum(values), 1.0);
    }

    #[test]
    fn neumaier_empty_is_zero() {
        assert_eq!(neumaier_sum(std::iter::empty()), 0.0);
    }

    #[test]
    fn approx_eq_relative() {
        assert!(approx_eq(1.0, 1.0 + 1e-10));
        assert!(!approx_eq(1.0, 1.0 + 1e-6));
        assert!(approx_eq_tol(10.0, 10.5, 0.0, 0.9));
        assert!(!approx_eq(f64::NAN, f64::NAN));
        assert!(approx_eq(f64::INFINITY, f64::INFINITY));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to_int(0.49), 0);
        assert_eq!(round_to_int(0.5), 1);
        assert_eq!(round_to_int(0.9999), 1);
        assert_eq!(round_to_int(-0.2), 0);
    }
}
