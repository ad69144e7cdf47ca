//! Order statistics over finite utility samples.

use std::cmp::Ordering;

/// Total order for finite floats; NaN sorts last.
pub fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Minimum and maximum of a sample, `None` when empty.
pub fn min_max<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Sorted distinct values.
pub fn sorted_distinct(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(cmp_f64);
    sorted.dedup();
    sorted
}

/// Smallest strictly positive gap between two distinct values, `None` if
/// fewer than two distinct values exist.
pub fn min_positive_gap(values: &[f64]) -> Option<f64> {
    sorted_distinct(values)
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
}

/// Product of counts, `None` on overflow.
pub fn checked_product<I>(counts: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    counts
        .into_iter()
        .try_fold(1_usize, |acc, c| acc.checked_mul(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_of_sample() {
        assert_eq!(min_max([3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(min_max(std::iter::empty()), None);
    }

    #[test]
    fn gap_ignores_duplicates() {
        assert_eq!(min_positive_gap(&[5.0, 1.0, 5.0, 2.0, 10.0]), Some(1.0));
        assert_eq!(min_positive_gap(&[4.0, 4.0]), None);
        assert_eq!(min_positive_gap(&[]), None);
    }

    #[test]
    fn distinct_sorted() {
        assert_eq!(sorted_distinct(&[3.0, 1.0, 3.0, 2.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn product_overflow() {
        assert_eq!(checked_product([2, 3, 4]), Some(24));
        assert_eq!(checked_product(std::iter::empty()), Some(1));
        assert_eq!(checked_product([usize::MAX, 2]), None);
    }
}
