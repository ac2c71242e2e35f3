//! Accelerated row kernels.
//!
//! Every function here works on one contiguous row of the repacked matrix.
//! They share the interpolation rule with [`crate::reference`] but replace
//! the full sort with selection where a single order statistic is needed,
//! and use the SIMD primitives from [`crate::simd`] when available.

use crate::element::StatElement;
use crate::kernel_table::RowOp;
use crate::reference::{cmp_non_nan, lerp, virtual_index};

#[inline]
fn sum<T: StatElement>(values: &[T]) -> T {
    T::try_simd_sum(values).unwrap_or_else(|| values.iter().fold(T::zero(), |acc, &x| acc + x))
}

#[inline]
fn sum_sq_dev<T: StatElement>(values: &[T], mean: T) -> T {
    T::try_simd_sum_sq_dev(values, mean).unwrap_or_else(|| {
        values.iter().fold(T::zero(), |acc, &x| {
            let d = x - mean;
            acc + d * d
        })
    })
}

#[inline]
fn mean_var<T: StatElement>(values: &[T]) -> (T, T) {
    let n = T::from_count(values.len());
    let mean = sum(values) / n;
    (mean, sum_sq_dev(values, mean) / n)
}

/// Copy the non-NaN entries of `row` into `scratch`.
#[inline]
fn collect_finite<T: StatElement>(row: &[T], scratch: &mut Vec<T>) {
    scratch.clear();
    scratch.extend(row.iter().copied().filter(|x| !x.is_nan()));
}

/// Write the order statistics at `fractions` of `values` into `out`.
///
/// `values` is reordered in place.
fn order_statistics<T: StatElement>(values: &mut [T], fractions: &[f64], out: &mut [T]) {
    let n = values.len();
    if let [frac] = fractions {
        let (lo, hi, t) = virtual_index(n, *frac);
        let (_, &mut lo_val, upper) = values.select_nth_unstable_by(lo, cmp_non_nan);
        let hi_val = if hi == lo {
            lo_val
        } else {
            // hi == lo + 1: the smallest element of the upper partition.
            upper
                .iter()
                .copied()
                .fold(T::infinity(), |m, x| if x < m { x } else { m })
        };
        out[0] = lerp(lo_val, hi_val, t);
        return;
    }
    values.sort_unstable_by(cmp_non_nan);
    for (slot, &frac) in out.iter_mut().zip(fractions) {
        let (lo, hi, t) = virtual_index(n, frac);
        *slot = lerp(values[lo], values[hi], t);
    }
}

/// Reduce one row.
///
/// `out` holds one slot per fraction for [`RowOp::Quantile`] and a single
/// slot otherwise. Rows with no usable values (empty after NaN removal, or
/// containing a NaN when `skip_nan` is false) produce NaN.
pub(crate) fn reduce_row<T: StatElement>(
    op: RowOp,
    skip_nan: bool,
    row: &[T],
    fractions: &[f64],
    scratch: &mut Vec<T>,
    out: &mut [T],
) {
    let usable = if skip_nan {
        collect_finite(row, scratch);
        !scratch.is_empty()
    } else {
        !row.is_empty() && !row.iter().any(|x| x.is_nan())
    };
    if !usable {
        out.fill(T::nan());
        return;
    }

    let values: &[T] = if skip_nan { &scratch[..] } else { row };
    let value = match op {
        RowOp::Sum => sum(values),
        RowOp::Mean => sum(values) / T::from_count(values.len()),
        RowOp::Var => mean_var(values).1,
        RowOp::Std => mean_var(values).1.sqrt(),
        RowOp::Ptp => {
            let (min, max) = values
                .iter()
                .fold((T::infinity(), T::neg_infinity()), |(lo, hi), &x| {
                    (lo.min(x), hi.max(x))
                });
            max - min
        }
        RowOp::Quantile => {
            if !skip_nan {
                scratch.clear();
                scratch.extend_from_slice(row);
            }
            order_statistics(scratch, fractions, out);
            return;
        }
    };
    out[0] = value;
}

/// Z-score one row into `out` (same length as `row`).
///
/// With `skip_nan`, NaNs are excluded from the moments and stay NaN in the
/// output; without it a single NaN poisons the row. A zero standard
/// deviation makes the whole row NaN.
pub(crate) fn zscore_row<T: StatElement>(
    skip_nan: bool,
    row: &[T],
    scratch: &mut Vec<T>,
    out: &mut [T],
) {
    let (mean, var) = if skip_nan {
        collect_finite(row, scratch);
        if scratch.is_empty() {
            out.fill(T::nan());
            return;
        }
        mean_var(scratch)
    } else {
        if row.iter().any(|x| x.is_nan()) {
            out.fill(T::nan());
            return;
        }
        mean_var(row)
    };
    let std = var.sqrt();
    if std == T::zero() {
        out.fill(T::nan());
        return;
    }
    for (o, &x) in out.iter_mut().zip(row) {
        *o = (x - mean) / std;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_table::{Dispatch, Kernel, ReductionSpec};
    use crate::reference::{reference_reduce, reference_zscore};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn run(kernel: Kernel, q: Option<f64>, row: &[f64]) -> f64 {
        let spec = ReductionSpec::new(kernel, q.map(Into::into), false).unwrap();
        let Dispatch::Reduce { op, skip_nan } = kernel.dispatch() else {
            panic!("{kernel} is elementwise");
        };
        let mut scratch = Vec::new();
        let mut out = [0.0];
        reduce_row(op, skip_nan, row, &spec.fractions(), &mut scratch, &mut out);
        out[0]
    }

    #[test]
    fn test_matches_reference_on_random_rows() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [1usize, 2, 3, 8, 33, 100] {
            let mut row: Vec<f64> = (0..len).map(|_| rng.gen::<f64>() * 10.0 - 5.0).collect();
            if len > 2 {
                row[1] = f64::NAN;
            }
            for k in Kernel::ALL {
                if k.info().is_elementwise {
                    continue;
                }
                let q = match k.param_family() {
                    Some(f) => Some(f.bounds().1 * 0.37),
                    None => None,
                };
                let got = run(k, q, &row);
                let want = reference_reduce(&row, k, q).unwrap();
                if want.is_nan() {
                    assert!(got.is_nan(), "{k} len={len}");
                } else {
                    assert_relative_eq!(got, want, epsilon = 1e-12, max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_single_fraction_uses_selection_correctly() {
        let row = [9.0, 1.0, 8.0, 2.0, 7.0, 3.0];
        // sorted: 1 2 3 7 8 9; q=0.5 -> pos 2.5 -> 5.0
        assert_eq!(run(Kernel::Quantile, Some(0.5), &row), 5.0);
        assert_eq!(run(Kernel::Quantile, Some(0.0), &row), 1.0);
        assert_eq!(run(Kernel::Quantile, Some(1.0), &row), 9.0);
        assert_eq!(run(Kernel::Median, None, &row), 5.0);
    }

    #[test]
    fn test_selection_with_infinite_values() {
        let inf = f64::INFINITY;
        let row = [inf, 2.0, -inf, 5.0];
        assert_eq!(run(Kernel::Percentile, Some(0.0), &row), -inf);
        assert_eq!(run(Kernel::Percentile, Some(100.0), &row), inf);
        assert_eq!(run(Kernel::Quantile, Some(0.0), &[1.0, inf]), 1.0);
    }

    #[test]
    fn test_multiple_fractions() {
        let row = [4.0f64, 3.0, 2.0, 1.0, 0.0];
        let mut scratch = Vec::new();
        let mut out = [0.0; 3];
        reduce_row(
            RowOp::Quantile,
            false,
            &row,
            &[0.0, 0.5, 0.875],
            &mut scratch,
            &mut out,
        );
        assert_eq!(out, [0.0, 2.0, 3.5]);
    }

    #[test]
    fn test_nan_rows() {
        let mut scratch = Vec::new();
        let mut out = [0.0; 2];
        reduce_row(
            RowOp::Quantile,
            true,
            &[f64::NAN, f64::NAN],
            &[0.1, 0.9],
            &mut scratch,
            &mut out,
        );
        assert!(out.iter().all(|v| v.is_nan()));

        assert!(run(Kernel::Sum, None, &[1.0, f64::NAN]).is_nan());
        assert!(run(Kernel::NanSum, None, &[f64::NAN]).is_nan());
        assert_eq!(run(Kernel::NanSum, None, &[f64::NAN, 2.0]), 2.0);
    }

    #[test]
    fn test_zscore_row_matches_reference() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut row: Vec<f64> = (0..17).map(|_| rng.gen::<f64>()).collect();
        row[4] = f64::NAN;
        let mut scratch = Vec::new();
        for skip_nan in [false, true] {
            let mut out = vec![0.0; row.len()];
            zscore_row(skip_nan, &row, &mut scratch, &mut out);
            let want = reference_zscore(&row, skip_nan);
            for (g, w) in out.iter().zip(&want) {
                if w.is_nan() {
                    assert!(g.is_nan());
                } else {
                    assert_relative_eq!(*g, *w, max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_zscore_constant_row() {
        let mut scratch = Vec::new();
        let mut out = [0.0f32; 3];
        zscore_row(false, &[5.0f32, 5.0, 5.0], &mut scratch, &mut out);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
