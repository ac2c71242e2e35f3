//! Naive reference statistics.
//!
//! These are the correctness-authoritative definitions: straightforward
//! folds, full sorts and per-element index arithmetic with no repacking,
//! no SIMD and no threading. The engine falls back to
//! [`reference_reduce_axes`] when an accelerated strategy cannot serve a
//! request, and the test suites use [`reference_reduce`] as an oracle.

use std::cmp::Ordering;

use faststat_view::{ArrayView, NdArray};

use crate::element::StatElement;
use crate::error::{Result, ValidationError};
use crate::kernel_table::{Kernel, ReductionSpec};
use crate::shape::ReductionPlan;

// ============================================================================
// Shared interpolation rule
// ============================================================================

/// Position of fraction `frac` in a sorted group of `n` values:
/// `(lower index, upper index, weight of the upper value)`.
///
/// Follows numpy's `linear` method: virtual index `frac * (n - 1)`.
#[inline]
pub(crate) fn virtual_index(n: usize, frac: f64) -> (usize, usize, f64) {
    let last = n - 1;
    let pos = frac * last as f64;
    let lo = (pos.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    (lo, hi, pos - lo as f64)
}

/// Interpolate between `a` and `b`, evaluating from the nearer end so that
/// `t == 0` returns `a` and `t == 1` returns `b` exactly.
///
/// An endpoint is returned untouched when the weight puts all mass on it or
/// the two values are equal, so infinite endpoints never produce `inf - inf`.
#[inline]
pub(crate) fn lerp<T: StatElement>(a: T, b: T, t: f64) -> T {
    if t <= 0.0 || a == b {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    let diff = b - a;
    if t < 0.5 {
        a + diff * T::from_f64_lossy(t)
    } else {
        b - diff * T::from_f64_lossy(1.0 - t)
    }
}

#[inline]
pub(crate) fn cmp_non_nan<T: StatElement>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

// ============================================================================
// Per-group reference kernels
// ============================================================================

fn prepare<T: StatElement>(slice: &[T], nan_aware: bool) -> Option<Vec<T>> {
    if nan_aware {
        let kept: Vec<T> = slice.iter().copied().filter(|x| !x.is_nan()).collect();
        (!kept.is_empty()).then_some(kept)
    } else if slice.is_empty() || slice.iter().any(|x| x.is_nan()) {
        None
    } else {
        Some(slice.to_vec())
    }
}

fn mean_of<T: StatElement>(values: &[T]) -> T {
    let sum = values.iter().fold(T::zero(), |acc, &x| acc + x);
    sum / T::from_count(values.len())
}

fn var_of<T: StatElement>(values: &[T]) -> T {
    let mean = mean_of(values);
    let ss = values.iter().fold(T::zero(), |acc, &x| {
        let d = x - mean;
        acc + d * d
    });
    ss / T::from_count(values.len())
}

/// Reference value of a reducing kernel over one group.
///
/// `q` is given in the kernel's own units (`[0, 100]` for percentiles,
/// `[0, 1]` for quantiles) and must be present exactly when the kernel is
/// parameterized. Elementwise kernels are served by [`reference_zscore`].
pub fn reference_reduce<T: StatElement>(slice: &[T], kernel: Kernel, q: Option<f64>) -> Result<T> {
    if kernel.info().is_elementwise {
        return Err(ValidationError::ElementwiseKernel {
            kernel: kernel.name(),
        }
        .into());
    }
    let spec = ReductionSpec::new(kernel, q.map(Into::into), false)?;
    let frac = spec.fractions().first().copied();

    let Some(mut values) = prepare(slice, kernel.info().nan_aware) else {
        return Ok(T::nan());
    };
    let value = match kernel {
        Kernel::Sum | Kernel::NanSum => values.iter().fold(T::zero(), |acc, &x| acc + x),
        Kernel::Average | Kernel::Mean | Kernel::NanMean => mean_of(&values),
        Kernel::Var | Kernel::NanVar => var_of(&values),
        Kernel::Std | Kernel::NanStd => var_of(&values).sqrt(),
        Kernel::Ptp => {
            let max = values.iter().fold(T::neg_infinity(), |m, &x| m.max(x));
            let min = values.iter().fold(T::infinity(), |m, &x| m.min(x));
            max - min
        }
        Kernel::Percentile
        | Kernel::NanPercentile
        | Kernel::Quantile
        | Kernel::NanQuantile
        | Kernel::Median
        | Kernel::NanMedian => {
            values.sort_by(cmp_non_nan);
            let (lo, hi, t) = virtual_index(values.len(), frac.unwrap_or(0.5));
            lerp(values[lo], values[hi], t)
        }
        Kernel::ZScore | Kernel::NanZScore => unreachable!("elementwise kernels rejected above"),
    };
    Ok(value)
}

/// Reference z-scores of one group, using the population standard deviation.
///
/// Without `nan_aware`, any NaN turns the whole group into NaN. With it,
/// NaNs are left out of the mean/std and stay NaN in the output. A zero
/// standard deviation yields NaN for every output of the group.
pub fn reference_zscore<T: StatElement>(slice: &[T], nan_aware: bool) -> Vec<T> {
    let Some(values) = prepare(slice, nan_aware) else {
        return vec![T::nan(); slice.len()];
    };
    let mean = mean_of(&values);
    let std = var_of(&values).sqrt();
    if std == T::zero() {
        return vec![T::nan(); slice.len()];
    }
    slice.iter().map(|&x| (x - mean) / std).collect()
}

// ============================================================================
// Whole-array reference path
// ============================================================================

fn next_index(idx: &mut [usize], dims: &[usize]) {
    for d in (0..dims.len()).rev() {
        idx[d] += 1;
        if idx[d] < dims[d] {
            return;
        }
        idx[d] = 0;
    }
}

/// Reduce `src` over `plan` with the reference kernels, one group at a time.
///
/// Every element is fetched through full multi-index arithmetic on the
/// original view; this is the path of last resort and the shape of its
/// output (including the leading axis for a vector `q`) matches the
/// accelerated strategies exactly.
pub fn reference_reduce_axes<T: StatElement>(
    src: &ArrayView<'_, T>,
    plan: &ReductionPlan,
    spec: &ReductionSpec,
) -> Result<NdArray<T>> {
    let kernel = spec.kernel();
    let info = kernel.info();
    let rank = plan.shape().len();
    let keep_axes = plan.keep_axes();
    let reduce_axes = plan.axes().as_slice();
    let num_rows = plan.num_rows();
    let reduce_count = plan.reduce_count();

    let mut full = vec![0usize; rank];
    let mut keep_idx = vec![0usize; keep_axes.len()];
    let mut group = Vec::with_capacity(reduce_count);

    if info.is_elementwise {
        let mut out = NdArray::<T>::row_major(plan.shape());
        for _ in 0..num_rows {
            for (&ax, &i) in keep_axes.iter().zip(keep_idx.iter()) {
                full[ax] = i;
            }
            group.clear();
            let mut red_idx = vec![0usize; reduce_axes.len()];
            for _ in 0..reduce_count {
                for (&ax, &i) in reduce_axes.iter().zip(red_idx.iter()) {
                    full[ax] = i;
                }
                group.push(src.get(&full));
                next_index(&mut red_idx, plan.reduce_shape());
            }
            let scores = reference_zscore(&group, info.nan_aware);
            let mut red_idx = vec![0usize; reduce_axes.len()];
            for &z in &scores {
                for (&ax, &i) in reduce_axes.iter().zip(red_idx.iter()) {
                    full[ax] = i;
                }
                out.set(&full, z);
                next_index(&mut red_idx, plan.reduce_shape());
            }
            next_index(&mut keep_idx, plan.keep_shape());
        }
        return Ok(out);
    }

    let qs: Vec<Option<f64>> = match spec.quantiles() {
        Some(q) => q.values().iter().copied().map(Some).collect(),
        None => vec![None],
    };
    // Leading q axis: value for (qi, row) lives at qi * num_rows + row.
    let mut data = vec![T::nan(); qs.len() * num_rows];
    for row in 0..num_rows {
        for (&ax, &i) in keep_axes.iter().zip(keep_idx.iter()) {
            full[ax] = i;
        }
        group.clear();
        let mut red_idx = vec![0usize; reduce_axes.len()];
        for _ in 0..reduce_count {
            for (&ax, &i) in reduce_axes.iter().zip(red_idx.iter()) {
                full[ax] = i;
            }
            group.push(src.get(&full));
            next_index(&mut red_idx, plan.reduce_shape());
        }
        for (qi, &q) in qs.iter().enumerate() {
            data[qi * num_rows + row] = reference_reduce(&group, kernel, q)?;
        }
        next_index(&mut keep_idx, plan.keep_shape());
    }

    let shape = match spec.quantiles() {
        Some(q) if !q.is_scalar() => plan.result_shape_with_quantiles(spec.keepdims(), qs.len()),
        _ => plan.result_shape(spec.keepdims(), false),
    };
    Ok(NdArray::from_vec(data, &shape)?)
}
