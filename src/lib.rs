//! Accelerated numpy-style statistics over arbitrary axes of N-d arrays.
//!
//! # Primary API
//!
//! - [`reduce`] / [`reduce_with`]: Apply any kernel, by name or [`Kernel`],
//!   to a type-erased [`TypedArray`]
//! - One generic function per kernel over an [`ArrayView`](faststat_view::ArrayView):
//!   [`sum`], [`nansum`], [`ptp`], [`percentile`], [`nanpercentile`],
//!   [`quantile`], [`nanquantile`], [`median`], [`average`], [`mean`],
//!   [`std`], [`var`], [`nanmedian`], [`nanmean`], [`nanstd`], [`nanvar`],
//!   [`zscore`], [`nan_zscore`]
//!
//! The axis argument accepts a single signed axis, a collection of signed
//! axes, or [`AxisInput::All`]. Reduced axes are dropped from the result
//! (or kept with length 1 under `keepdims`); the remaining axes keep their
//! order.
//!
//! # Example
//!
//! ```rust
//! use faststat::{percentile, std};
//! use faststat_view::NdArray;
//!
//! let a = NdArray::from_vec((0..12).map(|x| x as f64).collect(), &[3, 4]).unwrap();
//!
//! let s = std(&a.view(), 0isize, false).unwrap();
//! assert_eq!(s.dims(), &[4]);
//!
//! let p = percentile(&a.view(), [0.0, 100.0], -1isize, false).unwrap();
//! assert_eq!(p.dims(), &[2, 3]);
//! assert_eq!(p.get(&[1, 2]), 11.0);
//! ```

mod functions;
mod typed_array;

pub use functions::{
    average, mean, median, nan_zscore, nanmean, nanmedian, nanpercentile, nanquantile, nanstd,
    nansum, nanvar, percentile, ptp, quantile, reduce, reduce_with, std, sum, var, zscore,
    IntoKernel,
};
pub use typed_array::TypedArray;

pub use faststat_kernel::{
    AxisInput, EngineConfig, ExecutionPath, Kernel, Quantiles, Reduction, ReductionEngine,
    Result, StatElement, StatError, Strategy, ValidationError,
};
pub use faststat_view::{ArrayView, NdArray, ViewError};
