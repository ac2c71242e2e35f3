//! Axis-generalized statistical reductions over strided N-d arrays.
//!
//! Any set of axes of an [`ArrayView`](faststat_view::ArrayView) can be reduced
//! with one of a closed set of statistical kernels while the remaining axes keep
//! their original order.
//!
//! # Pipeline
//!
//! - [`AxisInput::normalize`]: Canonicalize the axis argument against the rank
//! - [`ReductionPlan::new`]: Keep/reduce geometry and result shapes
//! - [`RowLayout`] / [`RowMatrix`]: Present the reduction as independent rows
//! - [`Kernel`] / [`ReductionSpec`]: Kernel lookup and parameter contract
//! - [`ReductionEngine::reduce`]: Drive the stages, in parallel over row ranges
//!
//! # Kernels
//!
//! `sum`, `nansum`, `ptp`, `percentile`, `nanpercentile`, `quantile`,
//! `nanquantile`, `median`, `average`, `mean`, `std`, `var`, `nanmedian`,
//! `nanmean`, `nanstd`, `nanvar`, `zscore`, `nan_zscore`.
//!
//! Standard deviations are population (ddof = 0). Order statistics use linear
//! interpolation at `q * (n - 1)`. Non-nan kernels propagate NaN; nan kernels
//! skip it and return NaN only for groups with no remaining values.
//!
//! # Example
//!
//! ```rust
//! use faststat_kernel::{Kernel, ReductionEngine};
//! use faststat_view::NdArray;
//!
//! let a = NdArray::from_vec((0..24).map(|x| x as f64).collect(), &[2, 3, 4]).unwrap();
//! let engine = ReductionEngine::default();
//!
//! let mean = engine.reduce(&a.view(), Kernel::Mean, 1isize, false, None).unwrap();
//! assert_eq!(mean.array().dims(), &[2, 4]);
//! assert_eq!(mean.array().get(&[0, 0]), 4.0);
//!
//! let sum = engine.reduce(&a.view(), Kernel::Sum, [0isize, 2], true, None).unwrap();
//! assert_eq!(sum.array().dims(), &[1, 3, 1]);
//! ```
//!
//! # Features
//!
//! - `parallel` (default): split rows across the rayon pool
//! - `simd`: vectorized row sums via `pulp`

pub mod axis;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod kernel_table;
pub mod reference;
pub mod repack;
pub mod shape;
pub mod simd;
mod stats;
mod threading;

pub use axis::{AxisInput, AxisSet};
pub use config::{EngineConfig, Strategy};
pub use element::StatElement;
pub use engine::{ExecutionPath, Reduction, ReductionEngine};
pub use error::{Result, StatError, ValidationError};
pub use kernel_table::{Kernel, KernelInfo, ParamFamily, Quantiles, ReductionSpec};
pub use reference::{reference_reduce, reference_zscore};
pub use repack::{RowLayout, RowMatrix};
pub use shape::ReductionPlan;
pub use threading::MIN_PARALLEL_LEN;
