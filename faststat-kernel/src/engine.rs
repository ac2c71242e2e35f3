//! The axis-generalized reduction engine.
//!
//! A call moves through fixed stages:
//!
//! ```text
//! Validating -> Planning -> Dispatching -> Reducing -> Reshaping -> Done
//! ```
//!
//! Any stage may fail; failures are returned before any reduction work is
//! done. Rows are reduced independently and, above the configured
//! threshold, in parallel over disjoint row ranges of the output.

use faststat_view::{ArrayView, NdArray};

use crate::axis::AxisInput;
use crate::config::{EngineConfig, Strategy};
use crate::element::StatElement;
use crate::error::Result;
use crate::kernel_table::{Dispatch, Kernel, Quantiles, ReductionSpec};
use crate::reference::reference_reduce_axes;
use crate::repack::{RowLayout, RowMatrix};
use crate::shape::ReductionPlan;
use crate::stats::{reduce_row, zscore_row};
use crate::threading::for_each_row_chunk;

/// How a reduction was actually executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Repacked,
    Strided,
    /// Naive per-group fallback; chosen when the configured strategy cannot
    /// serve the request.
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    Planning,
    Dispatching,
    Reducing,
    Reshaping,
    Done,
}

impl Stage {
    #[inline]
    fn enter(self) {
        log::trace!("reduction stage: {:?}", self);
    }
}

/// Output of [`ReductionEngine::reduce`].
#[derive(Debug, Clone)]
pub struct Reduction<T> {
    array: NdArray<T>,
    path: ExecutionPath,
}

impl<T> Reduction<T> {
    #[inline]
    pub fn array(&self) -> &NdArray<T> {
        &self.array
    }

    #[inline]
    pub fn into_array(self) -> NdArray<T> {
        self.array
    }

    #[inline]
    pub fn path(&self) -> ExecutionPath {
        self.path
    }

    /// True when the configured strategy was unavailable and the reference
    /// path produced the result.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.path == ExecutionPath::Reference
    }
}

/// Stateless reduction driver; holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct ReductionEngine {
    config: EngineConfig,
}

impl ReductionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply `kernel` over `axis` of `view`.
    ///
    /// Reducing kernels produce `plan.result_shape(keepdims)`, with a
    /// leading axis of length `q.len()` when `q` is a sequence. Elementwise
    /// kernels produce the input shape and ignore `keepdims`.
    pub fn reduce<T: StatElement>(
        &self,
        view: &ArrayView<'_, T>,
        kernel: Kernel,
        axis: impl Into<AxisInput>,
        keepdims: bool,
        q: Option<Quantiles>,
    ) -> Result<Reduction<T>> {
        Stage::Validating.enter();
        let spec = ReductionSpec::new(kernel, q, keepdims)?;
        let axes = axis.into().normalize(view.ndim())?;

        Stage::Planning.enter();
        let plan = ReductionPlan::new(view.dims(), axes)?;

        Stage::Dispatching.enter();
        let path = self.select_path(&plan);
        log::debug!(
            "{} over axes {:?} of {:?} ({}): {} rows x {} elements via {:?}",
            kernel,
            plan.axes().as_slice(),
            plan.shape(),
            T::DTYPE,
            plan.num_rows(),
            plan.reduce_count(),
            path
        );

        Stage::Reducing.enter();
        let array = match path {
            ExecutionPath::Reference => {
                let array = reference_reduce_axes(view, &plan, &spec)?;
                Stage::Reshaping.enter();
                array
            }
            ExecutionPath::Repacked | ExecutionPath::Strided => {
                let layout = RowLayout::new(view, &plan)?;
                let rows = self.run_rows(&layout, &spec, path);
                Stage::Reshaping.enter();
                reshape_rows(rows, &layout, &plan, &spec)?
            }
        };

        Stage::Done.enter();
        Ok(Reduction { array, path })
    }

    fn select_path(&self, plan: &ReductionPlan) -> ExecutionPath {
        match self.config.strategy {
            Strategy::Repacked => ExecutionPath::Repacked,
            Strategy::Strided => {
                let rank = plan.shape().len();
                if rank <= self.config.max_strided_rank && !plan.keep_axes().is_empty() {
                    ExecutionPath::Strided
                } else {
                    log::warn!(
                        "strided strategy unavailable for rank {} reducing axes {:?} \
                         (max rank {}, needs a kept axis); using reference path",
                        rank,
                        plan.axes().as_slice(),
                        self.config.max_strided_rank
                    );
                    ExecutionPath::Reference
                }
            }
        }
    }

    /// Run the row kernel over every row. The result is row-major with
    /// `outputs_per_row` values per row for reducing kernels and
    /// `reduce_count` values per row for elementwise ones.
    fn run_rows<T: StatElement>(
        &self,
        layout: &RowLayout<'_, T>,
        spec: &ReductionSpec,
        path: ExecutionPath,
    ) -> Vec<T> {
        let dispatch = spec.kernel().dispatch();
        let fractions = spec.fractions();
        let reduce_count = layout.reduce_count();
        let width = match dispatch {
            Dispatch::Reduce { .. } => spec.outputs_per_row(),
            Dispatch::Elementwise { .. } => reduce_count,
        };
        let threshold = self.config.parallel_threshold;
        let matrix = (path == ExecutionPath::Repacked).then(|| RowMatrix::pack(layout, threshold));

        let mut out = vec![T::zero(); layout.num_rows() * width];
        for_each_row_chunk(
            &mut out,
            width,
            reduce_count,
            threshold,
            &|first, chunk: &mut [T]| {
                let mut row_buf = Vec::new();
                let mut scratch = Vec::with_capacity(reduce_count);
                for (r, dst) in chunk.chunks_exact_mut(width).enumerate() {
                    let row = first + r;
                    let src: &[T] = match &matrix {
                        Some(m) => m.row(row),
                        None => {
                            row_buf.resize(reduce_count, T::zero());
                            layout.gather_row(row, &mut row_buf);
                            &row_buf
                        }
                    };
                    match dispatch {
                        Dispatch::Reduce { op, skip_nan } => {
                            reduce_row(op, skip_nan, src, &fractions, &mut scratch, dst)
                        }
                        Dispatch::Elementwise { skip_nan } => {
                            zscore_row(skip_nan, src, &mut scratch, dst)
                        }
                    }
                }
            },
        );
        out
    }
}

/// Turn row-ordered kernel output into the result array.
fn reshape_rows<T: StatElement>(
    rows: Vec<T>,
    layout: &RowLayout<'_, T>,
    plan: &ReductionPlan,
    spec: &ReductionSpec,
) -> Result<NdArray<T>> {
    let keepdims = spec.keepdims();
    if spec.kernel().info().is_elementwise {
        let mut out = vec![T::zero(); plan.shape().iter().product()];
        let width = layout.reduce_count();
        for (row, values) in rows.chunks_exact(width).enumerate() {
            layout.scatter_row(row, values, &mut out);
        }
        return Ok(NdArray::from_vec(out, plan.shape())?);
    }
    match spec.quantiles() {
        Some(q) if !q.is_scalar() => {
            // (row, q) -> (q, row)
            let m = q.values().len();
            let num_rows = plan.num_rows();
            let mut out = vec![T::zero(); rows.len()];
            for (row, values) in rows.chunks_exact(m).enumerate() {
                for (qi, &v) in values.iter().enumerate() {
                    out[qi * num_rows + row] = v;
                }
            }
            let shape = plan.result_shape_with_quantiles(keepdims, m);
            Ok(NdArray::from_vec(out, &shape)?)
        }
        _ => Ok(NdArray::from_vec(rows, &plan.result_shape(keepdims, false))?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatError;
    use crate::error::ValidationError;
    use approx::assert_relative_eq;

    fn iota(dims: &[usize]) -> NdArray<f64> {
        let n: usize = dims.iter().product();
        NdArray::from_vec((0..n).map(|x| x as f64).collect(), dims).unwrap()
    }

    fn engines() -> Vec<ReductionEngine> {
        vec![
            ReductionEngine::default(),
            ReductionEngine::new(EngineConfig::default().with_strategy(Strategy::Strided)),
            ReductionEngine::new(EngineConfig::default().with_parallel_threshold(0)),
        ]
    }

    #[test]
    fn test_mean_over_middle_axis() {
        let a = iota(&[2, 3, 4]);
        for engine in engines() {
            let r = engine
                .reduce(&a.view(), Kernel::Mean, 1isize, false, None)
                .unwrap();
            assert!(!r.is_degraded());
            let out = r.array();
            assert_eq!(out.dims(), &[2, 4]);
            for i in 0..2 {
                for k in 0..4 {
                    let want = (0..3).map(|j| a.get(&[i, j, k])).sum::<f64>() / 3.0;
                    assert_relative_eq!(out.get(&[i, k]), want);
                }
            }
        }
    }

    #[test]
    fn test_sum_outer_axes_keepdims() {
        let a = iota(&[2, 3, 4]);
        for engine in engines() {
            let out = engine
                .reduce(&a.view(), Kernel::Sum, [0isize, 2], true, None)
                .unwrap()
                .into_array();
            assert_eq!(out.dims(), &[1, 3, 1]);
            // sum over i,k of 12i + 4j + k = 2*4*4j + 4*12 + 2*6
            for j in 0..3 {
                assert_eq!(out.get(&[0, j, 0]), 32.0 * j as f64 + 60.0);
            }
        }
    }

    #[test]
    fn test_axis_order_is_irrelevant() {
        let a = iota(&[3, 2, 4, 2]);
        let engine = ReductionEngine::default();
        let x = engine
            .reduce(&a.view(), Kernel::Var, [1isize, 3], false, None)
            .unwrap();
        let y = engine
            .reduce(&a.view(), Kernel::Var, [3isize, 1], false, None)
            .unwrap();
        assert_eq!(x.array().to_row_major_vec(), y.array().to_row_major_vec());
    }

    #[test]
    fn test_vector_q_adds_leading_axis() {
        let a = iota(&[2, 5]);
        for engine in engines() {
            let out = engine
                .reduce(
                    &a.view(),
                    Kernel::Percentile,
                    -1isize,
                    false,
                    Some([0.0, 50.0, 100.0].into()),
                )
                .unwrap()
                .into_array();
            assert_eq!(out.dims(), &[3, 2]);
            assert_eq!(out.get(&[0, 1]), 5.0);
            assert_eq!(out.get(&[1, 0]), 2.0);
            assert_eq!(out.get(&[2, 1]), 9.0);
        }
    }

    #[test]
    fn test_scalar_q_adds_no_axis() {
        let a = iota(&[2, 5]);
        let out = ReductionEngine::default()
            .reduce(&a.view(), Kernel::Quantile, 1isize, true, Some(0.25.into()))
            .unwrap()
            .into_array();
        assert_eq!(out.dims(), &[2, 1]);
        assert_eq!(out.get(&[1, 0]), 6.0);
    }

    #[test]
    fn test_zscore_keeps_input_shape() {
        let a = NdArray::from_vec(vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0], &[3, 2]).unwrap();
        for engine in engines() {
            let out = engine
                .reduce(&a.view(), Kernel::ZScore, 0isize, true, None)
                .unwrap()
                .into_array();
            assert_eq!(out.dims(), &[3, 2]);
            let s = (2.0f64 / 3.0).sqrt();
            assert_relative_eq!(out.get(&[0, 0]), -1.0 / s, epsilon = 1e-12);
            assert_relative_eq!(out.get(&[1, 1]), 0.0, epsilon = 1e-12);
            assert_relative_eq!(out.get(&[2, 1]), 1.0 / s, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_strided_degrades_when_everything_is_reduced() {
        let a = iota(&[3, 4]);
        let strided =
            ReductionEngine::new(EngineConfig::default().with_strategy(Strategy::Strided));
        let r = strided
            .reduce(&a.view(), Kernel::NanStd, AxisInput::All, false, None)
            .unwrap();
        assert_eq!(r.path(), ExecutionPath::Reference);
        assert!(r.is_degraded());
        let fast = ReductionEngine::default()
            .reduce(&a.view(), Kernel::NanStd, AxisInput::All, false, None)
            .unwrap();
        assert_eq!(fast.path(), ExecutionPath::Repacked);
        assert_eq!(r.array().dims(), fast.array().dims());
        assert_relative_eq!(
            r.array().get(&[]),
            fast.array().get(&[]),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_strided_degrades_above_max_rank() {
        let a = iota(&[2, 1, 2, 1, 2, 2]);
        let strided =
            ReductionEngine::new(EngineConfig::default().with_strategy(Strategy::Strided));
        let r = strided
            .reduce(&a.view(), Kernel::Sum, 0isize, false, None)
            .unwrap();
        assert!(r.is_degraded());
        assert_eq!(r.array().dims(), &[1, 2, 1, 2, 2]);
        assert_eq!(r.array().get(&[0, 1, 0, 1, 1]), 7.0 + 15.0);
    }

    #[test]
    fn test_validation_errors() {
        let a = iota(&[2, 3, 4]);
        let engine = ReductionEngine::default();
        let err = engine
            .reduce(&a.view(), Kernel::Percentile, 0isize, false, None)
            .unwrap_err();
        assert!(err.is_validation());
        let err = engine
            .reduce(&a.view(), Kernel::Mean, 0isize, false, Some(1.0.into()))
            .unwrap_err();
        assert!(err.is_validation());
        let err = engine
            .reduce(&a.view(), Kernel::Sum, 5isize, false, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StatError::Validation(ValidationError::AxisOutOfRange { axis: 5, rank: 3 })
        ));
    }

    #[test]
    fn test_zero_length_keep_axis() {
        let a = NdArray::<f64>::row_major(&[0, 3]);
        let out = ReductionEngine::default()
            .reduce(&a.view(), Kernel::Mean, 1isize, false, None)
            .unwrap()
            .into_array();
        assert_eq!(out.dims(), &[0]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_f32_input() {
        let a = NdArray::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let out = ReductionEngine::default()
            .reduce(&a.view(), Kernel::Median, 0isize, false, None)
            .unwrap()
            .into_array();
        assert_eq!(out.to_row_major_vec(), vec![2.0f32, 3.0]);
    }
}
