//! Shape algebra for axis reductions.

use crate::axis::AxisSet;
use crate::error::ValidationError;

/// Geometry of a reduction: which axes survive, how many rows there are and
/// how many elements each row reduces.
///
/// Rows are enumerated in row-major order over `keep_shape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionPlan {
    shape: Vec<usize>,
    axes: AxisSet,
    keep_axes: Vec<usize>,
    keep_shape: Vec<usize>,
    reduce_shape: Vec<usize>,
    reduce_count: usize,
    num_rows: usize,
}

impl ReductionPlan {
    pub fn new(shape: &[usize], axes: AxisSet) -> Result<Self, ValidationError> {
        let rank = shape.len();
        if let Some(&bad) = axes.as_slice().iter().find(|&&ax| ax >= rank) {
            return Err(ValidationError::AxisOutOfRange {
                axis: bad as isize,
                rank,
            });
        }
        let keep_axes = axes.keep_axes();
        let keep_shape: Vec<usize> = keep_axes.iter().map(|&ax| shape[ax]).collect();
        let reduce_shape: Vec<usize> = axes.as_slice().iter().map(|&ax| shape[ax]).collect();
        let reduce_count: usize = reduce_shape.iter().product();
        if reduce_count == 0 {
            return Err(ValidationError::EmptyReduction {
                axes: axes.as_slice().to_vec(),
            });
        }
        let num_rows = keep_shape.iter().product();
        Ok(Self {
            shape: shape.to_vec(),
            axes,
            keep_axes,
            keep_shape,
            reduce_shape,
            reduce_count,
            num_rows,
        })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    #[inline]
    pub fn keep_axes(&self) -> &[usize] {
        &self.keep_axes
    }

    /// Sizes of the kept axes, in their original order.
    #[inline]
    pub fn keep_shape(&self) -> &[usize] {
        &self.keep_shape
    }

    /// Sizes of the reduced axes, in their original order.
    #[inline]
    pub fn reduce_shape(&self) -> &[usize] {
        &self.reduce_shape
    }

    #[inline]
    pub fn reduce_count(&self) -> usize {
        self.reduce_count
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Output shape of a kernel run over this plan.
    ///
    /// Elementwise kernels always produce the input shape. Otherwise
    /// `keepdims` reinserts a 1 at every reduced axis position.
    pub fn result_shape(&self, keepdims: bool, elementwise: bool) -> Vec<usize> {
        if elementwise {
            return self.shape.clone();
        }
        if keepdims {
            self.shape
                .iter()
                .enumerate()
                .map(|(ax, &d)| if self.axes.contains(ax) { 1 } else { d })
                .collect()
        } else {
            self.keep_shape.clone()
        }
    }

    /// Output shape when a sequence of `n` quantiles is requested: a leading
    /// axis of length `n` in front of [`Self::result_shape`].
    pub fn result_shape_with_quantiles(&self, keepdims: bool, n: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.shape.len() + 1);
        out.push(n);
        out.extend(self.result_shape(keepdims, false));
        out
    }
}
