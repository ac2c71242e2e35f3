//! Presenting an arbitrary reduction axis set as rows.
//!
//! [`RowLayout`] views the input as `(num_rows, reduce_count)`: kept axes
//! first and reduced axes last, each in their original relative order. Rows
//! are enumerated row-major over the kept axes. Within a row, runs of
//! reduced axes that are contiguous in memory are fused into blocks so the
//! gather loop copies whole slices where it can.

use smallvec::{smallvec, SmallVec};

use faststat_view::{row_major_strides, ArrayView};

use crate::element::StatElement;
use crate::error::Result;
use crate::shape::ReductionPlan;
use crate::threading::for_each_row_chunk;

/// Stack-allocated Vec for dims/strides. 8 covers almost every array rank.
pub type SVec<T> = SmallVec<[T; 8]>;

/// Fuse adjacent dimensions that are contiguous in row-major iteration order.
///
/// Dimensions `i` and `i+1` merge when `strides[i] == strides[i+1] * dims[i+1]`.
/// Size-1 dimensions are dropped first; their strides are meaningless.
fn fuse_row_major(dims: &[usize], strides: &[isize]) -> (SVec<usize>, SVec<isize>) {
    let mut fused_dims: SVec<usize> = SmallVec::new();
    let mut fused_strides: SVec<isize> = SmallVec::new();
    for (&d, &s) in dims.iter().zip(strides.iter()) {
        if d == 1 {
            continue;
        }
        match (fused_dims.last_mut(), fused_strides.last_mut()) {
            (Some(prev_d), Some(prev_s)) if *prev_s == s * d as isize => {
                *prev_d *= d;
                *prev_s = s;
            }
            _ => {
                fused_dims.push(d);
                fused_strides.push(s);
            }
        }
    }
    (fused_dims, fused_strides)
}

/// Advance a row-major multi-index. Returns false after the last index.
#[inline]
fn advance(idx: &mut [usize], dims: &[usize]) -> bool {
    for d in (0..dims.len()).rev() {
        idx[d] += 1;
        if idx[d] < dims[d] {
            return true;
        }
        idx[d] = 0;
    }
    false
}

#[inline]
fn dot(idx: &[usize], strides: &[isize]) -> isize {
    idx.iter()
        .zip(strides.iter())
        .map(|(&i, &s)| i as isize * s)
        .sum()
}

/// Row geometry of a reduction over a borrowed strided view.
#[derive(Debug)]
pub struct RowLayout<'a, T> {
    data: &'a [T],
    offset: isize,
    keep_dims: SVec<usize>,
    keep_strides: SVec<isize>,
    /// Fused reduce blocks of the source; empty when every reduced axis has size 1.
    block_dims: SVec<usize>,
    block_strides: SVec<isize>,
    /// Unfused reduced dims and their strides in a row-major output of the
    /// input's shape; used to scatter elementwise results.
    reduce_dims: SVec<usize>,
    out_keep_strides: SVec<isize>,
    out_reduce_strides: SVec<isize>,
    reduce_count: usize,
    num_rows: usize,
}

impl<'a, T> RowLayout<'a, T> {
    pub fn new(view: &ArrayView<'a, T>, plan: &ReductionPlan) -> Result<Self> {
        let moved = view.move_axes_to_end(plan.axes().as_slice())?;
        let k = plan.keep_axes().len();
        let (keep_dims, reduce_dims) = moved.dims().split_at(k);
        let (keep_strides, reduce_strides) = moved.strides().split_at(k);
        let (block_dims, block_strides) = fuse_row_major(reduce_dims, reduce_strides);

        let out_strides = row_major_strides(plan.shape());
        let out_keep_strides = plan.keep_axes().iter().map(|&ax| out_strides[ax]).collect();
        let out_reduce_strides = plan
            .axes()
            .as_slice()
            .iter()
            .map(|&ax| out_strides[ax])
            .collect();

        Ok(Self {
            data: view.data(),
            offset: view.offset(),
            keep_dims: SmallVec::from_slice(keep_dims),
            keep_strides: SmallVec::from_slice(keep_strides),
            block_dims,
            block_strides,
            reduce_dims: SmallVec::from_slice(reduce_dims),
            out_keep_strides,
            out_reduce_strides,
            reduce_count: plan.reduce_count(),
            num_rows: plan.num_rows(),
        })
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Elements per row.
    #[inline]
    pub fn reduce_count(&self) -> usize {
        self.reduce_count
    }

    /// Number of fused contiguous blocks a row is read as.
    #[inline]
    pub fn block_rank(&self) -> usize {
        self.block_dims.len()
    }

    /// Multi-index into `keep_shape` of row `row`.
    pub fn keep_index(&self, row: usize) -> SVec<usize> {
        let mut idx: SVec<usize> = smallvec![0; self.keep_dims.len()];
        let mut rem = row;
        for (slot, &d) in idx.iter_mut().zip(self.keep_dims.iter()).rev() {
            *slot = rem % d;
            rem /= d;
        }
        idx
    }

    #[inline]
    fn row_base(&self, row: usize) -> isize {
        self.offset + dot(&self.keep_index(row), &self.keep_strides)
    }
}

impl<T: Copy> RowLayout<'_, T> {
    /// Copy row `row` into `dst[..reduce_count]`, in row-major order over
    /// the reduced axes.
    pub fn gather_row(&self, row: usize, dst: &mut [T]) {
        let base = self.row_base(row);
        let n = self.block_dims.len();
        if n == 0 {
            dst[0] = self.data[base as usize];
            return;
        }
        let inner = self.block_dims[n - 1];
        let inner_stride = self.block_strides[n - 1];
        let outer_dims = &self.block_dims[..n - 1];
        let outer_strides = &self.block_strides[..n - 1];
        let mut idx: SVec<usize> = smallvec![0; n - 1];
        let mut pos = 0usize;
        loop {
            let start = base + dot(&idx, outer_strides);
            let out = &mut dst[pos..pos + inner];
            if inner_stride == 1 {
                let s = start as usize;
                out.copy_from_slice(&self.data[s..s + inner]);
            } else {
                for (j, slot) in out.iter_mut().enumerate() {
                    *slot = self.data[(start + j as isize * inner_stride) as usize];
                }
            }
            pos += inner;
            if !advance(&mut idx, outer_dims) {
                break;
            }
        }
    }

    /// Write `values` (one row, in gather order) to their positions in
    /// `out`, a dense row-major buffer of the input's shape.
    pub fn scatter_row(&self, row: usize, values: &[T], out: &mut [T]) {
        let base = dot(&self.keep_index(row), &self.out_keep_strides);
        let mut idx: SVec<usize> = smallvec![0; self.reduce_dims.len()];
        for &v in &values[..self.reduce_count] {
            out[(base + dot(&idx, &self.out_reduce_strides)) as usize] = v;
            advance(&mut idx, &self.reduce_dims);
        }
    }
}

/// Dense `(num_rows, row_len)` copy of a [`RowLayout`].
#[derive(Debug, Clone)]
pub struct RowMatrix<T> {
    data: Vec<T>,
    num_rows: usize,
    row_len: usize,
}

impl<T: StatElement> RowMatrix<T> {
    /// Materialize every row of `layout`. Rows are gathered in parallel once
    /// the element count exceeds `parallel_threshold`.
    pub fn pack(layout: &RowLayout<'_, T>, parallel_threshold: usize) -> Self {
        let row_len = layout.reduce_count();
        let num_rows = layout.num_rows();
        let mut data = vec![T::zero(); num_rows * row_len];
        for_each_row_chunk(
            &mut data,
            row_len,
            row_len,
            parallel_threshold,
            &|first, chunk: &mut [T]| {
                for (r, dst) in chunk.chunks_exact_mut(row_len).enumerate() {
                    layout.gather_row(first + r, dst);
                }
            },
        );
        Self {
            data,
            num_rows,
            row_len,
        }
    }
}

impl<T> RowMatrix<T> {
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.row_len..(row + 1) * self.row_len]
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}
