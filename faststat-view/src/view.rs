//! Dynamic-rank strided array types.
//!
//! - [`ArrayView`]: Immutable dynamic-rank strided view over a borrowed slice
//! - [`NdArray`]: Owned strided multidimensional array
//!
//! Element positions are always computed as `offset + Σ index[i] * strides[i]`
//! into the backing buffer, so permuted or otherwise non-contiguous layouts
//! are handled uniformly.

use std::sync::Arc;

use crate::{Result, ViewError};

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate that all accessed offsets stay within `[0, len)`.
fn validate_bounds(len: usize, dims: &[usize], strides: &[isize], offset: isize) -> Result<()> {
    if dims.len() != strides.len() {
        return Err(ViewError::StrideLengthMismatch);
    }
    // Empty array - no access needed
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(ViewError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 || max_offset as usize >= len {
        return Err(ViewError::OffsetOverflow);
    }
    Ok(())
}

fn validate_len(len: usize, dims: &[usize]) -> Result<()> {
    let expected: usize = dims.iter().product();
    if expected != len {
        return Err(ViewError::LengthMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1] as isize;
    }
    strides
}

/// Compute row-major strides (C default: last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1] as isize;
    }
    strides
}

/// Whether `strides` describe a dense row-major layout for `dims`.
///
/// Size-1 dimensions are ignored since their stride is never used.
fn is_row_major_dense(dims: &[usize], strides: &[isize]) -> bool {
    let mut expected = 1isize;
    for (&d, &s) in dims.iter().rev().zip(strides.iter().rev()) {
        if d <= 1 {
            continue;
        }
        if s != expected {
            return false;
        }
        expected = expected.saturating_mul(d as isize);
    }
    true
}

#[inline]
fn element_offset(offset: isize, dims: &[usize], strides: &[isize], indices: &[usize]) -> isize {
    assert_eq!(indices.len(), dims.len(), "wrong number of indices");
    let mut idx = offset;
    for (i, &index) in indices.iter().enumerate() {
        assert!(
            index < dims[i],
            "index {} out of bounds for dim {}",
            index,
            dims[i]
        );
        idx += index as isize * strides[i];
    }
    idx
}

/// Advance a row-major multi-index. Returns `false` once it wraps around.
#[inline]
fn next_index_row_major(idx: &mut [usize], dims: &[usize]) -> bool {
    for d in (0..dims.len()).rev() {
        idx[d] += 1;
        if idx[d] < dims[d] {
            return true;
        }
        idx[d] = 0;
    }
    false
}

fn checked_permutation(perm: &[usize], rank: usize) -> Result<()> {
    if perm.len() != rank {
        return Err(ViewError::RankMismatch(perm.len(), rank));
    }
    let mut seen = vec![false; rank];
    for &p in perm {
        if p >= rank || seen[p] {
            return Err(ViewError::InvalidPermutation { axis: p, rank });
        }
        seen[p] = true;
    }
    Ok(())
}

// ============================================================================
// ArrayView
// ============================================================================

/// Dynamic-rank immutable strided view.
///
/// Permutations and axis moves are zero-copy: they only rewrite
/// dims/strides.
pub struct ArrayView<'a, T> {
    data: &'a [T],
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl<T> Clone for ArrayView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T> std::fmt::Debug for ArrayView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayView")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> ArrayView<'a, T> {
    /// Create a new strided view from a borrowed slice.
    pub fn new(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    /// View a dense row-major buffer. The buffer length must equal the
    /// product of `dims`.
    pub fn row_major(data: &'a [T], dims: &[usize]) -> Result<Self> {
        validate_len(data.len(), dims)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(row_major_strides(dims)),
            offset: 0,
        })
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// True when the view addresses a dense row-major block of the buffer.
    pub fn is_row_major_contiguous(&self) -> bool {
        is_row_major_dense(&self.dims, &self.strides)
    }

    /// Permute dimensions.
    pub fn permute(&self, perm: &[usize]) -> Result<ArrayView<'a, T>> {
        checked_permutation(perm, self.dims.len())?;
        let new_dims: Vec<usize> = perm.iter().map(|&p| self.dims[p]).collect();
        let new_strides: Vec<isize> = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(ArrayView {
            data: self.data,
            dims: Arc::from(new_dims),
            strides: Arc::from(new_strides),
            offset: self.offset,
        })
    }

    /// Move `axes` behind all other axes.
    ///
    /// Kept axes stay in ascending order in front; moved axes follow in the
    /// order given. Equivalent to numpy's `moveaxis(a, axes, range(-k, 0))`
    /// for sorted `axes`.
    pub fn move_axes_to_end(&self, axes: &[usize]) -> Result<ArrayView<'a, T>> {
        let rank = self.dims.len();
        let mut moved = vec![false; rank];
        for &ax in axes {
            if ax >= rank || moved[ax] {
                return Err(ViewError::InvalidPermutation { axis: ax, rank });
            }
            moved[ax] = true;
        }
        let perm: Vec<usize> = (0..rank)
            .filter(|&ax| !moved[ax])
            .chain(axes.iter().copied())
            .collect();
        self.permute(&perm)
    }
}

impl<'a, T: Copy> ArrayView<'a, T> {
    /// Get an element by multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> T {
        let idx = element_offset(self.offset, &self.dims, &self.strides, indices);
        self.data[idx as usize]
    }

    /// Element at a position relative to the view's base offset.
    ///
    /// `rel` is typically a sum of `index * stride` terms computed by the caller.
    #[inline]
    pub fn at_relative(&self, rel: isize) -> T {
        self.data[(self.offset + rel) as usize]
    }

    /// Copy the logical contents into a dense row-major `Vec`.
    pub fn to_row_major_vec(&self) -> Vec<T> {
        let total = self.len();
        if self.is_row_major_contiguous() {
            let start = self.offset as usize;
            return self.data[start..start + total].to_vec();
        }
        let mut out = Vec::with_capacity(total);
        if total == 0 {
            return out;
        }
        let mut idx = vec![0usize; self.dims.len()];
        loop {
            let mut rel = 0isize;
            for (&i, &s) in idx.iter().zip(self.strides.iter()) {
                rel += i as isize * s;
            }
            out.push(self.at_relative(rel));
            if !next_index_row_major(&mut idx, &self.dims) {
                break;
            }
        }
        out
    }
}

// ============================================================================
// NdArray
// ============================================================================

/// Owned strided multidimensional array.
///
/// Supports row-major (C/numpy default) and column-major layouts as well as
/// arbitrary strides via [`NdArray::from_parts`].
pub struct NdArray<T> {
    data: Vec<T>,
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl<T> std::fmt::Debug for NdArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdArray")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<T: Clone> Clone for NdArray<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T: Clone + Default> NdArray<T> {
    /// Create a row-major array filled with `Default` values.
    pub fn row_major(dims: &[usize]) -> Self {
        let total: usize = dims.iter().product();
        Self {
            data: vec![T::default(); total],
            dims: Arc::from(dims),
            strides: Arc::from(row_major_strides(dims)),
            offset: 0,
        }
    }

    /// Create a column-major array filled with `Default` values.
    pub fn col_major(dims: &[usize]) -> Self {
        let total: usize = dims.iter().product();
        Self {
            data: vec![T::default(); total],
            dims: Arc::from(dims),
            strides: Arc::from(col_major_strides(dims)),
            offset: 0,
        }
    }
}

impl<T> NdArray<T> {
    /// Wrap a dense row-major buffer.
    pub fn from_vec(data: Vec<T>, dims: &[usize]) -> Result<Self> {
        validate_len(data.len(), dims)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(row_major_strides(dims)),
            offset: 0,
        })
    }

    /// Create from raw parts.
    pub fn from_parts(
        data: Vec<T>,
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    /// Create a row-major array with values produced by a function.
    ///
    /// The function is called with indices in row-major iteration order.
    pub fn from_fn_row_major(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let total: usize = dims.iter().product();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; dims.len()];
        for _ in 0..total {
            data.push(f(&idx));
            next_index_row_major(&mut idx, dims);
        }
        Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(row_major_strides(dims)),
            offset: 0,
        }
    }

    /// Create a column-major array with values produced by a function.
    ///
    /// The function is called with indices in column-major iteration order.
    pub fn from_fn_col_major(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let total: usize = dims.iter().product();
        let rank = dims.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in 0..rank {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(col_major_strides(dims)),
            offset: 0,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// Backing buffer in memory order.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Create an immutable view over this array.
    pub fn view(&self) -> ArrayView<'_, T> {
        ArrayView {
            data: &self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T: Copy> NdArray<T> {
    /// Get an element by multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> T {
        let idx = element_offset(self.offset, &self.dims, &self.strides, indices);
        self.data[idx as usize]
    }

    /// Set an element by multi-dimensional index.
    pub fn set(&mut self, indices: &[usize], value: T) {
        let idx = element_offset(self.offset, &self.dims, &self.strides, indices);
        self.data[idx as usize] = value;
    }

    /// Logical contents in row-major order.
    pub fn to_row_major_vec(&self) -> Vec<T> {
        self.view().to_row_major_vec()
    }

    /// Apply `f` to every element, producing a row-major array of the same shape.
    pub fn map<U>(&self, f: impl Fn(T) -> U) -> NdArray<U> {
        let data: Vec<U> = self.to_row_major_vec().into_iter().map(f).collect();
        NdArray {
            data,
            dims: self.dims.clone(),
            strides: Arc::from(row_major_strides(&self.dims)),
            offset: 0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
