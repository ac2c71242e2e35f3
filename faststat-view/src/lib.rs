//! Owned and borrowed strided N-dimensional arrays for `faststat`.
//!
//! This crate holds the data model the reduction engine operates on:
//!
//! - [`NdArray`]: Owned strided array (row-major by default, any strides accepted)
//! - [`ArrayView`]: Zero-copy strided view over a borrowed buffer
//!
//! # Metadata Transformations
//!
//! These operate only on dims/strides/offset and never touch the data:
//! - `permute`: Reorder dimensions
//! - `move_axes_to_end`: Move a set of axes behind the remaining ones,
//!   preserving the relative order of both groups
//!
//! # Example
//!
//! ```rust
//! use faststat_view::NdArray;
//!
//! let a = NdArray::from_vec((0..6).map(|x| x as f64).collect(), &[2, 3]).unwrap();
//! assert_eq!(a.get(&[1, 2]), 5.0);
//!
//! let t = a.view().permute(&[1, 0]).unwrap();
//! assert_eq!(t.dims(), &[3, 2]);
//! assert_eq!(t.get(&[2, 1]), 5.0);
//! ```

pub mod view;

pub use view::{col_major_strides, row_major_strides, ArrayView, NdArray};

// ============================================================================
// Error types
// ============================================================================

/// Errors raised while constructing or transforming arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Buffer length does not match the product of the dimensions.
    #[error("buffer holds {actual} elements but shape requires {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Axis permutation is not a permutation of `0..rank`.
    #[error("invalid permutation entry {axis} for rank {rank}")]
    InvalidPermutation { axis: usize, rank: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Integer overflow or out-of-bounds while computing an element offset.
    #[error("offset out of bounds while computing element position")]
    OffsetOverflow,
}

/// Result type for array construction and view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
