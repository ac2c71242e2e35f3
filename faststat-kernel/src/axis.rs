//! Axis argument canonicalization.
//!
//! Users name reduction axes the numpy way: one signed integer, a sequence
//! of signed integers, or "all axes". [`AxisInput::normalize`] resolves that
//! against an array rank into an [`AxisSet`]: sorted, de-duplicated,
//! non-negative and never empty.

use crate::error::ValidationError;

/// User-facing axis argument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AxisInput {
    /// Reduce over every axis.
    #[default]
    All,
    /// A single, possibly negative, axis.
    Single(isize),
    /// An ordered collection of possibly negative axes.
    Many(Vec<isize>),
}

impl From<isize> for AxisInput {
    fn from(axis: isize) -> Self {
        AxisInput::Single(axis)
    }
}

impl From<i32> for AxisInput {
    fn from(axis: i32) -> Self {
        AxisInput::Single(axis as isize)
    }
}

impl From<usize> for AxisInput {
    fn from(axis: usize) -> Self {
        AxisInput::Single(axis as isize)
    }
}

impl From<Vec<isize>> for AxisInput {
    fn from(axes: Vec<isize>) -> Self {
        AxisInput::Many(axes)
    }
}

impl From<&[isize]> for AxisInput {
    fn from(axes: &[isize]) -> Self {
        AxisInput::Many(axes.to_vec())
    }
}

impl<const N: usize> From<[isize; N]> for AxisInput {
    fn from(axes: [isize; N]) -> Self {
        AxisInput::Many(axes.to_vec())
    }
}

impl From<&[usize]> for AxisInput {
    fn from(axes: &[usize]) -> Self {
        AxisInput::Many(axes.iter().map(|&a| a as isize).collect())
    }
}

impl<const N: usize> From<[usize; N]> for AxisInput {
    fn from(axes: [usize; N]) -> Self {
        AxisInput::Many(axes.iter().map(|&a| a as isize).collect())
    }
}

impl<const N: usize> From<[i32; N]> for AxisInput {
    fn from(axes: [i32; N]) -> Self {
        AxisInput::Many(axes.iter().map(|&a| a as isize).collect())
    }
}

/// Canonical set of reduction axes for a given rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSet {
    axes: Vec<usize>,
    rank: usize,
}

impl AxisSet {
    /// Axes in ascending order.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.axes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Always false for a normalized set; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn contains(&self, axis: usize) -> bool {
        self.axes.binary_search(&axis).is_ok()
    }

    /// True when every axis of the array is reduced.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.axes.len() == self.rank
    }

    /// Axes not in the set, ascending.
    pub fn keep_axes(&self) -> Vec<usize> {
        (0..self.rank).filter(|&ax| !self.contains(ax)).collect()
    }
}

fn canonical_axis(axis: isize, rank: usize) -> Result<usize, ValidationError> {
    let r = rank as isize;
    let resolved = if axis < 0 { axis + r } else { axis };
    if resolved < 0 || resolved >= r {
        return Err(ValidationError::AxisOutOfRange { axis, rank });
    }
    Ok(resolved as usize)
}

impl AxisInput {
    /// Resolve against `rank`.
    ///
    /// Axes must lie in `[-rank, rank)`; duplicates after resolving negative
    /// indices are rejected, so `[1, -2]` on a rank-3 array is an error.
    pub fn normalize(&self, rank: usize) -> Result<AxisSet, ValidationError> {
        let mut axes = match self {
            AxisInput::All => (0..rank).collect::<Vec<_>>(),
            AxisInput::Single(axis) => vec![canonical_axis(*axis, rank)?],
            AxisInput::Many(list) => {
                let mut seen = vec![false; rank];
                let mut out = Vec::with_capacity(list.len());
                for &axis in list {
                    let ax = canonical_axis(axis, rank)?;
                    if seen[ax] {
                        return Err(ValidationError::DuplicateAxis { axis: ax });
                    }
                    seen[ax] = true;
                    out.push(ax);
                }
                out
            }
        };
        if axes.is_empty() {
            return Err(ValidationError::EmptyAxisSet);
        }
        axes.sort_unstable();
        Ok(AxisSet { axes, rank })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_axis() {
        let set = AxisInput::from(1isize).normalize(3).unwrap();
        assert_eq!(set.as_slice(), &[1]);
        assert_eq!(set.keep_axes(), vec![0, 2]);
        assert!(!set.is_full());
    }

    #[test]
    fn test_negative_axes() {
        let set = AxisInput::from([-1isize, 0]).normalize(4).unwrap();
        assert_eq!(set.as_slice(), &[0, 3]);
        let set = AxisInput::Single(-4).normalize(4).unwrap();
        assert_eq!(set.as_slice(), &[0]);
    }

    #[test]
    fn test_all_axes() {
        let set = AxisInput::All.normalize(3).unwrap();
        assert_eq!(set.as_slice(), &[0, 1, 2]);
        assert!(set.is_full());
        assert!(set.keep_axes().is_empty());
    }

    #[test]
    fn test_order_is_canonical() {
        let a = AxisInput::from([3usize, 1]).normalize(4).unwrap();
        let b = AxisInput::from([1usize, 3]).normalize(4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            AxisInput::Single(5).normalize(3).unwrap_err(),
            ValidationError::AxisOutOfRange { axis: 5, rank: 3 }
        );
        assert_eq!(
            AxisInput::Single(-4).normalize(3).unwrap_err(),
            ValidationError::AxisOutOfRange { axis: -4, rank: 3 }
        );
        assert_eq!(
            AxisInput::Single(3).normalize(3).unwrap_err(),
            ValidationError::AxisOutOfRange { axis: 3, rank: 3 }
        );
    }

    #[test]
    fn test_duplicates_after_normalization() {
        assert_eq!(
            AxisInput::from([1isize, -2]).normalize(3).unwrap_err(),
            ValidationError::DuplicateAxis { axis: 1 }
        );
        assert_eq!(
            AxisInput::from([0usize, 0]).normalize(2).unwrap_err(),
            ValidationError::DuplicateAxis { axis: 0 }
        );
    }

    #[test]
    fn test_empty_sets_rejected() {
        assert_eq!(
            AxisInput::Many(vec![]).normalize(3).unwrap_err(),
            ValidationError::EmptyAxisSet
        );
        assert_eq!(
            AxisInput::All.normalize(0).unwrap_err(),
            ValidationError::EmptyAxisSet
        );
    }

    #[test]
    fn test_default_is_all() {
        assert_eq!(AxisInput::default(), AxisInput::All);
    }
}
