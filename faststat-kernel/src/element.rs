//! Element type bounds for statistical kernels.
//!
//! When the `parallel` feature is enabled, [`MaybeSendSync`] ≡ [`Send`] + [`Sync`]
//! so row groups can be handed to rayon workers. Without it the bound is
//! blanket-implemented and imposes nothing.

use num_traits::{Float, NumCast};

use crate::simd::MaybeSimdOps;

#[cfg(feature = "parallel")]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(feature = "parallel")]
impl<T: Send + Sync> MaybeSendSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSendSync {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSendSync for T {}

/// Floating-point element types accepted by the reduction engine.
///
/// NaN support is required: nan-aware kernels skip NaNs and every kernel
/// reports undefined statistics as NaN.
pub trait StatElement:
    Float + MaybeSimdOps + MaybeSendSync + Default + std::fmt::Debug + 'static
{
    /// Short dtype name used in log records and error messages.
    const DTYPE: &'static str;

    /// Convert an `f64` parameter (e.g. a quantile) into this type.
    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        <Self as NumCast>::from(x).unwrap_or_else(Self::nan)
    }

    /// Convert an element count into this type.
    #[inline]
    fn from_count(n: usize) -> Self {
        <Self as NumCast>::from(n).unwrap_or_else(Self::nan)
    }
}

impl StatElement for f32 {
    const DTYPE: &'static str = "float32";
}

impl StatElement for f64 {
    const DTYPE: &'static str = "float64";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_stat_element<T: StatElement>() {}

    #[test]
    fn test_float_types_are_stat_elements() {
        assert_stat_element::<f32>();
        assert_stat_element::<f64>();
    }

    #[test]
    fn test_conversions() {
        assert_eq!(f32::from_count(7), 7.0f32);
        assert_eq!(f64::from_f64_lossy(0.25), 0.25);
        assert_eq!(f32::from_f64_lossy(0.5), 0.5f32);
        assert_eq!(<f64 as StatElement>::DTYPE, "float64");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_f64_is_send_sync_under_parallel() {
        fn _check<T: Send + Sync>() {}
        fn _via_bound<T: MaybeSendSync>() {
            _check::<T>()
        }
        _via_bound::<f64>();
    }
}
