//! Optional SIMD row primitives.
//!
//! [`MaybeSimdOps`] lets the row kernels ask for a vectorized sum or sum of
//! squared deviations. Without the `simd` feature every method returns
//! `None` and the scalar loops in [`crate::stats`] are used.

/// Trait for element types that may have SIMD-accelerated row primitives.
///
/// Default implementations return `None` (no SIMD available).
/// f32/f64 override these with `pulp` kernels when the `simd` feature is enabled.
pub trait MaybeSimdOps: Copy + Sized {
    /// `Σ src[i]`.
    fn try_simd_sum(_src: &[Self]) -> Option<Self> {
        None
    }

    /// `Σ (src[i] - mean)²`.
    fn try_simd_sum_sq_dev(_src: &[Self], _mean: Self) -> Option<Self> {
        None
    }
}

#[cfg(not(feature = "simd"))]
impl MaybeSimdOps for f32 {}

#[cfg(not(feature = "simd"))]
impl MaybeSimdOps for f64 {}

#[cfg(feature = "simd")]
mod simd_impls {
    use super::MaybeSimdOps;
    use pulp::{Simd, WithSimd};

    macro_rules! impl_simd_ops {
        ($t:ty, $as_simd:ident, $splat:ident, $add:ident, $sub:ident, $mul_add:ident, $reduce:ident) => {
            impl MaybeSimdOps for $t {
                fn try_simd_sum(src: &[$t]) -> Option<$t> {
                    struct Sum<'a>(&'a [$t]);
                    impl<'a> WithSimd for Sum<'a> {
                        type Output = $t;

                        #[inline(always)]
                        fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
                            let (head, tail) = S::$as_simd(self.0);

                            let mut acc0 = simd.$splat(0.0);
                            let mut acc1 = simd.$splat(0.0);
                            let mut acc2 = simd.$splat(0.0);
                            let mut acc3 = simd.$splat(0.0);

                            let mut i = 0usize;
                            while i + 4 <= head.len() {
                                acc0 = simd.$add(acc0, head[i]);
                                acc1 = simd.$add(acc1, head[i + 1]);
                                acc2 = simd.$add(acc2, head[i + 2]);
                                acc3 = simd.$add(acc3, head[i + 3]);
                                i += 4;
                            }
                            for &v in &head[i..] {
                                acc0 = simd.$add(acc0, v);
                            }

                            let acc = simd.$add(simd.$add(acc0, acc1), simd.$add(acc2, acc3));
                            let mut sum = simd.$reduce(acc);
                            for &x in tail {
                                sum += x;
                            }
                            sum
                        }
                    }

                    Some(pulp::Arch::new().dispatch(Sum(src)))
                }

                fn try_simd_sum_sq_dev(src: &[$t], mean: $t) -> Option<$t> {
                    struct SqDev<'a> {
                        src: &'a [$t],
                        mean: $t,
                    }
                    impl<'a> WithSimd for SqDev<'a> {
                        type Output = $t;

                        #[inline(always)]
                        fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
                            let (head, tail) = S::$as_simd(self.src);
                            let m = simd.$splat(self.mean);

                            let mut acc0 = simd.$splat(0.0);
                            let mut acc1 = simd.$splat(0.0);

                            let mut i = 0usize;
                            while i + 2 <= head.len() {
                                let d0 = simd.$sub(head[i], m);
                                let d1 = simd.$sub(head[i + 1], m);
                                acc0 = simd.$mul_add(d0, d0, acc0);
                                acc1 = simd.$mul_add(d1, d1, acc1);
                                i += 2;
                            }
                            for &v in &head[i..] {
                                let d = simd.$sub(v, m);
                                acc0 = simd.$mul_add(d, d, acc0);
                            }

                            let mut sum = simd.$reduce(simd.$add(acc0, acc1));
                            for &x in tail {
                                let d = x - self.mean;
                                sum += d * d;
                            }
                            sum
                        }
                    }

                    Some(pulp::Arch::new().dispatch(SqDev { src, mean }))
                }
            }
        };
    }

    impl_simd_ops!(
        f32,
        as_simd_f32s,
        splat_f32s,
        add_f32s,
        sub_f32s,
        mul_add_f32s,
        reduce_sum_f32s
    );
    impl_simd_ops!(
        f64,
        as_simd_f64s,
        splat_f64s,
        add_f64s,
        sub_f64s,
        mul_add_f64s,
        reduce_sum_f64s
    );
}
