use faststat_kernel::{
    AxisInput, Kernel, Quantiles, ReductionEngine, Result, StatElement, StatError,
};
use faststat_view::{ArrayView, NdArray};

use crate::typed_array::TypedArray;

/// Anything that names a kernel: a [`Kernel`] or its string name.
pub trait IntoKernel {
    fn into_kernel(self) -> Result<Kernel>;
}

impl IntoKernel for Kernel {
    fn into_kernel(self) -> Result<Kernel> {
        Ok(self)
    }
}

impl IntoKernel for &str {
    fn into_kernel(self) -> Result<Kernel> {
        self.parse()
    }
}

impl IntoKernel for &String {
    fn into_kernel(self) -> Result<Kernel> {
        self.parse()
    }
}

/// Apply a kernel to a type-erased array with the default engine.
///
/// The element type is checked first, then the kernel name, then `q`
/// and the axes. Integer input is promoted to `float64`.
///
/// # Example
///
/// ```rust
/// use faststat::{reduce, TypedArray};
/// use faststat_view::NdArray;
///
/// let a = NdArray::from_vec((0..24).map(|x| x as f64).collect(), &[2, 3, 4]).unwrap();
/// let out = reduce(&TypedArray::from(a), "mean", 1isize, false, None).unwrap();
/// assert_eq!(out.dims(), &[2, 4]);
/// ```
pub fn reduce(
    data: &TypedArray,
    kernel: impl IntoKernel,
    axis: impl Into<AxisInput>,
    keepdims: bool,
    q: Option<Quantiles>,
) -> Result<TypedArray> {
    reduce_with(&ReductionEngine::default(), data, kernel, axis, keepdims, q)
}

/// [`reduce`] with an explicitly configured engine.
pub fn reduce_with(
    engine: &ReductionEngine,
    data: &TypedArray,
    kernel: impl IntoKernel,
    axis: impl Into<AxisInput>,
    keepdims: bool,
    q: Option<Quantiles>,
) -> Result<TypedArray> {
    data.check_numeric()?;
    let kernel = kernel.into_kernel()?;
    let axis = axis.into();
    let out = match data {
        TypedArray::F32(a) => engine
            .reduce(&a.view(), kernel, axis, keepdims, q)?
            .into_array()
            .into(),
        TypedArray::F64(a) => engine
            .reduce(&a.view(), kernel, axis, keepdims, q)?
            .into_array()
            .into(),
        TypedArray::I64(a) => {
            log::debug!("promoting int64 input of shape {:?} to float64", a.dims());
            let promoted = a.map(|x| x as f64);
            engine
                .reduce(&promoted.view(), kernel, axis, keepdims, q)?
                .into_array()
                .into()
        }
        TypedArray::Bool(_) => {
            return Err(StatError::Type {
                dtype: data.dtype(),
            })
        }
    };
    Ok(out)
}

fn run<T: StatElement>(
    view: &ArrayView<'_, T>,
    kernel: Kernel,
    axis: AxisInput,
    keepdims: bool,
    q: Option<Quantiles>,
) -> Result<NdArray<T>> {
    Ok(ReductionEngine::default()
        .reduce(view, kernel, axis, keepdims, q)?
        .into_array())
}

macro_rules! plain_kernels {
    ($($(#[$doc:meta])* $name:ident => $kernel:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<T: StatElement>(
                view: &ArrayView<'_, T>,
                axis: impl Into<AxisInput>,
                keepdims: bool,
            ) -> Result<NdArray<T>> {
                run(view, Kernel::$kernel, axis.into(), keepdims, None)
            }
        )*
    };
}

macro_rules! parameterized_kernels {
    ($($(#[$doc:meta])* $name:ident => $kernel:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<T: StatElement>(
                view: &ArrayView<'_, T>,
                q: impl Into<Quantiles>,
                axis: impl Into<AxisInput>,
                keepdims: bool,
            ) -> Result<NdArray<T>> {
                run(view, Kernel::$kernel, axis.into(), keepdims, Some(q.into()))
            }
        )*
    };
}

plain_kernels! {
    /// Sum; NaN if the group contains a NaN.
    sum => Sum;
    /// Sum ignoring NaNs; NaN for an all-NaN group.
    nansum => NanSum;
    /// Range `max - min`.
    ptp => Ptp;
    median => Median;
    /// Alias of [`mean`].
    average => Average;
    mean => Mean;
    /// Population standard deviation.
    std => Std;
    /// Population variance.
    var => Var;
    nanmedian => NanMedian;
    nanmean => NanMean;
    nanstd => NanStd;
    nanvar => NanVar;
    /// `(x - mean) / std` over each group, same shape as the input;
    /// `keepdims` has no effect.
    zscore => ZScore;
    /// Like [`zscore`] with NaNs left out of the moments and kept as NaN.
    nan_zscore => NanZScore;
}

parameterized_kernels! {
    /// Percentile(s) with `q` in `[0, 100]`. A sequence `q` adds a leading axis.
    percentile => Percentile;
    nanpercentile => NanPercentile;
    /// Quantile(s) with `q` in `[0, 1]`. A sequence `q` adds a leading axis.
    quantile => Quantile;
    nanquantile => NanQuantile;
}
