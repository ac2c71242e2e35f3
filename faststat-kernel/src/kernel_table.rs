//! The closed set of statistical kernels and their call contracts.
//!
//! Every kernel name maps to a [`Kernel`] variant; dispatch is an exhaustive
//! `match`, so adding a variant without wiring it up does not compile.

use std::fmt;
use std::str::FromStr;

use crate::error::{StatError, ValidationError};

/// Statistical kernels supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Sum,
    NanSum,
    Ptp,
    Percentile,
    NanPercentile,
    Quantile,
    NanQuantile,
    Median,
    Average,
    Mean,
    Std,
    Var,
    NanMedian,
    NanMean,
    NanStd,
    NanVar,
    ZScore,
    NanZScore,
}

/// Static properties of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelInfo {
    /// Requires a `q` argument (percentile/quantile family).
    pub needs_parameter: bool,
    /// Produces one output per input element instead of one per group.
    pub is_elementwise: bool,
    /// Excludes NaNs from the statistic instead of propagating them.
    pub nan_aware: bool,
}

/// Unit convention of a parameterized kernel's `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFamily {
    /// `q` in `[0, 100]`.
    Percentile,
    /// `q` in `[0, 1]`.
    Quantile,
}

impl ParamFamily {
    /// Inclusive bounds for `q`.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            ParamFamily::Percentile => (0.0, 100.0),
            ParamFamily::Quantile => (0.0, 1.0),
        }
    }

    /// Convert `q` to a fraction in `[0, 1]`.
    #[inline]
    pub fn to_fraction(self, q: f64) -> f64 {
        match self {
            ParamFamily::Percentile => q / 100.0,
            ParamFamily::Quantile => q,
        }
    }
}

/// Row-level operation a reducing kernel runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowOp {
    Sum,
    Mean,
    Var,
    Std,
    Ptp,
    /// Linear-interpolated order statistic at the requested fractions.
    Quantile,
}

/// How the engine executes a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Reduce { op: RowOp, skip_nan: bool },
    Elementwise { skip_nan: bool },
}

impl Kernel {
    /// Every kernel, in table order.
    pub const ALL: [Kernel; 18] = [
        Kernel::Sum,
        Kernel::NanSum,
        Kernel::Ptp,
        Kernel::Percentile,
        Kernel::NanPercentile,
        Kernel::Quantile,
        Kernel::NanQuantile,
        Kernel::Median,
        Kernel::Average,
        Kernel::Mean,
        Kernel::Std,
        Kernel::Var,
        Kernel::NanMedian,
        Kernel::NanMean,
        Kernel::NanStd,
        Kernel::NanVar,
        Kernel::ZScore,
        Kernel::NanZScore,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Kernel::Sum => "sum",
            Kernel::NanSum => "nansum",
            Kernel::Ptp => "ptp",
            Kernel::Percentile => "percentile",
            Kernel::NanPercentile => "nanpercentile",
            Kernel::Quantile => "quantile",
            Kernel::NanQuantile => "nanquantile",
            Kernel::Median => "median",
            Kernel::Average => "average",
            Kernel::Mean => "mean",
            Kernel::Std => "std",
            Kernel::Var => "var",
            Kernel::NanMedian => "nanmedian",
            Kernel::NanMean => "nanmean",
            Kernel::NanStd => "nanstd",
            Kernel::NanVar => "nanvar",
            Kernel::ZScore => "zscore",
            Kernel::NanZScore => "nan_zscore",
        }
    }

    pub const fn info(self) -> KernelInfo {
        let needs_parameter = matches!(
            self,
            Kernel::Percentile | Kernel::NanPercentile | Kernel::Quantile | Kernel::NanQuantile
        );
        let is_elementwise = matches!(self, Kernel::ZScore | Kernel::NanZScore);
        let nan_aware = matches!(
            self,
            Kernel::NanSum
                | Kernel::NanPercentile
                | Kernel::NanQuantile
                | Kernel::NanMedian
                | Kernel::NanMean
                | Kernel::NanStd
                | Kernel::NanVar
                | Kernel::NanZScore
        );
        KernelInfo {
            needs_parameter,
            is_elementwise,
            nan_aware,
        }
    }

    /// `q` convention for parameterized kernels, `None` otherwise.
    pub const fn param_family(self) -> Option<ParamFamily> {
        match self {
            Kernel::Percentile | Kernel::NanPercentile => Some(ParamFamily::Percentile),
            Kernel::Quantile | Kernel::NanQuantile => Some(ParamFamily::Quantile),
            _ => None,
        }
    }

    pub(crate) const fn dispatch(self) -> Dispatch {
        let skip_nan = self.info().nan_aware;
        let op = match self {
            Kernel::Sum | Kernel::NanSum => RowOp::Sum,
            Kernel::Average | Kernel::Mean | Kernel::NanMean => RowOp::Mean,
            Kernel::Var | Kernel::NanVar => RowOp::Var,
            Kernel::Std | Kernel::NanStd => RowOp::Std,
            Kernel::Ptp => RowOp::Ptp,
            Kernel::Percentile
            | Kernel::NanPercentile
            | Kernel::Quantile
            | Kernel::NanQuantile
            | Kernel::Median
            | Kernel::NanMedian => RowOp::Quantile,
            Kernel::ZScore | Kernel::NanZScore => return Dispatch::Elementwise { skip_nan },
        };
        Dispatch::Reduce { op, skip_nan }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kernel::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| StatError::UnsupportedKernel(s.to_string()))
    }
}

/// The `q` argument: one value or an ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Quantiles {
    Scalar(f64),
    Many(Vec<f64>),
}

impl Quantiles {
    pub fn values(&self) -> &[f64] {
        match self {
            Quantiles::Scalar(q) => std::slice::from_ref(q),
            Quantiles::Many(qs) => qs,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Quantiles::Scalar(_))
    }
}

impl From<f64> for Quantiles {
    fn from(q: f64) -> Self {
        Quantiles::Scalar(q)
    }
}

impl From<Vec<f64>> for Quantiles {
    fn from(qs: Vec<f64>) -> Self {
        Quantiles::Many(qs)
    }
}

impl From<&[f64]> for Quantiles {
    fn from(qs: &[f64]) -> Self {
        Quantiles::Many(qs.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Quantiles {
    fn from(qs: [f64; N]) -> Self {
        Quantiles::Many(qs.to_vec())
    }
}

/// A validated kernel invocation: kernel, optional `q` and `keepdims`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionSpec {
    kernel: Kernel,
    q: Option<Quantiles>,
    keepdims: bool,
}

impl ReductionSpec {
    /// Check that `q` is present exactly when the kernel needs it and that
    /// every value lies inside the kernel's range.
    pub fn new(
        kernel: Kernel,
        q: Option<Quantiles>,
        keepdims: bool,
    ) -> Result<Self, ValidationError> {
        match (kernel.param_family(), &q) {
            (Some(_), None) => {
                return Err(ValidationError::MissingParameter {
                    kernel: kernel.name(),
                })
            }
            (None, Some(_)) => {
                return Err(ValidationError::UnexpectedParameter {
                    kernel: kernel.name(),
                })
            }
            (Some(family), Some(qs)) => {
                if qs.values().is_empty() {
                    return Err(ValidationError::EmptyParameter {
                        kernel: kernel.name(),
                    });
                }
                let (lo, hi) = family.bounds();
                // NaN fails both comparisons and is rejected here too.
                if let Some(&bad) = qs.values().iter().find(|&&v| !(v >= lo && v <= hi)) {
                    return Err(ValidationError::ParameterOutOfRange {
                        kernel: kernel.name(),
                        value: bad,
                        lo,
                        hi,
                    });
                }
            }
            (None, None) => {}
        }
        Ok(Self {
            kernel,
            q,
            keepdims,
        })
    }

    #[inline]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[inline]
    pub fn quantiles(&self) -> Option<&Quantiles> {
        self.q.as_ref()
    }

    #[inline]
    pub fn keepdims(&self) -> bool {
        self.keepdims
    }

    /// Number of values each row produces for reducing kernels.
    pub fn outputs_per_row(&self) -> usize {
        self.q.as_ref().map_or(1, |q| q.values().len())
    }

    /// Order-statistic fractions in `[0, 1]` for the row kernel.
    ///
    /// Median kernels use `[0.5]`; non-order-statistic kernels get an empty list.
    pub fn fractions(&self) -> Vec<f64> {
        match (self.kernel.param_family(), &self.q) {
            (Some(family), Some(q)) => q.values().iter().map(|&v| family.to_fraction(v)).collect(),
            _ => match self.kernel {
                Kernel::Median | Kernel::NanMedian => vec![0.5],
                _ => Vec::new(),
            },
        }
    }
}
