use faststat_kernel::{Result, StatError};
use faststat_view::NdArray;

/// A type-erased array that dispatches over its element type at runtime.
///
/// `F32` and `F64` are reduced natively. `I64` is promoted to `f64` before
/// reducing. `Bool` carries no numeric statistic and is rejected.
#[derive(Debug, Clone)]
pub enum TypedArray {
    F32(NdArray<f32>),
    F64(NdArray<f64>),
    I64(NdArray<i64>),
    Bool(NdArray<bool>),
}

impl TypedArray {
    /// numpy-style dtype name.
    pub fn dtype(&self) -> &'static str {
        match self {
            TypedArray::F32(_) => "float32",
            TypedArray::F64(_) => "float64",
            TypedArray::I64(_) => "int64",
            TypedArray::Bool(_) => "bool",
        }
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            TypedArray::F32(a) => a.dims(),
            TypedArray::F64(a) => a.dims(),
            TypedArray::I64(a) => a.dims(),
            TypedArray::Bool(a) => a.dims(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.dims().len()
    }

    /// Returns `true` if the elements can be reduced, natively or by promotion.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, TypedArray::Bool(_))
    }

    pub fn as_f32(&self) -> Option<&NdArray<f32>> {
        match self {
            TypedArray::F32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&NdArray<f64>> {
        match self {
            TypedArray::F64(a) => Some(a),
            _ => None,
        }
    }

    /// Fail with [`StatError::Type`] unless the array is numeric.
    pub(crate) fn check_numeric(&self) -> Result<()> {
        if self.is_numeric() {
            Ok(())
        } else {
            Err(StatError::Type {
                dtype: self.dtype(),
            })
        }
    }
}

impl From<NdArray<f32>> for TypedArray {
    fn from(a: NdArray<f32>) -> Self {
        TypedArray::F32(a)
    }
}

impl From<NdArray<f64>> for TypedArray {
    fn from(a: NdArray<f64>) -> Self {
        TypedArray::F64(a)
    }
}

impl From<NdArray<i64>> for TypedArray {
    fn from(a: NdArray<i64>) -> Self {
        TypedArray::I64(a)
    }
}

impl From<NdArray<bool>> for TypedArray {
    fn from(a: NdArray<bool>) -> Self {
        TypedArray::Bool(a)
    }
}
