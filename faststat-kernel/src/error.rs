/// Reasons a reduction request is rejected before any work starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("axis {axis} is out of range for array of rank {rank}")]
    AxisOutOfRange { axis: isize, rank: usize },

    #[error("axis {axis} is repeated")]
    DuplicateAxis { axis: usize },

    #[error("no axes requested for reduction")]
    EmptyAxisSet,

    #[error("reduction axes {axes:?} contain a zero-length dimension")]
    EmptyReduction { axes: Vec<usize> },

    #[error("kernel '{kernel}' requires a q parameter")]
    MissingParameter { kernel: &'static str },

    #[error("kernel '{kernel}' does not accept a q parameter")]
    UnexpectedParameter { kernel: &'static str },

    #[error("q = {value} is outside [{lo}, {hi}] for kernel '{kernel}'")]
    ParameterOutOfRange {
        kernel: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },

    #[error("q parameter for kernel '{kernel}' is an empty sequence")]
    EmptyParameter { kernel: &'static str },

    #[error("kernel '{kernel}' is elementwise and has no scalar per-group value")]
    ElementwiseKernel { kernel: &'static str },
}

/// Errors that can occur during a statistical reduction.
#[derive(Debug, thiserror::Error)]
pub enum StatError {
    /// Input element type cannot carry a floating-point statistic.
    #[error("unsupported element type '{dtype}': input must be a numeric array")]
    Type { dtype: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Kernel name outside the closed kernel table.
    #[error("unsupported kernel '{0}'")]
    UnsupportedKernel(String),

    #[error(transparent)]
    View(#[from] faststat_view::ViewError),
}

impl StatError {
    /// True for every variant raised by argument validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, StatError::Validation(_))
    }
}

/// Convenience alias for `Result<T, StatError>`.
pub type Result<T> = std::result::Result<T, StatError>;
