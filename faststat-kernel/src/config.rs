//! Engine configuration.

use crate::threading::MIN_PARALLEL_LEN;

/// How the engine presents reduction rows to the kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Copy every row into a contiguous row matrix first. Always available.
    #[default]
    Repacked,
    /// Gather each row into a per-worker scratch buffer straight from the
    /// source strides. Limited to ranks up to
    /// [`EngineConfig::max_strided_rank`] with at least one kept axis.
    Strided,
}

/// Tuning knobs for [`crate::ReductionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub strategy: Strategy,
    /// Input element count above which rows are split across rayon workers.
    pub parallel_threshold: usize,
    /// Highest rank the [`Strategy::Strided`] path accepts.
    pub max_strided_rank: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Repacked,
            parallel_threshold: MIN_PARALLEL_LEN,
            max_strided_rank: 5,
        }
    }
}

impl EngineConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_max_strided_rank(mut self, rank: usize) -> Self {
        self.max_strided_rank = rank;
        self
    }
}
