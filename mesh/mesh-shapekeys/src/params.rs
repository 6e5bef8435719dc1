//! Transfer parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for shape key transfer.
///
/// None of these settings change the transferred geometry; they only control
/// how the work is scheduled and reported.
///
/// # Example
///
/// ```
/// use mesh_shapekeys::TransferParams;
///
/// let params = TransferParams::new()
///     .with_progress_interval(500)
///     .with_parallel(false);
///
/// assert_eq!(params.progress_interval, 500);
/// assert!(!params.parallel);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransferParams {
    /// Report progress every this many target vertices (default: 100).
    /// `0` disables progress reports.
    pub progress_interval: usize,
    /// Minimum target vertex count before nearest-vertex queries run on the
    /// rayon thread pool (default: 1000).
    pub parallel_threshold: usize,
    /// Allow parallel nearest-vertex queries at all (default: true).
    pub parallel: bool,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            parallel_threshold: 1000,
            parallel: true,
        }
    }
}

impl TransferParams {
    /// Creates parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the progress reporting interval in target vertices.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Sets the target vertex count above which queries run in parallel.
    #[must_use]
    pub const fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Enables or disables parallel queries.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether a target with `vertex_count` vertices should be matched in parallel.
    #[must_use]
    pub const fn use_parallel(&self, vertex_count: usize) -> bool {
        self.parallel && vertex_count >= self.parallel_threshold
    }
}
