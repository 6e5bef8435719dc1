//! Coarse progress reports for long transfers.

// Vertex and key counts don't overflow f64 precision in practice
#![allow(clippy::cast_precision_loss)]

use std::fmt;

/// A progress snapshot taken while re-projecting shape keys.
///
/// Reports are informational only and arrive at a throttled cadence
/// (see [`TransferParams::progress_interval`](crate::TransferParams)).
///
/// # Example
///
/// ```
/// use mesh_shapekeys::TransferProgress;
///
/// let progress = TransferProgress {
///     field_index: 1,
///     field_count: 4,
///     vertex_index: 500,
///     vertex_count: 1000,
/// };
/// assert!((progress.percent() - 37.5).abs() < 1e-12);
/// assert_eq!(progress.to_string(), "Transferring shape keys... 37.50% completed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Zero-based position of the key being transferred, Basis excluded.
    pub field_index: usize,
    /// Number of keys being transferred, Basis excluded.
    pub field_count: usize,
    /// Zero-based target vertex about to be written.
    pub vertex_index: usize,
    /// Number of target vertices.
    pub vertex_count: usize,
}

impl TransferProgress {
    /// Completed fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.field_count == 0 {
            return 1.0;
        }
        let within_field = if self.vertex_count == 0 {
            0.0
        } else {
            self.vertex_index as f64 / self.vertex_count as f64
        };
        ((self.field_index as f64 + within_field) / self.field_count as f64).clamp(0.0, 1.0)
    }

    /// Completed percentage in `[0, 100]`.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transferring shape keys... {:.2}% completed", self.percent())
    }
}

/// Callback that receives progress reports.
pub type ProgressCallback<'a> = Box<dyn FnMut(&TransferProgress) + 'a>;
