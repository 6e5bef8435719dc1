//! Summary of a completed transfer.

use std::fmt;

/// What a successful transfer did to the target.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    /// Names of the keys created on the target, in creation order.
    pub transferred_keys: Vec<String>,
    /// Whether the source carried a `Basis` key that was left behind.
    pub skipped_basis: bool,
    /// Number of source vertices indexed.
    pub source_vertices: usize,
    /// Number of target vertices matched.
    pub target_vertices: usize,
    /// Largest world-space distance between a target vertex and its match.
    pub max_match_distance: f64,
    /// Mean world-space distance between target vertices and their matches.
    pub mean_match_distance: f64,
}

impl TransferSummary {
    /// Number of keys created on the target.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.transferred_keys.len()
    }

    /// Returns `true` if every target vertex sits exactly on a source vertex.
    ///
    /// This holds when transferring between meshes with identical vertex
    /// positions, e.g. a retopologized copy that kept the original points.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_exact_match(&self) -> bool {
        self.max_match_distance == 0.0
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shape key transfer: {} keys, {} → {} vertices (max match distance {:.6})",
            self.key_count(),
            self.source_vertices,
            self.target_vertices,
            self.max_match_distance
        )
    }
}
