//! Nearest-vertex correspondence between two meshes.

// Vertex counts don't overflow f64 precision in practice
#![allow(clippy::cast_precision_loss)]

use cf_spatial::{KdTree, Neighbor};
use nalgebra::Point3;
use rayon::prelude::*;

use crate::TransferResult;

/// Maps every target vertex to its nearest source vertex.
///
/// The mapping is total over the target (one entry per target vertex) but
/// neither injective nor surjective over the source: several target
/// vertices may share a source vertex, and some source vertices may never
/// be chosen.
///
/// # Example
///
/// ```
/// use cf_spatial::KdTree;
/// use mesh_shapekeys::Correspondence;
/// use nalgebra::Point3;
///
/// let source = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
/// let index = KdTree::from_points(&source).unwrap();
///
/// let target = [Point3::new(1.0, 0.0, 0.0), Point3::new(8.0, 0.0, 0.0)];
/// let map = Correspondence::compute(&index, &target, false).unwrap();
///
/// assert_eq!(map.source_indices(), &[0, 1]);
/// assert!((map.max_distance() - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Correspondence {
    source_indices: Vec<usize>,
    distances_squared: Vec<f64>,
}

impl Correspondence {
    /// Queries `index` once per target position.
    ///
    /// With `parallel` set the queries run on the rayon pool. The result is
    /// identical either way because each query is independent and exact.
    ///
    /// # Errors
    ///
    /// Propagates spatial index failures: an empty index, or a non-finite
    /// target position.
    pub fn compute(
        index: &KdTree,
        target_world: &[Point3<f64>],
        parallel: bool,
    ) -> TransferResult<Self> {
        let neighbors: Vec<Neighbor> = if parallel {
            target_world
                .par_iter()
                .map(|p| index.nearest_neighbor(p))
                .collect::<Result<_, _>>()?
        } else {
            target_world
                .iter()
                .map(|p| index.nearest_neighbor(p))
                .collect::<Result<_, _>>()?
        };

        Ok(Self {
            source_indices: neighbors.iter().map(|n| n.index).collect(),
            distances_squared: neighbors.iter().map(|n| n.distance_squared).collect(),
        })
    }

    /// Number of target vertices covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.source_indices.len()
    }

    /// Returns `true` if the target had no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_indices.is_empty()
    }

    /// Source vertex matched to each target vertex, in target order.
    #[must_use]
    pub fn source_indices(&self) -> &[usize] {
        &self.source_indices
    }

    /// Source vertex matched to `target_index`.
    #[must_use]
    pub fn source_index(&self, target_index: usize) -> Option<usize> {
        self.source_indices.get(target_index).copied()
    }

    /// World-space distance between `target_index` and its match.
    #[must_use]
    pub fn distance(&self, target_index: usize) -> Option<f64> {
        self.distances_squared.get(target_index).map(|d| d.sqrt())
    }

    /// Largest match distance, or `0.0` for an empty target.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.distances_squared
            .iter()
            .copied()
            .fold(0.0, f64::max)
            .sqrt()
    }

    /// Mean match distance, or `0.0` for an empty target.
    #[must_use]
    pub fn mean_distance(&self) -> f64 {
        if self.distances_squared.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.distances_squared.iter().map(|d| d.sqrt()).sum();
        sum / self.distances_squared.len() as f64
    }

    /// Iterates over `(target_index, source_index)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.source_indices.iter().copied().enumerate()
    }
}
