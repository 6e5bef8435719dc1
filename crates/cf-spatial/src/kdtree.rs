//! Immutable, balanced k-d tree for nearest-point queries.
//!
//! The tree is built once from a fixed point set and never mutated
//! afterwards. Nodes live in a single flat array: the subtree covering
//! `entries[lo..hi]` stores its splitting node at `lo + (hi - lo) / 2`, with
//! the left half before it and the right half after it. No child pointers
//! are needed, and queries only take `&self`, so a built tree can be shared
//! freely between threads.
//!
//! # Determinism
//!
//! Every query returns the point with minimum Euclidean distance to the
//! query. When several points are equally close, the one with the lowest
//! caller-supplied index wins. The result therefore depends only on the
//! input points, never on the shape of the tree.
//!
//! # Example
//!
//! ```
//! use cf_spatial::KdTree;
//! use nalgebra::Point3;
//!
//! let tree = KdTree::build([
//!     (Point3::new(0.0, 0.0, 0.0), 0),
//!     (Point3::new(10.0, 0.0, 0.0), 1),
//! ])
//! .unwrap();
//!
//! assert_eq!(tree.nearest(&Point3::new(1.0, 0.0, 0.0)).unwrap(), 0);
//! assert_eq!(tree.nearest(&Point3::new(9.0, 0.0, 0.0)).unwrap(), 1);
//! ```

use std::cmp::Ordering;

use nalgebra::Point3;

use crate::error::{SpatialError, SpatialResult};

/// A point stored in the tree together with its caller-supplied index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    point: Point3<f64>,
    index: usize,
}

/// The result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Caller-supplied index of the closest point.
    pub index: usize,
    /// Position of the closest point.
    pub point: Point3<f64>,
    /// Squared Euclidean distance from the query to [`Self::point`].
    pub distance_squared: f64,
}

impl Neighbor {
    /// Euclidean distance from the query to the closest point.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }
}

/// A balanced 3D k-d tree over a static point set.
///
/// Build cost is O(N log N). Queries are O(log N) on average for
/// well-distributed points.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    entries: Vec<Entry>,
    /// Split axis (0 = X, 1 = Y, 2 = Z) of the node stored at the same slot.
    axes: Vec<u8>,
}

impl KdTree {
    /// Builds a balanced tree from `(position, index)` pairs.
    ///
    /// The index is returned by queries and is otherwise opaque to the tree;
    /// it does not need to be dense or unique. An empty input produces an
    /// empty tree, which rejects every query with
    /// [`SpatialError::EmptyIndex`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFinitePoint`] if any coordinate is NaN or
    /// infinite.
    pub fn build<I>(points: I) -> SpatialResult<Self>
    where
        I: IntoIterator<Item = (Point3<f64>, usize)>,
    {
        let points = points.into_iter();
        let mut entries = Vec::with_capacity(points.size_hint().0);
        for (point, index) in points {
            if !is_finite(&point) {
                return Err(SpatialError::NonFinitePoint { index });
            }
            entries.push(Entry { point, index });
        }

        let mut axes = vec![0; entries.len()];
        partition(&mut entries, &mut axes);

        Ok(Self { entries, axes })
    }

    /// Builds a tree where each point is tagged with its position in `points`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFinitePoint`] if any coordinate is NaN or
    /// infinite.
    pub fn from_points(points: &[Point3<f64>]) -> SpatialResult<Self> {
        Self::build(points.iter().copied().zip(0..))
    }

    /// Number of points in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the stored `(position, index)` pairs in tree order.
    pub fn iter(&self) -> impl Iterator<Item = (Point3<f64>, usize)> + '_ {
        self.entries.iter().map(|e| (e.point, e.index))
    }

    /// Returns the index of the point closest to `query`.
    ///
    /// Ties are broken by the lowest index.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyIndex`] if the tree has no points, or
    /// [`SpatialError::NonFiniteQuery`] if `query` has a NaN or infinite
    /// coordinate.
    pub fn nearest(&self, query: &Point3<f64>) -> SpatialResult<usize> {
        self.nearest_neighbor(query).map(|n| n.index)
    }

    /// Returns the closest point to `query` along with its index and squared
    /// distance.
    ///
    /// # Errors
    ///
    /// Same as [`Self::nearest`].
    pub fn nearest_neighbor(&self, query: &Point3<f64>) -> SpatialResult<Neighbor> {
        if !is_finite(query) {
            return Err(SpatialError::NonFiniteQuery);
        }

        let mut best: Option<Best> = None;
        self.search(0, self.entries.len(), query, &mut best);

        let best = best.ok_or(SpatialError::EmptyIndex)?;
        let entry = &self.entries[best.slot];
        Ok(Neighbor {
            index: entry.index,
            point: entry.point,
            distance_squared: best.distance_squared,
        })
    }

    #[allow(clippy::float_cmp)] // exact ties decide by index
    fn search(&self, lo: usize, hi: usize, query: &Point3<f64>, best: &mut Option<Best>) {
        if lo >= hi {
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let entry = &self.entries[mid];
        let distance_squared = (entry.point - query).norm_squared();

        let improves = match best {
            None => true,
            Some(b) => {
                distance_squared < b.distance_squared
                    || (distance_squared == b.distance_squared
                        && entry.index < self.entries[b.slot].index)
            }
        };
        if improves {
            *best = Some(Best {
                slot: mid,
                distance_squared,
            });
        }

        let axis = usize::from(self.axes[mid]);
        let delta = query[axis] - entry.point[axis];
        let (near, far) = if delta < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, query, best);

        // `<=` keeps equidistant points on the far side reachable for the
        // lowest-index tie-break.
        if best.is_some_and(|b| delta * delta <= b.distance_squared) {
            self.search(far.0, far.1, query, best);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Best {
    slot: usize,
    distance_squared: f64,
}

fn is_finite(p: &Point3<f64>) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// Recursively reorders `entries` into implicit k-d tree layout.
fn partition(entries: &mut [Entry], axes: &mut [u8]) {
    if entries.len() <= 1 {
        return;
    }

    let axis = widest_axis(entries);
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| compare_on_axis(a, b, usize::from(axis)));
    axes[mid] = axis;

    let (left, rest) = entries.split_at_mut(mid);
    let (left_axes, rest_axes) = axes.split_at_mut(mid);
    partition(left, left_axes);
    partition(&mut rest[1..], &mut rest_axes[1..]);
}

/// Axis with the largest coordinate spread; ties go to the lower axis.
fn widest_axis(entries: &[Entry]) -> u8 {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for e in entries {
        for axis in 0..3 {
            min[axis] = min[axis].min(e.point[axis]);
            max[axis] = max[axis].max(e.point[axis]);
        }
    }

    let mut widest = 0_u8;
    for axis in 1..3_u8 {
        let (a, w) = (usize::from(axis), usize::from(widest));
        if max[a] - min[a] > max[w] - min[w] {
            widest = axis;
        }
    }
    widest
}

fn compare_on_axis(a: &Entry, b: &Entry, axis: usize) -> Ordering {
    a.point[axis]
        .total_cmp(&b.point[axis])
        .then(a.index.cmp(&b.index))
}
