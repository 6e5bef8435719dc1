//! Spatial indexing for CortenForge.
//!
//! This crate provides the point index used for geometric correspondence
//! between meshes that share no vertex numbering:
//!
//! - [`KdTree`] - Immutable, balanced 3D k-d tree with nearest-point queries
//! - [`Neighbor`] - Result of a nearest-point query (index, position, distance)
//! - [`SpatialError`] - Build and query failures
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Other game engines
//! - Python bindings
//!
//! # Determinism
//!
//! Queries are exact and reproducible. Among equally distant points the one
//! with the lowest caller-supplied index is returned, so identical inputs
//! always yield identical answers regardless of build order.
//!
//! # Example
//!
//! ```
//! use cf_spatial::{KdTree, SpatialError};
//! use nalgebra::Point3;
//!
//! let points = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(10.0, 0.0, 0.0),
//!     Point3::new(0.0, 10.0, 0.0),
//! ];
//! let tree = KdTree::from_points(&points).unwrap();
//!
//! let hit = tree.nearest_neighbor(&Point3::new(1.0, 0.0, 0.0)).unwrap();
//! assert_eq!(hit.index, 0);
//! assert!((hit.distance() - 1.0).abs() < 1e-12);
//!
//! // An empty index refuses to answer instead of inventing a result.
//! let empty = KdTree::from_points(&[]).unwrap();
//! assert_eq!(empty.nearest(&Point3::origin()), Err(SpatialError::EmptyIndex));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod kdtree;

pub use error::{SpatialError, SpatialResult};
pub use kdtree::{KdTree, Neighbor};

// Re-export nalgebra types for convenience
pub use nalgebra::Point3;
