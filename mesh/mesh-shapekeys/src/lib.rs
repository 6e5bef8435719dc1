//! Shape key transfer between meshes with different topology.
//!
//! Shape keys (blend shapes, morph targets) are stored per vertex, so they
//! cannot be copied directly onto a mesh with a different vertex layout.
//! This crate infers a correspondence instead: every target vertex is
//! matched to its nearest source vertex in world space, and each source key
//! is rebuilt on the target from the displacements of the matched vertices.
//!
//! - [`ShapeKeyTransfer`] / [`transfer_shape_keys`] - The transfer operation
//! - [`ShapeKeyedMesh`] - In-memory mesh with world transform and shape keys
//! - [`ShapeKeyMesh`] / [`ShapeKeyMeshMut`] - Traits for host-owned meshes
//! - [`Correspondence`] - Target-to-source nearest-vertex mapping
//! - [`TransferParams`] - Scheduling and progress settings
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Quick Start
//!
//! ```
//! use mesh_shapekeys::{transfer_shape_keys, ShapeKeyedMesh, TransferParams};
//! use nalgebra::{Point3, Vector3};
//!
//! // A coarse source with a "Smile" key that lifts its right side.
//! let source = ShapeKeyedMesh::new(vec![
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//! ])
//! .with_basis()
//! .with_offsets("Smile", [Vector3::zeros(), Vector3::new(0.0, 0.0, 0.2)]);
//!
//! // A denser target with its own vertex order.
//! let mut target = ShapeKeyedMesh::new(vec![
//!     Point3::new(0.9, 0.0, 0.0),
//!     Point3::new(-0.8, 0.1, 0.0),
//!     Point3::new(1.2, 0.0, 0.0),
//! ]);
//!
//! let summary = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap();
//! assert_eq!(summary.transferred_keys, ["Smile"]);
//!
//! let smile = target.shape_key("Smile").unwrap();
//! assert!((smile.positions[0].z - 0.2).abs() < 1e-12);
//! assert!(smile.positions[1].z.abs() < 1e-12);
//! ```
//!
//! # Behavior
//!
//! - Keys named `"Basis"` are never transferred.
//! - Existing target keys are replaced, so repeated runs do not accumulate.
//! - Validation happens before the target is touched; on error the target
//!   is unchanged.
//! - Output is deterministic. Equidistant source vertices resolve to the
//!   lowest index, and parallel matching gives the same answer as
//!   sequential matching.
//!
//! # Limitations
//!
//! Each target vertex copies the displacement of exactly one source vertex.
//! There is no blending between neighbors, so targets that are much denser
//! than the source show stepped deformation.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod correspondence;
mod error;
mod mesh;
mod params;
mod progress;
mod result;
mod shape_key;
mod traits;
mod transfer;

pub use correspondence::Correspondence;
pub use error::{MeshRole, TransferError, TransferResult};
pub use mesh::ShapeKeyedMesh;
pub use params::TransferParams;
pub use progress::{ProgressCallback, TransferProgress};
pub use result::TransferSummary;
pub use shape_key::{BASIS_KEY_NAME, KeyInterpolation, ShapeKey};
pub use traits::{ShapeKeyMesh, ShapeKeyMeshMut};
pub use transfer::{ShapeKeyTransfer, transfer_shape_keys};
