//! In-memory mesh with a world transform and shape keys.

use nalgebra::{Matrix4, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BASIS_KEY_NAME, ShapeKey, ShapeKeyMesh, ShapeKeyMeshMut};

/// A mesh object as seen by shape key transfer.
///
/// Only vertex positions matter for correspondence, so faces are not
/// stored. Vertex order defines the index space of every shape key.
///
/// # Example
///
/// ```
/// use mesh_shapekeys::{ShapeKeyedMesh, ShapeKeyMesh};
/// use nalgebra::{Matrix4, Point3, Vector3};
///
/// let mesh = ShapeKeyedMesh::new(vec![Point3::new(1.0, 0.0, 0.0)])
///     .with_world_transform(Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)))
///     .with_basis();
///
/// assert_eq!(mesh.world_positions()[0], Point3::new(1.0, 2.0, 0.0));
/// assert!(mesh.shape_key("Basis").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeKeyedMesh {
    /// Undeformed local-space vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Homogeneous local-to-world transform.
    pub world_transform: Matrix4<f64>,

    /// Shape keys in declaration order.
    pub shape_keys: Vec<ShapeKey>,

    /// Bumped by [`ShapeKeyMeshMut::mark_geometry_updated`].
    #[cfg_attr(feature = "serde", serde(skip))]
    geometry_revision: u64,
}

impl Default for ShapeKeyedMesh {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ShapeKeyedMesh {
    /// Creates a mesh at the world origin with no shape keys.
    #[must_use]
    pub fn new(vertices: Vec<Point3<f64>>) -> Self {
        Self {
            vertices,
            world_transform: Matrix4::identity(),
            shape_keys: Vec::new(),
            geometry_revision: 0,
        }
    }

    /// Sets the local-to-world transform.
    #[must_use]
    pub fn with_world_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.world_transform = transform;
        self
    }

    /// Appends a `Basis` key holding the current base positions.
    #[must_use]
    pub fn with_basis(mut self) -> Self {
        let basis = ShapeKey::from_base(BASIS_KEY_NAME, &self.vertices);
        self.shape_keys.push(basis);
        self
    }

    /// Appends a shape key.
    #[must_use]
    pub fn with_shape_key(mut self, key: ShapeKey) -> Self {
        self.shape_keys.push(key);
        self
    }

    /// Appends a shape key built from per-vertex displacements.
    #[must_use]
    pub fn with_offsets<I>(self, name: impl Into<String>, offsets: I) -> Self
    where
        I: IntoIterator<Item = Vector3<f64>>,
    {
        let key = ShapeKey::from_offsets(name, &self.vertices, offsets);
        self.with_shape_key(key)
    }

    /// Looks up the first shape key with the given name.
    #[must_use]
    pub fn shape_key(&self, name: &str) -> Option<&ShapeKey> {
        self.shape_keys.iter().find(|k| k.name == name)
    }

    /// Names of all shape keys in declaration order.
    pub fn shape_key_names(&self) -> impl Iterator<Item = &str> {
        self.shape_keys.iter().map(|k| k.name.as_str())
    }

    /// How many times the geometry has been flagged as updated.
    #[must_use]
    pub const fn geometry_revision(&self) -> u64 {
        self.geometry_revision
    }
}

impl ShapeKeyMesh for ShapeKeyedMesh {
    fn world_transform(&self) -> Matrix4<f64> {
        self.world_transform
    }

    fn base_positions(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    fn shape_keys(&self) -> &[ShapeKey] {
        &self.shape_keys
    }
}

impl ShapeKeyMeshMut for ShapeKeyedMesh {
    fn clear_shape_keys(&mut self) {
        self.shape_keys.clear();
    }

    fn push_shape_key(&mut self, key: ShapeKey) {
        self.shape_keys.push(key);
    }

    fn mark_geometry_updated(&mut self) {
        self.geometry_revision = self.geometry_revision.wrapping_add(1);
    }
}
