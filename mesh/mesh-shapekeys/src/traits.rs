//! Host-facing traits for meshes that carry shape keys.
//!
//! The transfer engine only talks to meshes through these traits, so a host
//! application can plug its own scene objects in without copying data into
//! [`ShapeKeyedMesh`](crate::ShapeKeyedMesh). Both traits are object safe.

use nalgebra::{Matrix4, Point3};

use crate::ShapeKey;

/// Read access to a mesh's geometry and shape keys.
pub trait ShapeKeyMesh {
    /// Homogeneous local-to-world transform.
    fn world_transform(&self) -> Matrix4<f64>;

    /// Undeformed local-space vertex positions, in vertex order.
    fn base_positions(&self) -> &[Point3<f64>];

    /// Shape keys in declaration order.
    fn shape_keys(&self) -> &[ShapeKey];

    /// Number of vertices.
    fn vertex_count(&self) -> usize {
        self.base_positions().len()
    }

    /// Base positions mapped through [`Self::world_transform`].
    fn world_positions(&self) -> Vec<Point3<f64>> {
        let transform = self.world_transform();
        self.base_positions()
            .iter()
            .map(|p| transform.transform_point(p))
            .collect()
    }
}

/// Write access used to populate a transfer target.
pub trait ShapeKeyMeshMut: ShapeKeyMesh {
    /// Removes every shape key, including the basis.
    fn clear_shape_keys(&mut self);

    /// Appends a shape key after the existing ones.
    fn push_shape_key(&mut self, key: ShapeKey);

    /// Signals that derived geometry caches must be refreshed.
    fn mark_geometry_updated(&mut self);
}
