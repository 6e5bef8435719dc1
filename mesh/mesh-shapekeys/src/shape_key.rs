//! Shape keys: named per-vertex deformations layered on a base mesh.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of the reference key that holds the undeformed shape.
///
/// A key with this name is never transferred.
pub const BASIS_KEY_NAME: &str = "Basis";

/// Interpolation mode used by the host when blending between keys.
///
/// Transfer copies this value verbatim; it has no effect on the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyInterpolation {
    /// Linear blending.
    #[default]
    Linear,
    /// Cardinal spline.
    Cardinal,
    /// Catmull-Rom spline.
    CatmullRom,
    /// Uniform B-spline.
    BSpline,
}

/// A named deformation of a mesh.
///
/// Values are stored as deformed positions in the owning mesh's local space,
/// one per vertex. The displacement of vertex `i` is therefore
/// `positions[i] - base[i]`, and a key whose positions equal the base
/// positions deforms nothing.
///
/// # Example
///
/// ```
/// use mesh_shapekeys::ShapeKey;
/// use nalgebra::{Point3, Vector3};
///
/// let base = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
/// let key = ShapeKey::from_offsets("Smile", &base, [Vector3::z(), Vector3::zeros()]);
///
/// assert_eq!(key.offset(&base, 0), Some(Vector3::z()));
/// assert_eq!(key.positions[1], base[1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeKey {
    /// Display name; unique per mesh by host convention.
    pub name: String,
    /// Blend interpolation mode.
    pub interpolation: KeyInterpolation,
    /// Deformed local-space position of every vertex.
    pub positions: Vec<Point3<f64>>,
}

impl ShapeKey {
    /// Creates a key from explicit deformed positions with linear interpolation.
    #[must_use]
    pub fn new(name: impl Into<String>, positions: Vec<Point3<f64>>) -> Self {
        Self {
            name: name.into(),
            interpolation: KeyInterpolation::default(),
            positions,
        }
    }

    /// Creates a key that leaves every vertex at its base position.
    #[must_use]
    pub fn from_base(name: impl Into<String>, base: &[Point3<f64>]) -> Self {
        Self::new(name, base.to_vec())
    }

    /// Creates a key by displacing `base` with per-vertex `offsets`.
    ///
    /// The key gets one value per pair; surplus base positions or offsets
    /// are ignored.
    #[must_use]
    pub fn from_offsets<I>(name: impl Into<String>, base: &[Point3<f64>], offsets: I) -> Self
    where
        I: IntoIterator<Item = Vector3<f64>>,
    {
        let positions = base.iter().zip(offsets).map(|(p, o)| p + o).collect();
        Self::new(name, positions)
    }

    /// Sets the interpolation mode.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: KeyInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Returns `true` for the reference key named [`BASIS_KEY_NAME`].
    #[must_use]
    pub fn is_basis(&self) -> bool {
        self.name == BASIS_KEY_NAME
    }

    /// Number of per-vertex values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the key holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Displacement of vertex `index` relative to `base`.
    ///
    /// Returns `None` if either slice is too short.
    #[must_use]
    pub fn offset(&self, base: &[Point3<f64>], index: usize) -> Option<Vector3<f64>> {
        Some(self.positions.get(index)? - base.get(index)?)
    }

    /// Iterates over the displacement of every vertex relative to `base`.
    pub fn offsets<'a>(
        &'a self,
        base: &'a [Point3<f64>],
    ) -> impl Iterator<Item = Vector3<f64>> + 'a {
        self.positions.iter().zip(base).map(|(p, b)| p - b)
    }
}
