//! Shape key transfer by nearest-vertex correspondence.
//!
//! For every target vertex the closest source vertex is found in world
//! space. Each source shape key is then rebuilt on the target by applying,
//! at every target vertex, the displacement its matched source vertex has
//! in that key.

use cf_spatial::{KdTree, SpatialError};
use nalgebra::Point3;
use tracing::{debug, info};

use crate::{
    Correspondence, MeshRole, ShapeKey, ShapeKeyMesh, ShapeKeyMeshMut, TransferError,
    TransferParams, TransferProgress, TransferResult, TransferSummary,
    progress::ProgressCallback,
};

/// Builder for a single shape key transfer.
///
/// Source and target are optional until [`run`](Self::run) so that a host
/// can hand over whatever its object pickers resolved; a missing side is
/// reported as [`TransferError::MissingObject`].
///
/// # Example
///
/// ```
/// use mesh_shapekeys::{ShapeKeyTransfer, ShapeKeyedMesh};
/// use nalgebra::{Point3, Vector3};
///
/// let source = ShapeKeyedMesh::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)])
///     .with_basis()
///     .with_offsets("Lift", [Vector3::z(), Vector3::zeros()]);
/// let mut target = ShapeKeyedMesh::new(vec![Point3::new(1.0, 0.0, 0.0)]);
///
/// let mut reports = Vec::new();
/// let summary = ShapeKeyTransfer::new()
///     .source(&source)
///     .target(&mut target)
///     .on_progress(|p| reports.push(p.percent()))
///     .run()
///     .unwrap();
///
/// assert_eq!(summary.transferred_keys, ["Lift"]);
/// assert_eq!(target.shape_keys[0].positions[0], Point3::new(1.0, 0.0, 1.0));
/// assert_eq!(reports, [0.0]);
/// ```
pub struct ShapeKeyTransfer<'a> {
    source: Option<&'a dyn ShapeKeyMesh>,
    target: Option<&'a mut dyn ShapeKeyMeshMut>,
    params: TransferParams,
    on_progress: Option<ProgressCallback<'a>>,
}

impl Default for ShapeKeyTransfer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ShapeKeyTransfer<'a> {
    /// Creates a transfer with no meshes and default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            target: None,
            params: TransferParams::default(),
            on_progress: None,
        }
    }

    /// Creates a transfer from host-resolved, possibly missing, meshes.
    #[must_use]
    pub fn with_objects(
        source: Option<&'a dyn ShapeKeyMesh>,
        target: Option<&'a mut dyn ShapeKeyMeshMut>,
    ) -> Self {
        Self {
            source,
            target,
            ..Self::new()
        }
    }

    /// Sets the mesh to read shape keys from.
    #[must_use]
    pub fn source(mut self, source: &'a dyn ShapeKeyMesh) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the mesh to write shape keys to.
    #[must_use]
    pub fn target(mut self, target: &'a mut dyn ShapeKeyMeshMut) -> Self {
        self.target = Some(target);
        self
    }

    /// Replaces the transfer parameters.
    #[must_use]
    pub fn params(mut self, params: TransferParams) -> Self {
        self.params = params;
        self
    }

    /// Installs a progress callback.
    ///
    /// The callback runs on the calling thread, at most once every
    /// [`TransferParams::progress_interval`] target vertices per key.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&TransferProgress) + 'a,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Runs the transfer.
    ///
    /// On success the target's shape keys are replaced by one key per
    /// non-Basis source key, in source order, and the target is flagged as
    /// updated. On error the target is left untouched.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`TransferError::MissingObject`] if source or target is missing
    /// - [`TransferError::NoSourceShapeKeys`] if the source has only a Basis key or none
    /// - [`TransferError::EmptySource`] if the source has no vertices
    /// - [`TransferError::ShapeKeyLengthMismatch`] if a source key is not vertex-aligned
    /// - [`TransferError::NonFinitePosition`] if a world position is NaN or infinite
    pub fn run(self) -> TransferResult<TransferSummary> {
        let Self {
            source,
            target,
            params,
            on_progress,
        } = self;

        let source = source.ok_or(TransferError::MissingObject {
            role: MeshRole::Source,
        })?;
        let target = target.ok_or(TransferError::MissingObject {
            role: MeshRole::Target,
        })?;

        let keys: Vec<&ShapeKey> = source
            .shape_keys()
            .iter()
            .filter(|k| !k.is_basis())
            .collect();
        if keys.is_empty() {
            return Err(TransferError::NoSourceShapeKeys);
        }

        let source_base = source.base_positions();
        if source_base.is_empty() {
            return Err(TransferError::EmptySource);
        }
        if let Some(key) = keys.iter().find(|k| k.len() != source_base.len()) {
            return Err(TransferError::ShapeKeyLengthMismatch {
                name: key.name.clone(),
                expected: source_base.len(),
                actual: key.len(),
            });
        }

        let index = build_source_index(&source.world_positions())?;
        let target_world = target.world_positions();
        if let Some(i) = target_world.iter().position(|p| !is_finite(p)) {
            return Err(TransferError::NonFinitePosition {
                role: MeshRole::Target,
                index: i,
            });
        }

        info!(
            source_vertices = source_base.len(),
            target_vertices = target_world.len(),
            keys = keys.len(),
            "Starting shape key transfer"
        );

        let correspondence = Correspondence::compute(
            &index,
            &target_world,
            params.use_parallel(target_world.len()),
        )?;
        debug!(
            max_distance = correspondence.max_distance(),
            "Computed nearest-vertex correspondence"
        );

        let mut reporter = ProgressReporter {
            callback: on_progress,
            interval: params.progress_interval,
            field_count: keys.len(),
            vertex_count: target_world.len(),
        };
        let target_base = target.base_positions();
        let staged: Vec<ShapeKey> = keys
            .iter()
            .enumerate()
            .map(|(field_index, key)| {
                let new_key = reproject_key(
                    key,
                    source_base,
                    target_base,
                    &correspondence,
                    |vertex_index| reporter.report(field_index, vertex_index),
                );
                debug!(name = %key.name, "Transferred shape key");
                new_key
            })
            .collect();

        let summary = TransferSummary {
            transferred_keys: staged.iter().map(|k| k.name.clone()).collect(),
            skipped_basis: source.shape_keys().iter().any(ShapeKey::is_basis),
            source_vertices: source_base.len(),
            target_vertices: target_world.len(),
            max_match_distance: correspondence.max_distance(),
            mean_match_distance: correspondence.mean_distance(),
        };

        target.clear_shape_keys();
        for key in staged {
            target.push_shape_key(key);
        }
        target.mark_geometry_updated();

        info!(
            keys = summary.key_count(),
            max_match_distance = summary.max_match_distance,
            "Shape key transfer complete"
        );
        Ok(summary)
    }
}

/// Transfers all non-Basis shape keys from `source` to `target`.
///
/// Shorthand for [`ShapeKeyTransfer`] without a progress callback.
///
/// # Errors
///
/// See [`ShapeKeyTransfer::run`].
///
/// # Example
///
/// ```
/// use mesh_shapekeys::{transfer_shape_keys, ShapeKeyedMesh, TransferParams};
/// use nalgebra::{Point3, Vector3};
///
/// let source = ShapeKeyedMesh::new(vec![Point3::origin()])
///     .with_basis()
///     .with_offsets("Up", [Vector3::new(0.0, 0.0, 1.0)]);
/// let mut target = ShapeKeyedMesh::new(vec![Point3::new(5.0, 5.0, 5.0)]);
///
/// transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap();
/// assert_eq!(target.shape_keys[0].positions[0], Point3::new(5.0, 5.0, 6.0));
/// ```
pub fn transfer_shape_keys<'a>(
    source: &'a dyn ShapeKeyMesh,
    target: &'a mut dyn ShapeKeyMeshMut,
    params: &TransferParams,
) -> TransferResult<TransferSummary> {
    ShapeKeyTransfer::new()
        .source(source)
        .target(target)
        .params(params.clone())
        .run()
}

/// Builds the world-space source index, tagging points with local vertex indices.
fn build_source_index(source_world: &[Point3<f64>]) -> TransferResult<KdTree> {
    let index = KdTree::from_points(source_world).map_err(|e| match e {
        SpatialError::NonFinitePoint { index } => TransferError::NonFinitePosition {
            role: MeshRole::Source,
            index,
        },
        other => TransferError::Spatial(other),
    })?;
    debug!(points = index.len(), "Built source vertex index");
    Ok(index)
}

/// Rebuilds `key` on the target: each target vertex receives the displacement
/// of its matched source vertex.
fn reproject_key(
    key: &ShapeKey,
    source_base: &[Point3<f64>],
    target_base: &[Point3<f64>],
    correspondence: &Correspondence,
    mut on_vertex: impl FnMut(usize),
) -> ShapeKey {
    let positions = target_base
        .iter()
        .zip(correspondence.source_indices())
        .enumerate()
        .map(|(i, (base, &j))| {
            on_vertex(i);
            base + (key.positions[j] - source_base[j])
        })
        .collect();

    ShapeKey {
        name: key.name.clone(),
        interpolation: key.interpolation,
        positions,
    }
}

fn is_finite(p: &Point3<f64>) -> bool {
    p.iter().all(|c| c.is_finite())
}

/// Throttles progress callbacks to one per `interval` target vertices.
struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
    interval: usize,
    field_count: usize,
    vertex_count: usize,
}

impl ProgressReporter<'_> {
    fn report(&mut self, field_index: usize, vertex_index: usize) {
        if self.interval == 0 || vertex_index % self.interval != 0 {
            return;
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(&TransferProgress {
                field_index,
                field_count: self.field_count,
                vertex_index,
                vertex_count: self.vertex_count,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{KeyInterpolation, ShapeKeyedMesh};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Vector3};

    fn two_point_source() -> ShapeKeyedMesh {
        ShapeKeyedMesh::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)])
            .with_basis()
            .with_offsets(
                "Lift",
                [Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0)],
            )
    }

    #[test]
    fn test_missing_source() {
        let mut target = ShapeKeyedMesh::new(vec![Point3::origin()]);
        let err = ShapeKeyTransfer::new().target(&mut target).run().unwrap_err();
        assert_eq!(
            err,
            TransferError::MissingObject {
                role: MeshRole::Source
            }
        );
    }

    #[test]
    fn test_missing_target() {
        let source = two_point_source();
        let err = ShapeKeyTransfer::with_objects(Some(&source), None)
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::MissingObject {
                role: MeshRole::Target
            }
        );
    }

    #[test]
    fn test_nearest_vertex_offsets() {
        let source = two_point_source();
        let mut target = ShapeKeyedMesh::new(vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(9.0, 3.0, 0.0),
        ]);

        let summary = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap();

        let lift = target.shape_key("Lift").unwrap();
        assert_eq!(lift.positions[0], Point3::new(1.0, 0.0, 1.0));
        assert_eq!(lift.positions[1], Point3::new(9.0, 3.0, -1.0));
        assert!(summary.skipped_basis);
        assert_relative_eq!(summary.max_match_distance, 10.0_f64.sqrt());
    }

    #[test]
    fn test_world_transform_drives_matching_but_offsets_stay_local() {
        // In local space target vertex 0 sits on source vertex 0, but the
        // target object is shifted so that in world space it lands on source
        // vertex 1.
        let source = two_point_source();
        let mut target = ShapeKeyedMesh::new(vec![Point3::new(0.0, 0.0, 0.0)])
            .with_world_transform(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)));

        transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap();

        assert_eq!(
            target.shape_keys[0].positions[0],
            Point3::new(0.0, 0.0, -1.0)
        );
    }

    #[test]
    fn test_interpolation_is_copied() {
        let base = vec![Point3::origin()];
        let source = ShapeKeyedMesh::new(base.clone()).with_shape_key(
            ShapeKey::from_base("Curve", &base).with_interpolation(KeyInterpolation::CatmullRom),
        );
        let mut target = ShapeKeyedMesh::new(vec![Point3::new(0.1, 0.0, 0.0)]);

        transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap();
        assert_eq!(
            target.shape_keys[0].interpolation,
            KeyInterpolation::CatmullRom
        );
    }

    #[test]
    fn test_length_mismatch_leaves_target_untouched() {
        let source = ShapeKeyedMesh::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)])
            .with_shape_key(ShapeKey::new("Short", vec![Point3::origin()]));
        let mut target = ShapeKeyedMesh::new(vec![Point3::origin()]).with_basis();

        let err = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap_err();
        assert_eq!(
            err,
            TransferError::ShapeKeyLengthMismatch {
                name: "Short".to_string(),
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(target.shape_keys.len(), 1);
        assert_eq!(target.geometry_revision(), 0);
    }

    #[test]
    fn test_non_finite_positions_are_rejected() {
        let mut source = two_point_source();
        source.vertices[1].x = f64::NAN;
        let mut target = ShapeKeyedMesh::new(vec![Point3::origin()]);
        let err = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap_err();
        assert_eq!(
            err,
            TransferError::NonFinitePosition {
                role: MeshRole::Source,
                index: 1
            }
        );

        let source = two_point_source();
        let mut target =
            ShapeKeyedMesh::new(vec![Point3::origin(), Point3::new(0.0, f64::INFINITY, 0.0)]);
        let err = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap_err();
        assert_eq!(
            err,
            TransferError::NonFinitePosition {
                role: MeshRole::Target,
                index: 1
            }
        );
    }

    #[test]
    fn test_progress_is_throttled_and_monotonic() {
        let source = two_point_source();
        let target_points: Vec<_> = (0..250)
            .map(|i| Point3::new(f64::from(i) * 0.04, 0.0, 0.0))
            .collect();
        let mut target = ShapeKeyedMesh::new(target_points);

        let mut reports = Vec::new();
        ShapeKeyTransfer::new()
            .source(&source)
            .target(&mut target)
            .params(TransferParams::new().with_progress_interval(100))
            .on_progress(|p| reports.push(*p))
            .run()
            .unwrap();

        let indices: Vec<_> = reports.iter().map(|p| p.vertex_index).collect();
        assert_eq!(indices, [0, 100, 200]);
        assert!(reports.iter().all(|p| p.field_count == 1 && p.vertex_count == 250));
        assert!(reports.windows(2).all(|w| w[0].fraction() < w[1].fraction()));
        assert_relative_eq!(reports[2].percent(), 80.0);
    }

    #[test]
    fn test_progress_can_be_disabled() {
        let source = two_point_source();
        let mut target = ShapeKeyedMesh::new(vec![Point3::origin(); 10]);
        let mut calls = 0;
        ShapeKeyTransfer::new()
            .source(&source)
            .target(&mut target)
            .params(TransferParams::new().with_progress_interval(0))
            .on_progress(|_| calls += 1)
            .run()
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_empty_target_gets_empty_keys() {
        let source = two_point_source();
        let mut target = ShapeKeyedMesh::new(Vec::new());

        let summary = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap();
        assert_eq!(summary.target_vertices, 0);
        assert_eq!(target.shape_keys.len(), 1);
        assert!(target.shape_keys[0].is_empty());
        assert_eq!(target.geometry_revision(), 1);
    }
}
