//! Behavioral guarantees of shape key transfer.
//!
//! Each test exercises one property end to end through the public API.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]

use mesh_shapekeys::{
    BASIS_KEY_NAME, KeyInterpolation, ShapeKey, ShapeKeyTransfer, ShapeKeyedMesh, TransferError,
    TransferParams, transfer_shape_keys,
};
use nalgebra::{Matrix4, Point3, Vector3};

// =============================================================================
// Fixtures
// =============================================================================

/// A `cells` x `cells` grid in the XY plane spanning [0, size].
fn grid(cells: u32, size: f64) -> Vec<Point3<f64>> {
    let step = size / f64::from(cells);
    let mut points = Vec::new();
    for j in 0..=cells {
        for i in 0..=cells {
            points.push(Point3::new(f64::from(i) * step, f64::from(j) * step, 0.0));
        }
    }
    points
}

/// Coarse face-like source with a basis and three expressive keys.
fn face_source() -> ShapeKeyedMesh {
    let base = grid(4, 4.0);
    let bulge: Vec<_> = base
        .iter()
        .map(|p| Vector3::new(0.0, 0.0, (p.x * p.y).sin()))
        .collect();
    let shift: Vec<_> = base.iter().map(|p| Vector3::new(p.y * 0.1, 0.0, 0.0)).collect();

    ShapeKeyedMesh::new(base)
        .with_basis()
        .with_offsets("Bulge", bulge)
        .with_offsets("Shift", shift)
        .with_shape_key(
            ShapeKey::new("Flat", grid(4, 4.0)).with_interpolation(KeyInterpolation::Cardinal),
        )
}

/// Denser target, rotated vertex order, offset slightly off the source grid.
fn dense_target() -> ShapeKeyedMesh {
    let mut points: Vec<_> = grid(11, 4.0)
        .into_iter()
        .map(|p| Point3::new(p.x + 0.013, p.y - 0.007, 0.02))
        .collect();
    points.rotate_left(17);
    ShapeKeyedMesh::new(points)
}

fn run(source: &ShapeKeyedMesh, target: &mut ShapeKeyedMesh) -> mesh_shapekeys::TransferSummary {
    transfer_shape_keys(source, target, &TransferParams::default()).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn determinism_is_bit_exact() {
    let source = face_source();
    let mut first = dense_target();
    let mut second = dense_target();

    run(&source, &mut first);
    run(&source, &mut second);

    assert_eq!(first.shape_keys, second.shape_keys);
}

#[test]
fn every_key_is_vertex_aligned_with_target() {
    let source = face_source();
    let mut target = dense_target();
    run(&source, &mut target);

    assert_eq!(target.shape_keys.len(), 3);
    for key in &target.shape_keys {
        assert_eq!(key.len(), target.vertices.len());
    }
}

#[test]
fn basis_is_never_created_and_order_is_kept() {
    let source = face_source();
    let mut target = dense_target();
    let summary = run(&source, &mut target);

    let names: Vec<_> = target.shape_key_names().collect();
    assert_eq!(names, ["Bulge", "Shift", "Flat"]);
    assert!(target.shape_key(BASIS_KEY_NAME).is_none());
    assert!(summary.skipped_basis);

    // Same result when the source never had a basis key.
    let mut no_basis = face_source();
    no_basis.shape_keys.retain(|k| !k.is_basis());
    let mut target = dense_target();
    let summary = run(&no_basis, &mut target);
    assert!(!summary.skipped_basis);
    assert!(target.shape_key(BASIS_KEY_NAME).is_none());
}

#[test]
fn rerunning_replaces_instead_of_accumulating() {
    let source = face_source();
    let mut once = dense_target();
    run(&source, &mut once);

    let mut twice = dense_target().with_basis().with_offsets("Stale", vec![Vector3::x(); 144]);
    run(&source, &mut twice);
    run(&source, &mut twice);

    assert_eq!(once.shape_keys, twice.shape_keys);
    assert_eq!(twice.geometry_revision(), 2);
}

#[test]
fn nearest_source_vertex_wins() {
    let source = ShapeKeyedMesh::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)])
        .with_offsets("Tag", [Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)]);
    let mut target = ShapeKeyedMesh::new(vec![Point3::new(1.0, 0.0, 0.0)]);
    run(&source, &mut target);

    // Distance 1 to A versus 9 to B: A's offset is applied.
    assert_eq!(target.shape_keys[0].positions[0], Point3::new(2.0, 0.0, 0.0));
}

#[test]
fn equidistant_sources_resolve_to_lowest_index() {
    let source = ShapeKeyedMesh::new(vec![
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(-2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ])
    .with_offsets(
        "Tag",
        [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(0.0, 0.0, 3.0),
        ],
    );
    let mut target = ShapeKeyedMesh::new(vec![Point3::origin()]);
    run(&source, &mut target);

    assert_eq!(target.shape_keys[0].positions[0].z, 1.0);
}

#[test]
fn offset_is_applied_to_target_base() {
    let source = ShapeKeyedMesh::new(vec![Point3::new(5.0, 5.0, 4.0)])
        .with_basis()
        .with_offsets("Up", [Vector3::new(0.0, 0.0, 1.0)]);
    let mut target = ShapeKeyedMesh::new(vec![Point3::new(5.0, 5.0, 5.0)]);
    run(&source, &mut target);

    assert_eq!(target.shape_keys[0].positions[0], Point3::new(5.0, 5.0, 6.0));
}

#[test]
fn empty_source_is_rejected() {
    let source = ShapeKeyedMesh::new(Vec::new()).with_shape_key(ShapeKey::new("Ghost", Vec::new()));
    let mut target = dense_target().with_basis();

    let err = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap_err();
    assert_eq!(err, TransferError::EmptySource);
    assert_eq!(target.shape_keys.len(), 1);
}

#[test]
fn basis_only_source_leaves_target_untouched() {
    let source = ShapeKeyedMesh::new(grid(2, 1.0)).with_basis();
    let mut target = dense_target().with_offsets("Keep", vec![Vector3::y(); 144]);
    let before = target.clone();

    let err = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap_err();
    assert_eq!(err, TransferError::NoSourceShapeKeys);
    assert_eq!(target, before);
}

#[test]
fn source_without_keys_is_rejected() {
    let source = ShapeKeyedMesh::new(grid(2, 1.0));
    let mut target = dense_target();
    let err = transfer_shape_keys(&source, &mut target, &TransferParams::default()).unwrap_err();
    assert_eq!(err, TransferError::NoSourceShapeKeys);
}

#[test]
fn missing_objects_are_reported_before_anything_else() {
    let err = ShapeKeyTransfer::with_objects(None, None).run().unwrap_err();
    assert_eq!(err.to_string(), "source object not specified");

    let source = face_source();
    let err = ShapeKeyTransfer::new().source(&source).run().unwrap_err();
    assert_eq!(err.to_string(), "target object not specified");
}

#[test]
fn world_transforms_align_differently_scaled_objects() {
    // Source authored at 100x scale and shrunk by its object transform.
    let source = ShapeKeyedMesh::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(100.0, 0.0, 0.0),
    ])
    .with_world_transform(Matrix4::new_scaling(0.01))
    .with_offsets("Tag", [Vector3::zeros(), Vector3::new(0.0, 50.0, 0.0)]);

    let mut target = ShapeKeyedMesh::new(vec![Point3::new(0.9, 0.0, 0.0)]);
    run(&source, &mut target);

    // Offsets are copied in local units, not rescaled.
    assert_eq!(target.shape_keys[0].positions[0], Point3::new(0.9, 50.0, 0.0));
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let source = face_source();
    let mut parallel = ShapeKeyedMesh::new(grid(60, 4.0));
    let mut sequential = parallel.clone();

    transfer_shape_keys(
        &source,
        &mut parallel,
        &TransferParams::new().with_parallel_threshold(1),
    )
    .unwrap();
    transfer_shape_keys(
        &source,
        &mut sequential,
        &TransferParams::new().with_parallel(false),
    )
    .unwrap();

    assert_eq!(parallel.shape_keys, sequential.shape_keys);
}

#[test]
fn progress_stays_within_bounds() {
    let source = face_source();
    let mut target = ShapeKeyedMesh::new(grid(30, 4.0));
    let mut percents = Vec::new();

    ShapeKeyTransfer::new()
        .source(&source)
        .target(&mut target)
        .params(TransferParams::new().with_progress_interval(50))
        .on_progress(|p| percents.push(p.percent()))
        .run()
        .unwrap();

    assert!(!percents.is_empty());
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
    assert!(percents.windows(2).all(|w| w[0] < w[1]));
}

#[cfg(feature = "serde")]
#[test]
fn meshes_survive_a_json_round_trip() {
    let source = face_source();
    let json = serde_json::to_string(&source).unwrap();
    let restored: ShapeKeyedMesh = serde_json::from_str(&json).unwrap();

    let mut a = dense_target();
    let mut b = dense_target();
    run(&source, &mut a);
    run(&restored, &mut b);
    assert_eq!(a.shape_keys, b.shape_keys);
}
