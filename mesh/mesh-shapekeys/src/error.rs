//! Error types for shape key transfer.

use std::fmt;

use cf_spatial::SpatialError;
use thiserror::Error;

/// Which side of a transfer a mesh plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshRole {
    /// The mesh the shape keys are read from.
    Source,
    /// The mesh that receives the transferred shape keys.
    Target,
}

impl fmt::Display for MeshRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Errors that can occur during shape key transfer.
///
/// Every variant is detected before the target mesh is modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// The source or target mesh was not supplied.
    #[error("{role} object not specified")]
    MissingObject {
        /// The missing side.
        role: MeshRole,
    },

    /// The source mesh has no shape keys other than the basis.
    #[error("source object has no shape keys")]
    NoSourceShapeKeys,

    /// The source mesh has no vertices to match against.
    #[error("source mesh has no vertices")]
    EmptySource,

    /// A source shape key does not have one value per source vertex.
    #[error("shape key '{name}' has {actual} values, expected {expected}")]
    ShapeKeyLengthMismatch {
        /// Name of the offending shape key.
        name: String,
        /// Vertex count of the source mesh.
        expected: usize,
        /// Number of values stored in the key.
        actual: usize,
    },

    /// A vertex position is NaN or infinite after applying the world transform.
    #[error("{role} vertex {index} has a non-finite world position")]
    NonFinitePosition {
        /// The mesh holding the vertex.
        role: MeshRole,
        /// The vertex index.
        index: usize,
    },

    /// The spatial index failed in a way validation did not catch.
    #[error("spatial index error: {0}")]
    Spatial(#[from] SpatialError),
}

/// Result type for shape key transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;
