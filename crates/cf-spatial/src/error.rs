//! Error types for spatial index operations.

/// Errors that can occur while building or querying a spatial index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// A nearest-point query was issued against an index with no points.
    #[error("spatial index contains no points")]
    EmptyIndex,

    /// A point handed to the index builder has a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// The caller-supplied index of the offending point.
        index: usize,
    },

    /// The query point has a NaN or infinite coordinate.
    #[error("query point has a non-finite coordinate")]
    NonFiniteQuery,
}

/// Result type for spatial index operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
