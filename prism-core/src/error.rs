//! Error types shared by every pipeline stage
use thiserror::Error;

/// Errors surfaced by pipeline stages.
///
/// Geometric degeneracies (zero-length segments, fully clipped primitives,
/// radii that collapse after subtracting an outline) are not errors; stages
/// drop them silently. Only caller mistakes and unsupported requests end up
/// here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("non-finite coordinate passed to {0}")]
    NonFinite(&'static str),

    #[error("transform is not invertible")]
    NonInvertible,

    #[error("near plane distance must be positive and finite, got {0}")]
    InvalidNearPlane(f32),

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("clip plane normal must be non-zero and finite")]
    DegeneratePlane,
}

pub type Result<T> = std::result::Result<T, GeometryError>;
