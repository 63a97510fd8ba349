//! Prism Core Library - Vector graphics pipeline for 2D and 3D primitives
//!
//! This library provides chainable drawing stages: affine placement, 3D to 2D
//! perspective projection with near-plane clipping, arbitrary plane clipping,
//! and decomposition of thick lines, ellipses, spheres and outlined shapes
//! into plain convex polygons that any rasterizer can fill.

pub mod affine;
pub mod clip;
pub mod decompose;
pub mod error;
pub mod geometry;
pub mod plane_clip;
pub mod projection;
pub mod record;
pub mod scene;
pub mod style;
pub mod target;
pub mod tessellate;
pub mod transform;

// Re-export commonly used types
pub use affine::{AffineTransformer2, AffineTransformer3};
pub use clip::{HalfSpace, NearPlane, Plane};
pub use decompose::{Decomposer2, Decomposer3};
pub use error::{GeometryError, Result};
pub use geometry::{BoundingSphere, PolygonBuffer};
pub use plane_clip::PlaneClipper;
pub use projection::{Camera, Projector};
pub use record::{Command2, Recorder2};
pub use scene::{DrawCommand, Scene};
pub use style::{AssetStyle, Cap, Color, LineStyle, PolygonStyle, SpriteId, SpriteStyle, SurfaceStyle};
pub use target::{Asset2, Asset3, Target2, Target3};
pub use tessellate::Lod;
pub use transform::{Affine2, Affine3, RotationState};
