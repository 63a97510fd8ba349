//! Half-space clipping for segments and convex polygons
//!
//! One plane at a time (Sutherland-Hodgman). The same functions serve the
//! projector's homogeneous near plane and the 3D plane clipper; they only
//! need a signed distance and a way to interpolate vertices.

use nalgebra::{Point2, Point3, Vector3, Vector4};

/// Vertex types that can be linearly interpolated.
pub trait Interpolate: Copy {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for Point2<f32> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Point3<f32> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vector4<f32> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// A half-space. Non-negative distance is inside and survives clipping.
pub trait HalfSpace<V> {
    fn signed_distance(&self, vertex: &V) -> f32;
}

/// The plane `normal . p + offset = 0`; the side the normal points to is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// The same plane with a unit normal, so signed distances are Euclidean.
    /// `None` for a zero or non-finite normal.
    pub fn normalized(&self) -> Option<Self> {
        let length = self.normal.norm();
        if !(length.is_finite() && length > 0.0 && self.offset.is_finite()) {
            return None;
        }
        Some(Self {
            normal: self.normal / length,
            offset: self.offset / length,
        })
    }
}

impl HalfSpace<Point3<f32>> for Plane {
    fn signed_distance(&self, vertex: &Point3<f32>) -> f32 {
        self.normal.dot(&vertex.coords) + self.offset
    }
}

/// The homogeneous near plane `w >= near`.
///
/// For a perspective matrix whose last row is `(0, 0, 1, 0)`, `w` is the view
/// depth, so this keeps everything at least `near` in front of the camera and
/// guarantees the perspective divide is safe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearPlane {
    pub near: f32,
}

impl HalfSpace<Vector4<f32>> for NearPlane {
    fn signed_distance(&self, vertex: &Vector4<f32>) -> f32 {
        vertex.w - self.near
    }
}

/// Clip the segment `a`-`b`. Returns `None` when nothing is left.
pub fn clip_segment<V, H>(plane: &H, a: V, b: V) -> Option<(V, V)>
where
    V: Interpolate,
    H: HalfSpace<V>,
{
    let da = plane.signed_distance(&a);
    let db = plane.signed_distance(&b);
    match (da >= 0.0, db >= 0.0) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (true, false) => Some((a, a.lerp(&b, da / (da - db)))),
        (false, true) => Some((a.lerp(&b, da / (da - db)), b)),
    }
}

/// Clip a convex polygon, writing the survivors to `output`.
///
/// Returns the number of vertices written. Results with fewer than three
/// vertices are discarded and reported as zero. Vertices lying exactly on
/// the plane are kept without inserting duplicate crossing points, and a
/// polygon entirely inside comes back vertex for vertex.
pub fn clip_polygon<V, H>(plane: &H, input: &[V], output: &mut Vec<V>) -> usize
where
    V: Interpolate,
    H: HalfSpace<V>,
{
    output.clear();
    if input.len() < 3 {
        return 0;
    }
    output.reserve(input.len() * 2);

    let mut prev = input[input.len() - 1];
    let mut prev_d = plane.signed_distance(&prev);
    for &cur in input {
        let cur_d = plane.signed_distance(&cur);
        if cur_d >= 0.0 {
            if prev_d < 0.0 && cur_d > 0.0 {
                output.push(prev.lerp(&cur, prev_d / (prev_d - cur_d)));
            }
            output.push(cur);
        } else if prev_d > 0.0 {
            output.push(prev.lerp(&cur, prev_d / (prev_d - cur_d)));
        }
        prev = cur;
        prev_d = cur_d;
    }

    if output.len() < 3 {
        output.clear();
    }
    output.len()
}

/// True when every vertex is strictly inside, so clipping can be skipped.
pub fn all_inside<V, H: HalfSpace<V>>(plane: &H, vertices: &[V]) -> bool {
    vertices.iter().all(|v| plane.signed_distance(v) > 0.0)
}
