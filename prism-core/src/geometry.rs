//! Geometry helpers shared by the tessellator and the pipeline stages
use std::ops::Range;

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{GeometryError, Result};

/// A reusable list of convex faces.
///
/// Points are stored back to back; each face is a range into the point list.
/// Stages keep one of these as scratch and clear it at the start of a call.
#[derive(Debug, Clone)]
pub struct PolygonBuffer<P> {
    points: Vec<P>,
    faces: Vec<Range<usize>>,
}

impl<P: Copy> PolygonBuffer<P> {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub fn with_capacity(points: usize, faces: usize) -> Self {
        Self {
            points: Vec::with_capacity(points),
            faces: Vec::with_capacity(faces),
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.faces.clear();
    }

    /// Append a face. Faces with fewer than three points are ignored.
    pub fn push_face(&mut self, face: &[P]) -> bool {
        self.push_face_iter(face.iter().copied())
    }

    pub fn push_face_iter(&mut self, face: impl IntoIterator<Item = P>) -> bool {
        let start = self.points.len();
        self.points.extend(face);
        if self.points.len() - start < 3 {
            self.points.truncate(start);
            return false;
        }
        self.faces.push(start..self.points.len());
        true
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn face(&self, index: usize) -> &[P] {
        &self.points[self.faces[index].clone()]
    }

    pub fn faces(&self) -> impl Iterator<Item = &[P]> + '_ {
        self.faces.iter().map(|range| &self.points[range.clone()])
    }
}

impl<P: Copy> Default for PolygonBuffer<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounding sphere used by the projector's visibility pre-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere around the centroid that contains every point.
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        let center = centroid3(points)?;
        let radius = points
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0f32, f32::max);
        Some(Self { center, radius })
    }
}

pub fn centroid3(points: &[Point3<f32>]) -> Option<Point3<f32>> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f32))
}

/// Unnormalized polygon normal (Newell's method). Zero for degenerate input.
pub fn polygon_normal(points: &[Point3<f32>]) -> Vector3<f32> {
    let mut normal = Vector3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Signed area of a 2D polygon, positive for counter-clockwise winding.
pub fn polygon_area(points: &[Point2<f32>]) -> f32 {
    let mut twice = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice * 0.5
}

pub(crate) fn ensure_finite2(points: &[Point2<f32>], call: &'static str) -> Result<()> {
    if points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFinite(call))
    }
}

pub(crate) fn ensure_finite3(points: &[Point3<f32>], call: &'static str) -> Result<()> {
    if points
        .iter()
        .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    {
        Ok(())
    } else {
        Err(GeometryError::NonFinite(call))
    }
}

/// Widths, diameters and outline widths must be finite; negative values are
/// the invisible sentinel and pass.
pub(crate) fn ensure_finite_sizes(sizes: &[f32], call: &'static str) -> Result<()> {
    if sizes.iter().all(|s| s.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFinite(call))
    }
}
