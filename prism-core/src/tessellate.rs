//! Tessellation of round and capped primitives into convex polygons
//!
//! Every function appends to a caller-owned buffer and returns how many
//! vertices (2D outlines) or faces (3D shells) it produced. Degenerate input
//! produces zero rather than an error.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::geometry::PolygonBuffer;
use crate::style::Cap;

/// Level of detail for 3D tessellation, clamped to `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lod(u8);

impl Lod {
    pub const MIN: Lod = Lod(1);
    pub const MAX: Lod = Lod(5);

    pub fn new(level: u8) -> Self {
        Lod(level.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// Number of sides of a cylinder cross-section.
    pub fn divisions(&self) -> usize {
        4 * self.0 as usize
    }
}

impl Default for Lod {
    fn default() -> Self {
        Lod(2)
    }
}

/// Number of vertices used for an ellipse `width` by `height` pixels across.
pub fn ellipse_vertex_count(width: f32, height: f32) -> usize {
    (width.max(height).ceil() as usize).max(3)
}

/// Append an ellipse outline with radii `rx`, `ry`, counter-clockwise.
pub fn ellipse(
    center: Point2<f32>,
    rx: f32,
    ry: f32,
    out: &mut Vec<Point2<f32>>,
) -> usize {
    if !(rx > 0.0 && ry > 0.0 && rx.is_finite() && ry.is_finite()) {
        return 0;
    }
    let count = ellipse_vertex_count(rx * 2.0, ry * 2.0);
    out.extend((0..count).map(|i| {
        let angle = TAU * i as f32 / count as f32;
        Point2::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
    }));
    count
}

/// Append a half-disc arc around `center`, from `-side` through `forward` to
/// `side`, excluding both ends.
fn round_cap2(
    center: Point2<f32>,
    forward: Vector2<f32>,
    side: Vector2<f32>,
    radius: f32,
    out: &mut Vec<Point2<f32>>,
) {
    let steps = ((radius.ceil() as usize).max(2)).min(64);
    for k in 1..steps {
        let angle = -FRAC_PI_2 + PI * k as f32 / steps as f32;
        out.push(center + (forward * angle.cos() + side * angle.sin()) * radius);
    }
}

fn cap2(
    cap: Cap,
    center: Point2<f32>,
    forward: Vector2<f32>,
    side: Vector2<f32>,
    radius: f32,
    out: &mut Vec<Point2<f32>>,
) {
    match cap {
        Cap::Flat => {}
        Cap::Triangle => out.push(center + forward * radius),
        Cap::Round => round_cap2(center, forward, side, radius, out),
    }
}

/// Append one convex polygon covering the thick segment `a`-`b`.
///
/// The quad is `2 * radius` wide; caps add vertices beyond either end so the
/// result stays a single convex polygon. Returns the vertex count, or zero
/// for a zero-length segment or non-positive radius.
pub fn capped_quad(
    a: Point2<f32>,
    b: Point2<f32>,
    radius: f32,
    start_cap: Cap,
    end_cap: Cap,
    out: &mut Vec<Point2<f32>>,
) -> usize {
    let axis = b - a;
    let length = axis.norm();
    if radius <= 0.0 || length <= f32::EPSILON {
        return 0;
    }
    let forward = axis / length;
    let side = Vector2::new(-forward.y, forward.x);
    let start = out.len();

    out.push(a - side * radius);
    out.push(b - side * radius);
    cap2(end_cap, b, forward, side, radius, out);
    out.push(b + side * radius);
    out.push(a + side * radius);
    cap2(start_cap, a, -forward, -side, radius, out);

    out.len() - start
}

/// Radius of a regular `divisions`-gon whose area equals a circle of `radius`.
pub fn area_corrected_radius(radius: f32, divisions: usize) -> f32 {
    let n = divisions as f32;
    (2.0 * PI * radius * radius / (n * (TAU / n).sin())).sqrt()
}

/// Append a subdivided octahedron approximating a sphere.
///
/// Each of the eight octant faces is split into `lod^2` triangles whose
/// vertices are pushed onto the sphere. Faces wind counter-clockwise seen
/// from outside. Returns the number of faces added.
pub fn sphere(
    center: Point3<f32>,
    radius: f32,
    lod: Lod,
    out: &mut PolygonBuffer<Point3<f32>>,
) -> usize {
    if radius <= 0.0 {
        return 0;
    }
    let n = lod.level() as usize;
    let before = out.face_count();

    for &sx in &[1.0f32, -1.0] {
        for &sy in &[1.0f32, -1.0] {
            for &sz in &[1.0f32, -1.0] {
                let c0 = Vector3::new(sx, 0.0, 0.0);
                let (mut c1, mut c2) = (Vector3::new(0.0, sy, 0.0), Vector3::new(0.0, 0.0, sz));
                if sx * sy * sz < 0.0 {
                    std::mem::swap(&mut c1, &mut c2);
                }
                let grid = |i: usize, j: usize| -> Point3<f32> {
                    let w0 = (n - i - j) as f32;
                    let dir = (c0 * w0 + c1 * i as f32 + c2 * j as f32).normalize();
                    center + dir * radius
                };
                for i in 0..n {
                    for j in 0..(n - i) {
                        out.push_face(&[grid(i, j), grid(i + 1, j), grid(i, j + 1)]);
                        if i + j + 1 < n {
                            out.push_face(&[grid(i + 1, j), grid(i + 1, j + 1), grid(i, j + 1)]);
                        }
                    }
                }
            }
        }
    }

    out.face_count() - before
}

/// Parameters for [`cylinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderParams {
    pub lod: Lod,
    pub start_cap: Cap,
    pub end_cap: Cap,
    /// Flip every face's winding, used for outline shells.
    pub inside_out: bool,
}

fn ring(
    center: Point3<f32>,
    u: Vector3<f32>,
    v: Vector3<f32>,
    radius: f32,
    divisions: usize,
) -> Vec<Point3<f32>> {
    (0..divisions)
        .map(|i| {
            let angle = TAU * i as f32 / divisions as f32;
            center + (u * angle.cos() + v * angle.sin()) * radius
        })
        .collect()
}

fn push_oriented(out: &mut PolygonBuffer<Point3<f32>>, face: &mut [Point3<f32>], flip: bool) {
    if flip {
        face.reverse();
    }
    out.push_face(face);
}

/// Cap one end of a cylinder. `outward` points away from the body and
/// `base` is the end ring wound counter-clockwise around `outward`.
#[allow(clippy::too_many_arguments)]
fn cap3(
    cap: Cap,
    center: Point3<f32>,
    base: &[Point3<f32>],
    outward: Vector3<f32>,
    u: Vector3<f32>,
    v: Vector3<f32>,
    radius: f32,
    flip: bool,
    out: &mut PolygonBuffer<Point3<f32>>,
) {
    let n = base.len();
    match cap {
        Cap::Flat => {}
        Cap::Triangle => {
            for i in 0..n {
                push_oriented(out, &mut [center, base[i], base[(i + 1) % n]], flip);
            }
        }
        Cap::Round => {
            let mid_center = center + outward * (radius * FRAC_PI_4.sin());
            let mid = ring(mid_center, u, v, radius * FRAC_PI_4.cos(), n);
            let apex = center + outward * radius;
            for i in 0..n {
                let j = (i + 1) % n;
                push_oriented(out, &mut [base[i], base[j], mid[j], mid[i]], flip);
                push_oriented(out, &mut [mid[i], mid[j], apex], flip);
            }
        }
    }
}

/// Append a capped cylinder (or cone, when the radii differ) from `a` to `b`.
///
/// End radii are corrected so each cross-section has the area of the ideal
/// circle. Segments shorter than a tenth of the larger radius collapse to a
/// sphere at the midpoint. Returns the number of faces added.
pub fn cylinder(
    a: Point3<f32>,
    radius_a: f32,
    b: Point3<f32>,
    radius_b: f32,
    params: &CylinderParams,
    out: &mut PolygonBuffer<Point3<f32>>,
) -> usize {
    let max_radius = radius_a.max(radius_b);
    if max_radius <= 0.0 {
        return 0;
    }
    let axis = b - a;
    let length = axis.norm();
    if length <= 0.1 * max_radius {
        return sphere(nalgebra::center(&a, &b), max_radius, params.lod, out);
    }

    let forward = axis / length;
    let helper = if forward.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = forward.cross(&helper).normalize();
    let v = forward.cross(&u);
    // (u, v, forward) is right-handed: u x v = forward.

    let divisions = params.lod.divisions();
    let ra = area_corrected_radius(radius_a.max(0.0), divisions);
    let rb = area_corrected_radius(radius_b.max(0.0), divisions);
    let ring_a = ring(a, u, v, ra, divisions);
    let ring_b = ring(b, u, v, rb, divisions);
    let flip = params.inside_out;
    let before = out.face_count();

    for i in 0..divisions {
        let j = (i + 1) % divisions;
        push_oriented(out, &mut [ring_a[i], ring_a[j], ring_b[j], ring_b[i]], flip);
    }

    // The start ring is clockwise around -forward, so swap the basis to keep
    // cap faces wound outward.
    let ring_a_rev: Vec<_> = (0..divisions)
        .map(|i| ring_a[(divisions - i) % divisions])
        .collect();
    if ra > 0.0 {
        cap3(params.start_cap, a, &ring_a_rev, -forward, u, -v, ra, flip, out);
    }
    if rb > 0.0 {
        cap3(params.end_cap, b, &ring_b, forward, u, v, rb, flip, out);
    }

    out.face_count() - before
}
