//! 2D and 3D affine transforms and rotation state
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

use crate::error::{GeometryError, Result};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotation as an affine transform, applied in order Z, Y, X
    pub fn to_affine(&self) -> Affine3 {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));
        Affine3 { matrix: rz * ry * rx }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

fn invertible2(matrix: &Matrix3<f32>) -> bool {
    matrix
        .try_inverse()
        .is_some_and(|inverse| inverse.iter().all(|v| v.is_finite()))
}

fn invertible3(matrix: &Matrix4<f32>) -> bool {
    matrix
        .try_inverse()
        .is_some_and(|inverse| inverse.iter().all(|v| v.is_finite()))
}

/// A 2D affine transform stored as a 3x3 matrix whose last row is `[0, 0, 1]`.
///
/// Always invertible: every constructor that could produce a singular matrix
/// returns [`GeometryError::NonInvertible`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    matrix: Matrix3<f32>,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Wrap a matrix, checking that it is affine and invertible.
    pub fn new(matrix: Matrix3<f32>) -> Result<Self> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("Affine2::new"));
        }
        if matrix[(2, 0)] != 0.0 || matrix[(2, 1)] != 0.0 || matrix[(2, 2)] != 1.0 {
            return Err(GeometryError::NonInvertible);
        }
        if !invertible2(&matrix) {
            return Err(GeometryError::NonInvertible);
        }
        Ok(Self { matrix })
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            matrix: Matrix3::new_translation(&Vector2::new(x, y)),
        }
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotation(angle: f32) -> Self {
        Self {
            matrix: Matrix3::new_rotation(angle),
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Result<Self> {
        Self::new(Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy)))
    }

    /// Aspect-preserving fit of `virtual_size` content into `physical_size`.
    ///
    /// The content is scaled by `min(sx, sy)`. `anchor` places the leftover
    /// space: `(0, 0)` pins the content to the origin, `(0.5, 0.5)` (the
    /// default) centers it.
    pub fn fit(
        physical_size: Vector2<f32>,
        virtual_size: Vector2<f32>,
        anchor: Option<Point2<f32>>,
    ) -> Result<Self> {
        let sx = physical_size.x / virtual_size.x;
        let sy = physical_size.y / virtual_size.y;
        let scale = sx.min(sy);
        let anchor = anchor.unwrap_or_else(|| Point2::new(0.5, 0.5));
        let slack = physical_size - virtual_size * scale;
        let offset = Vector2::new(slack.x * anchor.x, slack.y * anchor.y);
        Ok(Self::scaling(scale, scale)?.then(&Self::translation(offset.x, offset.y)))
    }

    /// Maps normalized device coordinates (`[-1, 1]`, y up) to pixels (y down).
    pub fn viewport(width: f32, height: f32) -> Result<Self> {
        Self::new(Matrix3::new(
            width * 0.5,
            0.0,
            width * 0.5,
            0.0,
            -height * 0.5,
            height * 0.5,
            0.0,
            0.0,
            1.0,
        ))
    }

    /// Combine two transforms (self then other).
    pub fn then(&self, other: &Affine2) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    pub fn transform_point(&self, point: &Point2<f32>) -> Point2<f32> {
        self.matrix.transform_point(point)
    }

    pub fn transform_vector(&self, vector: &Vector2<f32>) -> Vector2<f32> {
        self.matrix.transform_vector(vector)
    }

    pub fn inverse(&self) -> Result<Self> {
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or(GeometryError::NonInvertible)
    }

    /// Uniform factor applied to widths and diameters: the length of the
    /// transformed unit X axis.
    pub fn size_scale(&self) -> f32 {
        self.transform_vector(&Vector2::x()).norm()
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.matrix
    }
}

impl std::ops::Mul for Affine2 {
    type Output = Affine2;

    /// `a * b` applies `b` first.
    fn mul(self, rhs: Affine2) -> Affine2 {
        Affine2 {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

/// A 3D affine transform stored as a 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine3 {
    matrix: Matrix4<f32>,
}

impl Default for Affine3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine3 {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn new(matrix: Matrix4<f32>) -> Result<Self> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("Affine3::new"));
        }
        if matrix[(3, 0)] != 0.0
            || matrix[(3, 1)] != 0.0
            || matrix[(3, 2)] != 0.0
            || matrix[(3, 3)] != 1.0
        {
            return Err(GeometryError::NonInvertible);
        }
        if !invertible3(&matrix) {
            return Err(GeometryError::NonInvertible);
        }
        Ok(Self { matrix })
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vector3::new(x, y, z)),
        }
    }

    /// Rotation by `axis_angle` (axis scaled by the angle in radians).
    pub fn rotation(axis_angle: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_rotation(axis_angle),
        }
    }

    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Result<Self> {
        Self::new(Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    pub fn uniform_scaling(scale: f32) -> Result<Self> {
        Self::scaling(scale, scale, scale)
    }

    /// Combine two transforms (self then other).
    pub fn then(&self, other: &Affine3) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.matrix.transform_point(point)
    }

    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.transform_vector(vector)
    }

    pub fn inverse(&self) -> Result<Self> {
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or(GeometryError::NonInvertible)
    }

    pub fn size_scale(&self) -> f32 {
        self.transform_vector(&Vector3::x()).norm()
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }
}

impl std::ops::Mul for Affine3 {
    type Output = Affine3;

    fn mul(self, rhs: Affine3) -> Affine3 {
        Affine3 {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        let affine = rotation.to_affine();
        assert!((affine.matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_affine2_round_trip() {
        let xform = Affine2::rotation(0.7)
            .then(&Affine2::scaling(2.0, 3.0).unwrap())
            .then(&Affine2::translation(-4.0, 9.5));
        let inverse = xform.inverse().unwrap();
        let p = Point2::new(12.5, -3.25);
        let back = inverse.transform_point(&xform.transform_point(&p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-4);
    }

    #[test]
    fn test_affine3_round_trip() {
        let xform = RotationState::new(0.3, -1.1, 2.0)
            .to_affine()
            .then(&Affine3::uniform_scaling(0.5).unwrap())
            .then(&Affine3::translation(1.0, 2.0, 3.0));
        let inverse = xform.inverse().unwrap();
        let p = Point3::new(-7.0, 0.25, 4.0);
        let back = inverse.transform_point(&xform.transform_point(&p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-4);
    }

    #[test]
    fn test_singular_transforms_rejected() {
        assert_eq!(Affine2::scaling(0.0, 1.0), Err(GeometryError::NonInvertible));
        assert_eq!(
            Affine3::scaling(1.0, 0.0, 1.0),
            Err(GeometryError::NonInvertible)
        );
        assert!(matches!(
            Affine2::new(Matrix3::from_element(f32::NAN)),
            Err(GeometryError::NonFinite(_))
        ));
    }

    #[test]
    fn test_small_scales_are_invertible() {
        let small = Affine3::uniform_scaling(0.004).unwrap();
        assert_relative_eq!(small.size_scale(), 0.004);
        let back = small.inverse().unwrap();
        assert_relative_eq!(back.size_scale(), 250.0, max_relative = 1e-4);

        assert!(Affine2::scaling(1e-4, 1e-4).is_ok());

        let fit = Affine2::fit(Vector2::new(100.0, 100.0), Vector2::new(1e6, 1e6), None).unwrap();
        assert_relative_eq!(fit.size_scale(), 1e-4, max_relative = 1e-4);
        let corner = fit.transform_point(&Point2::new(1e6, 1e6));
        assert_relative_eq!(corner.x, 100.0, max_relative = 1e-4);
    }

    #[test]
    fn test_fit_uses_smaller_scale() {
        let fit = Affine2::fit(Vector2::new(200.0, 100.0), Vector2::new(100.0, 100.0), None).unwrap();
        assert_relative_eq!(fit.size_scale(), 1.0);
        // Centered horizontally in the 100px of slack.
        let origin = fit.transform_point(&Point2::origin());
        assert_relative_eq!(origin.x, 50.0);
        assert_relative_eq!(origin.y, 0.0);

        let pinned = Affine2::fit(
            Vector2::new(200.0, 100.0),
            Vector2::new(100.0, 100.0),
            Some(Point2::origin()),
        )
        .unwrap();
        assert_relative_eq!(pinned.transform_point(&Point2::origin()).x, 0.0);
    }

    #[test]
    fn test_viewport_maps_ndc_corners() {
        let viewport = Affine2::viewport(100.0, 50.0).unwrap();
        let top_left = viewport.transform_point(&Point2::new(-1.0, 1.0));
        let center = viewport.transform_point(&Point2::origin());
        assert_relative_eq!(top_left.x, 0.0);
        assert_relative_eq!(top_left.y, 0.0);
        assert_relative_eq!(center.x, 50.0);
        assert_relative_eq!(center.y, 25.0);
    }

    #[test]
    fn test_size_scale_follows_x_axis() {
        let xform = Affine3::uniform_scaling(3.0)
            .unwrap()
            .then(&Affine3::rotation(Vector3::new(0.0, 0.0, 1.2)));
        assert_relative_eq!(xform.size_scale(), 3.0, epsilon = 1e-5);
    }
}
