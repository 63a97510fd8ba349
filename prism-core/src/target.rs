//! Capability traits every pipeline stage and sink implements
//!
//! A stage is a target that forwards to another target. Stages are composed
//! by nesting, e.g. `Decomposer3 -> PlaneClipper -> Projector -> sink`.
//!
//! A convex, planar point sequence of three or more points is the one call
//! every stage can always emit. Two points degenerate to a line and fewer
//! than two are a no-op.

use nalgebra::{Point2, Point3};

use crate::error::Result;
use crate::geometry::BoundingSphere;
use crate::style::{AssetStyle, LineStyle, PolygonStyle, SpriteStyle, SurfaceStyle};
use crate::transform::{Affine2, Affine3};

/// A 2D drawing target.
pub trait Target2 {
    fn draw_asset(
        &mut self,
        xform: &Affine2,
        asset: &dyn Asset2,
        style: &AssetStyle,
    ) -> Result<()>;

    /// Polyline through `points`. `diameter <= 0` requests a hairline.
    fn draw_lines(
        &mut self,
        points: &[Point2<f32>],
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()>;

    /// Axis-aligned ellipse with full `width` and `height`.
    fn draw_ellipse(
        &mut self,
        center: Point2<f32>,
        width: f32,
        height: f32,
        style: &PolygonStyle,
    ) -> Result<()>;

    /// Convex polygon.
    fn draw_polygon(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()>;

    /// Sprite whose unit square is placed by `xform`.
    fn draw_sprite(&mut self, xform: &Affine2, style: &SpriteStyle) -> Result<()>;
}

/// A 3D drawing target.
pub trait Target3 {
    fn draw_asset(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()>;

    fn draw_segment(
        &mut self,
        a: Point3<f32>,
        b: Point3<f32>,
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()>;

    fn draw_sphere(
        &mut self,
        center: Point3<f32>,
        diameter: f32,
        style: &SurfaceStyle,
    ) -> Result<()>;

    /// Convex planar surface.
    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()>;
}

/// Reusable 2D content that can replay itself into any target.
pub trait Asset2 {
    fn replay(&self, target: &mut dyn Target2, style: &AssetStyle) -> Result<()>;
}

/// Reusable 3D content that can replay itself into any target.
pub trait Asset3 {
    fn replay(&self, target: &mut dyn Target3, style: &AssetStyle) -> Result<()>;

    /// Local-space bounding sphere, used to skip clipping work for assets
    /// entirely in front of the camera.
    fn bounding_sphere(&self) -> Option<BoundingSphere> {
        None
    }
}

impl<T: Target2 + ?Sized> Target2 for &mut T {
    fn draw_asset(
        &mut self,
        xform: &Affine2,
        asset: &dyn Asset2,
        style: &AssetStyle,
    ) -> Result<()> {
        (**self).draw_asset(xform, asset, style)
    }

    fn draw_lines(
        &mut self,
        points: &[Point2<f32>],
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        (**self).draw_lines(points, diameter, style)
    }

    fn draw_ellipse(
        &mut self,
        center: Point2<f32>,
        width: f32,
        height: f32,
        style: &PolygonStyle,
    ) -> Result<()> {
        (**self).draw_ellipse(center, width, height, style)
    }

    fn draw_polygon(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()> {
        (**self).draw_polygon(points, style)
    }

    fn draw_sprite(&mut self, xform: &Affine2, style: &SpriteStyle) -> Result<()> {
        (**self).draw_sprite(xform, style)
    }
}

impl<T: Target3 + ?Sized> Target3 for &mut T {
    fn draw_asset(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()> {
        (**self).draw_asset(xform, asset, style)
    }

    fn draw_segment(
        &mut self,
        a: Point3<f32>,
        b: Point3<f32>,
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        (**self).draw_segment(a, b, diameter, style)
    }

    fn draw_sphere(
        &mut self,
        center: Point3<f32>,
        diameter: f32,
        style: &SurfaceStyle,
    ) -> Result<()> {
        (**self).draw_sphere(center, diameter, style)
    }

    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        (**self).draw_surface(points, style)
    }
}
