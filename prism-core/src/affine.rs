//! Affine transformer stages
//!
//! Points are transformed exactly; widths and diameters are multiplied by
//! the transform's size scale. Under shear or non-uniform scale that is an
//! approximation.

use nalgebra::{Point2, Point3};

use crate::error::Result;
use crate::geometry::{ensure_finite2, ensure_finite3};
use crate::style::{
    scale_width, AssetStyle, LineStyle, PolygonStyle, SpriteStyle, SurfaceStyle,
};
use crate::target::{Asset2, Asset3, Target2, Target3};
use crate::transform::{Affine2, Affine3};

/// Applies a fixed 2D affine transform, then forwards to `target`.
pub struct AffineTransformer2<T> {
    xform: Affine2,
    inverse: Affine2,
    size_scale: f32,
    target: T,
    scratch: Vec<Point2<f32>>,
}

impl<T: Target2> AffineTransformer2<T> {
    pub fn new(xform: Affine2, target: T) -> Result<Self> {
        let inverse = xform.inverse()?;
        Ok(Self {
            xform,
            inverse,
            size_scale: xform.size_scale(),
            target,
            scratch: Vec::new(),
        })
    }

    pub fn transform(&self) -> &Affine2 {
        &self.xform
    }

    pub fn size_scale(&self) -> f32 {
        self.size_scale
    }

    /// Map a downstream point back into this stage's input space.
    pub fn inverse_point(&self, point: &Point2<f32>) -> Point2<f32> {
        self.inverse.transform_point(point)
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    fn load(&mut self, points: &[Point2<f32>]) {
        self.scratch.clear();
        let xform = self.xform;
        self.scratch
            .extend(points.iter().map(|p| xform.transform_point(p)));
    }
}

impl<T: Target2> Target2 for AffineTransformer2<T> {
    fn draw_asset(
        &mut self,
        xform: &Affine2,
        asset: &dyn Asset2,
        style: &AssetStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        self.target.draw_asset(&(self.xform * *xform), asset, style)
    }

    fn draw_lines(
        &mut self,
        points: &[Point2<f32>],
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite2(points, "draw_lines")?;
        self.load(points);
        let diameter = scale_width(diameter, self.size_scale);
        self.target
            .draw_lines(&self.scratch, diameter, &style.scaled(self.size_scale))
    }

    fn draw_ellipse(
        &mut self,
        center: Point2<f32>,
        width: f32,
        height: f32,
        style: &PolygonStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite2(&[center], "draw_ellipse")?;
        self.target.draw_ellipse(
            self.xform.transform_point(&center),
            scale_width(width, self.size_scale),
            scale_width(height, self.size_scale),
            &style.scaled(self.size_scale),
        )
    }

    fn draw_polygon(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite2(points, "draw_polygon")?;
        self.load(points);
        self.target
            .draw_polygon(&self.scratch, &style.scaled(self.size_scale))
    }

    fn draw_sprite(&mut self, xform: &Affine2, style: &SpriteStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        self.target.draw_sprite(&(self.xform * *xform), style)
    }
}

/// Applies a fixed 3D affine transform, then forwards to `target`.
pub struct AffineTransformer3<T> {
    xform: Affine3,
    inverse: Affine3,
    size_scale: f32,
    target: T,
    scratch: Vec<Point3<f32>>,
}

impl<T: Target3> AffineTransformer3<T> {
    pub fn new(xform: Affine3, target: T) -> Result<Self> {
        let inverse = xform.inverse()?;
        Ok(Self {
            xform,
            inverse,
            size_scale: xform.size_scale(),
            target,
            scratch: Vec::new(),
        })
    }

    pub fn transform(&self) -> &Affine3 {
        &self.xform
    }

    pub fn size_scale(&self) -> f32 {
        self.size_scale
    }

    pub fn inverse_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.inverse.transform_point(point)
    }

    pub fn into_inner(self) -> T {
        self.target
    }
}

impl<T: Target3> Target3 for AffineTransformer3<T> {
    fn draw_asset(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        self.target.draw_asset(&(self.xform * *xform), asset, style)
    }

    fn draw_segment(
        &mut self,
        a: Point3<f32>,
        b: Point3<f32>,
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite3(&[a, b], "draw_segment")?;
        self.target.draw_segment(
            self.xform.transform_point(&a),
            self.xform.transform_point(&b),
            scale_width(diameter, self.size_scale),
            &style.scaled(self.size_scale),
        )
    }

    fn draw_sphere(
        &mut self,
        center: Point3<f32>,
        diameter: f32,
        style: &SurfaceStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite3(&[center], "draw_sphere")?;
        self.target.draw_sphere(
            self.xform.transform_point(&center),
            scale_width(diameter, self.size_scale),
            &style.scaled(self.size_scale),
        )
    }

    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite3(points, "draw_surface")?;
        self.scratch.clear();
        let xform = self.xform;
        self.scratch
            .extend(points.iter().map(|p| xform.transform_point(p)));
        self.target
            .draw_surface(&self.scratch, &style.scaled(self.size_scale))
    }
}
