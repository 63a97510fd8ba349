//! Decomposer stages: curved and composite calls become convex polygons
//!
//! Downstream of a decomposer only polygons/surfaces, hairlines and sprites
//! arrive. Outlines are emitted as separate polygons in the outline color,
//! so a sink never has to stroke anything.

use nalgebra::{Point2, Point3};

use crate::affine::{AffineTransformer2, AffineTransformer3};
use crate::error::Result;
use crate::geometry::{
    ensure_finite2, ensure_finite3, ensure_finite_sizes, polygon_normal, PolygonBuffer,
};
use crate::style::{
    AssetStyle, Cap, Color, LineStyle, PolygonStyle, SpriteStyle, SurfaceStyle,
};
use crate::target::{Asset2, Asset3, Target2, Target3};
use crate::tessellate::{self, CylinderParams, Lod};
use crate::transform::{Affine2, Affine3};

fn solid_polygon(color: Color) -> PolygonStyle {
    PolygonStyle::fill(color)
}

fn solid_surface(color: Color, double_sided: bool) -> SurfaceStyle {
    SurfaceStyle::fill(color).double_sided(double_sided)
}

/// Reduces 2D calls to polygons, hairlines and sprites.
pub struct Decomposer2<T> {
    target: T,
    scratch: Vec<Point2<f32>>,
}

impl<T: Target2> Decomposer2<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            scratch: Vec::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    /// Emit one capped quad per segment of the polyline.
    fn thick_lines(
        &mut self,
        points: &[Point2<f32>],
        radius: f32,
        style: &LineStyle,
        color: Color,
    ) -> Result<()> {
        if radius <= 0.0 || !color.is_visible() {
            return Ok(());
        }
        let last = points.len() - 2;
        let fill = solid_polygon(color);
        for (i, pair) in points.windows(2).enumerate() {
            let start_cap = if i == 0 { style.start_cap } else { Cap::Flat };
            let end_cap = if i == last { style.end_cap } else { Cap::Flat };
            self.scratch.clear();
            if tessellate::capped_quad(pair[0], pair[1], radius, start_cap, end_cap, &mut self.scratch) == 0 {
                log::trace!("skipping zero-length line segment");
                continue;
            }
            self.target.draw_polygon(&self.scratch, &fill)?;
        }
        Ok(())
    }

    /// One independent quad per edge, square-extended so corners overlap.
    fn polygon_outline(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()> {
        let radius = style.outline_width * 0.5;
        let outline = solid_polygon(style.outline);
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let edge = b - a;
            let length = edge.norm();
            if length <= f32::EPSILON {
                continue;
            }
            let extend = edge * (radius / length);
            self.scratch.clear();
            if tessellate::capped_quad(a - extend, b + extend, radius, Cap::Flat, Cap::Flat, &mut self.scratch) > 0 {
                self.target.draw_polygon(&self.scratch, &outline)?;
            }
        }
        Ok(())
    }
}

impl<T: Target2> Target2 for Decomposer2<T> {
    fn draw_asset(
        &mut self,
        xform: &Affine2,
        asset: &dyn Asset2,
        style: &AssetStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        let mut placed = AffineTransformer2::new(*xform, &mut *self)?;
        asset.replay(&mut placed, style)
    }

    fn draw_lines(
        &mut self,
        points: &[Point2<f32>],
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        if points.len() < 2 || !style.is_visible() {
            return Ok(());
        }
        ensure_finite2(points, "draw_lines")?;
        ensure_finite_sizes(&[diameter, style.outline_width], "draw_lines")?;

        if diameter <= 0.0 {
            for pair in points.windows(2) {
                if pair[0] != pair[1] {
                    self.target.draw_lines(pair, diameter, style)?;
                }
            }
            return Ok(());
        }

        let radius = diameter * 0.5;
        if style.has_outline() {
            let half = style.outline_width * 0.5;
            self.thick_lines(points, radius + half, style, style.outline)?;
            self.thick_lines(points, radius - half, style, style.color)
        } else {
            self.thick_lines(points, radius, style, style.color)
        }
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
        ensure_finite_sizes(&[width, height, style.outline_width], "draw_ellipse")?;

        let (rx, ry) = (width * 0.5, height * 0.5);
        let half = if style.has_outline() {
            self.scratch.clear();
            let half = style.outline_width * 0.5;
            if tessellate::ellipse(center, rx + half, ry + half, &mut self.scratch) > 0 {
                self.target
                    .draw_polygon(&self.scratch, &solid_polygon(style.outline))?;
            }
            half
        } else {
            0.0
        };

        if style.fill.is_visible() {
            self.scratch.clear();
            if tessellate::ellipse(center, rx - half, ry - half, &mut self.scratch) > 0 {
                self.target
                    .draw_polygon(&self.scratch, &solid_polygon(style.fill))?;
            }
        }
        Ok(())
    }

    fn draw_polygon(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        match points.len() {
            0 | 1 => return Ok(()),
            2 => {
                let width = style.outline_width.max(0.0);
                return self.draw_lines(points, width, &style.as_line_style());
            }
            _ => {}
        }
        ensure_finite2(points, "draw_polygon")?;
        ensure_finite_sizes(&[style.outline_width], "draw_polygon")?;

        if style.fill.is_visible() {
            self.target.draw_polygon(points, &solid_polygon(style.fill))?;
        }
        if style.has_outline() {
            self.polygon_outline(points, style)?;
        }
        Ok(())
    }

    fn draw_sprite(&mut self, xform: &Affine2, style: &SpriteStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        self.target.draw_sprite(xform, style)
    }
}

/// Reduces 3D calls to surfaces and hairline segments.
pub struct Decomposer3<T> {
    target: T,
    lod: Lod,
    faces: PolygonBuffer<Point3<f32>>,
}

impl<T: Target3> Decomposer3<T> {
    pub fn new(target: T) -> Self {
        Self::with_lod(target, Lod::default())
    }

    pub fn with_lod(target: T, lod: Lod) -> Self {
        Self {
            target,
            lod,
            faces: PolygonBuffer::new(),
        }
    }

    pub fn lod(&self) -> Lod {
        self.lod
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    fn flush(&mut self, style: &SurfaceStyle) -> Result<()> {
        for face in self.faces.faces() {
            self.target.draw_surface(face, style)?;
        }
        self.faces.clear();
        Ok(())
    }

    fn cylinder_shell(
        &mut self,
        a: Point3<f32>,
        b: Point3<f32>,
        radius: f32,
        style: &LineStyle,
        color: Color,
        inside_out: bool,
    ) -> Result<()> {
        if radius <= 0.0 || !color.is_visible() {
            return Ok(());
        }
        let params = CylinderParams {
            lod: self.lod,
            start_cap: style.start_cap,
            end_cap: style.end_cap,
            inside_out,
        };
        self.faces.clear();
        tessellate::cylinder(a, radius, b, radius, &params, &mut self.faces);
        self.flush(&solid_surface(color, true))
    }

    fn sphere_shell(
        &mut self,
        center: Point3<f32>,
        radius: f32,
        color: Color,
        double_sided: bool,
    ) -> Result<()> {
        if radius <= 0.0 || !color.is_visible() {
            return Ok(());
        }
        self.faces.clear();
        tessellate::sphere(center, radius, self.lod, &mut self.faces);
        self.flush(&solid_surface(color, double_sided))
    }

    fn surface_outline(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        let normal = polygon_normal(points);
        let Some(normal) = normal.try_normalize(f32::EPSILON) else {
            log::trace!("degenerate surface, outline skipped");
            return Ok(());
        };
        let radius = style.outline_width * 0.5;
        self.faces.clear();
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let edge = b - a;
            let length = edge.norm();
            if length <= f32::EPSILON {
                continue;
            }
            let along = edge * (radius / length);
            let side = normal.cross(&edge).normalize() * radius;
            let (a, b) = (a - along, b + along);
            self.faces
                .push_face(&[a - side, b - side, b + side, a + side]);
        }
        self.flush(&solid_surface(style.outline, style.double_sided))
    }
}

impl<T: Target3> Target3 for Decomposer3<T> {
    fn draw_asset(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        let mut placed = AffineTransformer3::new(*xform, &mut *self)?;
        asset.replay(&mut placed, style)
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
        ensure_finite_sizes(&[diameter, style.outline_width], "draw_segment")?;

        if diameter <= 0.0 {
            if a == b {
                return Ok(());
            }
            return self.target.draw_segment(a, b, diameter, style);
        }

        let radius = diameter * 0.5;
        if style.has_outline() {
            let half = style.outline_width * 0.5;
            self.cylinder_shell(a, b, radius + half, style, style.outline, true)?;
            self.cylinder_shell(a, b, radius - half, style, style.color, false)
        } else {
            self.cylinder_shell(a, b, radius, style, style.color, false)
        }
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
        ensure_finite_sizes(&[diameter, style.outline_width], "draw_sphere")?;

        let radius = diameter * 0.5;
        let half = if style.has_outline() {
            let half = style.outline_width * 0.5;
            self.sphere_shell(center, radius + half, style.outline, style.double_sided)?;
            half
        } else {
            0.0
        };
        self.sphere_shell(center, radius - half, style.fill, style.double_sided)
    }

    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        match points.len() {
            0 | 1 => return Ok(()),
            2 => {
                let width = style.outline_width.max(0.0);
                return self.draw_segment(points[0], points[1], width, &style.as_line_style());
            }
            _ => {}
        }
        ensure_finite3(points, "draw_surface")?;
        ensure_finite_sizes(&[style.outline_width], "draw_surface")?;

        if style.fill.is_visible() {
            self.target
                .draw_surface(points, &solid_surface(style.fill, style.double_sided))?;
        }
        if style.has_outline() {
            self.surface_outline(points, style)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::record::{Command2, Recorder2};
    use crate::scene::{DrawCommand, Scene};
    use approx::assert_relative_eq;

    fn polygons(recorder: &Recorder2) -> Vec<(Vec<Point2<f32>>, PolygonStyle)> {
        recorder
            .polygons()
            .map(|(points, style)| (points.to_vec(), *style))
            .collect()
    }

    #[test]
    fn test_colinear_polyline_gives_two_quads() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(20.0, 0.0),
        ];
        stage
            .draw_lines(&points, 4.0, &LineStyle::solid(Color::WHITE))
            .unwrap();
        let recorder = stage.into_inner();
        assert_eq!(recorder.len(), 2);
        for (points, style) in polygons(&recorder) {
            assert_eq!(points.len(), 4);
            assert_eq!(style.fill, Color::WHITE);
        }
    }

    #[test]
    fn test_caps_only_on_polyline_ends() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(20.0, 0.0),
        ];
        let style = LineStyle::solid(Color::WHITE).with_caps(Cap::Triangle, Cap::Triangle);
        stage.draw_lines(&points, 4.0, &style).unwrap();
        let lens: Vec<usize> = polygons(&stage.into_inner())
            .iter()
            .map(|(p, _)| p.len())
            .collect();
        assert_eq!(lens, vec![5, 5]);
    }

    #[test]
    fn test_hairlines_pass_through_raw() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(20.0, 5.0),
        ];
        stage
            .draw_lines(&points, 0.0, &LineStyle::solid(Color::WHITE))
            .unwrap();
        stage
            .draw_lines(&points, -1.0, &LineStyle::solid(Color::WHITE))
            .unwrap();
        let recorder = stage.into_inner();
        assert_eq!(recorder.polygons().count(), 0);
        assert_eq!(recorder.len(), 4);
        assert!(recorder
            .commands()
            .iter()
            .all(|c| matches!(c, Command2::Lines { points, .. } if points.len() == 2)));
    }

    #[test]
    fn test_ellipse_outline_then_fill() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let style = PolygonStyle::fill(Color::WHITE).with_outline(Color::BLACK, 2.0);
        stage
            .draw_ellipse(Point2::new(0.0, 0.0), 10.0, 6.0, &style)
            .unwrap();
        let polys = polygons(&stage.into_inner());
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[0].1.fill, Color::BLACK);
        assert_eq!(polys[0].0.len(), 12);
        assert_relative_eq!(polys[0].0[0].x, 6.0);
        assert_eq!(polys[1].1.fill, Color::WHITE);
        assert_eq!(polys[1].0.len(), 8);
        assert_relative_eq!(polys[1].0[0].x, 4.0);
    }

    #[test]
    fn test_ellipse_fill_collapses_under_thick_outline() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let style = PolygonStyle::fill(Color::WHITE).with_outline(Color::BLACK, 12.0);
        stage
            .draw_ellipse(Point2::new(0.0, 0.0), 10.0, 10.0, &style)
            .unwrap();
        assert_eq!(stage.into_inner().len(), 1);
    }

    #[test]
    fn test_polygon_outline_is_one_quad_per_edge() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let triangle = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        let style = PolygonStyle::fill(Color::WHITE).with_outline(Color::BLACK, 1.0);
        stage.draw_polygon(&triangle, &style).unwrap();
        let polys = polygons(&stage.into_inner());
        assert_eq!(polys.len(), 4);
        assert_eq!(polys[0].0, triangle.to_vec());
        assert_eq!(polys[0].1.outline_width, 0.0);
        assert!(polys[1..]
            .iter()
            .all(|(p, s)| p.len() == 4 && s.fill == Color::BLACK));
    }

    #[test]
    fn test_two_point_polygon_becomes_line() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let style = PolygonStyle::fill(Color::WHITE);
        stage
            .draw_polygon(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)], &style)
            .unwrap();
        stage.draw_polygon(&[Point2::new(0.0, 0.0)], &style).unwrap();
        let recorder = stage.into_inner();
        assert_eq!(recorder.len(), 1);
        assert!(matches!(recorder.commands()[0], Command2::Lines { .. }));
    }

    #[test]
    fn test_sphere_decomposes_to_triangles() {
        let mut stage = Decomposer3::with_lod(Scene::new(), Lod::new(3));
        stage
            .draw_sphere(Point3::new(0.0, 0.0, 5.0), 2.0, &SurfaceStyle::fill(Color::WHITE))
            .unwrap();
        let scene = stage.into_inner();
        assert_eq!(scene.len(), 72);
        assert!(scene.commands().iter().all(
            |c| matches!(&c.command, DrawCommand::Surface { points, .. } if points.len() == 3)
        ));
    }

    #[test]
    fn test_outlined_sphere_emits_two_shells() {
        let mut stage = Decomposer3::with_lod(Scene::new(), Lod::new(1));
        let style = SurfaceStyle::fill(Color::WHITE).with_outline(Color::BLACK, 0.5);
        stage
            .draw_sphere(Point3::origin(), 2.0, &style)
            .unwrap();
        let scene = stage.into_inner();
        assert_eq!(scene.len(), 16);
        match &scene.commands()[0].command {
            DrawCommand::Surface { style, .. } => assert_eq!(style.fill, Color::BLACK),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_segment_becomes_cylinder() {
        let lod = Lod::new(1);
        let mut stage = Decomposer3::with_lod(Scene::new(), lod);
        stage
            .draw_segment(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 10.0),
                2.0,
                &LineStyle::solid(Color::WHITE),
            )
            .unwrap();
        assert_eq!(stage.into_inner().len(), lod.divisions());
    }

    #[test]
    fn test_hairline_segment_passes_through() {
        let mut stage = Decomposer3::new(Scene::new());
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        stage
            .draw_segment(a, b, 0.0, &LineStyle::solid(Color::WHITE))
            .unwrap();
        stage
            .draw_segment(a, a, 0.0, &LineStyle::solid(Color::WHITE))
            .unwrap();
        let scene = stage.into_inner();
        assert_eq!(scene.len(), 1);
        assert!(matches!(scene.commands()[0].command, DrawCommand::Segment { .. }));
    }

    #[test]
    fn test_surface_outline_quads_lie_in_plane() {
        let mut stage = Decomposer3::new(Scene::new());
        let square = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
        ];
        let style = SurfaceStyle::fill(Color::WHITE).with_outline(Color::BLACK, 0.2);
        stage.draw_surface(&square, &style).unwrap();
        let scene = stage.into_inner();
        assert_eq!(scene.len(), 5);
        for recorded in scene.commands() {
            if let DrawCommand::Surface { points, .. } = &recorded.command {
                assert!(points.iter().all(|p| (p.z - 2.0).abs() < 1e-6));
            }
        }
    }

    struct Dot;

    impl Asset2 for Dot {
        fn replay(&self, target: &mut dyn Target2, _style: &AssetStyle) -> Result<()> {
            target.draw_ellipse(Point2::new(1.0, 0.0), 2.0, 2.0, &PolygonStyle::fill(Color::WHITE))
        }
    }

    struct Rod;

    impl Asset3 for Rod {
        fn replay(&self, target: &mut dyn Target3, _style: &AssetStyle) -> Result<()> {
            target.draw_segment(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                0.5,
                &LineStyle::solid(Color::WHITE),
            )
        }
    }

    #[test]
    fn test_2d_asset_is_placed_then_decomposed() {
        let mut stage = Decomposer2::new(Recorder2::new());
        // Scale first, then translate.
        let xform = Affine2::translation(10.0, 0.0) * Affine2::scaling(2.0, 2.0).unwrap();
        stage.draw_asset(&xform, &Dot, &AssetStyle::default()).unwrap();
        stage
            .draw_asset(&xform, &Dot, &AssetStyle { tint: Color::TRANSPARENT })
            .unwrap();
        let polys = polygons(&stage.into_inner());
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].0.len(), 4);
        assert_relative_eq!(polys[0].0[0].x, 14.0, epsilon = 1e-4);
        assert_relative_eq!(polys[0].0[0].y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_3d_asset_is_placed_then_decomposed() {
        let mut stage = Decomposer3::new(Scene::new());
        stage
            .draw_asset(&Affine3::translation(0.0, 0.0, 5.0), &Rod, &AssetStyle::default())
            .unwrap();
        let scene = stage.into_inner();
        assert_eq!(scene.len(), Lod::default().divisions());
        for recorded in scene.commands() {
            assert_relative_eq!(recorded.center.x, 0.5, epsilon = 1e-4);
            assert!((recorded.center.z - 5.0).abs() <= 0.5);
        }
    }

    #[test]
    fn test_non_finite_sizes_are_rejected() {
        let mut stage = Decomposer2::new(Recorder2::new());
        let style = PolygonStyle::fill(Color::WHITE);
        assert_eq!(
            stage.draw_ellipse(Point2::origin(), f32::INFINITY, 2.0, &style),
            Err(GeometryError::NonFinite("draw_ellipse"))
        );
        assert_eq!(
            stage.draw_lines(
                &[Point2::origin(), Point2::new(1.0, 0.0)],
                f32::NAN,
                &LineStyle::solid(Color::WHITE),
            ),
            Err(GeometryError::NonFinite("draw_lines"))
        );
        assert!(stage.into_inner().is_empty());

        let mut stage = Decomposer3::new(Scene::new());
        assert_eq!(
            stage.draw_sphere(Point3::origin(), f32::INFINITY, &SurfaceStyle::fill(Color::WHITE)),
            Err(GeometryError::NonFinite("draw_sphere"))
        );
    }
}
