//! Clipping 3D primitives against an arbitrary plane
use nalgebra::Point3;

use crate::clip::{all_inside, clip_polygon, clip_segment, HalfSpace, Plane};
use crate::decompose::Decomposer3;
use crate::error::{GeometryError, Result};
use crate::geometry::{ensure_finite3, ensure_finite_sizes};
use crate::style::{AssetStyle, LineStyle, SurfaceStyle};
use crate::target::{Asset3, Target3};
use crate::tessellate::Lod;
use crate::transform::Affine3;

/// LOD used to approximate spheres that cross the plane.
const SPHERE_FALLBACK_LOD: u8 = 2;

/// Forwards the parts of each primitive on the positive side of `plane`.
///
/// The plane is stored with a unit normal so sphere radii compare against
/// true distances. Spheres crossing the plane are approximated by facets and clipped; there
/// is no exact sphere/plane clip. Assets are not supported and must be
/// decomposed upstream.
pub struct PlaneClipper<T> {
    plane: Plane,
    target: T,
    clipped: Vec<Point3<f32>>,
}

impl<T: Target3> PlaneClipper<T> {
    pub fn new(plane: Plane, target: T) -> Result<Self> {
        let plane = plane.normalized().ok_or(GeometryError::DegeneratePlane)?;
        log::debug!("plane clipper: normal={:?}, offset={}", plane.normal, plane.offset);
        Ok(Self {
            plane,
            target,
            clipped: Vec::new(),
        })
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn into_inner(self) -> T {
        self.target
    }
}

impl<T: Target3> Target3 for PlaneClipper<T> {
    fn draw_asset(
        &mut self,
        _xform: &Affine3,
        _asset: &dyn Asset3,
        _style: &AssetStyle,
    ) -> Result<()> {
        Err(GeometryError::Unsupported("plane clipping of assets"))
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
        match clip_segment(&self.plane, a, b) {
            Some((a, b)) => self.target.draw_segment(a, b, diameter, style),
            None => {
                log::trace!("segment on the negative side, dropped");
                Ok(())
            }
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
        let half = if style.has_outline() {
            style.outline_width * 0.5
        } else {
            0.0
        };
        let radius = diameter * 0.5 + half;
        let distance = self.plane.signed_distance(&center);
        if distance >= radius {
            return self.target.draw_sphere(center, diameter, style);
        }
        if distance <= -radius {
            log::trace!("sphere on the negative side, dropped");
            return Ok(());
        }
        Decomposer3::with_lod(&mut *self, Lod::new(SPHERE_FALLBACK_LOD))
            .draw_sphere(center, diameter, style)
    }

    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite3(points, "draw_surface")?;
        ensure_finite_sizes(&[style.outline_width], "draw_surface")?;
        match points.len() {
            0 | 1 => Ok(()),
            2 => {
                let width = style.outline_width.max(0.0);
                self.draw_segment(points[0], points[1], width, &style.as_line_style())
            }
            _ if all_inside(&self.plane, points) => self.target.draw_surface(points, style),
            _ => {
                if clip_polygon(&self.plane, points, &mut self.clipped) < 3 {
                    log::trace!("surface on the negative side, dropped");
                    return Ok(());
                }
                self.target.draw_surface(&self.clipped, style)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DrawCommand, Scene};
    use crate::style::Color;
    use nalgebra::Vector3;

    fn ground() -> Plane {
        // Keep y >= 0.
        Plane::new(Vector3::y(), 0.0)
    }

    #[test]
    fn test_segment_trim_and_drop() {
        let mut clipper = PlaneClipper::new(ground(), Scene::new()).unwrap();
        let style = LineStyle::solid(Color::WHITE);
        clipper
            .draw_segment(Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 3.0, 0.0), 1.0, &style)
            .unwrap();
        clipper
            .draw_segment(Point3::new(0.0, -1.0, 0.0), Point3::new(2.0, -3.0, 0.0), 1.0, &style)
            .unwrap();
        let scene = clipper.into_inner();
        assert_eq!(scene.len(), 1);
        match &scene.commands()[0].command {
            DrawCommand::Segment { a, b, .. } => {
                assert_eq!(*a, Point3::new(0.0, 0.0, 0.0));
                assert_eq!(*b, Point3::new(0.0, 3.0, 0.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_sphere_cases() {
        let mut clipper = PlaneClipper::new(ground(), Scene::new()).unwrap();
        let style = SurfaceStyle::fill(Color::WHITE);
        clipper.draw_sphere(Point3::new(0.0, 5.0, 0.0), 2.0, &style).unwrap();
        clipper.draw_sphere(Point3::new(0.0, -5.0, 0.0), 2.0, &style).unwrap();
        assert_eq!(clipper.target.len(), 1);

        clipper.draw_sphere(Point3::new(0.0, 0.0, 0.0), 2.0, &style).unwrap();
        let scene = clipper.into_inner();
        // The upper hemisphere's facets survive, the lower ones are dropped.
        assert_eq!(scene.len(), 1 + 16);
        for recorded in &scene.commands()[1..] {
            match &recorded.command {
                DrawCommand::Surface { points, .. } => {
                    assert!(points.iter().all(|p| p.y >= -1e-6));
                }
                other => panic!("unexpected command {other:?}"),
            }
        }
    }

    #[test]
    fn test_surface_passthrough_and_clip() {
        let mut clipper = PlaneClipper::new(ground(), Scene::new()).unwrap();
        let style = SurfaceStyle::fill(Color::WHITE);
        let above = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        clipper.draw_surface(&above, &style).unwrap();
        let straddling = [
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        clipper.draw_surface(&straddling, &style).unwrap();
        let below = straddling.map(|p| Point3::new(p.x, p.y - 5.0, p.z));
        clipper.draw_surface(&below, &style).unwrap();

        let scene = clipper.into_inner();
        assert_eq!(scene.len(), 2);
        match (&scene.commands()[0].command, &scene.commands()[1].command) {
            (DrawCommand::Surface { points: first, .. }, DrawCommand::Surface { points: second, .. }) => {
                assert_eq!(first.as_slice(), &above[..]);
                assert_eq!(second.len(), 4);
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    fn has_sphere(scene: &Scene) -> bool {
        scene
            .commands()
            .iter()
            .any(|recorded| matches!(recorded.command, DrawCommand::Sphere { .. }))
    }

    fn surface_points(scene: &Scene) -> Vec<Point3<f32>> {
        scene
            .commands()
            .iter()
            .flat_map(|recorded| match &recorded.command {
                DrawCommand::Surface { points, .. } => points.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_non_unit_normal_uses_true_distance() {
        let plane = Plane::new(Vector3::new(0.0, 2.0, 0.0), 0.0);
        let mut clipper = PlaneClipper::new(plane, Scene::new()).unwrap();
        assert_eq!(clipper.plane().normal, Vector3::y());
        let style = SurfaceStyle::fill(Color::WHITE);

        // Spans y in [-0.25, 1.75]: crosses the plane, so it is cut.
        clipper.draw_sphere(Point3::new(0.0, 0.75, 0.0), 2.0, &style).unwrap();
        let after_first = clipper.target.len();
        assert!(after_first > 0);
        assert!(!has_sphere(&clipper.target));

        // Spans y in [-1.75, 0.25]: the cap above the plane survives.
        clipper.draw_sphere(Point3::new(0.0, -0.75, 0.0), 2.0, &style).unwrap();
        let scene = clipper.into_inner();
        assert!(scene.len() > after_first);
        assert!(!has_sphere(&scene));
        assert!(surface_points(&scene).iter().all(|p| p.y >= -1e-5));
    }

    #[test]
    fn test_outline_counts_toward_sphere_extent() {
        let mut clipper = PlaneClipper::new(ground(), Scene::new()).unwrap();
        let style = SurfaceStyle::fill(Color::WHITE).with_outline(Color::BLACK, 0.5);

        // The fill clears the plane but the outline reaches y = -0.15.
        clipper.draw_sphere(Point3::new(0.0, 1.1, 0.0), 2.0, &style).unwrap();
        assert!(!has_sphere(&clipper.target));
        clipper.target.clear();

        clipper.draw_sphere(Point3::origin(), 2.0, &style).unwrap();
        let scene = clipper.into_inner();
        // Upper halves of the outline shell and the fill shell.
        assert_eq!(scene.len(), 16 + 16);
        let outline = scene
            .commands()
            .iter()
            .filter(|recorded| {
                matches!(&recorded.command, DrawCommand::Surface { style, .. } if style.fill == Color::BLACK)
            })
            .count();
        assert_eq!(outline, 16);
        assert!(surface_points(&scene).iter().all(|p| p.y >= -1e-6));
    }

    #[test]
    fn test_degenerate_plane_is_rejected() {
        assert_eq!(
            PlaneClipper::new(Plane::new(Vector3::zeros(), 1.0), Scene::new()).err(),
            Some(GeometryError::DegeneratePlane)
        );
    }

    #[test]
    fn test_assets_are_unsupported() {
        struct Empty;
        impl Asset3 for Empty {
            fn replay(&self, _target: &mut dyn Target3, _style: &AssetStyle) -> Result<()> {
                Ok(())
            }
        }
        let mut clipper = PlaneClipper::new(ground(), Scene::new()).unwrap();
        assert!(matches!(
            clipper.draw_asset(&Affine3::identity(), &Empty, &AssetStyle::default()),
            Err(GeometryError::Unsupported(_))
        ));
    }
}
