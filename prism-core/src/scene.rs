//! Recorded 3D command stream and back-to-front depth ordering
use nalgebra::{Matrix4, Point3};

use crate::affine::AffineTransformer3;
use crate::error::Result;
use crate::geometry::{centroid3, ensure_finite3};
use crate::style::{AssetStyle, LineStyle, SurfaceStyle};
use crate::target::{Asset3, Target3};
use crate::transform::Affine3;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Segment {
        a: Point3<f32>,
        b: Point3<f32>,
        diameter: f32,
        style: LineStyle,
    },
    Sphere {
        center: Point3<f32>,
        diameter: f32,
        style: SurfaceStyle,
    },
    Surface {
        points: Vec<Point3<f32>>,
        style: SurfaceStyle,
    },
}

impl DrawCommand {
    /// Replay this command into `target`.
    pub fn replay<T: Target3 + ?Sized>(&self, target: &mut T) -> Result<()> {
        match self {
            DrawCommand::Segment {
                a,
                b,
                diameter,
                style,
            } => target.draw_segment(*a, *b, *diameter, style),
            DrawCommand::Sphere {
                center,
                diameter,
                style,
            } => target.draw_sphere(*center, *diameter, style),
            DrawCommand::Surface { points, style } => target.draw_surface(points, style),
        }
    }
}

/// A command together with the point its depth is measured at.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub command: DrawCommand,
    pub center: Point3<f32>,
}

/// An append-only frame of 3D commands, sorted and replayed by
/// [`Projector::draw_scene`](crate::projection::Projector::draw_scene).
///
/// Assets are expanded into their primitives when recorded so each piece is
/// sorted on its own.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    commands: Vec<RecordedCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn push(&mut self, command: DrawCommand, center: Point3<f32>) {
        self.commands.push(RecordedCommand { command, center });
    }
}

impl Target3 for Scene {
    fn draw_asset(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()> {
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
        ensure_finite3(&[a, b], "draw_segment")?;
        self.push(
            DrawCommand::Segment {
                a,
                b,
                diameter,
                style: *style,
            },
            nalgebra::center(&a, &b),
        );
        Ok(())
    }

    fn draw_sphere(
        &mut self,
        center: Point3<f32>,
        diameter: f32,
        style: &SurfaceStyle,
    ) -> Result<()> {
        ensure_finite3(&[center], "draw_sphere")?;
        self.push(
            DrawCommand::Sphere {
                center,
                diameter,
                style: *style,
            },
            center,
        );
        Ok(())
    }

    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        ensure_finite3(points, "draw_surface")?;
        let Some(center) = centroid3(points) else {
            return Ok(());
        };
        self.push(
            DrawCommand::Surface {
                points: points.to_vec(),
                style: *style,
            },
            center,
        );
        Ok(())
    }
}

/// Indices of `scene`'s commands in back-to-front order.
///
/// The depth key is the negated projected Z of each command's center, so the
/// farthest command sorts first. The sort is stable: equal depths keep their
/// recording order.
pub fn depth_order(view_projection: &Matrix4<f32>, scene: &Scene) -> Vec<usize> {
    let mut keyed: Vec<(f32, usize)> = scene
        .commands
        .iter()
        .enumerate()
        .map(|(index, recorded)| {
            let projected = view_projection * recorded.center.to_homogeneous();
            (-projected.z, index)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, index)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_records_centers() {
        let mut scene = Scene::new();
        let style = SurfaceStyle::fill(Color::WHITE);
        scene
            .draw_surface(
                &[
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(3.0, 0.0, 0.0),
                    Point3::new(0.0, 3.0, 0.0),
                ],
                &style,
            )
            .unwrap();
        scene
            .draw_segment(
                Point3::new(0.0, 0.0, 2.0),
                Point3::new(0.0, 0.0, 4.0),
                1.0,
                &LineStyle::solid(Color::WHITE),
            )
            .unwrap();
        assert_eq!(scene.commands()[0].center, Point3::new(1.0, 1.0, 0.0));
        assert_eq!(scene.commands()[1].center, Point3::new(0.0, 0.0, 3.0));

        scene.clear();
        assert!(scene.is_empty());
    }

    #[test]
    fn test_depth_order_is_far_to_near_and_stable() {
        let mut scene = Scene::new();
        let style = SurfaceStyle::fill(Color::WHITE);
        for z in [1.0, 5.0, 3.0, 5.0] {
            scene.draw_sphere(Point3::new(0.0, 0.0, z), 1.0, &style).unwrap();
        }
        let order = depth_order(&Matrix4::identity(), &scene);
        assert_eq!(order, vec![1, 3, 2, 0]);
    }
}
