//! A 2D sink that records every call it receives
use nalgebra::Point2;

use crate::affine::AffineTransformer2;
use crate::error::Result;
use crate::style::{AssetStyle, LineStyle, PolygonStyle, SpriteStyle};
use crate::target::{Asset2, Target2};
use crate::transform::Affine2;

/// One recorded 2D call. Assets never appear: they are replayed on arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum Command2 {
    Lines {
        points: Vec<Point2<f32>>,
        diameter: f32,
        style: LineStyle,
    },
    Ellipse {
        center: Point2<f32>,
        width: f32,
        height: f32,
        style: PolygonStyle,
    },
    Polygon {
        points: Vec<Point2<f32>>,
        style: PolygonStyle,
    },
    Sprite {
        xform: Affine2,
        style: SpriteStyle,
    },
}

/// Collects 2D output, e.g. to build a mesh or to inspect a pipeline.
#[derive(Debug, Clone, Default)]
pub struct Recorder2 {
    commands: Vec<Command2>,
}

impl Recorder2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command2] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over recorded polygons.
    pub fn polygons(&self) -> impl Iterator<Item = (&[Point2<f32>], &PolygonStyle)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            Command2::Polygon { points, style } => Some((points.as_slice(), style)),
            _ => None,
        })
    }
}

impl Target2 for Recorder2 {
    fn draw_asset(
        &mut self,
        xform: &Affine2,
        asset: &dyn Asset2,
        style: &AssetStyle,
    ) -> Result<()> {
        let mut placed = AffineTransformer2::new(*xform, &mut *self)?;
        asset.replay(&mut placed, style)
    }

    fn draw_lines(
        &mut self,
        points: &[Point2<f32>],
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        self.commands.push(Command2::Lines {
            points: points.to_vec(),
            diameter,
            style: *style,
        });
        Ok(())
    }

    fn draw_ellipse(
        &mut self,
        center: Point2<f32>,
        width: f32,
        height: f32,
        style: &PolygonStyle,
    ) -> Result<()> {
        self.commands.push(Command2::Ellipse {
            center,
            width,
            height,
            style: *style,
        });
        Ok(())
    }

    fn draw_polygon(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()> {
        self.commands.push(Command2::Polygon {
            points: points.to_vec(),
            style: *style,
        });
        Ok(())
    }

    fn draw_sprite(&mut self, xform: &Affine2, style: &SpriteStyle) -> Result<()> {
        self.commands.push(Command2::Sprite {
            xform: *xform,
            style: *style,
        });
        Ok(())
    }
}
