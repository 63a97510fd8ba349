//! ASCII canvas: a 2D drawing target backed by a character grid
use crossterm::{
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point2;
use prism_core::{
    Affine2, AffineTransformer2, Asset2, AssetStyle, Color, Decomposer2, LineStyle, PolygonStyle,
    Result, SpriteStyle, Target2,
};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph used for sprites; the canvas has no images.
const SPRITE_GLYPH: char = 'o';

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Color,
}

impl Cell {
    const EMPTY: Cell = Cell {
        glyph: ' ',
        color: Color::BLACK,
    };
}

/// Character cells are about twice as tall as they are wide, so the canvas
/// exposes a pixel space of `width` by `2 * height` with roughly square
/// pixels. Later draws overwrite earlier ones; there is no depth buffer.
pub struct AsciiCanvas {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl AsciiCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Size of the drawing space in pixels.
    pub fn pixel_size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32 * 2.0)
    }

    pub fn glyph_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].glyph)
    }

    fn plot(&mut self, x: i32, y: i32, glyph: char, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.cells[y as usize * self.width + x as usize] = Cell { glyph, color };
    }

    /// Fill a convex polygon as a fan of triangles.
    fn fill_polygon(&mut self, points: &[Point2<f32>], color: Color) {
        let glyph = glyph_for(color);
        for i in 1..points.len() - 1 {
            self.rasterize_triangle([points[0], points[i], points[i + 1]], glyph, color);
        }
    }

    fn rasterize_triangle(&mut self, v: [Point2<f32>; 3], glyph: char, color: Color) {
        // Bounding box in cells
        let min_x = v[0].x.min(v[1].x).min(v[2].x).floor() as i32;
        let max_x = v[0].x.max(v[1].x).max(v[2].x).ceil() as i32;
        let min_y = (v[0].y.min(v[1].y).min(v[2].y) * 0.5).floor() as i32;
        let max_y = (v[0].y.max(v[1].y).max(v[2].y) * 0.5).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let sample = Point2::new(x as f32 + 0.5, (y as f32 + 0.5) * 2.0);
                if let Some((w0, w1, w2)) = barycentric(&v, &sample) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.plot(x, y, glyph, color);
                    }
                }
            }
        }
    }

    fn hairline(&mut self, a: Point2<f32>, b: Point2<f32>, color: Color) {
        let glyph = glyph_for(color);
        let (dx, dy) = (b.x - a.x, (b.y - a.y) * 0.5);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let p = a + (b - a) * (i as f32 / steps as f32);
            self.plot(p.x.floor() as i32, (p.y * 0.5).floor() as i32, glyph, color);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                let Color { r, g, b, .. } = cell.color;
                writer.queue(SetForegroundColor(TermColor::Rgb { r, g, b }))?;
                writer.queue(Print(cell.glyph))?;
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Target2 for AsciiCanvas {
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
        if diameter > 0.0 {
            return Decomposer2::new(&mut *self).draw_lines(points, diameter, style);
        }
        if !style.color.is_visible() {
            return Ok(());
        }
        for pair in points.windows(2) {
            self.hairline(pair[0], pair[1], style.color);
        }
        Ok(())
    }

    fn draw_ellipse(
        &mut self,
        center: Point2<f32>,
        width: f32,
        height: f32,
        style: &PolygonStyle,
    ) -> Result<()> {
        Decomposer2::new(&mut *self).draw_ellipse(center, width, height, style)
    }

    fn draw_polygon(&mut self, points: &[Point2<f32>], style: &PolygonStyle) -> Result<()> {
        if points.len() < 3 || style.has_outline() {
            return Decomposer2::new(&mut *self).draw_polygon(points, style);
        }
        if style.fill.is_visible() {
            self.fill_polygon(points, style.fill);
        }
        Ok(())
    }

    fn draw_sprite(&mut self, xform: &Affine2, style: &SpriteStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        let at = xform.transform_point(&Point2::origin());
        self.plot(
            at.x.floor() as i32,
            (at.y * 0.5).floor() as i32,
            SPRITE_GLYPH,
            style.tint,
        );
        Ok(())
    }
}

/// Map a color's brightness onto the ramp; visible colors never map to blank.
fn glyph_for(color: Color) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (color.luminance() * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v: &[Point2<f32>; 3], p: &Point2<f32>) -> Option<(f32, f32, f32)> {
    let denom = (v[1].y - v[2].y) * (v[0].x - v[2].x) + (v[2].x - v[1].x) * (v[0].y - v[2].y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v[1].y - v[2].y) * (p.x - v[2].x) + (v[2].x - v[1].x) * (p.y - v[2].y)) / denom;
    let w1 = ((v[2].y - v[0].y) * (p.x - v[2].x) + (v[0].x - v[2].x) * (p.y - v[2].y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
