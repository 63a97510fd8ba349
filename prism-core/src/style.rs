//! Style records attached to draw calls
//!
//! Colors with alpha 0 and widths <= 0 mean "invisible". Stages check these
//! sentinels first and return without emitting anything.

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0
    }

    /// Perceived brightness in `[0, 1]`, ignoring alpha.
    pub fn luminance(&self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }
}

/// Termination shape of a thick line or cylinder end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cap {
    /// Ends exactly at the endpoint. Cylinders stay open.
    #[default]
    Flat,
    /// 2D: a point one radius past the endpoint. 3D: a flat disc fanned to the end center.
    Triangle,
    /// 2D: a half disc. 3D: a two-ring dome.
    Round,
}

/// Returns `width` multiplied by `scale`, leaving the invisible sentinel alone.
pub(crate) fn scale_width(width: f32, scale: f32) -> f32 {
    if width <= 0.0 {
        width
    } else {
        width * scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineStyle {
    pub color: Color,
    pub outline: Color,
    pub outline_width: f32,
    pub start_cap: Cap,
    pub end_cap: Cap,
}

impl LineStyle {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_caps(mut self, start_cap: Cap, end_cap: Cap) -> Self {
        self.start_cap = start_cap;
        self.end_cap = end_cap;
        self
    }

    pub fn with_outline(mut self, outline: Color, width: f32) -> Self {
        self.outline = outline;
        self.outline_width = width;
        self
    }

    pub fn has_outline(&self) -> bool {
        self.outline.is_visible() && self.outline_width > 0.0
    }

    pub fn is_visible(&self) -> bool {
        self.color.is_visible() || self.has_outline()
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            outline_width: scale_width(self.outline_width, scale),
            ..*self
        }
    }
}

/// Style for 2D polygons and ellipses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolygonStyle {
    pub fill: Color,
    pub outline: Color,
    pub outline_width: f32,
}

impl PolygonStyle {
    pub fn fill(fill: Color) -> Self {
        Self {
            fill,
            ..Self::default()
        }
    }

    pub fn outline(outline: Color, width: f32) -> Self {
        Self {
            fill: Color::TRANSPARENT,
            outline,
            outline_width: width,
        }
    }

    pub fn with_outline(mut self, outline: Color, width: f32) -> Self {
        self.outline = outline;
        self.outline_width = width;
        self
    }

    pub fn has_outline(&self) -> bool {
        self.outline.is_visible() && self.outline_width > 0.0
    }

    pub fn is_visible(&self) -> bool {
        self.fill.is_visible() || self.has_outline()
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            outline_width: scale_width(self.outline_width, scale),
            ..*self
        }
    }

    /// Style used when a two-point polygon degenerates to a line.
    pub fn as_line_style(&self) -> LineStyle {
        LineStyle::solid(if self.has_outline() {
            self.outline
        } else {
            self.fill
        })
    }
}

/// Style for 3D surfaces and spheres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceStyle {
    pub fill: Color,
    pub outline: Color,
    pub outline_width: f32,
    /// Both faces are drawn either way; the flag is carried for sinks that care.
    pub double_sided: bool,
}

impl SurfaceStyle {
    pub fn fill(fill: Color) -> Self {
        Self {
            fill,
            ..Self::default()
        }
    }

    pub fn with_outline(mut self, outline: Color, width: f32) -> Self {
        self.outline = outline;
        self.outline_width = width;
        self
    }

    pub fn double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    pub fn has_outline(&self) -> bool {
        self.outline.is_visible() && self.outline_width > 0.0
    }

    pub fn is_visible(&self) -> bool {
        self.fill.is_visible() || self.has_outline()
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            outline_width: scale_width(self.outline_width, scale),
            ..*self
        }
    }

    pub fn as_line_style(&self) -> LineStyle {
        LineStyle::solid(if self.has_outline() {
            self.outline
        } else {
            self.fill
        })
    }

    /// The 2D style a projected surface is drawn with.
    pub fn to_polygon_style(&self, outline_width: f32) -> PolygonStyle {
        PolygonStyle {
            fill: self.fill,
            outline: self.outline,
            outline_width,
        }
    }
}

/// Opaque handle to a bitmap owned by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpriteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpriteStyle {
    pub sprite: SpriteId,
    pub tint: Color,
}

impl SpriteStyle {
    pub fn is_visible(&self) -> bool {
        self.tint.is_visible()
    }
}

/// Style passed through to an asset's replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetStyle {
    pub tint: Color,
}

impl Default for AssetStyle {
    fn default() -> Self {
        Self { tint: Color::WHITE }
    }
}

impl AssetStyle {
    pub fn is_visible(&self) -> bool {
        self.tint.is_visible()
    }
}
