//! CPU rasterization of draw calls with tiny-skia.

use crate::color::Color;
use crate::context::{DrawContext, FillRule, StrokeStyle};
use crate::error::{CanvasError, Result};
use crate::path::{PathVerb, VectorPath};

/// A [`DrawContext`] backed by a `tiny_skia::Pixmap`.
///
/// Text is not rasterized; labels are counted so callers can verify they
/// were requested.
pub struct PixmapSurface {
    pixmap: tiny_skia::Pixmap,
    skipped_text: usize,
}

impl PixmapSurface {
    /// Create a transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        Ok(Self {
            pixmap,
            skipped_text: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill the whole surface with one color.
    pub fn clear(&mut self, color: Color) {
        if let Some(c) = to_skia_color(color) {
            self.pixmap.fill(c);
        }
    }

    /// Alpha of the pixel at `(x, y)`, or `None` outside the surface.
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixmap.pixel(x, y).map(|p| p.alpha())
    }

    /// Number of text labels that were requested but not rasterized.
    pub fn skipped_text(&self) -> usize {
        self.skipped_text
    }

    pub fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }
}

impl DrawContext for PixmapSurface {
    fn fill_path(&mut self, path: &VectorPath, color: Color, rule: FillRule) {
        let Ok(skia_path) = to_skia_path(path) else {
            log::trace!("fill skipped: empty path");
            return;
        };
        let Some(paint) = paint_for(color) else {
            return;
        };
        let rule = match rule {
            FillRule::NonZero => tiny_skia::FillRule::Winding,
            FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        };
        self.pixmap
            .fill_path(&skia_path, &paint, rule, tiny_skia::Transform::identity(), None);
    }

    fn stroke_path(&mut self, path: &VectorPath, style: &StrokeStyle) {
        let Ok(skia_path) = to_skia_path(path) else {
            log::trace!("stroke skipped: empty path");
            return;
        };
        let Some(paint) = paint_for(style.color) else {
            return;
        };
        let mut stroke = tiny_skia::Stroke {
            width: style.width,
            ..tiny_skia::Stroke::default()
        };
        if let Some(pattern) = &style.dash {
            match tiny_skia::StrokeDash::new(pattern.clone(), 0.0) {
                Some(dash) => stroke.dash = Some(dash),
                None => log::warn!("{}", CanvasError::InvalidDash(pattern.clone())),
            }
        }
        self.pixmap.stroke_path(
            &skia_path,
            &paint,
            &stroke,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    fn fill_text(&mut self, text: &str, _position: (f32, f32), _color: Color, _size: f32) {
        log::trace!("text '{}' not rasterized on pixmap surface", text);
        self.skipped_text += 1;
    }
}

fn to_skia_color(color: Color) -> Option<tiny_skia::Color> {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        color.a.clamp(0.0, 1.0),
    )
}

fn paint_for(color: Color) -> Option<tiny_skia::Paint<'static>> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(to_skia_color(color)?);
    paint.anti_alias = true;
    Some(paint)
}

fn to_skia_path(path: &VectorPath) -> Result<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    for verb in path.verbs() {
        match *verb {
            PathVerb::MoveTo(x, y) => builder.move_to(x, y),
            PathVerb::LineTo(x, y) => builder.line_to(x, y),
            PathVerb::Close => builder.close(),
            PathVerb::Circle { cx, cy, radius } => builder.push_circle(cx, cy, radius),
        }
    }
    builder.finish().ok_or(CanvasError::EmptyPath)
}
