//! Image-space / screen-space transform.
//!
//! The camera owns the zoom scale and the pan offset of the canvas. A
//! screen point `s` and an image point `p` are related by
//! `s = p * scale - offset`. Every mutator returns `true` when the view
//! changed so callers can mark their layers dirty.

use crate::constants::{
    CLOSING_THRESHOLD_PX, CONTENT_VISIBILITY_MARGIN, MAX_SCALE, SCROLL_SCALING_FACTOR,
};
use crate::geometry::{ImagePoint, Point, ScreenPoint};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pan/zoom state of one canvas view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Canvas size in screen pixels
    viewport: Size,
    /// Size of the annotated image in image pixels
    image: Size,
    scale: f64,
    offset: ScreenPoint,
    /// Screen-space radius around the first vertex that closes a path
    closing_threshold: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            viewport: Size::new(1.0, 1.0),
            image: Size::new(1.0, 1.0),
            scale: 1.0,
            offset: ScreenPoint::zero(),
            closing_threshold: CLOSING_THRESHOLD_PX,
        }
    }
}

impl Camera {
    /// Create a camera for a viewport, with the image scaled to fit.
    pub fn new(viewport: Size, image: Size) -> Self {
        let mut camera = Self {
            viewport,
            image,
            ..Self::default()
        };
        camera.scale_to_fit();
        camera
    }

    /// Override the closing threshold (screen pixels).
    pub fn with_closing_threshold(mut self, threshold: f64) -> Self {
        self.closing_threshold = threshold;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> ScreenPoint {
        self.offset
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn image_size(&self) -> Size {
        self.image
    }

    pub fn set_offset(&mut self, offset: ScreenPoint) -> bool {
        if self.offset == offset {
            return false;
        }
        self.offset = offset;
        true
    }

    pub fn set_size(&mut self, viewport: Size) -> bool {
        if self.viewport == viewport {
            return false;
        }
        self.viewport = viewport;
        true
    }

    /// Replace the image; optionally reset the view to fit it.
    pub fn set_image_size(&mut self, image: Size, reset_zoom: bool) -> bool {
        let changed = self.image != image;
        self.image = image;
        if reset_zoom {
            self.scale_to_fit() || changed
        } else {
            changed
        }
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    pub fn image_to_screen(&self, p: ImagePoint) -> ScreenPoint {
        Point::new(p.x * self.scale - self.offset.x, p.y * self.scale - self.offset.y)
    }

    pub fn screen_to_image(&self, p: ScreenPoint) -> ImagePoint {
        Point::new((p.x + self.offset.x) / self.scale, (p.y + self.offset.y) / self.scale)
    }

    /// Convert a screen-space length to image space.
    pub fn screen_distance_to_image(&self, distance: f64) -> f64 {
        distance / self.scale
    }

    /// Whether the cursor is close enough to the first vertex of a path to
    /// close it. Measured in screen space, so it does not depend on zoom.
    pub fn cursor_is_closing_path(&self, cursor: ScreenPoint, first_vertex: ImagePoint) -> bool {
        self.image_to_screen(first_vertex).distance_to(cursor) < self.closing_threshold
    }

    // ========================================================================
    // Zoom
    // ========================================================================

    /// Smallest scale allowed: half of the fit-to-view scale.
    pub fn min_zoom(&self) -> f64 {
        self.fit_scale() / 2.0
    }

    fn fit_scale(&self) -> f64 {
        let h_ratio = self.viewport.height / self.image.height;
        let w_ratio = self.viewport.width / self.image.width;
        h_ratio.min(w_ratio)
    }

    /// Fit the image in the viewport and center it horizontally.
    pub fn scale_to_fit(&mut self) -> bool {
        let scale = self.fit_scale();
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("Cannot fit image {:?} into viewport {:?}", self.image, self.viewport);
            return false;
        }
        let x_border = self.viewport.width - self.image.width * scale;
        let offset = ScreenPoint::new(-x_border / 2.0, 0.0);
        let changed = self.scale != scale || self.offset != offset;
        self.scale = scale;
        self.offset = offset;
        changed
    }

    /// Multiply the scale by `factor`, keeping `pivot` fixed on screen.
    ///
    /// The resulting scale is clamped to `[min_zoom, MAX_SCALE]`.
    pub fn zoom(&mut self, factor: f64, pivot: ScreenPoint) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let source = self.screen_to_image(pivot);
        let scale = (self.scale * factor).clamp(self.min_zoom().min(MAX_SCALE), MAX_SCALE);
        if scale == self.scale {
            return false;
        }
        self.scale = scale;
        self.offset = Point::new(source.x * scale - pivot.x, source.y * scale - pivot.y);
        log::trace!("🔍 Zoom: scale={:.3}", self.scale);
        true
    }

    /// Fit the screen-space box spanned by `p1` and `p2` into the viewport.
    pub fn zoom_to_box(&mut self, p1: ScreenPoint, p2: ScreenPoint) -> bool {
        let start = self.screen_to_image(p1);
        let end = self.screen_to_image(p2);
        let width = (end.x - start.x).abs();
        let height = (end.y - start.y).abs();
        if width <= 0.0 || height <= 0.0 {
            return false;
        }

        let Size {
            width: w,
            height: h,
        } = self.viewport;
        self.scale = if w / h < width / height {
            (w / width).min(MAX_SCALE)
        } else {
            (h / height).min(MAX_SCALE)
        };

        let rect_start = ScreenPoint::new(start.x.min(end.x), start.y.min(end.y)) * self.scale;
        let rect_end = ScreenPoint::new(start.x.max(end.x), start.y.max(end.y)) * self.scale;
        let viewport_end = rect_start + ScreenPoint::new(w, h);
        self.offset = rect_start - (viewport_end - rect_end) * 0.5;
        true
    }

    // ========================================================================
    // Pan
    // ========================================================================

    /// Pan by a wheel/trackpad delta, keeping part of the image visible.
    pub fn scroll(&mut self, delta: ScreenPoint) -> bool {
        let before = self.offset;
        let mut offset = self.offset + delta / SCROLL_SCALING_FACTOR;

        let max_x = self.image.width * self.scale - CONTENT_VISIBILITY_MARGIN;
        let min_x = -self.viewport.width + CONTENT_VISIBILITY_MARGIN;
        let max_y = self.image.height * self.scale - CONTENT_VISIBILITY_MARGIN;
        let min_y = -self.viewport.height + CONTENT_VISIBILITY_MARGIN;
        offset.x = offset.x.min(max_x).max(min_x);
        offset.y = offset.y.min(max_y).max(min_y);

        self.offset = offset;
        self.offset != before
    }

    /// Pan by an exact screen delta (middle-button drag).
    pub fn pan_by(&mut self, delta: ScreenPoint) -> bool {
        self.set_offset(self.offset - delta)
    }
}
