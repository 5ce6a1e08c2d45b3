//! annovec_canvas - the vector drawing contract for annovec.
//!
//! Provides the surface-independent pieces of rendering:
//! - [`Color`], [`VectorPath`] and the [`DrawContext`] trait
//! - [`CommandRecorder`] for recording draw calls as [`DrawCommand`]s
//! - [`PixmapSurface`], a tiny-skia rasterizer
//! - [`Layer`] dirty flags and the [`FrameScheduler`]

mod color;
mod context;
mod error;
mod layer;
mod path;
mod pixmap;

pub use color::Color;
pub use context::{CommandRecorder, DrawCommand, DrawContext, FillRule, StrokeStyle};
pub use error::{CanvasError, Result};
pub use layer::{Frame, FrameScheduler, Layer};
pub use path::{PathVerb, VectorPath};
pub use pixmap::PixmapSurface;

pub use web_time::Instant;
