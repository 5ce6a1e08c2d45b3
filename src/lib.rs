//! Annovec - vector annotation geometry engine
//!
//! Editable annotation shapes (polygons, ellipses, skeletons, cuboids and
//! links between them), the interactive tools that draw and edit them, a
//! polygon boolean algebra for brush painting, and keyframe interpolation
//! for video annotations.
//!
//! The engine does not own a window or a GPU. Tools draw through
//! [`annovec_canvas::DrawContext`] and persist through
//! [`backend::AnnotationBackend`], so a host application supplies both.

pub mod algebra;
pub mod backend;
pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod interpolate;
pub mod measure;
pub mod model;
pub mod render;
pub mod tools;
pub mod undo;

#[cfg(test)]
mod tests;

pub use camera::{Camera, Size};
pub use config::{EngineConfig, LogLevel};
pub use error::{EngineError, Result};
pub use geometry::{CompoundPath, EditablePoint, ImagePoint, ScreenPoint};
pub use model::{Annotation, AnnotationClass, AnnotationId, AnnotationStore, ShapeType, ShapeVariant};
pub use tools::{Editor, InputEvent, Tool};

/// Install `env_logger` at the given level. Returns `false` if a logger was
/// already installed.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: LogLevel) -> bool {
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
