//! The drawing contract used by shape renderers and tools.
//!
//! A draw callback receives a [`DrawContext`] and issues fill/stroke calls
//! against it. It never decides when it runs; that is the job of the
//! [`FrameScheduler`](crate::FrameScheduler) owned by the embedder.

use crate::color::Color;
use crate::path::VectorPath;

/// How overlapping sub-paths are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    /// Overlapping sub-paths cancel out, which renders holes.
    EvenOdd,
}

/// Stroke parameters for [`DrawContext::stroke_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    /// Dash pattern in pixels, alternating on/off lengths.
    pub dash: Option<Vec<f32>>,
}

impl StrokeStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f32, pattern: Vec<f32>) -> Self {
        Self {
            color,
            width,
            dash: Some(pattern),
        }
    }
}

/// A drawing surface.
pub trait DrawContext {
    /// Fill the interior of `path`.
    fn fill_path(&mut self, path: &VectorPath, color: Color, rule: FillRule);

    /// Stroke the outline of `path`.
    fn stroke_path(&mut self, path: &VectorPath, style: &StrokeStyle);

    /// Draw a text label with its baseline origin at `position`.
    fn fill_text(&mut self, text: &str, position: (f32, f32), color: Color, size: f32);
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillPath {
        path: VectorPath,
        color: Color,
        rule: FillRule,
    },
    StrokePath {
        path: VectorPath,
        style: StrokeStyle,
    },
    DrawText {
        text: String,
        position: (f32, f32),
        color: Color,
        size: f32,
    },
}

/// A [`DrawContext`] that records every call for later replay or inspection.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
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

    /// Take the recorded commands, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Re-issue every recorded command against another surface.
    pub fn replay(&self, target: &mut dyn DrawContext) {
        for command in &self.commands {
            match command {
                DrawCommand::FillPath { path, color, rule } => target.fill_path(path, *color, *rule),
                DrawCommand::StrokePath { path, style } => target.stroke_path(path, style),
                DrawCommand::DrawText {
                    text,
                    position,
                    color,
                    size,
                } => target.fill_text(text, *position, *color, *size),
            }
        }
    }

    /// Iterate over the colors of all fill commands.
    pub fn fill_colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillPath { color, .. } => Some(*color),
            _ => None,
        })
    }

    /// Iterate over the stroke styles of all stroke commands.
    pub fn strokes(&self) -> impl Iterator<Item = &StrokeStyle> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::StrokePath { style, .. } => Some(style),
            _ => None,
        })
    }
}

impl DrawContext for CommandRecorder {
    fn fill_path(&mut self, path: &VectorPath, color: Color, rule: FillRule) {
        if path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color,
            rule,
        });
    }

    fn stroke_path(&mut self, path: &VectorPath, style: &StrokeStyle) {
        if path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            style: style.clone(),
        });
    }

    fn fill_text(&mut self, text: &str, position: (f32, f32), color: Color, size: f32) {
        self.commands.push(DrawCommand::DrawText {
            text: text.to_string(),
            position,
            color,
            size,
        });
    }
}
