//! Ellipse tool: drag a diagonal to create, drag a control point to resize.
//!
//! Modifiers pick the resize mode of a control point drag: Alt anchors the
//! center, Ctrl/Cmd makes both radii equal, Shift grows the other radius by
//! the same amount.

use annovec_canvas::{Color, DrawContext, StrokeStyle, VectorPath};

use super::{ActiveClass, CommitLatch, InputEvent, Tool, ToolContext, ToolView};
use crate::backend::{CommitRequest, CommitResult, CreateAnnotationParams};
use crate::constants::MIN_DRAG_DISTANCE;
use crate::error::PreconditionError;
use crate::geometry::{EditablePoint, ImagePoint};
use crate::model::{
    Annotation, AnnotationId, ELLIPSE_OUTLINE_SEGMENTS, Ellipse, ResizeMode, ShapeType, ShapeVariant,
};
use crate::render::draw_vertex;
use crate::undo::Command;

const CANCEL: &str = "ellipse_tool.cancel";

#[derive(Debug, Clone, PartialEq, Default)]
enum State {
    #[default]
    Idle,
    Creating {
        start: ImagePoint,
        current: ImagePoint,
    },
    Editing(VertexEdit),
}

#[derive(Debug, Clone, PartialEq)]
struct VertexEdit {
    previous: Annotation,
    old_shape: ShapeVariant,
    vertex: usize,
    last: ImagePoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HoveredVertex {
    annotation_id: AnnotationId,
    vertex: usize,
    point: ImagePoint,
}

/// Creates ellipse annotations and resizes existing ones.
#[derive(Debug, Default)]
pub struct EllipseTool {
    class: Option<ActiveClass>,
    state: State,
    hovered: Option<HoveredVertex>,
    /// Top ellipse under the cursor
    highlighted: Option<AnnotationId>,
    latch: CommitLatch,
}

impl EllipseTool {
    pub const NAME: &'static str = "ellipse_tool";

    pub fn new() -> Self {
        Self::default()
    }

    /// Ellipse being dragged out, if any.
    pub fn preview(&self) -> Option<Ellipse> {
        match self.state {
            State::Creating { start, current } => Some(Ellipse::from_diagonal(start, current)),
            _ => None,
        }
    }

    /// Update the hovered control point and highlighted ellipse. Returns
    /// `true` when either changed.
    fn hover(&mut self, ctx: &mut ToolContext<'_>, p: ImagePoint) -> bool {
        let frame = ctx.frame_index();
        let threshold = ctx.image_distance(ctx.config.vertex_hit_threshold_px);
        let mut hovered = None;
        let mut highlighted = None;

        for annotation in ctx.store.ordered().into_iter().rev() {
            let Ok(Some(found)) = annotation.shape_at(frame) else {
                continue;
            };
            let ShapeVariant::Ellipse(ellipse) = &found.shape else {
                continue;
            };
            if let Some(vertex) = found.shape.vertex_at(p, threshold) {
                hovered = found.shape.vertex(vertex).map(|point| HoveredVertex {
                    annotation_id: annotation.id,
                    vertex,
                    point,
                });
                highlighted = Some(annotation.id);
                break;
            }
            if ellipse.contains(p) {
                highlighted = Some(annotation.id);
                break;
            }
        }

        let changed = hovered != self.hovered || highlighted != self.highlighted;
        self.hovered = hovered;
        if highlighted != self.highlighted {
            self.highlighted = highlighted;
            ctx.store.highlight(highlighted);
        }
        changed
    }

    fn begin_edit(&mut self, ctx: &ToolContext<'_>, p: ImagePoint) -> bool {
        let Some(h) = self.hovered else {
            return false;
        };
        let Some(previous) = ctx.store.get(h.annotation_id).cloned() else {
            return false;
        };
        let old_shape = match previous.shape_at(ctx.frame_index()) {
            Ok(Some(found)) => found.shape,
            Ok(None) => return false,
            Err(err) => {
                log::warn!("⚠️ Cannot edit annotation {}: {}", h.annotation_id, err);
                return false;
            }
        };
        log::debug!("✋ Dragging control point {} of ellipse {}", h.vertex, h.annotation_id);
        self.state = State::Editing(VertexEdit {
            previous,
            old_shape,
            vertex: h.vertex,
            last: p,
        });
        true
    }

    fn edit_to(ctx: &mut ToolContext<'_>, edit: &mut VertexEdit, p: ImagePoint, mode: ResizeMode) {
        let frame = ctx.frame_index();
        let offset = p - edit.last;
        edit.last = p;
        match ctx.store.shape_at_mut(edit.previous.id, frame) {
            Ok(Some(shape)) => {
                if let Err(err) = shape.move_vertex(edit.vertex, offset, mode) {
                    log::warn!("⚠️ {}", err);
                }
            }
            Ok(None) => {}
            Err(err) => log::warn!("⚠️ Cannot resize ellipse: {}", err),
        }
        ctx.changed();
    }

    fn end_edit(&mut self, ctx: &ToolContext<'_>, edit: VertexEdit) {
        let frame = ctx.frame_index();
        let id = edit.previous.id;
        let Some(updated) = ctx.store.get(id).cloned() else {
            return;
        };
        let new_shape = match updated.shape_at(frame) {
            Ok(Some(found)) => found.shape,
            _ => return,
        };
        if new_shape == edit.old_shape {
            return;
        }
        log::debug!("📝 Resized ellipse {}", id);
        self.latch.queue(CommitRequest::Update {
            previous: edit.previous,
            updated,
            undo: Command::ModifyShape {
                annotation_id: id,
                frame,
                old_shape: edit.old_shape,
                new_shape,
            },
        });
    }

    /// Queue the dragged-out ellipse unless the drag was too short.
    fn finish_creation(&mut self, ctx: &ToolContext<'_>, start: ImagePoint, end: ImagePoint) {
        let Some(class) = self.class else {
            return;
        };
        let dragged = ctx.camera.image_to_screen(start).distance_to(ctx.camera.image_to_screen(end));
        if dragged < MIN_DRAG_DISTANCE {
            log::debug!("Ellipse drag too short ({:.1}px), ignored", dragged);
            return;
        }
        let ellipse = Ellipse::from_diagonal(start, end);
        log::info!(
            "✅ Created ellipse at ({:.1}, {:.1}) with radii {:.1} x {:.1}",
            ellipse.center().x,
            ellipse.center().y,
            ellipse.radius_x(),
            ellipse.radius_y()
        );
        self.latch.queue(CommitRequest::Create(CreateAnnotationParams {
            class_id: class.id,
            shape: ShapeVariant::Ellipse(ellipse),
            frame: ctx.frame,
        }));
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        match std::mem::take(&mut self.state) {
            State::Idle => return false,
            State::Creating { .. } => log::debug!("❌ Ellipse cancelled"),
            State::Editing(edit) => {
                ctx.store.insert(edit.previous);
            }
        }
        ctx.changed();
        true
    }
}

impl Tool for EllipseTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), PreconditionError> {
        let class = ctx.require_class(Self::NAME, ShapeType::Ellipse)?;
        self.class = Some(ActiveClass::from(class));
        ctx.subscribe_pointer();
        ctx.on_render();
        ctx.register_command(CANCEL);
        Ok(())
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        if matches!(self.state, State::Editing(_)) {
            self.cancel(ctx);
        }
        if self.highlighted.is_some() {
            ctx.store.highlight(None);
        }
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self {
            class: self.class,
            ..Self::default()
        };
    }

    fn handle_event(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown(e) if e.is_primary() => {
                if self.latch.is_latched() || self.state != State::Idle {
                    return true;
                }
                let p = ctx.camera.screen_to_image(e.position);
                self.hover(ctx, p);
                if !self.begin_edit(ctx, p) {
                    self.state = State::Creating { start: p, current: p };
                }
                ctx.changed();
                true
            }
            InputEvent::PointerMove(e) => {
                let p = ctx.camera.screen_to_image(e.position);
                if self.state == State::Idle {
                    if self.hover(ctx, p) {
                        ctx.changed();
                    }
                    return false;
                }
                match &mut self.state {
                    State::Idle => false,
                    State::Creating { current, .. } => {
                        *current = p;
                        ctx.changed();
                        true
                    }
                    State::Editing(edit) => {
                        Self::edit_to(ctx, edit, p, e.modifiers.resize_mode());
                        true
                    }
                }
            }
            InputEvent::PointerUp(e) if e.is_primary() => {
                let p = ctx.camera.screen_to_image(e.position);
                match std::mem::take(&mut self.state) {
                    State::Idle => false,
                    State::Creating { start, .. } => {
                        self.finish_creation(ctx, start, p);
                        ctx.changed();
                        true
                    }
                    State::Editing(edit) => {
                        self.end_edit(ctx, edit);
                        ctx.changed();
                        true
                    }
                }
            }
            _ => false,
        }
    }

    fn run_command(&mut self, ctx: &mut ToolContext<'_>, command: &str, _arg: Option<f64>) -> bool {
        match command {
            CANCEL => self.cancel(ctx),
            _ => false,
        }
    }

    fn render(&self, draw: &mut dyn DrawContext, view: &ToolView<'_>) {
        let color = self
            .class
            .map(|c| Color::from_rgb8(c.color))
            .unwrap_or(Color::WHITE);

        if let Some(h) = self.hovered {
            let mut marker = EditablePoint::from(h.point);
            marker.highlighted = true;
            draw_vertex(draw, view.camera, &marker, color);
        }

        let State::Creating { start, current } = self.state else {
            return;
        };
        let to_screen = |p: ImagePoint| {
            let s = view.camera.image_to_screen(p);
            (s.x as f32, s.y as f32)
        };
        draw.stroke_path(
            &VectorPath::polyline([to_screen(start), to_screen(current)], false),
            &StrokeStyle::dashed(Color::WHITE, 1.0, vec![4.0, 4.0]),
        );

        let ellipse = Ellipse::from_diagonal(start, current);
        draw.stroke_path(
            &VectorPath::polyline(ellipse.outline(ELLIPSE_OUTLINE_SEGMENTS).into_iter().map(to_screen), true),
            &StrokeStyle::solid(color, 2.0),
        );
        for point in ellipse.control_points() {
            draw_vertex(draw, view.camera, point, color);
        }
    }

    fn take_commit(&mut self) -> Option<CommitRequest> {
        self.latch.take()
    }

    fn finish_commit(&mut self, ctx: &mut ToolContext<'_>, result: &CommitResult) {
        self.latch.release();
        match result {
            Ok(Some(annotation)) => log::info!("✅ Ellipse annotation {} saved", annotation.id),
            Ok(None) => log::debug!("Ellipse commit declined by backend"),
            Err(err) => log::warn!("⚠️ Ellipse commit failed: {}", err),
        }
        self.reset();
        ctx.changed();
    }

    fn is_drawing(&self) -> bool {
        self.state != State::Idle
    }
}
