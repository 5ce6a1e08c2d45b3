//! Polygon tool: click to place vertices, close on the first vertex.
//!
//! While idle the tool edits the selected polygon annotation: dragging one
//! of its vertices moves it, pressing on one of its edges inserts a vertex
//! there and drags it.

use annovec_canvas::{Color, DrawContext, StrokeStyle, VectorPath};

use super::{ActiveClass, CommitLatch, InputEvent, Tool, ToolContext, ToolView};
use crate::backend::{CommitRequest, CommitResult, CreateAnnotationParams};
use crate::error::PreconditionError;
use crate::geometry::{
    CompoundPath, EdgeHit, EditablePoint, ImagePoint, ScreenPoint, VertexRef, interpolate_ring,
    maybe_simplify, point_on_path,
};
use crate::measure::measure_drawing;
use crate::model::{Annotation, AnnotationId, ResizeMode, ShapeType, ShapeVariant};
use crate::render::{draw_vertex, render_measures};
use crate::undo::Command;

const CANCEL: &str = "polygon_tool.cancel";
const CLOSE: &str = "polygon_tool.close";
const UNDO_POINT: &str = "polygon_tool.undo_point";

#[derive(Debug, Clone, PartialEq, Default)]
enum State {
    #[default]
    Idle,
    Drawing,
    /// Waiting for the backend to answer the create request
    Closing,
    VertexDragging(VertexDrag),
}

#[derive(Debug, Clone, PartialEq)]
struct VertexDrag {
    /// The annotation before the drag started
    previous: Annotation,
    old_shape: ShapeVariant,
    vertex: usize,
    before: ImagePoint,
    last: ImagePoint,
    /// The dragged vertex was inserted by this drag
    inserted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HoveredVertex {
    annotation_id: AnnotationId,
    vertex: usize,
    point: ImagePoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InsertHint {
    annotation_id: AnnotationId,
    ring: usize,
    hit: EdgeHit,
}

/// Draws polygon annotations and edits the selected one.
#[derive(Debug, Default)]
pub struct PolygonTool {
    class: Option<ActiveClass>,
    state: State,
    points: Vec<EditablePoint>,
    cursor: Option<ImagePoint>,
    /// Cursor is over the first vertex and a click would close the path
    closing: bool,
    pointer_down: bool,
    hovered_vertex: Option<HoveredVertex>,
    insert_hint: Option<InsertHint>,
    latch: CommitLatch,
}

impl PolygonTool {
    pub const NAME: &'static str = "polygon_tool";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[EditablePoint] {
        &self.points
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    fn add_point(&mut self, ctx: &ToolContext<'_>, p: ImagePoint) -> bool {
        if let Some(last) = self.points.last() {
            if last.point().distance_to(p) < ctx.config.min_vertex_distance {
                return false;
            }
        }
        self.points.push(EditablePoint::from(p));
        log::debug!(
            "✏️ Added polygon point at ({:.1}, {:.1}), total: {}",
            p.x,
            p.y,
            self.points.len()
        );
        true
    }

    fn is_closing(&self, ctx: &ToolContext<'_>, cursor: ScreenPoint) -> bool {
        self.points.len() > 2
            && self
                .points
                .first()
                .is_some_and(|first| ctx.camera.cursor_is_closing_path(cursor, first.point()))
    }

    /// Finish the path and queue a create request.
    fn close(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(class) = self.class else {
            return false;
        };
        if self.latch.is_latched() {
            return false;
        }

        let dense = interpolate_ring(&self.points, ctx.config.interpolation_step);
        let mut ring = maybe_simplify(&dense, ctx.config.simplify_epsilon);
        for p in &mut ring {
            p.selected = false;
            p.highlighted = false;
        }
        let path = CompoundPath::new(ring, Vec::new());
        if let Err(err) = path.validate() {
            log::debug!("🗑️ Discarding polygon: {}", err);
            self.clear_drawing();
            ctx.changed();
            return false;
        }

        log::info!(
            "✅ Closing polygon with {} vertices (class={})",
            path.path.len(),
            class.id
        );
        self.state = State::Closing;
        self.closing = false;
        ctx.changed();
        self.latch.queue(CommitRequest::Create(CreateAnnotationParams {
            class_id: class.id,
            shape: ShapeVariant::Polygon(path),
            frame: ctx.frame,
        }))
    }

    fn clear_drawing(&mut self) {
        self.points.clear();
        self.closing = false;
        self.pointer_down = false;
        self.state = State::Idle;
    }

    // ========================================================================
    // Editing
    // ========================================================================

    fn selected_polygon(ctx: &ToolContext<'_>) -> Option<(AnnotationId, CompoundPath)> {
        let annotation = ctx.store.selected_annotation()?;
        let found = annotation.shape_at(ctx.frame_index()).ok()??;
        match found.shape {
            ShapeVariant::Polygon(path) => Some((annotation.id, path)),
            _ => None,
        }
    }

    /// Update the hovered vertex and the insertion candidate.
    fn hover(&mut self, ctx: &ToolContext<'_>, p: ImagePoint) -> bool {
        let before = (self.hovered_vertex, self.insert_hint);
        self.hovered_vertex = None;
        self.insert_hint = None;

        if let Some((annotation_id, path)) = Self::selected_polygon(ctx) {
            let vertex_threshold = ctx.image_distance(ctx.config.vertex_hit_threshold_px);
            let hovered = path
                .rings()
                .flatten()
                .enumerate()
                .find(|(_, v)| v.point().distance_to(p) <= vertex_threshold);
            if let Some((vertex, v)) = hovered {
                self.hovered_vertex = Some(HoveredVertex {
                    annotation_id,
                    vertex,
                    point: v.point(),
                });
            } else {
                let edge_threshold = ctx.image_distance(ctx.config.edge_hit_threshold_px);
                self.insert_hint = path
                    .rings()
                    .enumerate()
                    .filter_map(|(ring, points)| {
                        point_on_path(p, points.as_slice(), edge_threshold).map(|hit| InsertHint {
                            annotation_id,
                            ring,
                            hit,
                        })
                    })
                    .min_by(|a, b| a.hit.distance.total_cmp(&b.hit.distance));
            }
        }
        before != (self.hovered_vertex, self.insert_hint)
    }

    fn begin_drag(&mut self, ctx: &mut ToolContext<'_>, p: ImagePoint) -> bool {
        let frame = ctx.frame_index();
        let target = match (self.hovered_vertex, self.insert_hint) {
            (Some(h), _) => h.annotation_id,
            (None, Some(hint)) => hint.annotation_id,
            (None, None) => return false,
        };
        let Some(previous) = ctx.store.get(target).cloned() else {
            return false;
        };
        let old_shape = match previous.shape_at(frame) {
            Ok(Some(found)) => found.shape,
            Ok(None) => return false,
            Err(err) => {
                log::warn!("⚠️ Cannot edit annotation {}: {}", target, err);
                return false;
            }
        };

        let (vertex, before, inserted) = if let Some(h) = self.hovered_vertex {
            (h.vertex, h.point, false)
        } else if let Some(hint) = self.insert_hint {
            match Self::insert_vertex(ctx, hint) {
                Some(vertex) => (vertex, hint.hit.point, true),
                None => return false,
            }
        } else {
            return false;
        };

        log::debug!("✋ Dragging vertex {} of annotation {}", vertex, target);
        self.insert_hint = None;
        self.state = State::VertexDragging(VertexDrag {
            previous,
            old_shape,
            vertex,
            before,
            // An inserted vertex sits on the edge, not under the cursor
            last: if inserted { before } else { p },
            inserted,
        });
        ctx.changed();
        true
    }

    /// Insert the hinted vertex into the annotation. Returns its flat index.
    fn insert_vertex(ctx: &mut ToolContext<'_>, hint: InsertHint) -> Option<usize> {
        let frame = ctx.frame_index();
        match ctx.store.shape_at_mut(hint.annotation_id, frame) {
            Ok(Some(ShapeVariant::Polygon(path))) => {
                let vertex = VertexRef {
                    ring: hint.ring,
                    index: hint.hit.insert_index,
                };
                path.ring_mut(hint.ring)?
                    .insert(vertex.index, EditablePoint::from(hint.hit.point));
                log::debug!(
                    "➕ Inserted vertex into ring {} of annotation {}",
                    hint.ring,
                    hint.annotation_id
                );
                path.flat_index(vertex)
            }
            Ok(_) => None,
            Err(err) => {
                log::warn!("⚠️ Cannot insert vertex: {}", err);
                None
            }
        }
    }

    fn drag_to(ctx: &mut ToolContext<'_>, drag: &mut VertexDrag, p: ImagePoint) {
        let frame = ctx.frame_index();
        let offset = p - drag.last;
        drag.last = p;
        match ctx.store.shape_at_mut(drag.previous.id, frame) {
            Ok(Some(shape)) => {
                if let Err(err) = shape.move_vertex(drag.vertex, offset, ResizeMode::Free) {
                    log::warn!("⚠️ {}", err);
                }
            }
            Ok(None) => {}
            Err(err) => log::warn!("⚠️ Cannot move vertex: {}", err),
        }
        ctx.changed();
    }

    /// Finish a drag and queue the update.
    fn end_drag(&mut self, ctx: &mut ToolContext<'_>, drag: VertexDrag) {
        let frame = ctx.frame_index();
        let id = drag.previous.id;
        let Some(updated) = ctx.store.get(id).cloned() else {
            return;
        };
        let new_shape = match updated.shape_at(frame) {
            Ok(Some(found)) => found.shape,
            _ => return,
        };
        let after = new_shape.vertex(drag.vertex).unwrap_or(drag.before);
        if !drag.inserted && after == drag.before {
            return;
        }

        let undo = if drag.inserted {
            Command::ModifyShape {
                annotation_id: id,
                frame,
                old_shape: drag.old_shape,
                new_shape,
            }
        } else {
            Command::MoveVertex {
                annotation_id: id,
                frame,
                vertex: drag.vertex,
                before: drag.before,
                after,
            }
        };
        log::debug!("📝 {} on annotation {}", undo.description(), id);
        self.latch.queue(CommitRequest::Update {
            previous: drag.previous,
            updated,
            undo,
        });
    }

    /// Put the annotation back the way it was before the drag.
    fn abandon_drag(&mut self, ctx: &mut ToolContext<'_>) {
        if let State::VertexDragging(drag) = std::mem::take(&mut self.state) {
            ctx.store.insert(drag.previous);
            ctx.changed();
        }
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        match self.state {
            State::Drawing => {
                self.clear_drawing();
                log::debug!("❌ Drawing cancelled");
            }
            State::VertexDragging(_) => self.abandon_drag(ctx),
            State::Idle | State::Closing => return false,
        }
        ctx.changed();
        true
    }
}

impl Tool for PolygonTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), PreconditionError> {
        let class = ctx.require_class(Self::NAME, ShapeType::Polygon)?;
        self.class = Some(ActiveClass::from(class));
        ctx.subscribe_pointer();
        ctx.on_render();
        for command in [CANCEL, CLOSE, UNDO_POINT] {
            ctx.register_command(command);
        }
        Ok(())
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        self.abandon_drag(ctx);
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
                if self.latch.is_latched() {
                    return true;
                }
                let p = ctx.camera.screen_to_image(e.position);
                match self.state {
                    State::Idle => {
                        self.hover(ctx, p);
                        if self.begin_drag(ctx, p) {
                            return true;
                        }
                        self.hovered_vertex = None;
                        self.insert_hint = None;
                        self.add_point(ctx, p);
                        self.state = State::Drawing;
                        self.pointer_down = true;
                        log::debug!("✏️ Started polygon at ({:.1}, {:.1})", p.x, p.y);
                    }
                    State::Drawing => {
                        if self.is_closing(ctx, e.position) {
                            self.close(ctx);
                            return true;
                        }
                        self.add_point(ctx, p);
                        self.pointer_down = true;
                    }
                    State::Closing | State::VertexDragging(_) => {}
                }
                ctx.changed();
                true
            }
            InputEvent::PointerMove(e) => {
                let p = ctx.camera.screen_to_image(e.position);
                self.cursor = Some(p);
                if let State::VertexDragging(drag) = &mut self.state {
                    Self::drag_to(ctx, drag, p);
                    return true;
                }
                match self.state {
                    State::Idle => {
                        if self.hover(ctx, p) {
                            ctx.changed();
                        }
                        false
                    }
                    State::Drawing => {
                        self.closing = self.is_closing(ctx, e.position);
                        if self.pointer_down && !self.closing {
                            self.add_point(ctx, p);
                        }
                        ctx.changed();
                        true
                    }
                    State::Closing | State::VertexDragging(_) => true,
                }
            }
            InputEvent::PointerUp(e) if e.is_primary() => {
                self.pointer_down = false;
                if let State::VertexDragging(_) = self.state {
                    if let State::VertexDragging(drag) = std::mem::take(&mut self.state) {
                        self.end_drag(ctx, drag);
                    }
                    ctx.changed();
                    return true;
                }
                self.state != State::Idle
            }
            _ => false,
        }
    }

    fn run_command(&mut self, ctx: &mut ToolContext<'_>, command: &str, _arg: Option<f64>) -> bool {
        match command {
            CANCEL => self.cancel(ctx),
            CLOSE => self.state == State::Drawing && self.points.len() > 2 && self.close(ctx),
            UNDO_POINT => {
                if self.state != State::Drawing || self.points.pop().is_none() {
                    return false;
                }
                if self.points.is_empty() {
                    self.clear_drawing();
                }
                ctx.changed();
                true
            }
            _ => false,
        }
    }

    fn render(&self, draw: &mut dyn DrawContext, view: &ToolView<'_>) {
        let color = self
            .class
            .map(|c| Color::from_rgb8(c.color))
            .unwrap_or(Color::WHITE);

        if let Some(h) = self.hovered_vertex {
            let mut marker = EditablePoint::from(h.point);
            marker.highlighted = true;
            draw_vertex(draw, view.camera, &marker, color);
        }
        if let Some(hint) = self.insert_hint {
            draw_vertex(draw, view.camera, &EditablePoint::from(hint.hit.point), Color::WHITE);
        }

        if !matches!(self.state, State::Drawing | State::Closing) || self.points.is_empty() {
            return;
        }

        let cursor = match self.state {
            State::Drawing if !self.closing => self.cursor,
            _ => None,
        };
        let preview = self
            .points
            .iter()
            .map(EditablePoint::point)
            .chain(cursor)
            .map(|p| {
                let s = view.camera.image_to_screen(p);
                (s.x as f32, s.y as f32)
            });
        let closed = self.closing || self.state == State::Closing;
        draw.stroke_path(&VectorPath::polyline(preview, closed), &StrokeStyle::solid(color, 2.0));

        for (i, p) in self.points.iter().enumerate() {
            let mut marker = *p;
            marker.highlighted = i == 0 && self.closing;
            draw_vertex(draw, view.camera, &marker, color);
        }

        if view.show_measures {
            let points: Vec<ImagePoint> = self.points.iter().map(EditablePoint::point).collect();
            if let Some(measures) = measure_drawing(&points, cursor) {
                render_measures(draw, view.camera, &measures);
            }
        }
    }

    fn take_commit(&mut self) -> Option<CommitRequest> {
        self.latch.take()
    }

    fn finish_commit(&mut self, ctx: &mut ToolContext<'_>, result: &CommitResult) {
        self.latch.release();
        match result {
            Ok(Some(annotation)) => log::info!("✅ Polygon annotation {} saved", annotation.id),
            Ok(None) => log::debug!("Polygon commit declined by backend"),
            Err(err) => log::warn!("⚠️ Polygon commit failed: {}", err),
        }
        self.reset();
        ctx.changed();
    }

    fn is_drawing(&self) -> bool {
        self.state != State::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Size;
    use crate::config::EngineConfig;
    use crate::model::AnnotationClass;
    use crate::tools::{Disposers, PointerEvent, Session};

    fn session() -> Session {
        let mut session = Session::new(EngineConfig::default(), Size::new(100.0, 100.0), Size::new(100.0, 100.0));
        session.add_class(AnnotationClass::new(1, "cell", [255, 0, 0], vec![ShapeType::Polygon]));
        session.selected_class = Some(1);
        session
    }

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown(PointerEvent::at(x, y))
    }

    fn moved(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove(PointerEvent::at(x, y))
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerUp(PointerEvent::at(x, y))
    }

    fn click(tool: &mut PolygonTool, ctx: &mut ToolContext<'_>, x: f64, y: f64) {
        tool.handle_event(ctx, &down(x, y));
        tool.handle_event(ctx, &up(x, y));
    }

    fn square(x: f64, y: f64, size: f64) -> ShapeVariant {
        ShapeVariant::Polygon(CompoundPath::from_points([
            ImagePoint::new(x, y),
            ImagePoint::new(x + size, y),
            ImagePoint::new(x + size, y + size),
            ImagePoint::new(x, y + size),
        ]))
    }

    #[test]
    fn test_activation_requires_polygon_class() {
        let mut session = session();
        session.add_class(AnnotationClass::new(2, "round", [0, 0, 255], vec![ShapeType::Ellipse]));
        session.selected_class = Some(2);
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let err = PolygonTool::new().activate(&mut ctx);
        assert!(matches!(err, Err(PreconditionError::UnsupportedShapeType { .. })));
    }

    #[test]
    fn test_click_on_first_vertex_closes() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        click(&mut tool, &mut ctx, 10.0, 10.0);
        click(&mut tool, &mut ctx, 60.0, 10.0);
        click(&mut tool, &mut ctx, 10.0, 60.0);
        click(&mut tool, &mut ctx, 11.0, 11.0);

        let Some(CommitRequest::Create(params)) = tool.take_commit() else {
            panic!("expected a create request");
        };
        assert_eq!(params.class_id, 1);
        assert_eq!(params.frame, None);
        let path = params.shape.as_polygon().expect("polygon");
        assert_eq!(path.path.len(), 3);
        assert!(tool.is_drawing());
    }

    #[test]
    fn test_close_densifies_every_edge() {
        let mut session = session();
        session.config.simplify_epsilon = 0.0;
        session.config.interpolation_step = 10.0;
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        click(&mut tool, &mut ctx, 10.0, 10.0);
        click(&mut tool, &mut ctx, 40.0, 10.0);
        click(&mut tool, &mut ctx, 40.0, 40.0);
        assert!(tool.run_command(&mut ctx, CLOSE, None));

        let Some(CommitRequest::Create(params)) = tool.take_commit() else {
            panic!("expected a create request");
        };
        let path = params.shape.as_polygon().expect("polygon");
        let points: Vec<ImagePoint> = path.path.iter().map(EditablePoint::point).collect();
        // 3 corners, 2 points on each leg, 4 on the diagonal back to the start
        assert_eq!(points.len(), 3 + 2 + 2 + 4);
        assert_eq!(points[0], ImagePoint::new(10.0, 10.0));
        let closing = points[points.len() - 1];
        assert!((closing.x - closing.y).abs() < 1e-9);
        assert!(closing.x > 10.0 && closing.x < 40.0);
    }

    #[test]
    fn test_close_is_latched() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        click(&mut tool, &mut ctx, 10.0, 10.0);
        click(&mut tool, &mut ctx, 60.0, 10.0);
        click(&mut tool, &mut ctx, 10.0, 60.0);
        assert!(tool.run_command(&mut ctx, CLOSE, None));
        assert!(!tool.run_command(&mut ctx, CLOSE, None));
        assert!(tool.take_commit().is_some());
        assert!(tool.take_commit().is_none());

        tool.finish_commit(&mut ctx, &Ok(None));
        assert!(!tool.is_drawing());
        assert!(tool.points().is_empty());
    }

    #[test]
    fn test_close_needs_three_points() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        click(&mut tool, &mut ctx, 10.0, 10.0);
        click(&mut tool, &mut ctx, 60.0, 10.0);
        assert!(!tool.run_command(&mut ctx, CLOSE, None));
        assert!(tool.take_commit().is_none());
    }

    #[test]
    fn test_points_too_close_are_ignored() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        click(&mut tool, &mut ctx, 10.0, 10.0);
        click(&mut tool, &mut ctx, 10.5, 10.0);
        assert_eq!(tool.points().len(), 1);
        assert!(tool.run_command(&mut ctx, UNDO_POINT, None));
        assert!(!tool.is_drawing());
    }

    #[test]
    fn test_scribble_adds_points_while_held() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        tool.handle_event(&mut ctx, &down(10.0, 10.0));
        tool.handle_event(&mut ctx, &moved(20.0, 10.0));
        tool.handle_event(&mut ctx, &moved(30.0, 20.0));
        tool.handle_event(&mut ctx, &up(30.0, 20.0));
        tool.handle_event(&mut ctx, &moved(40.0, 40.0));
        assert_eq!(tool.points().len(), 3);
    }

    #[test]
    fn test_vertex_drag_records_move() {
        let mut session = session();
        let id = session.store.add(1, square(10.0, 10.0, 40.0));
        session.store.select(Some(id));
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        tool.handle_event(&mut ctx, &moved(50.0, 10.0));
        tool.handle_event(&mut ctx, &down(50.0, 10.0));
        tool.handle_event(&mut ctx, &moved(55.0, 5.0));
        tool.handle_event(&mut ctx, &up(55.0, 5.0));

        let shape = &ctx.store.get(id).expect("annotation").shape;
        assert_eq!(shape.vertex(1), Some(ImagePoint::new(55.0, 5.0)));
        assert_eq!(shape.vertex(0), Some(ImagePoint::new(10.0, 10.0)));

        let Some(CommitRequest::Update { previous, undo, .. }) = tool.take_commit() else {
            panic!("expected an update request");
        };
        assert_eq!(previous.shape.vertex(1), Some(ImagePoint::new(50.0, 10.0)));
        assert_eq!(
            undo,
            Command::MoveVertex {
                annotation_id: id,
                frame: 0,
                vertex: 1,
                before: ImagePoint::new(50.0, 10.0),
                after: ImagePoint::new(55.0, 5.0),
            }
        );
    }

    #[test]
    fn test_press_on_edge_inserts_vertex() {
        let mut session = session();
        let id = session.store.add(1, square(10.0, 10.0, 40.0));
        session.store.select(Some(id));
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        tool.handle_event(&mut ctx, &down(30.0, 11.0));
        tool.handle_event(&mut ctx, &moved(30.0, 0.0));
        tool.handle_event(&mut ctx, &up(30.0, 0.0));

        let shape = &ctx.store.get(id).expect("annotation").shape;
        assert_eq!(shape.vertex_count(), 5);
        assert_eq!(shape.vertex(1), Some(ImagePoint::new(30.0, 0.0)));
        let Some(CommitRequest::Update { undo, .. }) = tool.take_commit() else {
            panic!("expected an update request");
        };
        assert!(matches!(undo, Command::ModifyShape { .. }));
    }

    #[test]
    fn test_cancel_and_reset() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = PolygonTool::new();
        tool.activate(&mut ctx).expect("activate");

        click(&mut tool, &mut ctx, 10.0, 10.0);
        click(&mut tool, &mut ctx, 20.0, 10.0);
        assert!(tool.run_command(&mut ctx, CANCEL, None));
        assert!(!tool.is_drawing());
        assert!(!tool.run_command(&mut ctx, CANCEL, None));

        click(&mut tool, &mut ctx, 10.0, 10.0);
        tool.reset();
        assert!(tool.points().is_empty());
        assert!(!tool.is_drawing());
        assert_eq!(tool.name(), PolygonTool::NAME);
    }
}
