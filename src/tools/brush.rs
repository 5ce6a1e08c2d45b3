//! Brush tool: paint and erase polygon regions with a round or square tip.
//!
//! Each stroke accumulates in `stroke` while the pointer is down and is
//! merged into `committed` on release, by union for the brush and by
//! difference for the eraser. A failed boolean operation leaves
//! `committed` as it was.

use annovec_canvas::{Color, DrawContext, FillRule, StrokeStyle, VectorPath};
use serde::{Deserialize, Serialize};

use super::{ActiveClass, CommitLatch, InputEvent, Modifiers, Tool, ToolContext, ToolView};
use crate::algebra::{Region, TipShape, build_tip_path, difference, sweep_tip, tip_region, union};
use crate::backend::{CommitRequest, CommitResult, CreateAnnotationParams};
use crate::camera::Camera;
use crate::config::BrushConfig;
use crate::constants::MIN_PATH_VERTICES;
use crate::error::PreconditionError;
use crate::geometry::{CompoundPath, EditablePoint, ImagePoint, maybe_simplify};
use crate::model::{Annotation, ShapeType, ShapeVariant};
use crate::undo::Command;

const ACTIVATE_BRUSH: &str = "brush_tool.activate_brush";
const ACTIVATE_ERASER: &str = "brush_tool.activate_eraser";
const ACTIVATE_ROUND_TIP: &str = "brush_tool.activate_round_tip";
const ACTIVATE_SQUARED_TIP: &str = "brush_tool.activate_squared_tip";
const SAVE: &str = "brush_tool.save";
const CANCEL: &str = "brush_tool.cancel";
const GROW: &str = "brush_tool.grow";
const SHRINK: &str = "brush_tool.shrink";
const SET_BRUSH_SIZE: &str = "brush_tool.set_brush_size";
const UNDO_STROKE: &str = "brush_tool.undo_stroke";

const COMMANDS: [&str; 10] = [
    ACTIVATE_BRUSH,
    ACTIVATE_ERASER,
    ACTIVATE_ROUND_TIP,
    ACTIVATE_SQUARED_TIP,
    SAVE,
    CANCEL,
    GROW,
    SHRINK,
    SET_BRUSH_SIZE,
    UNDO_STROKE,
];

/// Smallest brush diameter `shrink` and `set_brush_size` allow.
const MIN_BRUSH_SIZE: f64 = 1.0;

const REGION_ALPHA: f32 = 0.4;

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushMode {
    #[default]
    Brush,
    Eraser,
}

/// Brush mode, tip and size, owned by the editor so they survive tool
/// switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    pub mode: BrushMode,
    pub tip: TipShape,
    /// Tip diameter in image pixels
    pub size: f64,
    max_size: f64,
    scaling_factor: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self::from_config(&BrushConfig::default())
    }
}

impl BrushSettings {
    pub fn from_config(config: &BrushConfig) -> Self {
        Self {
            mode: BrushMode::default(),
            tip: TipShape::default(),
            size: config.default_size,
            max_size: config.max_size,
            scaling_factor: config.scaling_factor,
        }
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn grow(&mut self) -> bool {
        self.set_size(self.size * self.scaling_factor)
    }

    pub fn shrink(&mut self) -> bool {
        self.set_size(self.size / self.scaling_factor)
    }

    /// Set the diameter, clamped to `[1, max_size]`. Returns `true` when
    /// the size changed.
    pub fn set_size(&mut self, size: f64) -> bool {
        if !size.is_finite() {
            return false;
        }
        let size = size.clamp(MIN_BRUSH_SIZE, self.max_size.max(MIN_BRUSH_SIZE));
        if size == self.size {
            return false;
        }
        self.size = size;
        log::debug!("🖌️ Brush size: {:.2}", size);
        true
    }
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Tip {
    shape: TipShape,
    size: f64,
    path: Vec<ImagePoint>,
}

/// Paints polygon annotations, or edits the selected one.
#[derive(Debug, Default)]
pub struct BrushTool {
    class: Option<ActiveClass>,
    committed: Region,
    stroke: Region,
    /// `committed` before each merged stroke
    history: Vec<Region>,
    tip: Option<Tip>,
    /// Last pointer position of the stroke in progress
    last: Option<ImagePoint>,
    erasing: bool,
    cursor: Option<ImagePoint>,
    /// The selected annotation being edited, as it was on activation
    editing: Option<Annotation>,
    latch: CommitLatch,
}

impl BrushTool {
    pub const NAME: &'static str = "brush_tool";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &Region {
        &self.committed
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Tip for the current settings, rebuilt when shape or size changed.
    fn tip_path(&mut self, settings: &BrushSettings) -> Vec<ImagePoint> {
        let stale = self
            .tip
            .as_ref()
            .is_none_or(|tip| tip.shape != settings.tip || tip.size != settings.size);
        if stale {
            let path = build_tip_path(settings.tip, settings.radius());
            log::debug!(
                "🖌️ Built {:?} tip with {} sides for size {:.2}",
                settings.tip,
                path.len(),
                settings.size
            );
            self.tip = Some(Tip {
                shape: settings.tip,
                size: settings.size,
                path,
            });
        }
        self.tip.as_ref().map(|tip| tip.path.clone()).unwrap_or_default()
    }

    /// Start from the selected polygon annotation, if there is one.
    fn load_selection(&mut self, ctx: &ToolContext<'_>) {
        self.editing = None;
        self.committed = Region::empty();
        let Some(annotation) = ctx.store.selected_annotation() else {
            return;
        };
        if let Ok(Some(found)) = annotation.shape_at(ctx.frame_index()) {
            if let ShapeVariant::Polygon(path) = &found.shape {
                log::debug!("🖌️ Editing annotation {}", annotation.id);
                self.committed = Region::from(path);
                self.editing = Some(annotation.clone());
            }
        }
    }

    fn clear_geometry(&mut self) {
        self.committed = Region::empty();
        self.stroke = Region::empty();
        self.history.clear();
        self.last = None;
        self.cursor = None;
        self.editing = None;
    }

    // ========================================================================
    // Strokes
    // ========================================================================

    fn begin_stroke(&mut self, ctx: &ToolContext<'_>, p: ImagePoint, modifiers: Modifiers) {
        let tip = self.tip_path(&ctx.settings.brush);
        self.erasing = (ctx.settings.brush.mode == BrushMode::Eraser) != modifiers.shift;
        self.stroke = tip_region(p, &tip);
        self.last = Some(p);
    }

    fn extend_stroke(&mut self, ctx: &ToolContext<'_>, p: ImagePoint) {
        let Some(last) = self.last else {
            return;
        };
        let tip = self.tip_path(&ctx.settings.brush);
        let extended = union(&self.stroke, &sweep_tip(last, p, &tip)).and_then(|r| union(&r, &tip_region(p, &tip)));
        match extended {
            Ok(region) => self.stroke = region,
            Err(err) => log::warn!("⚠️ Brush segment skipped: {}", err),
        }
        self.last = Some(p);
    }

    fn end_stroke(&mut self) {
        self.last = None;
        let stroke = std::mem::take(&mut self.stroke);
        if self.erasing && self.committed.is_empty() {
            log::debug!("Eraser stroke with nothing to erase dropped");
            return;
        }
        let merged = if self.erasing {
            difference(&self.committed, &stroke)
        } else {
            union(&self.committed, &stroke)
        };
        match merged {
            Ok(region) => {
                let previous = std::mem::replace(&mut self.committed, region);
                self.history.push(previous);
            }
            Err(err) => log::warn!("⚠️ Brush stroke discarded: {}", err),
        }
    }

    // ========================================================================
    // Saving
    // ========================================================================

    /// Simplified committed geometry, or `None` when a ring ends up with
    /// fewer than three points.
    fn result_path(&self, epsilon: f64) -> Option<CompoundPath> {
        let mut rings = Vec::with_capacity(self.committed.rings().len());
        for ring in self.committed.rings() {
            let simplified = maybe_simplify(ring, epsilon);
            if simplified.len() < MIN_PATH_VERTICES {
                return None;
            }
            rings.push(simplified.into_iter().map(EditablePoint::from).collect::<Vec<_>>());
        }
        let mut rings = rings.into_iter();
        let path = rings.next().unwrap_or_default();
        Some(CompoundPath::new(path, rings.collect()))
    }

    /// Queue the painted geometry as a create or update request.
    fn save(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(class) = self.class else {
            return false;
        };
        if self.latch.is_latched() || self.history.is_empty() {
            return false;
        }

        if self.committed.is_empty() {
            log::debug!("🗑️ Brush result is empty, nothing to save");
            self.clear_geometry();
            ctx.changed();
            return false;
        }
        let Some(path) = self.result_path(ctx.config.simplify_epsilon) else {
            log::warn!("⚠️ Brush result has a ring with fewer than {} points, not saving", MIN_PATH_VERTICES);
            return false;
        };

        let request = match &self.editing {
            None => {
                log::info!("💾 Saving brush polygon with {} rings", path.rings().count());
                CommitRequest::Create(CreateAnnotationParams {
                    class_id: class.id,
                    shape: ShapeVariant::Polygon(path),
                    frame: ctx.frame,
                })
            }
            Some(previous) => {
                let frame = ctx.frame_index();
                let old_shape = match previous.shape_at(frame) {
                    Ok(Some(found)) => found.shape,
                    _ => previous.shape.clone(),
                };
                let new_shape = ShapeVariant::Polygon(path);
                let mut updated = previous.clone();
                updated.set_shape_at(frame, new_shape.clone());
                log::info!("💾 Saving brush edit of annotation {}", previous.id);
                CommitRequest::Update {
                    previous: previous.clone(),
                    updated,
                    undo: Command::ModifyShape {
                        annotation_id: previous.id,
                        frame,
                        old_shape,
                        new_shape,
                    },
                }
            }
        };
        self.latch.queue(request)
    }

    fn region_path(camera: &Camera, region: &Region) -> VectorPath {
        let mut out = VectorPath::new();
        for ring in region.rings() {
            out.add_polyline(
                ring.iter().map(|&p| {
                    let s = camera.image_to_screen(p);
                    (s.x as f32, s.y as f32)
                }),
                true,
            );
        }
        out
    }
}

impl Tool for BrushTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), PreconditionError> {
        let class = ctx.require_class(Self::NAME, ShapeType::Polygon)?;
        self.class = Some(ActiveClass::from(class));
        self.load_selection(ctx);
        self.tip_path(&ctx.settings.brush);
        ctx.subscribe_pointer();
        ctx.on_render();
        for command in COMMANDS {
            ctx.register_command(command);
        }
        Ok(())
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        if self.last.is_some() {
            self.end_stroke();
        }
        self.save(ctx);
        self.clear_geometry();
    }

    fn reset(&mut self) {
        *self = Self {
            class: self.class,
            tip: self.tip.take(),
            ..Self::default()
        };
    }

    fn handle_event(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown(e) if e.is_primary() => {
                if !self.latch.is_latched() {
                    let p = ctx.camera.screen_to_image(e.position);
                    self.begin_stroke(ctx, p, e.modifiers);
                    ctx.changed();
                }
                true
            }
            InputEvent::PointerMove(e) => {
                let p = ctx.camera.screen_to_image(e.position);
                self.cursor = Some(p);
                let stroking = self.last.is_some();
                if stroking {
                    self.extend_stroke(ctx, p);
                }
                ctx.changed();
                stroking
            }
            InputEvent::PointerUp(e) if e.is_primary() => {
                if self.last.is_none() {
                    return false;
                }
                self.end_stroke();
                ctx.changed();
                true
            }
            _ => false,
        }
    }

    fn run_command(&mut self, ctx: &mut ToolContext<'_>, command: &str, arg: Option<f64>) -> bool {
        let done = match command {
            ACTIVATE_BRUSH => {
                ctx.settings.brush.mode = BrushMode::Brush;
                true
            }
            ACTIVATE_ERASER => {
                ctx.settings.brush.mode = BrushMode::Eraser;
                true
            }
            ACTIVATE_ROUND_TIP => {
                ctx.settings.brush.tip = TipShape::Round;
                true
            }
            ACTIVATE_SQUARED_TIP => {
                ctx.settings.brush.tip = TipShape::Squared;
                true
            }
            GROW => ctx.settings.brush.grow(),
            SHRINK => ctx.settings.brush.shrink(),
            SET_BRUSH_SIZE => arg.is_some_and(|size| ctx.settings.brush.set_size(size)),
            SAVE => return self.save(ctx),
            CANCEL => {
                let had_work = !self.history.is_empty() || self.last.is_some();
                self.stroke = Region::empty();
                self.history.clear();
                self.last = None;
                self.load_selection(ctx);
                had_work
            }
            UNDO_STROKE => match self.history.pop() {
                Some(previous) => {
                    self.committed = previous;
                    true
                }
                None => false,
            },
            _ => false,
        };
        if done {
            self.tip_path(&ctx.settings.brush);
            ctx.changed();
        }
        done
    }

    fn render(&self, draw: &mut dyn DrawContext, view: &ToolView<'_>) {
        let color = self
            .class
            .map(|c| Color::from_rgb8(c.color))
            .unwrap_or(Color::WHITE);

        if !self.committed.is_empty() {
            let path = Self::region_path(view.camera, &self.committed);
            draw.fill_path(&path, color.with_alpha(REGION_ALPHA), FillRule::EvenOdd);
            draw.stroke_path(&path, &StrokeStyle::solid(color, 1.0));
        }
        if !self.stroke.is_empty() {
            let stroke_color = if self.erasing {
                Color::rgb(0.5, 0.5, 0.5)
            } else {
                color
            };
            let path = Self::region_path(view.camera, &self.stroke);
            draw.fill_path(&path, stroke_color.with_alpha(REGION_ALPHA), FillRule::EvenOdd);
        }
        if let (Some(cursor), Some(tip)) = (self.cursor, &self.tip) {
            let outline = tip_region(cursor, &tip.path);
            draw.stroke_path(
                &Self::region_path(view.camera, &outline),
                &StrokeStyle::solid(Color::WHITE, 1.0),
            );
        }
    }

    fn take_commit(&mut self) -> Option<CommitRequest> {
        self.latch.take()
    }

    fn finish_commit(&mut self, ctx: &mut ToolContext<'_>, result: &CommitResult) {
        self.latch.release();
        match result {
            Ok(Some(annotation)) => log::info!("✅ Brush annotation {} saved", annotation.id),
            Ok(None) => log::debug!("Brush commit declined by backend"),
            Err(err) => log::warn!("⚠️ Brush commit failed: {}", err),
        }
        self.reset();
        ctx.changed();
    }

    fn is_drawing(&self) -> bool {
        self.last.is_some() || !self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Size;
    use crate::config::EngineConfig;
    use crate::model::AnnotationClass;
    use crate::tools::{Disposers, PointerEvent, Session};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn session() -> Session {
        let mut session = Session::new(EngineConfig::default(), Size::new(100.0, 100.0), Size::new(100.0, 100.0));
        session.add_class(AnnotationClass::new(1, "tissue", [0, 200, 0], vec![ShapeType::Polygon]));
        session.selected_class = Some(1);
        session
    }

    fn stroke(tool: &mut BrushTool, ctx: &mut ToolContext<'_>, points: &[(f64, f64)], modifiers: Modifiers) {
        let Some((&(x0, y0), rest)) = points.split_first() else {
            return;
        };
        let event = |x: f64, y: f64| PointerEvent::at(x, y).with_modifiers(modifiers);
        tool.handle_event(ctx, &InputEvent::PointerDown(event(x0, y0)));
        let mut end = (x0, y0);
        for &(x, y) in rest {
            tool.handle_event(ctx, &InputEvent::PointerMove(event(x, y)));
            end = (x, y);
        }
        tool.handle_event(ctx, &InputEvent::PointerUp(event(end.0, end.1)));
    }

    #[test]
    fn test_settings_grow_and_shrink() {
        let mut settings = BrushSettings::default();
        assert!(approx_eq(settings.size, 10.0));
        assert!(approx_eq(settings.radius(), 5.0));
        assert!(settings.grow());
        assert!(approx_eq(settings.size, 16.18));
        assert!(settings.shrink());
        assert!((settings.size - 10.0).abs() < 1e-6);

        assert!(settings.set_size(5000.0));
        assert!(approx_eq(settings.size, 1000.0));
        assert!(!settings.grow());
        assert!(settings.set_size(0.2));
        assert!(approx_eq(settings.size, 1.0));
        assert!(!settings.shrink());
        assert!(!settings.set_size(f64::NAN));
    }

    #[test]
    fn test_stroke_and_save_creates_polygon() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(20.0, 20.0), (40.0, 20.0)], Modifiers::NONE);
        assert!(tool.committed().area() > 200.0);
        assert!(tool.committed().contains(ImagePoint::new(30.0, 20.0)));
        assert!(tool.is_drawing());

        assert!(tool.run_command(&mut ctx, SAVE, None));
        let Some(CommitRequest::Create(params)) = tool.take_commit() else {
            panic!("expected a create request");
        };
        let path = params.shape.as_polygon().expect("polygon");
        assert!(path.path.len() >= 3);
        assert!(!tool.run_command(&mut ctx, SAVE, None));
    }

    #[test]
    fn test_erasing_everything_saves_nothing() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(50.0, 50.0)], Modifiers::NONE);
        assert!(!tool.committed().is_empty());

        assert!(tool.run_command(&mut ctx, SET_BRUSH_SIZE, Some(60.0)));
        assert!(tool.run_command(&mut ctx, ACTIVATE_ERASER, None));
        stroke(&mut tool, &mut ctx, &[(50.0, 50.0)], Modifiers::NONE);
        assert!(tool.committed().is_empty());

        assert!(!tool.run_command(&mut ctx, SAVE, None));
        assert!(tool.take_commit().is_none());
    }

    #[test]
    fn test_erasing_single_tip_saves_nothing() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");
        assert!(approx_eq(ctx.settings.brush.radius(), 5.0));

        stroke(&mut tool, &mut ctx, &[(0.0, 0.0)], Modifiers::NONE);
        assert!(tool.committed().contains(ImagePoint::new(0.0, 0.0)));

        assert!(tool.run_command(&mut ctx, ACTIVATE_ERASER, None));
        assert!(tool.run_command(&mut ctx, SET_BRUSH_SIZE, Some(20.0)));
        stroke(&mut tool, &mut ctx, &[(0.0, 0.0)], Modifiers::NONE);
        assert!(tool.committed().is_empty());

        assert!(!tool.run_command(&mut ctx, SAVE, None));
        assert!(tool.take_commit().is_none());
        assert!(!tool.is_drawing());
    }

    #[test]
    fn test_small_island_is_saved_with_the_rest() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(30.0, 30.0)], Modifiers::NONE);
        assert!(tool.run_command(&mut ctx, SET_BRUSH_SIZE, Some(1.0)));
        stroke(&mut tool, &mut ctx, &[(80.0, 80.0)], Modifiers::NONE);
        assert_eq!(tool.committed().rings().len(), 2);

        assert!(tool.run_command(&mut ctx, SAVE, None));
        let Some(CommitRequest::Create(params)) = tool.take_commit() else {
            panic!("expected a create request");
        };
        let path = params.shape.as_polygon().expect("polygon");
        assert_eq!(path.rings().count(), 2);
        assert!(path.rings().all(|r| r.len() >= MIN_PATH_VERTICES));
        assert!(params.shape.contains_point(ImagePoint::new(30.0, 30.0)));
        assert!(params.shape.contains_point(ImagePoint::new(80.0, 80.0)));
    }

    #[test]
    fn test_short_ring_blocks_save() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        let square = vec![
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(40.0, 10.0),
            ImagePoint::new(40.0, 40.0),
            ImagePoint::new(10.0, 40.0),
        ];
        let sliver = vec![ImagePoint::new(60.0, 60.0), ImagePoint::new(70.0, 60.0)];
        tool.committed = Region::new(vec![square, sliver]);
        tool.history.push(Region::empty());

        assert!(!tool.run_command(&mut ctx, SAVE, None));
        assert!(tool.take_commit().is_none());
        assert_eq!(tool.committed().rings().len(), 2);
        assert!(tool.is_drawing());
    }

    #[test]
    fn test_eraser_on_empty_canvas_is_dropped() {
        let mut session = session();
        session.settings.brush.mode = BrushMode::Eraser;
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(50.0, 50.0), (60.0, 50.0)], Modifiers::NONE);
        assert!(tool.committed().is_empty());
        assert!(!tool.is_drawing());
    }

    #[test]
    fn test_shift_toggles_eraser() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(20.0, 50.0), (80.0, 50.0)], Modifiers::NONE);
        let painted = tool.committed().area();
        assert!(tool.run_command(&mut ctx, SET_BRUSH_SIZE, Some(30.0)));
        stroke(&mut tool, &mut ctx, &[(50.0, 50.0)], Modifiers::shift());
        assert!(tool.committed().area() < painted);
        assert!(!tool.committed().contains(ImagePoint::new(50.0, 50.0)));

        assert!(tool.run_command(&mut ctx, UNDO_STROKE, None));
        assert!(tool.committed().contains(ImagePoint::new(50.0, 50.0)));
        assert!(tool.run_command(&mut ctx, UNDO_STROKE, None));
        assert!(tool.committed().is_empty());
        assert!(!tool.run_command(&mut ctx, UNDO_STROKE, None));
    }

    #[test]
    fn test_tip_follows_size() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");
        assert_eq!(tool.tip.as_ref().map(|t| t.path.len()), Some(12));

        assert!(tool.run_command(&mut ctx, SET_BRUSH_SIZE, Some(200.0)));
        assert_eq!(tool.tip.as_ref().map(|t| t.path.len()), Some(24));

        assert!(tool.run_command(&mut ctx, ACTIVATE_SQUARED_TIP, None));
        assert_eq!(tool.tip.as_ref().map(|t| t.path.len()), Some(4));
    }

    #[test]
    fn test_editing_selected_polygon_saves_update() {
        let mut session = session();
        let square = ShapeVariant::Polygon(CompoundPath::from_points([
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(40.0, 10.0),
            ImagePoint::new(40.0, 40.0),
            ImagePoint::new(10.0, 40.0),
        ]));
        let id = session.store.add(1, square.clone());
        session.store.select(Some(id));
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");
        assert!(tool.is_editing());
        assert!(approx_eq(tool.committed().area(), 900.0));

        stroke(&mut tool, &mut ctx, &[(40.0, 25.0), (60.0, 25.0)], Modifiers::NONE);
        assert!(tool.run_command(&mut ctx, SAVE, None));
        let Some(CommitRequest::Update { previous, updated, undo }) = tool.take_commit() else {
            panic!("expected an update request");
        };
        assert_eq!(previous.id, id);
        assert_eq!(updated.id, id);
        assert!(updated.shape.contains_point(ImagePoint::new(55.0, 25.0)));
        let Command::ModifyShape { old_shape, .. } = undo else {
            panic!("expected a shape modification");
        };
        assert_eq!(old_shape, square);
    }

    #[test]
    fn test_deactivate_saves_pending_work() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(20.0, 20.0), (30.0, 30.0)], Modifiers::NONE);
        tool.deactivate(&mut ctx);
        assert!(matches!(tool.take_commit(), Some(CommitRequest::Create(_))));
        assert!(tool.committed().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut session = session();
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = BrushTool::new();
        tool.activate(&mut ctx).expect("activate");

        stroke(&mut tool, &mut ctx, &[(20.0, 20.0)], Modifiers::NONE);
        tool.reset();
        assert!(tool.committed().is_empty());
        assert!(!tool.is_drawing());
        assert!(tool.take_commit().is_none());
    }
}
