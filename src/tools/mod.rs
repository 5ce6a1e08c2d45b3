//! Interactive tools and the plumbing they share.
//!
//! A [`Tool`] is a state machine driven by [`InputEvent`]s. The [`Editor`]
//! owns the active tool instance, routes events and named commands to it
//! and flushes the commits it queues against an
//! [`AnnotationBackend`](crate::backend::AnnotationBackend).
//!
//! Everything a tool subscribes to during activation is held as a
//! [`Disposer`] in the activation's [`Disposers`] bag. Dropping the bag
//! removes the routes again, so a tool that is switched away or fails to
//! activate leaves nothing behind.

mod brush;
mod editor;
mod ellipse;
mod navigation;
mod polygon;
mod select;

pub use brush::{BrushMode, BrushSettings, BrushTool};
pub use editor::{DEFAULT_TOOL, Editor, KeyBindings, Session, ToolFactory};
pub use ellipse::EllipseTool;
pub use navigation::{Navigation, TouchSuppression};
pub use polygon::PolygonTool;
pub use select::SelectTool;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use annovec_canvas::{DrawContext, Layer};

use crate::backend::{CommitRequest, CommitResult};
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::error::PreconditionError;
use crate::geometry::ScreenPoint;
use crate::model::{AnnotationClass, AnnotationStore, ClassId, FrameIndex, ResizeMode, ShapeType};
use crate::undo::UndoStack;

// ============================================================================
// Input
// ============================================================================

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Ellipse resize behaviour selected by these modifiers.
    pub fn resize_mode(&self) -> ResizeMode {
        ResizeMode::from_modifiers(self.command(), self.shift, self.alt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: ScreenPoint,
    pub button: PointerButton,
    pub source: PointerSource,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Primary mouse button at `(x, y)` without modifiers.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: ScreenPoint::new(x, y),
            button: PointerButton::Primary,
            source: PointerSource::Mouse,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn touch(mut self) -> Self {
        self.source = PointerSource::Touch;
        self
    }

    pub fn is_primary(&self) -> bool {
        self.button == PointerButton::Primary
    }
}

/// Input delivered to the editor by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    Wheel {
        position: ScreenPoint,
        delta: ScreenPoint,
        modifiers: Modifiers,
    },
    KeyDown {
        key: String,
        modifiers: Modifiers,
    },
    KeyUp {
        key: String,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn key(key: impl Into<String>) -> Self {
        InputEvent::KeyDown {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key_with(key: impl Into<String>, modifiers: Modifiers) -> Self {
        InputEvent::KeyDown {
            key: key.into(),
            modifiers,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::PointerDown(_) => EventKind::PointerDown,
            InputEvent::PointerMove(_) => EventKind::PointerMove,
            InputEvent::PointerUp(_) => EventKind::PointerUp,
            InputEvent::Wheel { .. } => EventKind::Wheel,
            InputEvent::KeyDown { .. } => EventKind::KeyDown,
            InputEvent::KeyUp { .. } => EventKind::KeyUp,
        }
    }

    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            InputEvent::PointerDown(p) | InputEvent::PointerMove(p) | InputEvent::PointerUp(p) => Some(p),
            _ => None,
        }
    }
}

/// Event categories a tool can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Wheel,
    KeyDown,
    KeyUp,
}

// ============================================================================
// Subscriptions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Route {
    Event(EventKind),
    Command(String),
    Render,
}

/// Event, command and render routes registered by the active tool.
#[derive(Debug, Default)]
pub struct Routes {
    next_id: u64,
    entries: BTreeMap<u64, Route>,
    /// Ids whose disposer was dropped while the table was borrowed
    stale: Rc<RefCell<Vec<u64>>>,
}

pub type SharedRoutes = Rc<RefCell<Routes>>;

impl Routes {
    pub fn new_shared() -> SharedRoutes {
        Rc::new(RefCell::new(Self::default()))
    }

    fn add(&mut self, route: Route) -> u64 {
        self.purge_stale();
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, route);
        id
    }

    fn remove(&mut self, id: u64) {
        self.entries.remove(&id);
        self.purge_stale();
    }

    /// Remove routes whose disposal was deferred.
    fn purge_stale(&mut self) {
        let stale = std::mem::take(&mut *self.stale.borrow_mut());
        for id in stale {
            log::debug!("🧹 Removing deferred route {}", id);
            self.entries.remove(&id);
        }
    }

    fn live(&self) -> impl Iterator<Item = &Route> + '_ {
        let stale = self.stale.borrow().clone();
        self.entries
            .iter()
            .filter(move |(id, _)| !stale.contains(id))
            .map(|(_, route)| route)
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.live().any(|r| *r == Route::Event(kind))
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.live().any(|r| matches!(r, Route::Command(c) if c == name))
    }

    pub fn renders(&self) -> bool {
        self.live().any(|r| *r == Route::Render)
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes one route when dropped.
///
/// If the route table is borrowed at that moment the id is queued and the
/// route is removed on the next mutation of the table.
#[derive(Debug)]
pub struct Disposer {
    routes: Weak<RefCell<Routes>>,
    stale: Weak<RefCell<Vec<u64>>>,
    id: u64,
}

impl Disposer {
    fn new(routes: &SharedRoutes, id: u64) -> Self {
        let stale = Rc::downgrade(&routes.borrow().stale);
        Self {
            routes: Rc::downgrade(routes),
            stale,
            id,
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        let Some(routes) = self.routes.upgrade() else {
            return;
        };
        if let Ok(mut routes) = routes.try_borrow_mut() {
            routes.remove(self.id);
            return;
        }
        if let Some(stale) = self.stale.upgrade() {
            log::debug!("Route {} is borrowed, deferring its removal", self.id);
            stale.borrow_mut().push(self.id);
        }
    }
}

/// The disposers of one tool activation.
#[derive(Debug, Default)]
pub struct Disposers {
    items: Vec<Disposer>,
}

impl Disposers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, disposer: Disposer) {
        self.items.push(disposer);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Dispose everything. Returns how many routes were removed.
    pub fn drain(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }
}

// ============================================================================
// Tool Context
// ============================================================================

/// Tool-independent settings owned by the editor.
#[derive(Debug, Clone, Default)]
pub struct ToolSettings {
    pub brush: BrushSettings,
    pub show_measures: bool,
}

/// Everything a tool may touch while handling an event.
pub struct ToolContext<'a> {
    pub camera: &'a mut Camera,
    pub store: &'a mut AnnotationStore,
    pub undo: &'a mut UndoStack,
    pub config: &'a EngineConfig,
    /// The preselected annotation class
    pub class: Option<&'a AnnotationClass>,
    pub settings: &'a mut ToolSettings,
    /// Current video frame; `None` when annotating a still image
    pub frame: Option<FrameIndex>,
    pub layer: &'a mut Layer,
    routes: &'a SharedRoutes,
    disposers: &'a mut Disposers,
}

impl<'a> ToolContext<'a> {
    fn add_route(&mut self, route: Route) {
        let id = self.routes.borrow_mut().add(route);
        self.disposers.push(Disposer::new(self.routes, id));
    }

    /// Route events of `kind` to the tool until it is deactivated.
    pub fn subscribe(&mut self, kind: EventKind) {
        self.add_route(Route::Event(kind));
    }

    /// Subscribe to pointer down, move and up.
    pub fn subscribe_pointer(&mut self) {
        for kind in [EventKind::PointerDown, EventKind::PointerMove, EventKind::PointerUp] {
            self.subscribe(kind);
        }
    }

    /// Route the named command to the tool until it is deactivated.
    pub fn register_command(&mut self, name: &str) {
        self.add_route(Route::Command(name.to_string()));
    }

    /// Ask the editor to call the tool's render on every painted frame.
    pub fn on_render(&mut self) {
        self.add_route(Route::Render);
    }

    /// Mark the overlay layer for repaint.
    pub fn changed(&mut self) {
        self.layer.changed();
    }

    /// Frame used for store lookups; still images use frame 0.
    pub fn frame_index(&self) -> FrameIndex {
        self.frame.unwrap_or(0)
    }

    /// Camera-independent hit radius in image pixels.
    pub fn image_distance(&self, screen_px: f64) -> f64 {
        self.camera.screen_distance_to_image(screen_px)
    }

    /// The preselected class, checked to support `shape`.
    pub fn require_class(&self, tool: &str, shape: ShapeType) -> Result<&'a AnnotationClass, PreconditionError> {
        let class = self.class.ok_or_else(|| PreconditionError::NoClassSelected {
            tool: tool.to_string(),
        })?;
        if !class.supports(shape) {
            return Err(PreconditionError::UnsupportedShapeType {
                class: class.name.clone(),
                shape: shape.name().to_string(),
            });
        }
        Ok(class)
    }
}

/// Read-only view handed to [`Tool::render`].
pub struct ToolView<'a> {
    pub camera: &'a Camera,
    pub store: &'a AnnotationStore,
    pub frame: FrameIndex,
    pub show_measures: bool,
}

// ============================================================================
// Tool Trait
// ============================================================================

/// An interactive tool. The editor creates a fresh instance per activation.
pub trait Tool {
    fn name(&self) -> &'static str;

    /// Subscribe to events and commands. Fails when the tool cannot work
    /// with the current configuration.
    fn activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), PreconditionError>;

    /// Called before the tool is dropped. In-progress work is abandoned
    /// unless the tool queues a commit here.
    fn deactivate(&mut self, ctx: &mut ToolContext<'_>);

    /// Return to the freshly activated state.
    fn reset(&mut self);

    /// Handle an event. Returns `true` when the event was consumed.
    fn handle_event(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> bool;

    /// Run a named command. Returns `true` when it had an effect.
    fn run_command(&mut self, ctx: &mut ToolContext<'_>, command: &str, arg: Option<f64>) -> bool;

    /// Draw in-progress geometry.
    fn render(&self, draw: &mut dyn DrawContext, view: &ToolView<'_>);

    /// Hand out the queued commit, if any. The commit latch stays set until
    /// [`Tool::finish_commit`].
    fn take_commit(&mut self) -> Option<CommitRequest>;

    /// Receive the backend's answer for the last commit and release the latch.
    fn finish_commit(&mut self, ctx: &mut ToolContext<'_>, result: &CommitResult);

    /// Whether the tool holds unfinished geometry.
    fn is_drawing(&self) -> bool;
}

/// Commit latch shared by the creating tools.
///
/// `queue` only accepts a request while the latch is open; `take` hands it
/// out once; `release` opens the latch again.
#[derive(Debug, Default)]
pub(crate) struct CommitLatch {
    latched: bool,
    pending: Option<CommitRequest>,
}

impl CommitLatch {
    pub(crate) fn is_latched(&self) -> bool {
        self.latched
    }

    pub(crate) fn queue(&mut self, request: CommitRequest) -> bool {
        if self.latched {
            log::debug!("🔒 Commit already in flight, ignoring");
            return false;
        }
        self.latched = true;
        self.pending = Some(request);
        true
    }

    pub(crate) fn take(&mut self) -> Option<CommitRequest> {
        self.pending.take()
    }

    pub(crate) fn release(&mut self) {
        self.latched = false;
        self.pending = None;
    }
}

/// Class id and color captured at activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ActiveClass {
    pub(crate) id: ClassId,
    pub(crate) color: [u8; 3],
}

impl From<&AnnotationClass> for ActiveClass {
    fn from(class: &AnnotationClass) -> Self {
        Self {
            id: class.id,
            color: class.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposer_removes_route_on_drop() {
        let routes = Routes::new_shared();
        let mut disposers = Disposers::new();
        let id = routes.borrow_mut().add(Route::Command("polygon_tool.cancel".into()));
        disposers.push(Disposer::new(&routes, id));
        assert!(routes.borrow().has_command("polygon_tool.cancel"));
        assert_eq!(disposers.drain(), 1);
        assert!(routes.borrow().is_empty());
        assert!(disposers.is_empty());
    }

    #[test]
    fn test_disposer_outliving_routes_is_harmless() {
        let routes = Routes::new_shared();
        let id = routes.borrow_mut().add(Route::Render);
        let disposer = Disposer::new(&routes, id);
        drop(routes);
        drop(disposer);
    }

    #[test]
    fn test_disposer_dropped_during_borrow_is_deferred() {
        let routes = Routes::new_shared();
        let id = routes.borrow_mut().add(Route::Command("brush_tool.save".into()));
        let disposer = Disposer::new(&routes, id);
        {
            let borrowed = routes.borrow();
            drop(disposer);
            assert!(!borrowed.has_command("brush_tool.save"));
            assert!(borrowed.is_empty());
        }
        assert_eq!(routes.borrow().entries.len(), 1);

        routes.borrow_mut().add(Route::Render);
        let table = routes.borrow();
        assert_eq!(table.entries.len(), 1);
        assert!(table.renders());
        assert!(table.stale.borrow().is_empty());
    }

    #[test]
    fn test_commit_latch() {
        let mut latch = CommitLatch::default();
        let request = CommitRequest::Create(crate::backend::CreateAnnotationParams {
            class_id: 1,
            shape: crate::model::ShapeVariant::Polygon(Default::default()),
            frame: None,
        });
        assert!(latch.queue(request.clone()));
        assert!(!latch.queue(request));
        assert!(latch.take().is_some());
        assert!(latch.take().is_none());
        assert!(latch.is_latched());
        latch.release();
        assert!(!latch.is_latched());
    }

    #[test]
    fn test_modifiers_resize_mode() {
        assert_eq!(Modifiers::NONE.resize_mode(), ResizeMode::Free);
        assert_eq!(Modifiers::alt().resize_mode(), ResizeMode::Anchored);
        assert_eq!(Modifiers::ctrl().resize_mode(), ResizeMode::Uniform);
        assert_eq!(Modifiers::shift().resize_mode(), ResizeMode::Additive);
    }
}
