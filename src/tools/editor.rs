//! The editor: tool registry, activation, event and command routing,
//! commit flushing and render scheduling.

use std::cell::Ref;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use annovec_canvas::{DrawContext, Frame, FrameScheduler, Layer};
use web_time::Instant;

use super::{
    BrushSettings, BrushTool, Disposers, EllipseTool, InputEvent, Modifiers, Navigation,
    PointerButton, PolygonTool, Routes, SelectTool, SharedRoutes, Tool, ToolContext, ToolSettings,
    ToolView, TouchSuppression,
};
use crate::backend::{AnnotationBackend, CommitRequest, CommitResult, LogNotifier, Notifier};
use crate::camera::{Camera, Size};
use crate::config::EngineConfig;
use crate::error::PreconditionError;
use crate::model::{AnnotationClass, AnnotationStore, ClassId, FrameIndex};
use crate::render::{RenderFilter, SceneOptions, render_annotations};
use crate::undo::{Command, UndoConfig, UndoStack, redo_command, undo_command};

/// Tool activated at startup and after a failed activation.
pub const DEFAULT_TOOL: &str = SelectTool::NAME;

/// Creates a fresh tool instance for each activation.
pub type ToolFactory = Box<dyn Fn() -> Box<dyn Tool>>;

// ============================================================================
// Session
// ============================================================================

/// State shared by all tools.
pub struct Session {
    pub camera: Camera,
    pub store: AnnotationStore,
    pub undo: UndoStack,
    pub config: EngineConfig,
    pub classes: HashMap<ClassId, AnnotationClass>,
    /// Class new annotations are created with
    pub selected_class: Option<ClassId>,
    pub settings: ToolSettings,
    /// Current video frame; `None` for still images
    pub frame: Option<FrameIndex>,
    pub filter: Option<RenderFilter>,
    /// Overlay layer repainted when annotations or tool state change
    pub layer: Layer,
    routes: SharedRoutes,
}

impl Session {
    pub fn new(config: EngineConfig, viewport: Size, image: Size) -> Self {
        let camera = Camera::new(viewport, image).with_closing_threshold(config.closing_threshold_px);
        let undo = UndoStack::with_config(UndoConfig {
            max_history: config.max_undo_history,
        });
        let settings = ToolSettings {
            brush: BrushSettings::from_config(&config.brush),
            show_measures: false,
        };
        Self {
            camera,
            store: AnnotationStore::new(),
            undo,
            config,
            classes: HashMap::new(),
            selected_class: None,
            settings,
            frame: None,
            filter: None,
            layer: Layer::new("annotations"),
            routes: Routes::new_shared(),
        }
    }

    pub fn add_class(&mut self, class: AnnotationClass) {
        log::debug!("🏷️ Added class: {} (id={})", class.name, class.id);
        self.classes.insert(class.id, class);
    }

    pub fn frame_index(&self) -> FrameIndex {
        self.frame.unwrap_or(0)
    }

    /// Routes currently registered by the active tool.
    pub fn routes(&self) -> Ref<'_, Routes> {
        self.routes.borrow()
    }

    /// Borrow the session as a tool context whose subscriptions land in
    /// `disposers`.
    pub fn context<'a>(&'a mut self, disposers: &'a mut Disposers) -> ToolContext<'a> {
        let class = self.selected_class.and_then(|id| self.classes.get(&id));
        ToolContext {
            camera: &mut self.camera,
            store: &mut self.store,
            undo: &mut self.undo,
            config: &self.config,
            class,
            settings: &mut self.settings,
            frame: self.frame,
            layer: &mut self.layer,
            routes: &self.routes,
            disposers,
        }
    }
}

// ============================================================================
// Key Bindings
// ============================================================================

/// Maps key combinations to command names.
///
/// A combination may name several commands; the first one that has an
/// effect wins. Combinations are written like `ctrl+shift+z`.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<String, Vec<String>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self {
            bindings: HashMap::new(),
        };
        bindings.bind("Escape", &["polygon_tool.cancel", "ellipse_tool.cancel", "brush_tool.cancel"]);
        bindings.bind("Enter", &["polygon_tool.close", "brush_tool.save"]);
        bindings.bind("Backspace", &["polygon_tool.undo_point"]);
        bindings.bind("ctrl+z", &["brush_tool.undo_stroke", "editor.undo"]);
        bindings.bind("ctrl+shift+z", &["editor.redo"]);
        bindings.bind("ctrl+y", &["editor.redo"]);
        bindings.bind("]", &["brush_tool.grow"]);
        bindings.bind("[", &["brush_tool.shrink"]);
        bindings.bind("m", &["editor.toggle_measures"]);
        bindings.bind("v", &["select_tool.activate"]);
        bindings.bind("p", &["polygon_tool.activate"]);
        bindings.bind("b", &["brush_tool.activate"]);
        bindings.bind("e", &["ellipse_tool.activate"]);
        bindings
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical name of a key combination.
    pub fn combo(key: &str, modifiers: Modifiers) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if modifiers.command() {
            parts.push("ctrl".into());
        }
        if modifiers.alt {
            parts.push("alt".into());
        }
        if modifiers.shift {
            parts.push("shift".into());
        }
        if key.chars().count() == 1 {
            parts.push(key.to_lowercase());
        } else {
            parts.push(key.to_string());
        }
        parts.join("+")
    }

    /// Bind `combo` to `commands`, replacing any previous binding.
    pub fn bind(&mut self, combo: &str, commands: &[&str]) {
        self.bindings
            .insert(combo.to_string(), commands.iter().map(|c| c.to_string()).collect());
    }

    pub fn unbind(&mut self, combo: &str) -> bool {
        self.bindings.remove(combo).is_some()
    }

    pub fn commands_for(&self, key: &str, modifiers: Modifiers) -> &[String] {
        self.bindings
            .get(&Self::combo(key, modifiers))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ============================================================================
// Editor
// ============================================================================

struct Activation {
    tool: Box<dyn Tool>,
    disposers: Disposers,
}

/// Owns the active tool and drives it.
pub struct Editor {
    pub session: Session,
    factories: BTreeMap<String, ToolFactory>,
    active: Option<Activation>,
    previous_tool: Option<&'static str>,
    default_tool: String,
    /// Commits queued by tools that were deactivated before a flush
    orphaned: Vec<CommitRequest>,
    navigation: Navigation,
    touch: TouchSuppression,
    pub bindings: KeyBindings,
    notifier: Rc<dyn Notifier>,
    scheduler: FrameScheduler,
}

impl Editor {
    /// Create an editor with the built-in tools registered and the default
    /// tool active.
    pub fn new(config: EngineConfig, viewport: Size, image: Size) -> Self {
        let mut editor = Self {
            session: Session::new(config, viewport, image),
            factories: BTreeMap::new(),
            active: None,
            previous_tool: None,
            default_tool: DEFAULT_TOOL.to_string(),
            orphaned: Vec::new(),
            navigation: Navigation::new(),
            touch: TouchSuppression::default(),
            bindings: KeyBindings::default(),
            notifier: Rc::new(LogNotifier),
            scheduler: FrameScheduler::new(),
        };
        editor.register_tool(SelectTool::NAME, Box::new(|| Box::new(SelectTool::new())));
        editor.register_tool(PolygonTool::NAME, Box::new(|| Box::new(PolygonTool::new())));
        editor.register_tool(BrushTool::NAME, Box::new(|| Box::new(BrushTool::new())));
        editor.register_tool(EllipseTool::NAME, Box::new(|| Box::new(EllipseTool::new())));
        if let Err(err) = editor.activate_tool(DEFAULT_TOOL) {
            log::error!("Default tool failed to activate: {}", err);
        }
        editor
    }

    pub fn with_notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn register_tool(&mut self, name: &str, factory: ToolFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn set_default_tool(&mut self, name: &str) {
        self.default_tool = name.to_string();
    }

    pub fn add_class(&mut self, class: AnnotationClass) {
        self.session.add_class(class);
    }

    /// Preselect the class for new annotations. Takes effect on the next
    /// tool activation.
    pub fn select_class(&mut self, id: Option<ClassId>) {
        self.session.selected_class = id;
    }

    pub fn set_frame(&mut self, frame: Option<FrameIndex>) {
        if self.session.frame != frame {
            self.session.frame = frame;
            self.request_repaint();
        }
    }

    pub fn set_show_measures(&mut self, show: bool) {
        self.session.settings.show_measures = show;
        self.request_repaint();
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.session.store
    }

    pub fn active_tool(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.tool.name())
    }

    pub fn previous_tool(&self) -> Option<&'static str> {
        self.previous_tool
    }

    pub fn is_drawing(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.tool.is_drawing())
    }

    fn request_repaint(&mut self) {
        self.session.layer.changed();
        self.scheduler.request();
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Switch to the tool registered as `name`.
    ///
    /// The current tool is deactivated first. If the new tool refuses to
    /// activate, the user is notified and the default tool takes over.
    pub fn activate_tool(&mut self, name: &str) -> Result<(), PreconditionError> {
        let mut tool = match self.factories.get(name) {
            Some(factory) => factory(),
            None => {
                let err = PreconditionError::UnknownTool(name.to_string());
                self.notifier.notify(&err.to_string());
                return Err(err);
            }
        };

        self.deactivate_current();

        let mut disposers = Disposers::new();
        let result = tool.activate(&mut self.session.context(&mut disposers));
        match result {
            Ok(()) => {
                log::info!("🛠️ Activated {} ({} routes)", name, disposers.len());
                self.active = Some(Activation { tool, disposers });
                self.request_repaint();
                Ok(())
            }
            Err(err) => {
                drop(disposers);
                log::warn!("⚠️ Cannot activate {}: {}", name, err);
                self.notifier.notify(&err.to_string());
                if name != self.default_tool {
                    let fallback = self.default_tool.clone();
                    if let Err(fallback_err) = self.activate_tool(&fallback) {
                        log::error!("Fallback tool {} failed: {}", fallback, fallback_err);
                    }
                }
                Err(err)
            }
        }
    }

    /// Re-activate the tool that was active before the current one.
    pub fn activate_previous(&mut self) -> Result<(), PreconditionError> {
        match self.previous_tool {
            Some(name) => self.activate_tool(name),
            None => self.activate_tool(&self.default_tool.clone()),
        }
    }

    fn deactivate_current(&mut self) {
        let Some(mut activation) = self.active.take() else {
            return;
        };
        activation
            .tool
            .deactivate(&mut self.session.context(&mut activation.disposers));
        if let Some(request) = activation.tool.take_commit() {
            self.orphaned.push(request);
        }
        let removed = activation.disposers.drain();
        log::debug!("🧹 Deactivated {} ({} routes removed)", activation.tool.name(), removed);
        self.previous_tool = Some(activation.tool.name());
        self.request_repaint();
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.handle_event_at(event, Instant::now())
    }

    /// Dispatch `event` received at `now`.
    ///
    /// Wheel and middle-button input always navigates. Everything else goes
    /// to the active tool first; key presses also run bound commands, and
    /// unhandled keys fall through to keyboard panning.
    pub fn handle_event_at(&mut self, event: &InputEvent, now: Instant) -> bool {
        if let Some(pointer) = event.pointer() {
            if self.touch.should_drop(pointer.source, now) {
                log::trace!("Dropping synthesized mouse event");
                return false;
            }
        }

        let navigation_first = match event {
            InputEvent::Wheel { .. } => true,
            InputEvent::PointerDown(p) | InputEvent::PointerUp(p) => p.button == PointerButton::Middle,
            InputEvent::PointerMove(_) => self.navigation.is_panning(),
            _ => false,
        };
        if navigation_first {
            if self.navigation.handle(&mut self.session.camera, event) {
                self.request_repaint();
            }
            return true;
        }

        if let InputEvent::KeyDown { key, modifiers } = event {
            let commands = self.bindings.commands_for(key, *modifiers).to_vec();
            if commands.iter().any(|command| self.run_command(command, None)) {
                return true;
            }
        }

        let subscribed = self.session.routes().handles(event.kind());
        let mut handled = false;
        if subscribed {
            if let Some(active) = self.active.as_mut() {
                let mut ctx = self.session.context(&mut active.disposers);
                handled = active.tool.handle_event(&mut ctx, event);
            }
        }

        if !handled && matches!(event, InputEvent::KeyDown { .. }) {
            handled = self.navigation.handle(&mut self.session.camera, event);
            if handled {
                self.session.layer.changed();
            }
        }

        if self.session.layer.is_changed() {
            self.scheduler.request();
        }
        handled
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Run a named command.
    ///
    /// `editor.*` commands are handled here, `<tool>.activate` switches
    /// tools, and everything else goes to the active tool if it registered
    /// the name.
    pub fn run_command(&mut self, name: &str, arg: Option<f64>) -> bool {
        match name {
            "editor.undo" => return self.undo(),
            "editor.redo" => return self.redo(),
            "editor.toggle_measures" => {
                let show = !self.session.settings.show_measures;
                self.set_show_measures(show);
                return true;
            }
            "editor.fit" => {
                let changed = self.session.camera.scale_to_fit();
                if changed {
                    self.request_repaint();
                }
                return changed;
            }
            _ => {}
        }

        if let Some(tool) = name.strip_suffix(".activate") {
            if self.factories.contains_key(tool) {
                return self.activate_tool(tool).is_ok();
            }
        }

        if !self.session.routes().has_command(name) {
            log::debug!("No handler for command {}", name);
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let done = active
            .tool
            .run_command(&mut self.session.context(&mut active.disposers), name, arg);
        if self.session.layer.is_changed() {
            self.scheduler.request();
        }
        done
    }

    pub fn undo(&mut self) -> bool {
        let done = undo_command(&mut self.session.undo, &mut self.session.store);
        if done {
            self.request_repaint();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = redo_command(&mut self.session.undo, &mut self.session.store);
        if done {
            self.request_repaint();
        }
        done
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Send queued commits to `backend` and hand each result back to the
    /// tool that queued it. Returns the number of commits sent.
    pub async fn flush_commits<B: AnnotationBackend>(&mut self, backend: &mut B) -> usize {
        let mut flushed = 0;

        for request in std::mem::take(&mut self.orphaned) {
            // The tool that queued this one is gone; only the store sees the result.
            let _ = self.persist(backend, request).await;
            flushed += 1;
        }

        let request = self.active.as_mut().and_then(|a| a.tool.take_commit());
        if let Some(request) = request {
            let result = self.persist(backend, request).await;
            if let Some(active) = self.active.as_mut() {
                active
                    .tool
                    .finish_commit(&mut self.session.context(&mut active.disposers), &result);
            }
            flushed += 1;
        }

        if flushed > 0 {
            self.request_repaint();
        }
        flushed
    }

    async fn persist<B: AnnotationBackend>(&mut self, backend: &mut B, request: CommitRequest) -> CommitResult {
        let result = match request {
            CommitRequest::Create(params) => match backend.create_annotation(params).await {
                Ok(Some(annotation)) => {
                    log::info!("✅ Created annotation {} (class={})", annotation.id, annotation.class_id);
                    self.session.store.insert(annotation.clone());
                    self.session.undo.push(Command::AddAnnotation {
                        annotation: annotation.clone(),
                    });
                    Ok(Some(annotation))
                }
                Ok(None) => {
                    log::debug!("Backend declined to create the annotation");
                    Ok(None)
                }
                Err(err) => Err(err),
            },
            CommitRequest::Update {
                previous,
                updated,
                undo,
            } => match backend.persist_update_annotation(&updated).await {
                Ok(()) => {
                    log::info!("💾 Updated annotation {}", updated.id);
                    self.session.store.insert(updated.clone());
                    self.session.undo.push(undo);
                    Ok(Some(updated))
                }
                Err(err) => {
                    self.session.store.insert(previous);
                    Err(err)
                }
            },
        };

        if let Err(err) = &result {
            log::warn!("⚠️ Persisting annotation failed: {}", err);
            self.notifier.notify(&format!("Failed to save annotation: {err}"));
        }
        result
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw all annotations and, when subscribed, the active tool's overlay.
    pub fn render(&self, draw: &mut dyn DrawContext) {
        let options = SceneOptions {
            frame: self.session.frame_index(),
            filter: self.session.filter,
            show_measures: self.session.settings.show_measures,
        };
        render_annotations(
            draw,
            &self.session.camera,
            &self.session.store,
            &self.session.classes,
            &options,
        );

        if !self.session.routes().renders() {
            return;
        }
        if let Some(active) = &self.active {
            let view = ToolView {
                camera: &self.session.camera,
                store: &self.session.store,
                frame: self.session.frame_index(),
                show_measures: self.session.settings.show_measures,
            };
            active.tool.render(draw, &view);
        }
    }

    /// Called once per display refresh. Paints when anything changed since
    /// the last painted frame.
    pub fn render_frame(&mut self, now: Instant, draw: &mut dyn DrawContext) -> Option<Frame> {
        if self.session.layer.take_changed() || self.session.store.is_dirty() {
            self.session.store.clear_dirty();
            self.scheduler.request();
        }
        let frame = self.scheduler.begin_frame(now)?;
        self.render(draw);
        Some(frame)
    }
}
