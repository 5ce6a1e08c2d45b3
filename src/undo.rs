//! Undo/Redo system for annotation edits.
//!
//! Each undoable edit is recorded as a [`Command`] after it has been applied
//! to the [`AnnotationStore`]. Undoing reverses the command against the
//! store; redoing applies it again.

use crate::geometry::ImagePoint;
use crate::model::{Annotation, AnnotationId, AnnotationStore, ClassId, FrameIndex, ShapeVariant};

// ============================================================================
// Command Types
// ============================================================================

/// A command that can be undone and redone.
/// Each command stores enough information to reverse its effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add an annotation
    AddAnnotation {
        /// The annotation that was added
        annotation: Annotation,
    },
    /// Remove an annotation
    RemoveAnnotation {
        /// The annotation that was removed (stored for undo)
        annotation: Annotation,
    },
    /// Replace an annotation's shape at a frame
    ModifyShape {
        annotation_id: AnnotationId,
        frame: FrameIndex,
        /// The shape before modification
        old_shape: ShapeVariant,
        /// The shape after modification
        new_shape: ShapeVariant,
    },
    /// Drag of a single vertex
    MoveVertex {
        annotation_id: AnnotationId,
        frame: FrameIndex,
        /// Flat vertex index
        vertex: usize,
        before: ImagePoint,
        after: ImagePoint,
    },
    /// Change an annotation's class
    ChangeClass {
        annotation_id: AnnotationId,
        old_class_id: ClassId,
        new_class_id: ClassId,
    },
    /// Batch command - groups multiple commands into one undo step
    Batch {
        /// Description of the batch operation
        description: String,
        /// The commands in this batch
        commands: Vec<Command>,
    },
}

impl Command {
    /// Get a human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            Command::AddAnnotation { .. } => "Add annotation".to_string(),
            Command::RemoveAnnotation { .. } => "Delete annotation".to_string(),
            Command::ModifyShape { .. } => "Edit shape".to_string(),
            Command::MoveVertex { vertex, .. } => format!("Move vertex {vertex}"),
            Command::ChangeClass { .. } => "Change class".to_string(),
            Command::Batch { description, .. } => description.clone(),
        }
    }
}

// ============================================================================
// Undo Stack
// ============================================================================

/// Configuration for the undo stack
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of commands to keep in history
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

/// The undo/redo history stack.
///
/// Maintains two stacks:
/// - `undo_stack`: Commands that can be undone (most recent at the end)
/// - `redo_stack`: Commands that can be redone (most recent at the end)
///
/// Pushing a new command clears the redo stack.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    config: UndoConfig,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Push a command to the undo stack.
    /// This clears the redo stack (can't redo after a new action).
    pub fn push(&mut self, command: Command) {
        log::debug!("📝 Undo: pushed '{}'", command.description());
        self.undo_stack.push(command);
        self.redo_stack.clear();

        // Limit history size
        if self.undo_stack.len() > self.config.max_history {
            let excess = self.undo_stack.len() - self.config.max_history;
            self.undo_stack.drain(..excess);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pop a command for undoing; it moves to the redo stack.
    pub fn pop_undo(&mut self) -> Option<Command> {
        let cmd = self.undo_stack.pop()?;
        log::debug!("⏪ Undo: '{}'", cmd.description());
        self.redo_stack.push(cmd.clone());
        Some(cmd)
    }

    /// Pop a command for redoing; it moves back to the undo stack.
    pub fn pop_redo(&mut self) -> Option<Command> {
        let cmd = self.redo_stack.pop()?;
        log::debug!("⏩ Redo: '{}'", cmd.description());
        self.undo_stack.push(cmd.clone());
        Some(cmd)
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ Undo history cleared");
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

// ============================================================================
// Undo/Redo Execution
// ============================================================================

/// Undo the most recent command against `store`.
/// Returns false if there was nothing to undo.
pub fn undo_command(stack: &mut UndoStack, store: &mut AnnotationStore) -> bool {
    let Some(cmd) = stack.pop_undo() else {
        return false;
    };
    apply_undo(&cmd, store);
    true
}

/// Redo the most recently undone command against `store`.
/// Returns false if there was nothing to redo.
pub fn redo_command(stack: &mut UndoStack, store: &mut AnnotationStore) -> bool {
    let Some(cmd) = stack.pop_redo() else {
        return false;
    };
    apply_redo(&cmd, store);
    true
}

fn apply_undo(cmd: &Command, store: &mut AnnotationStore) {
    match cmd {
        Command::AddAnnotation { annotation } => {
            store.remove(annotation.id);
            log::debug!("⏪ Undid add annotation {}", annotation.id);
        }
        Command::RemoveAnnotation { annotation } => {
            store.insert(annotation.clone());
            log::debug!("⏪ Undid remove annotation {}", annotation.id);
        }
        Command::ModifyShape {
            annotation_id,
            frame,
            old_shape,
            ..
        } => {
            store.set_shape(*annotation_id, *frame, old_shape.clone());
            log::debug!("⏪ Undid shape modification on {}", annotation_id);
        }
        Command::MoveVertex {
            annotation_id,
            frame,
            vertex,
            before,
            ..
        } => {
            place_vertex(store, *annotation_id, *frame, *vertex, *before);
            log::debug!("⏪ Undid vertex move on {}", annotation_id);
        }
        Command::ChangeClass {
            annotation_id,
            old_class_id,
            ..
        } => {
            if let Some(annotation) = store.get_mut(*annotation_id) {
                annotation.class_id = *old_class_id;
            }
        }
        Command::Batch { commands, .. } => {
            // Undo batch in reverse order
            for cmd in commands.iter().rev() {
                apply_undo(cmd, store);
            }
        }
    }
}

fn apply_redo(cmd: &Command, store: &mut AnnotationStore) {
    match cmd {
        Command::AddAnnotation { annotation } => {
            store.insert(annotation.clone());
            log::debug!("⏩ Redid add annotation {}", annotation.id);
        }
        Command::RemoveAnnotation { annotation } => {
            store.remove(annotation.id);
            log::debug!("⏩ Redid remove annotation {}", annotation.id);
        }
        Command::ModifyShape {
            annotation_id,
            frame,
            new_shape,
            ..
        } => {
            store.set_shape(*annotation_id, *frame, new_shape.clone());
            log::debug!("⏩ Redid shape modification on {}", annotation_id);
        }
        Command::MoveVertex {
            annotation_id,
            frame,
            vertex,
            after,
            ..
        } => {
            place_vertex(store, *annotation_id, *frame, *vertex, *after);
            log::debug!("⏩ Redid vertex move on {}", annotation_id);
        }
        Command::ChangeClass {
            annotation_id,
            new_class_id,
            ..
        } => {
            if let Some(annotation) = store.get_mut(*annotation_id) {
                annotation.class_id = *new_class_id;
            }
        }
        Command::Batch { commands, .. } => {
            for cmd in commands {
                apply_redo(cmd, store);
            }
        }
    }
}

fn place_vertex(
    store: &mut AnnotationStore,
    id: AnnotationId,
    frame: FrameIndex,
    vertex: usize,
    position: ImagePoint,
) {
    match store.shape_at_mut(id, frame) {
        Ok(Some(shape)) => {
            if let Some(p) = shape.vertices_mut().into_iter().nth(vertex) {
                p.set(position);
            }
        }
        Ok(None) => {}
        Err(err) => log::warn!("Cannot restore vertex on {}: {}", id, err),
    }
}

// ============================================================================
// Tests
// ============================================================================
