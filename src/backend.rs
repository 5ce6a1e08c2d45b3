//! Collaborators the engine talks to: the persistence backend and the user
//! notification channel.
//!
//! Persistence is the only asynchronous boundary. Tools queue a
//! [`CommitRequest`]; the editor awaits the backend and hands the result
//! back to the tool.

use std::cell::RefCell;

use crate::error::PersistenceError;
use crate::model::{Annotation, ClassId, FrameIndex, ShapeVariant};
use crate::undo::Command;

/// Parameters for creating a new annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAnnotationParams {
    pub class_id: ClassId,
    pub shape: ShapeVariant,
    /// Set for annotations created on a video frame
    pub frame: Option<FrameIndex>,
}

/// Work a tool wants persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitRequest {
    Create(CreateAnnotationParams),
    Update {
        /// The annotation as it was before the edit; restored on failure
        previous: Annotation,
        updated: Annotation,
        /// Pushed onto the undo stack once the update is persisted
        undo: Command,
    },
}

/// Result of a commit, handed back to the tool that requested it.
pub type CommitResult = Result<Option<Annotation>, PersistenceError>;

/// Remote persistence of annotations.
#[expect(async_fn_in_trait)]
pub trait AnnotationBackend {
    /// Create an annotation. `Ok(None)` means the backend declined without
    /// an error (nothing is created).
    async fn create_annotation(
        &mut self,
        params: CreateAnnotationParams,
    ) -> Result<Option<Annotation>, PersistenceError>;

    /// Persist an edited annotation.
    async fn persist_update_annotation(
        &mut self,
        annotation: &Annotation,
    ) -> Result<(), PersistenceError>;
}

/// User-visible notifications.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Notifier that forwards to the log, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::warn!("🔔 {}", message);
    }
}

/// Notifier that keeps every message, for embedding in tests and tooling.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Backend that keeps annotations in memory and assigns sequential ids.
///
/// Failures can be scripted with [`InMemoryBackend::fail_next`].
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    next_id: u64,
    pub created: Vec<Annotation>,
    pub updated: Vec<Annotation>,
    fail_next: Option<PersistenceError>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Make the next create or update call fail with `error`.
    pub fn fail_next(&mut self, error: PersistenceError) {
        self.fail_next = Some(error);
    }

    /// Number of create and update calls that reached the backend.
    pub fn calls(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

impl AnnotationBackend for InMemoryBackend {
    async fn create_annotation(
        &mut self,
        params: CreateAnnotationParams,
    ) -> Result<Option<Annotation>, PersistenceError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let mut annotation = Annotation::new(id, params.class_id, params.shape);
        if let Some(frame) = params.frame {
            annotation = annotation.with_video(frame);
        }
        self.created.push(annotation.clone());
        Ok(Some(annotation))
    }

    async fn persist_update_annotation(
        &mut self,
        annotation: &Annotation,
    ) -> Result<(), PersistenceError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        self.updated.push(annotation.clone());
        Ok(())
    }
}
