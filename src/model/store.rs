//! Storage for the annotations of a single image or video.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::annotation::{Annotation, AnnotationId, ClassId, FrameIndex};
use super::shape::ShapeVariant;
use crate::error::InterpolationError;
use crate::geometry::ImagePoint;

/// All annotations of one item, plus selection and highlight state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationStore {
    /// All annotations, keyed by their ID.
    annotations: HashMap<AnnotationId, Annotation>,
    /// Counter for generating unique annotation IDs.
    next_id: AnnotationId,
    /// Currently selected annotation ID.
    #[serde(skip)]
    selected_id: Option<AnnotationId>,
    /// Annotation under the pointer.
    #[serde(skip)]
    highlighted_id: Option<AnnotationId>,
    /// Dirty flag - set when annotations, selection or highlight change.
    #[serde(skip)]
    dirty: bool,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            annotations: HashMap::new(),
            next_id: 1,
            selected_id: None,
            highlighted_id: None,
            dirty: true, // Start dirty so the first frame paints
        }
    }

    /// Check if the store has been modified since last clear_dirty().
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after repainting.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // ========================================================================
    // Insertion / Removal
    // ========================================================================

    /// Create an annotation with a fresh ID.
    pub fn add(&mut self, class_id: ClassId, shape: ShapeVariant) -> AnnotationId {
        let id = self.next_id.max(1);
        self.insert(Annotation::new(id, class_id, shape))
    }

    /// Insert an annotation keeping its ID (e.g. one returned by a
    /// backend). An existing annotation with that ID is replaced.
    pub fn insert(&mut self, mut annotation: Annotation) -> AnnotationId {
        let id = annotation.id;
        self.next_id = self.next_id.max(id + 1);
        annotation.selected = self.selected_id == Some(id);
        annotation.highlighted = self.highlighted_id == Some(id);
        self.annotations.insert(id, annotation);
        self.mark_dirty();
        id
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let removed = self.annotations.remove(&id);
        if removed.is_some() {
            self.mark_dirty();
        }
        if self.selected_id == Some(id) {
            self.selected_id = None;
        }
        if self.highlighted_id == Some(id) {
            self.highlighted_id = None;
        }
        removed
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Mutable access. Marks the store dirty when the annotation exists.
    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        let annotation = self.annotations.get_mut(&id)?;
        self.dirty = true;
        Some(annotation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.annotations.is_empty() {
            self.mark_dirty();
        }
        self.annotations.clear();
        self.selected_id = None;
        self.highlighted_id = None;
    }

    /// Annotations in paint order: ascending z-index, then ID.
    pub fn ordered(&self) -> Vec<&Annotation> {
        let mut list: Vec<&Annotation> = self.annotations.values().collect();
        list.sort_by_key(|a| (a.z_index, a.id));
        list
    }

    /// Put an annotation above all others.
    pub fn bring_to_front(&mut self, id: AnnotationId) -> bool {
        let Some(others_top) = self
            .annotations
            .values()
            .filter(|a| a.id != id)
            .map(|a| a.z_index)
            .max()
        else {
            return false;
        };
        match self.annotations.get_mut(&id) {
            Some(annotation) if annotation.z_index <= others_top => {
                annotation.z_index = others_top + 1;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Selection / Highlight
    // ========================================================================

    /// Select an annotation, clearing the previous selection and the vertex
    /// flags of the previously selected shape.
    pub fn select(&mut self, id: Option<AnnotationId>) {
        if self.selected_id == id {
            return;
        }
        if let Some(previous) = self.selected_id.and_then(|p| self.annotations.get_mut(&p)) {
            previous.selected = false;
            previous.shape.clear_flags();
        }
        self.selected_id = id.filter(|id| self.annotations.contains_key(id));
        if let Some(current) = self.selected_id.and_then(|c| self.annotations.get_mut(&c)) {
            current.selected = true;
        }
        log::debug!("🎯 Selected annotation {:?}", self.selected_id);
        self.mark_dirty();
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected_id
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected_id.and_then(|id| self.annotations.get(&id))
    }

    pub fn highlight(&mut self, id: Option<AnnotationId>) {
        if self.highlighted_id == id {
            return;
        }
        if let Some(previous) = self.highlighted_id.and_then(|p| self.annotations.get_mut(&p)) {
            previous.highlighted = false;
        }
        self.highlighted_id = id.filter(|id| self.annotations.contains_key(id));
        if let Some(current) = self.highlighted_id.and_then(|c| self.annotations.get_mut(&c)) {
            current.highlighted = true;
        }
        self.mark_dirty();
    }

    pub fn highlighted(&self) -> Option<AnnotationId> {
        self.highlighted_id
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Topmost visible annotation containing `point` at `frame`.
    pub fn hit_test(&self, point: ImagePoint, frame: FrameIndex) -> Option<AnnotationId> {
        self.ordered()
            .into_iter()
            .rev()
            .filter(|a| a.visible)
            .find(|a| match a.shape_at(frame) {
                Ok(Some(found)) => found.shape.contains_point(point),
                _ => false,
            })
            .map(|a| a.id)
    }

    /// Flat index of the vertex of annotation `id` within `threshold` of
    /// `point` at `frame`.
    pub fn vertex_at(
        &self,
        id: AnnotationId,
        frame: FrameIndex,
        point: ImagePoint,
        threshold: f64,
    ) -> Option<usize> {
        let shape = self.get(id)?.shape_at(frame).ok()??.shape;
        shape.vertex_at(point, threshold)
    }

    /// Editable shape of annotation `id` at `frame`, creating a video
    /// keyframe when needed.
    pub fn shape_at_mut(
        &mut self,
        id: AnnotationId,
        frame: FrameIndex,
    ) -> Result<Option<&mut ShapeVariant>, InterpolationError> {
        match self.annotations.get_mut(&id) {
            Some(annotation) => {
                self.dirty = true;
                annotation.editable_shape_at(frame)
            }
            None => Ok(None),
        }
    }

    /// Replace the shape of annotation `id` at `frame`. Returns `false` if
    /// the annotation does not exist.
    pub fn set_shape(&mut self, id: AnnotationId, frame: FrameIndex, shape: ShapeVariant) -> bool {
        match self.annotations.get_mut(&id) {
            Some(annotation) => {
                annotation.set_shape_at(frame, shape);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Import/Export
    // ========================================================================

    /// Export annotations to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import annotations from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut store: Self = serde_json::from_str(json)?;
        store.dirty = true;
        Ok(store)
    }
}
