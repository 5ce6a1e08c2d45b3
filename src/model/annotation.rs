//! Annotations, their classes and video keyframe bindings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::shape::{ShapeType, ShapeVariant};
use super::skeleton::Skeleton;
use crate::error::InterpolationError;
use crate::interpolate::{DEFAULT_ALGORITHM, interpolate};

/// Unique identifier for an annotation.
pub type AnnotationId = u64;

/// Identifier of an annotation class.
pub type ClassId = u32;

/// Video frame index.
pub type FrameIndex = u32;

// ============================================================================
// Annotation Class
// ============================================================================

/// Read-only class metadata supplied by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationClass {
    pub id: ClassId,
    pub name: String,
    /// RGB color used for every shape of this class
    pub color: [u8; 3],
    /// Shape types annotations of this class may use
    pub shape_types: Vec<ShapeType>,
    /// Node layout for skeleton classes, normalized to `0..=1`
    #[serde(default)]
    pub skeleton: Option<Skeleton>,
}

impl AnnotationClass {
    pub fn new(id: ClassId, name: impl Into<String>, color: [u8; 3], shape_types: Vec<ShapeType>) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            shape_types,
            skeleton: None,
        }
    }

    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = Some(skeleton);
        self
    }

    pub fn supports(&self, shape: ShapeType) -> bool {
        self.shape_types.contains(&shape)
    }
}

// ============================================================================
// Video Binding
// ============================================================================

/// Result of looking up a video annotation at a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameShape {
    pub shape: ShapeVariant,
    /// `true` when `shape` is stored at exactly this frame
    pub is_keyframe: bool,
}

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

/// Keyframes of a video annotation.
///
/// Only keyframes are stored. A lookup inside a segment resolves to a
/// keyframe or an interpolation between the keyframes around it; outside
/// every segment it yields nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoBinding {
    pub frames: BTreeMap<FrameIndex, ShapeVariant>,
    /// Half-open `[start, end)` frame ranges in which the annotation exists
    pub segments: Vec<[FrameIndex; 2]>,
    #[serde(default)]
    pub interpolated: bool,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl VideoBinding {
    /// A binding with a single keyframe at `frame`, alive for that frame.
    pub fn new(frame: FrameIndex, shape: ShapeVariant) -> Self {
        let mut frames = BTreeMap::new();
        frames.insert(frame, shape);
        Self {
            frames,
            segments: vec![[frame, frame.saturating_add(1)]],
            interpolated: true,
            algorithm: default_algorithm(),
        }
    }

    /// The segment containing `frame`, if any.
    pub fn segment_at(&self, frame: FrameIndex) -> Option<[FrameIndex; 2]> {
        self.segments
            .iter()
            .copied()
            .find(|[start, end]| *start <= frame && frame < *end)
    }

    pub fn is_keyframe(&self, frame: FrameIndex) -> bool {
        self.frames.contains_key(&frame)
    }

    pub fn keyframe_mut(&mut self, frame: FrameIndex) -> Option<&mut ShapeVariant> {
        self.frames.get_mut(&frame)
    }

    /// Shape at `frame`.
    ///
    /// Within a segment: an exact keyframe wins; with keyframes only on one
    /// side the nearest one is used; with both, the shape is interpolated
    /// when interpolation is enabled and the previous keyframe is held
    /// otherwise.
    pub fn infer(&self, frame: FrameIndex) -> Result<Option<FrameShape>, InterpolationError> {
        if self.segment_at(frame).is_none() {
            return Ok(None);
        }
        if let Some(shape) = self.frames.get(&frame) {
            return Ok(Some(FrameShape {
                shape: shape.clone(),
                is_keyframe: true,
            }));
        }

        let prev = self.frames.range(..frame).next_back();
        let next = self.frames.range(frame..).next();
        let shape = match (prev, next) {
            (None, None) => return Ok(None),
            (None, Some((_, next))) => next.clone(),
            (Some((_, prev)), None) => prev.clone(),
            (Some((_, prev)), Some(_)) if !self.interpolated => prev.clone(),
            (Some((&p, prev)), Some((&n, next))) => {
                let factor = f64::from(frame - p) / f64::from(n - p);
                interpolate(prev, next, factor, &self.algorithm)?
            }
        };
        Ok(Some(FrameShape {
            shape,
            is_keyframe: false,
        }))
    }

    /// Store `shape` as the keyframe at `frame`, extending the segments to
    /// cover it.
    pub fn set_keyframe(&mut self, frame: FrameIndex, shape: ShapeVariant) {
        self.frames.insert(frame, shape);
        if self.segment_at(frame).is_none() {
            self.segments.push([frame, frame.saturating_add(1)]);
            self.merge_segments();
        }
    }

    /// Turn the inferred shape at `frame` into a keyframe. Returns the
    /// keyframe, or `None` when the frame is outside every segment.
    pub fn ensure_keyframe(
        &mut self,
        frame: FrameIndex,
    ) -> Result<Option<&mut ShapeVariant>, InterpolationError> {
        if !self.frames.contains_key(&frame) {
            match self.infer(frame)? {
                Some(inferred) => {
                    self.frames.insert(frame, inferred.shape);
                }
                None => return Ok(None),
            }
        }
        Ok(self.frames.get_mut(&frame))
    }

    pub fn remove_keyframe(&mut self, frame: FrameIndex) -> Option<ShapeVariant> {
        self.frames.remove(&frame)
    }

    fn merge_segments(&mut self) {
        self.segments.sort_unstable();
        let mut merged: Vec<[FrameIndex; 2]> = Vec::with_capacity(self.segments.len());
        for [start, end] in self.segments.drain(..) {
            match merged.last_mut() {
                Some(last) if start <= last[1] => last[1] = last[1].max(end),
                _ => merged.push([start, end]),
            }
        }
        self.segments = merged;
    }
}

// ============================================================================
// Annotation
// ============================================================================

fn default_visible() -> bool {
    true
}

/// A single annotation on an image or video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier for this annotation.
    pub id: AnnotationId,
    /// The class of this annotation.
    pub class_id: ClassId,
    /// Shape on an image. For video annotations this is the most recently
    /// edited keyframe; lookups go through [`Annotation::shape_at`].
    pub shape: ShapeVariant,
    #[serde(skip)]
    pub selected: bool,
    #[serde(skip)]
    pub highlighted: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Suggested by a model rather than drawn by a user
    #[serde(default)]
    pub inferred: bool,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoBinding>,
}

impl Annotation {
    pub fn new(id: AnnotationId, class_id: ClassId, shape: ShapeVariant) -> Self {
        Self {
            id,
            class_id,
            shape,
            selected: false,
            highlighted: false,
            visible: true,
            inferred: false,
            z_index: 0,
            video: None,
        }
    }

    /// Attach a video binding with a single keyframe at `frame`.
    pub fn with_video(mut self, frame: FrameIndex) -> Self {
        self.video = Some(VideoBinding::new(frame, self.shape.clone()));
        self
    }

    pub fn is_video(&self) -> bool {
        self.video.is_some()
    }

    /// Shape visible at `frame`. Image annotations ignore the frame.
    pub fn shape_at(&self, frame: FrameIndex) -> Result<Option<FrameShape>, InterpolationError> {
        match &self.video {
            Some(video) => video.infer(frame),
            None => Ok(Some(FrameShape {
                shape: self.shape.clone(),
                is_keyframe: true,
            })),
        }
    }

    /// Editable shape at `frame`. For video annotations a keyframe is
    /// created from the inferred shape first.
    pub fn editable_shape_at(
        &mut self,
        frame: FrameIndex,
    ) -> Result<Option<&mut ShapeVariant>, InterpolationError> {
        match &mut self.video {
            Some(video) => video.ensure_keyframe(frame),
            None => Ok(Some(&mut self.shape)),
        }
    }

    /// Replace the shape at `frame`; for video annotations this writes the
    /// keyframe and mirrors it into `shape`.
    pub fn set_shape_at(&mut self, frame: FrameIndex, shape: ShapeVariant) {
        if let Some(video) = &mut self.video {
            video.set_keyframe(frame, shape.clone());
        }
        self.shape = shape;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CompoundPath, ImagePoint};

    fn triangle(dx: f64) -> ShapeVariant {
        ShapeVariant::Polygon(CompoundPath::from_points([
            ImagePoint::new(dx, 0.0),
            ImagePoint::new(dx + 10.0, 0.0),
            ImagePoint::new(dx + 5.0, 10.0),
        ]))
    }

    fn first_x(shape: &ShapeVariant) -> f64 {
        shape.vertex(0).map(|p| p.x).unwrap_or(f64::NAN)
    }

    fn binding() -> VideoBinding {
        let mut video = VideoBinding::new(10, triangle(0.0));
        video.set_keyframe(20, triangle(10.0));
        video.segments = vec![[5, 30]];
        video
    }

    #[test]
    fn test_infer_keyframe_and_interpolation() {
        let video = binding();

        let at_key = video.infer(10).expect("infer").expect("inside");
        assert!(at_key.is_keyframe);
        assert_eq!(at_key.shape, triangle(0.0));

        let mid = video.infer(15).expect("infer").expect("inside");
        assert!(!mid.is_keyframe);
        assert!((first_x(&mid.shape) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_infer_single_sided_and_outside() {
        let video = binding();
        assert_eq!(first_x(&video.infer(7).expect("infer").expect("inside").shape), 0.0);
        assert_eq!(first_x(&video.infer(25).expect("infer").expect("inside").shape), 10.0);
        assert_eq!(video.infer(30).expect("infer"), None);
        assert_eq!(video.infer(2).expect("infer"), None);
    }

    #[test]
    fn test_infer_holds_previous_without_interpolation() {
        let mut video = binding();
        video.interpolated = false;
        let held = video.infer(19).expect("infer").expect("inside");
        assert_eq!(held.shape, triangle(0.0));
    }

    #[test]
    fn test_unsupported_algorithm_is_an_error() {
        let mut video = binding();
        video.algorithm = "spline-2.0".into();
        assert_eq!(
            video.infer(15),
            Err(InterpolationError::UnsupportedAlgorithm("spline-2.0".into()))
        );
        // Exact keyframes do not need the algorithm.
        assert!(video.infer(10).is_ok());
    }

    #[test]
    fn test_set_keyframe_merges_segments() {
        let mut video = VideoBinding::new(3, triangle(0.0));
        video.set_keyframe(4, triangle(1.0));
        assert_eq!(video.segments, vec![[3, 5]]);
        video.set_keyframe(9, triangle(2.0));
        assert_eq!(video.segments, vec![[3, 5], [9, 10]]);
    }

    #[test]
    fn test_editable_shape_creates_keyframe() {
        let mut annotation = Annotation::new(1, 1, triangle(0.0)).with_video(10);
        if let Some(video) = &mut annotation.video {
            video.set_keyframe(20, triangle(10.0));
            video.segments = vec![[10, 21]];
        }
        assert!(annotation.editable_shape_at(15).expect("infer").is_some());
        assert!(annotation.video.as_ref().is_some_and(|v| v.is_keyframe(15)));
        assert!(annotation.editable_shape_at(40).expect("infer").is_none());
    }

    #[test]
    fn test_annotation_serde_defaults() {
        let json = r#"{ "id": 3, "class_id": 1, "shape": { "type": "graph", "nodes": [] } }"#;
        let annotation: Annotation = serde_json::from_str(json).expect("parse");
        assert!(annotation.visible);
        assert_eq!(annotation.z_index, 0);
        assert!(!annotation.is_video());
    }

    #[test]
    fn test_class_supports() {
        let class = AnnotationClass::new(1, "car", [255, 0, 0], vec![ShapeType::Polygon]);
        assert!(class.supports(ShapeType::Polygon));
        assert!(!class.supports(ShapeType::Ellipse));
    }
}
