//! Annotation data model: shapes, annotations, classes, video keyframes and
//! the per-item store.

mod annotation;
mod cuboid;
mod ellipse;
mod link;
mod shape;
mod skeleton;
mod store;

pub use annotation::{
    Annotation, AnnotationClass, AnnotationId, ClassId, FrameIndex, FrameShape, VideoBinding,
};
pub use cuboid::{CUBOID_CORNERS, Cuboid, Face};
pub use ellipse::{ELLIPSE_CONTROL_POINTS, Ellipse, ResizeMode};
pub use link::{Graph, GraphEdge, GraphNode, StringLink, StringSource};
pub use shape::{ELLIPSE_OUTLINE_SEGMENTS, ShapeType, ShapeVariant};
pub use skeleton::{Skeleton, SkeletonEdge, SkeletonNode};
pub use store::AnnotationStore;
