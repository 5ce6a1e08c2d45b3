//! Geometry primitives: space-tagged points, compound paths, polyline
//! queries and simplification.

mod path;
mod point;
mod simplify;

pub use path::{
    AsPoint, CompoundPath, EdgeHit, VertexRef, anchor_cursor, bounds, centroid,
    distance_to_segment, perimeter, point_in_path, point_is_vertex_of_path, point_on_path,
    ring_self_intersects, segments_cross, signed_area,
};
pub use point::{EditablePoint, Image, ImagePoint, Point, Screen, ScreenPoint};
pub use simplify::{
    interpolate_between_points, interpolate_path, interpolate_ring, maybe_simplify, simplify, simplify_ring,
};
