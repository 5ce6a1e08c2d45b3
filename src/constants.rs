//! Global constants for the annotation engine.

/// Minimum number of vertices of a committed ring.
pub const MIN_PATH_VERTICES: usize = 3;

// ============================================================================
// Camera
// ============================================================================

/// Screen-space radius around the first vertex that closes a polygon.
pub const CLOSING_THRESHOLD_PX: f64 = 8.0;

/// Largest allowed camera scale.
pub const MAX_SCALE: f64 = 50.0;

/// Screen pixels of image content that stay visible when scrolling.
pub const CONTENT_VISIBILITY_MARGIN: f64 = 20.0;

/// Scroll deltas are divided by this factor.
pub const SCROLL_SCALING_FACTOR: f64 = 2.0;

/// Zoom factor applied per wheel notch.
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

/// Offset applied per arrow/WASD key press, in screen pixels.
pub const KEY_PAN_OFFSET: f64 = 28.0;

// ============================================================================
// Editing
// ============================================================================

/// Screen-space radius for vertex hit testing.
pub const VERTEX_HIT_THRESHOLD_PX: f64 = 5.0;

/// Screen-space distance for offering point insertion on an edge.
pub const EDGE_HIT_THRESHOLD_PX: f64 = 5.0;

/// Image-space distance below which a new polygon point is ignored.
pub const MIN_VERTEX_DISTANCE: f64 = 1.0;

/// Image-space spacing of points inserted between polygon vertices.
pub const INTERPOLATION_STEP: f64 = 1.0;

/// Default simplification tolerance in image pixels.
pub const DEFAULT_SIMPLIFY_EPSILON: f64 = 0.5;

/// Screen-space drag distance before a press becomes a drag.
pub const MIN_DRAG_DISTANCE: f64 = 3.0;

/// Window after a touch event during which mouse events are ignored.
pub const TOUCH_SUPPRESSION_MS: u64 = 500;

// ============================================================================
// Brush
// ============================================================================

/// Largest allowed chord error of a round tip, in image pixels.
pub const TIP_MAX_CHORD_ERROR: f64 = 2.5;

/// Side count of the smallest round tip.
pub const TIP_MIN_SIDES: usize = 12;

/// Default brush diameter.
pub const DEFAULT_BRUSH_SIZE: f64 = 10.0;

/// Largest brush diameter.
pub const MAX_BRUSH_SIZE: f64 = 1000.0;

/// Factor applied by the grow/shrink commands.
pub const BRUSH_SCALING_FACTOR: f64 = 1.618;
