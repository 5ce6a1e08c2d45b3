//! Pan and zoom shared by every tool, plus touch/mouse deduplication.

use std::time::Duration;

use web_time::Instant;

use super::{InputEvent, Modifiers, PointerButton, PointerSource};
use crate::camera::Camera;
use crate::constants::{KEY_PAN_OFFSET, TOUCH_SUPPRESSION_MS, WHEEL_ZOOM_FACTOR};
use crate::geometry::ScreenPoint;

/// Camera navigation that runs when the active tool leaves an event alone.
///
/// - Ctrl/Cmd + wheel zooms around the cursor, plain wheel scrolls
/// - Middle-button drag pans
/// - Arrow keys and WASD pan by a fixed offset
#[derive(Debug, Default)]
pub struct Navigation {
    /// Last cursor position of a middle-button drag
    panning: Option<ScreenPoint>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        self.panning.is_some()
    }

    /// Apply `event` to `camera`. Returns `true` when the camera changed.
    pub fn handle(&mut self, camera: &mut Camera, event: &InputEvent) -> bool {
        match event {
            InputEvent::Wheel {
                position,
                delta,
                modifiers,
            } => wheel(camera, *position, *delta, *modifiers),
            InputEvent::PointerDown(p) if p.button == PointerButton::Middle => {
                self.panning = Some(p.position);
                false
            }
            InputEvent::PointerMove(p) => match self.panning {
                Some(last) => {
                    self.panning = Some(p.position);
                    camera.pan_by(p.position - last)
                }
                None => false,
            },
            InputEvent::PointerUp(p) if p.button == PointerButton::Middle => {
                self.panning = None;
                false
            }
            InputEvent::KeyDown { key, modifiers } if !modifiers.command() => match key_pan_delta(key) {
                Some(delta) => camera.set_offset(camera.offset() + delta),
                None => false,
            },
            _ => false,
        }
    }
}

fn wheel(camera: &mut Camera, position: ScreenPoint, delta: ScreenPoint, modifiers: Modifiers) -> bool {
    if modifiers.command() {
        let factor = if delta.y < 0.0 {
            WHEEL_ZOOM_FACTOR
        } else {
            1.0 / WHEEL_ZOOM_FACTOR
        };
        camera.zoom(factor, position)
    } else {
        camera.scroll(delta)
    }
}

/// Offset change for a panning key.
fn key_pan_delta(key: &str) -> Option<ScreenPoint> {
    let (dx, dy) = match key.to_ascii_lowercase().as_str() {
        "arrowleft" | "a" => (-1.0, 0.0),
        "arrowright" | "d" => (1.0, 0.0),
        "arrowup" | "w" => (0.0, -1.0),
        "arrowdown" | "s" => (0.0, 1.0),
        _ => return None,
    };
    Some(ScreenPoint::new(dx, dy) * KEY_PAN_OFFSET)
}

// ============================================================================
// Touch Suppression
// ============================================================================

/// Drops the mouse events browsers synthesize after a touch.
#[derive(Debug, Clone)]
pub struct TouchSuppression {
    window: Duration,
    last_touch: Option<Instant>,
}

impl Default for TouchSuppression {
    fn default() -> Self {
        Self::new(Duration::from_millis(TOUCH_SUPPRESSION_MS))
    }
}

impl TouchSuppression {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_touch: None,
        }
    }

    /// Record a pointer event from `source` at `now`. Returns `true` when
    /// the event is a mouse event inside the suppression window.
    pub fn should_drop(&mut self, source: PointerSource, now: Instant) -> bool {
        match source {
            PointerSource::Touch => {
                self.last_touch = Some(now);
                false
            }
            PointerSource::Mouse => self
                .last_touch
                .is_some_and(|touch| now.saturating_duration_since(touch) < self.window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Size;
    use crate::tools::PointerEvent;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn camera() -> Camera {
        Camera::new(Size::new(200.0, 200.0), Size::new(100.0, 100.0))
    }

    #[test]
    fn test_ctrl_wheel_zooms_around_cursor() {
        let mut cam = camera();
        let mut nav = Navigation::new();
        let pivot = ScreenPoint::new(50.0, 50.0);
        let before = cam.screen_to_image(pivot);
        let changed = nav.handle(
            &mut cam,
            &InputEvent::Wheel {
                position: pivot,
                delta: ScreenPoint::new(0.0, -1.0),
                modifiers: Modifiers::ctrl(),
            },
        );
        assert!(changed);
        assert!(approx_eq(cam.scale(), 2.0 * WHEEL_ZOOM_FACTOR));
        let after = cam.screen_to_image(pivot);
        assert!(approx_eq(before.x, after.x) && approx_eq(before.y, after.y));
    }

    #[test]
    fn test_middle_drag_pans() {
        let mut cam = camera();
        let mut nav = Navigation::new();
        let start = cam.offset();
        let middle = |e: PointerEvent| e.with_button(PointerButton::Middle);
        nav.handle(&mut cam, &InputEvent::PointerDown(middle(PointerEvent::at(10.0, 10.0))));
        assert!(nav.is_panning());
        assert!(nav.handle(&mut cam, &InputEvent::PointerMove(PointerEvent::at(20.0, 15.0))));
        nav.handle(&mut cam, &InputEvent::PointerUp(middle(PointerEvent::at(20.0, 15.0))));
        assert!(!nav.is_panning());
        assert!(approx_eq(cam.offset().x, start.x - 10.0));
        assert!(approx_eq(cam.offset().y, start.y - 5.0));
    }

    #[test]
    fn test_arrow_keys_pan() {
        let mut cam = camera();
        let mut nav = Navigation::new();
        let start = cam.offset();
        assert!(nav.handle(&mut cam, &InputEvent::key("ArrowRight")));
        assert!(approx_eq(cam.offset().x, start.x + KEY_PAN_OFFSET));
        assert!(!nav.handle(&mut cam, &InputEvent::key("q")));
    }

    #[test]
    fn test_touch_suppresses_mouse_within_window() {
        let mut suppression = TouchSuppression::default();
        let t0 = Instant::now();
        assert!(!suppression.should_drop(PointerSource::Mouse, t0));
        assert!(!suppression.should_drop(PointerSource::Touch, t0));
        assert!(suppression.should_drop(PointerSource::Mouse, t0 + Duration::from_millis(100)));
        assert!(!suppression.should_drop(PointerSource::Mouse, t0 + Duration::from_millis(600)));
    }
}
