//! Dirty tracking and repaint coalescing.
//!
//! Mutations mark a [`Layer`] as changed. The embedder drives a
//! [`FrameScheduler`] once per display refresh; any number of changes made
//! between two ticks result in a single paint.

use web_time::{Duration, Instant};

/// A paintable layer with a dirty flag.
#[derive(Debug, Clone)]
pub struct Layer {
    name: &'static str,
    changed: bool,
}

impl Layer {
    /// Create a layer. New layers start dirty so the first frame paints them.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            changed: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Mark the layer as needing a repaint.
    #[inline]
    pub fn changed(&mut self) {
        self.changed = true;
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Return the dirty flag and clear it.
    #[inline]
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }
}

/// Information about a frame handed out by [`FrameScheduler::begin_frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Sequence number, starting at 1.
    pub index: u64,
    /// Time since the previous painted frame.
    pub delta: Duration,
}

/// Coalesces repaint requests into at most one paint per tick.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    requested: bool,
    frames: u64,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a repaint on the next tick.
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Called once per display refresh. Returns a frame when a repaint was
    /// requested since the last painted frame.
    pub fn begin_frame(&mut self, now: Instant) -> Option<Frame> {
        if !std::mem::replace(&mut self.requested, false) {
            return None;
        }
        self.frames += 1;
        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        log::trace!("🖌️ frame {} (+{:?})", self.frames, delta);
        Some(Frame {
            index: self.frames,
            delta,
        })
    }

    /// Number of frames painted so far.
    pub fn frames_painted(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_starts_dirty() {
        let mut layer = Layer::new("annotations");
        assert!(layer.take_changed());
        assert!(!layer.is_changed());
    }

    #[test]
    fn test_changes_coalesce_into_one_frame() {
        let mut scheduler = FrameScheduler::new();
        let now = Instant::now();
        scheduler.request();
        scheduler.request();
        scheduler.request();

        assert!(scheduler.begin_frame(now).is_some());
        assert!(scheduler.begin_frame(now).is_none());
        assert_eq!(scheduler.frames_painted(), 1);
    }

    #[test]
    fn test_frame_delta_tracks_previous_frame() {
        let mut scheduler = FrameScheduler::new();
        let start = Instant::now();
        scheduler.request();
        let first = scheduler.begin_frame(start).expect("first frame");
        assert_eq!(first.delta, Duration::ZERO);

        scheduler.request();
        let second = scheduler
            .begin_frame(start + Duration::from_millis(16))
            .expect("second frame");
        assert_eq!(second.index, 2);
        assert_eq!(second.delta, Duration::from_millis(16));
    }
}
