//! Screen-space vector paths handed to a [`DrawContext`](crate::DrawContext).

/// A single path instruction in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathVerb {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Close,
    /// A full circle, emitted as its own sub-path.
    Circle { cx: f32, cy: f32, radius: f32 },
}

/// An ordered list of path instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorPath {
    verbs: Vec<PathVerb>,
}

impl VectorPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.verbs.push(PathVerb::MoveTo(x, y));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.verbs.push(PathVerb::LineTo(x, y));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.verbs.push(PathVerb::Close);
        self
    }

    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        self.verbs.push(PathVerb::Circle { cx, cy, radius });
        self
    }

    /// Append a polyline as a new sub-path, optionally closing it.
    ///
    /// Empty input leaves the path untouched.
    pub fn add_polyline<I>(&mut self, points: I, closed: bool) -> &mut Self
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut points = points.into_iter();
        let Some((x, y)) = points.next() else {
            return self;
        };
        self.move_to(x, y);
        for (x, y) in points {
            self.line_to(x, y);
        }
        if closed {
            self.close();
        }
        self
    }

    /// Build a path from a single polyline.
    pub fn polyline<I>(points: I, closed: bool) -> Self
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut path = Self::new();
        path.add_polyline(points, closed);
        path
    }

    pub fn verbs(&self) -> &[PathVerb] {
        &self.verbs
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` of all vertices.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let mut bounds: Option<(f32, f32, f32, f32)> = None;
        let mut include = |x: f32, y: f32| {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        };
        for verb in &self.verbs {
            match *verb {
                PathVerb::MoveTo(x, y) | PathVerb::LineTo(x, y) => include(x, y),
                PathVerb::Circle { cx, cy, radius } => {
                    include(cx - radius, cy - radius);
                    include(cx + radius, cy + radius);
                }
                PathVerb::Close => {}
            }
        }
        bounds
    }
}
