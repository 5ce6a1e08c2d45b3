//! Compound paths and proximity queries over polylines.

use serde::{Deserialize, Serialize};

use super::point::{EditablePoint, ImagePoint};
use crate::constants::MIN_PATH_VERTICES;
use crate::error::InvalidCommitError;

/// Anything that has an image-space position.
pub trait AsPoint {
    fn pos(&self) -> ImagePoint;
}

impl AsPoint for ImagePoint {
    fn pos(&self) -> ImagePoint {
        *self
    }
}

impl AsPoint for EditablePoint {
    fn pos(&self) -> ImagePoint {
        self.point()
    }
}

/// Position of a vertex inside a [`CompoundPath`]. Ring 0 is the primary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexRef {
    pub ring: usize,
    pub index: usize,
}

/// A primary closed polyline plus zero or more additional closed polylines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompoundPath {
    pub path: Vec<EditablePoint>,
    #[serde(default)]
    pub additional_paths: Vec<Vec<EditablePoint>>,
}

impl CompoundPath {
    pub fn new(path: Vec<EditablePoint>, additional_paths: Vec<Vec<EditablePoint>>) -> Self {
        Self {
            path,
            additional_paths,
        }
    }

    /// A single-ring path built from plain image points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = ImagePoint>,
    {
        Self::new(points.into_iter().map(EditablePoint::from).collect(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.additional_paths.iter().all(Vec::is_empty)
    }

    /// All rings, primary first.
    pub fn rings(&self) -> impl Iterator<Item = &Vec<EditablePoint>> {
        std::iter::once(&self.path).chain(self.additional_paths.iter())
    }

    pub fn rings_mut(&mut self) -> impl Iterator<Item = &mut Vec<EditablePoint>> {
        std::iter::once(&mut self.path).chain(self.additional_paths.iter_mut())
    }

    pub fn ring(&self, ring: usize) -> Option<&Vec<EditablePoint>> {
        if ring == 0 {
            Some(&self.path)
        } else {
            self.additional_paths.get(ring - 1)
        }
    }

    pub fn ring_mut(&mut self, ring: usize) -> Option<&mut Vec<EditablePoint>> {
        if ring == 0 {
            Some(&mut self.path)
        } else {
            self.additional_paths.get_mut(ring - 1)
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.rings().map(Vec::len).sum()
    }

    /// Map a flat vertex index (rings concatenated in order) to a [`VertexRef`].
    pub fn locate(&self, flat: usize) -> Option<VertexRef> {
        let mut offset = 0;
        for (ring, points) in self.rings().enumerate() {
            if flat < offset + points.len() {
                return Some(VertexRef {
                    ring,
                    index: flat - offset,
                });
            }
            offset += points.len();
        }
        None
    }

    /// Inverse of [`CompoundPath::locate`].
    pub fn flat_index(&self, vertex: VertexRef) -> Option<usize> {
        let ring = self.ring(vertex.ring)?;
        if vertex.index >= ring.len() {
            return None;
        }
        let offset: usize = self.rings().take(vertex.ring).map(Vec::len).sum();
        Some(offset + vertex.index)
    }

    pub fn vertex(&self, vertex: VertexRef) -> Option<&EditablePoint> {
        self.ring(vertex.ring)?.get(vertex.index)
    }

    pub fn vertex_mut(&mut self, vertex: VertexRef) -> Option<&mut EditablePoint> {
        self.ring_mut(vertex.ring)?.get_mut(vertex.index)
    }

    /// Translate every vertex by `delta`.
    pub fn translate(&mut self, delta: ImagePoint) {
        for ring in self.rings_mut() {
            for p in ring.iter_mut() {
                p.translate(delta);
            }
        }
    }

    /// Even-odd containment over all rings.
    pub fn contains_point(&self, p: ImagePoint) -> bool {
        self.rings().filter(|ring| point_in_path(p, ring.as_slice())).count() % 2 == 1
    }

    /// Bounding box `(min, max)` of all vertices.
    pub fn bounds(&self) -> Option<(ImagePoint, ImagePoint)> {
        bounds(self.rings().flatten())
    }

    /// Clear selection/highlight flags on every vertex.
    pub fn clear_flags(&mut self) {
        for ring in self.rings_mut() {
            for p in ring.iter_mut() {
                p.selected = false;
                p.highlighted = false;
            }
        }
    }

    /// Check the commit invariants: every ring has at least three vertices,
    /// finite coordinates, a non-zero area and no self-crossing edges.
    pub fn validate(&self) -> Result<(), InvalidCommitError> {
        if self.path.is_empty() {
            return Err(InvalidCommitError::Empty);
        }
        for (ring_index, ring) in self.rings().enumerate() {
            if ring.len() < MIN_PATH_VERTICES {
                return Err(InvalidCommitError::TooFewVertices {
                    ring: ring_index,
                    count: ring.len(),
                });
            }
            if ring.iter().any(|p| !p.point().is_finite()) {
                return Err(InvalidCommitError::Degenerate { ring: ring_index });
            }
            if signed_area(ring).abs() <= f64::EPSILON {
                return Err(InvalidCommitError::Degenerate { ring: ring_index });
            }
            if ring_self_intersects(ring) {
                return Err(InvalidCommitError::SelfIntersecting { ring: ring_index });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Polyline Queries
// ============================================================================

/// Ray-casting point-in-polygon test for a closed ring.
pub fn point_in_path<P: AsPoint>(p: ImagePoint, path: &[P]) -> bool {
    let n = path.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = path[i].pos();
        let vj = path[j].pos();
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Index of the first vertex within `threshold` of `p`.
pub fn point_is_vertex_of_path<P: AsPoint>(p: ImagePoint, path: &[P], threshold: f64) -> Option<usize> {
    path.iter().position(|v| v.pos().distance_to(p) <= threshold)
}

/// Project `p` onto the segment `a..b`, clamped to the segment.
pub fn anchor_cursor(p: ImagePoint, a: ImagePoint, b: ImagePoint) -> ImagePoint {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: ImagePoint, a: ImagePoint, b: ImagePoint) -> f64 {
    anchor_cursor(p, a, b).distance_to(p)
}

/// A point found on a polyline edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    /// Index of the edge's end vertex; inserting at this index splits the edge.
    pub insert_index: usize,
    /// The projection of the query point onto the edge.
    pub point: ImagePoint,
    pub distance: f64,
}

/// Closest edge of a closed ring within `threshold` of `p`.
pub fn point_on_path<P: AsPoint>(p: ImagePoint, path: &[P], threshold: f64) -> Option<EdgeHit> {
    if path.len() < 2 {
        return None;
    }
    let (min, max) = bounds(path.iter())?;
    if p.x < min.x - threshold
        || p.x > max.x + threshold
        || p.y < min.y - threshold
        || p.y > max.y + threshold
    {
        return None;
    }

    let n = path.len();
    let mut best: Option<EdgeHit> = None;
    for i in 0..n {
        let a = path[i].pos();
        let b = path[(i + 1) % n].pos();
        let projected = anchor_cursor(p, a, b);
        let distance = projected.distance_to(p);
        if distance > threshold {
            continue;
        }
        if best.is_none_or(|hit| distance < hit.distance) {
            best = Some(EdgeHit {
                insert_index: i + 1,
                point: projected,
                distance,
            });
        }
    }
    best
}

/// Axis-aligned bounds of a point set.
pub fn bounds<'a, P, I>(points: I) -> Option<(ImagePoint, ImagePoint)>
where
    P: AsPoint + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?.pos();
    let (mut min, mut max) = (first, first);
    for p in iter {
        let p = p.pos();
        min = ImagePoint::new(min.x.min(p.x), min.y.min(p.y));
        max = ImagePoint::new(max.x.max(p.x), max.y.max(p.y));
    }
    Some((min, max))
}

/// Shoelace signed area of a closed ring.
pub fn signed_area<P: AsPoint>(ring: &[P]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i].pos();
        let b = ring[(i + 1) % n].pos();
        sum += a.cross(b);
    }
    sum / 2.0
}

/// Perimeter of a closed ring.
pub fn perimeter<P: AsPoint>(ring: &[P]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| ring[i].pos().distance_to(ring[(i + 1) % n].pos()))
        .sum()
}

/// Arithmetic mean of the ring's vertices.
pub fn centroid<P: AsPoint>(ring: &[P]) -> Option<ImagePoint> {
    if ring.is_empty() {
        return None;
    }
    let sum = ring
        .iter()
        .fold(ImagePoint::zero(), |acc, p| acc + p.pos());
    Some(sum / ring.len() as f64)
}

/// Whether two segments cross at a single interior point of both.
pub fn segments_cross(a1: ImagePoint, a2: ImagePoint, b1: ImagePoint, b2: ImagePoint) -> bool {
    let d1 = (a2 - a1).cross(b1 - a1);
    let d2 = (a2 - a1).cross(b2 - a1);
    let d3 = (b2 - b1).cross(a1 - b1);
    let d4 = (b2 - b1).cross(a2 - b1);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Whether any two non-adjacent edges of a closed ring cross.
pub fn ring_self_intersects<P: AsPoint>(ring: &[P]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = ring[i].pos();
        let a2 = ring[(i + 1) % n].pos();
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = ring[j].pos();
            let b2 = ring[(j + 1) % n].pos();
            if segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<ImagePoint> {
        vec![
            ImagePoint::new(x, y),
            ImagePoint::new(x + size, y),
            ImagePoint::new(x + size, y + size),
            ImagePoint::new(x, y + size),
        ]
    }

    #[test]
    fn test_point_in_path() {
        let ring = square(0.0, 0.0, 10.0);
        assert!(point_in_path(ImagePoint::new(5.0, 5.0), &ring));
        assert!(!point_in_path(ImagePoint::new(15.0, 5.0), &ring));
        assert!(!point_in_path(ImagePoint::new(5.0, 5.0), &ring[..2]));
    }

    #[test]
    fn test_compound_contains_respects_holes() {
        let path = CompoundPath::new(
            square(0.0, 0.0, 10.0).into_iter().map(Into::into).collect(),
            vec![square(3.0, 3.0, 4.0).into_iter().map(Into::into).collect()],
        );
        assert!(path.contains_point(ImagePoint::new(1.0, 1.0)));
        assert!(!path.contains_point(ImagePoint::new(5.0, 5.0)));
    }

    #[test]
    fn test_anchor_cursor_clamps_to_segment() {
        let a = ImagePoint::new(0.0, 0.0);
        let b = ImagePoint::new(10.0, 0.0);
        assert_eq!(anchor_cursor(ImagePoint::new(5.0, 3.0), a, b), ImagePoint::new(5.0, 0.0));
        assert_eq!(anchor_cursor(ImagePoint::new(-5.0, 3.0), a, b), a);
        assert_eq!(anchor_cursor(ImagePoint::new(15.0, 3.0), a, b), b);
    }

    #[test]
    fn test_point_on_path_finds_closest_edge() {
        let ring = square(0.0, 0.0, 10.0);
        let hit = point_on_path(ImagePoint::new(10.5, 4.0), &ring, 2.0).expect("edge hit");
        assert_eq!(hit.insert_index, 2);
        assert_eq!(hit.point, ImagePoint::new(10.0, 4.0));
        assert!(point_on_path(ImagePoint::new(5.0, 5.0), &ring, 2.0).is_none());
    }

    #[test]
    fn test_point_is_vertex_of_path() {
        let ring = square(0.0, 0.0, 10.0);
        assert_eq!(point_is_vertex_of_path(ImagePoint::new(9.0, 10.5), &ring, 2.0), Some(2));
        assert_eq!(point_is_vertex_of_path(ImagePoint::new(5.0, 5.0), &ring, 2.0), None);
    }

    #[test]
    fn test_area_and_perimeter() {
        let ring = square(0.0, 0.0, 10.0);
        assert!(approx_eq(signed_area(&ring), 100.0));
        assert!(approx_eq(perimeter(&ring), 40.0));
        let reversed: Vec<_> = ring.iter().rev().copied().collect();
        assert!(approx_eq(signed_area(&reversed), -100.0));
    }

    #[test]
    fn test_locate_and_flat_index_roundtrip() {
        let path = CompoundPath::new(
            square(0.0, 0.0, 10.0).into_iter().map(Into::into).collect(),
            vec![square(3.0, 3.0, 4.0).into_iter().map(Into::into).collect()],
        );
        let vertex = path.locate(5).expect("vertex");
        assert_eq!(vertex, VertexRef { ring: 1, index: 1 });
        assert_eq!(path.flat_index(vertex), Some(5));
        assert_eq!(path.locate(8), None);
    }

    #[test]
    fn test_validate_rejects_short_and_crossing_rings() {
        let short = CompoundPath::from_points(square(0.0, 0.0, 1.0).into_iter().take(2));
        assert!(matches!(
            short.validate(),
            Err(InvalidCommitError::TooFewVertices { ring: 0, count: 2 })
        ));

        let bowtie = CompoundPath::from_points([
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(10.0, 0.0),
            ImagePoint::new(0.0, 10.0),
        ]);
        assert!(matches!(
            bowtie.validate(),
            Err(InvalidCommitError::SelfIntersecting { ring: 0 })
        ));

        let line = CompoundPath::from_points([
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(5.0, 0.0),
            ImagePoint::new(10.0, 0.0),
        ]);
        assert!(matches!(line.validate(), Err(InvalidCommitError::Degenerate { ring: 0 })));

        assert!(CompoundPath::from_points(square(0.0, 0.0, 1.0)).validate().is_ok());
    }
}
