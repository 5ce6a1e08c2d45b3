//! Polygon overlay for even-odd regions.
//!
//! Both operands are cut into edges, every edge is split at its crossings
//! with every other edge, coincident vertices are welded, and each
//! resulting sub-edge is classified by sampling a point on either side of
//! it. Sub-edges that separate "in result" from "not in result" are linked
//! back into rings with the result interior on their left, so outer rings
//! come out counter-clockwise (positive signed area) and holes clockwise.

use std::collections::{HashMap, HashSet};

use super::{Region, Ring};
use crate::constants::MIN_PATH_VERTICES;
use crate::error::GeometryError;
use crate::geometry::{ImagePoint, point_in_path, signed_area};

/// Relative tolerance used for snapping and welding.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Relative distance of the classification samples from their edge.
const SAMPLE_OFFSET: f64 = 1e-7;

/// Sine of the angle below which two edges are treated as parallel.
const PARALLEL_SINE: f64 = 1e-12;

/// The set operation applied by [`overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    fn keeps(self, in_a: bool, in_b: bool) -> bool {
        match self {
            BooleanOp::Union => in_a || in_b,
            BooleanOp::Difference => in_a && !in_b,
            BooleanOp::Intersection => in_a && in_b,
        }
    }
}

// ============================================================================
// Entry Point
// ============================================================================

pub(super) fn overlay(a: &Region, b: &Region, op: BooleanOp) -> Result<Region, GeometryError> {
    check_finite(a)?;
    check_finite(b)?;

    let a_rings = clean_rings(a.rings());
    let b_rings = clean_rings(b.rings());

    if b_rings.is_empty() {
        return Ok(match op {
            BooleanOp::Union | BooleanOp::Difference => a.clone(),
            BooleanOp::Intersection => Region::empty(),
        });
    }
    if a_rings.is_empty() {
        return Ok(match op {
            BooleanOp::Union => b.clone(),
            BooleanOp::Difference | BooleanOp::Intersection => Region::empty(),
        });
    }

    let a_op = Operand::new(a_rings);
    let b_op = Operand::new(b_rings);
    let scale = a_op.scale().max(b_op.scale()).max(1.0);
    let tol = RELATIVE_TOLERANCE * scale;

    if !a_op.overlaps(&b_op, tol) {
        match op {
            BooleanOp::Difference => return Ok(a.clone()),
            BooleanOp::Intersection => return Ok(Region::empty()),
            BooleanOp::Union => {}
        }
    }

    let mut edges: Vec<Edge> = a_op
        .rings
        .iter()
        .chain(b_op.rings.iter())
        .flat_map(|r| ring_edges(&r.points))
        .collect();
    split_at_crossings(&mut edges, tol);

    let mut graph = Graph::new(tol);
    graph.build(&edges);
    let directed = graph.classify(&a_op, &b_op, op, SAMPLE_OFFSET * scale);
    let rings = graph.link(&directed)?;

    let mut rings: Vec<Ring> = rings
        .into_iter()
        .map(|r| remove_redundant(r, tol))
        .filter(|r| r.len() >= MIN_PATH_VERTICES && signed_area(r.as_slice()).abs() > tol * scale)
        .collect();
    rings.sort_by(|x, y| signed_area(y.as_slice()).total_cmp(&signed_area(x.as_slice())));

    log::trace!("overlay {:?}: {} rings", op, rings.len());
    Ok(Region::new(rings))
}

fn check_finite(region: &Region) -> Result<(), GeometryError> {
    for (ring, points) in region.rings().iter().enumerate() {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite { ring });
        }
    }
    Ok(())
}

/// Drop repeated vertices and rings that cannot enclose any area.
fn clean_rings(rings: &[Ring]) -> Vec<Ring> {
    rings
        .iter()
        .filter_map(|ring| {
            let mut cleaned: Ring = Vec::with_capacity(ring.len());
            for &p in ring {
                if cleaned.last() != Some(&p) {
                    cleaned.push(p);
                }
            }
            while cleaned.len() > 1 && cleaned.first() == cleaned.last() {
                cleaned.pop();
            }
            (cleaned.len() >= MIN_PATH_VERTICES && signed_area(cleaned.as_slice()) != 0.0)
                .then_some(cleaned)
        })
        .collect()
}

// ============================================================================
// Operands
// ============================================================================

struct BoundedRing {
    points: Ring,
    min: ImagePoint,
    max: ImagePoint,
}

/// One side of the overlay with per-ring bounding boxes for fast rejection.
struct Operand {
    rings: Vec<BoundedRing>,
    min: ImagePoint,
    max: ImagePoint,
}

impl Operand {
    fn new(rings: Vec<Ring>) -> Self {
        let rings: Vec<BoundedRing> = rings
            .into_iter()
            .filter_map(|points| {
                let (min, max) = crate::geometry::bounds(points.iter())?;
                Some(BoundedRing { points, min, max })
            })
            .collect();
        let mut min = ImagePoint::new(f64::INFINITY, f64::INFINITY);
        let mut max = ImagePoint::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for r in &rings {
            min = ImagePoint::new(min.x.min(r.min.x), min.y.min(r.min.y));
            max = ImagePoint::new(max.x.max(r.max.x), max.y.max(r.max.y));
        }
        Self { rings, min, max }
    }

    /// Largest magnitude among the extent and the coordinates themselves.
    fn scale(&self) -> f64 {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.min.x.abs(),
            self.min.y.abs(),
            self.max.x.abs(),
            self.max.y.abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    fn overlaps(&self, other: &Operand, tol: f64) -> bool {
        self.min.x <= other.max.x + tol
            && other.min.x <= self.max.x + tol
            && self.min.y <= other.max.y + tol
            && other.min.y <= self.max.y + tol
    }

    fn contains(&self, p: ImagePoint) -> bool {
        self.rings
            .iter()
            .filter(|r| {
                p.x >= r.min.x
                    && p.x <= r.max.x
                    && p.y >= r.min.y
                    && p.y <= r.max.y
                    && point_in_path(p, r.points.as_slice())
            })
            .count()
            % 2
            == 1
    }
}

// ============================================================================
// Edge Splitting
// ============================================================================

struct Edge {
    start: ImagePoint,
    end: ImagePoint,
    /// Split points with their parameter along the edge.
    cuts: Vec<(f64, ImagePoint)>,
}

impl Edge {
    fn new(start: ImagePoint, end: ImagePoint) -> Self {
        Self {
            start,
            end,
            cuts: Vec::new(),
        }
    }

    fn min_x(&self) -> f64 {
        self.start.x.min(self.end.x)
    }

    fn max_x(&self) -> f64 {
        self.start.x.max(self.end.x)
    }

    fn y_range(&self) -> (f64, f64) {
        (self.start.y.min(self.end.y), self.start.y.max(self.end.y))
    }

    /// Parameter of `p` projected onto the edge's supporting line.
    fn project(&self, p: ImagePoint) -> f64 {
        let d = self.end - self.start;
        (p - self.start).dot(d) / d.dot(d)
    }

    /// The edge split at its cuts, endpoints included.
    fn chain(&self) -> Vec<ImagePoint> {
        let mut cuts = self.cuts.clone();
        cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
        let mut chain = Vec::with_capacity(cuts.len() + 2);
        chain.push(self.start);
        chain.extend(cuts.into_iter().map(|(_, p)| p));
        chain.push(self.end);
        chain
    }
}

fn ring_edges(ring: &[ImagePoint]) -> Vec<Edge> {
    let n = ring.len();
    (0..n).map(|i| Edge::new(ring[i], ring[(i + 1) % n])).collect()
}

/// Record every mutual crossing and collinear overlap as cuts on both edges.
fn split_at_crossings(edges: &mut [Edge], tol: f64) {
    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by(|&i, &j| edges[i].min_x().total_cmp(&edges[j].min_x()));

    for (k, &i) in order.iter().enumerate() {
        let max_x = edges[i].max_x() + tol;
        let (i_lo, i_hi) = edges[i].y_range();
        for &j in &order[k + 1..] {
            if edges[j].min_x() > max_x {
                break;
            }
            let (j_lo, j_hi) = edges[j].y_range();
            if j_lo > i_hi + tol || i_lo > j_hi + tol {
                continue;
            }
            for (target, t, p) in intersect(&edges[i], &edges[j], tol) {
                let edge = if target == 0 { i } else { j };
                edges[edge].cuts.push((t, p));
            }
        }
    }
}

/// Cuts produced by two edges, as `(which edge, parameter, point)`.
fn intersect(e: &Edge, f: &Edge, tol: f64) -> Vec<(u8, f64, ImagePoint)> {
    let r = e.end - e.start;
    let s = f.end - f.start;
    let r_len = r.length();
    let s_len = s.length();
    if r_len <= tol || s_len <= tol {
        return Vec::new();
    }
    let t_tol = tol / r_len;
    let u_tol = tol / s_len;
    let qp = f.start - e.start;
    let denom = r.cross(s);

    if denom.abs() > PARALLEL_SINE * r_len * s_len {
        let t = qp.cross(s) / denom;
        let u = qp.cross(r) / denom;
        if t < -t_tol || t > 1.0 + t_tol || u < -u_tol || u > 1.0 + u_tol {
            return Vec::new();
        }
        // Snap to an existing endpoint so both edges receive the same value.
        let p = if t <= t_tol {
            e.start
        } else if t >= 1.0 - t_tol {
            e.end
        } else if u <= u_tol {
            f.start
        } else if u >= 1.0 - u_tol {
            f.end
        } else {
            e.start + r * t
        };
        return vec![(0, t.clamp(0.0, 1.0), p), (1, u.clamp(0.0, 1.0), p)];
    }

    // Parallel: only collinear overlaps produce cuts.
    if qp.cross(r).abs() / r_len > tol || (f.end - e.start).cross(r).abs() / r_len > tol {
        return Vec::new();
    }
    let mut cuts = Vec::new();
    for p in [f.start, f.end] {
        let t = e.project(p);
        if t > t_tol && t < 1.0 - t_tol {
            cuts.push((0, t, p));
        }
    }
    for p in [e.start, e.end] {
        let u = f.project(p);
        if u > u_tol && u < 1.0 - u_tol {
            cuts.push((1, u, p));
        }
    }
    cuts
}

// ============================================================================
// Planar Graph
// ============================================================================

struct Graph {
    tol: f64,
    points: Vec<ImagePoint>,
    index: HashMap<(u64, u64), usize>,
    parent: Vec<usize>,
    /// Undirected sub-edges between welded nodes.
    edges: Vec<(usize, usize)>,
}

impl Graph {
    fn new(tol: f64) -> Self {
        Self {
            tol,
            points: Vec::new(),
            index: HashMap::new(),
            parent: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn node(&mut self, p: ImagePoint) -> usize {
        // `+ 0.0` folds negative zero into positive zero.
        let key = ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits());
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.points.len();
        self.points.push(p);
        self.parent.push(id);
        self.index.insert(key, id);
        id
    }

    fn find(&mut self, mut id: usize) -> usize {
        while self.parent[id] != id {
            self.parent[id] = self.parent[self.parent[id]];
            id = self.parent[id];
        }
        id
    }

    fn join(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    /// Merge nodes closer than the tolerance.
    fn weld(&mut self) {
        let mut order: Vec<usize> = (0..self.points.len()).collect();
        order.sort_by(|&i, &j| self.points[i].x.total_cmp(&self.points[j].x));
        for (k, &i) in order.iter().enumerate() {
            for &j in &order[k + 1..] {
                if self.points[j].x - self.points[i].x > self.tol {
                    break;
                }
                if (self.points[j].y - self.points[i].y).abs() <= self.tol {
                    self.join(i, j);
                }
            }
        }
    }

    fn build(&mut self, edges: &[Edge]) {
        let chains: Vec<Vec<usize>> = edges
            .iter()
            .map(|e| e.chain().into_iter().map(|p| self.node(p)).collect())
            .collect();
        self.weld();

        let mut seen = HashSet::new();
        for chain in chains {
            for pair in chain.windows(2) {
                let (u, v) = (self.find(pair[0]), self.find(pair[1]));
                if u == v {
                    continue;
                }
                if seen.insert((u.min(v), u.max(v))) {
                    self.edges.push((u, v));
                }
            }
        }
    }

    /// Keep the edges that bound the result and orient them with the result
    /// interior on their left.
    fn classify(&self, a: &Operand, b: &Operand, op: BooleanOp, offset: f64) -> Vec<(usize, usize)> {
        let inside = |p: ImagePoint| op.keeps(a.contains(p), b.contains(p));
        self.edges
            .iter()
            .filter_map(|&(u, v)| {
                let (pu, pv) = (self.points[u], self.points[v]);
                let d = pv - pu;
                let len = d.length();
                let normal = d.normalized().perpendicular() * offset.min(len * 0.25);
                let mid = pu.midpoint(pv);
                let left = inside(mid + normal);
                let right = inside(mid - normal);
                match (left, right) {
                    (true, false) => Some((u, v)),
                    (false, true) => Some((v, u)),
                    _ => None,
                }
            })
            .collect()
    }

    /// Walk the directed edges into closed rings, taking the sharpest left
    /// turn at every node so touching rings stay separate.
    fn link(&self, directed: &[(usize, usize)]) -> Result<Vec<Ring>, GeometryError> {
        let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, &(u, _)) in directed.iter().enumerate() {
            outgoing.entry(u).or_default().push(i);
        }

        let mut used = vec![false; directed.len()];
        let mut rings = Vec::new();
        for start in 0..directed.len() {
            if used[start] {
                continue;
            }
            used[start] = true;
            let (origin, mut at) = directed[start];
            let mut ring = vec![self.points[origin]];
            let mut heading = self.points[at] - self.points[origin];

            while at != origin {
                ring.push(self.points[at]);
                let next = outgoing
                    .get(&at)
                    .into_iter()
                    .flatten()
                    .copied()
                    .filter(|&e| !used[e])
                    .max_by(|&e1, &e2| {
                        let t1 = turn_angle(heading, self.direction(directed[e1]));
                        let t2 = turn_angle(heading, self.direction(directed[e2]));
                        t1.total_cmp(&t2)
                    });
                let Some(next) = next else {
                    let p = self.points[at];
                    return Err(GeometryError::OpenContour { x: p.x, y: p.y });
                };
                used[next] = true;
                heading = self.direction(directed[next]);
                at = directed[next].1;
            }
            rings.push(ring);
        }
        Ok(rings)
    }

    fn direction(&self, (u, v): (usize, usize)) -> ImagePoint {
        self.points[v] - self.points[u]
    }
}

/// Signed turn from `heading` to `out`; reversing counts as the sharpest right.
fn turn_angle(heading: ImagePoint, out: ImagePoint) -> f64 {
    let cross = heading.cross(out);
    let dot = heading.dot(out);
    if cross == 0.0 && dot < 0.0 {
        return -std::f64::consts::PI;
    }
    cross.atan2(dot)
}

/// Remove vertices that are duplicates or lie on the line through their
/// neighbours.
fn remove_redundant(mut ring: Ring, tol: f64) -> Ring {
    loop {
        let n = ring.len();
        if n < MIN_PATH_VERTICES {
            return ring;
        }
        let mut kept: Ring = Vec::with_capacity(n);
        for i in 0..n {
            let prev = kept.last().copied().unwrap_or(ring[n - 1]);
            let next = ring[(i + 1) % n];
            let d1 = ring[i] - prev;
            let d2 = next - ring[i];
            let (l1, l2) = (d1.length(), d2.length());
            let redundant = l1 <= tol || l2 <= tol || d1.cross(d2).abs() <= tol * (l1 + l2);
            if !redundant {
                kept.push(ring[i]);
            }
        }
        if kept.len() == n {
            return kept;
        }
        ring = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::super::{difference, intersection, union};
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn square(x: f64, y: f64, size: f64) -> Region {
        Region::from_ring(vec![
            ImagePoint::new(x, y),
            ImagePoint::new(x + size, y),
            ImagePoint::new(x + size, y + size),
            ImagePoint::new(x, y + size),
        ])
    }

    #[test]
    fn test_empty_operand_returns_input_unchanged() {
        let a = square(0.0, 0.0, 10.0);
        assert_eq!(union(&a, &Region::empty()).expect("union"), a);
        assert_eq!(difference(&a, &Region::empty()).expect("difference"), a);
        assert!(intersection(&a, &Region::empty()).expect("intersection").is_empty());
        assert_eq!(union(&Region::empty(), &a).expect("union"), a);
    }

    #[test]
    fn test_overlapping_squares() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 5.0, 10.0);

        let u = union(&a, &b).expect("union");
        assert_eq!(u.rings().len(), 1);
        assert!(approx_eq(u.area(), 175.0));
        assert_eq!(u.rings()[0].len(), 8);

        let d = difference(&a, &b).expect("difference");
        assert!(approx_eq(d.area(), 75.0));
        assert!(d.contains(ImagePoint::new(2.0, 2.0)));
        assert!(!d.contains(ImagePoint::new(7.0, 7.0)));

        let i = intersection(&a, &b).expect("intersection");
        assert!(approx_eq(i.area(), 25.0));
    }

    #[test]
    fn test_difference_inside_creates_hole() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(3.0, 3.0, 4.0);
        let d = difference(&a, &b).expect("difference");
        assert_eq!(d.rings().len(), 2);
        assert!(signed_area(d.rings()[0].as_slice()) > 0.0);
        assert!(signed_area(d.rings()[1].as_slice()) < 0.0);
        assert!(approx_eq(d.area(), 84.0));
        assert!(d.contains(ImagePoint::new(1.0, 1.0)));
        assert!(!d.contains(ImagePoint::new(5.0, 5.0)));
    }

    #[test]
    fn test_identical_difference_is_empty() {
        let a = square(0.0, 0.0, 10.0);
        assert!(difference(&a, &a).expect("difference").is_empty());
        let u = union(&a, &a).expect("union");
        assert!(approx_eq(u.area(), 100.0));
    }

    #[test]
    fn test_shared_edge_union_merges() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(10.0, 0.0, 10.0);
        let u = union(&a, &b).expect("union");
        assert_eq!(u.rings().len(), 1);
        assert_eq!(u.rings()[0].len(), 4);
        assert!(approx_eq(u.area(), 200.0));
    }

    #[test]
    fn test_corner_touching_union_keeps_two_rings() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(10.0, 10.0, 10.0);
        let u = union(&a, &b).expect("union");
        assert_eq!(u.rings().len(), 2);
        assert!(approx_eq(u.area(), 200.0));
    }

    #[test]
    fn test_disjoint_operands() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(50.0, 50.0, 10.0);
        assert_eq!(difference(&a, &b).expect("difference"), a);
        assert!(intersection(&a, &b).expect("intersection").is_empty());
        let u = union(&a, &b).expect("union");
        assert_eq!(u.rings().len(), 2);
        assert!(approx_eq(u.area(), 200.0));
    }

    #[test]
    fn test_clockwise_input_is_normalized() {
        let mut ring = square(0.0, 0.0, 10.0).into_rings().remove(0);
        ring.reverse();
        let a = Region::from_ring(ring);
        let u = union(&a, &square(5.0, 0.0, 10.0)).expect("union");
        assert!(approx_eq(u.area(), 150.0));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let a = square(0.0, 0.0, 10.0);
        let b = Region::from_ring(vec![
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(f64::NAN, 1.0),
            ImagePoint::new(1.0, 1.0),
        ]);
        assert_eq!(union(&a, &b), Err(GeometryError::NonFinite { ring: 0 }));
    }

    #[test]
    fn test_degenerate_operand_is_ignored() {
        let a = square(0.0, 0.0, 10.0);
        let line = Region::from_ring(vec![
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(5.0, 5.0),
            ImagePoint::new(10.0, 10.0),
        ]);
        assert_eq!(union(&a, &line).expect("union"), a);
    }

    #[test]
    fn test_remove_redundant_keeps_corners() {
        let ring = vec![
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(5.0, 0.0),
            ImagePoint::new(10.0, 0.0),
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(0.0, 10.0),
        ];
        assert_eq!(remove_redundant(ring, 1e-9).len(), 4);
    }
}
