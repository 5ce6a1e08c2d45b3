//! Linear interpolation of shapes between two video keyframes.
//!
//! Polygon rings with differing vertex counts are aligned by index: the
//! shorter ring is padded until both have the same length, then each
//! coordinate is interpolated linearly. Factors `0` and `1` return exact
//! clones of the keyframes.

use std::fmt;
use std::str::FromStr;

use crate::error::InterpolationError;
use crate::geometry::{CompoundPath, EditablePoint, ImagePoint};
use crate::model::{Cuboid, ELLIPSE_CONTROL_POINTS, Ellipse, Face, ShapeVariant, Skeleton};

/// Algorithm assigned to new video annotations.
pub const DEFAULT_ALGORITHM: &str = "linear-1.1";

/// Supported interpolation algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationAlgorithm {
    /// Shorter ring padded by repeating evenly spaced vertices.
    Linear10,
    /// Shorter ring padded by splitting its longest edges.
    #[default]
    Linear11,
}

impl InterpolationAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            InterpolationAlgorithm::Linear10 => "linear-1.0",
            InterpolationAlgorithm::Linear11 => "linear-1.1",
        }
    }
}

impl fmt::Display for InterpolationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterpolationAlgorithm {
    type Err = InterpolationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear-1.0" => Ok(InterpolationAlgorithm::Linear10),
            "linear-1.1" => Ok(InterpolationAlgorithm::Linear11),
            other => Err(InterpolationError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Interpolate between two keyframes of the same shape variant.
///
/// `algorithm` is the identifier stored on the video annotation; unknown
/// identifiers are an error.
pub fn interpolate(
    prev: &ShapeVariant,
    next: &ShapeVariant,
    factor: f64,
    algorithm: &str,
) -> Result<ShapeVariant, InterpolationError> {
    let algorithm = algorithm.parse::<InterpolationAlgorithm>()?;
    interpolate_with(prev, next, factor, algorithm)
}

pub fn interpolate_with(
    prev: &ShapeVariant,
    next: &ShapeVariant,
    factor: f64,
    algorithm: InterpolationAlgorithm,
) -> Result<ShapeVariant, InterpolationError> {
    if prev.shape_type() != next.shape_type() {
        return Err(InterpolationError::VariantMismatch {
            prev: prev.type_name(),
            next: next.type_name(),
        });
    }
    if factor <= 0.0 {
        return Ok(prev.clone());
    }
    if factor >= 1.0 {
        return Ok(next.clone());
    }

    let shape = match (prev, next) {
        (ShapeVariant::Polygon(a), ShapeVariant::Polygon(b)) => {
            ShapeVariant::Polygon(interpolate_polygon(a, b, factor, algorithm))
        }
        (ShapeVariant::Ellipse(a), ShapeVariant::Ellipse(b)) => {
            ShapeVariant::Ellipse(interpolate_ellipse(a, b, factor))
        }
        (ShapeVariant::Skeleton(a), ShapeVariant::Skeleton(b)) => {
            ShapeVariant::Skeleton(interpolate_skeleton(a, b, factor))
        }
        (ShapeVariant::Cuboid(a), ShapeVariant::Cuboid(b)) => {
            ShapeVariant::Cuboid(interpolate_cuboid(a, b, factor))
        }
        // Links hold no geometry; they switch at the next keyframe.
        (ShapeVariant::StringLink(_), ShapeVariant::StringLink(_))
        | (ShapeVariant::Graph(_), ShapeVariant::Graph(_)) => prev.clone(),
        _ => {
            return Err(InterpolationError::VariantMismatch {
                prev: prev.type_name(),
                next: next.type_name(),
            });
        }
    };
    Ok(shape)
}

// ============================================================================
// Polygons
// ============================================================================

fn interpolate_polygon(
    prev: &CompoundPath,
    next: &CompoundPath,
    factor: f64,
    algorithm: InterpolationAlgorithm,
) -> CompoundPath {
    let path = interpolate_ring(&prev.path, &next.path, factor, algorithm);
    let mut additional_paths: Vec<Vec<EditablePoint>> = prev
        .additional_paths
        .iter()
        .enumerate()
        .map(|(i, ring)| match next.additional_paths.get(i) {
            Some(other) => interpolate_ring(ring, other, factor, algorithm),
            None => ring.clone(),
        })
        .collect();
    additional_paths.extend(
        next.additional_paths
            .iter()
            .skip(prev.additional_paths.len())
            .cloned(),
    );
    CompoundPath::new(path, additional_paths)
}

/// Index-aligned interpolation of two rings.
pub fn interpolate_ring(
    prev: &[EditablePoint],
    next: &[EditablePoint],
    factor: f64,
    algorithm: InterpolationAlgorithm,
) -> Vec<EditablePoint> {
    if prev.is_empty() || next.is_empty() {
        return prev.to_vec();
    }
    let target = prev.len().max(next.len());
    let a = pad_ring(prev, target, algorithm);
    let b = pad_ring(next, target, algorithm);
    a.iter()
        .zip(&b)
        .map(|(p, q)| EditablePoint::from(p.lerp(*q, factor)))
        .collect()
}

/// Pad `ring` to exactly `target` vertices.
pub fn pad_ring(
    ring: &[EditablePoint],
    target: usize,
    algorithm: InterpolationAlgorithm,
) -> Vec<ImagePoint> {
    let points: Vec<ImagePoint> = ring.iter().map(EditablePoint::point).collect();
    if points.len() >= target || points.is_empty() {
        return points;
    }
    match algorithm {
        InterpolationAlgorithm::Linear10 => repeat_vertices(&points, target),
        InterpolationAlgorithm::Linear11 => split_longest_edges(points, target),
    }
}

/// Spread `target - n` duplicates evenly over the ring.
fn repeat_vertices(points: &[ImagePoint], target: usize) -> Vec<ImagePoint> {
    let n = points.len();
    let mut out = Vec::with_capacity(target);
    for (i, p) in points.iter().enumerate() {
        // Vertex i is emitted as many times as output slots map back to it.
        let from = i * target / n;
        let to = (i + 1) * target / n;
        out.extend(std::iter::repeat_n(*p, to - from));
    }
    out
}

/// Insert midpoints into the longest edge until the ring has `target`
/// vertices.
fn split_longest_edges(mut points: Vec<ImagePoint>, target: usize) -> Vec<ImagePoint> {
    while points.len() < target {
        let n = points.len();
        let mut longest = 0;
        let mut longest_len = f64::NEG_INFINITY;
        for i in 0..n {
            let len = points[i].distance_to(points[(i + 1) % n]);
            if len > longest_len {
                longest = i;
                longest_len = len;
            }
        }
        let mid = points[longest].midpoint(points[(longest + 1) % n]);
        points.insert(longest + 1, mid);
    }
    points
}

// ============================================================================
// Other shapes
// ============================================================================

/// Control points are paired with the cyclic rotation of `next` that moves
/// them the least, so an ellipse that turned past 45 degrees between
/// keyframes does not flip.
fn interpolate_ellipse(prev: &Ellipse, next: &Ellipse, factor: f64) -> Ellipse {
    let a = prev.control_points().map(|p| p.point());
    let b = next.control_points().map(|p| p.point());
    let cost = |shift: usize| -> f64 {
        (0..ELLIPSE_CONTROL_POINTS)
            .map(|i| a[i].distance_to(b[(i + shift) % ELLIPSE_CONTROL_POINTS]))
            .sum()
    };
    let shift = (0..ELLIPSE_CONTROL_POINTS)
        .min_by(|x, y| cost(*x).total_cmp(&cost(*y)))
        .unwrap_or(0);

    let lerp = |i: usize| a[i].lerp(b[(i + shift) % ELLIPSE_CONTROL_POINTS], factor);
    let center = prev.center().lerp(next.center(), factor);
    let (top, right, bottom, left) = (lerp(0), lerp(1), lerp(2), lerp(3));
    Ellipse {
        center: center.into(),
        right: right.into(),
        top: top.into(),
        left: left.into(),
        bottom: bottom.into(),
    }
}

fn interpolate_skeleton(prev: &Skeleton, next: &Skeleton, factor: f64) -> Skeleton {
    let mut out = prev.clone();
    for (node, other) in out.nodes.iter_mut().zip(&next.nodes) {
        node.point = node.point.point().lerp(other.point.point(), factor).into();
    }
    out
}

fn interpolate_face(prev: &Face, next: &Face, factor: f64) -> Face {
    let mut out = prev.clone();
    for (p, q) in out.corners_mut().into_iter().zip(next.corners()) {
        *p = p.point().lerp(q.point(), factor).into();
    }
    out
}

fn interpolate_cuboid(prev: &Cuboid, next: &Cuboid, factor: f64) -> Cuboid {
    Cuboid::new(
        interpolate_face(&prev.front, &next.front, factor),
        interpolate_face(&prev.back, &next.back, factor),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Graph, GraphNode, SkeletonNode};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: ImagePoint, b: ImagePoint) -> bool {
        a.distance_to(b) < EPSILON
    }

    fn ring(points: &[(f64, f64)]) -> Vec<EditablePoint> {
        points.iter().map(|&(x, y)| EditablePoint::new(x, y)).collect()
    }

    fn polygon(points: &[(f64, f64)], extra: Vec<Vec<EditablePoint>>) -> ShapeVariant {
        ShapeVariant::Polygon(CompoundPath::new(ring(points), extra))
    }

    #[test]
    fn test_endpoints_are_exact() {
        let a = polygon(&[(0.1, 0.2), (10.0, 0.0), (5.0, 10.0)], vec![]);
        let b = polygon(&[(3.0, 3.0), (13.0, 3.0), (13.0, 13.0), (3.0, 13.0)], vec![]);
        assert_eq!(interpolate(&a, &b, 0.0, "linear-1.1"), Ok(a.clone()));
        assert_eq!(interpolate(&a, &b, 1.0, "linear-1.1"), Ok(b.clone()));
        assert_eq!(interpolate(&a, &b, 1.0, "linear-1.0"), Ok(b));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let a = polygon(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], vec![]);
        assert_eq!(
            interpolate(&a, &a, 0.5, "nearest"),
            Err(InterpolationError::UnsupportedAlgorithm("nearest".into()))
        );
        assert_eq!(
            "linear-1.0".parse::<InterpolationAlgorithm>(),
            Ok(InterpolationAlgorithm::Linear10)
        );
        assert_eq!(InterpolationAlgorithm::default().name(), DEFAULT_ALGORITHM);
    }

    #[test]
    fn test_variant_mismatch() {
        let a = polygon(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], vec![]);
        let b = ShapeVariant::Graph(Graph::default());
        assert_eq!(
            interpolate(&a, &b, 0.5, DEFAULT_ALGORITHM),
            Err(InterpolationError::VariantMismatch {
                prev: "polygon",
                next: "graph",
            })
        );
    }

    #[test]
    fn test_pad_split_longest_edges() {
        let tri = ring(&[(0.0, 0.0), (10.0, 0.0), (0.0, 2.0)]);
        let padded = pad_ring(&tri, 4, InterpolationAlgorithm::Linear11);
        assert_eq!(padded.len(), 4);
        // The hypotenuse is the longest edge and gets split.
        assert!(approx_eq(padded[2], ImagePoint::new(5.0, 1.0)));
    }

    #[test]
    fn test_pad_repeat_vertices() {
        let tri = ring(&[(0.0, 0.0), (10.0, 0.0), (0.0, 2.0)]);
        let padded = pad_ring(&tri, 6, InterpolationAlgorithm::Linear10);
        assert_eq!(padded.len(), 6);
        assert_eq!(padded[0], padded[1]);
        assert_eq!(padded[2], padded[3]);
        assert_eq!(padded[4], ImagePoint::new(0.0, 2.0));
    }

    #[test]
    fn test_midway_polygon() {
        let a = polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], vec![]);
        let b = polygon(&[(10.0, 0.0), (20.0, 0.0), (20.0, 10.0)], vec![]);
        let mid = interpolate(&a, &b, 0.5, DEFAULT_ALGORITHM).expect("interpolate");
        assert_eq!(mid.vertex(0), Some(ImagePoint::new(5.0, 0.0)));
        assert_eq!(mid.vertex(2), Some(ImagePoint::new(15.0, 10.0)));
    }

    #[test]
    fn test_unmatched_additional_paths_pass_through() {
        let hole = ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)]);
        let island = ring(&[(50.0, 50.0), (60.0, 50.0), (60.0, 60.0)]);
        let a = polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], vec![hole.clone()]);
        let b = polygon(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
            vec![ring(&[(3.0, 1.0), (4.0, 1.0), (4.0, 2.0)]), island.clone()],
        );
        let Ok(ShapeVariant::Polygon(mid)) = interpolate(&a, &b, 0.5, DEFAULT_ALGORITHM) else {
            panic!("expected polygon");
        };
        assert_eq!(mid.additional_paths.len(), 2);
        assert_eq!(mid.additional_paths[0][0], EditablePoint::new(2.0, 1.0));
        assert_eq!(mid.additional_paths[1], island);

        let Ok(ShapeVariant::Polygon(back)) = interpolate(&b, &a, 0.5, DEFAULT_ALGORITHM) else {
            panic!("expected polygon");
        };
        assert_eq!(back.additional_paths[1], island);
    }

    #[test]
    fn test_ellipse_pairs_rotated_control_points() {
        let a = Ellipse::from_diagonal(ImagePoint::new(0.0, 0.0), ImagePoint::new(10.0, 6.0));
        // Same ellipse with control points relabelled a quarter turn.
        let mut b = a.clone();
        b.top = a.right;
        b.right = a.bottom;
        b.bottom = a.left;
        b.left = a.top;
        let Ok(ShapeVariant::Ellipse(mid)) = interpolate(
            &ShapeVariant::Ellipse(a.clone()),
            &ShapeVariant::Ellipse(b),
            0.5,
            DEFAULT_ALGORITHM,
        ) else {
            panic!("expected ellipse");
        };
        assert!(approx_eq(mid.center(), a.center()));
        assert!((mid.radius_x() - a.radius_x()).abs() < EPSILON);
        assert!(mid.is_consistent(EPSILON));
    }

    #[test]
    fn test_skeleton_keeps_previous_occlusion() {
        let node = |x: f64, occluded| SkeletonNode {
            name: "n".into(),
            point: EditablePoint::new(x, 0.0),
            occluded,
        };
        let a = ShapeVariant::Skeleton(Skeleton::new(vec![node(0.0, true)], vec![]));
        let b = ShapeVariant::Skeleton(Skeleton::new(vec![node(10.0, false)], vec![]));
        let Ok(ShapeVariant::Skeleton(mid)) = interpolate(&a, &b, 0.25, DEFAULT_ALGORITHM) else {
            panic!("expected skeleton");
        };
        assert_eq!(mid.nodes[0].point.x, 2.5);
        assert!(mid.nodes[0].occluded);
    }

    #[test]
    fn test_cuboid_recomputes_outer() {
        let face = |x: f64| Face::from_corners(ImagePoint::new(x, 0.0), ImagePoint::new(x + 10.0, 10.0));
        let a = ShapeVariant::Cuboid(Cuboid::new(face(0.0), face(5.0)));
        let b = ShapeVariant::Cuboid(Cuboid::new(face(10.0), face(15.0)));
        let Ok(ShapeVariant::Cuboid(mid)) = interpolate(&a, &b, 0.5, DEFAULT_ALGORITHM) else {
            panic!("expected cuboid");
        };
        assert_eq!(mid.front.top_left.x, 5.0);
        assert_eq!(mid, Cuboid::new(face(5.0), face(10.0)));
    }

    #[test]
    fn test_graph_steps_at_next_keyframe() {
        let a = ShapeVariant::Graph(Graph::default());
        let b = ShapeVariant::Graph(Graph {
            nodes: vec![GraphNode {
                id: 1,
                name: "a".into(),
            }],
            edges: vec![],
        });
        assert_eq!(interpolate(&a, &b, 0.9, DEFAULT_ALGORITHM), Ok(a.clone()));
        assert_eq!(interpolate(&a, &b, 1.0, DEFAULT_ALGORITHM), Ok(b));
    }
}
