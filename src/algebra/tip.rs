//! Brush tip polygons and stroke sweeping.

use serde::{Deserialize, Serialize};

use super::Region;
use crate::constants::{TIP_MAX_CHORD_ERROR, TIP_MIN_SIDES};
use crate::geometry::ImagePoint;

/// Upper bound on round tip refinement.
const TIP_MAX_SIDES: usize = 1536;

/// Decimal digits kept for tip vertex coordinates.
const TIP_PRECISION: i32 = 2;

/// Shape of the brush tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipShape {
    #[default]
    Round,
    Squared,
}

/// Number of sides used for a tip of the given shape and radius.
///
/// Round tips start at 12 sides and double until the sagitta of one side
/// is within [`TIP_MAX_CHORD_ERROR`].
pub fn get_sides(shape: TipShape, radius: f64) -> usize {
    match shape {
        TipShape::Squared => 4,
        TipShape::Round => {
            let mut sides = TIP_MIN_SIDES;
            while chord_error(radius, sides) > TIP_MAX_CHORD_ERROR && sides < TIP_MAX_SIDES {
                sides *= 2;
            }
            sides
        }
    }
}

/// Maximum distance between a regular polygon's edge and its circumcircle.
fn chord_error(radius: f64, sides: usize) -> f64 {
    radius.abs() * (1.0 - (std::f64::consts::PI / sides as f64).cos())
}

/// Whether a round tip with `sides` sides is too coarse for `radius`.
pub fn is_tip_to_be_rebuilt(radius: f64, sides: usize) -> bool {
    sides < get_sides(TipShape::Round, radius)
}

/// Regular polygon of `sides` vertices centered at the origin, first vertex
/// on the positive x axis.
pub fn build_regular_polygon_path(radius: f64, sides: usize) -> Vec<ImagePoint> {
    let step = std::f64::consts::TAU / sides as f64;
    (0..sides)
        .map(|i| {
            let angle = step * i as f64;
            ImagePoint::new(radius * angle.cos(), radius * angle.sin()).rounded(TIP_PRECISION)
        })
        .collect()
}

/// Axis-aligned square inscribed in the circle of the given radius.
pub fn build_square_path(radius: f64) -> Vec<ImagePoint> {
    let h = radius / std::f64::consts::SQRT_2;
    [(h, h), (-h, h), (-h, -h), (h, -h)]
        .into_iter()
        .map(|(x, y)| ImagePoint::new(x, y).rounded(TIP_PRECISION))
        .collect()
}

/// Centered tip polygon for a shape and radius.
pub fn build_tip_path(shape: TipShape, radius: f64) -> Vec<ImagePoint> {
    match shape {
        TipShape::Round => build_regular_polygon_path(radius, get_sides(shape, radius)),
        TipShape::Squared => build_square_path(radius),
    }
}

/// Translate a centered tip so it is centered on `at`.
pub fn translate_path(at: ImagePoint, path: &[ImagePoint]) -> Vec<ImagePoint> {
    path.iter().map(|&p| p + at).collect()
}

/// Region covered by the tip placed at `at`.
pub fn tip_region(at: ImagePoint, tip: &[ImagePoint]) -> Region {
    Region::from_ring(translate_path(at, tip))
}

/// Region swept by a convex tip moving in a straight line from `prev` to
/// `next`: the convex hull of the tip at both positions.
pub fn sweep_tip(prev: ImagePoint, next: ImagePoint, tip: &[ImagePoint]) -> Region {
    let mut points = translate_path(prev, tip);
    points.extend(translate_path(next, tip));
    Region::from_ring(convex_hull(points))
}

/// Andrew's monotone chain; counter-clockwise (y-up) without collinear points.
pub fn convex_hull(mut points: Vec<ImagePoint>) -> Vec<ImagePoint> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<ImagePoint> = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<ImagePoint> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn turn(o: ImagePoint, a: ImagePoint, b: ImagePoint) -> f64 {
    (a - o).cross(b - o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{point_in_path, signed_area};

    fn coords(path: &[ImagePoint]) -> Vec<(f64, f64)> {
        path.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_build_regular_polygon_path() {
        let path = build_regular_polygon_path(10.0, 12);
        assert_eq!(
            coords(&path),
            vec![
                (10.0, 0.0),
                (8.66, 5.0),
                (5.0, 8.66),
                (0.0, 10.0),
                (-5.0, 8.66),
                (-8.66, 5.0),
                (-10.0, 0.0),
                (-8.66, -5.0),
                (-5.0, -8.66),
                (0.0, -10.0),
                (5.0, -8.66),
                (8.66, -5.0),
            ]
        );
    }

    #[test]
    fn test_build_square_path() {
        let path = build_square_path(10.0);
        assert_eq!(
            coords(&path),
            vec![(7.07, 7.07), (-7.07, 7.07), (-7.07, -7.07), (7.07, -7.07)]
        );
    }

    #[test]
    fn test_is_tip_to_be_rebuilt() {
        assert!(is_tip_to_be_rebuilt(100.0, 12));
        assert!(!is_tip_to_be_rebuilt(100.0, 30));
    }

    #[test]
    fn test_get_sides() {
        assert_eq!(get_sides(TipShape::Squared, 10.0), 4);
        assert_eq!(get_sides(TipShape::Squared, 1000.0), 4);
        assert_eq!(get_sides(TipShape::Round, 10.0), 12);
        assert_eq!(get_sides(TipShape::Round, 1000.0), 48);
    }

    #[test]
    fn test_translate_path() {
        let path = translate_path(ImagePoint::new(5.0, 5.0), &build_regular_polygon_path(10.0, 12));
        assert_eq!(path[0], ImagePoint::new(15.0, 5.0));
        assert!((path[1].x - 13.66).abs() < 1e-9);
        assert!((path[1].y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_convex_hull_drops_interior_points() {
        let hull = convex_hull(vec![
            ImagePoint::new(0.0, 0.0),
            ImagePoint::new(10.0, 0.0),
            ImagePoint::new(5.0, 2.0),
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(0.0, 10.0),
            ImagePoint::new(5.0, 0.0),
        ]);
        assert_eq!(hull.len(), 4);
        assert!(signed_area(&hull) > 0.0);
    }

    #[test]
    fn test_sweep_tip_bridges_the_gap() {
        let tip = build_tip_path(TipShape::Round, 5.0);
        let sweep = sweep_tip(ImagePoint::new(0.0, 0.0), ImagePoint::new(40.0, 0.0), &tip);
        let ring = &sweep.rings()[0];

        // Midway between the samples, far outside both tip circles.
        assert!(point_in_path(ImagePoint::new(20.0, 0.0), ring));
        // Touches both tips: contains both sample centers.
        assert!(point_in_path(ImagePoint::new(0.5, 0.0), ring));
        assert!(point_in_path(ImagePoint::new(39.5, 0.0), ring));
        assert!(sweep.area() > 0.0);
    }
}
