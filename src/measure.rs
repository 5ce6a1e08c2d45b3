//! Measurements shown next to shapes when the measurement overlay is on.

use crate::geometry::{CompoundPath, ImagePoint, bounds, perimeter, point_in_path, signed_area};
use crate::model::ShapeVariant;

/// Measurements of one shape, in image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Measures {
    /// Where the overlay is anchored (top-right of the bounding box)
    pub anchor: ImagePoint,
    pub width: f64,
    pub height: f64,
    pub area: Option<f64>,
    pub perimeter: Option<f64>,
}

impl Measures {
    fn from_bounds(min: ImagePoint, max: ImagePoint) -> Self {
        Self {
            anchor: ImagePoint::new(max.x, min.y),
            width: max.x - min.x,
            height: max.y - min.y,
            area: None,
            perimeter: None,
        }
    }

    /// Overlay text, one entry per line.
    pub fn labels(&self) -> Vec<String> {
        let mut lines = vec![format!("W: {:.0} px", self.width), format!("H: {:.0} px", self.height)];
        if let Some(area) = self.area {
            lines.push(format!("A: {area:.0} px²"));
        }
        if let Some(perimeter) = self.perimeter {
            lines.push(format!("P: {perimeter:.0} px"));
        }
        lines
    }
}

/// Even-odd area of a compound path: rings nested an odd number of times
/// count as holes.
pub fn compound_area(path: &CompoundPath) -> f64 {
    let rings: Vec<&Vec<_>> = path.rings().filter(|r| !r.is_empty()).collect();
    rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let sample = ring[0].point();
            let depth = rings
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && point_in_path(sample, other.as_slice()))
                .count();
            let area = signed_area(ring.as_slice()).abs();
            if depth % 2 == 0 { area } else { -area }
        })
        .sum()
}

/// Measurements of a committed shape. Shapes without geometry have none.
pub fn measure_shape(shape: &ShapeVariant) -> Option<Measures> {
    let (min, max) = shape.bounds()?;
    let mut measures = Measures::from_bounds(min, max);
    match shape {
        ShapeVariant::Polygon(path) => {
            measures.area = Some(compound_area(path));
            measures.perimeter = Some(path.rings().map(|r| perimeter(r.as_slice())).sum());
        }
        ShapeVariant::Ellipse(ellipse) => {
            measures.area = Some(ellipse.area());
        }
        ShapeVariant::Cuboid(cuboid) => {
            measures.area = Some(signed_area(cuboid.outer.as_slice()).abs());
        }
        ShapeVariant::Skeleton(_) | ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => {}
    }
    Some(measures)
}

/// Measurements of an in-progress polygon, including the segment to the
/// cursor.
pub fn measure_drawing(points: &[ImagePoint], cursor: Option<ImagePoint>) -> Option<Measures> {
    let mut path: Vec<ImagePoint> = points.to_vec();
    path.extend(cursor);
    let (min, max) = bounds(path.iter())?;
    let mut measures = Measures::from_bounds(min, max);
    if path.len() >= 3 {
        measures.area = Some(signed_area(path.as_slice()).abs());
    }
    Some(measures)
}
