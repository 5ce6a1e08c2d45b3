//! Path algebra: boolean operations over polygon regions, brush tips and
//! stroke sweeping.
//!
//! All operations are pure. Failures on degenerate input come back as
//! [`GeometryError`]; the callers decide which previous path stays
//! authoritative.

mod boolean;
mod tip;

pub use boolean::BooleanOp;
pub use tip::{
    TipShape, build_regular_polygon_path, build_square_path, build_tip_path, convex_hull,
    get_sides, is_tip_to_be_rebuilt, sweep_tip, tip_region, translate_path,
};

use crate::constants::MIN_PATH_VERTICES;
use crate::error::GeometryError;
use crate::geometry::{CompoundPath, EditablePoint, ImagePoint, point_in_path, signed_area};

/// A closed ring of image-space points. The closing edge is implicit.
pub type Ring = Vec<ImagePoint>;

/// A set of closed rings filled with the even-odd rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    rings: Vec<Ring>,
}

impl Region {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ring(ring: Ring) -> Self {
        Self { rings: vec![ring] }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn into_rings(self) -> Vec<Ring> {
        self.rings
    }

    /// True when the region has no ring that could enclose any area.
    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(|r| r.len() < MIN_PATH_VERTICES)
    }

    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// Sum of the signed ring areas.
    ///
    /// Exact for output of the boolean operations, where outer rings are
    /// counter-clockwise and holes clockwise.
    pub fn area(&self) -> f64 {
        self.rings.iter().map(|r| signed_area(r.as_slice())).sum()
    }

    /// Even-odd containment.
    pub fn contains(&self, p: ImagePoint) -> bool {
        self.rings.iter().filter(|r| point_in_path(p, r.as_slice())).count() % 2 == 1
    }

    /// Bounding box `(min, max)` of all vertices.
    pub fn bounds(&self) -> Option<(ImagePoint, ImagePoint)> {
        crate::geometry::bounds(self.rings.iter().flatten())
    }

    /// Convert to a compound path, dropping rings with fewer than three
    /// points. The first remaining ring becomes the primary path.
    pub fn to_compound_path(&self) -> CompoundPath {
        let mut rings = self
            .rings
            .iter()
            .filter(|r| r.len() >= MIN_PATH_VERTICES)
            .map(|r| r.iter().copied().map(EditablePoint::from).collect::<Vec<_>>());
        let path = rings.next().unwrap_or_default();
        CompoundPath::new(path, rings.collect())
    }
}

impl From<&CompoundPath> for Region {
    fn from(path: &CompoundPath) -> Self {
        Region::new(
            path.rings()
                .filter(|r| !r.is_empty())
                .map(|r| r.iter().map(EditablePoint::point).collect())
                .collect(),
        )
    }
}

/// Union of two regions. `union(a, ∅)` returns `a` unchanged.
pub fn union(a: &Region, b: &Region) -> Result<Region, GeometryError> {
    boolean::overlay(a, b, BooleanOp::Union)
}

/// `b` subtracted from `a`. `difference(a, ∅)` returns `a` unchanged.
pub fn difference(a: &Region, b: &Region) -> Result<Region, GeometryError> {
    boolean::overlay(a, b, BooleanOp::Difference)
}

/// Area covered by both regions.
pub fn intersection(a: &Region, b: &Region) -> Result<Region, GeometryError> {
    boolean::overlay(a, b, BooleanOp::Intersection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            ImagePoint::new(x, y),
            ImagePoint::new(x + size, y),
            ImagePoint::new(x + size, y + size),
            ImagePoint::new(x, y + size),
        ]
    }

    #[test]
    fn test_compound_path_roundtrip_drops_short_rings() {
        let region = Region::new(vec![
            vec![ImagePoint::new(0.0, 0.0), ImagePoint::new(1.0, 0.0)],
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 2.0),
        ]);
        let path = region.to_compound_path();
        assert_eq!(path.path.len(), 4);
        assert_eq!(path.additional_paths.len(), 1);
        assert_eq!(Region::from(&path).rings().len(), 2);
    }

    #[test]
    fn test_empty_region_converts_to_empty_path() {
        let path = Region::empty().to_compound_path();
        assert!(path.is_empty());
        assert!(path.validate().is_err());
    }

    #[test]
    fn test_contains_even_odd() {
        let region = Region::new(vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 2.0)]);
        assert!(region.contains(ImagePoint::new(1.0, 1.0)));
        assert!(!region.contains(ImagePoint::new(3.0, 3.0)));
    }
}
