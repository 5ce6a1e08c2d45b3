//! Pseudo-3D cuboid: a front and a back face plus their joint silhouette.

use serde::{Deserialize, Serialize};

use crate::geometry::{EditablePoint, ImagePoint};

/// Axis-aligned rectangular face. Corners are kept rectangular under edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub top_left: EditablePoint,
    pub top_right: EditablePoint,
    pub bottom_right: EditablePoint,
    pub bottom_left: EditablePoint,
}

impl Face {
    /// Face spanned by two opposite corners.
    pub fn from_corners(a: ImagePoint, b: ImagePoint) -> Self {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        Self {
            top_left: EditablePoint::new(min_x, min_y),
            top_right: EditablePoint::new(max_x, min_y),
            bottom_right: EditablePoint::new(max_x, max_y),
            bottom_left: EditablePoint::new(min_x, max_y),
        }
    }

    /// Corners clockwise from the top-left.
    pub fn corners(&self) -> [&EditablePoint; 4] {
        [
            &self.top_left,
            &self.top_right,
            &self.bottom_right,
            &self.bottom_left,
        ]
    }

    pub fn corners_mut(&mut self) -> [&mut EditablePoint; 4] {
        [
            &mut self.top_left,
            &mut self.top_right,
            &mut self.bottom_right,
            &mut self.bottom_left,
        ]
    }

    pub fn translate(&mut self, delta: ImagePoint) {
        for p in self.corners_mut() {
            p.translate(delta);
        }
    }

    /// Move one corner; its two neighbours follow along one axis each.
    fn move_corner(&mut self, index: usize, offset: ImagePoint) {
        let [tl, tr, br, bl] = self.corners_mut();
        match index {
            0 => {
                tl.translate(offset);
                tr.y += offset.y;
                bl.x += offset.x;
            }
            1 => {
                tr.translate(offset);
                tl.y += offset.y;
                br.x += offset.x;
            }
            2 => {
                br.translate(offset);
                tr.x += offset.x;
                bl.y += offset.y;
            }
            _ => {
                bl.translate(offset);
                tl.x += offset.x;
                br.y += offset.y;
            }
        }
    }
}

/// A cuboid seen in perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub front: Face,
    pub back: Face,
    /// Silhouette of both faces; derived, recomputed on every edit.
    #[serde(default)]
    pub outer: Vec<EditablePoint>,
}

/// Number of editable corners (front then back).
pub const CUBOID_CORNERS: usize = 8;

impl Cuboid {
    pub fn new(front: Face, back: Face) -> Self {
        let mut cuboid = Self {
            front,
            back,
            outer: Vec::new(),
        };
        cuboid.update_outer();
        cuboid
    }

    /// All eight corners, front face first.
    pub fn corners(&self) -> Vec<&EditablePoint> {
        self.front
            .corners()
            .into_iter()
            .chain(self.back.corners())
            .collect()
    }

    pub fn corners_mut(&mut self) -> Vec<&mut EditablePoint> {
        self.front
            .corners_mut()
            .into_iter()
            .chain(self.back.corners_mut())
            .collect()
    }

    pub fn translate(&mut self, delta: ImagePoint) {
        self.front.translate(delta);
        self.back.translate(delta);
        self.update_outer();
    }

    /// Move corner `index` (0..4 front, 4..8 back) by `offset`. Returns
    /// `false` when the index is out of range.
    pub fn move_corner(&mut self, index: usize, offset: ImagePoint) -> bool {
        match index {
            0..4 => self.front.move_corner(index, offset),
            4..CUBOID_CORNERS => self.back.move_corner(index - 4, offset),
            _ => return false,
        }
        self.update_outer();
        true
    }

    /// Recompute the silhouette: each side is taken from whichever face
    /// reaches further out on that side.
    pub fn update_outer(&mut self) {
        let (f, b) = (&self.front, &self.back);
        let mut outline: Vec<EditablePoint> = Vec::with_capacity(8);
        let mut push = |p: &EditablePoint| {
            if !outline.iter().any(|q| q.x == p.x && q.y == p.y) {
                outline.push(*p);
            }
        };

        let top = if f.top_left.y < b.top_left.y { f } else { b };
        push(&top.top_left);
        push(&top.top_right);
        let right = if f.top_right.x > b.top_right.x { f } else { b };
        push(&right.top_right);
        push(&right.bottom_right);
        let bottom = if f.bottom_left.y > b.bottom_left.y { f } else { b };
        push(&bottom.bottom_right);
        push(&bottom.bottom_left);
        let left = if f.top_left.x < b.top_left.x { f } else { b };
        push(&left.bottom_left);
        push(&left.top_left);

        self.outer = outline
            .into_iter()
            .map(|p| EditablePoint::new(p.x, p.y))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuboid() -> Cuboid {
        Cuboid::new(
            Face::from_corners(ImagePoint::new(0.0, 10.0), ImagePoint::new(10.0, 20.0)),
            Face::from_corners(ImagePoint::new(5.0, 5.0), ImagePoint::new(15.0, 15.0)),
        )
    }

    fn coords(points: &[EditablePoint]) -> Vec<(f64, f64)> {
        points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_outer_silhouette() {
        let c = cuboid();
        assert_eq!(
            coords(&c.outer),
            vec![
                (5.0, 5.0),
                (15.0, 5.0),
                (15.0, 15.0),
                (10.0, 20.0),
                (0.0, 20.0),
                (0.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_move_corner_keeps_face_rectangular() {
        let mut c = cuboid();
        assert!(c.move_corner(2, ImagePoint::new(2.0, 3.0)));
        let f = &c.front;
        assert_eq!((f.bottom_right.x, f.bottom_right.y), (12.0, 23.0));
        assert_eq!((f.top_right.x, f.top_right.y), (12.0, 10.0));
        assert_eq!((f.bottom_left.x, f.bottom_left.y), (0.0, 23.0));
        assert_eq!((f.top_left.x, f.top_left.y), (0.0, 10.0));
        // Back face untouched.
        assert_eq!(c.back, cuboid().back);
        assert!(c.outer.iter().any(|p| p.x == 12.0 && p.y == 23.0));
        assert!(!c.move_corner(8, ImagePoint::zero()));
    }

    #[test]
    fn test_translate_moves_every_corner() {
        let mut c = cuboid();
        c.translate(ImagePoint::new(1.0, -1.0));
        assert_eq!((c.back.top_left.x, c.back.top_left.y), (6.0, 4.0));
        assert_eq!(c.outer[0].x, 6.0);
    }
}
