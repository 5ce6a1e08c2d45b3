//! Ellipse geometry with four symmetric control points.
//!
//! `left` is always the reflection of `right` through `center`, and
//! `bottom` the reflection of `top`. Edits go through
//! [`Ellipse::move_vertex`], which keeps both pairs consistent.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::ShapeError;
use crate::geometry::{EditablePoint, ImagePoint};

/// How a control-point drag affects the rest of the ellipse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// The opposite vertex stays put; the center follows the midpoint.
    #[default]
    Free,
    /// The center stays put; the opposite vertex moves symmetrically (Alt).
    Anchored,
    /// The other radius becomes equal to the dragged one (Ctrl).
    Uniform,
    /// The other radius changes by the same amount as the dragged one (Shift).
    Additive,
}

impl ResizeMode {
    /// Pick the mode from held modifiers. Ctrl wins over Shift, Shift over Alt.
    pub fn from_modifiers(ctrl: bool, shift: bool, alt: bool) -> Self {
        if ctrl {
            ResizeMode::Uniform
        } else if shift {
            ResizeMode::Additive
        } else if alt {
            ResizeMode::Anchored
        } else {
            ResizeMode::Free
        }
    }
}

/// An ellipse described by its center and the ends of its two diameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: EditablePoint,
    pub right: EditablePoint,
    pub top: EditablePoint,
    pub left: EditablePoint,
    pub bottom: EditablePoint,
}

/// Number of control points (the center is not a control point).
pub const ELLIPSE_CONTROL_POINTS: usize = 4;

impl Ellipse {
    /// Build from the center and two control points; `left` and `bottom`
    /// are derived.
    pub fn from_center(center: ImagePoint, right: ImagePoint, top: ImagePoint) -> Self {
        Self {
            center: center.into(),
            right: right.into(),
            top: top.into(),
            left: right.reflect_through(center).into(),
            bottom: top.reflect_through(center).into(),
        }
    }

    /// Axis-aligned ellipse inscribed in the box spanned by two corners.
    pub fn from_diagonal(a: ImagePoint, b: ImagePoint) -> Self {
        let center = a.midpoint(b);
        let max_x = a.x.max(b.x);
        let min_y = a.y.min(b.y);
        Self::from_center(
            center,
            ImagePoint::new(max_x, center.y),
            ImagePoint::new(center.x, min_y),
        )
    }

    pub fn center(&self) -> ImagePoint {
        self.center.point()
    }

    pub fn radius_x(&self) -> f64 {
        self.right.point().distance_to(self.center())
    }

    pub fn radius_y(&self) -> f64 {
        self.top.point().distance_to(self.center())
    }

    /// Rotation of the `right` axis in radians.
    pub fn angle(&self) -> f64 {
        let d = self.right.point() - self.center();
        d.y.atan2(d.x)
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius_x() * self.radius_y()
    }

    /// Control points in the order top, right, bottom, left.
    pub fn control_points(&self) -> [&EditablePoint; ELLIPSE_CONTROL_POINTS] {
        [&self.top, &self.right, &self.bottom, &self.left]
    }

    /// Mutable control points in the order top, right, bottom, left.
    pub fn control_points_mut(&mut self) -> [&mut EditablePoint; ELLIPSE_CONTROL_POINTS] {
        [
            &mut self.top,
            &mut self.right,
            &mut self.bottom,
            &mut self.left,
        ]
    }

    /// Whether both symmetric pairs are reflections through the center.
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        let c = self.center();
        self.left.point().distance_to(self.right.point().reflect_through(c)) <= tolerance
            && self.bottom.point().distance_to(self.top.point().reflect_through(c)) <= tolerance
    }

    pub fn translate(&mut self, delta: ImagePoint) {
        self.center.translate(delta);
        for p in self.control_points_mut() {
            p.translate(delta);
        }
    }

    /// Containment test, valid for rotated ellipses.
    pub fn contains(&self, p: ImagePoint) -> bool {
        let (rx, ry) = (self.radius_x(), self.radius_y());
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let (sin, cos) = self.angle().sin_cos();
        let d = p - self.center();
        let tx = cos * d.x + sin * d.y;
        let ty = sin * d.x - cos * d.y;
        (tx * tx) / (rx * rx) + (ty * ty) / (ry * ry) <= 1.0
    }

    /// Outline sampled as a closed polygon.
    pub fn outline(&self, segments: usize) -> Vec<ImagePoint> {
        let c = self.center();
        let u = self.right.point() - c;
        let v = self.top.point() - c;
        (0..segments.max(3))
            .map(|i| {
                let t = TAU * i as f64 / segments.max(3) as f64;
                c + u * t.cos() + v * t.sin()
            })
            .collect()
    }

    /// Move the control point at `index` (top, right, bottom, left) by
    /// `offset`, re-deriving the other points according to `mode`.
    pub fn move_vertex(
        &mut self,
        index: usize,
        offset: ImagePoint,
        mode: ResizeMode,
    ) -> Result<(), ShapeError> {
        if index >= ELLIPSE_CONTROL_POINTS {
            return Err(ShapeError::VertexOutOfRange {
                shape: "ellipse",
                index,
                count: ELLIPSE_CONTROL_POINTS,
            });
        }

        let mut v = self.control_points().map(|p| p.point());
        let mut c = self.center();
        let opposite = (index + 2) % ELLIPSE_CONTROL_POINTS;
        // top <-> right, bottom <-> left
        let sym = index ^ 1;
        let opposite_sym = (sym + 2) % ELLIPSE_CONTROL_POINTS;
        let vertical = index % 2 == 0;

        let old_d = v[index].distance_to(c);
        let new_d = (v[index] + offset).distance_to(c);

        match mode {
            ResizeMode::Free => {
                let half = offset / 2.0;
                v[index] += offset;
                c += half;
                v[sym] += half;
                v[opposite_sym] += half;
            }
            ResizeMode::Anchored | ResizeMode::Uniform | ResizeMode::Additive => {
                v[index] += offset;
                v[opposite] -= offset;
            }
        }

        let d = match mode {
            ResizeMode::Uniform => new_d,
            ResizeMode::Additive => c.distance_to(v[sym]) + new_d - old_d,
            ResizeMode::Free | ResizeMode::Anchored => c.distance_to(v[sym]),
        };
        let axis = if vertical { c - v[index] } else { v[index] - c };
        let angle = axis.y.atan2(axis.x) - FRAC_PI_2;
        let new_sym = c + ImagePoint::new(d * angle.cos(), d * angle.sin());
        let sym_offset = new_sym - v[sym];
        v[sym] = new_sym;
        v[opposite_sym] -= sym_offset;

        self.center.set(c);
        for (point, value) in self.control_points_mut().into_iter().zip(v) {
            point.set(value);
        }
        Ok(())
    }
}
