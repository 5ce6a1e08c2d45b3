//! Space-tagged points.
//!
//! Image-space and screen-space coordinates are different types, so a
//! screen position can never be stored in a shape by accident. Conversion
//! between the two only happens through the [`Camera`](crate::camera::Camera).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Marker for image-space coordinates (pixels of the annotated image).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image {}

/// Marker for screen-space coordinates (pixels of the canvas).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {}

/// A 2D coordinate tagged with the space it lives in.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Point<S> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    space: PhantomData<fn() -> S>,
}

pub type ImagePoint = Point<Image>;
pub type ScreenPoint = Point<Screen>;

impl<S> Point<S> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            Self::zero()
        }
    }

    /// Perpendicular vector rotated 90 degrees counter-clockwise (y-up).
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Point reflected through `center`.
    pub fn reflect_through(self, center: Self) -> Self {
        Self::new(2.0 * center.x - self.x, 2.0 * center.y - self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Round both coordinates to `decimals` fractional digits.
    pub fn rounded(self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self::new(
            (self.x * factor).round() / factor,
            (self.y * factor).round() / factor,
        )
    }
}

impl<S> Clone for Point<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Point<S> {}

impl<S> PartialEq for Point<S> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<S> Default for Point<S> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<S> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl<S> From<(f64, f64)> for Point<S> {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl<S> Add for Point<S> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<S> AddAssign for Point<S> {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<S> Sub for Point<S> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<S> SubAssign for Point<S> {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<S> Mul<f64> for Point<S> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl<S> Div<f64> for Point<S> {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl<S> Neg for Point<S> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// An image-space vertex that can be selected or highlighted while editing.
///
/// The flags are UI state and are not serialized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EditablePoint {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    pub selected: bool,
    #[serde(skip)]
    pub highlighted: bool,
}

impl EditablePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            selected: false,
            highlighted: false,
        }
    }

    /// The plain image-space position of this vertex.
    pub fn point(&self) -> ImagePoint {
        ImagePoint::new(self.x, self.y)
    }

    /// Move the vertex to `p`, keeping its flags.
    pub fn set(&mut self, p: ImagePoint) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Translate the vertex by `delta`, keeping its flags.
    pub fn translate(&mut self, delta: ImagePoint) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

impl From<ImagePoint> for EditablePoint {
    fn from(p: ImagePoint) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<EditablePoint> for ImagePoint {
    fn from(p: EditablePoint) -> Self {
        p.point()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_vector_ops() {
        let a = ImagePoint::new(1.0, 2.0);
        let b = ImagePoint::new(4.0, 6.0);
        assert_eq!(b - a, ImagePoint::new(3.0, 4.0));
        assert!(approx_eq(a.distance_to(b), 5.0));
        assert_eq!(a * 2.0, ImagePoint::new(2.0, 4.0));
        assert_eq!(-a, ImagePoint::new(-1.0, -2.0));
    }

    #[test]
    fn test_cross_sign() {
        let x = ImagePoint::new(1.0, 0.0);
        let y = ImagePoint::new(0.0, 1.0);
        assert!(x.cross(y) > 0.0);
        assert!(y.cross(x) < 0.0);
    }

    #[test]
    fn test_reflect_through_center() {
        let p = ImagePoint::new(10.0, 3.0);
        let c = ImagePoint::new(5.0, 3.0);
        assert_eq!(p.reflect_through(c), ImagePoint::new(0.0, 3.0));
    }

    #[test]
    fn test_rounded() {
        let p = ScreenPoint::new(8.660254, -4.999999);
        assert_eq!(p.rounded(2), ScreenPoint::new(8.66, -5.0));
    }

    #[test]
    fn test_editable_point_keeps_flags_when_moved() {
        let mut p = EditablePoint::new(1.0, 1.0);
        p.selected = true;
        p.translate(ImagePoint::new(2.0, -1.0));
        assert_eq!(p.point(), ImagePoint::new(3.0, 0.0));
        assert!(p.selected);
    }

    #[test]
    fn test_editable_point_serializes_coordinates_only() {
        let mut p = EditablePoint::new(1.5, 2.0);
        p.highlighted = true;
        let json = serde_json::to_string(&p).expect("serialize");
        assert_eq!(json, r#"{"x":1.5,"y":2.0}"#);
    }
}
