//! The closed set of annotation shapes.
//!
//! Every operation is an exhaustive match over [`ShapeVariant`], so adding
//! a variant fails to compile until every operation handles it. Unknown
//! type tags are rejected when the shape is loaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::cuboid::{CUBOID_CORNERS, Cuboid};
use super::ellipse::{Ellipse, ResizeMode};
use super::link::{Graph, StringLink};
use super::skeleton::Skeleton;
use crate::error::{EngineError, ShapeError};
use crate::geometry::{CompoundPath, EditablePoint, ImagePoint, centroid, point_in_path};

/// Segments used to approximate an ellipse outline for bounds and hit tests.
pub const ELLIPSE_OUTLINE_SEGMENTS: usize = 64;

/// Discriminant of [`ShapeVariant`], as used in class metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    Polygon,
    Ellipse,
    Skeleton,
    Cuboid,
    StringLink,
    Graph,
}

impl ShapeType {
    /// Serialized tag of this shape type.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Polygon => "polygon",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Skeleton => "skeleton",
            ShapeType::Cuboid => "cuboid",
            ShapeType::StringLink => "string_link",
            ShapeType::Graph => "graph",
        }
    }

    pub fn all() -> &'static [ShapeType] {
        &[
            ShapeType::Polygon,
            ShapeType::Ellipse,
            ShapeType::Skeleton,
            ShapeType::Cuboid,
            ShapeType::StringLink,
            ShapeType::Graph,
        ]
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeType {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::all()
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| ShapeError::UnknownType(s.to_string()))
    }
}

/// Geometry of one annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeVariant {
    Polygon(CompoundPath),
    Ellipse(Ellipse),
    Skeleton(Skeleton),
    Cuboid(Cuboid),
    StringLink(StringLink),
    Graph(Graph),
}

impl ShapeVariant {
    /// Parse a shape from JSON, reporting an unknown `type` tag as
    /// [`ShapeError::UnknownType`].
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ShapeError::UnknownType(String::new()))?;
        tag.parse::<ShapeType>()?;
        serde_json::from_value(value).map_err(EngineError::from)
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeVariant::Polygon(_) => ShapeType::Polygon,
            ShapeVariant::Ellipse(_) => ShapeType::Ellipse,
            ShapeVariant::Skeleton(_) => ShapeType::Skeleton,
            ShapeVariant::Cuboid(_) => ShapeType::Cuboid,
            ShapeVariant::StringLink(_) => ShapeType::StringLink,
            ShapeVariant::Graph(_) => ShapeType::Graph,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.shape_type().name()
    }

    /// Whether the shape has geometry of its own (links and graphs do not).
    pub fn has_geometry(&self) -> bool {
        !matches!(self, ShapeVariant::StringLink(_) | ShapeVariant::Graph(_))
    }

    pub fn as_polygon(&self) -> Option<&CompoundPath> {
        match self {
            ShapeVariant::Polygon(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_polygon_mut(&mut self) -> Option<&mut CompoundPath> {
        match self {
            ShapeVariant::Polygon(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_ellipse(&self) -> Option<&Ellipse> {
        match self {
            ShapeVariant::Ellipse(ellipse) => Some(ellipse),
            _ => None,
        }
    }

    pub fn as_ellipse_mut(&mut self) -> Option<&mut Ellipse> {
        match self {
            ShapeVariant::Ellipse(ellipse) => Some(ellipse),
            _ => None,
        }
    }

    /// Editable vertices in flat order. Polygon rings are concatenated;
    /// ellipses expose their control points (top, right, bottom, left);
    /// cuboids their front then back corners.
    pub fn vertices(&self) -> Vec<&EditablePoint> {
        match self {
            ShapeVariant::Polygon(path) => path.rings().flatten().collect(),
            ShapeVariant::Ellipse(ellipse) => ellipse.control_points().to_vec(),
            ShapeVariant::Skeleton(skeleton) => skeleton.nodes.iter().map(|n| &n.point).collect(),
            ShapeVariant::Cuboid(cuboid) => cuboid.corners(),
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => Vec::new(),
        }
    }

    pub fn vertices_mut(&mut self) -> Vec<&mut EditablePoint> {
        match self {
            ShapeVariant::Polygon(path) => path.rings_mut().flatten().collect(),
            ShapeVariant::Ellipse(ellipse) => ellipse.control_points_mut().into_iter().collect(),
            ShapeVariant::Skeleton(skeleton) => {
                skeleton.nodes.iter_mut().map(|n| &mut n.point).collect()
            }
            ShapeVariant::Cuboid(cuboid) => cuboid.corners_mut(),
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            ShapeVariant::Polygon(path) => path.vertex_count(),
            ShapeVariant::Ellipse(_) => super::ellipse::ELLIPSE_CONTROL_POINTS,
            ShapeVariant::Skeleton(skeleton) => skeleton.nodes.len(),
            ShapeVariant::Cuboid(_) => CUBOID_CORNERS,
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => 0,
        }
    }

    pub fn vertex(&self, flat: usize) -> Option<ImagePoint> {
        self.vertices().get(flat).map(|p| p.point())
    }

    /// Move vertex `flat` by `offset`.
    ///
    /// Polygon and skeleton vertices move alone. Ellipses re-derive their
    /// other control points according to `mode`; cuboid corners drag their
    /// face neighbours along.
    pub fn move_vertex(
        &mut self,
        flat: usize,
        offset: ImagePoint,
        mode: ResizeMode,
    ) -> Result<(), ShapeError> {
        let out_of_range = |shape: &ShapeVariant| ShapeError::VertexOutOfRange {
            shape: shape.type_name(),
            index: flat,
            count: shape.vertex_count(),
        };
        match self {
            ShapeVariant::Polygon(path) => {
                let vertex = path.locate(flat);
                match vertex.and_then(|v| path.vertex_mut(v)) {
                    Some(p) => {
                        p.translate(offset);
                        Ok(())
                    }
                    None => Err(out_of_range(self)),
                }
            }
            ShapeVariant::Ellipse(ellipse) => ellipse.move_vertex(flat, offset, mode),
            ShapeVariant::Skeleton(skeleton) => match skeleton.nodes.get_mut(flat) {
                Some(node) => {
                    node.point.translate(offset);
                    Ok(())
                }
                None => Err(out_of_range(self)),
            },
            ShapeVariant::Cuboid(cuboid) => {
                if cuboid.move_corner(flat, offset) {
                    Ok(())
                } else {
                    Err(out_of_range(self))
                }
            }
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => Err(out_of_range(self)),
        }
    }

    pub fn translate(&mut self, delta: ImagePoint) {
        match self {
            ShapeVariant::Polygon(path) => path.translate(delta),
            ShapeVariant::Ellipse(ellipse) => ellipse.translate(delta),
            ShapeVariant::Skeleton(skeleton) => skeleton.translate(delta),
            ShapeVariant::Cuboid(cuboid) => cuboid.translate(delta),
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => {}
        }
    }

    /// Whether `p` lies inside the shape. Skeletons use their bounding box.
    pub fn contains_point(&self, p: ImagePoint) -> bool {
        match self {
            ShapeVariant::Polygon(path) => path.contains_point(p),
            ShapeVariant::Ellipse(ellipse) => ellipse.contains(p),
            ShapeVariant::Skeleton(_) => self
                .bounds()
                .is_some_and(|(min, max)| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y),
            ShapeVariant::Cuboid(cuboid) => point_in_path(p, cuboid.outer.as_slice()),
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => false,
        }
    }

    /// Axis-aligned bounds `(min, max)`.
    pub fn bounds(&self) -> Option<(ImagePoint, ImagePoint)> {
        match self {
            ShapeVariant::Polygon(path) => path.bounds(),
            ShapeVariant::Ellipse(ellipse) => {
                crate::geometry::bounds(ellipse.outline(ELLIPSE_OUTLINE_SEGMENTS).iter())
            }
            ShapeVariant::Skeleton(_) | ShapeVariant::Cuboid(_) => {
                crate::geometry::bounds(self.vertices())
            }
            ShapeVariant::StringLink(_) | ShapeVariant::Graph(_) => None,
        }
    }

    /// Anchor point used when drawing links to this shape.
    pub fn centroid(&self) -> Option<ImagePoint> {
        match self {
            ShapeVariant::Polygon(path) => centroid(path.path.as_slice()),
            ShapeVariant::Ellipse(ellipse) => Some(ellipse.center()),
            _ => self.bounds().map(|(min, max)| min.midpoint(max)),
        }
    }

    /// Clear selection and highlight flags of every vertex.
    pub fn clear_flags(&mut self) {
        for p in self.vertices_mut() {
            p.selected = false;
            p.highlighted = false;
        }
    }

    /// Flat index of the first vertex within `threshold` of `p`.
    pub fn vertex_at(&self, p: ImagePoint, threshold: f64) -> Option<usize> {
        self.vertices()
            .iter()
            .position(|v| v.point().distance_to(p) <= threshold)
    }
}
