//! Skeleton shapes: named keypoints joined by edges.

use serde::{Deserialize, Serialize};

use crate::geometry::{EditablePoint, ImagePoint};

/// A named keypoint. Occluded nodes are drawn greyed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub name: String,
    pub point: EditablePoint,
    #[serde(default)]
    pub occluded: bool,
}

/// Edge between two nodes, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Skeleton {
    pub nodes: Vec<SkeletonNode>,
    #[serde(default)]
    pub edges: Vec<SkeletonEdge>,
}

impl Skeleton {
    pub fn new(nodes: Vec<SkeletonNode>, edges: Vec<SkeletonEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Place a class template into the box spanned by `a` and `b`.
    ///
    /// Template node coordinates are normalized to `0..=1` on both axes.
    pub fn from_template(template: &Skeleton, a: ImagePoint, b: ImagePoint) -> Self {
        let min = ImagePoint::new(a.x.min(b.x), a.y.min(b.y));
        let size = ImagePoint::new((a.x - b.x).abs(), (a.y - b.y).abs());
        let nodes = template
            .nodes
            .iter()
            .map(|n| SkeletonNode {
                name: n.name.clone(),
                point: EditablePoint::new(min.x + n.point.x * size.x, min.y + n.point.y * size.y),
                occluded: false,
            })
            .collect();
        Self::new(nodes, template.edges.clone())
    }

    pub fn node(&self, name: &str) -> Option<&SkeletonNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Resolved edges as `(from, to, occluded)`. Edges naming a missing
    /// node are skipped.
    pub fn segments(&self) -> impl Iterator<Item = (ImagePoint, ImagePoint, bool)> + '_ {
        self.edges.iter().filter_map(|edge| {
            let from = self.node(&edge.from)?;
            let to = self.node(&edge.to)?;
            Some((from.point.point(), to.point.point(), from.occluded || to.occluded))
        })
    }

    pub fn translate(&mut self, delta: ImagePoint) {
        for node in &mut self.nodes {
            node.point.translate(delta);
        }
    }

    /// Flip the occlusion flag of node `index`. Returns the new state.
    pub fn toggle_occlusion(&mut self, index: usize) -> Option<bool> {
        let node = self.nodes.get_mut(index)?;
        node.occluded = !node.occluded;
        Some(node.occluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Skeleton {
        let node = |name: &str, x, y| SkeletonNode {
            name: name.to_string(),
            point: EditablePoint::new(x, y),
            occluded: false,
        };
        Skeleton::new(
            vec![node("head", 0.5, 0.0), node("left", 0.0, 1.0), node("right", 1.0, 1.0)],
            vec![
                SkeletonEdge {
                    from: "head".into(),
                    to: "left".into(),
                },
                SkeletonEdge {
                    from: "head".into(),
                    to: "right".into(),
                },
                SkeletonEdge {
                    from: "head".into(),
                    to: "tail".into(),
                },
            ],
        )
    }

    #[test]
    fn test_from_template_scales_into_box() {
        let s = Skeleton::from_template(
            &template(),
            ImagePoint::new(30.0, 40.0),
            ImagePoint::new(10.0, 20.0),
        );
        let head = s.node("head").map(|n| n.point.point());
        assert_eq!(head, Some(ImagePoint::new(20.0, 20.0)));
        let right = s.node("right").map(|n| n.point.point());
        assert_eq!(right, Some(ImagePoint::new(30.0, 40.0)));
    }

    #[test]
    fn test_segments_skip_missing_nodes() {
        let mut s = template();
        assert_eq!(s.segments().count(), 2);
        assert_eq!(s.toggle_occlusion(1), Some(true));
        let occluded: Vec<bool> = s.segments().map(|(_, _, o)| o).collect();
        assert_eq!(occluded, vec![true, false]);
        assert_eq!(s.toggle_occlusion(9), None);
    }
}
