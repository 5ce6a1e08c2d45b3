//! Shapes without geometry of their own: string links and graphs that
//! reference other annotations by id.

use serde::{Deserialize, Serialize};

use super::annotation::AnnotationId;

/// One annotation referenced by a string link, optionally restricted to
/// character ranges of its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSource {
    pub id: AnnotationId,
    #[serde(default)]
    pub ranges: Option<Vec<[usize; 2]>>,
}

/// Ordered concatenation of other annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringLink {
    pub sources: Vec<StringSource>,
}

impl StringLink {
    pub fn references(&self, id: AnnotationId) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    /// Drop every source pointing at `id`. Returns `true` if any was removed.
    pub fn remove_source(&mut self, id: AnnotationId) -> bool {
        let before = self.sources.len();
        self.sources.retain(|s| s.id != id);
        self.sources.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: AnnotationId,
    pub name: String,
}

/// Edge between two graph nodes, referenced by node name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub start: String,
    pub end: String,
}

/// Named relations between other annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn references(&self, id: AnnotationId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Edges resolved to the pair of annotation ids they connect.
    pub fn links(&self) -> impl Iterator<Item = (AnnotationId, AnnotationId)> + '_ {
        self.edges.iter().filter_map(|edge| {
            Some((self.node(&edge.start)?.id, self.node(&edge.end)?.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_links_resolve_names() {
        let graph = Graph {
            nodes: vec![
                GraphNode {
                    id: 4,
                    name: "question".into(),
                },
                GraphNode {
                    id: 7,
                    name: "answer".into(),
                },
            ],
            edges: vec![
                GraphEdge {
                    start: "question".into(),
                    end: "answer".into(),
                },
                GraphEdge {
                    start: "question".into(),
                    end: "missing".into(),
                },
            ],
        };
        assert_eq!(graph.links().collect::<Vec<_>>(), vec![(4, 7)]);
        assert!(graph.references(7));
        assert!(!graph.references(5));
    }

    #[test]
    fn test_string_link_sources() {
        let mut link: StringLink =
            serde_json::from_str(r#"{ "sources": [{ "id": 1 }, { "id": 2, "ranges": [[0, 4]] }] }"#)
                .expect("parse");
        assert_eq!(link.sources[1].ranges, Some(vec![[0, 4]]));
        assert!(link.remove_source(1));
        assert!(!link.references(1));
        assert!(!link.remove_source(1));
    }
}
