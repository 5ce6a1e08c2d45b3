//! Shape renderers.
//!
//! Every renderer issues fill and stroke calls on a [`DrawContext`] in
//! screen space. None of them decides when it runs; the editor calls them
//! once per scheduled frame.

use annovec_canvas::{Color, DrawContext, FillRule, StrokeStyle, VectorPath};
use std::collections::HashMap;

use crate::camera::Camera;
use crate::geometry::{CompoundPath, EditablePoint, ImagePoint};
use crate::measure::{Measures, measure_shape};
use crate::model::{
    AnnotationClass, AnnotationId, AnnotationStore, ClassId, Cuboid, ELLIPSE_OUTLINE_SEGMENTS,
    Ellipse, FrameIndex, Graph, ShapeVariant, Skeleton, StringLink,
};

/// Fill alpha of an unselected shape.
pub const DEFAULT_FILL_ALPHA: f32 = 0.15;
/// Fill alpha of a selected or highlighted shape.
pub const ACTIVE_FILL_ALPHA: f32 = 0.1;
/// Fill alpha of a shape suggested by a model.
pub const INFERRED_FILL_ALPHA: f32 = 0.05;

/// Vertex marker radius in screen pixels.
pub const VERTEX_RADIUS: f32 = 3.5;
/// Marker radius of a selected or highlighted vertex.
pub const ACTIVE_VERTEX_RADIUS: f32 = 5.5;
const NODE_DOT_RADIUS: f32 = 2.0;

pub const GRAPH_COLOR: [u8; 3] = [61, 88, 143];
pub const OCCLUDED_COLOR: [u8; 3] = [100, 100, 100];
const FALLBACK_COLOR: [u8; 3] = [128, 128, 128];

const MEASURE_TEXT_SIZE: f32 = 12.0;
const MEASURE_LINE_HEIGHT: f32 = 14.0;

// ============================================================================
// Styles
// ============================================================================

/// Image manipulation filter applied to every shape.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderFilter {
    /// Fill opacity in percent
    pub opacity: Option<f32>,
    /// Paint shapes fully opaque
    pub blackout: bool,
}

impl RenderFilter {
    /// Fill alpha dictated by the filter, if any. Blackout means 100%.
    pub fn fill_opacity(&self) -> Option<f32> {
        if self.blackout {
            Some(1.0)
        } else {
            self.opacity.map(|o| (o / 100.0).clamp(0.0, 1.0))
        }
    }
}

/// Fill alpha: filter opacity, then selected/highlighted, then inferred,
/// then the default.
pub fn fill_alpha(filter: Option<&RenderFilter>, active: bool, inferred: bool) -> f32 {
    if let Some(alpha) = filter.and_then(RenderFilter::fill_opacity) {
        alpha
    } else if active {
        ACTIVE_FILL_ALPHA
    } else if inferred {
        INFERRED_FILL_ALPHA
    } else {
        DEFAULT_FILL_ALPHA
    }
}

/// Per-annotation render state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle<'a> {
    pub color: Color,
    pub filter: Option<&'a RenderFilter>,
    pub selected: bool,
    pub highlighted: bool,
    pub inferred: bool,
}

impl<'a> ShapeStyle<'a> {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            filter: None,
            selected: false,
            highlighted: false,
            inferred: false,
        }
    }

    pub fn fill(&self) -> Color {
        self.color.with_alpha(fill_alpha(
            self.filter,
            self.selected || self.highlighted,
            self.inferred,
        ))
    }

    pub fn stroke(&self) -> StrokeStyle {
        let width = if self.selected || self.highlighted { 2.0 } else { 1.0 };
        if self.inferred {
            StrokeStyle::dashed(self.color, width, vec![4.0, 4.0])
        } else {
            StrokeStyle::solid(self.color, width)
        }
    }
}

// ============================================================================
// Primitives
// ============================================================================

fn to_screen(camera: &Camera, p: ImagePoint) -> (f32, f32) {
    let s = camera.image_to_screen(p);
    (s.x as f32, s.y as f32)
}

fn screen_polyline<I>(camera: &Camera, points: I) -> Vec<(f32, f32)>
where
    I: IntoIterator<Item = ImagePoint>,
{
    points.into_iter().map(|p| to_screen(camera, p)).collect()
}

/// Closed screen-space path with one sub-path per ring.
pub fn compound_to_screen(camera: &Camera, path: &CompoundPath) -> VectorPath {
    let mut out = VectorPath::new();
    for ring in path.rings() {
        out.add_polyline(screen_polyline(camera, ring.iter().map(EditablePoint::point)), true);
    }
    out
}

/// Draw a vertex marker, larger when the vertex is selected or highlighted.
pub fn draw_vertex(ctx: &mut dyn DrawContext, camera: &Camera, vertex: &EditablePoint, color: Color) {
    let radius = if vertex.selected || vertex.highlighted {
        ACTIVE_VERTEX_RADIUS
    } else {
        VERTEX_RADIUS
    };
    let (x, y) = to_screen(camera, vertex.point());
    let mut marker = VectorPath::new();
    marker.circle(x, y, radius);
    ctx.fill_path(&marker, color, FillRule::NonZero);
    ctx.stroke_path(&marker, &StrokeStyle::solid(Color::WHITE, 1.0));
}

fn draw_line(ctx: &mut dyn DrawContext, camera: &Camera, a: ImagePoint, b: ImagePoint, style: &StrokeStyle) {
    let line = VectorPath::polyline([to_screen(camera, a), to_screen(camera, b)], false);
    ctx.stroke_path(&line, style);
}

// ============================================================================
// Shape Renderers
// ============================================================================

pub fn render_polygon(
    ctx: &mut dyn DrawContext,
    camera: &Camera,
    path: &CompoundPath,
    style: &ShapeStyle<'_>,
) {
    let outline = compound_to_screen(camera, path);
    ctx.fill_path(&outline, style.fill(), FillRule::EvenOdd);
    ctx.stroke_path(&outline, &style.stroke());
    if style.selected {
        for vertex in path.rings().flatten() {
            draw_vertex(ctx, camera, vertex, style.color);
        }
    }
}

pub fn render_ellipse(ctx: &mut dyn DrawContext, camera: &Camera, ellipse: &Ellipse, style: &ShapeStyle<'_>) {
    let outline = VectorPath::polyline(
        screen_polyline(camera, ellipse.outline(ELLIPSE_OUTLINE_SEGMENTS)),
        true,
    );
    ctx.fill_path(&outline, style.fill(), FillRule::NonZero);
    ctx.stroke_path(&outline, &style.stroke());
    if style.selected {
        for vertex in ellipse.control_points() {
            draw_vertex(ctx, camera, vertex, style.color);
        }
    }
}

/// Edges touching an occluded node are drawn grey.
pub fn render_skeleton(ctx: &mut dyn DrawContext, camera: &Camera, skeleton: &Skeleton, style: &ShapeStyle<'_>) {
    let stroke = style.stroke();
    let occluded = Color::from_rgb8(OCCLUDED_COLOR);
    let occluded_stroke = StrokeStyle {
        color: occluded,
        ..stroke.clone()
    };
    for (from, to, is_occluded) in skeleton.segments() {
        let edge_style = if is_occluded { &occluded_stroke } else { &stroke };
        draw_line(ctx, camera, from, to, edge_style);
    }
    for node in &skeleton.nodes {
        let color = if node.occluded { occluded } else { style.color };
        if style.selected {
            draw_vertex(ctx, camera, &node.point, color);
        } else {
            let (x, y) = to_screen(camera, node.point.point());
            let mut dot = VectorPath::new();
            dot.circle(x, y, NODE_DOT_RADIUS);
            ctx.fill_path(&dot, color, FillRule::NonZero);
        }
    }
}

pub fn render_cuboid(ctx: &mut dyn DrawContext, camera: &Camera, cuboid: &Cuboid, style: &ShapeStyle<'_>) {
    let outer = VectorPath::polyline(
        screen_polyline(camera, cuboid.outer.iter().map(EditablePoint::point)),
        true,
    );
    ctx.fill_path(&outer, style.fill(), FillRule::NonZero);

    let stroke = style.stroke();
    let mut faces = VectorPath::new();
    for face in [&cuboid.front, &cuboid.back] {
        faces.add_polyline(
            screen_polyline(camera, face.corners().into_iter().map(EditablePoint::point)),
            true,
        );
    }
    ctx.stroke_path(&faces, &stroke);
    for (f, b) in cuboid.front.corners().into_iter().zip(cuboid.back.corners()) {
        draw_line(ctx, camera, f.point(), b.point(), &stroke);
    }
    if style.selected {
        for vertex in cuboid.corners() {
            draw_vertex(ctx, camera, vertex, style.color);
        }
    }
}

/// Dashed chain through the anchors of the linked annotations, in order.
pub fn render_string_link(
    ctx: &mut dyn DrawContext,
    camera: &Camera,
    link: &StringLink,
    style: &ShapeStyle<'_>,
    anchors: &HashMap<AnnotationId, ImagePoint>,
) {
    let points: Vec<ImagePoint> = link
        .sources
        .iter()
        .filter_map(|source| anchors.get(&source.id).copied())
        .collect();
    let chain = VectorPath::polyline(screen_polyline(camera, points), false);
    let width = if style.selected { 2.0 } else { 1.0 };
    ctx.stroke_path(&chain, &StrokeStyle::dashed(style.color, width, vec![6.0, 3.0]));
}

/// A line between the anchors of every pair of linked annotations.
pub fn render_graph(
    ctx: &mut dyn DrawContext,
    camera: &Camera,
    graph: &Graph,
    style: &ShapeStyle<'_>,
    anchors: &HashMap<AnnotationId, ImagePoint>,
) {
    let stroke = style.stroke();
    for (start, end) in graph.links() {
        if let (Some(a), Some(b)) = (anchors.get(&start), anchors.get(&end)) {
            draw_line(ctx, camera, *a, *b, &stroke);
        }
    }
}

/// Render any shape variant.
pub fn render_shape(
    ctx: &mut dyn DrawContext,
    camera: &Camera,
    shape: &ShapeVariant,
    style: &ShapeStyle<'_>,
    anchors: &HashMap<AnnotationId, ImagePoint>,
) {
    match shape {
        ShapeVariant::Polygon(path) => render_polygon(ctx, camera, path, style),
        ShapeVariant::Ellipse(ellipse) => render_ellipse(ctx, camera, ellipse, style),
        ShapeVariant::Skeleton(skeleton) => render_skeleton(ctx, camera, skeleton, style),
        ShapeVariant::Cuboid(cuboid) => render_cuboid(ctx, camera, cuboid, style),
        ShapeVariant::StringLink(link) => render_string_link(ctx, camera, link, style, anchors),
        ShapeVariant::Graph(graph) => render_graph(ctx, camera, graph, style, anchors),
    }
}

/// Measurement labels to the right of the shape's bounding box.
pub fn render_measures(ctx: &mut dyn DrawContext, camera: &Camera, measures: &Measures) {
    let (x, y) = to_screen(camera, measures.anchor);
    for (i, line) in measures.labels().iter().enumerate() {
        let baseline = y + MEASURE_TEXT_SIZE + i as f32 * MEASURE_LINE_HEIGHT;
        ctx.fill_text(line, (x + 6.0, baseline), Color::WHITE, MEASURE_TEXT_SIZE);
    }
}

// ============================================================================
// Scene
// ============================================================================

/// Options for [`render_annotations`].
#[derive(Debug, Clone, Default)]
pub struct SceneOptions {
    pub frame: FrameIndex,
    pub filter: Option<RenderFilter>,
    /// Show measurements of the selected annotation
    pub show_measures: bool,
}

/// Render every visible annotation of `store` in paint order.
pub fn render_annotations(
    ctx: &mut dyn DrawContext,
    camera: &Camera,
    store: &AnnotationStore,
    classes: &HashMap<ClassId, AnnotationClass>,
    options: &SceneOptions,
) {
    let mut shapes = Vec::with_capacity(store.len());
    for annotation in store.ordered() {
        if !annotation.visible {
            continue;
        }
        match annotation.shape_at(options.frame) {
            Ok(Some(found)) => shapes.push((annotation, found.shape)),
            Ok(None) => {}
            Err(err) => log::warn!("⚠️ Cannot render annotation {}: {}", annotation.id, err),
        }
    }

    let anchors: HashMap<AnnotationId, ImagePoint> = shapes
        .iter()
        .filter_map(|(annotation, shape)| Some((annotation.id, shape.centroid()?)))
        .collect();

    for (annotation, shape) in &shapes {
        let rgb = match shape {
            ShapeVariant::Graph(_) => GRAPH_COLOR,
            _ => classes
                .get(&annotation.class_id)
                .map(|c| c.color)
                .unwrap_or(FALLBACK_COLOR),
        };
        let style = ShapeStyle {
            color: Color::from_rgb8(rgb),
            filter: options.filter.as_ref(),
            selected: annotation.selected,
            highlighted: annotation.highlighted,
            inferred: annotation.inferred,
        };
        render_shape(ctx, camera, shape, &style, &anchors);

        if options.show_measures && annotation.selected {
            if let Some(measures) = measure_shape(shape) {
                render_measures(ctx, camera, &measures);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Size;
    use crate::model::{GraphEdge, GraphNode, ShapeType};
    use annovec_canvas::{CommandRecorder, DrawCommand, PathVerb};

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn camera() -> Camera {
        // 100x100 image in a 100x100 viewport: identity transform.
        Camera::new(Size::new(100.0, 100.0), Size::new(100.0, 100.0))
    }

    fn triangle() -> CompoundPath {
        CompoundPath::from_points([
            ImagePoint::new(10.0, 10.0),
            ImagePoint::new(30.0, 10.0),
            ImagePoint::new(20.0, 30.0),
        ])
    }

    fn circle_radii(recorder: &CommandRecorder) -> Vec<f32> {
        recorder
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillPath { path, .. } => match path.verbs() {
                    [PathVerb::Circle { radius, .. }] => Some(*radius),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_alpha_precedence() {
        let blackout = RenderFilter {
            opacity: Some(30.0),
            blackout: true,
        };
        let faded = RenderFilter {
            opacity: Some(30.0),
            blackout: false,
        };
        assert!(approx_eq(fill_alpha(Some(&blackout), true, true), 1.0));
        assert!(approx_eq(fill_alpha(Some(&faded), true, true), 0.3));
        assert!(approx_eq(fill_alpha(None, true, true), ACTIVE_FILL_ALPHA));
        assert!(approx_eq(fill_alpha(None, false, true), INFERRED_FILL_ALPHA));
        assert!(approx_eq(fill_alpha(None, false, false), DEFAULT_FILL_ALPHA));
        assert!(approx_eq(
            fill_alpha(Some(&RenderFilter::default()), false, false),
            DEFAULT_FILL_ALPHA
        ));
    }

    #[test]
    fn test_markers_only_for_selected() {
        let camera = camera();
        let mut recorder = CommandRecorder::new();
        let style = ShapeStyle::new(Color::BLACK);
        render_polygon(&mut recorder, &camera, &triangle(), &style);
        assert!(circle_radii(&recorder).is_empty());

        let mut path = triangle();
        path.path[1].highlighted = true;
        let selected = ShapeStyle {
            selected: true,
            ..style
        };
        let mut recorder = CommandRecorder::new();
        render_polygon(&mut recorder, &camera, &path, &selected);
        assert_eq!(
            circle_radii(&recorder),
            vec![VERTEX_RADIUS, ACTIVE_VERTEX_RADIUS, VERTEX_RADIUS]
        );
    }

    #[test]
    fn test_polygon_with_hole_fills_even_odd() {
        let mut path = triangle();
        path.additional_paths.push(
            [(18.0, 14.0), (22.0, 14.0), (20.0, 18.0)]
                .iter()
                .map(|&(x, y)| EditablePoint::new(x, y))
                .collect(),
        );
        let mut recorder = CommandRecorder::new();
        render_polygon(&mut recorder, &camera(), &path, &ShapeStyle::new(Color::BLACK));
        assert!(matches!(
            recorder.commands().first(),
            Some(DrawCommand::FillPath {
                rule: FillRule::EvenOdd,
                ..
            })
        ));
    }

    #[test]
    fn test_scene_draws_graph_between_centroids() {
        let mut store = AnnotationStore::new();
        let a = store.add(1, ShapeVariant::Polygon(triangle()));
        let mut moved = triangle();
        moved.translate(ImagePoint::new(40.0, 0.0));
        let b = store.add(1, ShapeVariant::Polygon(moved));
        store.add(
            2,
            ShapeVariant::Graph(Graph {
                nodes: vec![
                    GraphNode {
                        id: a,
                        name: "a".into(),
                    },
                    GraphNode {
                        id: b,
                        name: "b".into(),
                    },
                ],
                edges: vec![GraphEdge {
                    start: "a".into(),
                    end: "b".into(),
                }],
            }),
        );
        let mut classes = HashMap::new();
        classes.insert(1, AnnotationClass::new(1, "leaf", [0, 200, 0], vec![ShapeType::Polygon]));

        let mut recorder = CommandRecorder::new();
        render_annotations(&mut recorder, &camera(), &store, &classes, &SceneOptions::default());

        let graph_color = Color::from_rgb8(GRAPH_COLOR);
        let graph_lines: Vec<&VectorPath> = recorder
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokePath { path, style } if style.color == graph_color => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(graph_lines.len(), 1);
        assert_eq!(graph_lines[0].bounds().map(|(x0, _, x1, _)| x1 - x0), Some(40.0));
    }

    #[test]
    fn test_measures_drawn_for_selected_only() {
        let mut store = AnnotationStore::new();
        let id = store.add(1, ShapeVariant::Polygon(triangle()));
        let options = SceneOptions {
            show_measures: true,
            ..SceneOptions::default()
        };
        let count_text = |store: &AnnotationStore| {
            let mut recorder = CommandRecorder::new();
            render_annotations(&mut recorder, &camera(), store, &HashMap::new(), &options);
            recorder
                .commands()
                .iter()
                .filter(|c| matches!(c, DrawCommand::DrawText { .. }))
                .count()
        };
        assert_eq!(count_text(&store), 0);
        store.select(Some(id));
        assert_eq!(count_text(&store), 4);
    }
}
