use glam::Vec2;

use crate::layout::{SimNode, Simulation};
use crate::viewport::ViewportTransform;
use crate::{GraphKind, NodeId};

/// Minimum hit radius in world units.
pub const MIN_HIT_RADIUS: f32 = 14.0;
pub const LABEL_GAP: f32 = 2.0;
pub const LABEL_FONT_SIZE: f32 = 12.0;

const ARROW_LENGTH: f32 = 6.0;
const ARROW_HALF_WIDTH: f32 = 4.0;
const EDGE_START_GAP: f32 = 2.0;
const EDGE_END_GAP: f32 = 4.0;

/// Straight (non-premultiplied) RGBA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

pub const FOCAL_FILL: Rgba = Rgba::new(0x1e, 0x90, 0xff, 1.0);
pub const NODE_FILL: Rgba = Rgba::new(0x64, 0x74, 0x8b, 1.0);
pub const LABEL_COLOR: Rgba = Rgba::new(0x11, 0x18, 0x27, 1.0);
pub const HOVER_RING: Rgba = Rgba::new(0x0f, 0x17, 0x2a, 0.8);
const EDGE_RGB: (u8, u8, u8) = (100, 116, 139);
const EDGE_ALPHA: f32 = 0.55;
const FOCAL_EDGE: Rgba = Rgba::new(59, 130, 246, 0.85);

/// Node radius as a function of weight, shared by drawing and hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    kind: GraphKind,
    max_weight: f32,
}

impl RadiusScale {
    pub fn new(kind: GraphKind, max_weight: u32) -> Self {
        Self {
            kind,
            max_weight: max_weight.max(1) as f32,
        }
    }

    pub fn for_nodes(kind: GraphKind, nodes: &[SimNode]) -> Self {
        Self::new(kind, nodes.iter().map(|n| n.weight).max().unwrap_or(0))
    }

    pub fn radius(&self, weight: u32) -> f32 {
        let t = (weight as f32 / self.max_weight).clamp(0.0, 1.0);
        match self.kind {
            GraphKind::Author => 8.0 + 18.0 * t,
            GraphKind::Citation => 8.0 + 18.0 * t.sqrt(),
        }
    }

    pub fn hit_radius(&self, weight: u32) -> f32 {
        self.radius(weight).max(MIN_HIT_RADIUS)
    }
}

pub fn label_limit(kind: GraphKind) -> usize {
    match kind {
        GraphKind::Author => 20,
        GraphKind::Citation => 30,
    }
}

/// Cuts to `max` characters, the last being an ellipsis.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn tooltip_lines(kind: GraphKind, node: &SimNode) -> [String; 2] {
    match kind {
        GraphKind::Author => [node.label.clone(), format!("papers: {}", node.weight)],
        GraphKind::Citation => {
            let head = match node.year {
                Some(year) => format!("{} ({year})", node.label),
                None => node.label.clone(),
            };
            [head, format!("cited: {}", node.weight)]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeShape {
    pub start: Vec2,
    pub end: Vec2,
    pub color: Rgba,
    /// Filled triangles, tip first.
    pub arrows: Vec<[Vec2; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: NodeId,
    pub center: Vec2,
    pub radius: f32,
    pub fill: Rgba,
    pub hovered: bool,
    pub label: String,
    /// Bottom-center of the label text.
    pub label_anchor: Vec2,
    pub font_size: f32,
}

/// One frame's drawing list in surface coordinates: edges first, then nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub edges: Vec<EdgeShape>,
    pub nodes: Vec<NodeShape>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn arrow(tip: Vec2, dir: Vec2) -> [Vec2; 3] {
    let base = tip - dir * ARROW_LENGTH;
    let perp = dir.perp() * ARROW_HALF_WIDTH;
    [tip, base + perp, base - perp]
}

fn author_edge_color(weight: u32) -> Rgba {
    let alpha = (0.2 + (1.0 + weight as f32).ln() * 0.25).min(0.9);
    Rgba::new(EDGE_RGB.0, EDGE_RGB.1, EDGE_RGB.2, EDGE_ALPHA * alpha)
}

pub fn compose(
    kind: GraphKind,
    sim: &Simulation,
    transform: &ViewportTransform,
    focal: Option<&NodeId>,
    hovered: Option<&NodeId>,
) -> Scene {
    let nodes = sim.nodes();
    let radius = RadiusScale::for_nodes(kind, nodes);
    let mut scene = Scene::default();

    for e in sim.edges() {
        let (a, b) = (&nodes[e.source], &nodes[e.target]);
        match kind {
            GraphKind::Author => scene.edges.push(EdgeShape {
                start: transform.to_surface(a.pos),
                end: transform.to_surface(b.pos),
                color: author_edge_color(e.weight),
                arrows: Vec::new(),
            }),
            GraphKind::Citation => {
                let delta = b.pos - a.pos;
                let len = delta.length();
                if !(len > 1e-4) {
                    continue;
                }
                let u = delta / len;
                let mut start = a.pos + u * (radius.radius(a.weight) + EDGE_START_GAP);
                let end = b.pos - u * (radius.radius(b.weight) + EDGE_END_GAP);
                let mut arrows = vec![arrow(end, u)];
                if e.mutual {
                    start = a.pos + u * (radius.radius(a.weight) + EDGE_END_GAP);
                    arrows.push(arrow(start, -u));
                }
                let on_focal = focal.is_some_and(|f| *f == a.id || *f == b.id);
                let color = if on_focal {
                    FOCAL_EDGE
                } else {
                    Rgba::new(EDGE_RGB.0, EDGE_RGB.1, EDGE_RGB.2, EDGE_ALPHA)
                };
                scene.edges.push(EdgeShape {
                    start: transform.to_surface(start),
                    end: transform.to_surface(end),
                    color,
                    arrows: arrows
                        .into_iter()
                        .map(|tri| tri.map(|p| transform.to_surface(p)))
                        .collect(),
                });
            }
        }
    }

    let limit = label_limit(kind);
    for n in nodes {
        let r = radius.radius(n.weight);
        scene.nodes.push(NodeShape {
            id: n.id.clone(),
            center: transform.to_surface(n.pos),
            radius: r * transform.scale,
            fill: if focal == Some(&n.id) { FOCAL_FILL } else { NODE_FILL },
            hovered: hovered == Some(&n.id),
            label: truncate_label(&n.label, limit),
            label_anchor: transform.to_surface(n.pos - Vec2::new(0.0, r + LABEL_GAP)),
            font_size: LABEL_FONT_SIZE * transform.scale,
        });
    }

    scene
}
