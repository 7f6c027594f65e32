use glam::Vec2;

use crate::layout::Simulation;
use crate::render::RadiusScale;
use crate::viewport::{ViewportTransform, ZoomParams};
use crate::NodeId;

pub const DEFAULT_CLICK_TOLERANCE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
enum PointerMode {
    Idle,
    Pan { last: Vec2 },
    Drag { node: NodeId, origin: Vec2, moved: f32 },
}

/// Turns pointer and wheel events into viewport and node-pin changes.
/// All positions passed in are surface-local logical pixels.
#[derive(Debug, Clone)]
pub struct InteractionController {
    transform: ViewportTransform,
    zoom: ZoomParams,
    click_tolerance: f32,
    mode: PointerMode,
    hovered: Option<NodeId>,
}

impl InteractionController {
    pub fn new(zoom: ZoomParams, click_tolerance: f32) -> Self {
        Self {
            transform: ViewportTransform::default(),
            zoom,
            click_tolerance,
            mode: PointerMode::Idle,
            hovered: None,
        }
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: ViewportTransform) {
        self.transform = transform;
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, PointerMode::Drag { .. })
    }

    /// Nearest node whose hit circle contains `pointer`.
    pub fn hit_test(&self, sim: &Simulation, radius: &RadiusScale, pointer: Vec2) -> Option<usize> {
        let world = self.transform.to_world(pointer);
        sim.nodes()
            .iter()
            .enumerate()
            .filter_map(|(i, n)| {
                let d = n.pos.distance(world);
                (d <= radius.hit_radius(n.weight)).then_some((i, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    pub fn pointer_down(&mut self, sim: &mut Simulation, radius: &RadiusScale, pointer: Vec2) {
        match self.hit_test(sim, radius, pointer) {
            Some(idx) => {
                sim.pin(idx);
                self.mode = PointerMode::Drag {
                    node: sim.nodes()[idx].id.clone(),
                    origin: pointer,
                    moved: 0.0,
                };
            }
            None => {
                sim.unpin_all();
                self.mode = PointerMode::Pan { last: pointer };
            }
        }
    }

    pub fn pointer_move(&mut self, sim: &mut Simulation, radius: &RadiusScale, pointer: Vec2) {
        if self.mode == PointerMode::Idle {
            self.hovered = self
                .hit_test(sim, radius, pointer)
                .map(|i| sim.nodes()[i].id.clone());
            return;
        }
        match &mut self.mode {
            PointerMode::Idle => {}
            PointerMode::Pan { last } => {
                let delta = pointer - *last;
                *last = pointer;
                self.transform.pan_by(delta);
            }
            PointerMode::Drag { node, origin, moved } => {
                *moved = moved.max(pointer.distance(*origin));
                if let Some(idx) = sim.index_of(node) {
                    sim.drag_to(idx, self.transform.to_world(pointer));
                }
            }
        }
    }

    /// Ends the current gesture. Returns the node to refocus on when a node
    /// was pressed and released without moving past the click tolerance; a
    /// click leaves the node free, only a real drag keeps the pin.
    pub fn pointer_up(&mut self, sim: &mut Simulation, pointer: Vec2) -> Option<NodeId> {
        match std::mem::replace(&mut self.mode, PointerMode::Idle) {
            PointerMode::Drag { node, origin, moved } => {
                let clicked = moved.max(pointer.distance(origin)) < self.click_tolerance;
                if let Some(idx) = sim.index_of(&node) {
                    if clicked {
                        sim.unpin(idx);
                    } else {
                        sim.release(idx);
                    }
                }
                clicked.then_some(node)
            }
            PointerMode::Pan { .. } | PointerMode::Idle => None,
        }
    }

    pub fn wheel(&mut self, sim: &mut Simulation, pointer: Vec2, delta: f32) {
        sim.unpin_all();
        self.transform.zoom_at(pointer, delta, &self.zoom);
    }

    /// Pointer left the surface or the node set changed underneath a gesture.
    pub fn reset_pointer(&mut self, sim: &mut Simulation) {
        if let PointerMode::Drag { node, .. } = &self.mode {
            if let Some(idx) = sim.index_of(node) {
                sim.release(idx);
            }
        }
        self.mode = PointerMode::Idle;
        self.hovered = None;
    }

    /// Drops a hover that points at a node no longer present.
    pub fn prune(&mut self, sim: &Simulation) {
        if self.hovered.as_ref().is_some_and(|id| sim.index_of(id).is_none()) {
            self.hovered = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ego::EgoGraph;
    use crate::layout::ForceParams;
    use crate::model::GraphNode;
    use crate::{GraphKind, Hops};

    fn setup(names: &[(&str, u32)]) -> (Simulation, RadiusScale) {
        let ego = EgoGraph {
            focal: None,
            hops: Hops::One,
            nodes: names
                .iter()
                .map(|(n, w)| GraphNode {
                    id: NodeId::from(*n),
                    label: n.to_string(),
                    weight: *w,
                    year: None,
                })
                .collect(),
            edges: Vec::new(),
        };
        let mut sim = Simulation::new(ForceParams::default());
        sim.reseed(&ego, Vec2::new(300.0, 300.0));
        sim.start();
        let radius = RadiusScale::for_nodes(GraphKind::Author, sim.nodes());
        (sim, radius)
    }

    fn controller() -> InteractionController {
        InteractionController::new(ZoomParams::default(), DEFAULT_CLICK_TOLERANCE)
    }

    #[test]
    fn hit_test_matches_rendered_position_at_any_scale() {
        let (sim, radius) = setup(&[("a", 1), ("b", 4), ("c", 2)]);
        let mut ctl = controller();
        for scale in [0.4, 0.7, 1.0, 1.8, 3.0] {
            ctl.set_transform(ViewportTransform {
                scale,
                offset: Vec2::new(-40.0, 25.0),
            });
            for (i, n) in sim.nodes().iter().enumerate() {
                let on_screen = ctl.transform().to_surface(n.pos);
                assert_eq!(ctl.hit_test(&sim, &radius, on_screen), Some(i));
            }
        }
        assert_eq!(ctl.hit_test(&sim, &radius, Vec2::new(-5000.0, -5000.0)), None);
    }

    #[test]
    fn empty_space_pans_and_unpins() {
        let (mut sim, radius) = setup(&[("a", 1), ("b", 1)]);
        sim.pin(0);
        let mut ctl = controller();
        ctl.pointer_down(&mut sim, &radius, Vec2::new(-900.0, -900.0));
        assert!(sim.nodes().iter().all(|n| !n.pinned));
        ctl.pointer_move(&mut sim, &radius, Vec2::new(-880.0, -870.0));
        assert_eq!(ctl.pointer_up(&mut sim, Vec2::new(-880.0, -870.0)), None);
        assert_eq!(ctl.transform().offset, Vec2::new(20.0, 30.0));
    }

    #[test]
    fn click_on_node_refocuses() {
        let (mut sim, radius) = setup(&[("a", 1), ("b", 1)]);
        let mut ctl = controller();
        let at = ctl.transform().to_surface(sim.nodes()[1].pos);
        ctl.pointer_down(&mut sim, &radius, at);
        assert!(sim.nodes()[1].pinned);
        ctl.pointer_move(&mut sim, &radius, at + Vec2::new(1.0, 0.0));
        assert_eq!(ctl.pointer_up(&mut sim, at + Vec2::new(1.0, 0.0)), Some(NodeId::from("b")));
        assert!(!sim.nodes()[1].pinned);
    }

    #[test]
    fn drag_moves_and_pins_without_refocus() {
        let (mut sim, radius) = setup(&[("a", 1), ("b", 1)]);
        let mut ctl = controller();
        let at = ctl.transform().to_surface(sim.nodes()[0].pos);
        ctl.pointer_down(&mut sim, &radius, at);
        let target = at + Vec2::new(40.0, -10.0);
        ctl.pointer_move(&mut sim, &radius, target);
        assert_eq!(sim.nodes()[0].pos, ctl.transform().to_world(target));
        ctl.pointer_move(&mut sim, &radius, at);
        assert_eq!(ctl.pointer_up(&mut sim, at), None);
        let node = &sim.nodes()[0];
        assert!(node.pinned);
        assert_eq!(node.vel, Vec2::ZERO);
    }

    #[test]
    fn wheel_zooms_and_unpins() {
        let (mut sim, _) = setup(&[("a", 1)]);
        sim.pin(0);
        let mut ctl = controller();
        ctl.wheel(&mut sim, Vec2::new(100.0, 100.0), -120.0);
        assert!(ctl.transform().scale > 1.0);
        assert!(!sim.nodes()[0].pinned);
    }

    #[test]
    fn idle_move_reports_hover() {
        let (mut sim, radius) = setup(&[("a", 1), ("b", 1)]);
        let mut ctl = controller();
        let at = ctl.transform().to_surface(sim.nodes()[0].pos);
        ctl.pointer_move(&mut sim, &radius, at);
        assert_eq!(ctl.hovered(), Some(&NodeId::from("a")));
        ctl.pointer_move(&mut sim, &radius, Vec2::new(-900.0, 0.0));
        assert_eq!(ctl.hovered(), None);
    }
}
