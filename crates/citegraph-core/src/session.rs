use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ego::{extract_ego, EgoGraph};
use crate::interact::{InteractionController, DEFAULT_CLICK_TOLERANCE};
use crate::layout::{ForceParams, SimState, Simulation};
use crate::model::FullGraph;
use crate::render::{compose, tooltip_lines, RadiusScale, Scene};
use crate::viewport::{min_surface, Surface, SurfaceError, ZoomParams};
use crate::{Generation, GraphKind, Hops, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub force: ForceParams,
    pub zoom: ZoomParams,
    pub click_tolerance: f32,
}

impl SessionConfig {
    pub fn for_kind(kind: GraphKind) -> Self {
        Self {
            force: ForceParams::for_kind(kind),
            zoom: ZoomParams::default(),
            click_tolerance: DEFAULT_CLICK_TOLERANCE,
        }
    }
}

/// State of one open graph view: the full graph, the focal/hops selection,
/// the ego graph derived from them, and the simulation and controller that
/// animate it.
#[derive(Debug)]
pub struct GraphSession {
    kind: GraphKind,
    graph: FullGraph,
    focal: Option<NodeId>,
    hops: Hops,
    ego: EgoGraph,
    sim: Simulation,
    controller: InteractionController,
    radius: RadiusScale,
    surface: Option<Surface>,
    surface_error: Option<SurfaceError>,
    generation: Generation,
    closed: bool,
}

impl GraphSession {
    pub fn new(kind: GraphKind, cfg: SessionConfig) -> Self {
        Self {
            kind,
            graph: FullGraph::new(kind),
            focal: None,
            hops: Hops::default(),
            ego: EgoGraph::empty(None, Hops::default()),
            sim: Simulation::new(cfg.force),
            controller: InteractionController::new(cfg.zoom, cfg.click_tolerance),
            radius: RadiusScale::new(kind, 0),
            surface: None,
            surface_error: None,
            generation: Generation::default(),
            closed: false,
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn graph(&self) -> &FullGraph {
        &self.graph
    }

    pub fn ego(&self) -> &EgoGraph {
        &self.ego
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn surface_error(&self) -> Option<&SurfaceError> {
        self.surface_error.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_running(&self) -> bool {
        self.sim.is_running()
    }

    /// Attaches the drawing surface on first call and resizes it afterwards.
    /// A failed first attach is fatal for this view: the loop never starts.
    pub fn sync_surface(&mut self, width: f32, height: f32, dpr: f32) -> Result<(), SurfaceError> {
        if self.closed || self.surface_error.is_some() {
            return Ok(());
        }
        if let Some(surface) = self.surface.as_mut() {
            if let Err(err) = surface.resize(width, height, dpr) {
                debug!(%err, "ignoring unusable resize");
            }
            return Ok(());
        }

        match Surface::new(width, height, dpr, min_surface(self.kind)) {
            Ok(surface) => {
                self.surface = Some(surface);
                if self.sim.state() == SimState::Seeded {
                    self.sim.clear();
                    self.reseed();
                }
                self.sim.start();
                debug!(kind = self.kind.as_str(), ?width, ?height, "surface attached");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "graph view has no usable surface");
                self.sim.stop();
                self.surface_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Starts a new build. Results tagged with any earlier generation will be
    /// refused by [`GraphSession::install_graph`].
    pub fn begin_build(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    pub fn is_current(&self, ticket: Generation) -> bool {
        !self.closed && ticket == self.generation
    }

    /// Installs a finished graph if `ticket` is still current.
    pub fn install_graph(&mut self, ticket: Generation, graph: FullGraph) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, current = self.generation.0, "dropping stale graph");
            return false;
        }
        if graph.kind() != self.kind {
            warn!(
                expected = self.kind.as_str(),
                got = graph.kind().as_str(),
                "graph kind mismatch"
            );
            return false;
        }
        self.graph = graph;
        self.refresh_ego();
        true
    }

    /// Synchronous build path: new generation and install in one step.
    pub fn set_graph(&mut self, graph: FullGraph) -> bool {
        let ticket = self.begin_build();
        self.install_graph(ticket, graph)
    }

    pub fn focal(&self) -> Option<&NodeId> {
        self.focal.as_ref()
    }

    pub fn set_focal(&mut self, focal: Option<NodeId>) {
        if self.closed || self.focal == focal {
            return;
        }
        self.focal = focal;
        self.refresh_ego();
    }

    pub fn hops(&self) -> Hops {
        self.hops
    }

    pub fn set_hops(&mut self, hops: Hops) {
        if self.closed || self.hops == hops {
            return;
        }
        self.hops = hops;
        self.refresh_ego();
    }

    fn refresh_ego(&mut self) {
        self.ego = extract_ego(&self.graph, self.focal.as_ref(), self.hops);
        debug!(
            focal = ?self.focal,
            hops = self.hops.rounds(),
            nodes = self.ego.nodes.len(),
            edges = self.ego.edges.len(),
            "ego graph rebuilt"
        );
        if self.controller.is_dragging() {
            self.controller.reset_pointer(&mut self.sim);
        }
        self.reseed();
    }

    fn reseed(&mut self) {
        let center = self
            .surface
            .map(|s| self.controller.transform().to_world(s.center()))
            .unwrap_or(Vec2::ZERO);
        self.sim.reseed(&self.ego, center);
        self.radius = RadiusScale::for_nodes(self.kind, self.sim.nodes());
        self.controller.prune(&self.sim);
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.is_interactive() {
            self.controller.pointer_down(&mut self.sim, &self.radius, pos);
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if self.is_interactive() {
            self.controller.pointer_move(&mut self.sim, &self.radius, pos);
        }
    }

    /// Returns the new focal when the gesture was a click on a node.
    pub fn pointer_up(&mut self, pos: Vec2) -> Option<NodeId> {
        if !self.is_interactive() {
            return None;
        }
        let clicked = self.controller.pointer_up(&mut self.sim, pos)?;
        self.set_focal(Some(clicked.clone()));
        Some(clicked)
    }

    pub fn pointer_left(&mut self) {
        self.controller.reset_pointer(&mut self.sim);
    }

    pub fn wheel(&mut self, pos: Vec2, delta: f32) {
        if self.is_interactive() {
            self.controller.wheel(&mut self.sim, pos, delta);
        }
    }

    fn is_interactive(&self) -> bool {
        !self.closed && self.surface.is_some()
    }

    /// One frame: advance the simulation and produce the drawing list.
    pub fn tick(&mut self) -> Option<Scene> {
        if !self.is_running() || self.surface.is_none() {
            return None;
        }
        self.sim.step();
        Some(compose(
            self.kind,
            &self.sim,
            self.controller.transform(),
            self.focal.as_ref(),
            self.controller.hovered(),
        ))
    }

    pub fn hovered_tooltip(&self) -> Option<[String; 2]> {
        let id = self.controller.hovered()?;
        let idx = self.sim.index_of(id)?;
        self.sim.node(idx).map(|n| tooltip_lines(self.kind, n))
    }

    /// Stops the loop and invalidates every outstanding build ticket.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.sim.stop();
        self.generation = self.generation.next();
        debug!(kind = self.kind.as_str(), "graph view closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_author_graph;
    use crate::{AuthorRef, PaperRecord};

    fn paper(id: u64, authors: &[&str]) -> PaperRecord {
        PaperRecord {
            id,
            title: None,
            year: None,
            authors: Some(
                authors
                    .iter()
                    .map(|n| AuthorRef {
                        name: Some(n.to_string()),
                    })
                    .collect(),
            ),
            doi: None,
        }
    }

    fn graph() -> FullGraph {
        build_author_graph(&[paper(1, &["A", "B"]), paper(2, &["B", "C"])])
    }

    fn session() -> GraphSession {
        let mut s = GraphSession::new(GraphKind::Author, SessionConfig::for_kind(GraphKind::Author));
        s.set_focal(Some(NodeId::from("A")));
        s
    }

    #[test]
    fn stale_build_is_dropped() {
        let mut s = session();
        let old = s.begin_build();
        let new = s.begin_build();
        assert!(!s.install_graph(old, graph()));
        assert!(s.graph().is_empty());
        assert!(s.install_graph(new, graph()));
        assert_eq!(s.ego().nodes.len(), 2);
    }

    #[test]
    fn close_invalidates_pending_builds_and_stops_ticks() {
        let mut s = session();
        s.sync_surface(800.0, 600.0, 1.0).unwrap();
        let ticket = s.begin_build();
        s.close();
        assert!(!s.install_graph(ticket, graph()));
        assert!(s.tick().is_none());
        assert_eq!(s.simulation().state(), SimState::Stopped);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let mut s = session();
        let ticket = s.begin_build();
        assert!(!s.install_graph(ticket, FullGraph::new(GraphKind::Citation)));
    }

    #[test]
    fn ticks_only_after_surface_attach() {
        let mut s = session();
        s.set_graph(graph());
        assert!(s.tick().is_none());
        s.sync_surface(800.0, 600.0, 2.0).unwrap();
        let scene = s.tick().expect("running after attach");
        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.edges.len(), 1);

        let center = s.surface().unwrap().center();
        let r = ForceParams::for_kind(GraphKind::Author).seed_radius;
        let mut s2 = session();
        s2.set_graph(graph());
        s2.sync_surface(800.0, 600.0, 1.0).unwrap();
        for n in s2.simulation().nodes() {
            assert!((n.pos.distance(center) - r).abs() < 1e-3);
        }
    }

    #[test]
    fn surface_failure_is_fatal_for_the_view() {
        let mut s = session();
        s.set_graph(graph());
        assert!(s.sync_surface(0.0, 0.0, 1.0).is_err());
        assert!(s.surface_error().is_some());
        assert!(s.sync_surface(800.0, 600.0, 1.0).is_ok());
        assert!(s.surface().is_none());
        assert!(s.tick().is_none());
    }

    #[test]
    fn hop_change_reextracts_and_keeps_survivors() {
        let mut s = session();
        s.set_graph(graph());
        s.sync_surface(800.0, 600.0, 1.0).unwrap();
        for _ in 0..5 {
            s.tick();
        }
        let idx = s.simulation().index_of(&"B".into()).unwrap();
        let b_before = s.simulation().nodes()[idx].pos;

        s.set_hops(Hops::Two);
        assert_eq!(s.ego().nodes.len(), 3);
        let idx = s.simulation().index_of(&"B".into()).unwrap();
        assert_eq!(s.simulation().nodes()[idx].pos, b_before);
        assert!(s.is_running());
    }

    #[test]
    fn click_on_node_changes_focal() {
        let mut s = session();
        s.set_graph(graph());
        s.sync_surface(800.0, 600.0, 1.0).unwrap();
        let idx = s.simulation().index_of(&"B".into()).unwrap();
        let at = s.controller().transform().to_surface(s.simulation().nodes()[idx].pos);
        s.pointer_down(at);
        assert_eq!(s.pointer_up(at), Some(NodeId::from("B")));
        assert_eq!(s.focal(), Some(&NodeId::from("B")));
        assert_eq!(s.ego().nodes.len(), 3);
    }

    #[test]
    fn clicked_node_keeps_moving_after_refocus() {
        let mut s = session();
        s.set_graph(graph());
        s.sync_surface(800.0, 600.0, 1.0).unwrap();
        let idx = s.simulation().index_of(&"B".into()).unwrap();
        let at = s.controller().transform().to_surface(s.simulation().nodes()[idx].pos);
        s.pointer_down(at);
        s.pointer_up(at);

        let idx = s.simulation().index_of(&"B".into()).unwrap();
        let before = s.simulation().nodes()[idx].pos;
        assert!(!s.simulation().nodes()[idx].pinned);
        for _ in 0..5 {
            s.tick();
        }
        let idx = s.simulation().index_of(&"B".into()).unwrap();
        assert_ne!(s.simulation().nodes()[idx].pos, before);
    }

    #[test]
    fn tooltip_follows_hover() {
        let mut s = session();
        s.set_graph(graph());
        s.sync_surface(800.0, 600.0, 1.0).unwrap();
        let idx = s.simulation().index_of(&"A".into()).unwrap();
        let at = s.controller().transform().to_surface(s.simulation().nodes()[idx].pos);
        s.pointer_move(at);
        assert_eq!(
            s.hovered_tooltip(),
            Some(["A".to_string(), "papers: 1".to_string()])
        );
    }
}
