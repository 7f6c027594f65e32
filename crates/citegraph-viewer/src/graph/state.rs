use bevy::prelude::Resource;
use citegraph_core::{
    build_author_graph, build_citation_graph, citation_candidates, BatchOutcome, BatchRequest,
    Candidate, Generation, GraphKind, GraphSession, Hops, NodeId, PaperRecord,
};
use tracing::{debug, info, warn};

use crate::util::config::ViewerConfig;

#[derive(Debug, Default)]
pub struct UiState {
    /// A citation batch is being resolved.
    pub loading: bool,
    pub rebuild_requested: bool,
    pub close_requested: bool,
    pub use_external: bool,
    /// Focus given on the command line; consumed by the first build.
    pub seed_focus: Option<NodeId>,
    pub status: Option<String>,
}

/// Everything the frame loop needs for the one open graph view.
#[derive(Resource)]
pub struct ViewState {
    pub session: GraphSession,
    pub papers: Vec<PaperRecord>,
    pub cfg: ViewerConfig,
    pub ui: UiState,
    online: bool,
    candidates: Vec<Candidate>,
    pending: Option<Generation>,
}

impl ViewState {
    pub fn new(
        kind: GraphKind,
        papers: Vec<PaperRecord>,
        cfg: ViewerConfig,
        seed_focus: Option<NodeId>,
        hops: Hops,
        online: bool,
    ) -> Self {
        let mut session = GraphSession::new(kind, cfg.session_config(kind));
        session.set_hops(hops);
        let ui = UiState {
            rebuild_requested: true,
            use_external: cfg.use_external,
            seed_focus,
            ..UiState::default()
        };
        Self {
            session,
            papers,
            cfg,
            ui,
            online,
            candidates: Vec::new(),
            pending: None,
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.session.kind()
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Rebuilds the full graph. Author graphs and offline citation graphs are
    /// installed immediately; an online citation build returns the batch the
    /// resolver should work on and installs once its outcome arrives.
    pub fn rebuild(&mut self) -> Option<BatchRequest> {
        if self.session.is_closed() {
            return None;
        }
        match self.kind() {
            GraphKind::Author => {
                let graph = build_author_graph(&self.papers);
                info!(nodes = graph.nodes().len(), edges = graph.edges().len(), "author graph built");
                self.session.set_graph(graph);
                self.ensure_focus();
                None
            }
            GraphKind::Citation => {
                self.candidates = citation_candidates(&self.papers, self.cfg.candidate_limit());
                let ticket = self.session.begin_build();
                if self.online && self.ui.use_external && !self.candidates.is_empty() {
                    self.pending = Some(ticket);
                    self.ui.loading = true;
                    return Some(BatchRequest {
                        generation: ticket,
                        identifiers: self.candidates.iter().map(|c| c.doi.clone()).collect(),
                    });
                }
                self.pending = None;
                self.ui.loading = false;
                let graph = build_citation_graph(&self.candidates, &[]);
                info!(nodes = graph.nodes().len(), "citation graph built without lookups");
                self.session.install_graph(ticket, graph);
                self.ensure_focus();
                None
            }
        }
    }

    /// Installs a settled citation batch. Outcomes for anything but the
    /// pending build are ignored.
    pub fn apply_outcome(&mut self, outcome: BatchOutcome) -> bool {
        if self.pending != Some(outcome.generation) {
            debug!(generation = outcome.generation.0, "ignoring outcome for another build");
            return false;
        }
        self.pending = None;
        self.ui.loading = false;

        let graph = build_citation_graph(&self.candidates, &outcome.resolved);
        info!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            "citation graph built"
        );
        if !self.session.install_graph(outcome.generation, graph) {
            return false;
        }
        self.ensure_focus();
        true
    }

    /// A command-line focus wins (even when unknown, which shows an empty
    /// view). Otherwise an existing focal survives rebuilds and the heaviest
    /// node is picked when there is none.
    pub fn ensure_focus(&mut self) {
        if let Some(seed) = self.ui.seed_focus.take() {
            if !self.session.graph().contains(&seed) {
                warn!(focus = %seed, "requested focus is not in the graph");
                self.ui.status = Some(format!("no node named {seed}"));
            }
            self.session.set_focal(Some(seed));
            return;
        }
        let graph = self.session.graph();
        if self.session.focal().is_some_and(|f| graph.contains(f)) {
            return;
        }
        let pick = graph.heaviest().cloned();
        self.session.set_focal(pick);
    }

    pub fn set_hops(&mut self, hops: Hops) {
        self.session.set_hops(hops);
    }

    /// Tears the view down. Returns the generation that is now current so the
    /// resolver can drop anything older.
    pub fn close(&mut self) -> Generation {
        self.session.close();
        self.pending = None;
        self.ui.loading = false;
        self.session.generation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_core::{AuthorRef, CitationMeta};

    fn paper(id: u64, authors: &[&str], doi: Option<&str>) -> PaperRecord {
        PaperRecord {
            id,
            title: Some(format!("paper {id}")),
            year: Some(2020),
            authors: Some(
                authors
                    .iter()
                    .map(|n| AuthorRef {
                        name: Some(n.to_string()),
                    })
                    .collect(),
            ),
            doi: doi.map(str::to_string),
        }
    }

    fn papers() -> Vec<PaperRecord> {
        vec![
            paper(1, &["A", "B"], Some("10.1/a")),
            paper(2, &["B", "C"], Some("10.1/b")),
            paper(3, &["D"], None),
        ]
    }

    fn meta(id: &str, cited: u64, refs: &[&str]) -> Option<CitationMeta> {
        Some(CitationMeta {
            external_id: id.to_string(),
            title: None,
            citation_count: cited,
            reference_ids: refs.iter().map(|r| r.to_string()).collect(),
        })
    }

    #[test]
    fn author_build_focuses_heaviest() {
        let mut st = ViewState::new(GraphKind::Author, papers(), ViewerConfig::default(), None, Hops::One, false);
        assert!(st.rebuild().is_none());
        assert_eq!(st.session.focal(), Some(&NodeId::from("B")));
        assert_eq!(st.session.ego().nodes.len(), 3);
    }

    #[test]
    fn seeded_focus_is_kept_even_if_unknown() {
        let mut st = ViewState::new(
            GraphKind::Author,
            papers(),
            ViewerConfig::default(),
            Some(NodeId::from("Nobody")),
            Hops::One,
            false,
        );
        st.rebuild();
        assert_eq!(st.session.focal(), Some(&NodeId::from("Nobody")));
        assert!(st.session.ego().is_empty());
        assert!(st.ui.status.is_some());
    }

    #[test]
    fn offline_citation_build_installs_nodes_only() {
        let mut st = ViewState::new(GraphKind::Citation, papers(), ViewerConfig::default(), None, Hops::One, false);
        assert!(st.rebuild().is_none());
        assert!(!st.ui.loading);
        assert_eq!(st.session.graph().nodes().len(), 2);
        assert!(st.session.graph().edges().is_empty());
        assert_eq!(st.session.focal(), Some(&NodeId::from("1")));
    }

    #[test]
    fn online_citation_build_waits_for_batch() {
        let mut st = ViewState::new(GraphKind::Citation, papers(), ViewerConfig::default(), None, Hops::One, true);
        let req = st.rebuild().expect("batch request");
        assert_eq!(req.identifiers, vec!["10.1/a".to_string(), "10.1/b".to_string()]);
        assert!(st.ui.loading);
        assert!(st.session.graph().is_empty());

        let stale = BatchOutcome {
            generation: Generation(req.generation.0 + 7),
            resolved: vec![None, None],
        };
        assert!(!st.apply_outcome(stale));

        let outcome = BatchOutcome {
            generation: req.generation,
            resolved: vec![meta("W1", 1, &["W2"]), meta("W2", 9, &[])],
        };
        assert!(st.apply_outcome(outcome));
        assert!(!st.ui.loading);
        assert_eq!(st.session.graph().edges().len(), 1);
        assert_eq!(st.session.focal(), Some(&NodeId::from("2")));
        assert_eq!(st.session.ego().nodes.len(), 2);
    }

    #[test]
    fn newer_rebuild_supersedes_pending_batch() {
        let mut st = ViewState::new(GraphKind::Citation, papers(), ViewerConfig::default(), None, Hops::One, true);
        let first = st.rebuild().expect("first");
        let second = st.rebuild().expect("second");
        assert!(second.generation > first.generation);
        assert!(!st.apply_outcome(BatchOutcome {
            generation: first.generation,
            resolved: vec![None, None],
        }));
        assert!(st.session.graph().is_empty());
    }

    #[test]
    fn close_drops_pending_results() {
        let mut st = ViewState::new(GraphKind::Citation, papers(), ViewerConfig::default(), None, Hops::One, true);
        let req = st.rebuild().expect("batch request");
        let current = st.close();
        assert!(current > req.generation);
        assert!(!st.apply_outcome(BatchOutcome {
            generation: req.generation,
            resolved: vec![meta("W1", 1, &[]), None],
        }));
        assert!(st.rebuild().is_none());
    }
}
