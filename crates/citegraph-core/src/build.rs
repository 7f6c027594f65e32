use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use crate::model::FullGraph;
use crate::{normalize_identifier, CitationMeta, GraphKind, NodeId, PaperRecord};

pub const DEFAULT_CANDIDATE_LIMIT: usize = 120;
pub const CANDIDATE_LIMIT_RANGE: RangeInclusive<usize> = 30..=300;

pub fn clamp_candidate_limit(limit: usize) -> usize {
    limit.clamp(*CANDIDATE_LIMIT_RANGE.start(), *CANDIDATE_LIMIT_RANGE.end())
}

/// Co-authorship graph: node weight = papers per author, edge weight = shared papers.
pub fn build_author_graph(records: &[PaperRecord]) -> FullGraph {
    let mut graph = FullGraph::new(GraphKind::Author);
    for paper in records {
        let names = paper.author_names();
        let ids: Vec<NodeId> = names.iter().map(|n| NodeId::from(n.as_str())).collect();
        for (id, name) in ids.iter().zip(&names) {
            graph.upsert_node(id.clone(), name.clone(), None).weight += 1;
        }
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                graph.add_edge(a, b, 1);
            }
        }
    }
    graph
}

/// A paper that can take part in the citation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub paper_id: u64,
    pub title: Option<String>,
    pub year: Option<i32>,
    /// DOI as supplied (trimmed).
    pub doi: String,
    /// Normalized DOI, the cache key.
    pub key: String,
}

impl Candidate {
    pub fn node_id(&self) -> NodeId {
        NodeId(self.paper_id.to_string())
    }
}

/// First `limit` papers carrying a DOI, in input order. Later records whose
/// normalized DOI repeats an earlier one are skipped.
pub fn citation_candidates(records: &[PaperRecord], limit: usize) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .iter()
        .filter_map(|p| {
            let doi = p.doi()?;
            let key = normalize_identifier(doi);
            if !seen.insert(key.clone()) {
                return None;
            }
            Some(Candidate {
                paper_id: p.id,
                title: p.title.clone(),
                year: p.year,
                doi: doi.to_string(),
                key,
            })
        })
        .take(limit)
        .collect()
}

/// Citation graph over a fully settled batch. `resolved[i]` belongs to
/// `candidates[i]`; missing or `None` entries become weight-0 nodes without
/// edges.
pub fn build_citation_graph(candidates: &[Candidate], resolved: &[Option<CitationMeta>]) -> FullGraph {
    let mut graph = FullGraph::new(GraphKind::Citation);
    let mut by_external: HashMap<&str, NodeId> = HashMap::new();

    for (i, cand) in candidates.iter().enumerate() {
        let meta = resolved.get(i).and_then(Option::as_ref);
        let label = cand
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| meta.and_then(|m| m.title.clone()))
            .unwrap_or_else(|| "Untitled".to_string());
        let node = graph.upsert_node(cand.node_id(), label, cand.year);
        if let Some(meta) = meta {
            node.weight = u32::try_from(meta.citation_count).unwrap_or(u32::MAX);
            by_external.insert(meta.external_id.as_str(), cand.node_id());
        }
    }

    for (i, cand) in candidates.iter().enumerate() {
        let Some(meta) = resolved.get(i).and_then(Option::as_ref) else {
            continue;
        };
        let from = cand.node_id();
        for reference in &meta.reference_ids {
            if let Some(to) = by_external.get(reference.as_str()) {
                graph.add_edge(&from, to, 1);
            }
        }
    }

    graph
}
