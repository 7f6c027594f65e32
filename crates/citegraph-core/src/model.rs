use std::collections::{BTreeSet, HashMap};

use crate::{GraphKind, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    /// Paper count for authors, citation count for papers.
    pub weight: u32,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: u32,
    /// Set on ego-graph edges that merge `a→b` and `b→a`.
    pub mutual: bool,
}

/// Complete node/edge set built from one paper collection.
///
/// Author graphs store each unordered pair once under `(min, max)`; citation
/// graphs key edges by `(from, to)`. Adjacency is always kept undirected so the
/// ego extractor can walk citations in both directions.
#[derive(Debug, Clone)]
pub struct FullGraph {
    kind: GraphKind,
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<(NodeId, NodeId), usize>,
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl FullGraph {
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            adjacency: HashMap::new(),
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn upsert_node(&mut self, id: NodeId, label: String, year: Option<i32>) -> &mut GraphNode {
        let idx = match self.index.get(&id) {
            Some(&idx) => idx,
            None => {
                let idx = self.nodes.len();
                self.index.insert(id.clone(), idx);
                self.nodes.push(GraphNode {
                    id,
                    label,
                    weight: 0,
                    year,
                });
                idx
            }
        };
        &mut self.nodes[idx]
    }

    fn edge_key(&self, a: &NodeId, b: &NodeId) -> (NodeId, NodeId) {
        if self.kind.is_directed() || a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }

    /// Adds `weight` to the edge between two known nodes. Self-edges and
    /// unknown endpoints are ignored (returns false).
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId, weight: u32) -> bool {
        if from == to || !self.contains(from) || !self.contains(to) {
            return false;
        }
        let key = self.edge_key(from, to);
        match self.edge_index.get(&key) {
            Some(&i) => self.edges[i].weight += weight,
            None => {
                self.edge_index.insert(key.clone(), self.edges.len());
                self.edges.push(GraphEdge {
                    from: key.0,
                    to: key.1,
                    weight,
                    mutual: false,
                });
            }
        }
        self.adjacency
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.adjacency
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        true
    }

    /// Edge stored for `from → to` (either order for author graphs).
    pub fn edge(&self, from: &NodeId, to: &NodeId) -> Option<&GraphEdge> {
        let key = self.edge_key(from, to);
        self.edge_index.get(&key).map(|&i| &self.edges[i])
    }

    /// Undirected neighbors in id order.
    pub fn neighbors<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.adjacency.get(id).into_iter().flatten()
    }

    /// Highest-weight node, smallest id on ties.
    pub fn heaviest(&self) -> Option<&NodeId> {
        self.nodes
            .iter()
            .max_by(|a, b| a.weight.cmp(&b.weight).then_with(|| b.id.cmp(&a.id)))
            .map(|n| &n.id)
    }
}
