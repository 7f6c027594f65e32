use std::collections::BTreeSet;

use crate::model::{FullGraph, GraphEdge, GraphNode};
use crate::{Hops, NodeId};

/// Bounded neighborhood around a focal node.
#[derive(Debug, Clone, PartialEq)]
pub struct EgoGraph {
    pub focal: Option<NodeId>,
    pub hops: Hops,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl EgoGraph {
    pub fn empty(focal: Option<NodeId>, hops: Hops) -> Self {
        Self {
            focal,
            hops,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Induced subgraph of everything within `hops` undirected BFS rounds of
/// `focal`. An absent or unknown focal yields an empty graph.
///
/// Nodes keep FullGraph order. Each undirected pair yields at most one edge,
/// oriented smaller-id first unless the graph is directed; a citation pair
/// present in both directions becomes one `mutual` edge with summed weight.
pub fn extract_ego(graph: &FullGraph, focal: Option<&NodeId>, hops: Hops) -> EgoGraph {
    let Some(focal) = focal.filter(|id| graph.contains(id)) else {
        return EgoGraph::empty(focal.cloned(), hops);
    };

    let mut keep: BTreeSet<NodeId> = BTreeSet::new();
    keep.insert(focal.clone());
    let mut frontier = vec![focal.clone()];
    for _ in 0..hops.rounds() {
        let mut next = Vec::new();
        for cur in &frontier {
            for nb in graph.neighbors(cur) {
                if keep.insert(nb.clone()) {
                    next.push(nb.clone());
                }
            }
        }
        frontier = next;
    }

    let nodes = graph
        .nodes()
        .iter()
        .filter(|n| keep.contains(&n.id))
        .cloned()
        .collect();

    let mut edges = Vec::new();
    for a in &keep {
        for b in graph.neighbors(a) {
            if a >= b || !keep.contains(b) {
                continue;
            }
            let forward = graph.edge(a, b);
            let backward = if graph.kind().is_directed() {
                graph.edge(b, a)
            } else {
                None
            };
            match (forward, backward) {
                (Some(f), Some(r)) => edges.push(GraphEdge {
                    from: a.clone(),
                    to: b.clone(),
                    weight: f.weight + r.weight,
                    mutual: true,
                }),
                (Some(e), None) | (None, Some(e)) => edges.push(e.clone()),
                (None, None) => {}
            }
        }
    }

    EgoGraph {
        focal: Some(focal.clone()),
        hops,
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_author_graph;
    use crate::{AuthorRef, GraphKind, PaperRecord};
    use proptest::prelude::*;
    use std::collections::{HashMap, VecDeque};

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

    fn ids(ego: &EgoGraph) -> BTreeSet<String> {
        ego.nodes.iter().map(|n| n.id.0.clone()).collect()
    }

    fn pairs(ego: &EgoGraph) -> BTreeSet<(String, String)> {
        ego.edges
            .iter()
            .map(|e| (e.from.0.clone(), e.to.0.clone()))
            .collect()
    }

    #[test]
    fn one_and_two_hop_neighborhoods() {
        let g = build_author_graph(&[paper(1, &["A", "B"]), paper(2, &["B", "C"])]);
        let a = NodeId::from("A");

        let one = extract_ego(&g, Some(&a), Hops::One);
        assert_eq!(ids(&one), BTreeSet::from(["A".into(), "B".into()]));
        assert_eq!(pairs(&one), BTreeSet::from([("A".into(), "B".into())]));

        let two = extract_ego(&g, Some(&a), Hops::Two);
        assert_eq!(ids(&two), BTreeSet::from(["A".into(), "B".into(), "C".into()]));
        assert_eq!(
            pairs(&two),
            BTreeSet::from([("A".into(), "B".into()), ("B".into(), "C".into())])
        );
    }

    #[test]
    fn missing_or_unknown_focal_is_empty() {
        let g = build_author_graph(&[paper(1, &["A", "B"])]);
        assert!(extract_ego(&g, None, Hops::Two).is_empty());
        let ghost = extract_ego(&g, Some(&NodeId::from("Z")), Hops::One);
        assert!(ghost.is_empty());
        assert!(ghost.edges.is_empty());
    }

    #[test]
    fn citation_edges_walk_backwards_and_merge_mutual_pairs() {
        let mut g = FullGraph::new(GraphKind::Citation);
        for n in ["1", "2", "3"] {
            g.upsert_node(NodeId::from(n), n.to_string(), None);
        }
        g.add_edge(&"2".into(), &"1".into(), 1);
        g.add_edge(&"1".into(), &"2".into(), 1);
        g.add_edge(&"3".into(), &"1".into(), 1);

        let ego = extract_ego(&g, Some(&NodeId::from("1")), Hops::One);
        assert_eq!(ids(&ego).len(), 3);
        assert_eq!(ego.edges.len(), 2);
        let mutual = ego.edges.iter().find(|e| e.mutual).unwrap();
        assert_eq!((mutual.from.as_str(), mutual.to.as_str(), mutual.weight), ("1", "2", 2));
        let single = ego.edges.iter().find(|e| !e.mutual).unwrap();
        assert_eq!((single.from.as_str(), single.to.as_str()), ("3", "1"));
    }

    fn reference_bfs(edges: &[(usize, usize)], focal: usize, hops: usize) -> BTreeSet<String> {
        let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(a, b) in edges {
            if a == b {
                continue;
            }
            adj.entry(a).or_default().push(b);
            adj.entry(b).or_default().push(a);
        }
        let mut dist: HashMap<usize, usize> = HashMap::from([(focal, 0)]);
        let mut q = VecDeque::from([focal]);
        while let Some(cur) = q.pop_front() {
            let d = dist[&cur];
            if d == hops {
                continue;
            }
            for &nb in adj.get(&cur).into_iter().flatten() {
                if !dist.contains_key(&nb) {
                    dist.insert(nb, d + 1);
                    q.push_back(nb);
                }
            }
        }
        dist.keys().map(|n| format!("n{n:02}")).collect()
    }

    proptest! {
        #[test]
        fn ego_nodes_match_reference_bfs(
            n in 1usize..14,
            raw_edges in prop::collection::vec((0usize..14, 0usize..14), 0..40),
            focal_pick in 0usize..14,
            two_hops in any::<bool>(),
            directed in any::<bool>(),
        ) {
            let edges: Vec<(usize, usize)> =
                raw_edges.into_iter().map(|(a, b)| (a % n, b % n)).collect();
            let kind = if directed { GraphKind::Citation } else { GraphKind::Author };
            let mut g = FullGraph::new(kind);
            for i in 0..n {
                g.upsert_node(NodeId(format!("n{i:02}")), String::new(), None);
            }
            for &(a, b) in &edges {
                g.add_edge(&NodeId(format!("n{a:02}")), &NodeId(format!("n{b:02}")), 1);
            }
            let focal = focal_pick % n;
            let hops = if two_hops { Hops::Two } else { Hops::One };

            let ego = extract_ego(&g, Some(&NodeId(format!("n{focal:02}"))), hops);
            let expected = reference_bfs(&edges, focal, hops.rounds());
            prop_assert_eq!(ids(&ego), expected);

            let node_set = ids(&ego);
            let mut undirected = BTreeSet::new();
            for e in &ego.edges {
                prop_assert!(node_set.contains(&e.from.0));
                prop_assert!(node_set.contains(&e.to.0));
                let key = if e.from < e.to { (&e.from, &e.to) } else { (&e.to, &e.from) };
                prop_assert!(undirected.insert(key), "pair emitted twice");
            }
        }
    }
}
