use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod build;
pub mod ego;
pub mod interact;
pub mod layout;
pub mod model;
pub mod render;
pub mod session;
pub mod viewport;

pub use build::{build_author_graph, build_citation_graph, citation_candidates, Candidate};
pub use ego::{extract_ego, EgoGraph};
pub use layout::{ForceParams, ParamsError, SimState, Simulation};
pub use model::{FullGraph, GraphEdge, GraphNode};
pub use render::Scene;
pub use session::{GraphSession, SessionConfig};
pub use viewport::{Surface, SurfaceError, ViewportTransform, ZoomParams};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup key for external identifiers (DOIs are case-insensitive).
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    /// Undirected co-authorship network.
    Author,
    /// Directed paper-cites-paper network.
    Citation,
}

impl GraphKind {
    pub fn is_directed(self) -> bool {
        matches!(self, Self::Citation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Citation => "citation",
        }
    }
}

impl FromStr for GraphKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "author" | "authors" => Ok(Self::Author),
            "citation" | "citations" | "paper" => Ok(Self::Citation),
            other => Err(format!("invalid graph mode: {other} (expected author|citation)")),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("hop count must be 1 or 2, got {0}")]
pub struct HopsError(pub u8);

/// BFS depth bound for ego-network extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Hops {
    #[default]
    One,
    Two,
}

impl Hops {
    pub fn rounds(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u8> for Hops {
    type Error = HopsError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(HopsError(other)),
        }
    }
}

impl From<Hops> for u8 {
    fn from(h: Hops) -> u8 {
        h.rounds() as u8
    }
}

impl FromStr for Hops {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.trim().parse().map_err(|_| format!("invalid hop count: {s}"))?;
        Hops::try_from(n).map_err(|e| e.to_string())
    }
}

/// Build generation token. Async results tagged with an older generation are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthorRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperRecord {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub authors: Option<Vec<AuthorRef>>,
    #[serde(default, alias = "external_id", alias = "externalIdentifier")]
    pub doi: Option<String>,
}

impl PaperRecord {
    /// Trimmed, non-empty author names, first occurrence wins.
    pub fn author_names(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for author in self.authors.iter().flatten() {
            let Some(name) = author.name.as_deref().map(str::trim) else {
                continue;
            };
            if name.is_empty() || out.iter().any(|n| n == name) {
                continue;
            }
            out.push(name.to_string());
        }
        out
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    /// Accepts either a JSON array of records or JSON Lines (one record per line).
    pub fn parse_collection(input: &str) -> Result<Vec<PaperRecord>, serde_json::Error> {
        let trimmed = input.trim_start();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed);
        }
        trimmed
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect()
    }
}

/// Citation metadata as returned by the bibliographic service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CitationMeta {
    #[serde(rename = "id")]
    pub external_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "cited_by_count", default, deserialize_with = "null_as_default")]
    pub citation_count: u64,
    #[serde(rename = "referenced_works", default, deserialize_with = "null_as_default")]
    pub reference_ids: Vec<String>,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Frame loop → resolver thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub generation: Generation,
    pub identifiers: Vec<String>,
}

/// Resolver thread → frame loop. `resolved[i]` answers `identifiers[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub generation: Generation,
    pub resolved: Vec<Option<CitationMeta>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_names_dedup_and_skip_blank() {
        let rec: PaperRecord = serde_json::from_str(
            r#"{"id":1,"authors":[{"name":" A "},{"name":"B"},{"name":"A"},{"name":""},{}]}"#,
        )
        .unwrap();
        assert_eq!(rec.author_names(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn parses_array_and_json_lines() {
        let arr = r#"[{"id":1,"doi":"10.1/x"},{"id":2,"authors":null}]"#;
        let lines = "{\"id\":1,\"doi\":\"10.1/x\"}\n\n{\"id\":2}\n";
        assert_eq!(PaperRecord::parse_collection(arr).unwrap().len(), 2);
        let parsed = PaperRecord::parse_collection(lines).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].doi(), Some("10.1/x"));
    }

    #[test]
    fn citation_meta_tolerates_nulls() {
        let meta: CitationMeta = serde_json::from_str(
            r#"{"id":"https://openalex.org/W1","title":null,"cited_by_count":null,"referenced_works":null}"#,
        )
        .unwrap();
        assert_eq!(meta.citation_count, 0);
        assert!(meta.reference_ids.is_empty());
        assert!(serde_json::from_str::<CitationMeta>(r#"{"title":"no id"}"#).is_err());
    }

    #[test]
    fn hops_parse_rejects_out_of_range() {
        assert_eq!("2".parse::<Hops>(), Ok(Hops::Two));
        assert!("3".parse::<Hops>().is_err());
        assert_eq!(Hops::try_from(0), Err(HopsError(0)));
    }
}
