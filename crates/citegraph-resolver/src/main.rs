use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use citegraph_core::build::{citation_candidates, clamp_candidate_limit, DEFAULT_CANDIDATE_LIMIT};
use citegraph_core::PaperRecord;
use citegraph_resolver::{CitationResolver, HttpWorkSource, DEFAULT_CONCURRENCY, OPENALEX_BASE};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Resolve citation metadata for the DOIs in a paper collection.
#[derive(Debug, Parser)]
#[command(name = "citegraph-resolve", version)]
struct Args {
    /// Paper records as a JSON array or JSON Lines.
    papers: PathBuf,

    /// Papers considered (clamped to 30..=300).
    #[arg(long, default_value_t = DEFAULT_CANDIDATE_LIMIT)]
    limit: usize,

    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    #[arg(long, default_value = OPENALEX_BASE)]
    base_url: String,

    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
}

#[derive(Serialize)]
struct Line<'a> {
    paper_id: u64,
    doi: &'a str,
    #[serde(flatten)]
    meta: Option<&'a citegraph_core::CitationMeta>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.papers)
        .with_context(|| format!("read {}", args.papers.display()))?;
    let records = PaperRecord::parse_collection(&raw)
        .with_context(|| format!("parse {}", args.papers.display()))?;

    let limit = clamp_candidate_limit(args.limit);
    let candidates = citation_candidates(&records, limit);
    tracing::info!(
        records = records.len(),
        candidates = candidates.len(),
        limit,
        "resolving citation metadata"
    );

    let source = HttpWorkSource::new(Duration::from_secs(args.timeout_secs))?;
    let resolver = CitationResolver::new(source, &args.base_url)?;
    let identifiers: Vec<String> = candidates.iter().map(|c| c.doi.clone()).collect();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let Some(resolved) = resolver
        .resolve_batch(&identifiers, args.concurrency, &cancel)
        .await
    else {
        anyhow::bail!("interrupted");
    };

    let mut hits = 0usize;
    for (cand, meta) in candidates.iter().zip(&resolved) {
        hits += usize::from(meta.is_some());
        let line = Line {
            paper_id: cand.paper_id,
            doi: &cand.doi,
            meta: meta.as_ref(),
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    tracing::info!(hits, misses = resolved.len() - hits, "done");
    Ok(())
}
