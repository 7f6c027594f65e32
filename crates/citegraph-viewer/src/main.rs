mod app;
mod graph;
mod render;
mod ui;
mod util;

use anyhow::{Context, Result};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use citegraph_core::{GraphKind, Hops, NodeId};
use citegraph_resolver::{spawn_resolver, CitationResolver, HttpWorkSource, ResolverHandle};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::app::resources::ResolverLink;
use crate::app::CiteGraphViewerPlugin;
use crate::graph::ViewState;
use crate::util::config::{self, ViewerConfig};
use crate::util::records::load_papers;

/// Interactive co-author and citation graphs for a paper collection.
#[derive(Debug, Parser)]
#[command(name = "citegraph-viewer", version)]
struct Args {
    /// Paper records as a JSON array or JSON Lines.
    papers: PathBuf,

    /// author | citation
    #[arg(long)]
    mode: Option<GraphKind>,

    /// Initial focal node: an author name, or a paper id in citation mode.
    #[arg(long)]
    focus: Option<String>,

    /// 1 or 2
    #[arg(long)]
    hops: Option<Hops>,

    /// Papers considered for the citation graph (clamped to 30..=300).
    #[arg(long)]
    limit: Option<usize>,

    /// Skip citation lookups.
    #[arg(long)]
    offline: bool,
}

fn start_resolver(cfg: &ViewerConfig) -> Result<ResolverHandle> {
    let source = HttpWorkSource::new(Duration::from_secs(cfg.request_timeout_secs))?;
    let resolver = CitationResolver::new(source, &cfg.openalex_base_url)
        .with_context(|| format!("bad OpenAlex base url {}", cfg.openalex_base_url))?;
    spawn_resolver(resolver, cfg.concurrency).context("failed to start resolver thread")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = config::load_or_default();
    if let Some(limit) = args.limit {
        cfg.candidate_limit = limit;
    }
    if args.offline {
        cfg.use_external = false;
    }
    let kind = args.mode.unwrap_or(cfg.default_mode);
    let hops = args.hops.unwrap_or(cfg.default_hops);
    let papers = load_papers(&args.papers)?;

    let link = if kind == GraphKind::Citation && !args.offline {
        Some(start_resolver(&cfg)?)
    } else {
        None
    };
    let state = ViewState::new(
        kind,
        papers,
        cfg,
        args.focus.map(NodeId),
        hops,
        link.is_some(),
    );

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: format!("CiteGraph ({} graph)", kind.as_str()),
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                filter: "wgpu=error,naga=warn".into(),
                ..default()
            }),
    )
    .add_plugins(EguiPlugin)
    .add_plugins(CiteGraphViewerPlugin)
    .insert_resource(state);
    if let Some(link) = link {
        app.insert_resource(ResolverLink(link));
    }
    app.run();
    Ok(())
}
