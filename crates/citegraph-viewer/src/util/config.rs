use anyhow::Context;
use citegraph_core::build::{clamp_candidate_limit, DEFAULT_CANDIDATE_LIMIT};
use citegraph_core::interact::DEFAULT_CLICK_TOLERANCE;
use citegraph_core::{ForceParams, GraphKind, Hops, SessionConfig, ZoomParams};
use citegraph_resolver::{DEFAULT_CONCURRENCY, OPENALEX_BASE};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Viewer preferences. Graph layouts are never persisted, only tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_mode: GraphKind,
    pub default_hops: Hops,
    pub click_tolerance: f32,
    pub candidate_limit: usize,
    pub concurrency: usize,
    pub use_external: bool,
    pub openalex_base_url: String,
    pub request_timeout_secs: u64,
    pub zoom: ZoomParams,
    pub author_force: ForceParams,
    pub citation_force: ForceParams,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_mode: GraphKind::Author,
            default_hops: Hops::One,
            click_tolerance: DEFAULT_CLICK_TOLERANCE,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            use_external: true,
            openalex_base_url: OPENALEX_BASE.to_string(),
            request_timeout_secs: 15,
            zoom: ZoomParams::default(),
            author_force: ForceParams::for_kind(GraphKind::Author),
            citation_force: ForceParams::for_kind(GraphKind::Citation),
        }
    }
}

impl ViewerConfig {
    pub fn session_config(&self, kind: GraphKind) -> SessionConfig {
        SessionConfig {
            force: match kind {
                GraphKind::Author => self.author_force,
                GraphKind::Citation => self.citation_force,
            },
            zoom: self.zoom,
            click_tolerance: self.click_tolerance,
        }
    }

    pub fn candidate_limit(&self) -> usize {
        clamp_candidate_limit(self.candidate_limit)
    }

    /// Swaps unusable force or zoom settings for the built-in ones.
    fn sanitized(mut self) -> Self {
        for (kind, force) in [
            (GraphKind::Author, &mut self.author_force),
            (GraphKind::Citation, &mut self.citation_force),
        ] {
            if let Err(err) = force.validate() {
                tracing::warn!(kind = kind.as_str(), %err, "ignoring configured force parameters");
                *force = ForceParams::for_kind(kind);
            }
        }
        if let Err(err) = self.zoom.validate() {
            tracing::warn!(%err, "ignoring configured zoom parameters");
            self.zoom = ZoomParams::default();
        }
        self
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "citegraph")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let Some(path) = config_file_path() else {
        return ViewerConfig::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    match toml::from_str::<ViewerConfig>(&contents) {
        Ok(cfg) => cfg.sanitized(),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring unreadable viewer config");
            ViewerConfig::default()
        }
    }
}

pub fn save(cfg: &ViewerConfig) -> anyhow::Result<PathBuf> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)?;
    Ok(path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}
