use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ego::EgoGraph;
use crate::{GraphKind, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    /// Ideal spacing: repulsion is `k²/d`, attraction `d²/k · ln(1+w)`.
    pub k: f32,
    pub step_scale: f32,
    pub damping: f32,
    pub seed_radius: f32,
    /// Added to every pair distance so coincident nodes never divide by zero.
    pub distance_bias: f32,
}

impl ForceParams {
    pub fn for_kind(kind: GraphKind) -> Self {
        match kind {
            GraphKind::Author => Self::default(),
            GraphKind::Citation => Self {
                k: 160.0,
                seed_radius: 220.0,
                ..Self::default()
            },
        }
    }
}

/// Largest accepted ideal spacing; beyond it `k²` repulsion overflows long
/// before the layout could settle.
pub const MAX_SPACING: f32 = 10_000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("{name} = {value} is out of range")]
    OutOfRange { name: &'static str, value: f32 },
    #[error("zoom bounds {min}..{max} are empty")]
    EmptyZoomRange { min: f32, max: f32 },
}

fn check(name: &'static str, value: f32, ok: bool) -> Result<(), ParamsError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(ParamsError::OutOfRange { name, value })
    }
}

impl ForceParams {
    /// Rejects settings that would make every step non-finite.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check("k", self.k, self.k > 0.0 && self.k <= MAX_SPACING)?;
        check("step_scale", self.step_scale, self.step_scale > 0.0)?;
        check("damping", self.damping, (0.0..=1.0).contains(&self.damping))?;
        check("seed_radius", self.seed_radius, self.seed_radius > 0.0)?;
        check("distance_bias", self.distance_bias, self.distance_bias >= 0.0)
    }
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            k: 140.0,
            step_scale: 0.01,
            damping: 0.6,
            seed_radius: 160.0,
            distance_bias: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Seeded,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimNode {
    pub id: NodeId,
    pub label: String,
    pub weight: u32,
    pub year: Option<i32>,
    pub pos: Vec2,
    pub vel: Vec2,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimEdge {
    pub source: usize,
    pub target: usize,
    pub weight: u32,
    pub mutual: bool,
    pull: f32,
}

/// Node arena plus the force solver. Indices are stable until the next
/// [`Simulation::reseed`]; `index_of` maps ids to them.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: ForceParams,
    state: SimState,
    nodes: Vec<SimNode>,
    index: HashMap<NodeId, usize>,
    edges: Vec<SimEdge>,
    skipped_steps: u64,
}

impl Simulation {
    pub fn new(params: ForceParams) -> Self {
        Self {
            params,
            state: SimState::Seeded,
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            skipped_steps: 0,
        }
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimState::Running
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SimEdge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> Option<&SimNode> {
        self.nodes.get(idx)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn skipped_steps(&self) -> u64 {
        self.skipped_steps
    }

    /// Replaces the node set with `ego`'s. Surviving ids keep position,
    /// velocity and pin; new ids are placed on a circle around `center`.
    pub fn reseed(&mut self, ego: &EgoGraph, center: Vec2) {
        if self.state == SimState::Stopped {
            return;
        }
        let n = ego.nodes.len().max(1) as f32;
        let mut nodes = Vec::with_capacity(ego.nodes.len());
        for (i, gn) in ego.nodes.iter().enumerate() {
            let prev = self.index.get(&gn.id).map(|&j| &self.nodes[j]);
            let (pos, vel, pinned) = match prev {
                Some(p) => (p.pos, p.vel, p.pinned),
                None => {
                    let t = (i as f32) / n * std::f32::consts::TAU;
                    let pos = center + self.params.seed_radius * Vec2::new(t.cos(), t.sin());
                    (pos, Vec2::ZERO, false)
                }
            };
            nodes.push(SimNode {
                id: gn.id.clone(),
                label: gn.label.clone(),
                weight: gn.weight,
                year: gn.year,
                pos,
                vel,
                pinned,
            });
        }

        self.index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
        self.nodes = nodes;
        self.edges = ego
            .edges
            .iter()
            .filter_map(|e| {
                Some(SimEdge {
                    source: *self.index.get(&e.from)?,
                    target: *self.index.get(&e.to)?,
                    weight: e.weight,
                    mutual: e.mutual,
                    pull: (1.0 + e.weight as f32).ln(),
                })
            })
            .collect();
    }

    /// Drops all nodes so the next reseed places everything fresh.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.edges.clear();
    }

    pub fn start(&mut self) {
        if self.state == SimState::Seeded {
            self.state = SimState::Running;
        }
    }

    pub fn stop(&mut self) {
        self.state = SimState::Stopped;
    }

    pub fn pin(&mut self, idx: usize) {
        if let Some(node) = self.nodes.get_mut(idx) {
            node.pinned = true;
            node.vel = Vec2::ZERO;
        }
    }

    /// Writes a dragged node's position directly.
    pub fn drag_to(&mut self, idx: usize, world: Vec2) {
        if let Some(node) = self.nodes.get_mut(idx) {
            node.pos = world;
            node.vel = Vec2::ZERO;
        }
    }

    /// End of a drag: the node stays pinned with no residual velocity.
    pub fn release(&mut self, idx: usize) {
        if let Some(node) = self.nodes.get_mut(idx) {
            node.vel = Vec2::ZERO;
        }
    }

    pub fn unpin(&mut self, idx: usize) {
        if let Some(node) = self.nodes.get_mut(idx) {
            node.pinned = false;
            node.vel = Vec2::ZERO;
        }
    }

    pub fn unpin_all(&mut self) -> usize {
        let mut count = 0;
        for node in self.nodes.iter_mut().filter(|n| n.pinned) {
            node.pinned = false;
            node.vel = Vec2::ZERO;
            count += 1;
        }
        count
    }

    /// One solver iteration. Returns false when not running or when the step
    /// was rolled back because it produced non-finite values.
    pub fn step(&mut self) -> bool {
        if self.state != SimState::Running || self.nodes.is_empty() {
            return false;
        }

        let p = self.params;
        let k2 = p.k * p.k;
        let mut pos: Vec<Vec2> = self.nodes.iter().map(|n| n.pos).collect();
        let mut vel: Vec<Vec2> = self.nodes.iter().map(|n| n.vel).collect();
        let count = pos.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let delta = pos[i] - pos[j];
                let raw = delta.length();
                let dir = if raw > 1e-4 {
                    delta / raw
                } else {
                    let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
                    Vec2::new(angle.cos(), angle.sin())
                };
                let dist = raw + p.distance_bias;
                let push = dir * (k2 / dist);
                vel[i] += push;
                vel[j] -= push;
            }
        }

        for e in &self.edges {
            let delta = pos[e.source] - pos[e.target];
            let raw = delta.length();
            if raw <= 1e-4 {
                continue;
            }
            let dist = raw + p.distance_bias;
            let pull = (delta / raw) * (dist * dist / p.k * e.pull);
            vel[e.source] -= pull;
            vel[e.target] += pull;
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.pinned {
                vel[i] = Vec2::ZERO;
                continue;
            }
            pos[i] += vel[i] * p.step_scale;
            vel[i] *= p.damping;
        }

        if !pos.iter().chain(vel.iter()).all(|v| v.is_finite()) {
            self.skipped_steps += 1;
            tracing::warn!(
                nodes = count,
                skipped = self.skipped_steps,
                "layout step produced non-finite values; skipped"
            );
            return false;
        }

        for ((node, new_pos), new_vel) in self.nodes.iter_mut().zip(pos).zip(vel) {
            node.pos = new_pos;
            node.vel = new_vel;
        }
        true
    }
}
