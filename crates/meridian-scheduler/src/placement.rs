//! Placement strategies for pod scheduling.

use serde::Deserialize;
use std::cmp::Reverse;

use crate::error::{ClusterError, Result};
use crate::registry::{ClusterRegistry, NodeId, NodeInfo, PodId};

/// Trait for placement strategies.
pub trait PlacementAlgorithm: Send + Sync {
    /// Selects a node able to host `cpu_required` CPU from the candidates.
    ///
    /// Candidates arrive in registration order; nodes that are not healthy
    /// or lack capacity never qualify. Selection mutates nothing and
    /// returns `None` when no candidate fits.
    fn select(&self, cpu_required: u32, candidates: &[NodeInfo]) -> Option<NodeId>;

    /// Returns the strategy name.
    fn name(&self) -> &'static str;
}

fn qualifies(node: &NodeInfo, cpu_required: u32) -> bool {
    node.status.is_schedulable() && node.available_cpu >= cpu_required
}

/// First-fit: the earliest-registered node that fits.
#[derive(Debug, Default)]
pub struct FirstFit;

impl PlacementAlgorithm for FirstFit {
    fn select(&self, cpu_required: u32, candidates: &[NodeInfo]) -> Option<NodeId> {
        candidates
            .iter()
            .find(|node| qualifies(node, cpu_required))
            .map(|node| node.id.clone())
    }

    fn name(&self) -> &'static str {
        "first-fit"
    }
}

/// Best-fit: the qualifying node with the least leftover capacity.
#[derive(Debug, Default)]
pub struct BestFit;

impl PlacementAlgorithm for BestFit {
    fn select(&self, cpu_required: u32, candidates: &[NodeInfo]) -> Option<NodeId> {
        // min_by_key keeps the earliest-registered node on ties
        candidates
            .iter()
            .filter(|node| qualifies(node, cpu_required))
            .min_by_key(|node| node.available_cpu - cpu_required)
            .map(|node| node.id.clone())
    }

    fn name(&self) -> &'static str {
        "best-fit"
    }
}

/// Worst-fit: the qualifying node with the most free capacity.
#[derive(Debug, Default)]
pub struct WorstFit;

impl PlacementAlgorithm for WorstFit {
    fn select(&self, cpu_required: u32, candidates: &[NodeInfo]) -> Option<NodeId> {
        // Reverse preserves min_by_key's earliest-on-ties rule while
        // maximising free capacity
        candidates
            .iter()
            .filter(|node| qualifies(node, cpu_required))
            .min_by_key(|node| Reverse(node.available_cpu))
            .map(|node| node.id.clone())
    }

    fn name(&self) -> &'static str {
        "worst-fit"
    }
}

/// Placement strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StrategyKind {
    /// First qualifying node in registration order.
    FirstFit,
    /// Tightest fit.
    BestFit,
    /// Loosest fit.
    WorstFit,
}

static FIRST_FIT: FirstFit = FirstFit;
static BEST_FIT: BestFit = BestFit;
static WORST_FIT: WorstFit = WorstFit;

impl StrategyKind {
    /// Parses a strategy name from a request.
    ///
    /// Anything other than the three known names is `None`; callers
    /// surface that as an explicit failure rather than falling back to a
    /// default.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "first-fit" => Some(Self::FirstFit),
            "best-fit" => Some(Self::BestFit),
            "worst-fit" => Some(Self::WorstFit),
            _ => None,
        }
    }

    /// Returns the algorithm implementation for this strategy.
    #[must_use]
    pub fn algorithm(self) -> &'static dyn PlacementAlgorithm {
        match self {
            Self::FirstFit => &FIRST_FIT,
            Self::BestFit => &BEST_FIT,
            Self::WorstFit => &WORST_FIT,
        }
    }

    /// Returns the canonical strategy name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstFit => "first-fit",
            Self::BestFit => "best-fit",
            Self::WorstFit => "worst-fit",
        }
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        Self::FirstFit
    }
}

/// Reservation attempts per launch before giving up.
const MAX_BIND_ATTEMPTS: usize = 3;

/// Selects a node for a new pod and reserves the capacity there.
///
/// Selection works on a snapshot and mutates nothing; the reservation can
/// miss if a concurrent launch claims the capacity first, in which case
/// selection is retried against fresh state a bounded number of times.
pub fn place_pod(
    registry: &ClusterRegistry,
    strategy: StrategyKind,
    cpu_required: u32,
) -> Result<(PodId, NodeId)> {
    let algorithm = strategy.algorithm();

    for _ in 0..MAX_BIND_ATTEMPTS {
        let candidates = registry.nodes();
        let target = match algorithm.select(cpu_required, &candidates) {
            Some(target) => target,
            None => break,
        };

        if let Some(pod_id) = registry.bind_new_pod(&target, cpu_required) {
            return Ok((pod_id, target));
        }
    }

    Err(ClusterError::NoSuitableNode { cpu_required })
}
