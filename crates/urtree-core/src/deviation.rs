//! # Deviation Calculator
//!
//! Mean absolute deviation statistics, computed after every node of the
//! group has been aggregated.
//!
//! - Engagement: for each metric, `|raw(u) - mean|` summed over the node and
//!   its immediate edge targets `u`, where `mean = total / (1 + descendants)`.
//!   Reply children count in both variants, attachments only in the ur-tree.
//!   Only raw per-node counters are used, never subtree totals.
//! - Depth: over the node's immediate edges, how far the deepest leaf below
//!   each edge sits from the node's mean leaf depth.
//! - Authors: over the node's immediate edges, how far each child's distinct
//!   author count sits from the mean child author count.
//!
//! Every value is left unnormalized; the projector divides by
//! `1 + descendants` of the same variant. Each node only looks at its own
//! edges, so the pass over a group is linear in its edge count.

use crate::aggregate::{Rollup, TreeRollup};
use crate::store::{Memo, NodeStore};
use crate::{Engagement, Metric, NodeIdx, UrTreeError};
use serde::{Deserialize, Serialize};

// =============================================================================
// DISPERSION
// =============================================================================

/// Dispersion statistics of one node over one tree variant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dispersion {
    /// Summed absolute deviations, indexed like `Metric::ALL`.
    pub engagement: [f64; 4],
    /// Mean absolute deviation of per-edge depth from the mean leaf depth,
    /// before normalization.
    pub depth: f64,
    /// Mean absolute deviation of per-child distinct author counts, before
    /// normalization.
    pub authors: f64,
}

impl Dispersion {
    /// Accumulated absolute deviation of one metric.
    #[must_use]
    pub fn engagement(&self, metric: Metric) -> f64 {
        self.engagement[metric_slot(metric)]
    }
}

/// Dispersion for both tree variants of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeDispersion {
    pub reply: Dispersion,
    pub ur: Dispersion,
}

fn metric_slot(metric: Metric) -> usize {
    match metric {
        Metric::Reply => 0,
        Metric::Quote => 1,
        Metric::Like => 2,
        Metric::Retweet => 3,
    }
}

fn means(rollup: &Rollup) -> [f64; 4] {
    let population = rollup.population() as f64;
    Metric::ALL.map(|m| rollup.totals.get(m) as f64 / population)
}

fn add_deviation(acc: &mut [f64; 4], raw: &Engagement, means: &[f64; 4]) {
    for (slot, metric) in Metric::ALL.into_iter().enumerate() {
        acc[slot] += (raw.get(metric) as f64 - means[slot]).abs();
    }
}

// =============================================================================
// DEVIATION PASS
// =============================================================================

/// Compute and memoize the dispersion statistics of `idx`.
///
/// Requires the node and every node below it to be aggregated already.
/// Idempotent: once computed this is a no-op.
pub fn compute_deviation(store: &mut NodeStore, idx: NodeIdx) -> Result<(), UrTreeError> {
    if store.node(idx).dispersion.is_computed() {
        return Ok(());
    }
    let dispersion = compute(store, idx)?;
    store.node_mut(idx).dispersion = Memo::Computed(dispersion);
    Ok(())
}

fn compute(store: &NodeStore, idx: NodeIdx) -> Result<TreeDispersion, UrTreeError> {
    let root = store.node(idx);
    let rollup = root
        .rollup
        .get()
        .ok_or(UrTreeError::NotAggregated(root.id))?;

    let reply_means = means(&rollup.reply);
    let ur_means = means(&rollup.ur);

    let mut reply = Dispersion::default();
    let mut ur = Dispersion::default();
    add_deviation(&mut reply.engagement, &root.own, &reply_means);
    add_deviation(&mut ur.engagement, &root.own, &ur_means);

    for &child in &root.children {
        let own = &store.node(child).own;
        add_deviation(&mut reply.engagement, own, &reply_means);
        add_deviation(&mut ur.engagement, own, &ur_means);
    }
    for &child in &root.ur_children {
        add_deviation(&mut ur.engagement, &store.node(child).own, &ur_means);
    }

    // Per-edge statistics use the children's own rollups of the same variant.
    let mut reply_edges = Vec::with_capacity(root.children.len());
    for &child in &root.children {
        reply_edges.push(&child_rollup(store, child)?.reply);
    }
    let mut ur_edges = Vec::with_capacity(root.children.len() + root.ur_children.len());
    for child in root.all_children() {
        ur_edges.push(&child_rollup(store, child)?.ur);
    }

    reply.depth = depth_dispersion(&rollup.reply, &reply_edges);
    reply.authors = author_dispersion(&reply_edges);
    ur.depth = depth_dispersion(&rollup.ur, &ur_edges);
    ur.authors = author_dispersion(&ur_edges);

    Ok(TreeDispersion { reply, ur })
}

fn child_rollup(store: &NodeStore, idx: NodeIdx) -> Result<&TreeRollup, UrTreeError> {
    let node = store.node(idx);
    node.rollup
        .get()
        .ok_or(UrTreeError::NotAggregated(node.id))
}

/// Depth of each edge is `1 + max_depth` of the child, seen from the parent.
fn depth_dispersion(own: &Rollup, edges: &[&Rollup]) -> f64 {
    if own.leaf_descendants == 0 || edges.is_empty() {
        return 0.0;
    }
    let mean_depth = own.mean_depth();
    let total: f64 = edges
        .iter()
        .map(|c| ((1 + c.max_depth) as f64 - mean_depth).abs())
        .sum();
    total / edges.len() as f64
}

fn author_dispersion(edges: &[&Rollup]) -> f64 {
    if edges.is_empty() {
        return 0.0;
    }
    let count = edges.len() as f64;
    let mean = edges.iter().map(|c| c.authors.len() as f64).sum::<f64>() / count;
    edges
        .iter()
        .map(|c| (c.authors.len() as f64 - mean).abs())
        .sum::<f64>()
        / count
}

// =============================================================================
// TESTS
// =============================================================================
