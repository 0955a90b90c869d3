//! # Subtree Aggregator
//!
//! Bottom-up rollups for every node, in two overlapping views:
//! - the reply-tree, reached through `children` only
//! - the ur-tree, reached through `children` and `ur_children`
//!
//! ## Traversal
//!
//! `aggregate` walks the subtree with an explicit stack, so arbitrarily deep
//! reply chains never touch the call stack. Each frame carries the depth
//! relative to the node being aggregated and whether every edge on the way
//! down was a reply edge. Once an attachment edge is crossed, the frame (and
//! everything below it) only contributes to the ur-tree.
//!
//! A frame whose node is already aggregated is folded in from its rollup and
//! not descended into. Feeding nodes leaf-first therefore costs O(edges);
//! root-first degrades toward O(n²) without changing any result.

use crate::store::{Memo, Node, NodeStore};
use crate::{AuthorId, Engagement, NodeIdx};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// ROLLUP
// =============================================================================

/// Aggregates of one node over one tree variant.
///
/// The node itself is not one of its own descendants or leaves, but its own
/// counters and author are part of `totals` and `authors`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rollup {
    /// Nodes strictly below this one.
    pub descendants: u64,
    /// Descendants without further qualifying children.
    pub leaf_descendants: u64,
    /// Greatest edge count to any leaf descendant.
    pub max_depth: u64,
    /// Sum of leaf depths.
    pub sum_depth: u64,
    /// Engagement counters summed over the node and its descendants.
    pub totals: Engagement,
    /// Distinct known authors in the node and its descendants.
    pub authors: BTreeSet<AuthorId>,
}

impl Rollup {
    /// Base values from a node's own fields.
    #[must_use]
    pub fn seed(node: &Node) -> Self {
        Self {
            totals: node.own,
            authors: node.author_id.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Mean leaf depth, 0.0 without leaves.
    #[must_use]
    pub fn mean_depth(&self) -> f64 {
        if self.leaf_descendants == 0 {
            0.0
        } else {
            self.sum_depth as f64 / self.leaf_descendants as f64
        }
    }

    /// `descendants / (1 + inner descendants)`.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        let inner = self.descendants.saturating_sub(self.leaf_descendants);
        self.descendants as f64 / (1 + inner) as f64
    }

    /// Number of nodes this rollup covers, the node itself included.
    #[must_use]
    pub fn population(&self) -> u64 {
        self.descendants.saturating_add(1)
    }

    fn count_leaf(&mut self, depth: u64) {
        self.leaf_descendants = self.leaf_descendants.saturating_add(1);
        self.max_depth = self.max_depth.max(depth);
        self.sum_depth = self.sum_depth.saturating_add(depth);
    }

    /// Fold a not-yet-aggregated descendant from its raw fields.
    fn fold_raw(&mut self, node: &Node, depth: u64, is_leaf: bool) {
        self.descendants = self.descendants.saturating_add(1);
        self.totals.absorb(&node.own);
        self.authors.extend(node.author_id);
        if is_leaf {
            self.count_leaf(depth);
        }
    }

    /// Fold an aggregated descendant (and its whole subtree) at `depth`.
    fn fold_rollup(&mut self, sub: &Rollup, depth: u64, is_leaf: bool) {
        self.descendants = self.descendants.saturating_add(sub.population());
        self.totals.absorb(&sub.totals);
        self.authors.extend(sub.authors.iter().copied());
        if is_leaf {
            self.count_leaf(depth);
        } else {
            self.leaf_descendants = self.leaf_descendants.saturating_add(sub.leaf_descendants);
            self.max_depth = self.max_depth.max(depth.saturating_add(sub.max_depth));
            self.sum_depth = self
                .sum_depth
                .saturating_add(sub.sum_depth)
                .saturating_add(depth.saturating_mul(sub.leaf_descendants));
        }
    }
}

/// Rollups for both tree variants of one node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreeRollup {
    pub reply: Rollup,
    pub ur: Rollup,
}

impl TreeRollup {
    fn seed(node: &Node) -> Self {
        let base = Rollup::seed(node);
        Self {
            reply: base.clone(),
            ur: base,
        }
    }
}

// =============================================================================
// TRAVERSAL FRAME
// =============================================================================

/// One pending stack entry of a subtree walk.
#[derive(Debug, Clone, Copy)]
struct Frame {
    idx: NodeIdx,
    depth: u64,
    on_reply_path: bool,
}

/// Push the edges of `node` at `depth`. Attachment edges always leave the reply path.
fn push_children(stack: &mut Vec<Frame>, node: &Node, depth: u64, on_reply_path: bool) {
    stack.extend(node.children.iter().map(|&idx| Frame {
        idx,
        depth,
        on_reply_path,
    }));
    stack.extend(node.ur_children.iter().map(|&idx| Frame {
        idx,
        depth,
        on_reply_path: false,
    }));
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Compute and memoize the rollups of `idx`.
///
/// Idempotent: once the node's rollup is computed this is a no-op.
pub fn aggregate(store: &mut NodeStore, idx: NodeIdx) {
    if store.node(idx).rollup.is_computed() {
        return;
    }
    let rollup = compute_rollup(store, idx);
    store.node_mut(idx).rollup = Memo::Computed(rollup);
}

fn compute_rollup(store: &NodeStore, idx: NodeIdx) -> TreeRollup {
    let root = store.node(idx);
    let mut acc = TreeRollup::seed(root);

    let mut stack = Vec::with_capacity(root.children.len() + root.ur_children.len());
    push_children(&mut stack, root, 1, true);

    while let Some(frame) = stack.pop() {
        let node = store.node(frame.idx);
        match node.rollup.get() {
            Some(sub) => {
                acc.ur.fold_rollup(&sub.ur, frame.depth, node.is_ur_leaf());
                if frame.on_reply_path {
                    acc.reply
                        .fold_rollup(&sub.reply, frame.depth, node.is_reply_leaf());
                }
            }
            None => {
                acc.ur.fold_raw(node, frame.depth, node.is_ur_leaf());
                if frame.on_reply_path {
                    acc.reply.fold_raw(node, frame.depth, node.is_reply_leaf());
                }
                push_children(&mut stack, node, frame.depth + 1, frame.on_reply_path);
            }
        }
    }

    acc
}

// =============================================================================
// TESTS
// =============================================================================
