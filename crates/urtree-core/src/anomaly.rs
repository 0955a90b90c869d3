//! # Anomalies
//!
//! Structural problems found while building or aggregating a group.
//!
//! None of these abort processing. The offending node is reported through
//! `tracing` and returned to the caller, and the rest of the group continues.

use crate::aggregate::{Rollup, TreeRollup};
use crate::{ParentLink, TweetId};
use serde::Serialize;
use std::fmt;

/// Which of the two overlapping trees a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Variant {
    /// Reply edges only.
    Reply,
    /// Reply edges plus quote/retweet attachment edges.
    Ur,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Reply => write!(f, "reply-tree"),
            Variant::Ur => write!(f, "ur-tree"),
        }
    }
}

/// A malformed-input finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Anomaly {
    /// A post was claimed by more than one parent; one link was dropped.
    ConflictingParent {
        node: TweetId,
        kept: TweetId,
        dropped: TweetId,
    },
    /// Parent links formed a cycle; `node` was detached from `parent`.
    CycleBroken { node: TweetId, parent: TweetId },
    /// A subtree counted more descendants than the group has nodes.
    DescendantOverflow {
        node: TweetId,
        variant: Variant,
        descendants: u64,
        group_size: usize,
    },
    /// A subtree counted more leaves than descendants.
    LeafOverflow {
        node: TweetId,
        variant: Variant,
        leaf_descendants: u64,
        descendants: u64,
    },
}

impl Anomaly {
    /// Build a conflicting-parent finding from two links.
    #[must_use]
    pub fn conflicting_parent(node: TweetId, kept: ParentLink, dropped: ParentLink) -> Self {
        Anomaly::ConflictingParent {
            node,
            kept: kept.parent(),
            dropped: dropped.parent(),
        }
    }

    /// The node the finding is about.
    #[must_use]
    pub fn node(&self) -> TweetId {
        match self {
            Anomaly::ConflictingParent { node, .. }
            | Anomaly::CycleBroken { node, .. }
            | Anomaly::DescendantOverflow { node, .. }
            | Anomaly::LeafOverflow { node, .. } => *node,
        }
    }

    /// Emit the finding through `tracing`.
    ///
    /// Input conflicts are warnings; broken aggregate invariants are errors.
    pub fn report(&self) {
        match self {
            Anomaly::ConflictingParent { .. } | Anomaly::CycleBroken { .. } => {
                tracing::warn!(node = self.node().0, "{}", self);
            }
            Anomaly::DescendantOverflow { .. } | Anomaly::LeafOverflow { .. } => {
                tracing::error!(node = self.node().0, "Something is off. {}", self);
            }
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::ConflictingParent {
                node,
                kept,
                dropped,
            } => write!(
                f,
                "{} is claimed by {} and {}; keeping {}",
                node, kept, dropped, kept
            ),
            Anomaly::CycleBroken { node, parent } => {
                write!(f, "{} closes a parent cycle; detached from {}", node, parent)
            }
            Anomaly::DescendantOverflow {
                node,
                variant,
                descendants,
                group_size,
            } => write!(
                f,
                "{} has {} {} descendants which is more than {} (nodes in group)",
                node, descendants, variant, group_size
            ),
            Anomaly::LeafOverflow {
                node,
                variant,
                leaf_descendants,
                descendants,
            } => write!(
                f,
                "{} has {} {} leaf descendants which is more than {} (descendants)",
                node, leaf_descendants, variant, descendants
            ),
        }
    }
}

/// Check the aggregate sanity bounds of one node in both variants.
#[must_use]
pub fn check_rollup(node: TweetId, rollup: &TreeRollup, group_size: usize) -> Vec<Anomaly> {
    let mut found = Vec::new();
    for (variant, r) in [(Variant::Reply, &rollup.reply), (Variant::Ur, &rollup.ur)] {
        check_variant(node, variant, r, group_size, &mut found);
    }
    found
}

fn check_variant(
    node: TweetId,
    variant: Variant,
    rollup: &Rollup,
    group_size: usize,
    found: &mut Vec<Anomaly>,
) {
    if rollup.descendants > group_size as u64 {
        found.push(Anomaly::DescendantOverflow {
            node,
            variant,
            descendants: rollup.descendants,
            group_size,
        });
    }
    if rollup.leaf_descendants > rollup.descendants {
        found.push(Anomaly::LeafOverflow {
            node,
            variant,
            leaf_descendants: rollup.leaf_descendants,
            descendants: rollup.descendants,
        });
    }
}
