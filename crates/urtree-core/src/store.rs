//! # Node Store
//!
//! Per-group arena of nodes with a memoized id lookup.
//!
//! A `NodeStore` lives exactly as long as one group is processed. Nodes are
//! created on first reference (as a record subject or as a parent), never
//! duplicated, and addressed by dense `NodeIdx` values. Edges are stored as
//! indices, so the store owns every node outright and independent groups can
//! be processed on independent threads without sharing anything.

use crate::aggregate::TreeRollup;
use crate::deviation::TreeDispersion;
use crate::{AuthorId, Engagement, NodeIdx, RawRecord, TweetId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// MEMO TAG
// =============================================================================

/// Tri-state guard for a derived value: not yet computed, or computed.
///
/// Keeps "computed and zero" distinct from "never computed".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Memo<T> {
    #[default]
    Uncomputed,
    Computed(T),
}

impl<T> Memo<T> {
    /// Whether the value has been computed.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self, Memo::Computed(_))
    }

    /// Borrow the computed value, if any.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Memo::Computed(value) => Some(value),
            Memo::Uncomputed => None,
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A post inside one group.
#[derive(Debug, Clone)]
pub struct Node {
    /// The post identifier.
    pub id: TweetId,
    /// Unset until the node's own record is observed.
    pub author_id: Option<AuthorId>,
    /// The post's own counters (zero until observed).
    pub own: Engagement,
    /// True once a record with this id as subject has been seen.
    pub observed: bool,
    /// Direct reply edges.
    pub children: BTreeSet<NodeIdx>,
    /// Quote-of / retweet-of attachment edges.
    pub ur_children: BTreeSet<NodeIdx>,
    /// Subtree aggregates for both variants.
    pub rollup: Memo<TreeRollup>,
    /// Dispersion statistics for both variants.
    pub dispersion: Memo<TreeDispersion>,
}

impl Node {
    fn new(id: TweetId) -> Self {
        Self {
            id,
            author_id: None,
            own: Engagement::default(),
            observed: false,
            children: BTreeSet::new(),
            ur_children: BTreeSet::new(),
            rollup: Memo::Uncomputed,
            dispersion: Memo::Uncomputed,
        }
    }

    /// No reply edges below this node.
    #[must_use]
    pub fn is_reply_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// No edges of either kind below this node.
    #[must_use]
    pub fn is_ur_leaf(&self) -> bool {
        self.children.is_empty() && self.ur_children.is_empty()
    }

    /// Reply edges followed by attachment edges.
    pub fn all_children(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.children.iter().chain(self.ur_children.iter()).copied()
    }
}

// =============================================================================
// NODE STORE
// =============================================================================

/// Arena of nodes for a single group.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    index: BTreeMap<TweetId, NodeIdx>,
}

impl NodeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store sized for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: BTreeMap::new(),
        }
    }

    /// Return the node for `id`, creating it on first reference.
    pub fn get_or_create(&mut self, id: TweetId) -> NodeIdx {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = NodeIdx(self.nodes.len());
        self.nodes.push(Node::new(id));
        self.index.insert(id, idx);
        idx
    }

    /// Record a post's own data on its node. Later observations overwrite earlier ones.
    pub fn observe(&mut self, record: &RawRecord) -> NodeIdx {
        let idx = self.get_or_create(record.tweet_id);
        let node = &mut self.nodes[idx.0];
        node.author_id = Some(record.author_id);
        node.own = record.engagement();
        node.observed = true;
        idx
    }

    /// Add `child` under `parent`, as a reply edge or an attachment edge.
    pub fn attach(&mut self, parent: NodeIdx, child: NodeIdx, reply: bool) {
        let node = &mut self.nodes[parent.0];
        if reply {
            node.children.insert(child);
        } else {
            node.ur_children.insert(child);
        }
    }

    /// Remove `child` from both edge sets of `parent`.
    pub fn detach(&mut self, parent: NodeIdx, child: NodeIdx) {
        let node = &mut self.nodes[parent.0];
        node.children.remove(&child);
        node.ur_children.remove(&child);
    }

    /// Find the node for `id` without creating it.
    #[must_use]
    pub fn lookup(&self, id: TweetId) -> Option<NodeIdx> {
        self.index.get(&id).copied()
    }

    /// Borrow a node.
    #[must_use]
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.0]
    }

    /// Total number of nodes, including unobserved placeholders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node indices in creation order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIdx> + use<> {
        (0..self.nodes.len()).map(NodeIdx)
    }

    /// Total number of edges of both kinds.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.children.len() + n.ur_children.len())
            .sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================
