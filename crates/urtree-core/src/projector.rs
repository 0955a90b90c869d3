//! # Result Projector
//!
//! Flattens a node's rollups and dispersion into one fixed-shape record.
//!
//! Every column exists in a reply-tree and an ur-tree flavor; the ur-tree
//! column carries the `ur_` prefix. Ratios and every dispersion column are
//! divided by the population of the same variant, `1 + descendants`.

use crate::aggregate::Rollup;
use crate::deviation::Dispersion;
use crate::primitives::OUTPUT_COLUMNS;
use crate::store::NodeStore;
use crate::{Metric, NodeIdx, RawRecord, TweetId, UrTreeError};
use serde::{Deserialize, Serialize};

/// Per-node output record handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub tweet_id: TweetId,

    pub children: u64,
    pub ur_children: u64,
    pub descendants: u64,
    pub ur_descendants: u64,
    pub leaf_descendants: u64,
    pub ur_leaf_descendants: u64,
    pub max_depth: u64,
    pub ur_max_depth: u64,
    pub t_authors: u64,
    pub ur_t_authors: u64,
    pub t_reply_count: u64,
    pub ur_t_reply_count: u64,
    pub t_quote_count: u64,
    pub ur_t_quote_count: u64,
    pub t_like_count: u64,
    pub ur_t_like_count: u64,
    pub t_retweet_count: u64,
    pub ur_t_retweet_count: u64,

    pub branching_factor: f64,
    pub ur_branching_factor: f64,
    pub mean_depth: f64,
    pub ur_mean_depth: f64,
    pub depth_mad: f64,
    pub ur_depth_mad: f64,
    pub mean_reply_count: f64,
    pub ur_mean_reply_count: f64,
    pub reply_count_mad: f64,
    pub ur_reply_count_mad: f64,
    pub mean_quote_count: f64,
    pub ur_mean_quote_count: f64,
    pub quote_count_mad: f64,
    pub ur_quote_count_mad: f64,
    pub mean_like_count: f64,
    pub ur_mean_like_count: f64,
    pub like_count_mad: f64,
    pub ur_like_count_mad: f64,
    pub mean_retweet_count: f64,
    pub ur_mean_retweet_count: f64,
    pub retweet_count_mad: f64,
    pub ur_retweet_count_mad: f64,
    pub authors_mad: f64,
    pub ur_authors_mad: f64,
}

/// Derived ratios of one variant, before they are spread into columns.
struct Ratios {
    branching_factor: f64,
    mean_depth: f64,
    means: [f64; 4],
    mads: [f64; 4],
    depth_mad: f64,
    authors_mad: f64,
}

impl Ratios {
    fn new(rollup: &Rollup, dispersion: &Dispersion) -> Self {
        let population = rollup.population() as f64;
        Self {
            branching_factor: rollup.branching_factor(),
            mean_depth: rollup.mean_depth(),
            means: Metric::ALL.map(|m| rollup.totals.get(m) as f64 / population),
            mads: Metric::ALL.map(|m| dispersion.engagement(m) / population),
            depth_mad: dispersion.depth / population,
            authors_mad: dispersion.authors / population,
        }
    }
}

impl NodeStats {
    /// Column names, in record order.
    pub const COLUMNS: [&'static str; OUTPUT_COLUMNS] = [
        "tweet_id",
        "children",
        "ur_children",
        "descendants",
        "ur_descendants",
        "leaf_descendants",
        "ur_leaf_descendants",
        "max_depth",
        "ur_max_depth",
        "t_authors",
        "ur_t_authors",
        "t_reply_count",
        "ur_t_reply_count",
        "t_quote_count",
        "ur_t_quote_count",
        "t_like_count",
        "ur_t_like_count",
        "t_retweet_count",
        "ur_t_retweet_count",
        "branching_factor",
        "ur_branching_factor",
        "mean_depth",
        "ur_mean_depth",
        "depth_mad",
        "ur_depth_mad",
        "mean_reply_count",
        "ur_mean_reply_count",
        "reply_count_mad",
        "ur_reply_count_mad",
        "mean_quote_count",
        "ur_mean_quote_count",
        "quote_count_mad",
        "ur_quote_count_mad",
        "mean_like_count",
        "ur_mean_like_count",
        "like_count_mad",
        "ur_like_count_mad",
        "mean_retweet_count",
        "ur_mean_retweet_count",
        "retweet_count_mad",
        "ur_retweet_count_mad",
        "authors_mad",
        "ur_authors_mad",
    ];

    /// Stats of a post that is alone in its group.
    ///
    /// Equivalent to the general path for a node without edges: all
    /// aggregates are zero, means equal the post's own counters and every
    /// dispersion value is 0.0.
    #[must_use]
    pub fn singleton(record: &RawRecord) -> Self {
        let own = record.engagement();
        Self {
            tweet_id: record.tweet_id,
            children: 0,
            ur_children: 0,
            descendants: 0,
            ur_descendants: 0,
            leaf_descendants: 0,
            ur_leaf_descendants: 0,
            max_depth: 0,
            ur_max_depth: 0,
            t_authors: 1,
            ur_t_authors: 1,
            t_reply_count: own.reply_count,
            ur_t_reply_count: own.reply_count,
            t_quote_count: own.quote_count,
            ur_t_quote_count: own.quote_count,
            t_like_count: own.like_count,
            ur_t_like_count: own.like_count,
            t_retweet_count: own.retweet_count,
            ur_t_retweet_count: own.retweet_count,
            branching_factor: 0.0,
            ur_branching_factor: 0.0,
            mean_depth: 0.0,
            ur_mean_depth: 0.0,
            depth_mad: 0.0,
            ur_depth_mad: 0.0,
            mean_reply_count: own.reply_count as f64,
            ur_mean_reply_count: own.reply_count as f64,
            reply_count_mad: 0.0,
            ur_reply_count_mad: 0.0,
            mean_quote_count: own.quote_count as f64,
            ur_mean_quote_count: own.quote_count as f64,
            quote_count_mad: 0.0,
            ur_quote_count_mad: 0.0,
            mean_like_count: own.like_count as f64,
            ur_mean_like_count: own.like_count as f64,
            like_count_mad: 0.0,
            ur_like_count_mad: 0.0,
            mean_retweet_count: own.retweet_count as f64,
            ur_mean_retweet_count: own.retweet_count as f64,
            retweet_count_mad: 0.0,
            ur_retweet_count_mad: 0.0,
            authors_mad: 0.0,
            ur_authors_mad: 0.0,
        }
    }
}

/// Build the output record of `idx`.
///
/// Pure; requires both the aggregation and the deviation pass to have run.
pub fn project(store: &NodeStore, idx: NodeIdx) -> Result<NodeStats, UrTreeError> {
    let node = store.node(idx);
    let rollup = node
        .rollup
        .get()
        .ok_or(UrTreeError::NotAggregated(node.id))?;
    let dispersion = node
        .dispersion
        .get()
        .ok_or(UrTreeError::NotAggregated(node.id))?;

    let (r, u) = (&rollup.reply, &rollup.ur);
    let rr = Ratios::new(r, &dispersion.reply);
    let ur = Ratios::new(u, &dispersion.ur);

    Ok(NodeStats {
        tweet_id: node.id,
        children: node.children.len() as u64,
        ur_children: (node.children.len() + node.ur_children.len()) as u64,
        descendants: r.descendants,
        ur_descendants: u.descendants,
        leaf_descendants: r.leaf_descendants,
        ur_leaf_descendants: u.leaf_descendants,
        max_depth: r.max_depth,
        ur_max_depth: u.max_depth,
        t_authors: r.authors.len() as u64,
        ur_t_authors: u.authors.len() as u64,
        t_reply_count: r.totals.reply_count,
        ur_t_reply_count: u.totals.reply_count,
        t_quote_count: r.totals.quote_count,
        ur_t_quote_count: u.totals.quote_count,
        t_like_count: r.totals.like_count,
        ur_t_like_count: u.totals.like_count,
        t_retweet_count: r.totals.retweet_count,
        ur_t_retweet_count: u.totals.retweet_count,
        branching_factor: rr.branching_factor,
        ur_branching_factor: ur.branching_factor,
        mean_depth: rr.mean_depth,
        ur_mean_depth: ur.mean_depth,
        depth_mad: rr.depth_mad,
        ur_depth_mad: ur.depth_mad,
        mean_reply_count: rr.means[0],
        ur_mean_reply_count: ur.means[0],
        reply_count_mad: rr.mads[0],
        ur_reply_count_mad: ur.mads[0],
        mean_quote_count: rr.means[1],
        ur_mean_quote_count: ur.means[1],
        quote_count_mad: rr.mads[1],
        ur_quote_count_mad: ur.mads[1],
        mean_like_count: rr.means[2],
        ur_mean_like_count: ur.means[2],
        like_count_mad: rr.mads[2],
        ur_like_count_mad: ur.mads[2],
        mean_retweet_count: rr.means[3],
        ur_mean_retweet_count: ur.means[3],
        retweet_count_mad: rr.mads[3],
        ur_retweet_count_mad: ur.mads[3],
        authors_mad: rr.authors_mad,
        ur_authors_mad: ur.authors_mad,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::deviation::compute_deviation;
    use crate::{Engagement, TweetId};

    #[test]
    fn project_before_aggregation_is_an_error() {
        let mut store = NodeStore::new();
        let idx = store.observe(&RawRecord::root(3, 1));
        assert!(matches!(
            project(&store, idx),
            Err(UrTreeError::NotAggregated(TweetId(3)))
        ));

        aggregate(&mut store, idx);
        assert!(project(&store, idx).is_err());
    }

    #[test]
    fn singleton_matches_general_path() {
        let record = RawRecord::root(8, 2).with_engagement(Engagement::new(4, 3, 2, 1));

        let mut store = NodeStore::new();
        let idx = store.observe(&record);
        aggregate(&mut store, idx);
        compute_deviation(&mut store, idx).expect("deviation");

        assert_eq!(project(&store, idx).expect("project"), NodeStats::singleton(&record));
    }

    #[test]
    fn dispersion_is_normalized_by_population() {
        // 1 has reply children 2 and 3; 3 has reply child 4
        let mut store = NodeStore::new();
        for (id, parent) in [(1, None), (2, Some(1)), (3, Some(1)), (4, Some(3))] {
            let mut record = RawRecord::root(id, id);
            if let Some(parent) = parent {
                record = record.replying_to(parent);
            }
            let idx = store.observe(&record);
            if let Some(link) = record.parent_link() {
                let parent = store.get_or_create(link.parent());
                store.attach(parent, idx, true);
            }
        }
        for idx in store.indices() {
            aggregate(&mut store, idx);
            compute_deviation(&mut store, idx).expect("deviation");
        }
        let root = store.lookup(TweetId(1)).expect("root");
        let stats = project(&store, root).expect("project");

        // raw depth and author dispersion are both 0.5, population is 4
        assert!((stats.depth_mad - 0.125).abs() < 1e-12);
        assert!((stats.authors_mad - 0.125).abs() < 1e-12);
        assert_eq!(stats.depth_mad, stats.ur_depth_mad);
    }

    #[test]
    fn column_list_has_no_duplicates() {
        let unique: std::collections::BTreeSet<_> = NodeStats::COLUMNS.iter().collect();
        assert_eq!(unique.len(), OUTPUT_COLUMNS);
        assert_eq!(NodeStats::COLUMNS[0], "tweet_id");
    }
}
