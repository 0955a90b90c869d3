//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use urtree_core::{NodeStats, TweetId};

/// Integer columns, in record order.
pub fn ints(s: &NodeStats) -> [u64; 18] {
    [
        s.children,
        s.ur_children,
        s.descendants,
        s.ur_descendants,
        s.leaf_descendants,
        s.ur_leaf_descendants,
        s.max_depth,
        s.ur_max_depth,
        s.t_authors,
        s.ur_t_authors,
        s.t_reply_count,
        s.ur_t_reply_count,
        s.t_quote_count,
        s.ur_t_quote_count,
        s.t_like_count,
        s.ur_t_like_count,
        s.t_retweet_count,
        s.ur_t_retweet_count,
    ]
}

/// Float columns, in record order.
pub fn floats(s: &NodeStats) -> [f64; 24] {
    [
        s.branching_factor,
        s.ur_branching_factor,
        s.mean_depth,
        s.ur_mean_depth,
        s.depth_mad,
        s.ur_depth_mad,
        s.mean_reply_count,
        s.ur_mean_reply_count,
        s.reply_count_mad,
        s.ur_reply_count_mad,
        s.mean_quote_count,
        s.ur_mean_quote_count,
        s.quote_count_mad,
        s.ur_quote_count_mad,
        s.mean_like_count,
        s.ur_mean_like_count,
        s.like_count_mad,
        s.ur_like_count_mad,
        s.mean_retweet_count,
        s.ur_mean_retweet_count,
        s.retweet_count_mad,
        s.ur_retweet_count_mad,
        s.authors_mad,
        s.ur_authors_mad,
    ]
}

/// Float sums may be accumulated in a different order; compare with a tolerance.
pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

/// Whether two records agree: integers exactly, floats within tolerance.
pub fn stats_agree(a: &NodeStats, b: &NodeStats) -> bool {
    a.tweet_id == b.tweet_id
        && ints(a) == ints(b)
        && floats(a)
            .iter()
            .zip(floats(b).iter())
            .all(|(x, y)| close(*x, *y))
}

/// Index records by tweet id.
pub fn by_id(stats: &[NodeStats]) -> BTreeMap<TweetId, NodeStats> {
    stats.iter().map(|s| (s.tweet_id, s.clone())).collect()
}
