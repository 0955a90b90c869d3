//! # Group Pipeline
//!
//! Runs one group end to end: build, aggregate every node, compute every
//! node's dispersion, project every record subject.
//!
//! The node store is dropped when `process_group` returns; nothing survives
//! from one group to the next.

use crate::aggregate::aggregate;
use crate::anomaly::{Anomaly, check_rollup};
use crate::builder::GraphBuilder;
use crate::deviation::compute_deviation;
use crate::projector::{NodeStats, project};
use crate::{RawRecord, UrTreeError};
use serde::Serialize;

/// Everything one group produces.
#[derive(Debug, Clone, Default)]
pub struct GroupReport {
    /// One record per distinct input identifier, in first-seen order.
    pub stats: Vec<NodeStats>,
    /// Input and invariant problems; processing continued past each of them.
    pub anomalies: Vec<Anomaly>,
    /// Nodes in the group, placeholders for unobserved parents included.
    pub node_count: usize,
    /// Edges of both kinds after parent arbitration and cycle breaking.
    pub edge_count: usize,
}

/// Lightweight summary of a report, for logging and run totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GroupSummary {
    pub records: usize,
    pub nodes: usize,
    pub edges: usize,
    pub anomalies: usize,
}

impl GroupReport {
    /// Summarize counts.
    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            records: self.stats.len(),
            nodes: self.node_count,
            edges: self.edge_count,
            anomalies: self.anomalies.len(),
        }
    }
}

/// The lone record of a group that consists of one post without edges.
#[must_use]
pub fn singleton_record(records: &[RawRecord]) -> Option<&RawRecord> {
    match records {
        [only] if only.parent_link().is_none() => Some(only),
        _ => None,
    }
}

/// Compute the stats of every post in one group.
pub fn process_group(records: &[RawRecord]) -> Result<GroupReport, UrTreeError> {
    if let Some(only) = singleton_record(records) {
        return Ok(GroupReport {
            stats: vec![NodeStats::singleton(only)],
            anomalies: Vec::new(),
            node_count: 1,
            edge_count: 0,
        });
    }

    let built = GraphBuilder::build(records);
    let mut store = built.store;
    let mut anomalies = built.anomalies;
    let group_size = store.len();

    for idx in store.indices() {
        aggregate(&mut store, idx);
    }

    for &idx in &built.subjects {
        let node = store.node(idx);
        if let Some(rollup) = node.rollup.get() {
            for anomaly in check_rollup(node.id, rollup, group_size) {
                anomaly.report();
                anomalies.push(anomaly);
            }
        }
    }

    for idx in store.indices() {
        compute_deviation(&mut store, idx)?;
    }

    let stats = built
        .subjects
        .iter()
        .map(|&idx| project(&store, idx))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::trace!(
        records = records.len(),
        nodes = group_size,
        projected = stats.len(),
        "group processed"
    );

    Ok(GroupReport {
        stats,
        anomalies,
        node_count: group_size,
        edge_count: store.edge_count(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engagement, TweetId};

    #[test]
    fn empty_group_yields_nothing() {
        let report = process_group(&[]).expect("process");
        assert!(report.stats.is_empty());
        assert_eq!(report.node_count, 0);
    }

    #[test]
    fn singleton_fast_path() {
        let record = RawRecord::root(1, 9).with_engagement(Engagement::new(2, 0, 7, 1));
        assert!(singleton_record(std::slice::from_ref(&record)).is_some());

        let report = process_group(std::slice::from_ref(&record)).expect("process");
        assert_eq!(report.stats, vec![NodeStats::singleton(&record)]);
        assert_eq!(report.summary().nodes, 1);
    }

    #[test]
    fn lone_reply_to_missing_parent_takes_general_path() {
        let record = RawRecord::root(2, 9).replying_to(1);
        assert!(singleton_record(std::slice::from_ref(&record)).is_none());

        let report = process_group(&[record]).expect("process");
        assert_eq!(report.stats.len(), 1);
        assert_eq!(report.stats[0].tweet_id, TweetId(2));
        assert_eq!(report.node_count, 2);
        assert_eq!(report.edge_count, 1);
    }

    #[test]
    fn duplicate_subjects_project_once() {
        let report = process_group(&[
            RawRecord::root(1, 1),
            RawRecord::root(2, 2).replying_to(1),
            RawRecord::root(2, 2).replying_to(1),
        ])
        .expect("process");
        let ids: Vec<_> = report.stats.iter().map(|s| s.tweet_id).collect();
        assert_eq!(ids, vec![TweetId(1), TweetId(2)]);
    }
}
