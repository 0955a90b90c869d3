//! # Graph Builder
//!
//! Turns one group's flat records into a wired `NodeStore`.
//!
//! - Every record's subject is observed (author and own counters copied)
//! - Every referenced parent is materialized, even without a record of its own
//! - A reply link becomes a `children` edge, a retweet or quote link an
//!   `ur_children` edge
//!
//! No aggregation happens here.
//!
//! ## Keeping the group a forest
//!
//! A post claimed by several parents keeps exactly one link, the smallest by
//! `ParentLink` ordering. Parent cycles are broken by detaching the member
//! with the smallest id. Both choices depend only on the set of records,
//! never on their order, so the aggregates cannot depend on it either.

use crate::anomaly::Anomaly;
use crate::store::NodeStore;
use crate::{NodeIdx, ParentLink, RawRecord};
use std::collections::{BTreeMap, BTreeSet};

/// A wired group, ready for aggregation.
#[derive(Debug, Clone)]
pub struct BuiltGroup {
    /// The group's nodes and edges.
    pub store: NodeStore,
    /// Nodes that were the subject of a record, in first-seen order.
    pub subjects: Vec<NodeIdx>,
    /// Input problems found while wiring.
    pub anomalies: Vec<Anomaly>,
}

/// Stateless builder for one group at a time.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Wire `records` into a fresh store.
    pub fn build(records: &[RawRecord]) -> BuiltGroup {
        let mut store = NodeStore::with_capacity(records.len());
        let mut subjects = Vec::with_capacity(records.len());
        let mut seen = BTreeSet::new();
        let mut claims: BTreeMap<NodeIdx, BTreeSet<ParentLink>> = BTreeMap::new();

        for record in records {
            let idx = store.observe(record);
            if seen.insert(idx) {
                subjects.push(idx);
            }
            if let Some(link) = record.parent_link() {
                store.get_or_create(link.parent());
                claims.entry(idx).or_default().insert(link);
            }
        }

        let mut anomalies = Vec::new();
        let mut parents: BTreeMap<NodeIdx, NodeIdx> = BTreeMap::new();

        for (child, links) in claims {
            let mut links = links.into_iter();
            let Some(kept) = links.next() else {
                continue;
            };
            let child_id = store.node(child).id;
            for dropped in links {
                anomalies.push(Anomaly::conflicting_parent(child_id, kept, dropped));
            }
            let Some(parent) = store.lookup(kept.parent()) else {
                continue;
            };
            store.attach(parent, child, kept.is_reply());
            parents.insert(child, parent);
        }

        break_cycles(&mut store, &mut parents, &mut anomalies);

        for anomaly in &anomalies {
            anomaly.report();
        }

        BuiltGroup {
            store,
            subjects,
            anomalies,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Fresh,
    OnPath,
    Done,
}

/// Detach one member of every parent cycle.
///
/// With at most one parent per node, each node's ancestor chain either ends
/// at a root or runs into exactly one cycle.
fn break_cycles(
    store: &mut NodeStore,
    parents: &mut BTreeMap<NodeIdx, NodeIdx>,
    anomalies: &mut Vec<Anomaly>,
) {
    let mut state = vec![Visit::Fresh; store.len()];

    for start in store.indices() {
        let mut path = Vec::new();
        let mut cursor = Some(start);

        while let Some(idx) = cursor {
            match state[idx.0] {
                Visit::Done => break,
                Visit::OnPath => {
                    // `idx` is on the current path: everything from it onward is a cycle.
                    let cycle_start = path.iter().position(|&p| p == idx).unwrap_or(0);
                    let victim = path[cycle_start..]
                        .iter()
                        .copied()
                        .min_by_key(|&p| store.node(p).id);
                    let detached = victim.and_then(|v| parents.remove(&v).map(|p| (v, p)));
                    if let Some((victim, parent)) = detached {
                        store.detach(parent, victim);
                        anomalies.push(Anomaly::CycleBroken {
                            node: store.node(victim).id,
                            parent: store.node(parent).id,
                        });
                    }
                    break;
                }
                Visit::Fresh => {
                    state[idx.0] = Visit::OnPath;
                    path.push(idx);
                    cursor = parents.get(&idx).copied();
                }
            }
        }

        for idx in path {
            state[idx.0] = Visit::Done;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
