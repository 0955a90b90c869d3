//! # Runner
//!
//! Schedules groups onto blocking worker tasks and feeds results to a sink.
//!
//! - At most `workers` groups are in flight, bounded by a `Semaphore`
//! - Groups share nothing; each task owns its records and its node store
//! - Results are handed to the sink in group-id order, `batch_size` records
//!   per write, so output does not depend on which worker finished first

use crate::sink::Sink;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use urtree_core::{GroupReport, NodeStats, RawRecord, UrTreeError, process_group, singleton_record};

/// Scheduling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub workers: usize,
    pub batch_size: usize,
}

/// Totals over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub groups: usize,
    pub records: usize,
    pub singletons: usize,
    pub nodes: usize,
    pub anomalies: usize,
}

struct GroupOutcome {
    group_id: u64,
    records: usize,
    singleton: bool,
    report: Result<GroupReport, UrTreeError>,
}

/// Buffers stats until a full batch is ready.
struct Batcher<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    buffer: Vec<NodeStats>,
    batch_size: usize,
}

impl<S: Sink + ?Sized> Batcher<'_, S> {
    fn push(&mut self, stats: Vec<NodeStats>) -> Result<(), UrTreeError> {
        self.buffer.extend(stats);
        while self.buffer.len() >= self.batch_size {
            let rest = self.buffer.split_off(self.batch_size);
            self.sink.write_batch(&self.buffer)?;
            self.buffer = rest;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), UrTreeError> {
        if !self.buffer.is_empty() {
            self.sink.write_batch(&self.buffer)?;
            self.buffer.clear();
        }
        self.sink.finish()
    }
}

/// Process every group and write all results to `sink`.
///
/// A group whose processing fails aborts the run with that error.
pub async fn run<S: Sink + ?Sized>(
    groups: BTreeMap<u64, Vec<RawRecord>>,
    sink: &mut S,
    options: RunOptions,
) -> Result<RunSummary, UrTreeError> {
    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks = JoinSet::new();
    let mut summary = RunSummary::default();
    let mut batcher = Batcher {
        sink,
        buffer: Vec::with_capacity(options.batch_size),
        batch_size: options.batch_size.max(1),
    };

    // Finished groups wait here until every group before them is written.
    let mut pending: BTreeMap<usize, GroupOutcome> = BTreeMap::new();
    let mut next_to_write = 0;
    let total = groups.len();

    tracing::info!(groups = total, workers = options.workers, "run started");

    for (seq, (group_id, records)) in groups.into_iter().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| UrTreeError::IoError(e.to_string()))?;
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = GroupOutcome {
                group_id,
                records: records.len(),
                singleton: singleton_record(&records).is_some(),
                report: process_group(&records),
            };
            (seq, outcome)
        });

        while let Some(joined) = tasks.try_join_next() {
            let (seq, outcome) = joined.map_err(join_error)?;
            pending.insert(seq, outcome);
        }
        drain(&mut pending, &mut next_to_write, &mut batcher, &mut summary)?;
    }

    while let Some(joined) = tasks.join_next().await {
        let (seq, outcome) = joined.map_err(join_error)?;
        pending.insert(seq, outcome);
        drain(&mut pending, &mut next_to_write, &mut batcher, &mut summary)?;
    }

    batcher.finish()?;

    tracing::info!(
        groups = summary.groups,
        records = summary.records,
        singletons = summary.singletons,
        anomalies = summary.anomalies,
        "run finished"
    );
    Ok(summary)
}

fn join_error(e: tokio::task::JoinError) -> UrTreeError {
    UrTreeError::IoError(format!("worker task failed: {}", e))
}

/// Write every outcome that is next in group order.
fn drain<S: Sink + ?Sized>(
    pending: &mut BTreeMap<usize, GroupOutcome>,
    next_to_write: &mut usize,
    batcher: &mut Batcher<'_, S>,
    summary: &mut RunSummary,
) -> Result<(), UrTreeError> {
    while let Some(outcome) = pending.remove(&*next_to_write) {
        *next_to_write += 1;
        let report = outcome.report?;

        tracing::debug!(
            group_id = outcome.group_id,
            records = outcome.records,
            nodes = report.node_count,
            edges = report.edge_count,
            anomalies = report.anomalies.len(),
            "group done"
        );

        summary.groups += 1;
        summary.records += outcome.records;
        summary.nodes += report.node_count;
        summary.anomalies += report.anomalies.len();
        if outcome.singleton {
            summary.singletons += 1;
        }
        batcher.push(report.stats)?;
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
