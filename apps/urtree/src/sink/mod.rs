//! # Sinks
//!
//! Destinations for per-node output records.
//!
//! A sink receives records in batches and may see the same tweet id more
//! than once across runs; writing it again must leave the same result.

mod json_lines;
mod redb_store;

pub use json_lines::JsonLinesSink;
pub use redb_store::{RedbSink, stats_from_bytes, stats_to_bytes};

use urtree_core::{NodeStats, UrTreeError};

/// A destination for output records.
pub trait Sink {
    /// Store one batch.
    fn write_batch(&mut self, batch: &[NodeStats]) -> Result<(), UrTreeError>;

    /// Flush anything buffered. Called once after the last batch.
    fn finish(&mut self) -> Result<(), UrTreeError> {
        Ok(())
    }
}
