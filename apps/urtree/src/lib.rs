//! # urtree
//!
//! File-based batch front end for `urtree-core`.
//!
//! ```text
//! JSON Lines ──▶ producer ──▶ runner (one blocking task per group) ──▶ sink
//!                  │                        │
//!               group_id               process_group
//! ```
//!
//! - `config`: layered TOML + CLI configuration
//! - `producer`: reads and groups input records
//! - `runner`: schedules groups onto worker tasks and batches results
//! - `sink`: JSON Lines and redb result stores

pub mod config;
pub mod producer;
pub mod runner;
pub mod sink;

pub use config::{Config, OutputConfig, OutputFormat, Overrides, ProcessingConfig};
pub use producer::{GroupedRecord, Order, ReadOutcome, group_records, parse_records, read_records};
pub use runner::{RunOptions, RunSummary, run};
pub use sink::{JsonLinesSink, RedbSink, Sink};
