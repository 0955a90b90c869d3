//! # Producer
//!
//! Reads input records from JSON Lines and groups them by ur-conversation.
//!
//! Each line is one post plus the id of the group it belongs to:
//!
//! ```json
//! {"group_id": 7, "tweet_id": 12, "author_id": 3, "reply_parent_id": 10, "like_count": 4}
//! ```
//!
//! Missing counters default to zero. Lines that do not parse, or that set
//! more than one parent field, are skipped with a warning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use urtree_core::primitives::MAX_GROUP_RECORDS;
use urtree_core::{RawRecord, UrTreeError};

/// Maximum input file size (4 GB).
pub const MAX_INPUT_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// One input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedRecord {
    pub group_id: u64,
    #[serde(flatten)]
    pub record: RawRecord,
}

/// Record order inside each group handed to the core.
///
/// Results never depend on it; cost does. Newer posts reply to older ones,
/// so descending ids put children before their parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Descending tweet id.
    #[default]
    LeafFirst,
    /// As read.
    Input,
}

/// Records accepted from an input, plus how many lines were dropped.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub records: Vec<GroupedRecord>,
    pub skipped: usize,
}

/// Parse one non-blank line.
pub fn parse_line(line: &str) -> Result<GroupedRecord, UrTreeError> {
    let grouped: GroupedRecord =
        serde_json::from_str(line).map_err(|e| UrTreeError::InvalidRecord(e.to_string()))?;
    if grouped.record.parent_field_count() > 1 {
        return Err(UrTreeError::InvalidRecord(format!(
            "tweet {} sets more than one parent id",
            grouped.record.tweet_id
        )));
    }
    Ok(grouped)
}

/// Parse JSON Lines from any reader.
///
/// I/O errors abort; malformed lines are skipped and counted.
pub fn parse_records(reader: impl BufRead) -> Result<ReadOutcome, UrTreeError> {
    let mut outcome = ReadOutcome::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| UrTreeError::IoError(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping input line");
                outcome.skipped += 1;
            }
        }
    }
    Ok(outcome)
}

/// Read a JSON Lines file.
pub fn read_records(path: &Path) -> Result<ReadOutcome, UrTreeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| UrTreeError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(UrTreeError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(UrTreeError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| UrTreeError::IoError(format!("Cannot open '{}': {}", path.display(), e)))?;
    let outcome = parse_records(std::io::BufReader::new(file))?;
    tracing::info!(
        path = %path.display(),
        records = outcome.records.len(),
        skipped = outcome.skipped,
        "input read"
    );
    Ok(outcome)
}

/// Split records into groups keyed by `group_id`, ordered per `order`.
///
/// Grouping is stable: with `Order::Input` each group keeps input order.
pub fn group_records(
    records: Vec<GroupedRecord>,
    order: Order,
) -> Result<BTreeMap<u64, Vec<RawRecord>>, UrTreeError> {
    let mut groups: BTreeMap<u64, Vec<RawRecord>> = BTreeMap::new();
    for GroupedRecord { group_id, record } in records {
        groups.entry(group_id).or_default().push(record);
    }

    for (group_id, records) in &mut groups {
        if records.len() > MAX_GROUP_RECORDS {
            return Err(UrTreeError::InvalidRecord(format!(
                "group {} has {} records, maximum is {}",
                group_id,
                records.len(),
                MAX_GROUP_RECORDS
            )));
        }
        if order == Order::LeafFirst {
            records.sort_by(|a, b| b.tweet_id.cmp(&a.tweet_id));
        }
    }
    Ok(groups)
}

// =============================================================================
// TESTS
// =============================================================================
