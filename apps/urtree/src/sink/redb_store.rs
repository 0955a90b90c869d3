//! # redb Sink
//!
//! Stores every record under its tweet id in one redb table.
//!
//! Value layout: 4 magic bytes, 1 version byte, postcard payload. Each batch
//! is one write transaction; re-delivering an id overwrites it with the
//! same bytes.

use super::Sink;
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use urtree_core::primitives::{FORMAT_VERSION, MAGIC_BYTES};
use urtree_core::{NodeStats, TweetId, UrTreeError};

/// Table for results: TweetId(u64) -> header + serialized NodeStats
const TWEET_STATS: TableDefinition<u64, &[u8]> = TableDefinition::new("tweet_stats");

const HEADER_LEN: usize = MAGIC_BYTES.len() + 1;

fn storage_error(e: impl std::fmt::Display) -> UrTreeError {
    UrTreeError::StorageError(e.to_string())
}

/// Encode one record as a table value.
pub fn stats_to_bytes(stats: &NodeStats) -> Result<Vec<u8>, UrTreeError> {
    let payload = postcard::to_stdvec(stats)
        .map_err(|e| UrTreeError::SerializationError(e.to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC_BYTES);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a table value, checking the header first.
pub fn stats_from_bytes(bytes: &[u8]) -> Result<NodeStats, UrTreeError> {
    let Some((header, payload)) = bytes.split_at_checked(HEADER_LEN) else {
        return Err(UrTreeError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    };
    if &header[..MAGIC_BYTES.len()] != MAGIC_BYTES {
        return Err(UrTreeError::SerializationError(
            "Invalid magic bytes".to_string(),
        ));
    }
    let version = header[MAGIC_BYTES.len()];
    if version != FORMAT_VERSION {
        return Err(UrTreeError::SerializationError(format!(
            "Unsupported format version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }
    postcard::from_bytes(payload).map_err(|e| {
        UrTreeError::SerializationError(format!("Failed to deserialize stats: {}", e))
    })
}

/// A redb database of output records.
pub struct RedbSink {
    db: Database,
}

impl std::fmt::Debug for RedbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSink").finish_non_exhaustive()
    }
}

impl RedbSink {
    /// Open or create a result database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, UrTreeError> {
        let db = Database::create(path.as_ref()).map_err(storage_error)?;

        let write_txn = db.begin_write().map_err(storage_error)?;
        let _ = write_txn.open_table(TWEET_STATS).map_err(storage_error)?;
        write_txn.commit().map_err(storage_error)?;

        Ok(Self { db })
    }

    /// Read back the record of one post.
    pub fn get(&self, id: TweetId) -> Result<Option<NodeStats>, UrTreeError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(TWEET_STATS).map_err(storage_error)?;
        match table.get(id.0).map_err(storage_error)? {
            Some(guard) => stats_from_bytes(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<u64, UrTreeError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(TWEET_STATS).map_err(storage_error)?;
        table.len().map_err(storage_error)
    }

    pub fn is_empty(&self) -> Result<bool, UrTreeError> {
        Ok(self.len()? == 0)
    }
}

impl Sink for RedbSink {
    fn write_batch(&mut self, batch: &[NodeStats]) -> Result<(), UrTreeError> {
        if batch.is_empty() {
            return Ok(());
        }
        // Encode before the transaction opens so a bad record aborts nothing.
        let encoded = batch
            .iter()
            .map(|stats| stats_to_bytes(stats).map(|bytes| (stats.tweet_id.0, bytes)))
            .collect::<Result<Vec<_>, _>>()?;

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut table = write_txn.open_table(TWEET_STATS).map_err(storage_error)?;
            for (id, bytes) in &encoded {
                table.insert(*id, bytes.as_slice()).map_err(storage_error)?;
            }
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
