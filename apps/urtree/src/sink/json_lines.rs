//! JSON Lines sink: one object per record, keys in column order.

use super::Sink;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use urtree_core::{NodeStats, UrTreeError};

/// Writes each record as one line of JSON.
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    written: usize,
}

impl JsonLinesSink<File> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> Result<Self, UrTreeError> {
        let file = File::create(path).map_err(|e| {
            UrTreeError::IoError(format!("Cannot create '{}': {}", path.display(), e))
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, UrTreeError> {
        self.writer
            .into_inner()
            .map_err(|e| UrTreeError::IoError(e.error().to_string()))
    }
}

impl<W: Write> Sink for JsonLinesSink<W> {
    fn write_batch(&mut self, batch: &[NodeStats]) -> Result<(), UrTreeError> {
        for stats in batch {
            serde_json::to_writer(&mut self.writer, stats)
                .map_err(|e| UrTreeError::SerializationError(e.to_string()))?;
            self.writer
                .write_all(b"\n")
                .map_err(|e| UrTreeError::IoError(e.to_string()))?;
        }
        self.written += batch.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<(), UrTreeError> {
        self.writer
            .flush()
            .map_err(|e| UrTreeError::IoError(e.to_string()))
    }
}
