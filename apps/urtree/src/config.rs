//! # Configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then CLI flags.
//!
//! ```toml
//! [processing]
//! workers = 8
//! batch_size = 500
//! order = "leaf_first"   # or "input"
//!
//! [output]
//! format = "jsonl"       # or "redb"
//! ```
//!
//! Unknown keys are rejected.

use crate::producer::Order;
use serde::{Deserialize, Serialize};
use std::path::Path;
use urtree_core::UrTreeError;
use urtree_core::primitives::DEFAULT_BATCH_SIZE;

/// Maximum accepted size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Where per-node results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
    /// A redb database keyed by tweet id.
    Redb,
}

/// `[processing]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProcessingConfig {
    /// Groups processed concurrently.
    pub workers: usize,
    /// Output records handed to the sink per write.
    pub batch_size: usize,
    /// Record order inside each group.
    pub order: Order,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            batch_size: DEFAULT_BATCH_SIZE,
            order: Order::default(),
        }
    }
}

/// `[output]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

/// Values given on the command line; each one set replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub batch_size: Option<usize>,
    pub order: Option<Order>,
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, UrTreeError> {
        let config: Self =
            toml::from_str(text).map_err(|e| UrTreeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self, UrTreeError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            UrTreeError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(UrTreeError::ConfigError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            UrTreeError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults, or the file at `path` when one is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, UrTreeError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self, UrTreeError> {
        if let Some(workers) = overrides.workers {
            self.processing.workers = workers;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.processing.batch_size = batch_size;
        }
        if let Some(order) = overrides.order {
            self.processing.order = order;
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the runner cannot work with.
    pub fn validate(&self) -> Result<(), UrTreeError> {
        if self.processing.workers == 0 {
            return Err(UrTreeError::ConfigError(
                "processing.workers must be at least 1".to_string(),
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(UrTreeError::ConfigError(
                "processing.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
