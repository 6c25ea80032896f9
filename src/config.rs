//! Store configuration.
//!
//! The host either builds a [`HistoryConfig`] in code or passes it as JSON
//! through the FFI layer:
//!
//! ```json
//! { "path": "/data/user/0/app/files/benchmark_history", "durability": "deferred" }
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{HistoryError, Result};

const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;
const DEFAULT_MAX_READERS: u32 = 126;

/// When LMDB commits reach the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Every commit is synced before it returns.
    #[default]
    Synchronous,
    /// Commits are buffered by the OS until `flush` forces a sync.
    Deferred,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding the LMDB environment. Created if missing.
    pub path: PathBuf,
    /// Maximum size of the memory map in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
    #[serde(default)]
    pub durability: Durability,
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_max_readers() -> u32 {
    DEFAULT_MAX_READERS
}

impl HistoryConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            map_size: DEFAULT_MAP_SIZE,
            max_readers: DEFAULT_MAX_READERS,
            durability: Durability::default(),
        }
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_max_readers(mut self, max_readers: u32) -> Self {
        self.max_readers = max_readers;
        self
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: HistoryConfig = serde_json::from_str(json)
            .map_err(|e| HistoryError::Config(format!("invalid JSON configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(HistoryError::Config("path must not be empty".to_string()));
        }
        if self.map_size == 0 {
            return Err(HistoryError::Config("map_size must be greater than zero".to_string()));
        }
        if self.max_readers == 0 {
            return Err(HistoryError::Config("max_readers must be greater than zero".to_string()));
        }
        Ok(())
    }
}
