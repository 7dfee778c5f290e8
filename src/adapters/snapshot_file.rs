//! JSON Snapshot File Adapter
//!
//! Reads one provider-shaped snapshot per file. Keys are file paths;
//! relative keys resolve against the configured base directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::expand_path;
use crate::domain::RawSnapshot;
use crate::ports::{SnapshotSource, SourceError};

/// Snapshot source backed by JSON files on disk
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    base_dir: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative keys against `dir`
    pub fn with_base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let path = expand_path(key);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

impl SnapshotSource for JsonFileSource {
    fn fetch_raw(&self, key: &str) -> Result<RawSnapshot, SourceError> {
        let path = self.resolve(key);
        if !path.exists() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let raw: RawSnapshot = serde_json::from_str(&content)?;
        debug!(
            "Read snapshot {} from {} ({} calls, {} puts, {} term chains)",
            raw.ticker,
            path.display(),
            raw.chain.calls.len(),
            raw.chain.puts.len(),
            raw.term_chains.len()
        );
        Ok(raw)
    }
}
