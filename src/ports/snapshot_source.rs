use thiserror::Error;

use crate::domain::{MarketSnapshot, RawSnapshot};

/// Snapshot loading error type
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Snapshot has no usable chain: {0}")]
    EmptyChain(String),
}

/// Anything that can hand the pipeline a raw, provider-shaped snapshot
pub trait SnapshotSource {
    /// Fetch the raw snapshot for a request key (a ticker or file name)
    fn fetch_raw(&self, key: &str) -> Result<RawSnapshot, SourceError>;

    /// Fetch and ingest. Rejects snapshots whose selected chain has no
    /// positive spot, the one input nothing downstream can degrade around.
    fn load(&self, key: &str) -> Result<MarketSnapshot, SourceError> {
        let snapshot = MarketSnapshot::from(self.fetch_raw(key)?);
        if snapshot.spot() <= 0.0 {
            return Err(SourceError::EmptyChain(snapshot.ticker));
        }
        Ok(snapshot)
    }
}
