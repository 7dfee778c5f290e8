use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::RawSnapshot;

use super::snapshot_source::{SnapshotSource, SourceError};

/// In-memory snapshot source that records requested keys
#[derive(Debug, Default)]
pub struct MockSnapshotSource {
    calls: Arc<Mutex<Vec<String>>>,
    snapshots: HashMap<String, RawSnapshot>,
}

impl MockSnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register a snapshot under a key
    pub fn with_snapshot(mut self, key: &str, snapshot: RawSnapshot) -> Self {
        self.snapshots.insert(key.to_string(), snapshot);
        self
    }

    /// Get all recorded keys
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl SnapshotSource for MockSnapshotSource {
    fn fetch_raw(&self, key: &str) -> Result<RawSnapshot, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.to_string());
        }
        self.snapshots
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawChain;

    fn raw(spot: f64) -> RawSnapshot {
        RawSnapshot {
            ticker: "spy".to_string(),
            chain: RawChain { spot, dte: 3, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_mock_records_calls() {
        let source = MockSnapshotSource::new().with_snapshot("SPY", raw(500.0));
        let snapshot = source.load("SPY").unwrap();
        assert_eq!(snapshot.ticker, "SPY");
        assert_eq!(source.get_calls(), vec!["SPY".to_string()]);
    }

    #[test]
    fn test_missing_key() {
        let source = MockSnapshotSource::new();
        assert!(matches!(source.load("QQQ"), Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_zero_spot_rejected() {
        let source = MockSnapshotSource::new().with_snapshot("SPY", raw(0.0));
        assert!(matches!(source.load("SPY"), Err(SourceError::EmptyChain(_))));
    }
}
