//! Ports Layer - Trait definitions for external dependencies
//!
//! The analytics core never performs I/O. Snapshots arrive through the
//! `SnapshotSource` port; adapters decide where they come from.

pub mod snapshot_source;
pub mod mocks;

pub use snapshot_source::{SnapshotSource, SourceError};
pub use mocks::MockSnapshotSource;
