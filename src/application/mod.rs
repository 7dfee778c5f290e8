//! Application Layer
//!
//! The analysis pipeline over one snapshot.

pub mod pipeline;

pub use pipeline::{aggregate, analyze, distance_map, expiry_set, AnalysisReport, LevelDistance};
