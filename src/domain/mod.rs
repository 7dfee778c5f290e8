//! Domain Layer - Market data value objects
//!
//! Pure types with no I/O:
//! - `quote`: option contracts and per-expiration chains
//! - `bars`: OHLCV bars
//! - `ingest`: raw provider records -> typed model, with all unknown-input defaults
//! - `snapshot`: the complete input bundle for one analysis request

pub mod bars;
pub mod ingest;
pub mod quote;
pub mod snapshot;

pub use bars::{closes, Bar};
pub use ingest::{IngestStats, RawBar, RawChain, RawOptionRecord, DEFAULT_IMPLIED_VOL};
pub use quote::{OptionQuote, OptionSide, OptionsChain};
pub use snapshot::{MarketSnapshot, RawSnapshot, DEFAULT_BENCHMARK};
