//! dealer-edge - Options Dealer Hedging Analytics Library
//!
//! Turns an options chain snapshot plus price history into a read of
//! market-maker hedging pressure and buy-only option trade guidance.
//!
//! # Modules
//!
//! - `domain`: Quotes, chains, bars, raw record ingestion and snapshots
//! - `strategy`: Exposure, levels, regimes, volatility, technicals and the decision engines
//! - `ports`: Trait abstractions (SnapshotSource)
//! - `adapters`: External implementations (JSON snapshot files, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: The analysis pipeline

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
