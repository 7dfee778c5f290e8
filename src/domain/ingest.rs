//! Raw record ingestion
//!
//! Converts loosely-typed provider records into the typed domain model.
//! Every unknown-input default lives here:
//! - implied volatility: 0.30 when a component needs a usable value
//! - open interest / volume: 0
//! - bid / ask / last: 0.0
//!
//! Malformed records (missing or non-positive strike, unparseable
//! timestamps, non-finite prices) are skipped and counted, never fatal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::bars::Bar;
use super::quote::{OptionQuote, OptionSide, OptionsChain};

/// Implied volatility assumed when a quote carries none
pub const DEFAULT_IMPLIED_VOL: f64 = 0.30;

/// Provider option record. Field names accept both snake_case and the
/// camelCase spellings common in chain dumps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptionRecord {
    pub strike: Option<f64>,
    #[serde(default, alias = "openInterest")]
    pub open_interest: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default, alias = "impliedVolatility", alias = "iv")]
    pub implied_vol: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default, alias = "lastPrice")]
    pub last: Option<f64>,
}

/// Provider chain for one expiration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChain {
    #[serde(alias = "current_price", alias = "spot_price")]
    pub spot: f64,
    #[serde(default)]
    pub dte: i64,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub calls: Vec<Value>,
    #[serde(default)]
    pub puts: Vec<Value>,
}

/// Provider OHLCV record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBar {
    #[serde(alias = "date", alias = "datetime", alias = "time")]
    pub timestamp: String,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Counts of records dropped during ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub skipped_options: usize,
    pub skipped_bars: usize,
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

fn count_or_zero(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

impl RawOptionRecord {
    /// Build a typed quote; `None` when the strike is unusable
    pub fn into_quote(self, side: OptionSide) -> Option<OptionQuote> {
        let strike = self.strike.filter(|s| s.is_finite() && *s > 0.0)?;
        Some(OptionQuote {
            strike,
            side,
            open_interest: count_or_zero(self.open_interest),
            volume: count_or_zero(self.volume),
            implied_vol: finite_or(self.implied_vol, 0.0).max(0.0),
            bid: finite_or(self.bid, 0.0),
            ask: finite_or(self.ask, 0.0),
            last: finite_or(self.last, 0.0),
        })
    }
}

fn ingest_leg(records: Vec<Value>, side: OptionSide, stats: &mut IngestStats) -> Vec<OptionQuote> {
    let mut quotes = Vec::with_capacity(records.len());
    for record in records {
        let quote = serde_json::from_value::<RawOptionRecord>(record)
            .ok()
            .and_then(|raw| raw.into_quote(side));
        match quote {
            Some(q) => quotes.push(q),
            None => stats.skipped_options += 1,
        }
    }
    quotes
}

/// Convert a provider chain. Negative DTE is clamped to 0.
pub fn ingest_chain(raw: RawChain, stats: &mut IngestStats) -> OptionsChain {
    let calls = ingest_leg(raw.calls, OptionSide::Call, stats);
    let puts = ingest_leg(raw.puts, OptionSide::Put, stats);
    debug!(
        "Ingested chain {:?}: {} calls, {} puts",
        raw.expiration,
        calls.len(),
        puts.len()
    );
    OptionsChain {
        spot: if raw.spot.is_finite() { raw.spot } else { 0.0 },
        dte: raw.dte.max(0) as u32,
        expiration: raw.expiration,
        calls,
        puts,
    }
}

/// Parse RFC 3339, `%Y-%m-%d %H:%M:%S` or a bare `%Y-%m-%d` date (UTC)
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl RawBar {
    /// Build a typed bar; missing open/high/low default to the close
    pub fn into_bar(self) -> Option<Bar> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        let close = self.close.filter(|c| c.is_finite() && *c > 0.0)?;
        let bar = Bar {
            timestamp,
            open: finite_or(self.open, close),
            high: finite_or(self.high, close),
            low: finite_or(self.low, close),
            close,
            volume: finite_or(self.volume, 0.0).max(0.0),
        };
        bar.is_valid().then_some(bar)
    }
}

/// Convert provider bars, dropping malformed records and sorting by time
pub fn ingest_bars(records: Vec<Value>, stats: &mut IngestStats) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(records.len());
    for record in records {
        let bar = serde_json::from_value::<RawBar>(record)
            .ok()
            .and_then(RawBar::into_bar);
        match bar {
            Some(b) => bars.push(b),
            None => stats.skipped_bars += 1,
        }
    }
    bars.sort_by_key(|b| b.timestamp);
    bars
}

/// Log the skip counters once per snapshot
pub fn report_stats(stats: &IngestStats) {
    if stats.skipped_options > 0 || stats.skipped_bars > 0 {
        warn!(
            "Skipped malformed records: {} options, {} bars",
            stats.skipped_options, stats.skipped_bars
        );
    }
}
