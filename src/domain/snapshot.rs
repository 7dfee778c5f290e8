use serde::Deserialize;
use serde_json::Value;

use super::bars::Bar;
use super::ingest::{ingest_bars, ingest_chain, report_stats, IngestStats, RawChain};
use super::quote::OptionsChain;

/// Benchmark used for relative strength when a snapshot names none
pub const DEFAULT_BENCHMARK: &str = "SPY";

/// Raw, provider-shaped inputs for one analysis request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    pub ticker: String,
    #[serde(default)]
    pub benchmark: Option<String>,
    /// Selected expiration
    pub chain: RawChain,
    /// Additional expirations for term structure, aggregate GEX and the expiry scan
    #[serde(default)]
    pub term_chains: Vec<RawChain>,
    /// Daily OHLCV of the underlying
    #[serde(default)]
    pub daily: Vec<Value>,
    #[serde(default)]
    pub benchmark_daily: Vec<Value>,
    /// Intraday OHLCV of the underlying (several sessions)
    #[serde(default)]
    pub intraday: Vec<Value>,
}

/// Typed inputs for one analysis request
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub benchmark: String,
    pub chain: OptionsChain,
    pub term_chains: Vec<OptionsChain>,
    pub daily: Vec<Bar>,
    pub benchmark_daily: Vec<Bar>,
    pub intraday: Vec<Bar>,
    pub stats: IngestStats,
}

impl MarketSnapshot {
    pub fn spot(&self) -> f64 {
        self.chain.spot
    }

    pub fn dte(&self) -> u32 {
        self.chain.dte
    }

    /// Daily closes above zero
    pub fn daily_closes(&self) -> Vec<f64> {
        self.daily.iter().map(|b| b.close).filter(|c| *c > 0.0).collect()
    }
}

impl From<RawSnapshot> for MarketSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        let mut stats = IngestStats::default();
        let chain = ingest_chain(raw.chain, &mut stats);
        let mut term_chains: Vec<OptionsChain> = raw
            .term_chains
            .into_iter()
            .map(|c| ingest_chain(c, &mut stats))
            .collect();
        term_chains.sort_by_key(|c| c.dte);

        let snapshot = Self {
            ticker: raw.ticker.to_uppercase(),
            benchmark: raw
                .benchmark
                .map(|b| b.to_uppercase())
                .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string()),
            chain,
            term_chains,
            daily: ingest_bars(raw.daily, &mut stats),
            benchmark_daily: ingest_bars(raw.benchmark_daily, &mut stats),
            intraday: ingest_bars(raw.intraday, &mut stats),
            stats,
        };
        report_stats(&snapshot.stats);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_json() {
        let raw: RawSnapshot = serde_json::from_value(json!({
            "ticker": "aapl",
            "chain": {
                "current_price": 190.0,
                "dte": 5,
                "expiration": "2024-06-21",
                "calls": [{ "strike": 190.0, "openInterest": 100 }],
                "puts": [{ "strike": 185.0, "openInterest": 80 }]
            },
            "term_chains": [
                { "spot": 190.0, "dte": 30, "calls": [], "puts": [] },
                { "spot": 190.0, "dte": 12, "calls": [], "puts": [] }
            ],
            "daily": [{ "date": "2024-06-10", "close": 188.0 }]
        }))
        .unwrap();
        let snap = MarketSnapshot::from(raw);
        assert_eq!(snap.ticker, "AAPL");
        assert_eq!(snap.benchmark, DEFAULT_BENCHMARK);
        assert_eq!(snap.spot(), 190.0);
        assert_eq!(snap.dte(), 5);
        assert_eq!(snap.term_chains[0].dte, 12);
        assert_eq!(snap.daily_closes(), vec![188.0]);
        assert!(snap.intraday.is_empty());
    }
}
