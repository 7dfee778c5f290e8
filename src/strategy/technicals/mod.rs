//! Technical Structure Module
//!
//! Trend context from daily bars that the dealer model cannot see on its own:
//! whether price is structurally trending (MAs), how large typical moves are
//! (ATR), and whether the name leads or lags its benchmark (RS).

pub mod atr;
pub mod moving_average;
pub mod relative_strength;
pub mod trend;
pub mod vwap;

pub use atr::{compute_atr, true_ranges, AtrReading, AtrTrend};
pub use moving_average::{
    compute_moving_averages, sma_reading, CrossSignal, MaAlignment, MovingAverages, PricePosition, SlopeDirection,
    SmaReading,
};
pub use relative_strength::{compute_relative_strength, RelativeStrength, RsLabel, RsTrend, BETA_FLOOR};
pub use trend::{classify_trend, TechBias, TrendLabel, TrendReading, VolLabel};
pub use vwap::{compute_vwap, vwap_band, VwapBand, VwapContext, VwapReading};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{closes, Bar};

/// Technicals configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalsParams {
    /// Daily bars required before anything is computed
    pub min_bars: usize,
    pub atr_period: usize,
    /// Bars back for the SMA slope comparison
    pub slope_window: usize,
    /// Max SMA50/SMA200 gap (percent) for a recent cross
    pub cross_band_pct: f64,
}

impl Default for TechnicalsParams {
    fn default() -> Self {
        Self {
            min_bars: 20,
            atr_period: 14,
            slope_window: 5,
            cross_band_pct: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Technicals {
    pub moving_averages: MovingAverages,
    pub atr: AtrReading,
    pub relative_strength: RelativeStrength,
    pub vwap: VwapReading,
    pub trend: TrendReading,
}

impl Technicals {
    pub fn empty(benchmark: &str, params: &TechnicalsParams) -> Self {
        Self {
            moving_averages: MovingAverages::default(),
            atr: AtrReading::empty(params.atr_period),
            relative_strength: RelativeStrength::empty(benchmark),
            vwap: VwapReading::default(),
            trend: TrendReading::default(),
        }
    }

    /// 20-bar VWAP value, if computed
    pub fn vwap_20d(&self) -> Option<f64> {
        self.vwap.vwap_20d.as_ref().map(|b| b.value)
    }
}

pub fn compute_technicals(
    ticker: &str,
    daily: &[Bar],
    benchmark: &str,
    benchmark_daily: &[Bar],
    params: &TechnicalsParams,
) -> Technicals {
    if daily.len() < params.min_bars.max(1) {
        debug!("Technicals skipped: {} daily bars (need {})", daily.len(), params.min_bars);
        return Technicals::empty(benchmark, params);
    }
    let ticker_closes = closes(daily);
    let bench_closes = closes(benchmark_daily);

    let moving_averages = compute_moving_averages(&ticker_closes, params.slope_window, params.cross_band_pct);
    let atr = compute_atr(daily, params.atr_period);
    let relative_strength = compute_relative_strength(ticker, &ticker_closes, benchmark, &bench_closes);
    let vwap = compute_vwap(daily);
    let trend = classify_trend(&moving_averages, &atr, &relative_strength);

    debug!(
        "Technicals: {:?} alignment {}, ATR {:.2}%, RS {:?}, beta60 {:.2}, {:?}",
        trend.trend_label, moving_averages.alignment, atr.atr_pct, relative_strength.rs_label, relative_strength.beta_60d, trend.tech_bias
    );

    Technicals {
        moving_averages,
        atr,
        relative_strength,
        vwap,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn trending_bars(n: usize, step: f64) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + step * i as f64;
                Bar::new(start + Duration::days(i as i64), close, close + 1.0, close - 1.0, close, 1_000_000.0)
            })
            .collect()
    }

    #[test]
    fn test_insufficient_bars_is_empty() {
        let tech = compute_technicals("AAPL", &trending_bars(10, 1.0), "SPY", &[], &TechnicalsParams::default());
        assert_eq!(tech.trend.trend_label, TrendLabel::Unknown);
        assert_eq!(tech.moving_averages.alignment_label, MaAlignment::Unknown);
        assert_eq!(tech.relative_strength.beta_adj_factor, 1.0);
    }

    #[test]
    fn test_uptrend_against_flat_benchmark() {
        let daily = trending_bars(80, 0.5);
        let bench = trending_bars(80, 0.0);
        let tech = compute_technicals("AAPL", &daily, "SPY", &bench, &TechnicalsParams::default());
        assert_eq!(tech.moving_averages.alignment, 2);
        assert_eq!(tech.relative_strength.rs_label, RsLabel::StrongLeader);
        assert_eq!(tech.trend.trend_label, TrendLabel::StrongUptrend);
        assert_eq!(tech.trend.tech_bias, TechBias::Bullish);
        assert!(tech.vwap_20d().is_some());
        assert!(tech.atr.atr > 0.0);
    }
}
