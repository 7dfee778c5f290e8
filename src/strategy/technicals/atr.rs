//! Average true range and its trend

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::strategy::numeric::{mean, round_to};

/// Bars in the short-term range average
const RECENT_RANGE_BARS: usize = 5;
/// ATR change in percent that counts as expanding/contracting
const TREND_BAND_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtrTrend {
    Expanding,
    Contracting,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtrReading {
    pub atr: f64,
    pub atr_pct: f64,
    pub period: usize,
    pub recent_range: f64,
    pub recent_range_pct: f64,
    pub atr_trend: AtrTrend,
    pub atr_change_pct: f64,
}

impl AtrReading {
    pub fn empty(period: usize) -> Self {
        Self {
            atr: 0.0,
            atr_pct: 0.0,
            period,
            recent_range: 0.0,
            recent_range_pct: 0.0,
            atr_trend: AtrTrend::Unknown,
            atr_change_pct: 0.0,
        }
    }
}

/// True range for each bar after the first
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| {
            let (prev_close, bar) = (w[0].close, &w[1]);
            let hl = bar.high - bar.low;
            let hc = (bar.high - prev_close).abs();
            let lc = (bar.low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// ATR as the plain mean of the last `period` true ranges
pub fn compute_atr(bars: &[Bar], period: usize) -> AtrReading {
    if period == 0 || bars.len() < period + 1 {
        return AtrReading::empty(period);
    }
    let spot = bars[bars.len() - 1].close;
    if spot <= 0.0 {
        return AtrReading::empty(period);
    }
    let tr = true_ranges(bars);
    let atr = mean(&tr[tr.len() - period..]);

    let recent_start = bars.len().saturating_sub(RECENT_RANGE_BARS);
    let recent: Vec<f64> = bars[recent_start..].iter().map(|b| b.high - b.low).collect();
    let recent_range = if recent.is_empty() { atr } else { mean(&recent) };

    let (atr_trend, atr_change) = if tr.len() >= period * 2 {
        let prev = mean(&tr[tr.len() - 2 * period..tr.len() - period]);
        let change = if prev > 0.0 { (atr - prev) / prev * 100.0 } else { 0.0 };
        let trend = if change > TREND_BAND_PCT {
            AtrTrend::Expanding
        } else if change < -TREND_BAND_PCT {
            AtrTrend::Contracting
        } else {
            AtrTrend::Stable
        };
        (trend, change)
    } else {
        (AtrTrend::Stable, 0.0)
    };

    AtrReading {
        atr: round_to(atr, 2),
        atr_pct: round_to(atr / spot * 100.0, 2),
        period,
        recent_range: round_to(recent_range, 2),
        recent_range_pct: round_to(recent_range / spot * 100.0, 2),
        atr_trend,
        atr_change_pct: round_to(atr_change, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_with_range(ranges: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        ranges
            .iter()
            .enumerate()
            .map(|(i, r)| Bar::new(start + Duration::days(i as i64), 100.0, 100.0 + r / 2.0, 100.0 - r / 2.0, 100.0, 1_000.0))
            .collect()
    }

    #[test]
    fn test_constant_range() {
        let bars = bars_with_range(&[2.0; 30]);
        let atr = compute_atr(&bars, 14);
        assert_eq!(atr.atr, 2.0);
        assert_eq!(atr.atr_pct, 2.0);
        assert_eq!(atr.atr_trend, AtrTrend::Stable);
        assert_eq!(atr.recent_range, 2.0);
    }

    #[test]
    fn test_expanding_range() {
        let mut ranges = vec![1.0; 15];
        ranges.extend(vec![2.0; 15]);
        let atr = compute_atr(&bars_with_range(&ranges), 14);
        assert_eq!(atr.atr_trend, AtrTrend::Expanding);
        assert!(atr.atr_change_pct > 50.0);
    }

    #[test]
    fn test_gap_counts_in_true_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let bars = vec![
            Bar::new(start, 100.0, 101.0, 99.0, 100.0, 1.0),
            Bar::new(start + Duration::days(1), 105.0, 106.0, 104.0, 105.0, 1.0),
        ];
        assert_eq!(true_ranges(&bars), vec![6.0]);
    }

    #[test]
    fn test_too_few_bars() {
        let atr = compute_atr(&bars_with_range(&[1.0; 10]), 14);
        assert_eq!(atr.atr, 0.0);
        assert_eq!(atr.atr_trend, AtrTrend::Unknown);
    }
}
