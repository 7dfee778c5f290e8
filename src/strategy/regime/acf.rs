//! Price Autocorrelation Detector
//!
//! Lag-1 autocorrelation of intraday returns reveals the hedging regime:
//! - negative ACF: dealers long gamma, moves get faded (LONG_GAMMA)
//! - positive ACF: dealers short gamma, moves get chased (SHORT_GAMMA)
//!
//! Each session is measured independently, then aggregated into a mean,
//! dampened/amplified shares, a trend and a sign-flip stability label.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::excitation::{compute_self_excitation, ExcitationParams, SelfExcitation};
use crate::domain::Bar;
use crate::strategy::numeric::{linear_slope, mean, population_variance, round_to, simple_returns};

/// Highest lag-1 ACF observed before a short-gamma squeeze
pub const SHORT_GAMMA_CEILING: f64 = 0.11;

/// ACF detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcfParams {
    /// Minimum intraday bars in the whole series (default: 30)
    pub min_series_bars: usize,
    /// Minimum bars for a session to be measured (default: 20)
    pub min_session_bars: usize,
    /// Lags computed per session (default: 5)
    pub max_lag: usize,
    /// |ACF| band treated as neutral (default: 0.05)
    pub neutral_band: f64,
    /// |slope| per session beyond which the trend is directional (default: 0.005)
    pub trend_slope: f64,
    /// Share of the squeeze ceiling that flags proximity (default: 0.85)
    pub ceiling_fraction: f64,
    pub excitation: ExcitationParams,
}

impl Default for AcfParams {
    fn default() -> Self {
        Self {
            min_series_bars: 30,
            min_session_bars: 20,
            max_lag: 5,
            neutral_band: 0.05,
            trend_slope: 0.005,
            ceiling_fraction: 0.85,
            excitation: ExcitationParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcfRegime {
    LongGamma,
    ShortGamma,
    Neutral,
}

impl AcfRegime {
    /// Strict boundaries: exactly +/-0.05 is NEUTRAL
    pub fn from_lag1(lag1: f64) -> Self {
        Self::classify(lag1, 0.05)
    }

    pub fn classify(lag1: f64, band: f64) -> Self {
        if lag1 < -band {
            Self::LongGamma
        } else if lag1 > band {
            Self::ShortGamma
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcfStatus {
    Ok,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcfTrend {
    Deepening,
    Shallowing,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcfStability {
    RockSolid,
    Stable,
    Contested,
    Unreliable,
    Unknown,
}

impl AcfStability {
    pub fn from_transition_rate(rate: f64) -> Self {
        if rate < 0.10 {
            Self::RockSolid
        } else if rate < 0.25 {
            Self::Stable
        } else if rate < 0.40 {
            Self::Contested
        } else {
            Self::Unreliable
        }
    }
}

/// One session's lag-1 reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAcf {
    pub date: NaiveDate,
    pub lag1_acf: f64,
    pub regime: AcfRegime,
    pub n_bars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcfReading {
    pub status: AcfStatus,
    pub n_days: usize,
    pub mean_acf1: f64,
    pub regime: AcfRegime,
    pub pct_dampened: f64,
    pub pct_amplified: f64,
    pub acf_trend: AcfTrend,
    pub acf_slope: f64,
    pub stability: AcfStability,
    pub transitions_per_day: f64,
    pub at_squeeze_ceiling: bool,
    pub daily_results: Vec<DailyAcf>,
    pub self_excitation: SelfExcitation,
}

impl AcfReading {
    /// Neutral reading used whenever intraday data is unusable
    pub fn fallback() -> Self {
        Self {
            status: AcfStatus::Fallback,
            n_days: 0,
            mean_acf1: 0.0,
            regime: AcfRegime::Neutral,
            pct_dampened: 0.0,
            pct_amplified: 0.0,
            acf_trend: AcfTrend::Unknown,
            acf_slope: 0.0,
            stability: AcfStability::Unknown,
            transitions_per_day: 0.0,
            at_squeeze_ceiling: false,
            daily_results: Vec::new(),
            self_excitation: SelfExcitation::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AcfStatus::Ok
    }
}

/// Why a series could not be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcfUnavailable {
    #[error("fewer than the minimum intraday bars")]
    NoData,
    #[error("no session had enough bars for a defined ACF")]
    InsufficientData,
}

/// Autocorrelation of simple returns at lags 1..=max_lag.
/// `None` when there are fewer than max_lag + 10 returns or the
/// returns have (near) zero variance.
pub fn compute_daily_acf(prices: &[f64], max_lag: usize) -> Option<Vec<f64>> {
    let returns = simple_returns(prices);
    if returns.len() < max_lag + 10 {
        return None;
    }
    let n = returns.len();
    let m = mean(&returns);
    let var = population_variance(&returns);
    if var < 1e-12 {
        return None;
    }

    let acf = (1..=max_lag)
        .map(|lag| {
            let products: Vec<f64> = returns[..n - lag]
                .iter()
                .zip(&returns[lag..])
                .map(|(a, b)| (a - m) * (b - m))
                .collect();
            mean(&products) / var
        })
        .collect();
    Some(acf)
}

/// Measure every session of an intraday series
pub fn scan_acf(bars: &[Bar], params: &AcfParams) -> Result<AcfReading, AcfUnavailable> {
    if bars.len() < params.min_series_bars {
        return Err(AcfUnavailable::NoData);
    }

    let mut sessions: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for bar in bars {
        sessions.entry(bar.date()).or_default().push(bar.close);
    }

    let band = params.neutral_band;
    let daily: Vec<DailyAcf> = sessions
        .into_iter()
        .filter(|(_, closes)| closes.len() >= params.min_session_bars)
        .filter_map(|(date, closes)| {
            let lag1 = compute_daily_acf(&closes, params.max_lag)?.first().copied()?;
            if lag1.is_nan() {
                return None;
            }
            Some(DailyAcf {
                date,
                lag1_acf: round_to(lag1, 4),
                regime: AcfRegime::classify(lag1, band),
                n_bars: closes.len(),
            })
        })
        .collect();

    if daily.is_empty() {
        return Err(AcfUnavailable::InsufficientData);
    }

    let lag1: Vec<f64> = daily.iter().map(|d| d.lag1_acf).collect();
    let n_total = lag1.len();
    let n_dampened = lag1.iter().filter(|v| **v < -band).count();
    let n_amplified = lag1.iter().filter(|v| **v > band).count();
    let mean_acf1 = mean(&lag1);

    let (acf_trend, slope) = if n_total >= 3 {
        let slope = linear_slope(&lag1);
        let trend = if slope < -params.trend_slope {
            AcfTrend::Deepening
        } else if slope > params.trend_slope {
            AcfTrend::Shallowing
        } else {
            AcfTrend::Stable
        };
        (trend, slope)
    } else {
        (AcfTrend::Stable, 0.0)
    };

    let sign = |v: f64| if v > 0.0 { 1 } else { -1 };
    let transitions = lag1.windows(2).filter(|w| sign(w[0]) != sign(w[1])).count();
    let rate = transitions as f64 / n_total as f64;

    let recent = &lag1[n_total.saturating_sub(3)..];
    let max_recent = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let all_closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    debug!(
        "ACF scan: {} sessions, mean lag1 {:.4}, {} amplified",
        n_total, mean_acf1, n_amplified
    );

    Ok(AcfReading {
        status: AcfStatus::Ok,
        n_days: n_total,
        mean_acf1: round_to(mean_acf1, 4),
        regime: AcfRegime::classify(mean_acf1, band),
        pct_dampened: round_to(100.0 * n_dampened as f64 / n_total as f64, 1),
        pct_amplified: round_to(100.0 * n_amplified as f64 / n_total as f64, 1),
        acf_trend,
        acf_slope: round_to(slope, 6),
        stability: AcfStability::from_transition_rate(rate),
        transitions_per_day: round_to(rate, 3),
        at_squeeze_ceiling: max_recent >= SHORT_GAMMA_CEILING * params.ceiling_fraction,
        daily_results: daily,
        self_excitation: compute_self_excitation(&all_closes, &params.excitation),
    })
}

/// Scan, degrading to the neutral fallback reading
pub fn detect_acf(bars: &[Bar], params: &AcfParams) -> AcfReading {
    match scan_acf(bars, params) {
        Ok(reading) => reading,
        Err(reason) => {
            warn!("ACF unavailable ({}), using neutral fallback", reason);
            AcfReading::fallback()
        }
    }
}
