//! Implied versus realized volatility

use serde::{Deserialize, Serialize};

use crate::strategy::numeric::{log_returns, population_std, round_to};

/// Trading days per year
pub const ANNUALIZATION_DAYS: f64 = 252.0;

/// Minimum closes before realized vol is meaningful
const MIN_CLOSES: usize = 20;

/// Returns needed before the HV percentile is computed
const PERCENTILE_MIN_RETURNS: usize = 60;

/// Rolling window for the HV percentile
const PERCENTILE_WINDOW: usize = 20;

/// How implied vol is priced relative to realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IvContext {
    Cheap,
    SlightDiscount,
    Fair,
    SlightPremium,
    Expensive,
    VeryExpensive,
    #[serde(rename = "N/A")]
    Unknown,
}

impl IvContext {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.80 {
            Self::Cheap
        } else if ratio < 0.95 {
            Self::SlightDiscount
        } else if ratio < 1.10 {
            Self::Fair
        } else if ratio < 1.30 {
            Self::SlightPremium
        } else if ratio < 1.60 {
            Self::Expensive
        } else {
            Self::VeryExpensive
        }
    }

    pub fn is_discounted(&self) -> bool {
        matches!(self, Self::Cheap | Self::SlightDiscount)
    }

    fn label(&self, ratio: f64) -> String {
        let pct = ratio * 100.0;
        match self {
            Self::Cheap => format!("IV {:.0}% of realized: options are cheap, good for buying", pct),
            Self::SlightDiscount => "IV slightly below realized, fair entry for buyers".to_string(),
            Self::Fair => "IV in line with realized, no vol edge either way".to_string(),
            Self::SlightPremium => "IV slightly above realized, acceptable but not ideal".to_string(),
            Self::Expensive => format!("IV {:.0}% of realized: options are expensive, consider spreads", pct),
            Self::VeryExpensive => format!("IV {:.0}% of realized: extremely overpriced, avoid naked longs", pct),
            Self::Unknown => "Insufficient data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvHvReading {
    /// ATM IV in percent
    pub atm_iv: f64,
    pub hv_10d: f64,
    pub hv_20d: f64,
    pub hv_30d: f64,
    pub hv_60d: f64,
    /// HV window matched to the expiry
    pub hv_used: f64,
    pub hv_window: String,
    pub iv_hv_ratio: f64,
    /// Share of rolling 20-day HV readings at or below the current one
    pub iv_percentile_proxy: u32,
    pub context: IvContext,
    pub label: String,
}

/// Annualized realized vol in percent over the last `window` returns, 0.0 if too short
pub fn historical_vol(log_ret: &[f64], window: usize) -> f64 {
    if window == 0 || log_ret.len() < window {
        return 0.0;
    }
    let tail = &log_ret[log_ret.len() - window..];
    round_to(population_std(tail) * ANNUALIZATION_DAYS.sqrt() * 100.0, 1)
}

fn or_else(primary: f64, secondary: f64) -> f64 {
    if primary != 0.0 {
        primary
    } else {
        secondary
    }
}

fn hv_percentile(log_ret: &[f64]) -> u32 {
    if log_ret.len() < PERCENTILE_MIN_RETURNS {
        return 50;
    }
    let ann = ANNUALIZATION_DAYS.sqrt() * 100.0;
    let rolling: Vec<f64> = (PERCENTILE_WINDOW..log_ret.len())
        .map(|i| population_std(&log_ret[i - PERCENTILE_WINDOW..i]) * ann)
        .collect();
    match rolling.last() {
        Some(&current) => {
            let below = rolling.iter().filter(|h| **h <= current).count();
            (100.0 * below as f64 / rolling.len() as f64).round() as u32
        }
        None => 50,
    }
}

/// Compare ATM IV (decimal) to realized vol over the DTE-matched window
pub fn iv_vs_hv(atm_iv: f64, closes: &[f64], dte: u32) -> IvHvReading {
    let atm_iv = if atm_iv > 0.0 { atm_iv } else { 0.3 };

    if closes.len() < MIN_CLOSES {
        return IvHvReading {
            atm_iv: round_to(atm_iv * 100.0, 1),
            hv_10d: 0.0,
            hv_20d: 0.0,
            hv_30d: 0.0,
            hv_60d: 0.0,
            hv_used: 0.0,
            hv_window: String::new(),
            iv_hv_ratio: 1.0,
            iv_percentile_proxy: 50,
            context: IvContext::Unknown,
            label: IvContext::Unknown.label(1.0),
        };
    }

    let log_ret = log_returns(closes);
    let hv_10d = historical_vol(&log_ret, 10);
    let hv_20d = historical_vol(&log_ret, 20);
    let hv_30d = historical_vol(&log_ret, 30);
    let hv_60d = historical_vol(&log_ret, 60);

    let hv_used = match dte {
        0..=10 => or_else(hv_10d, hv_20d),
        11..=20 => or_else(hv_20d, hv_10d),
        21..=30 => or_else(hv_30d, hv_20d),
        _ => or_else(hv_60d, hv_30d),
    };

    let iv_pct = atm_iv * 100.0;
    let ratio = if hv_used > 1.0 { iv_pct / hv_used } else { 1.0 };
    let context = IvContext::from_ratio(ratio);

    IvHvReading {
        atm_iv: round_to(iv_pct, 1),
        hv_10d,
        hv_20d,
        hv_30d,
        hv_60d,
        hv_used,
        hv_window: format!("{}d-matched", dte),
        iv_hv_ratio: round_to(ratio, 2),
        iv_percentile_proxy: hv_percentile(&log_ret),
        context,
        label: context.label(ratio),
    }
}
