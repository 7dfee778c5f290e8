//! Level collision estimates
//!
//! Treats daily price moves as a random walk with ATR as the per-day scale:
//! the chance of touching a level within DTE, and the first-passage time
//! T = d² / (2·ATR²) adjusted for the hedging regime.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use super::level_actions::Side;
use crate::strategy::numeric::round_to;
use crate::strategy::regime::{AcfRegime, FlowRegime};

/// Distance below which price is treated as at the level
const AT_LEVEL: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollisionLabel {
    Likely,
    Possible,
    Unlikely,
}

impl CollisionLabel {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.6 {
            Self::Likely
        } else if p > 0.3 {
            Self::Possible
        } else {
            Self::Unlikely
        }
    }
}

/// Chance that price reaches `level` within `dte` days given the ATR envelope
pub fn collision_probability(spot: f64, level: f64, atr: f64, dte: u32) -> f64 {
    if atr <= 0.0 || dte == 0 || level <= 0.0 {
        return 0.5;
    }
    let distance = (spot - level).abs();
    if distance < AT_LEVEL {
        return 0.95;
    }
    let max_move = atr * (dte as f64).sqrt();
    (max_move / (2.0 * distance)).clamp(0.05, 0.95)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Now,
    Imminent,
    Soon,
    Possible,
    Unlikely,
}

impl Urgency {
    pub fn classify(days: f64, dte: u32) -> Self {
        let dte = dte as f64;
        if days < 1.0 {
            Self::Now
        } else if days < 2.0 {
            Self::Imminent
        } else if days <= dte {
            Self::Soon
        } else if days > dte * 2.0 {
            Self::Unlikely
        } else {
            Self::Possible
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionTime {
    pub level_label: String,
    pub level_price: f64,
    pub distance: f64,
    pub distance_pct: f64,
    pub expected_days_raw: f64,
    pub expected_days_adj: f64,
    pub regime_mult: f64,
    /// Percent
    pub prob_within_dte: f64,
    pub urgency: Urgency,
    pub side: Side,
}

/// Arrival-time multiplier: turbulent flow speeds arrival, long gamma slows it
pub fn regime_multiplier(acf: AcfRegime, flow: FlowRegime) -> f64 {
    match (flow, acf) {
        (FlowRegime::Turbulent, _) => 0.6,
        (FlowRegime::Transitional, _) => 0.8,
        (_, AcfRegime::LongGamma) => 1.4,
        _ => 1.0,
    }
}

/// Expected days to reach each labelled level, sorted by adjusted time
pub fn compute_collision_times(
    spot: f64,
    levels: &[(&str, f64)],
    atr: f64,
    acf: AcfRegime,
    flow: FlowRegime,
    dte: u32,
) -> Vec<CollisionTime> {
    if atr <= 0.0 || spot <= 0.0 {
        return Vec::new();
    }
    let mult = regime_multiplier(acf, flow);
    let atr_sq = atr * atr;

    let mut results: Vec<CollisionTime> = levels
        .iter()
        .filter(|(_, price)| *price > 0.0)
        .map(|&(label, price)| {
            let distance = (spot - price).abs();
            let t_raw = if distance < AT_LEVEL { 0.0 } else { distance * distance / (2.0 * atr_sq) };
            let t_adj = t_raw * mult;

            let p = if dte > 0 && distance > 0.0 {
                erfc(distance / (atr * (2.0 * dte.max(1) as f64).sqrt()))
            } else if distance < AT_LEVEL {
                0.95
            } else {
                0.0
            };

            CollisionTime {
                level_label: label.to_string(),
                level_price: round_to(price, 2),
                distance: round_to(distance, 2),
                distance_pct: round_to(distance / spot * 100.0, 2),
                expected_days_raw: round_to(t_raw, 1),
                expected_days_adj: round_to(t_adj, 1),
                regime_mult: mult,
                prob_within_dte: round_to(p.clamp(0.01, 0.99) * 100.0, 1),
                urgency: Urgency::classify(t_adj, dte),
                side: if price > spot { Side::Above } else { Side::Below },
            }
        })
        .collect();

    results.sort_by(|a, b| a.expected_days_adj.total_cmp(&b.expected_days_adj));
    results
}
