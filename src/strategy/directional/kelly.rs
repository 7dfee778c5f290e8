//! Half-Kelly position sizing scaled by the vol regime

use serde::Serialize;

use crate::strategy::numeric::round_to;
use crate::strategy::volatility::VrpContext;

/// Payoff ratio floor
const MIN_ODDS: f64 = 0.5;
const MAX_WIN_PROB: f64 = 0.9;
/// Account-percent bounds for a sized position
pub const MIN_SIZE_PCT: f64 = 0.25;
pub const MAX_SIZE_PCT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KellySize {
    /// Percent of account
    pub pct: f64,
    pub label: String,
}

/// Sizing multiplier from IV/HV and the premium bucket
fn regime_scale(iv_hv_ratio: f64, vrp: VrpContext) -> f64 {
    if iv_hv_ratio > 1.5 || vrp == VrpContext::HighPremium {
        0.7
    } else if iv_hv_ratio > 1.3 && vrp == VrpContext::ModeratePremium {
        0.8
    } else if iv_hv_ratio < 0.9 || vrp == VrpContext::Discount {
        1.2
    } else {
        1.0
    }
}

/// `edge_pct` is the expected payoff in percent, `win_prob` in percent.
///
/// Both inputs are heuristics derived from level distances and regime
/// confidence; the result is only a relative sizing guide.
pub fn kelly_size(edge_pct: f64, win_prob: f64, iv_hv_ratio: f64, vrp: VrpContext) -> KellySize {
    if edge_pct <= 0.0 || win_prob <= 0.0 {
        return KellySize {
            pct: 0.0,
            label: "0%".to_string(),
        };
    }
    let b = (edge_pct / 100.0).max(MIN_ODDS);
    let p = (win_prob / 100.0).min(MAX_WIN_PROB);
    let q = 1.0 - p;
    let half_kelly = ((b * p - q) / b).max(0.0) * 0.5;

    let pct = round_to(half_kelly * regime_scale(iv_hv_ratio, vrp) * 100.0, 1).clamp(MIN_SIZE_PCT, MAX_SIZE_PCT);
    let label = if pct >= 3.0 {
        format!("{:.1}% (full conviction)", pct)
    } else if pct >= 1.5 {
        format!("{:.1}% (standard)", pct)
    } else if pct >= 0.75 {
        format!("{:.1}% (reduced, vol headwind)", pct)
    } else {
        format!("{:.2}% (minimal, conditions unfavourable)", pct)
    };
    KellySize { pct, label }
}
