//! Strike rounding and ATR-bounded strike/target clamps

use crate::strategy::volatility::{IvContext, SizingVolContext};

/// Listed-strike increment for the underlying's price tier
pub fn strike_increment(spot: f64) -> f64 {
    if spot > 100.0 {
        5.0
    } else if spot > 50.0 {
        2.5
    } else if spot > 20.0 {
        1.0
    } else {
        0.5
    }
}

pub fn round_strike(price: f64, spot: f64) -> f64 {
    let inc = strike_increment(spot);
    (price / inc).round() * inc
}

/// Realistic move over `dte` days: ATR scaled by sqrt(DTE)
pub fn atr_max_move(atr: f64, dte: u32, multiplier: f64) -> f64 {
    if atr <= 0.0 || dte == 0 {
        return 0.0;
    }
    atr * (dte as f64).sqrt() * multiplier
}

/// Keep a strike within spot +/- 1.5 ATR·sqrt(DTE)
pub fn clamp_strike(desired: f64, spot: f64, atr: f64, dte: u32, is_call: bool) -> f64 {
    if atr <= 0.0 || dte == 0 {
        return desired;
    }
    let max_move = atr_max_move(atr, dte, 1.5);
    if is_call {
        desired.min(round_strike(spot + max_move, spot))
    } else {
        desired.max(round_strike(spot - max_move, spot))
    }
}

/// Keep a target within spot +/- 2 ATR·sqrt(DTE)
pub fn clamp_target(target: f64, spot: f64, atr: f64, dte: u32) -> f64 {
    if atr <= 0.0 || dte == 0 {
        return target;
    }
    let max_move = atr_max_move(atr, dte, 2.0);
    target.clamp(spot - max_move, spot + max_move)
}

/// OTM offset (fraction of spot) given how IV is priced, with a note for the position
pub fn strike_offset(vol: &SizingVolContext) -> (f64, &'static str) {
    let ratio = vol.iv_hv_ratio;
    match vol.iv_context {
        IvContext::VeryExpensive => (0.005, "ATM strike: IV very high, OTM options carry excessive vol risk"),
        _ if ratio > 1.6 => (0.005, "ATM strike: IV very high, OTM options carry excessive vol risk"),
        IvContext::Expensive => (0.01, "near-ATM: elevated IV, staying close reduces vol crush exposure"),
        _ if ratio > 1.3 => (0.01, "near-ATM: elevated IV, staying close reduces vol crush exposure"),
        IvContext::Cheap | IvContext::SlightDiscount => (0.025, "slightly OTM: IV is cheap, more leverage and room for vol expansion"),
        _ if ratio < 0.9 => (0.025, "slightly OTM: IV is cheap, more leverage and room for vol expansion"),
        _ => (0.015, ""),
    }
}
