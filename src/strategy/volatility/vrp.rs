//! Gamma-adjusted variance risk premium
//!
//! Dealer hedging dampens realized vol in positive gamma and amplifies it
//! in negative gamma, so the realized leg is scaled by the positioning
//! regime before comparing against implied variance.

use serde::{Deserialize, Serialize};

use super::realized::ANNUALIZATION_DAYS;
use crate::strategy::exposure::GammaRegime;
use crate::strategy::numeric::{log_returns, population_std, round_to};
use crate::strategy::regime::FlowRegime;

const MIN_CLOSES: usize = 20;
const HV_WINDOW: usize = 20;
/// Below this annualized vol the realized leg is unusable
const MIN_HV: f64 = 0.01;
/// Floor on the DTE used to spread the premium per day
const MIN_DRAG_DAYS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VrpContext {
    HighPremium,
    ModeratePremium,
    SmallPremium,
    Fair,
    Discount,
    #[serde(rename = "N/A")]
    Unknown,
}

impl VrpContext {
    pub fn from_adjusted(vrp: f64) -> Self {
        if vrp > 5.0 {
            Self::HighPremium
        } else if vrp > 2.0 {
            Self::ModeratePremium
        } else if vrp > 0.0 {
            Self::SmallPremium
        } else if vrp > -2.0 {
            Self::Fair
        } else {
            Self::Discount
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::HighPremium => "Options rich after dealer adjustment, sellers have the edge",
            Self::ModeratePremium => "Moderate premium over gamma-adjusted realized",
            Self::SmallPremium => "Small premium, close to fair",
            Self::Fair => "Implied variance near gamma-adjusted realized",
            Self::Discount => "Implied variance below expected realized, buyers have the edge",
            Self::Unknown => "Insufficient data",
        }
    }
}

/// Realized-vol multiplier implied by dealer positioning and flow
pub fn gex_vol_multiplier(gamma: GammaRegime, flow: FlowRegime) -> f64 {
    match (gamma, flow) {
        (GammaRegime::PositiveGamma, FlowRegime::Laminar) => 0.78,
        (GammaRegime::PositiveGamma, _) => 0.88,
        (GammaRegime::NegativeGamma, FlowRegime::Turbulent) => 1.15,
        (GammaRegime::NegativeGamma, _) => 1.08,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VrpReading {
    /// Variance points (IV² − HV² times 100)
    pub vrp_raw: f64,
    pub vrp_gex_adjusted: f64,
    /// Percent
    pub gex_implied_hv: f64,
    pub gex_vol_mult: f64,
    pub hv_20d: f64,
    pub atm_iv: f64,
    pub daily_drag: f64,
    pub context: VrpContext,
    pub label: String,
}

impl Default for VrpReading {
    fn default() -> Self {
        Self {
            vrp_raw: 0.0,
            vrp_gex_adjusted: 0.0,
            gex_implied_hv: 0.0,
            gex_vol_mult: 1.0,
            hv_20d: 0.0,
            atm_iv: 0.0,
            daily_drag: 0.0,
            context: VrpContext::Unknown,
            label: VrpContext::Unknown.label().to_string(),
        }
    }
}

/// `atm_iv` as a decimal; non-positive values default to 0.30
pub fn compute_vrp(atm_iv: f64, closes: &[f64], dte: u32, gamma: GammaRegime, flow: FlowRegime) -> VrpReading {
    let iv = if atm_iv > 0.0 { atm_iv } else { 0.3 };
    if closes.len() < MIN_CLOSES {
        return VrpReading::default();
    }
    let log_ret = log_returns(closes);
    if log_ret.len() < HV_WINDOW {
        return VrpReading::default();
    }
    let hv20 = population_std(&log_ret[log_ret.len() - HV_WINDOW..]) * ANNUALIZATION_DAYS.sqrt();
    if hv20 <= MIN_HV {
        return VrpReading::default();
    }

    let raw = (iv * iv - hv20 * hv20) * 100.0;
    let mult = gex_vol_multiplier(gamma, flow);
    let implied_hv = hv20 * mult;
    let adjusted = (iv * iv - implied_hv * implied_hv) * 100.0;
    let context = VrpContext::from_adjusted(adjusted);

    VrpReading {
        vrp_raw: round_to(raw, 2),
        vrp_gex_adjusted: round_to(adjusted, 2),
        gex_implied_hv: round_to(implied_hv * 100.0, 1),
        gex_vol_mult: mult,
        hv_20d: round_to(hv20 * 100.0, 1),
        atm_iv: round_to(iv * 100.0, 1),
        daily_drag: round_to(adjusted / (dte as f64).max(MIN_DRAG_DAYS), 3),
        context,
        label: context.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Alternating moves of fixed size so HV is known in closed form
    fn zigzag(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 100.0 * step.exp() }).collect()
    }

    #[test]
    fn test_flat_prices_have_no_reading() {
        let reading = compute_vrp(0.25, &[100.0; 30], 7, GammaRegime::PositiveGamma, FlowRegime::Laminar);
        assert_eq!(reading.context, VrpContext::Unknown);
        assert_eq!(reading.gex_vol_mult, 1.0);
    }

    #[test]
    fn test_positive_gamma_dampens_realized() {
        let closes = zigzag(40, 0.01);
        let pos = compute_vrp(0.16, &closes, 7, GammaRegime::PositiveGamma, FlowRegime::Laminar);
        let neg = compute_vrp(0.16, &closes, 7, GammaRegime::NegativeGamma, FlowRegime::Turbulent);
        assert_eq!(pos.gex_vol_mult, 0.78);
        assert_eq!(neg.gex_vol_mult, 1.15);
        assert!(pos.vrp_gex_adjusted > neg.vrp_gex_adjusted);
        assert_eq!(pos.vrp_raw, neg.vrp_raw);
    }

    #[test]
    fn test_discount_when_realized_dominates() {
        let closes = zigzag(40, 0.03);
        let reading = compute_vrp(0.20, &closes, 10, GammaRegime::NegativeGamma, FlowRegime::Laminar);
        assert_eq!(reading.context, VrpContext::Discount);
        assert!(reading.daily_drag < 0.0);
    }

    #[test]
    fn test_multiplier_table() {
        assert_eq!(gex_vol_multiplier(GammaRegime::PositiveGamma, FlowRegime::Turbulent), 0.88);
        assert_eq!(gex_vol_multiplier(GammaRegime::NegativeGamma, FlowRegime::Unknown), 1.08);
    }
}
