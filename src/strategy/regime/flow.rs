//! Flow Turbulence Detector
//!
//! Ratio of speculative near-ATM call flow to dealer inventory gamma:
//! - ratio < 0.7: LAMINAR (dealers absorb flow, walls hold)
//! - 0.7 - 1.0: TRANSITIONAL (dealers straining)
//! - ratio > 1.0: TURBULENT (dealers overwhelmed, walls become accelerators)
//!
//! Gamma is approximated by a log-moneyness Gaussian scaled by IV, which is
//! enough to rank strikes without a full pricing model.

use serde::{Deserialize, Serialize};

use crate::domain::{OptionQuote, OptionsChain};
use crate::strategy::exposure::CONTRACT_MULTIPLIER;
use crate::strategy::numeric::{mean, round_to};

/// Flow detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Strikes within this fraction of spot count as near-ATM (default: 0.10)
    pub atm_tolerance: f64,
    /// Ratio above which flow is TRANSITIONAL (default: 0.7)
    pub transitional_above: f64,
    /// Ratio above which flow is TURBULENT (default: 1.0)
    pub turbulent_above: f64,
    /// Reported ratio cap (default: 99.0)
    pub ratio_cap: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            atm_tolerance: 0.10,
            transitional_above: 0.7,
            turbulent_above: 1.0,
            ratio_cap: 99.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowRegime {
    Laminar,
    Transitional,
    Turbulent,
    /// Missing chain leg or spot
    Unknown,
}

impl FlowRegime {
    pub fn from_ratio(ratio: f64, params: &FlowParams) -> Self {
        if ratio > params.turbulent_above {
            Self::Turbulent
        } else if ratio > params.transitional_above {
            Self::Transitional
        } else {
            Self::Laminar
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReading {
    /// Speculative / dealer gamma ratio, capped and rounded
    pub ratio: f64,
    pub regime: FlowRegime,
    pub speculative_gamma: f64,
    pub dealer_gamma: f64,
    pub call_put_ratio: f64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub call_oi: u64,
    pub put_oi: u64,
    /// Mean near-ATM call IV (decimal), 0.0 when none
    pub atm_iv: f64,
}

impl Default for FlowReading {
    fn default() -> Self {
        Self {
            ratio: 0.0,
            regime: FlowRegime::Unknown,
            speculative_gamma: 0.0,
            dealer_gamma: 0.0,
            call_put_ratio: 0.0,
            call_volume: 0,
            put_volume: 0,
            call_oi: 0,
            put_oi: 0,
            atm_iv: 0.0,
        }
    }
}

fn gamma_proxy(spot: f64, quote: &OptionQuote) -> f64 {
    let iv = quote.iv_or_default().max(0.01);
    (-0.5 * ((spot / quote.strike).ln() / iv).powi(2)).exp()
}

/// Measure flow turbulence for one chain
pub fn compute_flow(calls: &[OptionQuote], puts: &[OptionQuote], spot: f64, params: &FlowParams) -> FlowReading {
    if calls.is_empty() || puts.is_empty() || spot <= 0.0 {
        return FlowReading::default();
    }

    let scale = CONTRACT_MULTIPLIER * spot * spot * 0.01;
    let mut reading = FlowReading::default();
    let mut speculative = 0.0;
    let mut dealer = 0.0;
    let mut atm_ivs = Vec::new();

    for c in calls {
        reading.call_volume += c.volume;
        reading.call_oi += c.open_interest;
        if c.strike <= 0.0 {
            continue;
        }
        let proxy = gamma_proxy(spot, c);
        if (c.strike - spot).abs() / spot <= params.atm_tolerance {
            speculative += proxy * c.volume as f64 * scale;
            atm_ivs.push(c.iv_or_default());
        }
        dealer += proxy * c.open_interest as f64 * scale;
    }

    for p in puts {
        reading.put_volume += p.volume;
        reading.put_oi += p.open_interest;
        if p.strike <= 0.0 {
            continue;
        }
        dealer -= gamma_proxy(spot, p) * p.open_interest as f64 * scale;
    }

    let ratio = if dealer.abs() < 1e-6 {
        if speculative > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        (speculative / dealer).abs()
    };

    reading.regime = FlowRegime::from_ratio(ratio, params);
    reading.ratio = round_to(ratio.min(params.ratio_cap), 4);
    reading.speculative_gamma = round_to(speculative, 2);
    reading.dealer_gamma = round_to(dealer, 2);
    reading.call_put_ratio = round_to(reading.call_volume as f64 / reading.put_volume.max(1) as f64, 2);
    reading.atm_iv = round_to(mean(&atm_ivs), 4);
    reading
}

pub fn chain_flow(chain: &OptionsChain, params: &FlowParams) -> FlowReading {
    compute_flow(&chain.calls, &chain.puts, chain.spot, params)
}
