//! Volatility Context Module
//!
//! Prices the options themselves rather than the underlying:
//!
//! - **Realized**: ATM IV versus DTE-matched historical vol
//! - **Skew**: OTM put versus OTM call IV
//! - **Term**: ATM IV across expirations
//! - **VRP**: variance premium with realized vol scaled by dealer positioning
//! - **Edge**: composite score for option buyers

pub mod edge;
pub mod realized;
pub mod skew;
pub mod term;
pub mod vrp;

pub use edge::{compute_vol_edge, VolEdge, VolVerdict};
pub use realized::{historical_vol, iv_vs_hv, IvContext, IvHvReading, ANNUALIZATION_DAYS};
pub use skew::{compute_skew, SkewReading, SkewRegime};
pub use term::{compute_term_structure, TermPoint, TermShape, TermStructure};
pub use vrp::{compute_vrp, gex_vol_multiplier, VrpContext, VrpReading};

use serde::Serialize;
use tracing::debug;

use crate::domain::OptionsChain;
use crate::strategy::exposure::GammaRegime;
use crate::strategy::regime::FlowRegime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolAnalysis {
    pub iv_hv: IvHvReading,
    pub skew: SkewReading,
    pub term_structure: TermStructure,
    pub vrp: VrpReading,
    pub vol_edge: VolEdge,
}

/// Full volatility read for the selected chain.
///
/// `atm_iv` is the decimal ATM IV (the flow detector's near-ATM mean);
/// `term_chains` should include the selected chain itself.
pub fn compute_vol_analysis(
    chain: &OptionsChain,
    closes: &[f64],
    atm_iv: f64,
    term_chains: &[OptionsChain],
    gamma: GammaRegime,
    flow: FlowRegime,
) -> VolAnalysis {
    let closes: Vec<f64> = closes.iter().copied().filter(|c| *c > 0.0).collect();

    let iv_hv = iv_vs_hv(atm_iv, &closes, chain.dte);
    let skew = compute_skew(&chain.calls, &chain.puts, chain.spot, chain.dte);
    let term_structure = if term_chains.is_empty() {
        TermStructure::default()
    } else {
        compute_term_structure(term_chains, chain.spot)
    };
    let vrp = compute_vrp(atm_iv, &closes, chain.dte, gamma, flow);
    let vol_edge = compute_vol_edge(&iv_hv, &skew, &term_structure, &vrp);

    debug!(
        "Vol analysis: iv/hv {:.2} ({:?}), skew {:?}, term {:?}, vrp {:?}, edge {} {:?}",
        iv_hv.iv_hv_ratio, iv_hv.context, skew.regime, term_structure.shape, vrp.context, vol_edge.score, vol_edge.verdict
    );

    VolAnalysis {
        iv_hv,
        skew,
        term_structure,
        vrp,
        vol_edge,
    }
}

/// Vol inputs consumed by position sizing and strike selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingVolContext {
    pub iv_hv_ratio: f64,
    pub iv_context: IvContext,
    pub skew_regime: SkewRegime,
    /// Premium bucket derived from the IV/HV ratio alone
    pub vrp_context: VrpContext,
}

impl Default for SizingVolContext {
    fn default() -> Self {
        Self {
            iv_hv_ratio: 1.0,
            iv_context: IvContext::Fair,
            skew_regime: SkewRegime::Unknown,
            vrp_context: VrpContext::Fair,
        }
    }
}

impl SizingVolContext {
    pub fn new(iv_hv: &IvHvReading, skew: &SkewReading) -> Self {
        let ratio = iv_hv.iv_hv_ratio;
        Self {
            iv_hv_ratio: ratio,
            iv_context: iv_hv.context,
            skew_regime: skew.regime,
            vrp_context: Self::premium_from_ratio(ratio),
        }
    }

    pub fn premium_from_ratio(ratio: f64) -> VrpContext {
        if ratio > 1.6 {
            VrpContext::HighPremium
        } else if ratio > 1.3 {
            VrpContext::ModeratePremium
        } else if ratio > 1.1 {
            VrpContext::SmallPremium
        } else if ratio > 0.9 {
            VrpContext::Fair
        } else {
            VrpContext::Discount
        }
    }

    /// Build from the selected chain and daily closes
    pub fn from_chain(chain: &OptionsChain, closes: &[f64], atm_iv: f64) -> Self {
        let closes: Vec<f64> = closes.iter().copied().filter(|c| *c > 0.0).collect();
        let iv_hv = iv_vs_hv(atm_iv, &closes, chain.dte);
        let skew = compute_skew(&chain.calls, &chain.puts, chain.spot, chain.dte);
        Self::new(&iv_hv, &skew)
    }
}
