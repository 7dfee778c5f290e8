//! Ranks supplied expirations for a straddle entry

use serde::Serialize;

use super::structure::{build_straddle, iv_vs_rv};
use crate::domain::OptionsChain;
use crate::strategy::numeric::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryCandidate {
    pub expiration: Option<String>,
    pub dte: u32,
    pub cost: f64,
    pub cost_per_contract: f64,
    pub breakeven_pct: f64,
    /// Percent
    pub iv: f64,
    pub iv_rv_ratio: f64,
    pub atr_coverage: f64,
    pub score: i32,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExpiryScan {
    pub best: Option<ExpiryCandidate>,
    pub expirations: Vec<ExpiryCandidate>,
}

/// 7-14 DTE is the sweet spot: enough time without heavy theta
fn dte_score(dte: u32) -> f64 {
    match dte {
        7..=14 => 20.0,
        5..=21 => 15.0,
        _ => 5.0,
    }
}

/// Score each chain on IV value, ATR coverage of the breakeven and DTE.
/// `fallback_iv` (decimal) stands in when a chain's ATM legs carry no IV.
pub fn scan_expirations(
    chains: &[OptionsChain],
    spot: f64,
    closes: &[f64],
    atr_pct: f64,
    fallback_iv: f64,
    current: &OptionsChain,
    max_chains: usize,
) -> ExpiryScan {
    let mut expirations: Vec<ExpiryCandidate> = chains
        .iter()
        .take(max_chains)
        .map(|chain| {
            let straddle = build_straddle(&chain.calls, &chain.puts, spot);
            let mut atm_iv = (straddle.call_iv + straddle.put_iv) / 200.0;
            if atm_iv <= 0.0 {
                atm_iv = fallback_iv;
            }
            let ratio = iv_vs_rv(atm_iv, closes).iv_rv_ratio;
            let be = straddle.required_move_pct;
            let atr_coverage = if be > 0.0 && atr_pct > 0.0 { round_to(atr_pct / be, 2) } else { 0.0 };

            let iv_score = (30.0 - ratio * 20.0).max(0.0);
            let atr_score = (atr_coverage * 20.0).min(30.0);
            let score = (iv_score + atr_score + dte_score(chain.dte)).round() as i32;

            ExpiryCandidate {
                expiration: chain.expiration.clone(),
                dte: chain.dte,
                cost: straddle.total_cost,
                cost_per_contract: straddle.total_cost_per_contract,
                breakeven_pct: be,
                iv: round_to(atm_iv * 100.0, 1),
                iv_rv_ratio: ratio,
                atr_coverage,
                score,
                is_current: chain.dte == current.dte && chain.expiration == current.expiration,
            }
        })
        .collect();

    expirations.sort_by(|a, b| b.score.cmp(&a.score));
    ExpiryScan {
        best: expirations.first().cloned(),
        expirations,
    }
}
