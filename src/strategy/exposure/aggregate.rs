//! Multi-expiration GEX
//!
//! Pools per-strike exposure across the nearest expirations. Each chain's
//! gamma is weighted naturally by its DTE through the pricing formula, so
//! the pooled ladder is a closer picture of total dealer inventory.

use serde::Serialize;
use tracing::debug;

use super::{abs_gamma_strike, build_profile, find_flip, ExposureParams, GammaRegime};
use crate::domain::{OptionQuote, OptionsChain};
use crate::strategy::levels::{find_oi_walls, max_pain, Wall};
use crate::strategy::numeric::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub strike: f64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
    pub net_charm: f64,
    pub net_vanna: f64,
}

impl AggregateRow {
    fn empty(strike: f64) -> Self {
        Self {
            strike,
            call_oi: 0,
            put_oi: 0,
            call_gex: 0.0,
            put_gex: 0.0,
            net_gex: 0.0,
            net_charm: 0.0,
            net_vanna: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryDetail {
    pub expiration: Option<String>,
    pub dte: u32,
    pub total_gex: f64,
    pub n_strikes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateGex {
    pub spot: f64,
    pub n_expirations: usize,
    pub expirations_used: Vec<ExpiryDetail>,
    pub regime: GammaRegime,
    pub flip_point: Option<f64>,
    pub abs_gamma_strike: f64,
    pub total_gex: f64,
    pub total_call_gex: f64,
    pub total_put_gex: f64,
    pub total_charm: f64,
    pub total_vanna: f64,
    pub rows: Vec<AggregateRow>,
    pub max_pain: f64,
    pub call_wall: Wall,
    pub put_wall: Wall,
}

/// Pool exposure across up to `aggregate_max_expirations` chains at a common spot
pub fn aggregate_gex(chains: &[OptionsChain], spot: f64, params: &ExposureParams) -> AggregateGex {
    let selected = &chains[..chains.len().min(params.aggregate_max_expirations)];

    let mut rows: Vec<AggregateRow> = Vec::new();
    let mut details = Vec::with_capacity(selected.len());
    let mut all_calls: Vec<OptionQuote> = Vec::new();
    let mut all_puts: Vec<OptionQuote> = Vec::new();

    for chain in selected {
        let profile = build_profile(&chain.calls, &chain.puts, spot, chain.dte.max(1), params);
        details.push(ExpiryDetail {
            expiration: chain.expiration.clone(),
            dte: chain.dte,
            total_gex: profile.total_gex,
            n_strikes: profile.rows.len(),
        });

        for r in &profile.rows {
            let idx = match rows.iter().position(|a| a.strike == r.strike) {
                Some(i) => i,
                None => {
                    rows.push(AggregateRow::empty(r.strike));
                    rows.len() - 1
                }
            };
            let agg = &mut rows[idx];
            agg.call_oi += r.call_oi;
            agg.put_oi += r.put_oi;
            agg.call_gex += r.call_gex;
            agg.put_gex += r.put_gex;
            agg.net_gex += r.net_gex;
            agg.net_charm += r.net_charm;
            agg.net_vanna += r.net_vanna;
        }

        all_calls.extend(chain.calls.iter().cloned());
        all_puts.extend(chain.puts.iter().cloned());
    }

    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    for r in &mut rows {
        r.call_gex = round_to(r.call_gex, 2);
        r.put_gex = round_to(r.put_gex, 2);
        r.net_gex = round_to(r.net_gex, 2);
        r.net_charm = round_to(r.net_charm, 2);
        r.net_vanna = round_to(r.net_vanna, 2);
    }

    let points: Vec<(f64, f64)> = rows.iter().map(|r| (r.strike, r.net_gex)).collect();
    let flip_point = find_flip(&points, spot);
    let total_gex: f64 = rows.iter().map(|r| r.net_gex).sum();
    let pain = max_pain(&all_calls, &all_puts);
    let walls = find_oi_walls(&all_calls, &all_puts, spot);

    debug!("Aggregate GEX over {} expirations, {} strikes", details.len(), rows.len());

    AggregateGex {
        spot,
        n_expirations: details.len(),
        expirations_used: details,
        regime: GammaRegime::classify(spot, flip_point, total_gex),
        flip_point,
        abs_gamma_strike: abs_gamma_strike(&points, spot),
        total_gex: round_to(total_gex, 2),
        total_call_gex: round_to(rows.iter().map(|r| r.call_gex).sum(), 2),
        total_put_gex: round_to(rows.iter().map(|r| r.put_gex).sum(), 2),
        total_charm: round_to(rows.iter().map(|r| r.net_charm).sum(), 2),
        total_vanna: round_to(rows.iter().map(|r| r.net_vanna).sum(), 2),
        rows,
        max_pain: pain.max_pain,
        call_wall: walls.call_wall,
        put_wall: walls.put_wall,
    }
}
