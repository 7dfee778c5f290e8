//! Analysis Pipeline
//!
//! Runs every component over one ingested snapshot and bundles the
//! readings into an `AnalysisReport`. The pipeline is a pure function of
//! `(snapshot, params)`: no I/O, no clock, no shared state.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::domain::{IngestStats, MarketSnapshot, OptionsChain};
use crate::strategy::directional::{classify_thesis, compute_collision_times, CollisionTime, DirectionalInputs, DirectionalReading, Side};
use crate::strategy::exposure::{aggregate_gex, chain_profile, AggregateGex, GexProfile};
use crate::strategy::levels::{channel_strategy, extract_channel, find_oi_walls, max_pain, ChannelStrategy, GammaChannel, MaxPain, OiWalls};
use crate::strategy::numeric::round_to;
use crate::strategy::params::AnalysisParams;
use crate::strategy::regime::{chain_flow, detect_acf, detect_phase_transition, AcfReading, FlowReading, PhaseReading};
use crate::strategy::straddle::{analyze_straddles, scan_expirations, ExpiryScan, StraddleAnalysis, StraddleInputs};
use crate::strategy::technicals::{compute_technicals, Technicals};
use crate::strategy::volatility::{compute_vol_analysis, SizingVolContext, VolAnalysis};

/// IV assumed for the expiry scan when the flow detector found no ATM IV
const SCAN_FALLBACK_IV: f64 = 0.30;

/// Distance from spot to one key level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelDistance {
    pub value: f64,
    pub distance: f64,
    pub distance_pct: f64,
    pub side: Side,
}

/// Everything computed for one request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub benchmark: String,
    pub spot: f64,
    pub expiration: Option<String>,
    pub dte: u32,
    pub ingest: IngestStats,

    pub gex_regime_label: &'static str,
    pub gex_profile: GexProfile,
    pub max_pain: MaxPain,
    pub walls: OiWalls,
    pub channel: GammaChannel,
    pub channel_strategy: ChannelStrategy,

    pub flow: FlowReading,
    pub acf: AcfReading,
    pub phase: PhaseReading,

    pub vol_analysis: VolAnalysis,
    pub technicals: Technicals,

    pub directional: DirectionalReading,
    pub straddle_analysis: StraddleAnalysis,
    pub expiry_scan: ExpiryScan,
    pub collision_times: Vec<CollisionTime>,
    pub distances: BTreeMap<&'static str, LevelDistance>,
}

/// Selected chain plus the supplied term chains, one per expiration, by DTE
pub fn expiry_set(snapshot: &MarketSnapshot) -> Vec<OptionsChain> {
    let mut chains = vec![snapshot.chain.clone()];
    for chain in &snapshot.term_chains {
        let duplicate = chains
            .iter()
            .any(|c| c.dte == chain.dte && c.expiration == chain.expiration);
        if !duplicate {
            chains.push(chain.clone());
        }
    }
    chains.sort_by_key(|c| c.dte);
    chains
}

/// Map each positive level to its distance from spot
pub fn distance_map(spot: f64, levels: &[(&'static str, Option<f64>)]) -> BTreeMap<&'static str, LevelDistance> {
    let mut map = BTreeMap::new();
    if spot <= 0.0 {
        return map;
    }
    for &(label, value) in levels {
        let Some(value) = value.filter(|v| *v > 0.0) else {
            continue;
        };
        let distance = (spot - value).abs();
        map.insert(
            label,
            LevelDistance {
                value,
                distance: round_to(distance, 2),
                distance_pct: round_to(distance / spot * 100.0, 2),
                side: if value > spot { Side::Above } else { Side::Below },
            },
        );
    }
    map
}

/// Run the full pipeline for one snapshot
pub fn analyze(snapshot: &MarketSnapshot, params: &AnalysisParams) -> AnalysisReport {
    let chain = &snapshot.chain;
    let spot = chain.spot;
    let dte = chain.dte;
    let closes = snapshot.daily_closes();
    let expiries = expiry_set(snapshot);

    let gex = chain_profile(chain, &params.exposure);
    let pain = max_pain(&chain.calls, &chain.puts);
    let walls = find_oi_walls(&chain.calls, &chain.puts, spot);

    let acf = detect_acf(&snapshot.intraday, &params.acf);
    let flow = chain_flow(chain, &params.flow);
    let phase = detect_phase_transition(&acf.daily_results, &params.phase);

    let channel = extract_channel(&gex.rows, spot, &params.channel);
    let ch_strategy = channel_strategy(&channel, gex.regime, flow.regime, flow.ratio);

    let technicals = compute_technicals(
        &snapshot.ticker,
        &snapshot.daily,
        &snapshot.benchmark,
        &snapshot.benchmark_daily,
        &params.technicals,
    );

    let sizing_vol = SizingVolContext::from_chain(chain, &closes, flow.atm_iv);
    let vol_analysis = compute_vol_analysis(chain, &closes, flow.atm_iv, &expiries, gex.regime, flow.regime);

    let directional = classify_thesis(
        &DirectionalInputs {
            spot,
            dte,
            profile: &gex,
            walls: &walls,
            max_pain: pain.max_pain,
            acf: &acf,
            flow: &flow,
            phase: &phase,
            channel: &channel,
            channel_strategy: &ch_strategy,
            technicals: &technicals,
            vol: &sizing_vol,
        },
        &params.directional,
    );

    let straddle_analysis = analyze_straddles(
        &StraddleInputs {
            chain,
            daily: &snapshot.daily,
            acf: &acf,
            flow: &flow,
            phase: &phase,
            gamma: gex.regime,
            entropy: gex.entropy.regime,
            channel: &channel,
            technicals: &technicals,
            vrp: &vol_analysis.vrp,
            call_wall: walls.call_wall.strike,
            put_wall: walls.put_wall.strike,
            max_pain: pain.max_pain,
        },
        &params.straddle,
    );

    let collision_levels = [
        ("call_wall", walls.call_wall.strike),
        ("put_wall", walls.put_wall.strike),
        ("max_pain", pain.max_pain),
        ("flip_point", gex.flip_point.unwrap_or(0.0)),
        ("abs_gamma_strike", gex.abs_gamma_strike),
        ("channel_floor", channel.floor.unwrap_or(0.0)),
        ("channel_ceiling", channel.ceiling.unwrap_or(0.0)),
    ];
    let collision_times = compute_collision_times(
        spot,
        &collision_levels,
        technicals.atr.atr,
        acf.regime,
        flow.regime,
        dte,
    );

    let scan_iv = if flow.atm_iv > 0.0 { flow.atm_iv } else { SCAN_FALLBACK_IV };
    let expiry_scan = scan_expirations(
        &expiries,
        spot,
        &closes,
        technicals.atr.atr_pct,
        scan_iv,
        chain,
        params.straddle.expiry_scan_max,
    );

    let distances = distance_map(
        spot,
        &[
            ("max_pain", Some(pain.max_pain)),
            ("call_wall", Some(walls.call_wall.strike)),
            ("put_wall", Some(walls.put_wall.strike)),
            ("flip_point", gex.flip_point),
            ("abs_gamma_strike", Some(gex.abs_gamma_strike)),
        ],
    );

    info!(
        "{} @ {:.2} ({} DTE): {:?} / {:?} / {:?}, thesis {:?}, straddle {:?} ({})",
        snapshot.ticker,
        spot,
        dte,
        gex.regime,
        flow.regime,
        acf.regime,
        directional.thesis,
        straddle_analysis.verdict,
        straddle_analysis.score.total
    );

    AnalysisReport {
        ticker: snapshot.ticker.clone(),
        benchmark: snapshot.benchmark.clone(),
        spot,
        expiration: chain.expiration.clone(),
        dte,
        ingest: snapshot.stats,
        gex_regime_label: gex.regime.label(),
        gex_profile: gex,
        max_pain: pain,
        walls,
        channel,
        channel_strategy: ch_strategy,
        flow,
        acf,
        phase,
        vol_analysis,
        technicals,
        directional,
        straddle_analysis,
        expiry_scan,
        collision_times,
        distances,
    }
}

/// Pooled exposure over the selected and supplied expirations
pub fn aggregate(snapshot: &MarketSnapshot, params: &AnalysisParams) -> AggregateGex {
    let expiries = expiry_set(snapshot);
    aggregate_gex(&expiries, snapshot.spot(), &params.exposure)
}
