//! Directional Thesis Engine
//!
//! Fuses the flow ratio, ACF regime, gamma channel, dealer levels, volatility
//! context and technical structure into buy-only guidance:
//! - a thesis from an ordered rule list (`thesis`)
//! - a directional bias with a technical overlay (`bias`)
//! - position candidates with Kelly sizing (`positions`, `kelly`)
//! - per-level expectations (`level_actions`)
//! - a wall-break probability (`wall_break`)

pub mod bias;
pub mod collision;
pub mod kelly;
pub mod level_actions;
pub mod positions;
pub mod strikes;
pub mod thesis;
pub mod wall_break;

pub use bias::{apply_tech_overlay, compute_bias, Bias, BiasInputs, Direction, Strength};
pub use collision::{
    collision_probability, compute_collision_times, regime_multiplier, CollisionLabel, CollisionTime, Urgency,
};
pub use kelly::{kelly_size, KellySize, MAX_SIZE_PCT, MIN_SIZE_PCT};
pub use level_actions::{build_level_actions, KeyLevels, LevelAction, LevelKind, Side};
pub use positions::{build_positions, Position, PositionAction, PositionContext, PositionKind};
pub use strikes::{atr_max_move, clamp_strike, clamp_target, round_strike, strike_increment, strike_offset};
pub use thesis::{avoid_list, momentum_confirmed, select_thesis, Thesis, ThesisSignals, THESIS_RULES};
pub use wall_break::{estimate_wall_break, Confidence, Vote, WallBreak, WallBreakInputs};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::exposure::{EntropyRegime, GammaRegime, GexProfile};
use super::levels::{ChannelStrategy, GammaChannel, OiWalls};
use super::numeric::round_to;
use super::regime::{AcfReading, ExcitationRegime, FlowReading, PhaseReading};
use super::technicals::{MaAlignment, RsLabel, TechBias, Technicals, TrendLabel, VwapContext, BETA_FLOOR};
use super::volatility::SizingVolContext;

/// Thesis engine thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalParams {
    /// %amplified sessions that count as net momentum (default: 13.0)
    pub momentum_amplified_pct: f64,
    /// Mean lag-1 ACF treated as momentum (default: 0.05)
    pub acf_momentum: f64,
    /// Mean lag-1 ACF below which fades are strong (default: -0.10)
    pub fade_strong_acf: f64,
    /// Effective ratio below which amplified sessions pin at the walls (default: 0.7)
    pub pin_ratio: f64,
    /// Effective ratio floor under critical entropy with transitional flow (default: 1.05)
    pub critical_entropy_ratio: f64,
    /// |charm| needed for the drift play (default: 10000)
    pub charm_drift_threshold: f64,
    /// Longest DTE for the drift play (default: 5)
    pub charm_drift_max_dte: u32,
}

impl Default for DirectionalParams {
    fn default() -> Self {
        Self {
            momentum_amplified_pct: 13.0,
            acf_momentum: 0.05,
            fade_strong_acf: -0.10,
            pin_ratio: 0.7,
            critical_entropy_ratio: 1.05,
            charm_drift_threshold: 10_000.0,
            charm_drift_max_dte: 5,
        }
    }
}

/// Coarse ATM IV level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IvLevel {
    High,
    Moderate,
    Low,
    #[serde(rename = "N/A")]
    Unknown,
}

impl IvLevel {
    /// From a decimal IV
    pub fn from_iv(atm_iv: f64) -> Self {
        if atm_iv > 0.60 {
            Self::High
        } else if atm_iv > 0.35 {
            Self::Moderate
        } else if atm_iv > 0.0 {
            Self::Low
        } else {
            Self::Unknown
        }
    }
}

/// Technical summary attached to the thesis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechContext {
    pub confirms_thesis: bool,
    pub conflicts_thesis: bool,
    pub trend_label: TrendLabel,
    pub trend_desc: String,
    pub tech_bias: TechBias,
    pub ma_alignment: MaAlignment,
    pub rs_label: RsLabel,
    pub rs_desc: String,
    pub atr_pct: f64,
    pub vwap: VwapContext,
    pub vwap_desc: String,
    pub vwap_level: Option<f64>,
    pub beta: f64,
    pub beta_adj_factor: f64,
    pub ratio_beta_adj: f64,
    pub entropy_regime: EntropyRegime,
    pub sei: f64,
    pub sei_regime: ExcitationRegime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalReading {
    pub thesis: Thesis,
    pub thesis_label: String,
    pub bias: Bias,
    pub positions: Vec<Position>,
    pub level_actions: Vec<LevelAction>,
    pub wall_break: WallBreak,
    pub avoid: Vec<String>,
    pub iv_context: IvLevel,
    /// Percent, one decimal
    pub atm_iv: f64,
    pub tech_context: TechContext,
}

/// Everything upstream of the thesis engine
#[derive(Debug, Clone, Copy)]
pub struct DirectionalInputs<'a> {
    pub spot: f64,
    pub dte: u32,
    pub profile: &'a GexProfile,
    pub walls: &'a OiWalls,
    pub max_pain: f64,
    pub acf: &'a AcfReading,
    pub flow: &'a FlowReading,
    pub phase: &'a PhaseReading,
    pub channel: &'a GammaChannel,
    pub channel_strategy: &'a ChannelStrategy,
    pub technicals: &'a Technicals,
    pub vol: &'a SizingVolContext,
}

pub fn classify_thesis(inp: &DirectionalInputs, params: &DirectionalParams) -> DirectionalReading {
    let spot = inp.spot;
    let tech = inp.technicals;
    let gamma: GammaRegime = inp.profile.regime;
    let entropy = inp.profile.entropy.regime;
    let sei = &inp.acf.self_excitation;

    let beta = tech.relative_strength.beta_60d;
    let beta_adj = 1.0 / beta.max(BETA_FLOOR);
    let ratio_beta_adj = inp.flow.ratio * beta_adj;
    let atr = tech.atr.atr;
    let atr_pct = tech.atr.atr_pct;
    let call_wall = inp.walls.call_wall.strike;
    let put_wall = inp.walls.put_wall.strike;

    let wall_break = estimate_wall_break(&WallBreakInputs {
        ratio: inp.flow.ratio,
        beta_adj,
        mean_acf1: inp.acf.mean_acf1,
        pct_amplified: inp.acf.pct_amplified,
        pct_dampened: inp.acf.pct_dampened,
        phase: inp.phase.regime,
        sei: sei.sei,
        entropy,
        gamma,
        spot,
        call_wall,
        put_wall,
        atr,
        dte: inp.dte,
    });

    let signals = ThesisSignals::new(inp.acf, ratio_beta_adj, inp.flow.regime, entropy, params);
    let thesis = select_thesis(&signals);

    let mut bias = compute_bias(
        thesis,
        &BiasInputs {
            spot,
            flip_point: inp.profile.flip_point.unwrap_or(spot),
            max_pain: inp.max_pain,
            channel_position: inp.channel.channel_position,
            total_charm: inp.profile.total_charm,
            dte: inp.dte,
            tech_score: tech.trend.trend_score,
            ma_alignment: tech.moving_averages.alignment,
            charm_drift_threshold: params.charm_drift_threshold,
            charm_drift_max_dte: params.charm_drift_max_dte,
        },
    );
    let (confirms, conflicts) = apply_tech_overlay(&mut bias, tech.trend.tech_bias);

    let positions = build_positions(&PositionContext {
        thesis,
        bias: &bias,
        spot,
        dte: inp.dte,
        ratio: inp.flow.ratio,
        mean_acf1: inp.acf.mean_acf1,
        pct_dampened: inp.acf.pct_dampened,
        call_wall,
        put_wall,
        channel: inp.channel,
        channel_play: inp.channel_strategy.strategy,
        wall_break_probability: wall_break.probability,
        max_pain: inp.max_pain,
        abs_gamma_strike: inp.profile.abs_gamma_strike,
        total_charm: inp.profile.total_charm,
        total_vanna: inp.profile.total_vanna,
        atr,
        atr_pct,
        vol: inp.vol,
        charm_drift_threshold: params.charm_drift_threshold,
        charm_drift_max_dte: params.charm_drift_max_dte,
    });

    let vwap_level = tech.vwap_20d();
    let level_actions = build_level_actions(
        spot,
        inp.flow.regime,
        wall_break.probability,
        &KeyLevels {
            max_pain: inp.max_pain,
            call_wall,
            put_wall,
            flip_point: inp.profile.flip_point,
            abs_gamma_strike: inp.profile.abs_gamma_strike,
            channel_floor: inp.channel.floor,
            channel_ceiling: inp.channel.ceiling,
            vwap: vwap_level,
        },
        atr,
        inp.dte,
    );

    debug!(
        "Thesis {:?} ({:?} {:?}), ratio {:.2} beta-adj {:.2}, wall break {}%",
        thesis, bias.direction, bias.strength, inp.flow.ratio, ratio_beta_adj, wall_break.probability
    );

    let atm_iv = inp.flow.atm_iv;
    DirectionalReading {
        thesis,
        thesis_label: thesis.label().to_string(),
        avoid: avoid_list(thesis, inp.phase.regime),
        iv_context: IvLevel::from_iv(atm_iv),
        atm_iv: if atm_iv > 0.0 { round_to(atm_iv * 100.0, 1) } else { 0.0 },
        tech_context: TechContext {
            confirms_thesis: confirms,
            conflicts_thesis: conflicts,
            trend_label: tech.trend.trend_label,
            trend_desc: tech.trend.trend_desc.clone(),
            tech_bias: tech.trend.tech_bias,
            ma_alignment: tech.moving_averages.alignment_label,
            rs_label: tech.relative_strength.rs_label,
            rs_desc: tech.relative_strength.rs_desc.clone(),
            atr_pct,
            vwap: tech.vwap.context,
            vwap_desc: tech.vwap.context_desc.clone(),
            vwap_level,
            beta: round_to(beta, 2),
            beta_adj_factor: round_to(beta_adj, 2),
            ratio_beta_adj: round_to(ratio_beta_adj, 2),
            entropy_regime: entropy,
            sei: round_to(sei.sei, 3),
            sei_regime: sei.regime,
        },
        bias,
        positions,
        level_actions,
        wall_break,
    }
}
