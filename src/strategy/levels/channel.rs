//! Gamma Channel
//!
//! Floor (dealers buy dips) and ceiling (dealers sell rips) bracketing spot,
//! taken from strikes with significant positive net GEX. When the first pass
//! produces a pin zone narrower than `min_width_pct`, the bounds are walked
//! outward to the next significant strikes.

use serde::{Deserialize, Serialize};

use crate::strategy::exposure::{ExposureRow, GammaRegime};
use crate::strategy::numeric::round_to;
use crate::strategy::regime::FlowRegime;

/// Channel extraction thresholds, as fractions of max |net GEX|
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelParams {
    /// Positive GEX needed to qualify as a floor (default: 0.15)
    pub floor_threshold: f64,
    /// Positive GEX needed to qualify as a ceiling (default: 0.15)
    pub ceiling_threshold: f64,
    /// |GEX| needed by the fallback bound search (default: 0.10)
    pub fallback_threshold: f64,
    /// |GEX| needed by the widening walk (default: 0.05)
    pub widen_threshold: f64,
    /// Channels narrower than this (% of spot) are widened (default: 1.0)
    pub min_width_pct: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            floor_threshold: 0.15,
            ceiling_threshold: 0.15,
            fallback_threshold: 0.10,
            widen_threshold: 0.05,
            min_width_pct: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GammaChannel {
    pub floor: Option<f64>,
    pub ceiling: Option<f64>,
    pub floor_distance_pct: Option<f64>,
    pub ceiling_distance_pct: Option<f64>,
    pub width_pct: Option<f64>,
    /// 0.0 at the floor, 1.0 at the ceiling
    pub channel_position: Option<f64>,
    pub floor_gex: f64,
    pub ceiling_gex: f64,
    pub degenerate: bool,
}

impl GammaChannel {
    pub fn is_complete(&self) -> bool {
        self.floor.is_some() && self.ceiling.is_some() && self.width_pct.is_some()
    }

    /// Midpoint of the band, if both bounds exist
    pub fn midpoint(&self) -> Option<f64> {
        Some((self.floor? + self.ceiling?) / 2.0)
    }
}

fn net_at(rows: &[ExposureRow], strike: f64) -> f64 {
    rows.iter()
        .find(|r| r.strike == strike)
        .map(|r| r.net_gex)
        .unwrap_or(0.0)
}

/// Walk outward from the initial bounds until each side sits at least
/// half the minimum width away from spot
fn widen(rows: &[ExposureRow], spot: f64, floor: f64, ceiling: f64, max_gex: f64, params: &ChannelParams) -> (f64, f64) {
    let target_half = (params.min_width_pct / 100.0) * spot / 2.0;
    let significant = |r: &&ExposureRow| r.net_gex.abs() > max_gex * params.widen_threshold;

    // Rows are ascending by strike
    let mut new_floor = floor;
    for r in rows.iter().rev().filter(|r| r.strike < floor).filter(significant) {
        new_floor = r.strike;
        if spot - new_floor >= target_half {
            break;
        }
    }

    let mut new_ceiling = ceiling;
    for r in rows.iter().filter(|r| r.strike > ceiling).filter(significant) {
        new_ceiling = r.strike;
        if new_ceiling - spot >= target_half {
            break;
        }
    }

    (new_floor, new_ceiling)
}

/// Extract the channel from an ascending exposure ladder
pub fn extract_channel(rows: &[ExposureRow], spot: f64, params: &ChannelParams) -> GammaChannel {
    if rows.is_empty() || spot <= 0.0 {
        return GammaChannel::default();
    }
    let max_gex = rows.iter().map(|r| r.net_gex.abs()).fold(0.0, f64::max);
    if max_gex <= 0.0 {
        return GammaChannel::default();
    }

    let mut floor = rows
        .iter()
        .filter(|r| r.strike < spot && r.net_gex > max_gex * params.floor_threshold)
        .map(|r| r.strike)
        .fold(None, |acc: Option<f64>, k| Some(acc.map_or(k, |a| a.max(k))));
    let mut ceiling = rows
        .iter()
        .filter(|r| r.strike > spot && r.net_gex > max_gex * params.ceiling_threshold)
        .map(|r| r.strike)
        .fold(None, |acc: Option<f64>, k| Some(acc.map_or(k, |a| a.min(k))));

    let fallback = max_gex * params.fallback_threshold;
    if floor.is_none() {
        // Strongest |GEX| below spot; first encountered wins ties
        floor = rows
            .iter()
            .filter(|r| r.strike < spot && r.net_gex.abs() > fallback)
            .fold(None, |best: Option<&ExposureRow>, r| match best {
                Some(b) if b.net_gex.abs() >= r.net_gex.abs() => Some(b),
                _ => Some(r),
            })
            .map(|r| r.strike);
    }
    if ceiling.is_none() {
        // Weakest qualifying |GEX| above spot
        ceiling = rows
            .iter()
            .filter(|r| r.strike > spot && r.net_gex.abs() > fallback)
            .fold(None, |best: Option<&ExposureRow>, r| match best {
                Some(b) if b.net_gex.abs() <= r.net_gex.abs() => Some(b),
                _ => Some(r),
            })
            .map(|r| r.strike);
    }

    let mut degenerate = false;
    if let (Some(f), Some(c)) = (floor, ceiling) {
        if 100.0 * (c - f) / spot < params.min_width_pct {
            degenerate = true;
            let (wf, wc) = widen(rows, spot, f, c, max_gex, params);
            floor = Some(wf);
            ceiling = Some(wc);
        }
    }

    let (width_pct, channel_position) = match (floor, ceiling) {
        (Some(f), Some(c)) => (
            Some(round_to(100.0 * (c - f) / spot, 2)),
            (c > f).then(|| round_to((spot - f) / (c - f), 3)),
        ),
        _ => (None, None),
    };

    GammaChannel {
        floor,
        ceiling,
        floor_distance_pct: floor.map(|f| round_to(100.0 * (spot - f) / spot, 2)),
        ceiling_distance_pct: ceiling.map(|c| round_to(100.0 * (c - spot) / spot, 2)),
        width_pct,
        channel_position,
        floor_gex: floor.map(|f| round_to(net_at(rows, f), 2)).unwrap_or(0.0),
        ceiling_gex: ceiling.map(|c| round_to(net_at(rows, c), 2)).unwrap_or(0.0),
        degenerate,
    }
}

/// Channel-based play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelPlay {
    NoChannel,
    GexFloorBounce,
    GexCeilingFade,
    ChannelRange,
    BreakoutChannel,
    TransitionWatch,
    Wait,
}

/// Whether a play trades with or against dealer hedging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    WithDealer,
    AgainstDealer,
    Transitional,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStrategy {
    pub strategy: ChannelPlay,
    pub edge_type: EdgeType,
    pub notes: Vec<String>,
}

pub fn channel_strategy(channel: &GammaChannel, gamma: GammaRegime, flow: FlowRegime, ratio: f64) -> ChannelStrategy {
    if !channel.is_complete() {
        return ChannelStrategy {
            strategy: ChannelPlay::NoChannel,
            edge_type: EdgeType::Neutral,
            notes: Vec::new(),
        };
    }

    let mut notes = Vec::new();
    if channel.degenerate {
        notes.push("Channel was widened: original bounds were <1% apart (pin zone)".to_string());
    }

    let laminar = flow == FlowRegime::Laminar || ratio < 0.7;
    let pos = channel.channel_position;

    let (strategy, edge_type) = if gamma.is_positive() && laminar {
        match pos {
            Some(p) if p < 0.25 => {
                notes.push("Price near floor: dealers will buy the dip here".to_string());
                notes.push("BUY CALLS targeting mid-channel".to_string());
                (ChannelPlay::GexFloorBounce, EdgeType::WithDealer)
            }
            Some(p) if p > 0.75 => {
                notes.push("Price near ceiling: dealers will sell the rip here".to_string());
                notes.push("BUY PUTS targeting mid-channel".to_string());
                (ChannelPlay::GexCeilingFade, EdgeType::WithDealer)
            }
            _ => {
                notes.push("Mid-channel in long gamma. Fade moves to bounds.".to_string());
                (ChannelPlay::ChannelRange, EdgeType::WithDealer)
            }
        }
    } else if flow == FlowRegime::Turbulent || ratio > 1.0 {
        notes.push("Dealers overwhelmed: channel bounds become breakout triggers".to_string());
        (ChannelPlay::BreakoutChannel, EdgeType::AgainstDealer)
    } else if flow == FlowRegime::Transitional {
        notes.push("Flow ratio in the transition zone: watch for a regime flip".to_string());
        (ChannelPlay::TransitionWatch, EdgeType::Transitional)
    } else {
        (ChannelPlay::Wait, EdgeType::Neutral)
    };

    ChannelStrategy { strategy, edge_type, notes }
}
