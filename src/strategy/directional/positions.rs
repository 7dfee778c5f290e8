//! Buy-only position candidates for a thesis
//!
//! Thesis-specific entries first, then the independent channel and
//! charm-drift plays, then a skip entry when there is no edge.

use serde::{Deserialize, Serialize};

use super::bias::Bias;
use super::kelly::{kelly_size, KellySize};
use super::strikes::{atr_max_move, clamp_strike, clamp_target, round_strike, strike_offset};
use super::thesis::Thesis;
use super::wall_break::Confidence;
use crate::domain::OptionSide;
use crate::strategy::levels::{ChannelPlay, EdgeType, GammaChannel};
use crate::strategy::volatility::{IvContext, SizingVolContext, SkewRegime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    Momentum,
    Lottery,
    EarlyMomentum,
    PinApproach,
    WallFade,
    FadeDip,
    FadeRip,
    GexFloorBounce,
    GexCeilingFade,
    CharmDrift,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionAction {
    Buy,
    Wait,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PositionKind,
    pub edge_type: EdgeType,
    pub action: PositionAction,
    /// None for the skip entry
    pub option_type: Option<OptionSide>,
    pub strike: f64,
    pub dte_guidance: String,
    pub sizing: String,
    pub kelly_size: Option<KellySize>,
    pub target: String,
    pub stop: String,
    pub edge: String,
    pub confidence: Confidence,
}

impl Position {
    fn buy(name: impl Into<String>, kind: PositionKind, edge_type: EdgeType, side: OptionSide, strike: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            edge_type,
            action: PositionAction::Buy,
            option_type: Some(side),
            strike,
            dte_guidance: String::new(),
            sizing: String::new(),
            kelly_size: None,
            target: String::new(),
            stop: String::new(),
            edge: String::new(),
            confidence: Confidence::Medium,
        }
    }
}

/// Everything the position builder reads
#[derive(Debug, Clone, Copy)]
pub struct PositionContext<'a> {
    pub thesis: Thesis,
    pub bias: &'a Bias,
    pub spot: f64,
    pub dte: u32,
    /// Raw turbulence ratio
    pub ratio: f64,
    pub mean_acf1: f64,
    pub pct_dampened: f64,
    pub call_wall: f64,
    pub put_wall: f64,
    pub channel: &'a GammaChannel,
    pub channel_play: ChannelPlay,
    pub wall_break_probability: u32,
    pub max_pain: f64,
    pub abs_gamma_strike: f64,
    pub total_charm: f64,
    pub total_vanna: f64,
    pub atr: f64,
    pub atr_pct: f64,
    pub vol: &'a SizingVolContext,
    pub charm_drift_threshold: f64,
    pub charm_drift_max_dte: u32,
}

/// Sizing overrides from the IV bucket: (directional, with-dealer channel)
fn vol_sizing(ctx: IvContext) -> (Option<&'static str>, Option<&'static str>) {
    match ctx {
        IvContext::VeryExpensive => (
            Some("Reduced size: IV is very expensive, consider debit spreads"),
            Some("Moderate: IV elevated even with dealer edge"),
        ),
        IvContext::Expensive => (
            Some("Moderate: IV is elevated, reduce exposure or use spreads"),
            Some("Standard: with-dealer edge offsets some vol cost"),
        ),
        IvContext::Cheap | IvContext::SlightDiscount => (
            Some("Full size: IV is cheap, good environment for naked longs"),
            Some("Full size: cheap IV plus with-dealer edge"),
        ),
        _ => (None, None),
    }
}

fn skew_note(bullish: bool, skew: SkewRegime) -> &'static str {
    match (bullish, skew) {
        (true, SkewRegime::HighPutSkew) => " Calls have a relative vol edge (put skew).",
        (false, SkewRegime::HighPutSkew) => " Puts are expensive (high put skew), consider put debit spreads.",
        (true, SkewRegime::CallSkew | SkewRegime::ExtremeCallSkew) => {
            " Calls are expensive (call skew), consider call debit spreads."
        }
        _ => "",
    }
}

pub fn build_positions(c: &PositionContext) -> Vec<Position> {
    let mut positions = Vec::new();
    let bullish = c.bias.is_bullish();
    let (side, side_label, wall_word) = if bullish {
        (OptionSide::Call, "CALLS", "call")
    } else {
        (OptionSide::Put, "PUTS", "put")
    };
    let wall_target = if bullish { c.call_wall } else { c.put_wall };
    let (iv_hv, vrp) = (c.vol.iv_hv_ratio, c.vol.vrp_context);

    let (offset, offset_note) = strike_offset(c.vol);
    let strike_mult = if bullish { 1.0 + offset } else { 1.0 - offset };
    let (size_adj, size_adj_channel) = vol_sizing(c.vol.iv_context);

    let max_move = atr_max_move(c.atr, c.dte, 1.5);
    let skew = skew_note(bullish, c.vol.skew_regime);
    let mut atr_note = String::new();
    if c.atr > 0.0 {
        atr_note.push_str(&format!(" ATR range: +/-${:.0} over {}d.", max_move, c.dte));
    }
    if !offset_note.is_empty() {
        atr_note.push_str(&format!(" {}.{}", offset_note, skew));
    } else {
        atr_note.push_str(skew);
    }

    let wall_dist_pct = if wall_target != 0.0 && c.spot > 0.0 {
        (wall_target - c.spot).abs() / c.spot * 100.0
    } else {
        5.0
    };
    let wb = c.wall_break_probability as f64;
    let reachable = |level: f64| max_move <= 0.0 || (level - c.spot).abs() <= max_move;
    let atr_multiple = |level: f64| if c.atr > 0.0 { (level - c.spot).abs() / c.atr } else { 0.0 };
    let directional_strike = || round_strike(clamp_strike(c.spot * strike_mult, c.spot, c.atr, c.dte, bullish), c.spot);

    match c.thesis {
        Thesis::MomentumBreakout => {
            let wall_ok = reachable(wall_target);
            let mut target = format!("${:.0} {} wall, acceleration through", wall_target, wall_word);
            if !wall_ok {
                target.push_str(&format!(
                    " (NOTE: wall is {:.1}x ATR away, may need a multi-day trend)",
                    atr_multiple(wall_target)
                ));
            }
            positions.push(Position {
                dte_guidance: if c.dte <= 5 { "5-10 DTE".to_string() } else { format!("{}-{} DTE", c.dte, c.dte + 5) },
                sizing: size_adj.unwrap_or("Full size: flow and ACF both confirm").to_string(),
                kelly_size: Some(kelly_size(wall_dist_pct * 2.0, wb, iv_hv, vrp)),
                target,
                stop: "Trail at 50% of max gain. Cut at -50% of premium.".to_string(),
                edge: format!(
                    "Flow ratio {:.1} (turbulent) with amplified ACF. Walls are accelerators, not ceilings.{}",
                    c.ratio, atr_note
                ),
                confidence: Confidence::High,
                ..Position::buy(
                    format!("BUY {}: confirmed breakout", side_label),
                    PositionKind::Momentum,
                    EdgeType::AgainstDealer,
                    side,
                    directional_strike(),
                )
            });
            if wall_target > 0.0 {
                let lottery = clamp_strike(wall_target, c.spot, c.atr, c.dte.max(7), bullish);
                positions.push(Position {
                    dte_guidance: "7-14 DTE".to_string(),
                    sizing: "Small (0.5-1% of account), lottery ticket".to_string(),
                    target: format!("Wall breaks, gamma cascade beyond ${:.0}", wall_target),
                    stop: "Let ride or expire. Lottery sizing.".to_string(),
                    edge: "Dealers are forced to chase through the wall: mechanical acceleration.".to_string(),
                    confidence: if wall_ok { Confidence::Medium } else { Confidence::Low },
                    ..Position::buy(
                        format!("BUY OTM {}: wall acceleration lottery", side_label),
                        PositionKind::Lottery,
                        EdgeType::AgainstDealer,
                        side,
                        round_strike(lottery, c.spot),
                    )
                });
            }
        }
        Thesis::MomentumEarly => {
            let target = clamp_target(wall_target, c.spot, c.atr, c.dte);
            positions.push(Position {
                dte_guidance: "7-14 DTE".to_string(),
                sizing: size_adj.unwrap_or("Moderate: not fully confirmed yet").to_string(),
                kelly_size: Some(kelly_size(wall_dist_pct * 1.5, wb.min(50.0), iv_hv, vrp)),
                target: format!("${:.0} {} wall", target, wall_word),
                stop: "Cut at -50% if no breakout in 5 days.".to_string(),
                edge: format!("Flow ratio {:.1} says dealers are overwhelmed; the ACF should follow.{}", c.ratio, atr_note),
                ..Position::buy(
                    format!("BUY {}: early momentum positioning", side_label),
                    PositionKind::EarlyMomentum,
                    EdgeType::AgainstDealer,
                    side,
                    directional_strike(),
                )
            });
        }
        Thesis::MomentumTrend => {
            positions.push(Position {
                dte_guidance: "5-10 DTE".to_string(),
                sizing: size_adj.unwrap_or("Standard: ACF confirms the trend").to_string(),
                kelly_size: Some(kelly_size(c.atr_pct * 2.0, 55.0, iv_hv, vrp)),
                target: "Ride until the ACF flips or the move stalls".to_string(),
                stop: "Trail at 40% of max gain. Cut if the trend reverses intraday.".to_string(),
                edge: format!("ACF {:+.3}: moves follow through. Do not fade.{}", c.mean_acf1, atr_note),
                ..Position::buy(
                    format!("BUY {}: ride the trend", side_label),
                    PositionKind::Momentum,
                    EdgeType::AgainstDealer,
                    side,
                    directional_strike(),
                )
            });
        }
        Thesis::ConflictedPin => {
            let wall = c.call_wall;
            let wall_ok = reachable(wall);
            let fade_target = if c.atr > 0.0 {
                round_strike(c.spot - c.atr * 1.5, c.spot)
            } else {
                round_strike(c.spot * 0.985, c.spot)
            };
            let mut target = format!("${:.0} call wall as destination, not breakout", wall);
            if !wall_ok {
                target.push_str(&format!(" (NOTE: {:.1}x ATR away)", atr_multiple(wall)));
            }
            positions.push(Position {
                dte_guidance: "3-7 DTE".to_string(),
                sizing: "Standard".to_string(),
                target,
                stop: "Take profit AT the wall. Do NOT hold through.".to_string(),
                edge: format!("Flow ratio {:.2} (laminar): walls are magnets, not breakout triggers.{}", c.ratio, atr_note),
                confidence: if wall_ok { Confidence::Medium } else { Confidence::Low },
                ..Position::buy(
                    "BUY CALLS: ride TO the gamma wall, not through it",
                    PositionKind::PinApproach,
                    EdgeType::WithDealer,
                    OptionSide::Call,
                    round_strike(c.spot, c.spot),
                )
            });
            if wall > 0.0 {
                positions.push(Position {
                    dte_guidance: "3-7 DTE".to_string(),
                    sizing: "Standard: WAIT for price to reach the wall first".to_string(),
                    target: format!("Wall rejects, pullback to ${:.0}", fade_target),
                    stop: "Quick trade of 1-2 days. Cut if the wall breaks by more than 1%.".to_string(),
                    edge: format!("Wall-break probability only {}%. Fade the touch.", c.wall_break_probability),
                    ..Position::buy(
                        "BUY PUTS at call wall: fade the rejection",
                        PositionKind::WallFade,
                        EdgeType::WithDealer,
                        OptionSide::Put,
                        round_strike(wall, c.spot),
                    )
                });
            }
        }
        Thesis::FadeMoves | Thesis::FadeMild => {
            let fade_offset = if iv_hv > 1.3 { 0.005 } else { 0.01 };
            let strong = c.thesis == Thesis::FadeMoves;
            let confidence = if strong { Confidence::High } else { Confidence::Medium };
            let kelly = kelly_size(c.atr_pct, if strong { 65.0 } else { 55.0 }, iv_hv, vrp);
            let stop = "Take profit at 30-50% gain. Cut at -40%. 1-2 day hold.";
            positions.push(Position {
                dte_guidance: "3-7 DTE".to_string(),
                sizing: size_adj_channel.unwrap_or("Standard: high-frequency setup").to_string(),
                kelly_size: Some(kelly.clone()),
                target: format!("Snap-back to prior close / ${:.0} gamma strike", c.abs_gamma_strike),
                stop: stop.to_string(),
                edge: format!(
                    "ACF {:+.3}: {:.0}% of days are dampened. Moves reverse.{}",
                    c.mean_acf1, c.pct_dampened, atr_note
                ),
                confidence,
                ..Position::buy(
                    "BUY CALLS after a red day (fade the dip)",
                    PositionKind::FadeDip,
                    EdgeType::WithDealer,
                    OptionSide::Call,
                    round_strike(c.spot * (1.0 - fade_offset), c.spot),
                )
            });
            positions.push(Position {
                dte_guidance: "3-7 DTE".to_string(),
                sizing: size_adj_channel.unwrap_or("Standard").to_string(),
                kelly_size: Some(kelly),
                target: format!("Pullback to prior close / ${:.0} gamma strike", c.abs_gamma_strike),
                stop: stop.to_string(),
                edge: format!(
                    "Dampened regime means mean reversion: yesterday's winners are today's losers.{}",
                    atr_note
                ),
                confidence,
                ..Position::buy(
                    "BUY PUTS after a green day (fade the rip)",
                    PositionKind::FadeRip,
                    EdgeType::WithDealer,
                    OptionSide::Put,
                    round_strike(c.spot * (1.0 + fade_offset), c.spot),
                )
            });
        }
        Thesis::Neutral => {}
    }

    // With-dealer channel plays are independent of the thesis
    let channel_target = |other: Option<f64>, bound: f64| {
        let mid = other.map_or(c.spot, |o| (bound + o) / 2.0);
        let mid = if c.atr > 0.0 { clamp_target(mid, c.spot, c.atr, c.dte) } else { mid };
        let move_pct = if c.spot > 0.0 { (mid - c.spot).abs() / c.spot * 100.0 } else { 1.0 };
        (mid, kelly_size(move_pct, 70.0, iv_hv, vrp))
    };
    if let (ChannelPlay::GexFloorBounce, Some(floor)) = (c.channel_play, c.channel.floor) {
        let (mid, kelly) = channel_target(c.channel.ceiling, floor);
        positions.push(Position {
            dte_guidance: "1-5 DTE".to_string(),
            sizing: size_adj_channel.unwrap_or("Full size: WITH dealer, high probability").to_string(),
            kelly_size: Some(kelly),
            target: format!("Mid-channel: ${:.0}", mid),
            stop: "Stop if the floor breaks by more than 1%. Take profit at mid-channel.".to_string(),
            edge: format!("Long-gamma dealers BUY dips at ${:.0}. You are alongside them.{}", floor, atr_note),
            confidence: Confidence::High,
            ..Position::buy(
                format!("BUY CALLS: GEX floor bounce at ${:.0}", floor),
                PositionKind::GexFloorBounce,
                EdgeType::WithDealer,
                OptionSide::Call,
                round_strike(c.spot, c.spot),
            )
        });
    }
    if let (ChannelPlay::GexCeilingFade, Some(ceiling)) = (c.channel_play, c.channel.ceiling) {
        let (mid, kelly) = channel_target(c.channel.floor, ceiling);
        positions.push(Position {
            dte_guidance: "1-5 DTE".to_string(),
            sizing: size_adj_channel.unwrap_or("Full size: WITH dealer, high probability").to_string(),
            kelly_size: Some(kelly),
            target: format!("Mid-channel: ${:.0}", mid),
            stop: "Stop if the ceiling breaks by more than 1%. Take profit at mid-channel.".to_string(),
            edge: format!("Long-gamma dealers SELL rips at ${:.0}. You are alongside them.{}", ceiling, atr_note),
            confidence: Confidence::High,
            ..Position::buy(
                format!("BUY PUTS: GEX ceiling fade at ${:.0}", ceiling),
                PositionKind::GexCeilingFade,
                EdgeType::WithDealer,
                OptionSide::Put,
                round_strike(c.spot, c.spot),
            )
        });
    }

    if c.dte <= c.charm_drift_max_dte && c.total_charm.abs() > c.charm_drift_threshold {
        let above = c.spot > c.max_pain;
        let (drift_side, drift_label) = if above { (OptionSide::Put, "PUTS") } else { (OptionSide::Call, "CALLS") };
        let away_pct = if c.spot > 0.0 { (c.spot - c.max_pain).abs() / c.spot * 100.0 } else { 0.0 };
        positions.push(Position {
            dte_guidance: "0-3 DTE".to_string(),
            sizing: "Small: timing-sensitive play".to_string(),
            target: format!("${:.0} max pain ({:.1}% away)", c.max_pain, away_pct),
            stop: "Close by end of day before expiry.".to_string(),
            edge: format!(
                "Charm {:.0}, vanna {:.0}: mechanical drift toward the dealer pin.",
                c.total_charm, c.total_vanna
            ),
            ..Position::buy(
                format!("BUY {}: charm/vanna drift toward ${:.0}", drift_label, c.max_pain),
                PositionKind::CharmDrift,
                EdgeType::WithDealer,
                drift_side,
                round_strike(c.spot, c.spot),
            )
        });
    }

    if c.thesis == Thesis::Neutral {
        positions.push(Position {
            name: "NO POSITION: wait for signal".to_string(),
            kind: PositionKind::Skip,
            edge_type: EdgeType::Neutral,
            action: PositionAction::Wait,
            option_type: None,
            strike: 0.0,
            dte_guidance: String::new(),
            sizing: "Flat".to_string(),
            kelly_size: None,
            target: "Wait for the ACF to move past +/-0.05".to_string(),
            stop: String::new(),
            edge: "Staying flat when there is no edge is the edge.".to_string(),
            confidence: Confidence::NotApplicable,
        });
    }

    positions
}
