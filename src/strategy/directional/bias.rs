//! Directional bias for a thesis, with the technical overlay

use serde::{Deserialize, Serialize};

use super::thesis::Thesis;
use crate::strategy::technicals::TechBias;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    fn of(bullish: bool) -> Self {
        if bullish {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bias {
    pub direction: Direction,
    pub strength: Strength,
    pub style: String,
    pub action: String,
    pub description: String,
}

impl Bias {
    fn new(direction: Direction, strength: Strength, style: &str, action: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            direction,
            strength,
            style: style.to_string(),
            action: action.into(),
            description: description.into(),
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.direction == Direction::Bullish
    }
}

/// Inputs to the bias decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasInputs {
    pub spot: f64,
    /// GEX flip point, spot when none was found
    pub flip_point: f64,
    pub max_pain: f64,
    pub channel_position: Option<f64>,
    pub total_charm: f64,
    pub dte: u32,
    pub tech_score: i32,
    pub ma_alignment: i32,
    pub charm_drift_threshold: f64,
    pub charm_drift_max_dte: u32,
}

impl BiasInputs {
    /// Strong technicals (trend score ±2, else full MA alignment) override the GEX direction
    fn resolve(&self, gex_direction: Direction) -> Direction {
        if self.tech_score.abs() >= 2 {
            Direction::of(self.tech_score >= 2)
        } else if self.ma_alignment.abs() >= 3 {
            Direction::of(self.ma_alignment >= 3)
        } else {
            gex_direction
        }
    }

    fn strong_technicals(&self) -> bool {
        self.tech_score.abs() >= 2 || self.ma_alignment.abs() >= 3
    }
}

pub fn compute_bias(thesis: Thesis, b: &BiasInputs) -> Bias {
    if thesis.is_momentum() {
        let direction = b.resolve(Direction::of(b.spot > b.flip_point));
        let strength = if thesis == Thesis::MomentumBreakout {
            Strength::Strong
        } else {
            Strength::Moderate
        };
        let action = if direction == Direction::Bullish { "BUY CALLS" } else { "BUY PUTS" };
        return Bias::new(direction, strength, "RIDE MOMENTUM", action, "Moves follow through. Do not fade, ride the trend.");
    }

    if thesis.is_fade() {
        let (direction, description) = if b.strong_technicals() {
            (
                Direction::of(b.tech_score >= 1 || b.ma_alignment >= 2),
                "Dealers dampen moves. Fade intraday, but the structural lean follows the MAs.",
            )
        } else {
            (
                Direction::of(b.spot < b.max_pain),
                "Dealers dampen moves. Buy the opposite of today's move, quick in and out.",
            )
        };
        let strength = if thesis == Thesis::FadeMoves {
            Strength::Strong
        } else {
            Strength::Moderate
        };
        return Bias::new(direction, strength, "FADE & MEAN-REVERT", "BUY CALLS on dips, BUY PUTS on rips", description);
    }

    if thesis == Thesis::ConflictedPin {
        return Bias::new(
            Direction::Neutral,
            Strength::Moderate,
            "PIN & FADE AT WALLS",
            "BUY toward walls, SELL at walls",
            "Walls will hold with flow below 1. Trade TO walls, not through them, and fade the touch.",
        );
    }

    match b.channel_position {
        Some(pos) if pos < 0.25 => {
            return Bias::new(
                Direction::Bullish,
                Strength::Weak,
                "CHANNEL BOUNCE",
                "BUY CALLS near floor",
                "No strong regime signal but price is near the GEX floor. Lean bullish.",
            )
        }
        Some(pos) if pos > 0.75 => {
            return Bias::new(
                Direction::Bearish,
                Strength::Weak,
                "CHANNEL FADE",
                "BUY PUTS near ceiling",
                "No strong regime signal but price is near the GEX ceiling. Lean bearish.",
            )
        }
        _ => {}
    }

    if b.dte <= b.charm_drift_max_dte && b.total_charm < -b.charm_drift_threshold {
        let above = b.spot > b.max_pain;
        return Bias::new(
            Direction::of(!above),
            Strength::Moderate,
            "DRIFT TOWARD MAX PAIN",
            format!("BUY {}: charm drift", if above { "PUTS" } else { "CALLS" }),
            format!("Charm flows pulling price toward ${:.0}. Short-duration play.", b.max_pain),
        );
    }

    Bias::new(
        Direction::Neutral,
        Strength::None,
        "NO CLEAR EDGE",
        "WAIT or small lottery",
        "No confirmed regime. Stay flat or take tiny positions.",
    )
}

/// Upgrade conviction when technicals agree, downgrade when they conflict.
///
/// Returns `(confirms, conflicts)`.
pub fn apply_tech_overlay(bias: &mut Bias, tech: TechBias) -> (bool, bool) {
    let tech_bull = matches!(tech, TechBias::Bullish | TechBias::LeanBullish);
    let tech_bear = matches!(tech, TechBias::Bearish | TechBias::LeanBearish);
    let (confirms, conflicts) = match bias.direction {
        Direction::Bullish => (tech_bull, tech_bear),
        Direction::Bearish => (tech_bear, tech_bull),
        Direction::Neutral => (false, false),
    };
    bias.strength = match (bias.strength, confirms, conflicts) {
        (Strength::Moderate, true, _) => Strength::Strong,
        (Strength::Strong, _, true) => Strength::Moderate,
        (Strength::Moderate, _, true) => Strength::Weak,
        (s, _, _) => s,
    };
    (confirms, conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(spot: f64, flip: f64, score: i32, alignment: i32) -> BiasInputs {
        BiasInputs {
            spot,
            flip_point: flip,
            max_pain: 100.0,
            channel_position: None,
            total_charm: 0.0,
            dte: 10,
            tech_score: score,
            ma_alignment: alignment,
            charm_drift_threshold: 10_000.0,
            charm_drift_max_dte: 5,
        }
    }

    #[test]
    fn test_momentum_follows_flip() {
        let bias = compute_bias(Thesis::MomentumBreakout, &inputs(105.0, 100.0, 0, 0));
        assert_eq!(bias.direction, Direction::Bullish);
        assert_eq!(bias.strength, Strength::Strong);
        let bias = compute_bias(Thesis::MomentumEarly, &inputs(95.0, 100.0, 0, 0));
        assert_eq!(bias.direction, Direction::Bearish);
        assert_eq!(bias.strength, Strength::Moderate);
    }

    #[test]
    fn test_strong_technicals_override_flip() {
        let bias = compute_bias(Thesis::MomentumTrend, &inputs(95.0, 100.0, 2, 0));
        assert_eq!(bias.direction, Direction::Bullish);
        let bias = compute_bias(Thesis::MomentumTrend, &inputs(105.0, 100.0, 0, -3));
        assert_eq!(bias.direction, Direction::Bearish);
    }

    #[test]
    fn test_fade_uses_max_pain_without_technicals() {
        let bias = compute_bias(Thesis::FadeMoves, &inputs(95.0, 100.0, 1, 1));
        assert_eq!(bias.direction, Direction::Bullish);
        assert_eq!(bias.strength, Strength::Strong);
        let bias = compute_bias(Thesis::FadeMild, &inputs(105.0, 100.0, 0, 0));
        assert_eq!(bias.direction, Direction::Bearish);
    }

    #[test]
    fn test_residual_channel_and_drift() {
        let mut b = inputs(100.0, 100.0, 0, 0);
        b.channel_position = Some(0.1);
        assert_eq!(compute_bias(Thesis::Neutral, &b).strength, Strength::Weak);

        let mut b = inputs(104.0, 100.0, 0, 0);
        b.dte = 3;
        b.total_charm = -20_000.0;
        let drift = compute_bias(Thesis::Neutral, &b);
        assert_eq!(drift.direction, Direction::Bearish);
        assert_eq!(drift.style, "DRIFT TOWARD MAX PAIN");

        let flat = compute_bias(Thesis::Neutral, &inputs(100.0, 100.0, 0, 0));
        assert_eq!(flat.direction, Direction::Neutral);
        assert_eq!(flat.strength, Strength::None);
    }

    #[test]
    fn test_overlay_upgrades_and_downgrades() {
        let mut bias = compute_bias(Thesis::MomentumEarly, &inputs(105.0, 100.0, 0, 0));
        assert_eq!(apply_tech_overlay(&mut bias, TechBias::LeanBullish), (true, false));
        assert_eq!(bias.strength, Strength::Strong);

        let mut bias = compute_bias(Thesis::MomentumBreakout, &inputs(105.0, 100.0, 0, 0));
        assert_eq!(apply_tech_overlay(&mut bias, TechBias::Bearish), (false, true));
        assert_eq!(bias.strength, Strength::Moderate);

        let mut bias = compute_bias(Thesis::ConflictedPin, &inputs(100.0, 100.0, 0, 0));
        assert_eq!(apply_tech_overlay(&mut bias, TechBias::Bullish), (false, false));
        assert_eq!(bias.strength, Strength::Moderate);
    }
}
