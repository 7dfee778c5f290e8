//! Wall-break probability and signal votes

use serde::{Deserialize, Serialize};

use super::collision::collision_probability;
use crate::strategy::exposure::{EntropyRegime, GammaRegime};
use crate::strategy::numeric::round_to;
use crate::strategy::regime::PhaseRegime;

const BASE_PROBABILITY: f64 = 15.0;
/// Long dealer gamma dampens more than short gamma amplifies
const POSITIVE_GAMMA_PENALTY: f64 = -12.0;
const NEGATIVE_GAMMA_BOOST: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vote {
    Break,
    Hold,
}

impl Vote {
    fn of(breaks: bool) -> Self {
        if breaks {
            Self::Break
        } else {
            Self::Hold
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[serde(rename = "N/A")]
    NotApplicable,
}

/// Signals feeding the estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallBreakInputs {
    pub ratio: f64,
    pub beta_adj: f64,
    pub mean_acf1: f64,
    pub pct_amplified: f64,
    pub pct_dampened: f64,
    pub phase: PhaseRegime,
    pub sei: f64,
    pub entropy: EntropyRegime,
    pub gamma: GammaRegime,
    pub spot: f64,
    pub call_wall: f64,
    pub put_wall: f64,
    pub atr: f64,
    pub dte: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallBreak {
    /// Percent, 5..=95
    pub probability: u32,
    pub confidence: Confidence,
    pub explanation: String,
    pub flow_says: Vote,
    pub acf_says: Vote,
    pub sei_says: Vote,
    pub gamma_asymmetry: f64,
    pub collision_prob_call_wall: f64,
    pub collision_prob_put_wall: f64,
    pub beta_adj_factor: f64,
    pub ratio_beta_adj: f64,
}

fn ratio_bonus(ratio_adj: f64) -> f64 {
    if ratio_adj > 2.0 {
        45.0
    } else if ratio_adj > 1.0 {
        30.0
    } else if ratio_adj > 0.7 {
        15.0
    } else if ratio_adj > 0.3 {
        5.0
    } else {
        0.0
    }
}

fn acf_term(acf1: f64) -> f64 {
    if acf1 > 0.10 {
        10.0
    } else if acf1 > 0.05 {
        5.0
    } else if acf1 < -0.15 {
        -10.0
    } else if acf1 < -0.05 {
        -5.0
    } else {
        0.0
    }
}

pub fn estimate_wall_break(w: &WallBreakInputs) -> WallBreak {
    let ratio_adj = w.ratio * w.beta_adj;
    let gamma_asymmetry = if w.gamma.is_positive() {
        POSITIVE_GAMMA_PENALTY
    } else {
        NEGATIVE_GAMMA_BOOST
    };

    let mut prob = BASE_PROBABILITY + ratio_bonus(ratio_adj) + gamma_asymmetry + acf_term(w.mean_acf1);
    prob += match w.phase {
        PhaseRegime::Turbulent => 10.0,
        PhaseRegime::Approaching => 5.0,
        _ => 0.0,
    };
    if w.sei > 150.0 {
        prob += 8.0;
    } else if w.sei > 80.0 {
        prob += 4.0;
    }
    prob += match w.entropy {
        EntropyRegime::Critical => 10.0,
        EntropyRegime::Approaching => 5.0,
        _ => 0.0,
    };

    // Scale by the odds of actually reaching the nearer wall
    let reach = |strike: f64| {
        if strike > 0.0 && w.spot > 0.0 {
            collision_probability(w.spot, strike, w.atr, w.dte)
        } else {
            0.5
        }
    };
    let p_call = reach(w.call_wall);
    let p_put = reach(w.put_wall);
    let p_nearest = p_call.max(p_put);
    if p_nearest > 0.05 && p_nearest < 0.95 {
        let odds = p_nearest / (1.0 - p_nearest);
        prob *= (1.0 + odds.ln_1p()) / 2.0;
    }
    let prob = prob.clamp(5.0, 95.0);

    let flow_says = Vote::of(ratio_adj > 1.0);
    let acf_says = Vote::of((w.pct_amplified > w.pct_dampened && w.mean_acf1 > 0.0) || w.mean_acf1 > 0.10);
    let sei_says = Vote::of(w.sei > 150.0);
    let votes = [flow_says, acf_says, sei_says];
    let breaks = votes.iter().filter(|v| **v == Vote::Break).count();
    let holds = votes.len() - breaks;

    let (confidence, explanation) = if breaks >= 2 && flow_says == Vote::Break {
        let partner = if acf_says == Vote::Break { "ACF" } else { "SEI" };
        (Confidence::High, format!("Beta-adjusted flow and {} agree: walls should break", partner))
    } else if holds >= 2 && flow_says == Vote::Hold {
        (Confidence::High, "Flow and ACF agree: walls hold, expect reversal".to_string())
    } else if flow_says == Vote::Break {
        (Confidence::Medium, "Flow says break, waiting for ACF or SEI confirmation".to_string())
    } else if acf_says == Vote::Break || sei_says == Vote::Break {
        (Confidence::Low, "Price signals suggest a break but flow says dealers are in control".to_string())
    } else {
        (Confidence::High, "All signals agree: walls hold, expect reversal".to_string())
    };

    WallBreak {
        probability: prob.round() as u32,
        confidence,
        explanation,
        flow_says,
        acf_says,
        sei_says,
        gamma_asymmetry,
        collision_prob_call_wall: round_to(p_call * 100.0, 1),
        collision_prob_put_wall: round_to(p_put * 100.0, 1),
        beta_adj_factor: round_to(w.beta_adj, 2),
        ratio_beta_adj: round_to(ratio_adj, 2),
    }
}
