//! Straddle setup scoring
//!
//! Four 0..=25 sub-scores (regime, IV, catalyst, structure) plus a VRP
//! drag, mapped to a verdict.

use serde::{Deserialize, Serialize};

use crate::strategy::exposure::{EntropyRegime, GammaRegime};
use crate::strategy::regime::{AcfStability, FlowRegime, PhaseRegime};
use crate::strategy::volatility::VrpContext;

const SUB_SCORE_MAX: i32 = 25;

fn clamp_sub(score: i32) -> i32 {
    score.clamp(0, SUB_SCORE_MAX)
}

/// Does the regime support large moves?
pub fn score_regime(flow: FlowRegime, mean_acf1: f64, pct_amplified: f64) -> i32 {
    let mut score = match flow {
        FlowRegime::Turbulent => 12,
        FlowRegime::Transitional => 6,
        _ => 0,
    };
    score += if mean_acf1 > 0.10 {
        8
    } else if mean_acf1 > 0.05 {
        5
    } else if mean_acf1 > 0.0 {
        2
    } else if mean_acf1 < -0.10 {
        -3
    } else {
        0
    };
    if pct_amplified > 15.0 {
        score += 5;
    } else if pct_amplified > 10.0 {
        score += 3;
    }
    clamp_sub(score)
}

/// Is IV cheap enough to buy? `atm_iv` is decimal.
pub fn score_iv(iv_rv_ratio: f64, atm_iv: f64) -> i32 {
    let mut score = if iv_rv_ratio < 0.75 {
        20
    } else if iv_rv_ratio < 0.85 {
        15
    } else if iv_rv_ratio < 1.0 {
        10
    } else if iv_rv_ratio < 1.15 {
        5
    } else if iv_rv_ratio < 1.3 {
        2
    } else {
        0
    };
    if atm_iv < 0.20 {
        score += 5;
    } else if atm_iv < 0.30 {
        score += 3;
    }
    clamp_sub(score)
}

/// Catalyst inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalystSignals {
    pub phase: PhaseRegime,
    pub distance_to_transition: f64,
    pub at_squeeze_ceiling: bool,
    pub stability: AcfStability,
    /// 0 when there is no complete channel
    pub channel_width_pct: f64,
    pub sei: f64,
}

pub fn score_catalyst(c: &CatalystSignals) -> i32 {
    let mut score = match c.phase {
        PhaseRegime::Turbulent => 10,
        PhaseRegime::Approaching => 6,
        _ => 0,
    };
    if c.distance_to_transition > 0.0 && c.distance_to_transition < 5.0 {
        score += 5;
    }
    if c.at_squeeze_ceiling {
        score += 5;
    }
    score += match c.stability {
        AcfStability::Unreliable => 5,
        AcfStability::Contested => 3,
        _ => 0,
    };
    let w = c.channel_width_pct;
    if w > 0.0 && w < 2.0 {
        score += 5;
    } else if w > 0.0 && w < 4.0 {
        score += 2;
    }
    if c.sei > 150.0 {
        score += 6;
    } else if c.sei > 80.0 {
        score += 3;
    }
    clamp_sub(score)
}

/// Structural inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuralSignals {
    pub gamma: GammaRegime,
    pub channel_width_pct: f64,
    /// Raw turbulence ratio
    pub ratio: f64,
    /// Straddle breakeven move, percent (0 when unpriced)
    pub breakeven_pct: f64,
    pub atr_pct: f64,
    pub entropy: EntropyRegime,
}

pub fn score_structural(s: &StructuralSignals) -> i32 {
    let mut score = if s.gamma == GammaRegime::NegativeGamma { 8 } else { 2 };
    let w = s.channel_width_pct;
    if w > 0.0 && w < 3.0 {
        score += 5;
    } else if w > 0.0 && w < 5.0 {
        score += 3;
    }
    if s.ratio > 1.5 {
        score += 4;
    } else if s.ratio > 1.0 {
        score += 2;
    }
    let be = s.breakeven_pct;
    if s.atr_pct > 0.0 && be > 0.0 {
        let coverage = s.atr_pct / be;
        if coverage > 1.5 {
            score += 8;
        } else if coverage > 1.0 {
            score += 5;
        } else if coverage > 0.7 {
            score += 2;
        }
    } else if be < 1.5 {
        score += 3;
    } else if be < 2.5 {
        score += 1;
    }
    score += match s.entropy {
        EntropyRegime::Critical => 8,
        EntropyRegime::Approaching => 4,
        _ => 0,
    };
    clamp_sub(score)
}

/// Score adjustment and note for the variance risk premium bucket
pub fn vrp_drag(context: VrpContext, vrp_gex_adjusted: f64) -> (i32, Option<String>) {
    match context {
        VrpContext::HighPremium => (
            -12,
            Some(format!(
                "Elevated VRP ({:+.1} var pts): IV is well above gamma-implied realized vol, entry is expensive",
                vrp_gex_adjusted
            )),
        ),
        VrpContext::ModeratePremium => (
            -7,
            Some(format!(
                "Moderate VRP ({:+.1}): slightly overpaying, manageable with a catalyst",
                vrp_gex_adjusted
            )),
        ),
        VrpContext::SmallPremium => (-3, Some("Small VRP cost, near fair value".to_string())),
        VrpContext::Discount => (
            10,
            Some(format!(
                "Negative VRP ({:+.1}): options are cheap against gamma-implied vol, favorable entry",
                vrp_gex_adjusted
            )),
        ),
        VrpContext::Fair | VrpContext::Unknown => (0, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StraddleVerdict {
    BuyStraddle,
    BuyStrangle,
    Consider,
    Avoid,
}

impl StraddleVerdict {
    pub fn determine(total: i32, iv_rv_ratio: f64, breakeven_pct: f64) -> (Self, &'static str) {
        if total >= 70 && iv_rv_ratio < 1.2 {
            (Self::BuyStraddle, "Strong Setup: Regime and IV Favor a Big Move")
        } else if total >= 60 && iv_rv_ratio < 1.3 {
            if breakeven_pct > 3.5 {
                (Self::BuyStrangle, "Good Setup: Strangle Preferred (Lower Cost)")
            } else {
                (Self::BuyStraddle, "Good Setup: Conditions Support Vol Expansion")
            }
        } else if total >= 45 {
            (Self::Consider, "Marginal: Some Factors Align, Watch for Confirmation")
        } else {
            (Self::Avoid, "Range-Bound or Mean-Reverting Conditions: Don't Buy Vol")
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::BuyStraddle | Self::BuyStrangle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StraddleScore {
    pub total: i32,
    pub regime: i32,
    pub iv: i32,
    pub catalyst: i32,
    pub structural: i32,
    pub vrp_drag: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_score_bounds() {
        assert_eq!(score_regime(FlowRegime::Turbulent, 0.15, 20.0), 25);
        assert_eq!(score_regime(FlowRegime::Laminar, -0.2, 0.0), 0);
        assert_eq!(score_regime(FlowRegime::Transitional, 0.03, 12.0), 11);
    }

    #[test]
    fn test_iv_score_cheap() {
        assert_eq!(score_iv(0.7, 0.18), 25);
        assert_eq!(score_iv(1.2, 0.25), 5);
        assert_eq!(score_iv(1.5, 0.45), 0);
    }

    #[test]
    fn test_catalyst_stacks_and_clamps() {
        let c = CatalystSignals {
            phase: PhaseRegime::Turbulent,
            distance_to_transition: 2.0,
            at_squeeze_ceiling: true,
            stability: AcfStability::Unreliable,
            channel_width_pct: 1.5,
            sei: 200.0,
        };
        assert_eq!(score_catalyst(&c), 25);
        let quiet = CatalystSignals {
            phase: PhaseRegime::Laminar,
            distance_to_transition: 0.0,
            at_squeeze_ceiling: false,
            stability: AcfStability::Contested,
            channel_width_pct: 3.0,
            sei: 90.0,
        };
        assert_eq!(score_catalyst(&quiet), 8);
    }

    #[test]
    fn test_unstable_acf_adds_catalyst_points() {
        let base = CatalystSignals {
            phase: PhaseRegime::Laminar,
            distance_to_transition: 0.0,
            at_squeeze_ceiling: false,
            stability: AcfStability::Stable,
            channel_width_pct: 0.0,
            sei: 0.0,
        };
        assert_eq!(score_catalyst(&base), 0);
        let rock = CatalystSignals { stability: AcfStability::RockSolid, ..base };
        assert_eq!(score_catalyst(&rock), 0);
        let contested = CatalystSignals { stability: AcfStability::Contested, ..base };
        assert_eq!(score_catalyst(&contested), 3);
        let unreliable = CatalystSignals { stability: AcfStability::Unreliable, ..base };
        assert_eq!(score_catalyst(&unreliable), 5);
        let unknown = CatalystSignals { stability: AcfStability::Unknown, ..base };
        assert_eq!(score_catalyst(&unknown), 0);
    }

    #[test]
    fn test_structural_atr_coverage() {
        let s = StructuralSignals {
            gamma: GammaRegime::NegativeGamma,
            channel_width_pct: 2.0,
            ratio: 1.8,
            breakeven_pct: 2.0,
            atr_pct: 3.2,
            entropy: EntropyRegime::Dispersed,
        };
        // 8 + 5 + 4 + 8 (coverage 1.6)
        assert_eq!(score_structural(&s), 25);
        let unpriced = StructuralSignals {
            gamma: GammaRegime::PositiveGamma,
            channel_width_pct: 0.0,
            ratio: 0.5,
            breakeven_pct: 0.0,
            atr_pct: 0.0,
            entropy: EntropyRegime::Approaching,
        };
        // 2 + 3 (breakeven < 1.5) + 4
        assert_eq!(score_structural(&unpriced), 9);
    }

    #[test]
    fn test_vrp_drag_buckets() {
        assert_eq!(vrp_drag(VrpContext::HighPremium, 8.0).0, -12);
        assert_eq!(vrp_drag(VrpContext::ModeratePremium, 3.0).0, -7);
        assert_eq!(vrp_drag(VrpContext::SmallPremium, 1.0).0, -3);
        assert_eq!(vrp_drag(VrpContext::Discount, -4.0).0, 10);
        assert_eq!(vrp_drag(VrpContext::Unknown, 0.0), (0, None));
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(StraddleVerdict::determine(72, 1.1, 2.0).0, StraddleVerdict::BuyStraddle);
        assert_eq!(StraddleVerdict::determine(72, 1.25, 4.0).0, StraddleVerdict::BuyStrangle);
        assert_eq!(StraddleVerdict::determine(62, 1.25, 2.0).0, StraddleVerdict::BuyStraddle);
        assert_eq!(StraddleVerdict::determine(62, 1.4, 2.0).0, StraddleVerdict::Consider);
        assert_eq!(StraddleVerdict::determine(40, 0.8, 2.0).0, StraddleVerdict::Avoid);
    }
}
