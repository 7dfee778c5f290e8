//! Thesis selection
//!
//! Flow is structural (the cause) and the ACF is observational (the effect),
//! so the flow ratio is checked first. Rules are evaluated in order and the
//! first match wins.

use serde::{Deserialize, Serialize};

use super::DirectionalParams;
use crate::strategy::exposure::EntropyRegime;
use crate::strategy::regime::{AcfReading, AcfRegime, FlowRegime, PhaseRegime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Thesis {
    MomentumBreakout,
    MomentumEarly,
    ConflictedPin,
    MomentumTrend,
    FadeMoves,
    FadeMild,
    Neutral,
}

impl Thesis {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MomentumBreakout => "Confirmed Breakout: Ride It",
            Self::MomentumEarly => "Early Momentum: Position Before Confirmation",
            Self::MomentumTrend => "Trending: Ride the Direction",
            Self::ConflictedPin => "Walls Hold: Trade TO Walls, Not Through",
            Self::FadeMoves => "Strong Mean-Reversion: Fade Every Move",
            Self::FadeMild => "Mild Dampening: Fade Cautiously",
            Self::Neutral => "No Clear Edge: Wait or Lottery Only",
        }
    }

    pub fn is_momentum(&self) -> bool {
        matches!(self, Self::MomentumBreakout | Self::MomentumEarly | Self::MomentumTrend)
    }

    pub fn is_fade(&self) -> bool {
        matches!(self, Self::FadeMoves | Self::FadeMild)
    }
}

/// Everything the rule list looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThesisSignals {
    /// Beta-adjusted turbulence ratio, lifted when gamma is critically concentrated
    pub effective_ratio: f64,
    pub momentum: bool,
    pub pct_amplified: f64,
    pub pct_dampened: f64,
    pub acf_regime: AcfRegime,
    pub mean_acf1: f64,
    pub momentum_amplified_pct: f64,
    pub acf_momentum: f64,
    pub fade_strong_acf: f64,
    pub pin_ratio: f64,
}

impl ThesisSignals {
    pub fn new(
        acf: &AcfReading,
        ratio_beta_adj: f64,
        flow_regime: FlowRegime,
        entropy: EntropyRegime,
        params: &DirectionalParams,
    ) -> Self {
        let mut effective_ratio = ratio_beta_adj;
        if entropy == EntropyRegime::Critical && flow_regime == FlowRegime::Transitional {
            effective_ratio = effective_ratio.max(params.critical_entropy_ratio);
        }
        Self {
            effective_ratio,
            momentum: momentum_confirmed(acf, params),
            pct_amplified: acf.pct_amplified,
            pct_dampened: acf.pct_dampened,
            acf_regime: acf.regime,
            mean_acf1: acf.mean_acf1,
            momentum_amplified_pct: params.momentum_amplified_pct,
            acf_momentum: params.acf_momentum,
            fade_strong_acf: params.fade_strong_acf,
            pin_ratio: params.pin_ratio,
        }
    }
}

/// Net momentum from the ACF: amplified sessions dominate, or self-excitation agrees
pub fn momentum_confirmed(acf: &AcfReading, params: &DirectionalParams) -> bool {
    let amplified_dominates = acf.pct_amplified > acf.pct_dampened
        && (acf.pct_amplified > params.momentum_amplified_pct || acf.mean_acf1 > params.acf_momentum);
    amplified_dominates || (acf.self_excitation.regime.is_excited() && acf.mean_acf1 > 0.0)
}

type Rule = fn(&ThesisSignals) -> bool;

/// Ordered; the first matching rule wins
pub const THESIS_RULES: [(Thesis, Rule); 6] = [
    (Thesis::MomentumBreakout, |s| s.effective_ratio > 1.0 && s.momentum),
    (Thesis::MomentumEarly, |s| s.effective_ratio > 1.0),
    (Thesis::ConflictedPin, |s| {
        s.pct_amplified > s.pct_dampened && s.pct_amplified > s.momentum_amplified_pct && s.effective_ratio < s.pin_ratio
    }),
    (Thesis::MomentumTrend, |s| s.acf_regime == AcfRegime::ShortGamma || s.mean_acf1 > s.acf_momentum),
    (Thesis::FadeMoves, |s| s.acf_regime == AcfRegime::LongGamma && s.mean_acf1 < s.fade_strong_acf),
    (Thesis::FadeMild, |s| s.acf_regime == AcfRegime::LongGamma),
];

pub fn select_thesis(signals: &ThesisSignals) -> Thesis {
    THESIS_RULES
        .iter()
        .find(|(_, rule)| rule(signals))
        .map_or(Thesis::Neutral, |(thesis, _)| *thesis)
}

/// Things not to do under this thesis
pub fn avoid_list(thesis: Thesis, phase: PhaseRegime) -> Vec<String> {
    let mut avoid: Vec<&str> = Vec::new();
    if thesis.is_momentum() {
        avoid.push("Do NOT fade the move: ACF says moves follow through");
        avoid.push("Do NOT sell premium: momentum regimes run sellers over");
    }
    if thesis.is_fade() {
        avoid.push("Do NOT chase breakouts: they are more likely to reverse");
        avoid.push("Do NOT hold fades too long, take profit in 1-2 days");
    }
    if thesis == Thesis::ConflictedPin {
        avoid.push("Do NOT assume walls will break: dealers still have capacity");
        avoid.push("Do NOT hold calls through the wall, take profit AT the wall");
    }
    if thesis == Thesis::Neutral {
        avoid.push("Do NOT force a trade: no edge means no trade");
    }
    if phase == PhaseRegime::Turbulent {
        avoid.push("Do NOT undersize: phase transitions move fast");
    }
    avoid.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(ratio: f64, momentum: bool, amp: f64, damp: f64, regime: AcfRegime, acf1: f64) -> ThesisSignals {
        let params = DirectionalParams::default();
        ThesisSignals {
            effective_ratio: ratio,
            momentum,
            pct_amplified: amp,
            pct_dampened: damp,
            acf_regime: regime,
            mean_acf1: acf1,
            momentum_amplified_pct: params.momentum_amplified_pct,
            acf_momentum: params.acf_momentum,
            fade_strong_acf: params.fade_strong_acf,
            pin_ratio: params.pin_ratio,
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(select_thesis(&signals(1.5, true, 40.0, 10.0, AcfRegime::ShortGamma, 0.1)), Thesis::MomentumBreakout);
        assert_eq!(select_thesis(&signals(1.5, false, 0.0, 50.0, AcfRegime::LongGamma, -0.2)), Thesis::MomentumEarly);
        assert_eq!(select_thesis(&signals(0.5, true, 30.0, 10.0, AcfRegime::ShortGamma, 0.1)), Thesis::ConflictedPin);
        assert_eq!(select_thesis(&signals(0.8, true, 30.0, 10.0, AcfRegime::ShortGamma, 0.1)), Thesis::MomentumTrend);
        assert_eq!(select_thesis(&signals(0.2, false, 0.0, 80.0, AcfRegime::LongGamma, -0.2)), Thesis::FadeMoves);
        assert_eq!(select_thesis(&signals(0.2, false, 0.0, 80.0, AcfRegime::LongGamma, -0.07)), Thesis::FadeMild);
        assert_eq!(select_thesis(&signals(0.2, false, 0.0, 0.0, AcfRegime::Neutral, 0.0)), Thesis::Neutral);
    }

    #[test]
    fn test_momentum_from_self_excitation() {
        let params = DirectionalParams::default();
        let mut acf = AcfReading::fallback();
        assert!(!momentum_confirmed(&acf, &params));
        acf.mean_acf1 = 0.01;
        acf.self_excitation.regime = crate::strategy::regime::ExcitationRegime::HighExcitation;
        assert!(momentum_confirmed(&acf, &params));
    }

    #[test]
    fn test_critical_entropy_lifts_transitional_ratio() {
        let params = DirectionalParams::default();
        let acf = AcfReading::fallback();
        let lifted = ThesisSignals::new(&acf, 0.8, FlowRegime::Transitional, EntropyRegime::Critical, &params);
        assert_eq!(lifted.effective_ratio, 1.05);
        assert_eq!(select_thesis(&lifted), Thesis::MomentumEarly);
        let plain = ThesisSignals::new(&acf, 0.8, FlowRegime::Transitional, EntropyRegime::Moderate, &params);
        assert_eq!(plain.effective_ratio, 0.8);
    }

    #[test]
    fn test_avoid_list() {
        let avoid = avoid_list(Thesis::MomentumBreakout, PhaseRegime::Turbulent);
        assert_eq!(avoid.len(), 3);
        assert_eq!(avoid_list(Thesis::Neutral, PhaseRegime::Laminar).len(), 1);
    }
}
