//! Composite vol-buying edge score

use serde::{Deserialize, Serialize};

use super::realized::{IvContext, IvHvReading};
use super::skew::{SkewReading, SkewRegime};
use super::term::{TermShape, TermStructure};
use super::vrp::{VrpContext, VrpReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolVerdict {
    StrongBuyVol,
    BuyVol,
    NeutralVol,
    ExpensiveVol,
    AvoidBuying,
}

impl VolVerdict {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 60 => Self::StrongBuyVol,
            s if s >= 40 => Self::BuyVol,
            s if s >= 25 => Self::NeutralVol,
            s if s >= 10 => Self::ExpensiveVol,
            _ => Self::AvoidBuying,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuyVol => "Strong edge for option buyers",
            Self::BuyVol => "Favourable conditions for buying options",
            Self::NeutralVol => "No clear vol edge, size conservatively",
            Self::ExpensiveVol => "Options expensive, prefer spreads",
            Self::AvoidBuying => "Avoid buying premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolEdge {
    pub score: i32,
    pub verdict: VolVerdict,
    pub label: String,
    pub factors: Vec<String>,
}

fn iv_points(iv_hv: &IvHvReading, factors: &mut Vec<String>) -> i32 {
    let ratio = iv_hv.iv_hv_ratio;
    let (points, note) = match iv_hv.context {
        IvContext::Cheap => (40, format!("IV cheap vs realized ({:.2}x)", ratio)),
        IvContext::SlightDiscount => (30, format!("IV at slight discount ({:.2}x)", ratio)),
        IvContext::Fair => (20, format!("IV fairly priced ({:.2}x)", ratio)),
        IvContext::SlightPremium => (10, format!("IV at slight premium ({:.2}x)", ratio)),
        IvContext::Expensive => (0, format!("IV expensive ({:.2}x)", ratio)),
        IvContext::VeryExpensive => (-10, format!("IV very expensive ({:.2}x)", ratio)),
        IvContext::Unknown => (-10, "IV/HV unavailable, no evidence IV is cheap".to_string()),
    };
    factors.push(note);
    points
}

fn term_points(term: &TermStructure, factors: &mut Vec<String>) -> i32 {
    match term.shape {
        TermShape::Contango => {
            factors.push("Term structure in contango, front month cheap".to_string());
            25
        }
        TermShape::MildContango => {
            factors.push("Mild contango".to_string());
            15
        }
        TermShape::Flat => 10,
        TermShape::Unknown => 0,
        TermShape::MildBackwardation => {
            factors.push("Mild backwardation, front month bid".to_string());
            0
        }
        TermShape::Backwardation => {
            factors.push("Backwardation, front month expensive".to_string());
            -10
        }
    }
}

fn skew_points(skew: &SkewReading, factors: &mut Vec<String>) -> i32 {
    match skew.regime {
        SkewRegime::HighPutSkew => {
            factors.push("Heavy put skew, calls relatively cheap".to_string());
            5
        }
        SkewRegime::CallSkew => {
            factors.push("Call skew, upside demand elevated".to_string());
            0
        }
        SkewRegime::ExtremeCallSkew => {
            factors.push("Extreme call skew".to_string());
            -5
        }
        SkewRegime::Flat => {
            factors.push("Flat skew, straddles fairly priced".to_string());
            10
        }
        SkewRegime::ModeratePutSkew | SkewRegime::Unknown => 0,
    }
}

fn vrp_points(vrp: &VrpReading, factors: &mut Vec<String>) -> i32 {
    let points = match vrp.context {
        VrpContext::Discount => 15,
        VrpContext::Fair => 8,
        VrpContext::SmallPremium => 3,
        VrpContext::ModeratePremium => -5,
        VrpContext::HighPremium => -10,
        VrpContext::Unknown => return 0,
    };
    factors.push(format!("GEX-adjusted VRP {:+.2} ({:?})", vrp.vrp_gex_adjusted, vrp.context));
    points
}

pub fn compute_vol_edge(iv_hv: &IvHvReading, skew: &SkewReading, term: &TermStructure, vrp: &VrpReading) -> VolEdge {
    let mut factors = Vec::new();
    let mut score = iv_points(iv_hv, &mut factors);
    score += term_points(term, &mut factors);
    score += skew_points(skew, &mut factors);

    if iv_hv.context != IvContext::Unknown {
        if iv_hv.iv_percentile_proxy < 25 {
            score += 5;
            factors.push(format!("Realized vol low in its range ({}th pct)", iv_hv.iv_percentile_proxy));
        } else if iv_hv.iv_percentile_proxy > 80 {
            factors.push(format!("Realized vol high in its range ({}th pct)", iv_hv.iv_percentile_proxy));
        }
    }
    score += vrp_points(vrp, &mut factors);

    let score = score.clamp(0, 100);
    let verdict = VolVerdict::from_score(score);
    VolEdge {
        score,
        verdict,
        label: verdict.label().to_string(),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionQuote, OptionSide, OptionsChain};
    use crate::strategy::exposure::GammaRegime;
    use crate::strategy::regime::FlowRegime;
    use crate::strategy::volatility::{compute_skew, compute_term_structure, compute_vrp, iv_vs_hv};

    #[test]
    fn test_expensive_everything_avoids() {
        let closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 100.0 } else { 100.5 }).collect();
        let iv_hv = iv_vs_hv(0.90, &closes, 7);
        assert_eq!(iv_hv.context, IvContext::VeryExpensive);
        let front = OptionsChain::new(100.0, 7, vec![OptionQuote::new(100.0, OptionSide::Call, 1, 0.9)], vec![]);
        let back = OptionsChain::new(100.0, 30, vec![OptionQuote::new(100.0, OptionSide::Call, 1, 0.5)], vec![]);
        let term = compute_term_structure(&[front, back], 100.0);
        assert_eq!(term.shape, TermShape::Backwardation);
        let vrp = compute_vrp(0.90, &closes, 7, GammaRegime::PositiveGamma, FlowRegime::Laminar);
        let edge = compute_vol_edge(&iv_hv, &SkewReading::default(), &term, &vrp);
        assert_eq!(edge.score, 0);
        assert_eq!(edge.verdict, VolVerdict::AvoidBuying);
    }

    #[test]
    fn test_cheap_vol_scores_high() {
        let closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 100.0 } else { 103.0 }).collect();
        let iv_hv = iv_vs_hv(0.20, &closes, 7);
        assert_eq!(iv_hv.context, IvContext::Cheap);
        let calls = vec![OptionQuote::new(100.0, OptionSide::Call, 1, 0.2), OptionQuote::new(105.0, OptionSide::Call, 1, 0.2)];
        let puts = vec![OptionQuote::new(95.0, OptionSide::Put, 1, 0.2), OptionQuote::new(100.0, OptionSide::Put, 1, 0.2)];
        let skew = compute_skew(&calls, &puts, 100.0, 7);
        let vrp = compute_vrp(0.20, &closes, 7, GammaRegime::NegativeGamma, FlowRegime::Turbulent);
        let edge = compute_vol_edge(&iv_hv, &skew, &TermStructure::default(), &vrp);
        // 40 cheap + 0 unknown term + 10 flat skew + 15 discount
        assert_eq!(edge.score, 65);
        assert_eq!(edge.verdict, VolVerdict::StrongBuyVol);
        assert!(!edge.factors.is_empty());
    }

    #[test]
    fn test_missing_inputs_earn_nothing() {
        let iv_hv = iv_vs_hv(0.25, &[], 7);
        assert_eq!(iv_hv.context, IvContext::Unknown);
        let term = TermStructure::default();
        assert_eq!(term.shape, TermShape::Unknown);

        let mut factors = Vec::new();
        assert_eq!(iv_points(&iv_hv, &mut factors), -10);
        assert_eq!(term_points(&term, &mut factors), 0);

        let edge = compute_vol_edge(&iv_hv, &SkewReading::default(), &term, &VrpReading::default());
        assert_eq!(edge.score, 0);
        assert_eq!(edge.verdict, VolVerdict::AvoidBuying);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(VolVerdict::from_score(60), VolVerdict::StrongBuyVol);
        assert_eq!(VolVerdict::from_score(40), VolVerdict::BuyVol);
        assert_eq!(VolVerdict::from_score(25), VolVerdict::NeutralVol);
        assert_eq!(VolVerdict::from_score(10), VolVerdict::ExpensiveVol);
        assert_eq!(VolVerdict::from_score(9), VolVerdict::AvoidBuying);
    }
}
