//! ATM implied-vol term structure across expirations

use serde::{Deserialize, Serialize};

use crate::domain::OptionsChain;
use crate::strategy::numeric::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermShape {
    Contango,
    MildContango,
    Flat,
    MildBackwardation,
    Backwardation,
    Unknown,
}

impl TermShape {
    /// `slope` in IV points, `slope_pct` relative to the front
    pub fn classify(slope: f64, slope_pct: f64) -> Self {
        if slope > 2.0 && slope_pct > 5.0 {
            Self::Contango
        } else if slope > 0.5 {
            Self::MildContango
        } else if slope > -0.5 {
            Self::Flat
        } else if slope > -2.0 {
            Self::MildBackwardation
        } else {
            Self::Backwardation
        }
    }

    fn describe(&self) -> (&'static str, &'static str) {
        match self {
            Self::Contango => (
                "Normal contango: back months richer than front",
                "Short-dated options cheap relative to longer dated; favour near-term buys",
            ),
            Self::MildContango => ("Mild contango", "No strong term signal"),
            Self::Flat => ("Flat term structure", "No strong term signal"),
            Self::MildBackwardation => (
                "Mild backwardation: near-term event premium",
                "Short-dated options expensive; prefer longer expiries",
            ),
            Self::Backwardation => (
                "Backwardation: front month stressed",
                "Short-dated options expensive; prefer longer expiries or spreads",
            ),
            Self::Unknown => ("Insufficient expirations", "No strong term signal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermPoint {
    pub dte: u32,
    /// Percent
    pub atm_iv: f64,
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermStructure {
    pub points: Vec<TermPoint>,
    pub front_iv: f64,
    pub back_iv: f64,
    pub slope: f64,
    pub slope_pct: f64,
    pub front_back_ratio: f64,
    pub shape: TermShape,
    pub description: String,
    pub trade_implication: String,
}

impl Default for TermStructure {
    fn default() -> Self {
        let (description, implication) = TermShape::Unknown.describe();
        Self {
            points: Vec::new(),
            front_iv: 0.0,
            back_iv: 0.0,
            slope: 0.0,
            slope_pct: 0.0,
            front_back_ratio: 1.0,
            shape: TermShape::Unknown,
            description: description.to_string(),
            trade_implication: implication.to_string(),
        }
    }
}

/// IV of the quote nearest spot across both legs
fn atm_iv(chain: &OptionsChain, spot: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for q in chain.quotes().filter(|q| q.implied_vol > 0.0) {
        let dist = (q.strike - spot).abs();
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, q.implied_vol));
        }
    }
    best.map(|(_, iv)| iv)
}

pub fn compute_term_structure(chains: &[OptionsChain], spot: f64) -> TermStructure {
    let mut points: Vec<TermPoint> = chains
        .iter()
        .filter(|c| c.dte > 0 && !c.is_empty())
        .filter_map(|c| {
            atm_iv(c, spot).map(|iv| TermPoint {
                dte: c.dte,
                atm_iv: round_to(iv * 100.0, 1),
                expiration: c.expiration.clone(),
            })
        })
        .collect();
    if points.len() < 2 {
        return TermStructure {
            points,
            ..TermStructure::default()
        };
    }
    points.sort_by_key(|p| p.dte);

    let front = points[0].atm_iv;
    let back = points[points.len() - 1].atm_iv;
    let slope = back - front;
    let slope_pct = if front > 0.0 { slope / front * 100.0 } else { 0.0 };
    let shape = TermShape::classify(slope, slope_pct);
    let (description, implication) = shape.describe();

    TermStructure {
        points,
        front_iv: front,
        back_iv: back,
        slope: round_to(slope, 1),
        slope_pct: round_to(slope_pct, 1),
        front_back_ratio: if back > 0.0 { round_to(front / back, 2) } else { 1.0 },
        shape,
        description: description.to_string(),
        trade_implication: implication.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionQuote, OptionSide};

    fn chain(dte: u32, iv: f64) -> OptionsChain {
        OptionsChain::new(
            100.0,
            dte,
            vec![OptionQuote::new(100.0, OptionSide::Call, 10, iv), OptionQuote::new(110.0, OptionSide::Call, 10, 0.9)],
            vec![OptionQuote::new(90.0, OptionSide::Put, 10, 0.9)],
        )
    }

    #[test]
    fn test_contango() {
        let term = compute_term_structure(&[chain(45, 0.30), chain(7, 0.20)], 100.0);
        assert_eq!(term.points[0].dte, 7);
        assert_eq!(term.front_iv, 20.0);
        assert_eq!(term.back_iv, 30.0);
        assert_eq!(term.shape, TermShape::Contango);
        assert_eq!(term.front_back_ratio, 0.67);
    }

    #[test]
    fn test_backwardation() {
        let term = compute_term_structure(&[chain(7, 0.45), chain(30, 0.30)], 100.0);
        assert_eq!(term.shape, TermShape::Backwardation);
        assert!(term.trade_implication.starts_with("Short-dated options expensive"));
    }

    #[test]
    fn test_single_expiry_is_unknown() {
        let term = compute_term_structure(&[chain(7, 0.25)], 100.0);
        assert_eq!(term.shape, TermShape::Unknown);
        assert_eq!(term.front_back_ratio, 1.0);
    }

    #[test]
    fn test_zero_dte_skipped() {
        let term = compute_term_structure(&[chain(0, 0.25), chain(7, 0.25)], 100.0);
        assert_eq!(term.points.len(), 1);
        assert_eq!(term.shape, TermShape::Unknown);
    }

    #[test]
    fn test_shape_boundaries() {
        assert_eq!(TermShape::classify(2.5, 4.0), TermShape::MildContango);
        assert_eq!(TermShape::classify(0.0, 0.0), TermShape::Flat);
        assert_eq!(TermShape::classify(-1.0, -4.0), TermShape::MildBackwardation);
    }
}
