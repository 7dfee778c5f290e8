//! Put/call implied-vol skew

use serde::{Deserialize, Serialize};

use crate::domain::OptionQuote;
use crate::strategy::numeric::round_to;

/// OTM distance used for expiries of two weeks or less
const SHORT_DTE_OTM_TARGET: f64 = 0.05;
const LONG_DTE_OTM_TARGET: f64 = 0.08;
const SHORT_DTE_CUTOFF: u32 = 14;
/// Tolerance on the wrong side of the OTM target
const MONEYNESS_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkewRegime {
    HighPutSkew,
    ModeratePutSkew,
    Flat,
    CallSkew,
    ExtremeCallSkew,
    Unknown,
}

impl SkewRegime {
    pub fn from_norm(norm: f64) -> Self {
        if norm > 0.15 {
            Self::HighPutSkew
        } else if norm > 0.05 {
            Self::ModeratePutSkew
        } else if norm > -0.05 {
            Self::Flat
        } else if norm > -0.15 {
            Self::CallSkew
        } else {
            Self::ExtremeCallSkew
        }
    }

    fn narrative(&self) -> (&'static str, &'static str) {
        match self {
            Self::HighPutSkew => (
                "Heavy put skew: market paying up for downside protection",
                "Puts expensive relative to calls; favour calls or put spreads",
            ),
            Self::ModeratePutSkew => (
                "Normal put skew",
                "Typical equity skew, no strong edge",
            ),
            Self::Flat => (
                "Flat skew: puts and calls priced evenly",
                "Straddles fairly priced on both wings",
            ),
            Self::CallSkew => (
                "Call skew: upside demand elevated",
                "Calls relatively expensive; favour puts or call spreads",
            ),
            Self::ExtremeCallSkew => (
                "Extreme call skew: squeeze or takeover speculation",
                "Calls very expensive; avoid naked calls",
            ),
            Self::Unknown => ("Insufficient data", ""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkewReading {
    /// IV values in percent
    pub otm_put_iv: f64,
    pub otm_call_iv: f64,
    pub atm_iv: f64,
    pub risk_reversal: f64,
    pub skew_norm: f64,
    pub regime: SkewRegime,
    pub description: String,
    pub trade_implication: String,
}

impl Default for SkewReading {
    fn default() -> Self {
        let (description, implication) = SkewRegime::Unknown.narrative();
        Self {
            otm_put_iv: 0.0,
            otm_call_iv: 0.0,
            atm_iv: 0.0,
            risk_reversal: 0.0,
            skew_norm: 0.0,
            regime: SkewRegime::Unknown,
            description: description.to_string(),
            trade_implication: implication.to_string(),
        }
    }
}

#[derive(Clone, Copy)]
enum Wing {
    Below,
    Above,
}

/// (moneyness, iv) pairs for quotes with a usable strike and IV
fn moneyness_points(quotes: &[OptionQuote], spot: f64) -> Vec<(f64, f64)> {
    quotes
        .iter()
        .filter(|q| q.strike > 0.0 && q.implied_vol > 0.0)
        .map(|q| (q.strike / spot, q.implied_vol))
        .collect()
}

fn nearest_iv(points: &[(f64, f64)], target: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &(m, iv) in points {
        let dist = (m - target).abs();
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, iv));
        }
    }
    best.map(|(_, iv)| iv)
}

fn otm_iv(points: &[(f64, f64)], target: f64, wing: Wing) -> f64 {
    let eligible: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|&(m, _)| match wing {
            Wing::Below => m <= target + MONEYNESS_TOLERANCE,
            Wing::Above => m >= target - MONEYNESS_TOLERANCE,
        })
        .collect();
    nearest_iv(&eligible, target).unwrap_or(0.0)
}

pub fn compute_skew(calls: &[OptionQuote], puts: &[OptionQuote], spot: f64, dte: u32) -> SkewReading {
    if spot <= 0.0 {
        return SkewReading::default();
    }
    let call_points = moneyness_points(calls, spot);
    let put_points = moneyness_points(puts, spot);
    let (Some(atm_call), Some(atm_put)) = (nearest_iv(&call_points, 1.0), nearest_iv(&put_points, 1.0)) else {
        return SkewReading::default();
    };

    let target = if dte <= SHORT_DTE_CUTOFF {
        SHORT_DTE_OTM_TARGET
    } else {
        LONG_DTE_OTM_TARGET
    };
    let put_iv = otm_iv(&put_points, 1.0 - target, Wing::Below);
    let call_iv = otm_iv(&call_points, 1.0 + target, Wing::Above);

    let atm = if atm_call > 0.0 && atm_put > 0.0 {
        (atm_call + atm_put) / 2.0
    } else {
        atm_call.max(atm_put)
    };
    let raw = if put_iv > 0.0 && call_iv > 0.0 {
        (put_iv - call_iv) * 100.0
    } else {
        0.0
    };
    let norm = if atm > 0.0 { raw / (atm * 100.0) } else { 0.0 };

    let regime = SkewRegime::from_norm(norm);
    let (description, implication) = regime.narrative();
    SkewReading {
        otm_put_iv: round_to(put_iv * 100.0, 1),
        otm_call_iv: round_to(call_iv * 100.0, 1),
        atm_iv: round_to(atm * 100.0, 1),
        risk_reversal: round_to(raw, 1),
        skew_norm: round_to(norm, 3),
        regime,
        description: description.to_string(),
        trade_implication: implication.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionSide;

    fn smile(side: OptionSide, strikes_ivs: &[(f64, f64)]) -> Vec<OptionQuote> {
        strikes_ivs
            .iter()
            .map(|&(k, iv)| OptionQuote::new(k, side, 100, iv))
            .collect()
    }

    #[test]
    fn test_put_skew_detected() {
        let calls = smile(OptionSide::Call, &[(100.0, 0.25), (105.0, 0.22), (110.0, 0.21)]);
        let puts = smile(OptionSide::Put, &[(90.0, 0.35), (95.0, 0.32), (100.0, 0.25)]);
        let reading = compute_skew(&calls, &puts, 100.0, 7);
        assert_eq!(reading.otm_put_iv, 32.0);
        assert_eq!(reading.otm_call_iv, 22.0);
        assert_eq!(reading.atm_iv, 25.0);
        assert_eq!(reading.risk_reversal, 10.0);
        assert_eq!(reading.regime, SkewRegime::HighPutSkew);
    }

    #[test]
    fn test_long_dated_uses_wider_target() {
        let calls = smile(OptionSide::Call, &[(100.0, 0.25), (105.0, 0.24), (108.0, 0.26)]);
        let puts = smile(OptionSide::Put, &[(92.0, 0.26), (95.0, 0.30), (100.0, 0.25)]);
        let reading = compute_skew(&calls, &puts, 100.0, 30);
        assert_eq!(reading.otm_put_iv, 26.0);
        assert_eq!(reading.otm_call_iv, 26.0);
        assert_eq!(reading.regime, SkewRegime::Flat);
    }

    #[test]
    fn test_missing_side_is_unknown() {
        let calls = smile(OptionSide::Call, &[(100.0, 0.25)]);
        let reading = compute_skew(&calls, &[], 100.0, 7);
        assert_eq!(reading.regime, SkewRegime::Unknown);
        assert_eq!(reading.description, "Insufficient data");
    }

    #[test]
    fn test_zero_iv_quotes_ignored() {
        let calls = smile(OptionSide::Call, &[(100.0, 0.25), (105.0, 0.0)]);
        let puts = smile(OptionSide::Put, &[(95.0, 0.0), (100.0, 0.25)]);
        let reading = compute_skew(&calls, &puts, 100.0, 7);
        // Only ATM strikes remain, neither wing has an OTM quote
        assert_eq!(reading.atm_iv, 25.0);
        assert_eq!(reading.otm_put_iv, 0.0);
        assert_eq!(reading.otm_call_iv, 0.0);
        assert_eq!(reading.risk_reversal, 0.0);
        assert_eq!(reading.regime, SkewRegime::Flat);
    }

    #[test]
    fn test_regime_thresholds() {
        assert_eq!(SkewRegime::from_norm(0.2), SkewRegime::HighPutSkew);
        assert_eq!(SkewRegime::from_norm(0.1), SkewRegime::ModeratePutSkew);
        assert_eq!(SkewRegime::from_norm(-0.05), SkewRegime::CallSkew);
        assert_eq!(SkewRegime::from_norm(-0.2), SkewRegime::ExtremeCallSkew);
    }
}
