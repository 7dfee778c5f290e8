//! Dealer Exposure (GEX) Profile
//!
//! Builds per-strike dealer exposure from a single-expiration chain.
//! Dealers are assumed net short the listed options:
//! - call GEX = +gamma * OI * 100 * spot (hedging sells rallies, buys dips)
//! - put GEX = -gamma * OI * 100 * spot
//!
//! From the per-strike ladder it derives the flip point (interpolated
//! zero-crossing nearest spot), the absolute-gamma strike, the gamma regime
//! and a concentration entropy reading.

pub mod aggregate;
pub mod entropy;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{OptionQuote, OptionSide, OptionsChain};

use super::greeks::{self, BsInputs, DEFAULT_RISK_FREE_RATE};
use super::numeric::round_to;

pub use aggregate::{aggregate_gex, AggregateGex, AggregateRow, ExpiryDetail};
pub use entropy::{compute_entropy, EntropyReading, EntropyRegime, StrikeShare};

/// Shares per listed contract
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Minimum time to expiry used for the profile (years)
const MIN_T_YEARS: f64 = 0.001;

/// Implied vol floor applied before evaluating Greeks
const IV_FLOOR: f64 = 0.01;

/// Exposure builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureParams {
    /// Annual risk-free rate (default: 0.05)
    pub risk_free_rate: f64,
    /// Strikes within this % of spot feed the entropy reading (default: 10.0)
    pub entropy_window_pct: f64,
    /// Minimum strikes for a meaningful entropy reading (default: 3)
    pub entropy_min_strikes: usize,
    /// Expirations pooled by the aggregate profile (default: 6)
    pub aggregate_max_expirations: usize,
}

impl Default for ExposureParams {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            entropy_window_pct: 10.0,
            entropy_min_strikes: 3,
            aggregate_max_expirations: 6,
        }
    }
}

/// Gamma regime implied by dealer positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GammaRegime {
    /// Dealers long gamma: hedging dampens moves
    PositiveGamma,
    /// Dealers short gamma: hedging amplifies moves
    NegativeGamma,
}

impl GammaRegime {
    /// Spot versus flip when a flip exists, otherwise the sign of total GEX
    pub fn classify(spot: f64, flip_point: Option<f64>, total_gex: f64) -> Self {
        let positive = match flip_point {
            Some(flip) => spot >= flip,
            None => total_gex >= 0.0,
        };
        if positive {
            Self::PositiveGamma
        } else {
            Self::NegativeGamma
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Self::PositiveGamma)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PositiveGamma => "Positive Gamma: Dealers Stabilizing",
            Self::NegativeGamma => "Negative Gamma: Dealers Amplifying",
        }
    }
}

/// Dealer exposure at one strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRow {
    pub strike: f64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
    pub call_delta: f64,
    pub put_delta: f64,
    pub net_dealer_delta: f64,
    pub call_charm: f64,
    pub put_charm: f64,
    pub net_charm: f64,
    pub call_vanna: f64,
    pub put_vanna: f64,
    pub net_vanna: f64,
}

/// Complete exposure profile for one expiration
#[derive(Debug, Clone, Serialize)]
pub struct GexProfile {
    pub rows: Vec<ExposureRow>,
    pub total_gex: f64,
    pub total_call_gex: f64,
    pub total_put_gex: f64,
    pub flip_point: Option<f64>,
    pub abs_gamma_strike: f64,
    pub regime: GammaRegime,
    pub total_charm: f64,
    pub total_vanna: f64,
    pub entropy: EntropyReading,
}

impl GexProfile {
    /// (strike, net_gex) pairs in ascending strike order
    pub fn net_points(&self) -> Vec<(f64, f64)> {
        self.rows.iter().map(|r| (r.strike, r.net_gex)).collect()
    }
}

/// Both legs listed at one strike
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrikeLegs<'a> {
    pub strike: f64,
    pub call: Option<&'a OptionQuote>,
    pub put: Option<&'a OptionQuote>,
}

/// Union of positive strikes across both legs, ascending.
/// A strike listed twice on one leg resolves to the later quote.
pub(crate) fn strike_ladder<'a>(calls: &'a [OptionQuote], puts: &'a [OptionQuote]) -> Vec<StrikeLegs<'a>> {
    let mut strikes: Vec<f64> = calls
        .iter()
        .chain(puts.iter())
        .map(|q| q.strike)
        .filter(|k| *k > 0.0)
        .collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();

    strikes
        .into_iter()
        .map(|strike| StrikeLegs {
            strike,
            call: calls.iter().rev().find(|q| q.strike == strike),
            put: puts.iter().rev().find(|q| q.strike == strike),
        })
        .collect()
}

/// Interpolated zero-crossing of net GEX nearest spot
pub fn find_flip(points: &[(f64, f64)], spot: f64) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    points
        .windows(2)
        .filter(|w| w[0].1 * w[1].1 < 0.0)
        .map(|w| {
            let (s1, g1) = w[0];
            let (s2, g2) = w[1];
            round_to(s1 + (s2 - s1) * g1.abs() / (g1.abs() + g2.abs()), 2)
        })
        .fold(None, |best: Option<f64>, flip| match best {
            Some(b) if (b - spot).abs() <= (flip - spot).abs() => Some(b),
            _ => Some(flip),
        })
}

/// Strike with the largest |net GEX| (first on ties), spot when empty
pub fn abs_gamma_strike(points: &[(f64, f64)], spot: f64) -> f64 {
    let mut best: Option<(f64, f64)> = None;
    for &(strike, net) in points {
        match best {
            Some((_, b)) if net.abs() <= b => {}
            _ => best = Some((strike, net.abs())),
        }
    }
    best.map(|(strike, _)| strike).unwrap_or(spot)
}

struct LegExposure {
    oi: u64,
    gex: f64,
    delta: f64,
    charm: f64,
    vanna: f64,
}

fn leg_exposure(quote: Option<&OptionQuote>, side: OptionSide, spot: f64, strike: f64, t: f64, rate: f64) -> LegExposure {
    let oi = quote.map(|q| q.open_interest).unwrap_or(0);
    let sigma = quote
        .map(OptionQuote::iv_or_default)
        .unwrap_or(crate::domain::DEFAULT_IMPLIED_VOL)
        .max(IV_FLOOR);
    let inp = BsInputs::new(spot, strike, t, rate, sigma);
    let contracts = oi as f64 * CONTRACT_MULTIPLIER;
    let sign = match side {
        OptionSide::Call => 1.0,
        OptionSide::Put => -1.0,
    };
    LegExposure {
        oi,
        gex: sign * greeks::gamma(&inp) * contracts * spot,
        delta: greeks::delta(&inp, side),
        charm: greeks::charm(&inp, side) * contracts,
        vanna: greeks::vanna(&inp) * contracts,
    }
}

/// Build the exposure profile for quotes expiring in `dte` days
pub fn build_profile(calls: &[OptionQuote], puts: &[OptionQuote], spot: f64, dte: u32, params: &ExposureParams) -> GexProfile {
    let t = (dte as f64 / 365.0).max(MIN_T_YEARS);
    let rate = params.risk_free_rate;

    let mut rows = Vec::new();
    let mut total_call_gex = 0.0;
    let mut total_put_gex = 0.0;

    for legs in strike_ladder(calls, puts) {
        let k = legs.strike;
        let c = leg_exposure(legs.call, OptionSide::Call, spot, k, t, rate);
        let p = leg_exposure(legs.put, OptionSide::Put, spot, k, t, rate);
        total_call_gex += c.gex;
        total_put_gex += p.gex;

        rows.push(ExposureRow {
            strike: k,
            call_oi: c.oi,
            put_oi: p.oi,
            call_gex: round_to(c.gex, 2),
            put_gex: round_to(p.gex, 2),
            net_gex: round_to(c.gex + p.gex, 2),
            call_delta: round_to(c.delta, 4),
            put_delta: round_to(p.delta, 4),
            net_dealer_delta: round_to(
                -(c.delta * c.oi as f64 + p.delta * p.oi as f64) * CONTRACT_MULTIPLIER,
                2,
            ),
            call_charm: round_to(c.charm, 2),
            put_charm: round_to(p.charm, 2),
            net_charm: round_to(c.charm + p.charm, 2),
            call_vanna: round_to(c.vanna, 2),
            put_vanna: round_to(p.vanna, 2),
            net_vanna: round_to(c.vanna + p.vanna, 2),
        });
    }

    let points: Vec<(f64, f64)> = rows.iter().map(|r| (r.strike, r.net_gex)).collect();
    let flip_point = find_flip(&points, spot);
    let total_gex = total_call_gex + total_put_gex;
    let regime = GammaRegime::classify(spot, flip_point, total_gex);
    let total_charm: f64 = rows.iter().map(|r| r.net_charm).sum();
    let total_vanna: f64 = rows.iter().map(|r| r.net_vanna).sum();
    let entropy = compute_entropy(&rows, spot, params);

    debug!(
        "GEX profile: {} strikes, total {:.0}, flip {:?}, {:?}",
        rows.len(),
        total_gex,
        flip_point,
        regime
    );

    GexProfile {
        abs_gamma_strike: abs_gamma_strike(&points, spot),
        rows,
        total_gex: round_to(total_gex, 2),
        total_call_gex: round_to(total_call_gex, 2),
        total_put_gex: round_to(total_put_gex, 2),
        flip_point,
        regime,
        total_charm: round_to(total_charm, 2),
        total_vanna: round_to(total_vanna, 2),
        entropy,
    }
}

/// Build the profile for a whole chain
pub fn chain_profile(chain: &OptionsChain, params: &ExposureParams) -> GexProfile {
    build_profile(&chain.calls, &chain.puts, chain.spot, chain.dte, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn call(k: f64, oi: u64) -> OptionQuote {
        OptionQuote::new(k, OptionSide::Call, oi, 0.25)
    }

    fn put(k: f64, oi: u64) -> OptionQuote {
        OptionQuote::new(k, OptionSide::Put, oi, 0.25)
    }

    fn ladder(strikes: &[f64], call_oi: u64, put_oi: u64) -> (Vec<OptionQuote>, Vec<OptionQuote>) {
        (
            strikes.iter().map(|k| call(*k, call_oi)).collect(),
            strikes.iter().map(|k| put(*k, put_oi)).collect(),
        )
    }

    #[test]
    fn test_net_gex_is_call_plus_put() {
        let (calls, puts) = ladder(&[90.0, 95.0, 100.0, 105.0, 110.0], 500, 700);
        let profile = build_profile(&calls, &puts, 100.0, 14, &ExposureParams::default());
        for row in &profile.rows {
            assert_relative_eq!(row.net_gex, row.call_gex + row.put_gex, epsilon = 0.011);
        }
    }

    #[test]
    fn test_total_matches_row_sum() {
        let (calls, puts) = ladder(&[90.0, 95.0, 100.0, 105.0, 110.0], 1_000, 400);
        let profile = build_profile(&calls, &puts, 100.0, 21, &ExposureParams::default());
        let row_sum: f64 = profile.rows.iter().map(|r| r.net_gex).sum();
        // Per-row rounding is at most 0.005 per strike
        assert!((profile.total_gex - row_sum).abs() <= 0.005 * profile.rows.len() as f64 + 0.01);
    }

    #[test]
    fn test_calls_only_no_flip_positive_regime() {
        let calls: Vec<_> = [95.0, 100.0, 105.0].iter().map(|k| call(*k, 1_000)).collect();
        let profile = build_profile(&calls, &[], 100.0, 10, &ExposureParams::default());
        assert!(profile.flip_point.is_none());
        assert_eq!(profile.regime, GammaRegime::PositiveGamma);
        assert!(profile.total_gex > 0.0);
    }

    #[test]
    fn test_puts_only_negative_regime() {
        let puts: Vec<_> = [95.0, 100.0, 105.0].iter().map(|k| put(*k, 1_000)).collect();
        let profile = build_profile(&[], &puts, 100.0, 10, &ExposureParams::default());
        assert!(profile.flip_point.is_none());
        assert_eq!(profile.regime, GammaRegime::NegativeGamma);
    }

    #[test]
    fn test_flip_lies_between_sign_change() {
        // Put-heavy below spot, call-heavy above
        let calls = vec![call(95.0, 10), call(100.0, 100), call(105.0, 2_000)];
        let puts = vec![put(95.0, 2_000), put(100.0, 50), put(105.0, 10)];
        let profile = build_profile(&calls, &puts, 100.0, 14, &ExposureParams::default());
        let flip = profile.flip_point.unwrap();
        assert!(flip > 95.0 && flip < 105.0);
    }

    #[test]
    fn test_find_flip_picks_crossing_nearest_spot() {
        let points = [(90.0, 10.0), (95.0, -10.0), (100.0, -10.0), (105.0, 10.0)];
        assert_relative_eq!(find_flip(&points, 102.0).unwrap(), 102.5);
        assert_relative_eq!(find_flip(&points, 91.0).unwrap(), 92.5);
        assert!(find_flip(&points[..1], 100.0).is_none());
    }

    #[test]
    fn test_abs_gamma_strike_first_on_ties() {
        let points = [(95.0, -50.0), (100.0, 50.0), (105.0, 10.0)];
        assert_eq!(abs_gamma_strike(&points, 100.0), 95.0);
        assert_eq!(abs_gamma_strike(&[], 101.5), 101.5);
    }

    #[test]
    fn test_non_positive_strikes_skipped() {
        let calls = vec![call(0.0, 100), call(-5.0, 100), call(100.0, 100)];
        let profile = build_profile(&calls, &[], 100.0, 7, &ExposureParams::default());
        assert_eq!(profile.rows.len(), 1);
        assert_eq!(profile.rows[0].strike, 100.0);
    }

    #[test]
    fn test_missing_leg_has_zero_oi() {
        let calls = vec![call(100.0, 100)];
        let puts = vec![put(95.0, 100)];
        let profile = build_profile(&calls, &puts, 100.0, 7, &ExposureParams::default());
        assert_eq!(profile.rows.len(), 2);
        assert_eq!(profile.rows[0].call_oi, 0);
        assert_eq!(profile.rows[0].call_gex, 0.0);
        assert_eq!(profile.rows[1].put_oi, 0);
    }
}
