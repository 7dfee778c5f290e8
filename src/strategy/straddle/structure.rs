//! ATM straddle and OTM strangle construction, plus IV versus realized

use serde::{Deserialize, Serialize};

use crate::domain::OptionQuote;
use crate::strategy::numeric::{log_returns, population_std, round_to};
use crate::strategy::volatility::ANNUALIZATION_DAYS;

/// Closes needed for a realized-vol estimate
const MIN_RV_CLOSES: usize = 10;
/// Realized vol below this leaves the ratio at 1.0
const MIN_RV: f64 = 0.01;
/// IV assumed when the chain carries none
const FALLBACK_IV: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nearest {
    Any,
    AtOrAbove,
    AtOrBelow,
}

fn closest<'a>(options: impl Iterator<Item = &'a OptionQuote>, target: f64) -> Option<&'a OptionQuote> {
    let mut best: Option<&OptionQuote> = None;
    for q in options {
        match best {
            Some(b) if (b.strike - target).abs() <= (q.strike - target).abs() => {}
            _ => best = Some(q),
        }
    }
    best
}

/// Closest strike to `target`, first listed on ties. A side filter that
/// leaves nothing falls back to the whole leg.
fn nearest(options: &[OptionQuote], target: f64, side: Nearest) -> Option<&OptionQuote> {
    let keep = |q: &&OptionQuote| match side {
        Nearest::Any => true,
        Nearest::AtOrAbove => q.strike >= target,
        Nearest::AtOrBelow => q.strike <= target,
    };
    closest(options.iter().filter(keep), target).or_else(|| closest(options.iter(), target))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Straddle {
    pub strike: f64,
    pub call_premium: f64,
    pub put_premium: f64,
    pub total_cost: f64,
    pub total_cost_per_contract: f64,
    pub upper_breakeven: f64,
    pub lower_breakeven: f64,
    /// Move needed to break even, percent of spot
    pub required_move_pct: f64,
    pub max_loss: f64,
    /// Percent
    pub call_iv: f64,
    pub put_iv: f64,
}

impl Straddle {
    fn empty(spot: f64) -> Self {
        Self {
            strike: spot.round(),
            call_premium: 0.0,
            put_premium: 0.0,
            total_cost: 0.0,
            total_cost_per_contract: 0.0,
            upper_breakeven: spot,
            lower_breakeven: spot,
            required_move_pct: 0.0,
            max_loss: 0.0,
            call_iv: 0.0,
            put_iv: 0.0,
        }
    }

    pub fn is_priced(&self) -> bool {
        self.total_cost > 0.0
    }
}

pub fn build_straddle(calls: &[OptionQuote], puts: &[OptionQuote], spot: f64) -> Straddle {
    let (Some(call), Some(put)) = (nearest(calls, spot, Nearest::Any), nearest(puts, spot, Nearest::Any)) else {
        return Straddle::empty(spot);
    };
    let strike = call.strike;
    let (call_mid, put_mid) = (call.mid_price(), put.mid_price());
    let total = call_mid + put_mid;
    if total <= 0.0 || spot <= 0.0 {
        return Straddle::empty(spot);
    }
    Straddle {
        strike,
        call_premium: round_to(call_mid, 2),
        put_premium: round_to(put_mid, 2),
        total_cost: round_to(total, 2),
        total_cost_per_contract: round_to(total * 100.0, 2),
        upper_breakeven: round_to(strike + total, 2),
        lower_breakeven: round_to(strike - total, 2),
        required_move_pct: round_to(total / spot * 100.0, 2),
        max_loss: round_to(total, 2),
        call_iv: round_to(call.implied_vol * 100.0, 1),
        put_iv: round_to(put.implied_vol * 100.0, 1),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strangle {
    pub call_strike: f64,
    pub put_strike: f64,
    pub call_premium: f64,
    pub put_premium: f64,
    pub total_cost: f64,
    pub total_cost_per_contract: f64,
    pub upper_breakeven: f64,
    pub lower_breakeven: f64,
    /// The larger of the two breakeven distances, percent of spot
    pub required_move_pct: f64,
    pub max_loss: f64,
    pub width: f64,
    pub width_pct: f64,
}

impl Strangle {
    fn empty(spot: f64, otm_pct: f64) -> Self {
        let up = 1.0 + otm_pct / 100.0;
        let down = 1.0 - otm_pct / 100.0;
        Self {
            call_strike: (spot * up).round(),
            put_strike: (spot * down).round(),
            call_premium: 0.0,
            put_premium: 0.0,
            total_cost: 0.0,
            total_cost_per_contract: 0.0,
            upper_breakeven: spot * up,
            lower_breakeven: spot * down,
            required_move_pct: otm_pct,
            max_loss: 0.0,
            width: (spot * (up - down)).round(),
            width_pct: round_to((up - down) * 100.0, 2),
        }
    }
}

/// Nearest call at or above spot·(1 + otm) and put at or below spot·(1 − otm)
pub fn build_strangle(calls: &[OptionQuote], puts: &[OptionQuote], spot: f64, otm_pct: f64) -> Strangle {
    let call_target = spot * (1.0 + otm_pct / 100.0);
    let put_target = spot * (1.0 - otm_pct / 100.0);
    let (Some(call), Some(put)) = (
        nearest(calls, call_target, Nearest::AtOrAbove),
        nearest(puts, put_target, Nearest::AtOrBelow),
    ) else {
        return Strangle::empty(spot, otm_pct);
    };
    let total = call.mid_price() + put.mid_price();
    if total <= 0.0 || spot <= 0.0 {
        return Strangle::empty(spot, otm_pct);
    }
    let (ck, pk) = (call.strike, put.strike);
    let up_move = (ck + total - spot).abs() / spot;
    let down_move = (spot - pk + total).abs() / spot;
    Strangle {
        call_strike: ck,
        put_strike: pk,
        call_premium: round_to(call.mid_price(), 2),
        put_premium: round_to(put.mid_price(), 2),
        total_cost: round_to(total, 2),
        total_cost_per_contract: round_to(total * 100.0, 2),
        upper_breakeven: round_to(ck + total, 2),
        lower_breakeven: round_to(pk - total, 2),
        required_move_pct: round_to(up_move.max(down_move) * 100.0, 2),
        max_loss: round_to(total, 2),
        width: round_to(ck - pk, 2),
        width_pct: round_to((ck - pk) / spot * 100.0, 2),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IvRvContext {
    Cheap,
    Fair,
    Expensive,
}

impl IvRvContext {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.85 {
            Self::Cheap
        } else if ratio < 1.15 {
            Self::Fair
        } else {
            Self::Expensive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvVsRv {
    /// Percent
    pub atm_iv: f64,
    /// Percent, annualized over every close supplied
    pub realized_vol: f64,
    pub iv_rv_ratio: f64,
    pub iv_context: IvRvContext,
}

/// Decimal IV against full-history realized vol
pub fn iv_vs_rv(atm_iv: f64, closes: &[f64]) -> IvVsRv {
    let valid: Vec<f64> = closes.iter().copied().filter(|c| *c > 0.0).collect();
    let rv = if valid.len() >= MIN_RV_CLOSES {
        population_std(&log_returns(&valid)) * ANNUALIZATION_DAYS.sqrt()
    } else {
        0.0
    };
    let iv = if atm_iv > 0.0 { atm_iv } else { FALLBACK_IV };
    let ratio = if rv > MIN_RV { iv / rv } else { 1.0 };
    let ratio = round_to(ratio, 2);
    IvVsRv {
        atm_iv: round_to(iv * 100.0, 1),
        realized_vol: round_to(rv * 100.0, 1),
        iv_rv_ratio: ratio,
        iv_context: IvRvContext::from_ratio(ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionSide;
    use approx::assert_relative_eq;

    fn quote(strike: f64, side: OptionSide, bid: f64, ask: f64, last: f64) -> OptionQuote {
        OptionQuote::new(strike, side, 100, 0.25).with_prices(bid, ask, last)
    }

    fn ladder() -> (Vec<OptionQuote>, Vec<OptionQuote>) {
        let strikes = [90.0, 95.0, 100.0, 105.0, 110.0];
        let calls = strikes
            .iter()
            .map(|k| quote(*k, OptionSide::Call, (105.0 - k).max(1.0), (105.0 - k).max(1.0) + 0.2, 0.0))
            .collect();
        let puts = strikes
            .iter()
            .map(|k| quote(*k, OptionSide::Put, (k - 95.0).max(1.0), (k - 95.0).max(1.0) + 0.2, 0.0))
            .collect();
        (calls, puts)
    }

    #[test]
    fn test_straddle_at_nearest_strike() {
        let (calls, puts) = ladder();
        let s = build_straddle(&calls, &puts, 101.0);
        assert_eq!(s.strike, 100.0);
        assert_relative_eq!(s.total_cost, 10.2, epsilon = 1e-9);
        assert_relative_eq!(s.upper_breakeven, 110.2, epsilon = 1e-9);
        assert_relative_eq!(s.lower_breakeven, 89.8, epsilon = 1e-9);
        assert_relative_eq!(s.required_move_pct, 10.1, epsilon = 1e-9);
        assert_eq!(s.call_iv, 25.0);
    }

    #[test]
    fn test_last_price_fallback() {
        let calls = vec![quote(100.0, OptionSide::Call, 0.0, 2.0, 1.5)];
        let puts = vec![quote(100.0, OptionSide::Put, 1.0, 1.4, 0.0)];
        let s = build_straddle(&calls, &puts, 100.0);
        assert_relative_eq!(s.total_cost, 2.7, epsilon = 1e-9);
    }

    #[test]
    fn test_unpriced_straddle_is_empty() {
        let calls = vec![quote(100.0, OptionSide::Call, 0.0, 0.0, 0.0)];
        let puts = vec![quote(100.0, OptionSide::Put, 0.0, 0.0, 0.0)];
        let s = build_straddle(&calls, &puts, 100.4);
        assert!(!s.is_priced());
        assert_eq!(s.strike, 100.0);
        assert_eq!(s.upper_breakeven, 100.4);
        assert!(!build_straddle(&[], &puts, 100.0).is_priced());
    }

    #[test]
    fn test_strangle_otm_legs() {
        let (calls, puts) = ladder();
        let s = build_strangle(&calls, &puts, 100.0, 3.0);
        assert_eq!(s.call_strike, 105.0);
        assert_eq!(s.put_strike, 95.0);
        assert_relative_eq!(s.total_cost, 2.2, epsilon = 1e-9);
        assert_relative_eq!(s.width_pct, 10.0, epsilon = 1e-9);
        // max(|105 + 2.2 - 100|, |100 - 95 + 2.2|) / 100
        assert_relative_eq!(s.required_move_pct, 7.2, epsilon = 1e-9);
    }

    #[test]
    fn test_strangle_filter_falls_back() {
        let calls = vec![quote(100.0, OptionSide::Call, 1.0, 1.2, 0.0)];
        let puts = vec![quote(100.0, OptionSide::Put, 1.0, 1.2, 0.0)];
        let s = build_strangle(&calls, &puts, 100.0, 3.0);
        assert_eq!(s.call_strike, 100.0);
        assert_eq!(s.put_strike, 100.0);
    }

    #[test]
    fn test_iv_rv_flat_history_defaults_ratio() {
        let closes = vec![100.0; 30];
        let r = iv_vs_rv(0.25, &closes);
        assert_eq!(r.iv_rv_ratio, 1.0);
        assert_eq!(r.iv_context, IvRvContext::Fair);
        assert_eq!(iv_vs_rv(0.0, &closes).atm_iv, 30.0);
    }

    #[test]
    fn test_iv_rv_cheap_when_realized_high() {
        // Alternating ±2% days: realized ~32% annualized
        let closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 100.0 } else { 102.0 }).collect();
        let r = iv_vs_rv(0.15, &closes);
        assert!(r.realized_vol > 25.0);
        assert_eq!(r.iv_context, IvRvContext::Cheap);
    }
}
