use serde::Serialize;

use crate::domain::OptionQuote;
use crate::strategy::exposure::CONTRACT_MULTIPLIER;
use crate::strategy::numeric::round_to;

/// Walls kept on each side for context
const TOP_WALLS: usize = 5;

/// Total option-holder payout if the underlying settles at `strike`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PainPoint {
    pub strike: f64,
    pub total_pain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaxPain {
    /// 0.0 for an empty chain
    pub max_pain: f64,
    pub max_pain_value: f64,
    pub pain_by_strike: Vec<PainPoint>,
}

/// Settlement price minimizing total intrinsic payout.
/// Candidates are the listed strikes; ties resolve to the lowest strike.
pub fn max_pain(calls: &[OptionQuote], puts: &[OptionQuote]) -> MaxPain {
    let mut strikes: Vec<f64> = calls.iter().chain(puts.iter()).map(|q| q.strike).collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();

    let pain_by_strike: Vec<PainPoint> = strikes
        .iter()
        .map(|&s| {
            let call_pain: f64 = calls
                .iter()
                .filter(|c| s > c.strike)
                .map(|c| (s - c.strike) * c.open_interest as f64 * CONTRACT_MULTIPLIER)
                .sum();
            let put_pain: f64 = puts
                .iter()
                .filter(|p| s < p.strike)
                .map(|p| (p.strike - s) * p.open_interest as f64 * CONTRACT_MULTIPLIER)
                .sum();
            PainPoint {
                strike: s,
                total_pain: round_to(call_pain + put_pain, 2),
            }
        })
        .collect();

    let best = pain_by_strike
        .iter()
        .fold(None, |best: Option<&PainPoint>, p| match best {
            Some(b) if b.total_pain <= p.total_pain => Some(b),
            _ => Some(p),
        })
        .copied();

    MaxPain {
        max_pain: best.map(|b| b.strike).unwrap_or(0.0),
        max_pain_value: best.map(|b| b.total_pain).unwrap_or(0.0),
        pain_by_strike,
    }
}

/// Strike with concentrated open interest; `strike == 0` marks an absent wall
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Wall {
    pub strike: f64,
    pub oi: u64,
}

impl Wall {
    pub fn is_present(&self) -> bool {
        self.strike > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OiWalls {
    pub call_wall: Wall,
    pub put_wall: Wall,
    pub top_call_walls: Vec<Wall>,
    pub top_put_walls: Vec<Wall>,
}

fn ranked_walls<'a>(quotes: impl Iterator<Item = &'a OptionQuote>) -> Vec<Wall> {
    let mut walls: Vec<Wall> = quotes
        .map(|q| Wall {
            strike: q.strike,
            oi: q.open_interest,
        })
        .collect();
    // Stable: equal OI keeps chain order
    walls.sort_by(|a, b| b.oi.cmp(&a.oi));
    walls
}

/// Highest-OI call above spot and highest-OI put below spot
pub fn find_oi_walls(calls: &[OptionQuote], puts: &[OptionQuote], spot: f64) -> OiWalls {
    let calls_above = ranked_walls(calls.iter().filter(|c| c.strike > spot));
    let puts_below = ranked_walls(puts.iter().filter(|p| p.strike < spot));

    OiWalls {
        call_wall: calls_above.first().copied().unwrap_or_default(),
        put_wall: puts_below.first().copied().unwrap_or_default(),
        top_call_walls: calls_above.into_iter().take(TOP_WALLS).collect(),
        top_put_walls: puts_below.into_iter().take(TOP_WALLS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionSide;

    fn call(k: f64, oi: u64) -> OptionQuote {
        OptionQuote::new(k, OptionSide::Call, oi, 0.3)
    }

    fn put(k: f64, oi: u64) -> OptionQuote {
        OptionQuote::new(k, OptionSide::Put, oi, 0.3)
    }

    #[test]
    fn test_max_pain_balanced_chain() {
        let calls = vec![call(95.0, 100), call(100.0, 100), call(105.0, 100)];
        let puts = vec![put(95.0, 100), put(100.0, 100), put(105.0, 100)];
        let pain = max_pain(&calls, &puts);
        assert_eq!(pain.max_pain, 100.0);
        assert_eq!(pain.pain_by_strike.len(), 3);
        // At 100: call 95 pays 5*100*100, put 105 pays 5*100*100
        assert_eq!(pain.max_pain_value, 100_000.0);
    }

    #[test]
    fn test_max_pain_single_strike() {
        let pain = max_pain(&[call(50.0, 10)], &[put(50.0, 30)]);
        assert_eq!(pain.max_pain, 50.0);
        assert_eq!(pain.max_pain_value, 0.0);
    }

    #[test]
    fn test_max_pain_empty_chain() {
        let pain = max_pain(&[], &[]);
        assert_eq!(pain.max_pain, 0.0);
        assert!(pain.pain_by_strike.is_empty());
    }

    #[test]
    fn test_max_pain_order_invariant() {
        let mut calls = vec![call(90.0, 300), call(100.0, 50), call(110.0, 900)];
        let mut puts = vec![put(90.0, 800), put(100.0, 40), put(110.0, 20)];
        let a = max_pain(&calls, &puts);
        calls.reverse();
        puts.reverse();
        let b = max_pain(&calls, &puts);
        assert_eq!(a.max_pain, b.max_pain);
        assert_eq!(a.max_pain_value, b.max_pain_value);
    }

    #[test]
    fn test_max_pain_tie_takes_lowest_strike() {
        // No OI anywhere: every candidate has zero pain
        let pain = max_pain(&[call(110.0, 0), call(100.0, 0)], &[put(105.0, 0)]);
        assert_eq!(pain.max_pain, 100.0);
    }

    #[test]
    fn test_walls_sides_and_ranking() {
        let calls = vec![call(95.0, 9_999), call(105.0, 500), call(110.0, 2_000), call(115.0, 2_000)];
        let puts = vec![put(90.0, 1_500), put(95.0, 700), put(105.0, 9_999)];
        let walls = find_oi_walls(&calls, &puts, 100.0);
        assert_eq!(walls.call_wall, Wall { strike: 110.0, oi: 2_000 });
        assert_eq!(walls.put_wall, Wall { strike: 90.0, oi: 1_500 });
        assert_eq!(walls.top_call_walls.len(), 3);
        assert_eq!(walls.top_put_walls.len(), 2);
    }

    #[test]
    fn test_missing_walls_are_sentinels() {
        let walls = find_oi_walls(&[call(90.0, 10)], &[put(110.0, 10)], 100.0);
        assert!(!walls.call_wall.is_present());
        assert!(!walls.put_wall.is_present());
        assert_eq!(walls.put_wall.oi, 0);
    }
}
