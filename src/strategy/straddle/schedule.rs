//! Time and price scenarios for a straddle: theta decay, empirical move
//! probability and P&L at key levels

use std::f64::consts::PI;

use serde::Serialize;

use super::structure::Straddle;
use crate::domain::Bar;
use crate::strategy::numeric::round_to;

/// Floor on remaining days in the theta formula
const MIN_T_DAYS: f64 = 0.5;
/// Extra DTE windows tested alongside the selected one
const MOVE_WINDOWS: [usize; 5] = [5, 7, 10, 14, 21];
const MIN_MOVE_BARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThetaDay {
    pub day: u32,
    pub days_left: u32,
    /// Dollars per share
    pub theta: f64,
    pub cumulative_decay_pct: f64,
    pub remaining_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThetaSchedule {
    pub daily_theta: f64,
    pub daily_theta_pct: f64,
    pub schedule: Vec<ThetaDay>,
    /// First day with at least half the premium gone, DTE when never reached
    pub half_life_day: u32,
}

impl ThetaSchedule {
    fn empty(dte: u32) -> Self {
        Self {
            daily_theta: 0.0,
            daily_theta_pct: 0.0,
            schedule: Vec::new(),
            half_life_day: dte,
        }
    }
}

/// ATM straddle theta ≈ S·σ / (2·√(2π·T)) with T in days, per day held
pub fn theta_schedule(straddle: &Straddle, dte: u32, atm_iv: f64, spot: f64, max_rows: u32) -> ThetaSchedule {
    let cost = straddle.total_cost;
    if cost <= 0.0 || dte == 0 || atm_iv <= 0.0 {
        return ThetaSchedule::empty(dte);
    }

    let mut remaining = cost;
    let schedule: Vec<ThetaDay> = (1..=dte.min(max_rows))
        .map(|day| {
            let t_days = ((dte - day) as f64).max(MIN_T_DAYS);
            let theta = spot * atm_iv / (2.0 * (2.0 * PI * t_days).sqrt()) / 365.0;
            remaining = (remaining - theta).max(0.0);
            ThetaDay {
                day,
                days_left: dte - day,
                theta: round_to(theta, 3),
                cumulative_decay_pct: round_to((1.0 - remaining / cost) * 100.0, 1),
                remaining_value: round_to(remaining, 2),
            }
        })
        .collect();

    let daily_theta = schedule.first().map_or(0.0, |d| d.theta);
    ThetaSchedule {
        daily_theta: round_to(daily_theta, 3),
        daily_theta_pct: round_to(daily_theta / cost * 100.0, 1),
        half_life_day: schedule
            .iter()
            .find(|d| d.cumulative_decay_pct >= 50.0)
            .map_or(dte, |d| d.day),
        schedule,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveWindow {
    pub dte: usize,
    /// Percent of windows whose max excursion reached the breakeven
    pub probability: f64,
    pub sample_size: usize,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MoveProbability {
    pub probability: f64,
    pub sample_size: usize,
    pub windows: Vec<MoveWindow>,
}

fn window_hit_rate(bars: &[Bar], window: usize, breakeven_pct: f64) -> (f64, usize) {
    let mut hits = 0usize;
    let mut total = 0usize;
    for i in 0..bars.len() - window {
        let entry = bars[i].close;
        if entry <= 0.0 {
            continue;
        }
        let span = &bars[i..i + window];
        let high = span.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = span.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let excursion = ((high - entry) / entry).max((entry - low) / entry) * 100.0;
        if excursion >= breakeven_pct {
            hits += 1;
        }
        total += 1;
    }
    let pct = if total > 0 { round_to(hits as f64 / total as f64 * 100.0, 1) } else { 0.0 };
    (pct, total)
}

/// Share of rolling windows over the trailing `lookback` bars whose max
/// excursion from the entry close reached `breakeven_pct`
pub fn move_probability(daily: &[Bar], dte: u32, breakeven_pct: f64, lookback: usize) -> MoveProbability {
    let valid: Vec<Bar> = daily
        .iter()
        .filter(|b| b.close > 0.0 && b.high > 0.0 && b.low > 0.0)
        .copied()
        .collect();
    let bars = &valid[valid.len().saturating_sub(lookback)..];
    let dte = dte as usize;
    if bars.len() < MIN_MOVE_BARS || dte == 0 || breakeven_pct <= 0.0 || bars.len() < dte + 5 {
        return MoveProbability::default();
    }

    let mut windows: Vec<MoveWindow> = Vec::new();
    for (idx, w) in std::iter::once(dte).chain(MOVE_WINDOWS).enumerate() {
        if w > bars.len() - 5 || windows.iter().any(|m| m.dte == w) {
            continue;
        }
        let (probability, sample_size) = window_hit_rate(bars, w, breakeven_pct);
        windows.push(MoveWindow {
            dte: w,
            probability,
            sample_size,
            is_current: idx == 0,
        });
    }
    windows.sort_by_key(|m| m.dte);

    let current = windows.iter().find(|m| m.is_current).or(windows.first());
    MoveProbability {
        probability: current.map_or(0.0, |m| m.probability),
        sample_size: current.map_or(0, |m| m.sample_size),
        windows,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlScenario {
    pub label: String,
    pub price: f64,
    pub move_pct: f64,
    /// Per share, at expiry
    pub pnl: f64,
    pub pnl_pct: f64,
    pub profitable: bool,
}

/// Intrinsic value minus premium at each level. Levels that coincide at
/// 0.1 precision share one row with joined labels. Sorted by price.
pub fn pnl_scenarios(straddle: &Straddle, spot: f64, levels: &[(&str, Option<f64>)]) -> Vec<PnlScenario> {
    let cost = straddle.total_cost;
    if cost <= 0.0 || spot <= 0.0 {
        return Vec::new();
    }

    let mut rows: Vec<(i64, PnlScenario)> = Vec::new();
    for (label, price) in levels {
        let Some(price) = price.filter(|p| *p > 0.0) else {
            continue;
        };
        let key = (price * 10.0).round() as i64;
        if let Some((_, existing)) = rows.iter_mut().find(|(k, _)| *k == key) {
            existing.label.push_str(" + ");
            existing.label.push_str(label);
            continue;
        }
        let pnl = (price - straddle.strike).abs() - cost;
        rows.push((
            key,
            PnlScenario {
                label: label.to_string(),
                price: round_to(price, 2),
                move_pct: round_to((price - spot).abs() / spot * 100.0, 2),
                pnl: round_to(pnl, 2),
                pnl_pct: round_to(pnl / cost * 100.0, 1),
                profitable: pnl > 0.0,
            },
        ));
    }

    let mut out: Vec<PnlScenario> = rows.into_iter().map(|(_, s)| s).collect();
    out.sort_by(|a, b| a.price.total_cmp(&b.price));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::structure::build_straddle;
    use crate::domain::{OptionQuote, OptionSide};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn straddle(cost_per_leg: f64) -> Straddle {
        let calls = vec![OptionQuote::new(100.0, OptionSide::Call, 100, 0.3).with_prices(cost_per_leg, cost_per_leg, 0.0)];
        let puts = vec![OptionQuote::new(100.0, OptionSide::Put, 100, 0.3).with_prices(cost_per_leg, cost_per_leg, 0.0)];
        build_straddle(&calls, &puts, 100.0)
    }

    fn bars(ranges: &[(f64, f64, f64)]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        ranges
            .iter()
            .enumerate()
            .map(|(i, &(h, l, c))| Bar::new(start + Duration::days(i as i64), c, h, l, c, 1_000.0))
            .collect()
    }

    #[test]
    fn test_theta_accelerates_into_expiry() {
        let s = straddle(2.5);
        let sched = theta_schedule(&s, 10, 0.30, 100.0, 21);
        assert_eq!(sched.schedule.len(), 10);
        let thetas: Vec<f64> = sched.schedule.iter().map(|d| d.theta).collect();
        assert!(thetas.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(sched.schedule.last().unwrap().days_left, 0);
        // Day 1: 100 * 0.3 / (2 * sqrt(2π * 9)) / 365
        assert_relative_eq!(sched.daily_theta, 0.005, epsilon = 1e-9);
    }

    #[test]
    fn test_theta_rows_capped() {
        let sched = theta_schedule(&straddle(2.5), 45, 0.30, 100.0, 21);
        assert_eq!(sched.schedule.len(), 21);
        assert_eq!(sched.half_life_day, 45);
        assert_eq!(theta_schedule(&straddle(0.0), 10, 0.3, 100.0, 21).schedule.len(), 0);
    }

    #[test]
    fn test_move_probability_all_hits() {
        // Every bar ranges ±3% around a flat 100 close
        let data = bars(&vec![(103.0, 97.0, 100.0); 60]);
        let mp = move_probability(&data, 7, 2.0, 252);
        assert_eq!(mp.probability, 100.0);
        assert_eq!(mp.sample_size, 53);
        let dtes: Vec<usize> = mp.windows.iter().map(|w| w.dte).collect();
        assert_eq!(dtes, vec![5, 7, 10, 14, 21]);
        assert!(mp.windows.iter().find(|w| w.dte == 7).unwrap().is_current);
    }

    #[test]
    fn test_move_probability_needs_history() {
        let data = bars(&vec![(101.0, 99.0, 100.0); 20]);
        assert_eq!(move_probability(&data, 7, 2.0, 252), MoveProbability::default());
        let flat = bars(&vec![(100.5, 99.5, 100.0); 40]);
        assert_eq!(move_probability(&flat, 5, 2.0, 252).probability, 0.0);
    }

    #[test]
    fn test_pnl_dedup_and_sort() {
        let s = straddle(2.5);
        let rows = pnl_scenarios(
            &s,
            100.0,
            &[("Call Wall", Some(110.0)), ("Put Wall", Some(92.0)), ("Ch Ceiling", Some(110.02)), ("Max Pain", None)],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, 92.0);
        assert_relative_eq!(rows[0].pnl, 3.0, epsilon = 1e-9);
        assert_eq!(rows[1].label, "Call Wall + Ch Ceiling");
        assert!(rows[1].profitable);
        assert_relative_eq!(rows[1].pnl_pct, 100.0, epsilon = 1e-9);
    }
}
