//! Vol-Premium Scorer
//!
//! Non-directional read: should an option buyer pay for a straddle or a
//! strangle here? Independent of the thesis engine; it consumes the same
//! regime, channel, technical and VRP readings.

pub mod expiry_scan;
pub mod schedule;
pub mod scoring;
pub mod structure;

pub use expiry_scan::{scan_expirations, ExpiryCandidate, ExpiryScan};
pub use schedule::{move_probability, pnl_scenarios, theta_schedule, MoveProbability, MoveWindow, PnlScenario, ThetaDay, ThetaSchedule};
pub use scoring::{
    score_catalyst, score_iv, score_regime, score_structural, vrp_drag, CatalystSignals, StraddleScore, StraddleVerdict,
    StructuralSignals,
};
pub use structure::{build_straddle, build_strangle, iv_vs_rv, IvRvContext, IvVsRv, Straddle, Strangle};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{closes, Bar, OptionsChain};
use crate::strategy::exposure::{EntropyRegime, GammaRegime};
use crate::strategy::levels::GammaChannel;
use crate::strategy::numeric::round_to;
use crate::strategy::regime::{AcfReading, FlowReading, FlowRegime, PhaseReading};
use crate::strategy::technicals::Technicals;
use crate::strategy::volatility::{VrpContext, VrpReading};

/// Decimal IV used when the flow reading found no near-ATM IV
const FALLBACK_ATM_IV: f64 = 0.30;

/// Straddle scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StraddleParams {
    /// Strangle legs sit this % away from spot (default: 3.0)
    pub strangle_otm_pct: f64,
    /// Daily bars used for the move-probability backtest (default: 252)
    pub move_lookback_bars: usize,
    /// Rows in the theta schedule (default: 21)
    pub theta_max_rows: u32,
    /// Expirations ranked by the expiry scan (default: 6)
    pub expiry_scan_max: usize,
}

impl Default for StraddleParams {
    fn default() -> Self {
        Self {
            strangle_otm_pct: 3.0,
            move_lookback_bars: 252,
            theta_max_rows: 21,
            expiry_scan_max: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtrContext {
    pub atr_pct: f64,
    pub breakeven_pct: f64,
    /// ATR% / breakeven%
    pub atr_coverage: f64,
    pub days_to_breakeven: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VrpAdjustment {
    pub drag: i32,
    pub context: VrpContext,
    pub note: Option<String>,
    pub vrp_gex_adjusted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StraddleAnalysis {
    pub straddle: Straddle,
    pub strangle: Strangle,
    pub iv_vs_rv: IvVsRv,
    pub atr_context: AtrContext,
    pub move_probability: MoveProbability,
    pub theta_schedule: ThetaSchedule,
    pub pnl_scenarios: Vec<PnlScenario>,
    pub score: StraddleScore,
    pub vrp: VrpAdjustment,
    pub verdict: StraddleVerdict,
    pub verdict_label: String,
    pub reasoning: Vec<String>,
    pub warnings: Vec<String>,
    pub suggested_dte: String,
    pub suggested_sizing: String,
}

/// Everything the scorer reads
#[derive(Debug, Clone, Copy)]
pub struct StraddleInputs<'a> {
    pub chain: &'a OptionsChain,
    pub daily: &'a [Bar],
    pub acf: &'a AcfReading,
    pub flow: &'a FlowReading,
    pub phase: &'a PhaseReading,
    pub gamma: GammaRegime,
    pub entropy: EntropyRegime,
    pub channel: &'a GammaChannel,
    pub technicals: &'a Technicals,
    pub vrp: &'a VrpReading,
    pub call_wall: f64,
    pub put_wall: f64,
    pub max_pain: f64,
}

fn reasoning(inp: &StraddleInputs, iv_rv: &IvVsRv, straddle: &Straddle, atr_pct: f64) -> Vec<String> {
    let ratio = inp.flow.ratio;
    let acf1 = inp.acf.mean_acf1;
    let mut out = vec![match inp.flow.regime {
        FlowRegime::Turbulent => format!(
            "Flow TURBULENT (ratio {:.2}): dealers are overwhelmed and walls become accelerators",
            ratio
        ),
        FlowRegime::Transitional => format!(
            "Flow TRANSITIONAL (ratio {:.2}): approaching breakout territory, walls may not hold",
            ratio
        ),
        _ => format!("Flow LAMINAR (ratio {:.2}): dealers absorb flow and moves get dampened", ratio),
    }];

    out.push(if acf1 > 0.05 {
        format!(
            "ACF amplified ({:+.3}, {:.0}% amplified days): moves follow through",
            acf1, inp.acf.pct_amplified
        )
    } else if acf1 < -0.05 {
        format!("ACF dampened ({:+.3}): moves reverse, mean reversion hurts straddles", acf1)
    } else {
        format!("ACF neutral ({:+.3}): no strong persistence", acf1)
    });

    let r = iv_rv.iv_rv_ratio;
    out.push(match iv_rv.iv_context {
        IvRvContext::Cheap => format!("IV is CHEAP against realized (ratio {:.2}): the market underprices movement", r),
        IvRvContext::Fair => format!("IV is fairly priced (ratio {:.2}): a regime catalyst is needed", r),
        IvRvContext::Expensive => format!("IV is EXPENSIVE (ratio {:.2}): rich premium and distant breakevens", r),
    });

    out.push(if inp.gamma == GammaRegime::NegativeGamma {
        "Negative gamma: dealer hedging amplifies moves in both directions".to_string()
    } else {
        "Positive gamma: dealer hedging absorbs moves, a headwind for straddles".to_string()
    });

    if inp.phase.regime == crate::strategy::regime::PhaseRegime::Turbulent {
        out.push("Phase transition active: regime instability adds move potential".to_string());
    } else if let Some(w) = &inp.phase.warning {
        out.push(format!("Phase alert: {}", w));
    }

    let be = straddle.required_move_pct;
    if atr_pct > 0.0 && be > 0.0 {
        let coverage = atr_pct / be;
        let days = be / atr_pct;
        out.push(if coverage > 1.5 {
            format!(
                "ATR ({:.1}%) is {:.1}x the breakeven ({:.1}%): a normal day reaches it in ~{:.0} day",
                atr_pct, coverage, be, days
            )
        } else if coverage > 1.0 {
            format!("ATR ({:.1}%) covers the breakeven ({:.1}%) in ~{:.0} day of normal range", atr_pct, be, days)
        } else {
            format!(
                "ATR ({:.1}%) is only {:.1}x the breakeven ({:.1}%): needs ~{:.0} days of trending",
                atr_pct, coverage, be, days
            )
        });
    }
    out
}

fn warnings(inp: &StraddleInputs, straddle: &Straddle, strangle: &Strangle, iv_rv: &IvVsRv, atr_pct: f64) -> Vec<String> {
    let mut out = Vec::new();
    let be = straddle.required_move_pct;
    let dte = inp.chain.dte;
    if be > 3.0 {
        out.push(format!(
            "Straddle needs a {:.1}% move to break even, consider the cheaper strangle",
            be
        ));
    }
    if dte <= 5 {
        out.push(format!(
            "Only {} DTE: theta decay ~${:.2}/day per share, the move must come quickly",
            dte,
            straddle.total_cost / dte.max(1) as f64
        ));
    } else if dte <= 10 {
        out.push(format!("{} DTE: moderate theta pressure, close within 5 days if the move stalls", dte));
    }
    if iv_rv.iv_context == IvRvContext::Expensive {
        out.push("IV is expensive: a vol crush hurts even if the stock moves".to_string());
    }
    if inp.flow.regime == FlowRegime::Laminar {
        out.push("LAMINAR flow: dealers absorb moves, straddles usually lose in a range".to_string());
    }
    if straddle.total_cost > 0.0 && strangle.total_cost > 0.0 {
        let savings = (1.0 - strangle.total_cost / straddle.total_cost) * 100.0;
        if savings > 30.0 {
            out.push(format!(
                "Strangle is {:.0}% cheaper than the straddle if you expect a large move",
                savings
            ));
        }
    }
    if atr_pct > 0.0 && be > 0.0 && atr_pct / be < 0.7 {
        out.push(format!(
            "ATR ({:.1}%) is well below the breakeven ({:.1}%): typical daily range won't pay",
            atr_pct, be
        ));
    }
    out
}

fn guidance(verdict: StraddleVerdict, flow: FlowRegime) -> (&'static str, &'static str) {
    match verdict {
        StraddleVerdict::BuyStraddle | StraddleVerdict::BuyStrangle => (
            if flow == FlowRegime::Turbulent {
                "5-10 DTE: move expected soon"
            } else {
                "10-21 DTE: give the catalyst time"
            },
            "1-2% of account, defined risk (max loss = premium paid)",
        ),
        StraddleVerdict::Consider => (
            "14-21 DTE: extra time for the setup to develop",
            "0.5-1% of account, smaller size for marginal setups",
        ),
        StraddleVerdict::Avoid => ("N/A: setup not recommended", "0%: stay flat"),
    }
}

pub fn analyze_straddles(inp: &StraddleInputs, params: &StraddleParams) -> StraddleAnalysis {
    let chain = inp.chain;
    let spot = chain.spot;
    let dte = chain.dte;
    let atm_iv = if inp.flow.atm_iv > 0.0 { inp.flow.atm_iv } else { FALLBACK_ATM_IV };
    let atr_pct = inp.technicals.atr.atr_pct;
    let channel_width = inp.channel.width_pct.unwrap_or(0.0);
    let daily_closes = closes(inp.daily);

    let straddle = build_straddle(&chain.calls, &chain.puts, spot);
    let strangle = build_strangle(&chain.calls, &chain.puts, spot, params.strangle_otm_pct);
    let iv_rv = iv_vs_rv(atm_iv, &daily_closes);

    let regime = score_regime(inp.flow.regime, inp.acf.mean_acf1, inp.acf.pct_amplified);
    let iv = score_iv(iv_rv.iv_rv_ratio, atm_iv);
    let catalyst = score_catalyst(&CatalystSignals {
        phase: inp.phase.regime,
        distance_to_transition: inp.phase.distance_to_transition,
        at_squeeze_ceiling: inp.acf.at_squeeze_ceiling,
        stability: inp.acf.stability,
        channel_width_pct: channel_width,
        sei: inp.acf.self_excitation.sei,
    });
    let structural = score_structural(&StructuralSignals {
        gamma: inp.gamma,
        channel_width_pct: channel_width,
        ratio: inp.flow.ratio,
        breakeven_pct: straddle.required_move_pct,
        atr_pct,
        entropy: inp.entropy,
    });
    let (drag, vrp_note) = vrp_drag(inp.vrp.context, inp.vrp.vrp_gex_adjusted);
    let total = regime + iv + catalyst + structural + drag;

    let be = straddle.required_move_pct;
    let (verdict, verdict_label) = StraddleVerdict::determine(total, iv_rv.iv_rv_ratio, be);
    let (suggested_dte, suggested_sizing) = guidance(verdict, inp.flow.regime);

    let reasoning = reasoning(inp, &iv_rv, &straddle, atr_pct);
    let mut warnings = warnings(inp, &straddle, &strangle, &iv_rv, atr_pct);
    if let Some(note) = &vrp_note {
        warnings.insert(0, note.clone());
    }

    let atr_context = if atr_pct > 0.0 && be > 0.0 {
        AtrContext {
            atr_pct: round_to(atr_pct, 2),
            breakeven_pct: round_to(be, 2),
            atr_coverage: round_to(atr_pct / be, 2),
            days_to_breakeven: round_to(be / atr_pct, 1),
        }
    } else {
        AtrContext {
            atr_pct: round_to(atr_pct, 2),
            breakeven_pct: round_to(be, 2),
            atr_coverage: 0.0,
            days_to_breakeven: 0.0,
        }
    };

    let vwap = inp.technicals.vwap.vwap_20d.as_ref();
    let levels = [
        ("Call Wall", Some(inp.call_wall)),
        ("Put Wall", Some(inp.put_wall)),
        ("Max Pain", Some(inp.max_pain)),
        ("Ch Floor", inp.channel.floor),
        ("Ch Ceiling", inp.channel.ceiling),
        ("VWAP 20d", vwap.map(|b| b.value)),
        ("VWAP +1σ", vwap.map(|b| b.upper_1)),
        ("VWAP -1σ", vwap.map(|b| b.lower_1)),
    ];

    debug!(
        "Straddle score {} (regime {}, iv {}, catalyst {}, structural {}, vrp {}): {:?}",
        total, regime, iv, catalyst, structural, drag, verdict
    );

    StraddleAnalysis {
        move_probability: move_probability(inp.daily, dte, be, params.move_lookback_bars),
        theta_schedule: theta_schedule(&straddle, dte, atm_iv, spot, params.theta_max_rows),
        pnl_scenarios: pnl_scenarios(&straddle, spot, &levels),
        score: StraddleScore {
            total,
            regime,
            iv,
            catalyst,
            structural,
            vrp_drag: drag,
        },
        vrp: VrpAdjustment {
            drag,
            context: inp.vrp.context,
            note: vrp_note,
            vrp_gex_adjusted: inp.vrp.vrp_gex_adjusted,
        },
        verdict,
        verdict_label: verdict_label.to_string(),
        reasoning,
        warnings,
        suggested_dte: suggested_dte.to_string(),
        suggested_sizing: suggested_sizing.to_string(),
        atr_context,
        straddle,
        strangle,
        iv_vs_rv: iv_rv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionQuote, OptionSide};
    use crate::strategy::regime::{AcfStability, PhaseRegime};
    use crate::strategy::technicals::TechnicalsParams;
    use chrono::{Duration, TimeZone, Utc};

    fn chain(leg: f64) -> OptionsChain {
        let calls = vec![
            OptionQuote::new(100.0, OptionSide::Call, 1_000, 0.18).with_prices(leg, leg, 0.0),
            OptionQuote::new(105.0, OptionSide::Call, 1_000, 0.18).with_prices(0.3, 0.3, 0.0),
        ];
        let puts = vec![
            OptionQuote::new(95.0, OptionSide::Put, 1_000, 0.18).with_prices(0.3, 0.3, 0.0),
            OptionQuote::new(100.0, OptionSide::Put, 1_000, 0.18).with_prices(leg, leg, 0.0),
        ];
        OptionsChain::new(100.0, 10, calls, puts)
    }

    fn daily(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::new(start + Duration::days(i as i64), *c, c * 1.01, c * 0.99, *c, 1e6))
            .collect()
    }

    fn technicals(atr_pct: f64) -> Technicals {
        let mut t = Technicals::empty("SPY", &TechnicalsParams::default());
        t.atr.atr_pct = atr_pct;
        t
    }

    #[test]
    fn test_turbulent_cheap_tight_channel_buys() {
        let chain = chain(1.0);
        let bars = daily(&(0..60).map(|i| if i % 2 == 0 { 100.0 } else { 102.0 }).collect::<Vec<_>>());
        let mut acf = AcfReading::fallback();
        acf.mean_acf1 = 0.12;
        acf.pct_amplified = 20.0;
        acf.stability = AcfStability::Unreliable;
        acf.self_excitation.sei = 200.0;
        let flow = FlowReading {
            ratio: 1.8,
            regime: FlowRegime::Turbulent,
            atm_iv: 0.18,
            ..FlowReading::default()
        };
        let phase = PhaseReading {
            regime: PhaseRegime::Turbulent,
            distance_to_transition: -5.0,
            ..PhaseReading::default()
        };
        let channel = GammaChannel {
            floor: Some(99.0),
            ceiling: Some(100.8),
            width_pct: Some(1.8),
            channel_position: Some(0.55),
            ..GammaChannel::default()
        };
        let tech = technicals(3.0);
        let vrp = VrpReading::default();
        let inputs = StraddleInputs {
            chain: &chain,
            daily: &bars,
            acf: &acf,
            flow: &flow,
            phase: &phase,
            gamma: GammaRegime::NegativeGamma,
            entropy: EntropyRegime::Dispersed,
            channel: &channel,
            technicals: &tech,
            vrp: &vrp,
            call_wall: 105.0,
            put_wall: 95.0,
            max_pain: 100.0,
        };
        let a = analyze_straddles(&inputs, &StraddleParams::default());
        assert_eq!(a.iv_vs_rv.iv_context, IvRvContext::Cheap);
        assert_eq!(a.score.regime, 25);
        assert_eq!(a.score.iv, 25);
        assert_eq!(a.score.catalyst, 25);
        // 8 + 5 + 4 + 5 (coverage exactly 1.5)
        assert_eq!(a.score.structural, 22);
        assert!(a.score.total >= 70);
        assert_eq!(a.verdict, StraddleVerdict::BuyStraddle);
        assert!(a.suggested_dte.starts_with("5-10"));
        assert_eq!(a.atr_context.atr_coverage, 1.5);
        assert!(!a.pnl_scenarios.is_empty());
        assert!(!a.theta_schedule.schedule.is_empty());
    }

    #[test]
    fn test_laminar_expensive_avoids() {
        let chain = chain(1.0);
        let bars = daily(&vec![100.0; 40]);
        let mut acf = AcfReading::fallback();
        acf.mean_acf1 = -0.15;
        let flow = FlowReading {
            ratio: 0.2,
            regime: FlowRegime::Laminar,
            atm_iv: 0.5,
            ..FlowReading::default()
        };
        let phase = PhaseReading {
            regime: PhaseRegime::Laminar,
            ..PhaseReading::default()
        };
        let tech = technicals(1.0);
        let vrp = VrpReading {
            context: VrpContext::HighPremium,
            vrp_gex_adjusted: 8.0,
            ..VrpReading::default()
        };
        let channel = GammaChannel::default();
        let inputs = StraddleInputs {
            chain: &chain,
            daily: &bars,
            acf: &acf,
            flow: &flow,
            phase: &phase,
            gamma: GammaRegime::PositiveGamma,
            entropy: EntropyRegime::Dispersed,
            channel: &channel,
            technicals: &tech,
            vrp: &vrp,
            call_wall: 105.0,
            put_wall: 95.0,
            max_pain: 100.0,
        };
        let a = analyze_straddles(&inputs, &StraddleParams::default());
        assert_eq!(a.score.vrp_drag, -12);
        assert_eq!(a.score.total, 5 + 2 - 12);
        assert_eq!(a.verdict, StraddleVerdict::Avoid);
        assert!(a.warnings[0].starts_with("Elevated VRP"));
        assert!(a.warnings.iter().any(|w| w.starts_with("LAMINAR")));
        assert_eq!(a.suggested_sizing, "0%: stay flat");
    }
}
