//! What to expect, and what to do, at each key level

use serde::Serialize;

use super::collision::{collision_probability, CollisionLabel};
use crate::strategy::numeric::round_to;
use crate::strategy::regime::FlowRegime;

/// Levels within this % of spot (relative to spot) collapse into one entry
const MERGE_BAND_PCT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    MaxPain,
    CallWall,
    PutWall,
    FlipPoint,
    ChannelFloor,
    ChannelCeiling,
    AbsGammaStrike,
    Vwap,
}

impl LevelKind {
    /// Which kind leads a merged entry (lower wins)
    fn priority(self) -> u8 {
        match self {
            Self::FlipPoint => 0,
            Self::CallWall => 1,
            Self::PutWall => 2,
            Self::MaxPain => 3,
            Self::AbsGammaStrike => 4,
            Self::ChannelFloor => 5,
            Self::ChannelCeiling => 6,
            Self::Vwap => 99,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Above,
    Below,
}

impl Side {
    fn of(level: f64, spot: f64) -> Self {
        if level < spot {
            Self::Below
        } else {
            Self::Above
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelAction {
    pub level: f64,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: LevelKind,
    pub distance_pct: f64,
    pub side: Side,
    pub expectation: String,
    pub action: String,
    pub watch_for: String,
    /// Percent, one decimal
    pub collision_prob: f64,
    pub collision_label: CollisionLabel,
}

/// Levels to describe. Zero or missing levels are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyLevels {
    pub max_pain: f64,
    pub call_wall: f64,
    pub put_wall: f64,
    pub flip_point: Option<f64>,
    pub abs_gamma_strike: f64,
    pub channel_floor: Option<f64>,
    pub channel_ceiling: Option<f64>,
    pub vwap: Option<f64>,
}

struct Entry {
    level: f64,
    label: &'static str,
    kind: LevelKind,
    side: Side,
    expectation: String,
    action: String,
    watch_for: &'static str,
}

fn positive(level: Option<f64>) -> Option<f64> {
    level.filter(|l| *l > 0.0)
}

fn describe(spot: f64, flow: FlowRegime, wall_break: u32, lv: &KeyLevels) -> Vec<Entry> {
    let laminar = flow == FlowRegime::Laminar;
    let mut out = Vec::new();

    if lv.max_pain > 0.0 {
        let mp = lv.max_pain;
        out.push(if spot > mp {
            Entry {
                level: mp,
                label: "Max Pain",
                kind: LevelKind::MaxPain,
                side: Side::Below,
                expectation: "Charm and vanna re-hedging pulls price toward this strike. It is the gravitational center into expiry.".into(),
                action: "BUY PUTS while above for the drift down, or wait for arrival and BUY CALLS for the bounce.".into(),
                watch_for: "The drift speeds up in the final 3 DTE and is strongest after an IV event.",
            }
        } else {
            Entry {
                level: mp,
                label: "Max Pain",
                kind: LevelKind::MaxPain,
                side: Side::Above,
                expectation: "Price gravitates up toward max pain, where dealers benefit at expiry.".into(),
                action: "BUY CALLS for the upward drift. Works best in calm markets near expiry.".into(),
                watch_for: "Any catalyst can override the max-pain pull.",
            }
        });
    }

    if lv.call_wall > 0.0 {
        let cw = lv.call_wall;
        out.push(if laminar {
            Entry {
                level: cw,
                label: "Call Wall (Resistance)",
                kind: LevelKind::CallWall,
                side: Side::Above,
                expectation: format!("EXPECT REVERSAL. Dealers sell into this level. {}% chance it breaks.", wall_break),
                action: format!("BUY PUTS when price reaches ${:.0}. Fade the rejection.", cw),
                watch_for: "If the flow ratio crosses 1.0 the wall turns into an accelerator.",
            }
        } else {
            Entry {
                level: cw,
                label: "Call Wall (Breakout Trigger)",
                kind: LevelKind::CallWall,
                side: Side::Above,
                expectation: format!("EXPECT BREAKOUT. Short-gamma dealers turn the wall into fuel. {}% break probability.", wall_break),
                action: format!("BUY CALLS targeting ${:.0}. ADD if it breaks.", cw),
                watch_for: "A volume surge at the wall confirms the break; thin volume means a fake-out.",
            }
        });
    }

    if lv.put_wall > 0.0 {
        let pw = lv.put_wall;
        out.push(if laminar {
            Entry {
                level: pw,
                label: "Put Wall (Support)",
                kind: LevelKind::PutWall,
                side: Side::Below,
                expectation: "EXPECT BOUNCE. Dealers buy into this level.".into(),
                action: format!("BUY CALLS when price reaches ${:.0}, alongside the dealer buying.", pw),
                watch_for: "A break turns support into a trapdoor. Cut quickly.",
            }
        } else {
            Entry {
                level: pw,
                label: "Put Wall (Breakdown Trigger)",
                kind: LevelKind::PutWall,
                side: Side::Below,
                expectation: "EXPECT BREAKDOWN if reached. Dealers amplify the selling.".into(),
                action: format!("BUY PUTS if price approaches ${:.0}. A break accelerates lower.", pw),
                watch_for: "In negative gamma this level is a waterfall trigger.",
            }
        });
    }

    if let Some(flip) = positive(lv.flip_point) {
        out.push(Entry {
            level: flip,
            label: "GEX Flip Point (Regime Change)",
            kind: LevelKind::FlipPoint,
            side: Side::of(flip, spot),
            expectation: "REGIME CHANGE TRIGGER. Above it dealers stabilize, below it they amplify.".into(),
            action: format!("On a cross of ${:.0}: BUY PUTS on the break below, BUY CALLS on the reclaim.", flip),
            watch_for: "Wait for a closing price through the level. Intraday wicks are unreliable.",
        });
    }

    if let Some(floor) = positive(lv.channel_floor) {
        out.push(Entry {
            level: floor,
            label: "GEX Channel Floor",
            kind: LevelKind::ChannelFloor,
            side: Side::Below,
            expectation: "Dealer buying zone. Long gamma means dips are bought here mechanically.".into(),
            action: format!("BUY CALLS at ${:.0} alongside the forced dealer buying.", floor),
            watch_for: "The floor only holds in long gamma with laminar flow.",
        });
    }

    if let Some(ceiling) = positive(lv.channel_ceiling) {
        out.push(Entry {
            level: ceiling,
            label: "GEX Channel Ceiling",
            kind: LevelKind::ChannelCeiling,
            side: Side::Above,
            expectation: "Dealer selling zone. Long gamma means rips are sold here mechanically.".into(),
            action: format!("BUY PUTS at ${:.0}. Dealers sell alongside you.", ceiling),
            watch_for: "The ceiling breaks in turbulent flow. Only fade it when laminar.",
        });
    }

    if lv.abs_gamma_strike > 0.0 {
        let ags = lv.abs_gamma_strike;
        out.push(Entry {
            level: ags,
            label: "Absolute Gamma Strike (Magnet)",
            kind: LevelKind::AbsGammaStrike,
            side: Side::of(ags, spot),
            expectation: "Largest gamma concentration. Price is drawn here in the final days.".into(),
            action: format!("Inside 3-5 DTE expect pinning near ${:.0}. Trade toward it.", ags),
            watch_for: "Pinning is strongest within 0.5% of the strike over the last 3 days.",
        });
    }

    if let Some(vwap) = positive(lv.vwap) {
        out.push(if spot > vwap {
            Entry {
                level: vwap,
                label: "VWAP (Institutional Fair Value)",
                kind: LevelKind::Vwap,
                side: Side::of(vwap, spot),
                expectation: "Institutional mean-reversion target. Dips to VWAP tend to find buyers.".into(),
                action: format!("BUY CALLS on a dip to ${:.0}.", vwap),
                watch_for: "A heavy-volume slice through VWAP flips it to resistance.",
            }
        } else {
            Entry {
                level: vwap,
                label: "VWAP (Institutional Fair Value)",
                kind: LevelKind::Vwap,
                side: Side::of(vwap, spot),
                expectation: "Below VWAP sellers are in control. Rallies into it meet institutional supply.".into(),
                action: format!("BUY PUTS on a rally to ${:.0}, or BUY CALLS on a high-volume reclaim.", vwap),
                watch_for: "A reclaim on volume hands control from sellers to buyers.",
            }
        });
    }

    out
}

/// Merge entries whose levels sit within the band, leader by kind priority
fn consolidate(actions: Vec<LevelAction>, spot: f64) -> Vec<LevelAction> {
    let mut used = vec![false; actions.len()];
    let mut merged = Vec::with_capacity(actions.len());

    for i in 0..actions.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut group = vec![&actions[i]];
        for j in 0..actions.len() {
            if !used[j] && (actions[i].level - actions[j].level).abs() / spot * 100.0 < MERGE_BAND_PCT {
                used[j] = true;
                group.push(&actions[j]);
            }
        }
        if group.len() == 1 {
            merged.push(actions[i].clone());
            continue;
        }

        group.sort_by_key(|a| a.kind.priority());
        let mut primary = group[0].clone();
        let others: Vec<&str> = group[1..].iter().map(|a| a.label.as_str()).collect();
        primary.label = format!("{} + {}", primary.label, others.join(" + "));
        let extra: Vec<&str> = group[1..]
            .iter()
            .map(|a| a.expectation.as_str())
            .filter(|e| !e.is_empty() && *e != primary.expectation)
            .collect();
        if !extra.is_empty() {
            primary.expectation = format!("{} Additionally: {}", primary.expectation, extra.join(" "));
        }
        merged.push(primary);
    }
    merged
}

pub fn build_level_actions(spot: f64, flow: FlowRegime, wall_break: u32, levels: &KeyLevels, atr: f64, dte: u32) -> Vec<LevelAction> {
    if spot <= 0.0 {
        return Vec::new();
    }
    let actions = describe(spot, flow, wall_break, levels)
        .into_iter()
        .map(|e| {
            let p = collision_probability(spot, e.level, atr, dte);
            LevelAction {
                level: e.level,
                label: e.label.to_string(),
                kind: e.kind,
                distance_pct: round_to((spot - e.level).abs() / spot * 100.0, 2),
                side: e.side,
                expectation: e.expectation,
                action: e.action,
                watch_for: e.watch_for.to_string(),
                collision_prob: round_to(p * 100.0, 1),
                collision_label: CollisionLabel::from_probability(p),
            }
        })
        .collect();

    let mut actions = consolidate(actions, spot);
    actions.sort_by(|a, b| a.distance_pct.total_cmp(&b.distance_pct));
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> KeyLevels {
        KeyLevels {
            max_pain: 98.0,
            call_wall: 110.0,
            put_wall: 90.0,
            flip_point: Some(95.0),
            abs_gamma_strike: 105.0,
            channel_floor: None,
            channel_ceiling: None,
            vwap: None,
        }
    }

    #[test]
    fn test_sorted_by_distance() {
        let actions = build_level_actions(100.0, FlowRegime::Laminar, 20, &levels(), 2.0, 5);
        let d: Vec<f64> = actions.iter().map(|a| a.distance_pct).collect();
        assert_eq!(d, vec![2.0, 5.0, 5.0, 10.0, 10.0]);
        assert_eq!(actions[0].kind, LevelKind::MaxPain);
        assert_eq!(actions[0].side, Side::Below);
    }

    #[test]
    fn test_flow_regime_changes_wall_reading() {
        let laminar = build_level_actions(100.0, FlowRegime::Laminar, 20, &levels(), 2.0, 5);
        let turbulent = build_level_actions(100.0, FlowRegime::Turbulent, 70, &levels(), 2.0, 5);
        let wall = |v: &[LevelAction]| v.iter().find(|a| a.kind == LevelKind::CallWall).cloned();
        assert!(wall(&laminar).unwrap().expectation.starts_with("EXPECT REVERSAL"));
        let t = wall(&turbulent).unwrap();
        assert!(t.expectation.starts_with("EXPECT BREAKOUT"));
        assert!(t.expectation.contains("70%"));
    }

    #[test]
    fn test_coincident_levels_merge_under_priority() {
        let mut lv = levels();
        lv.channel_ceiling = Some(110.2);
        lv.abs_gamma_strike = 110.0;
        let actions = build_level_actions(100.0, FlowRegime::Laminar, 20, &lv, 2.0, 5);
        let merged: Vec<&LevelAction> = actions.iter().filter(|a| a.label.contains(" + ")).collect();
        assert_eq!(merged.len(), 1);
        let m = merged[0];
        assert_eq!(m.kind, LevelKind::CallWall);
        assert_eq!(m.label, "Call Wall (Resistance) + Absolute Gamma Strike (Magnet) + GEX Channel Ceiling");
        assert!(m.expectation.contains(" Additionally: "));
    }

    #[test]
    fn test_collision_fields() {
        let actions = build_level_actions(100.0, FlowRegime::Laminar, 20, &levels(), 2.0, 4);
        let mp = actions.iter().find(|a| a.kind == LevelKind::MaxPain).unwrap();
        // 2 * sqrt(4) / (2 * 2) = 1.0, capped at 0.95
        assert_eq!(mp.collision_prob, 95.0);
        assert_eq!(mp.collision_label, CollisionLabel::Likely);
        let cw = actions.iter().find(|a| a.kind == LevelKind::CallWall).unwrap();
        // 4 / 20 = 0.2
        assert_eq!(cw.collision_prob, 20.0);
        assert_eq!(cw.collision_label, CollisionLabel::Unlikely);
    }

    #[test]
    fn test_missing_levels_skipped() {
        let actions = build_level_actions(100.0, FlowRegime::Unknown, 15, &KeyLevels::default(), 0.0, 5);
        assert!(actions.is_empty());
    }
}
