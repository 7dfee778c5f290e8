//! Rolling and anchored VWAP with volume-weighted bands

use serde::{Deserialize, Serialize};

use super::moving_average::PricePosition;
use crate::domain::Bar;
use crate::strategy::numeric::round_to;

pub const VWAP_WINDOWS: [usize; 2] = [5, 20];
/// Bars in the anchored (roughly monthly) VWAP
const ANCHOR_BARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VwapContext {
    ExtendedAbove,
    Above,
    AtVwap,
    Below,
    ExtendedBelow,
    #[serde(rename = "N/A")]
    Unknown,
}

impl VwapContext {
    pub fn from_distance(dist: f64) -> Self {
        if dist > 2.0 {
            Self::ExtendedAbove
        } else if dist > 0.5 {
            Self::Above
        } else if dist > -0.5 {
            Self::AtVwap
        } else if dist > -2.0 {
            Self::Below
        } else {
            Self::ExtendedBelow
        }
    }

    fn describe(&self, dist: f64) -> String {
        match self {
            Self::ExtendedAbove => format!("Price {:+.1}% above 20d VWAP: extended, reversion target below", dist),
            Self::Above => "Price above 20d VWAP, institutional buyers in control".to_string(),
            Self::AtVwap => "Price near 20d VWAP: fair value, key decision level".to_string(),
            Self::Below => "Price below 20d VWAP, sellers in control; watch for reclaim".to_string(),
            Self::ExtendedBelow => format!("Price {:+.1}% below 20d VWAP: extended, reversion target above", dist),
            Self::Unknown => "Insufficient data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VwapBand {
    pub period: usize,
    pub value: f64,
    pub upper_1: f64,
    pub lower_1: f64,
    pub upper_2: f64,
    pub lower_2: f64,
    pub std: f64,
    pub distance_pct: f64,
    pub position: PricePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VwapReading {
    pub vwap_5d: Option<VwapBand>,
    pub vwap_20d: Option<VwapBand>,
    pub anchored_monthly: f64,
    pub context: VwapContext,
    pub context_desc: String,
}

impl Default for VwapReading {
    fn default() -> Self {
        Self {
            vwap_5d: None,
            vwap_20d: None,
            anchored_monthly: 0.0,
            context: VwapContext::Unknown,
            context_desc: VwapContext::Unknown.describe(0.0),
        }
    }
}

/// Zero or missing volume is weighted as 1
fn weight(bar: &Bar) -> f64 {
    if bar.volume > 0.0 {
        bar.volume
    } else {
        1.0
    }
}

fn vwap_of(bars: &[Bar]) -> Option<(f64, f64)> {
    let cum_vol: f64 = bars.iter().map(weight).sum();
    if cum_vol <= 0.0 {
        return None;
    }
    let vwap = bars.iter().map(|b| b.typical_price() * weight(b)).sum::<f64>() / cum_vol;
    let variance = bars
        .iter()
        .map(|b| weight(b) * (b.typical_price() - vwap).powi(2))
        .sum::<f64>()
        / cum_vol;
    Some((vwap, variance.sqrt()))
}

pub fn vwap_band(bars: &[Bar], period: usize, spot: f64) -> Option<VwapBand> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let (vwap, std) = vwap_of(&bars[bars.len() - period..])?;
    let distance_pct = if vwap > 0.0 { (spot - vwap) / vwap * 100.0 } else { 0.0 };
    Some(VwapBand {
        period,
        value: round_to(vwap, 2),
        upper_1: round_to(vwap + std, 2),
        lower_1: round_to(vwap - std, 2),
        upper_2: round_to(vwap + 2.0 * std, 2),
        lower_2: round_to(vwap - 2.0 * std, 2),
        std: round_to(std, 2),
        distance_pct: round_to(distance_pct, 2),
        position: PricePosition::of(spot, vwap),
    })
}

pub fn compute_vwap(bars: &[Bar]) -> VwapReading {
    if bars.len() < VWAP_WINDOWS[0] {
        return VwapReading::default();
    }
    let spot = bars[bars.len() - 1].close;
    let vwap_5d = vwap_band(bars, VWAP_WINDOWS[0], spot);
    let vwap_20d = vwap_band(bars, VWAP_WINDOWS[1], spot);

    let anchor = ANCHOR_BARS.min(bars.len());
    let anchored = vwap_of(&bars[bars.len() - anchor..]).map_or(spot, |(v, _)| v);

    let (context, context_desc) = match &vwap_20d {
        Some(band) => {
            let ctx = VwapContext::from_distance(band.distance_pct);
            (ctx, ctx.describe(band.distance_pct))
        }
        None => (VwapContext::Unknown, String::new()),
    };

    VwapReading {
        vwap_5d,
        vwap_20d,
        anchored_monthly: round_to(anchored, 2),
        context,
        context_desc,
    }
}
