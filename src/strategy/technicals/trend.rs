//! Synthesis of MA alignment, ATR and relative strength into a trend read

use serde::{Deserialize, Serialize};

use super::atr::AtrReading;
use super::moving_average::MovingAverages;
use super::relative_strength::RelativeStrength;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    StrongUptrend,
    Uptrend,
    StrongDowntrend,
    Downtrend,
    Rangebound,
    Transitional,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolLabel {
    HighVol,
    NormalVol,
    LowVol,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechBias {
    Bullish,
    LeanBullish,
    Neutral,
    LeanBearish,
    Bearish,
}

impl TechBias {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 2 => Self::Bullish,
            1 => Self::LeanBullish,
            s if s <= -2 => Self::Bearish,
            -1 => Self::LeanBearish,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReading {
    pub trend_label: TrendLabel,
    pub trend_desc: String,
    /// -2..=2
    pub trend_score: i32,
    pub vol_label: VolLabel,
    pub vol_desc: String,
    pub tech_bias: TechBias,
}

impl Default for TrendReading {
    fn default() -> Self {
        Self {
            trend_label: TrendLabel::Unknown,
            trend_desc: "Insufficient data".to_string(),
            trend_score: 0,
            vol_label: VolLabel::Unknown,
            vol_desc: String::new(),
            tech_bias: TechBias::Neutral,
        }
    }
}

pub fn classify_trend(mas: &MovingAverages, atr: &AtrReading, rs: &RelativeStrength) -> TrendReading {
    let alignment = mas.alignment;
    let (trend_label, trend_desc, trend_score) = if alignment >= 2 && rs.rs_label.is_leading() {
        (TrendLabel::StrongUptrend, "Bullish structure confirmed by relative strength", 2)
    } else if alignment >= 2 {
        (TrendLabel::Uptrend, "Above major MAs, uptrend structure intact", 1)
    } else if alignment <= -2 && rs.rs_label.is_lagging() {
        (TrendLabel::StrongDowntrend, "Bearish structure confirmed by relative weakness", -2)
    } else if alignment <= -2 {
        (TrendLabel::Downtrend, "Below major MAs, downtrend structure", -1)
    } else if alignment.abs() <= 1 {
        (TrendLabel::Rangebound, "Mixed MAs, likely range-bound", 0)
    } else {
        (TrendLabel::Transitional, "Trend is shifting, watch for confirmation", 0)
    };

    let atr_pct = atr.atr_pct;
    let (vol_label, vol_desc) = if atr_pct > 3.0 {
        (VolLabel::HighVol, format!("ATR {:.1}%: wide daily ranges, use wider stops", atr_pct))
    } else if atr_pct > 1.5 {
        (VolLabel::NormalVol, format!("ATR {:.1}%: typical daily ranges", atr_pct))
    } else {
        (VolLabel::LowVol, format!("ATR {:.1}%: compressed ranges, potential squeeze", atr_pct))
    };

    TrendReading {
        trend_label,
        trend_desc: trend_desc.to_string(),
        trend_score,
        vol_label,
        vol_desc,
        tech_bias: TechBias::from_score(trend_score),
    }
}
