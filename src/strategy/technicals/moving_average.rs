//! Simple moving averages and their alignment with price

use serde::{Deserialize, Serialize};

use crate::strategy::numeric::{mean, round_to};

pub const SMA_PERIODS: [usize; 3] = [20, 50, 200];

/// Slope threshold in percent for RISING/FALLING
const SLOPE_FLAT_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricePosition {
    Above,
    Below,
}

impl PricePosition {
    pub fn of(spot: f64, level: f64) -> Self {
        if spot > level {
            Self::Above
        } else {
            Self::Below
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlopeDirection {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaAlignment {
    FullBull,
    Bull,
    MixedBull,
    Neutral,
    MixedBear,
    Bear,
    FullBear,
    Unknown,
}

impl MaAlignment {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 3 => Self::FullBull,
            2 => Self::Bull,
            1 => Self::MixedBull,
            0 => Self::Neutral,
            -1 => Self::MixedBear,
            -2 => Self::Bear,
            _ => Self::FullBear,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FullBull => "Price above all major MAs: strong uptrend structure",
            Self::Bull => "Price above most MAs: uptrend intact",
            Self::MixedBull => "Mixed signals leaning bullish",
            Self::Neutral => "Mixed MA alignment, no clear trend",
            Self::MixedBear => "Mixed signals leaning bearish",
            Self::Bear => "Price below most MAs: downtrend intact",
            Self::FullBear => "Price below all major MAs: strong downtrend structure",
            Self::Unknown => "Insufficient data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossSignal {
    GoldenCrossRecent,
    DeathCrossRecent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmaReading {
    pub period: usize,
    pub value: f64,
    pub distance_pct: f64,
    pub position: PricePosition,
    pub slope: SlopeDirection,
    pub slope_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverages {
    pub sma_20: Option<SmaReading>,
    pub sma_50: Option<SmaReading>,
    pub sma_200: Option<SmaReading>,
    /// +1 per SMA below price, -1 per SMA above
    pub alignment: i32,
    pub alignment_label: MaAlignment,
    pub alignment_desc: String,
    pub alignment_details: Vec<String>,
    pub cross: Option<CrossSignal>,
}

impl Default for MovingAverages {
    fn default() -> Self {
        Self {
            sma_20: None,
            sma_50: None,
            sma_200: None,
            alignment: 0,
            alignment_label: MaAlignment::Unknown,
            alignment_desc: MaAlignment::Unknown.description().to_string(),
            alignment_details: Vec::new(),
            cross: None,
        }
    }
}

/// SMA over the last `period` closes, slope against the SMA `slope_window` bars earlier
pub fn sma_reading(closes: &[f64], period: usize, slope_window: usize) -> Option<SmaReading> {
    let n = closes.len();
    if period == 0 || n < period {
        return None;
    }
    let spot = closes[n - 1];
    let sma = mean(&closes[n - period..]);
    let lag = slope_window.min(period);
    let prev = if n >= period + lag {
        mean(&closes[n - period - lag..n - lag])
    } else {
        sma
    };
    let slope_pct = if prev > 0.0 { (sma - prev) / prev * 100.0 } else { 0.0 };
    let slope = if slope_pct > SLOPE_FLAT_BAND {
        SlopeDirection::Rising
    } else if slope_pct < -SLOPE_FLAT_BAND {
        SlopeDirection::Falling
    } else {
        SlopeDirection::Flat
    };
    let distance_pct = if sma != 0.0 { (spot - sma) / sma * 100.0 } else { 0.0 };

    Some(SmaReading {
        period,
        value: round_to(sma, 2),
        distance_pct: round_to(distance_pct, 2),
        position: PricePosition::of(spot, sma),
        slope,
        slope_pct: round_to(slope_pct, 2),
    })
}

pub fn compute_moving_averages(closes: &[f64], slope_window: usize, cross_band_pct: f64) -> MovingAverages {
    let [p20, p50, p200] = SMA_PERIODS;
    let sma_20 = sma_reading(closes, p20, slope_window);
    let sma_50 = sma_reading(closes, p50, slope_window);
    let sma_200 = sma_reading(closes, p200, slope_window);

    let mut alignment = 0;
    let mut details = Vec::new();
    for sma in [&sma_20, &sma_50, &sma_200].into_iter().flatten() {
        match sma.position {
            PricePosition::Above => {
                alignment += 1;
                details.push(format!("Above {}", sma.period));
            }
            PricePosition::Below => {
                alignment -= 1;
                details.push(format!("Below {}", sma.period));
            }
        }
    }

    let cross = match (&sma_50, &sma_200) {
        (Some(fast), Some(slow)) if slow.value > 0.0 => {
            let diff_pct = (fast.value - slow.value).abs() / slow.value * 100.0;
            if diff_pct >= cross_band_pct {
                None
            } else if fast.value > slow.value && fast.slope == SlopeDirection::Rising {
                Some(CrossSignal::GoldenCrossRecent)
            } else if fast.value < slow.value && fast.slope == SlopeDirection::Falling {
                Some(CrossSignal::DeathCrossRecent)
            } else {
                None
            }
        }
        _ => None,
    };

    let label = MaAlignment::from_score(alignment);
    MovingAverages {
        sma_20,
        sma_50,
        sma_200,
        alignment,
        alignment_label: label,
        alignment_desc: label.description().to_string(),
        alignment_details: details,
        cross,
    }
}
