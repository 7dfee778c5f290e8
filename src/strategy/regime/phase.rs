//! Phase-transition distance
//!
//! Share of recent sessions with amplified (positive) lag-1 autocorrelation.
//! Across a broad panel roughly 7% of days are amplified; sustained readings
//! above ~12.9% mark a regime flip from dampening to amplification.

use serde::{Deserialize, Serialize};

use super::acf::DailyAcf;
use crate::strategy::numeric::round_to;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseParams {
    /// Trailing sessions considered (default: 20)
    pub window: usize,
    /// Critical % of amplified days (default: 12.9)
    pub threshold_pct: f64,
    /// Fraction of the threshold that counts as approaching (default: 0.7)
    pub approach_fraction: f64,
    /// Lag-1 ACF above which a day is amplified (default: 0.05)
    pub amplified_above: f64,
}

impl Default for PhaseParams {
    fn default() -> Self {
        Self {
            window: 20,
            threshold_pct: 12.9,
            approach_fraction: 0.7,
            amplified_above: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseRegime {
    Laminar,
    Approaching,
    Turbulent,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReading {
    pub pct_amplified: f64,
    /// Threshold minus current %amplified; negative once past it
    pub distance_to_transition: f64,
    pub regime: PhaseRegime,
    pub warning: Option<String>,
    pub n_amplified_days: usize,
    pub window: usize,
}

impl Default for PhaseReading {
    fn default() -> Self {
        Self {
            pct_amplified: 0.0,
            distance_to_transition: 0.0,
            regime: PhaseRegime::Unknown,
            warning: None,
            n_amplified_days: 0,
            window: 0,
        }
    }
}

pub fn detect_phase_transition(daily: &[DailyAcf], params: &PhaseParams) -> PhaseReading {
    if daily.is_empty() {
        return PhaseReading::default();
    }

    let recent = &daily[daily.len().saturating_sub(params.window)..];
    let n_amplified = recent.iter().filter(|d| d.lag1_acf > params.amplified_above).count();
    let pct = 100.0 * n_amplified as f64 / recent.len() as f64;

    let (regime, warning) = if pct > params.threshold_pct {
        (
            PhaseRegime::Turbulent,
            Some("Above critical threshold: phase transition likely".to_string()),
        )
    } else if pct > params.threshold_pct * params.approach_fraction {
        (
            PhaseRegime::Approaching,
            Some("Approaching critical threshold: elevated risk".to_string()),
        )
    } else {
        (PhaseRegime::Laminar, None)
    };

    PhaseReading {
        pct_amplified: round_to(pct, 1),
        distance_to_transition: round_to(params.threshold_pct - pct, 1),
        regime,
        warning,
        n_amplified_days: n_amplified,
        window: recent.len(),
    }
}
