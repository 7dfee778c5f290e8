//! GEX concentration entropy
//!
//! Shannon entropy of |net GEX| shares across near-spot strikes.
//! Low normalized entropy means dealer gamma is clustered at a few strikes,
//! which makes the hedging equilibrium fragile.

use serde::{Deserialize, Serialize};

use super::{ExposureParams, ExposureRow};
use crate::strategy::numeric::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntropyRegime {
    /// Normalized entropy < 0.3
    Critical,
    /// < 0.5
    Approaching,
    /// < 0.7
    Moderate,
    Dispersed,
}

impl EntropyRegime {
    pub fn from_norm(norm: f64) -> Self {
        if norm < 0.3 {
            Self::Critical
        } else if norm < 0.5 {
            Self::Approaching
        } else if norm < 0.7 {
            Self::Moderate
        } else {
            Self::Dispersed
        }
    }
}

/// Share of near-spot |GEX| held by one strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrikeShare {
    pub strike: f64,
    pub gex_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntropyReading {
    pub entropy: f64,
    pub entropy_norm: f64,
    pub regime: EntropyRegime,
    pub description: String,
    pub n_strikes: usize,
    pub top_concentrations: Vec<StrikeShare>,
}

impl EntropyReading {
    fn dispersed(description: &str, n_strikes: usize) -> Self {
        Self {
            entropy: 1.0,
            entropy_norm: 1.0,
            regime: EntropyRegime::Dispersed,
            description: description.to_string(),
            n_strikes,
            top_concentrations: Vec::new(),
        }
    }
}

impl Default for EntropyReading {
    fn default() -> Self {
        Self::dispersed("No data", 0)
    }
}

pub fn compute_entropy(rows: &[ExposureRow], spot: f64, params: &ExposureParams) -> EntropyReading {
    if rows.is_empty() || spot <= 0.0 {
        return EntropyReading::default();
    }

    let relevant: Vec<(f64, f64)> = rows
        .iter()
        .filter(|r| (r.strike - spot).abs() / spot * 100.0 <= params.entropy_window_pct && r.net_gex.abs() > 0.0)
        .map(|r| (r.strike, r.net_gex.abs()))
        .collect();

    if relevant.len() < params.entropy_min_strikes.max(2) {
        return EntropyReading::dispersed("Too few strikes", relevant.len());
    }

    let total: f64 = relevant.iter().map(|(_, g)| g).sum();
    let h: f64 = relevant
        .iter()
        .map(|(_, g)| g / total)
        .map(|p| -p * p.ln())
        .sum();
    let h_max = (relevant.len() as f64).ln();
    let h_norm = if h_max > 0.0 { h / h_max } else { 1.0 };

    let mut ranked = relevant.clone();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top: Vec<StrikeShare> = ranked
        .iter()
        .take(3)
        .map(|(strike, g)| StrikeShare {
            strike: *strike,
            gex_share_pct: round_to(g / total * 100.0, 1),
        })
        .collect();

    let regime = EntropyRegime::from_norm(h_norm);
    let description = match regime {
        EntropyRegime::Critical => format!(
            "Gamma concentrated at ${:.0} ({:.0}%), phase transition risk",
            top[0].strike, top[0].gex_share_pct
        ),
        EntropyRegime::Approaching => "Significant gamma clustering, elevated instability".to_string(),
        EntropyRegime::Moderate => "Some gamma clustering but overall stable".to_string(),
        EntropyRegime::Dispersed => "Gamma evenly distributed, stable equilibrium".to_string(),
    };

    EntropyReading {
        entropy: round_to(h, 4),
        entropy_norm: round_to(h_norm, 3),
        regime,
        description,
        n_strikes: relevant.len(),
        top_concentrations: top,
    }
}
