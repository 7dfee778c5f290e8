//! Self-excitation index
//!
//! Hawkes-inspired clustering of same-direction moves. A cluster is a run of
//! two or more consecutive returns of at least `threshold_pct` with the same
//! sign; each cluster scores size * sum(|r|) * 10,000 and the index is the
//! mean cluster score.

use serde::{Deserialize, Serialize};

use crate::strategy::numeric::{round_to, simple_returns};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcitationParams {
    /// Minimum |return| in percent for a move to count (default: 0.1)
    pub threshold_pct: f64,
    /// Minimum returns needed (default: 20)
    pub min_returns: usize,
}

impl Default for ExcitationParams {
    fn default() -> Self {
        Self {
            threshold_pct: 0.1,
            min_returns: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExcitationRegime {
    HighExcitation,
    ModerateExcitation,
    LowExcitation,
    #[serde(rename = "NONE")]
    NoExcitation,
}

impl ExcitationRegime {
    pub fn from_sei(sei: f64) -> Self {
        if sei > 150.0 {
            Self::HighExcitation
        } else if sei > 80.0 {
            Self::ModerateExcitation
        } else if sei > 40.0 {
            Self::LowExcitation
        } else {
            Self::NoExcitation
        }
    }

    /// High or moderate feedback
    pub fn is_excited(&self) -> bool {
        matches!(self, Self::HighExcitation | Self::ModerateExcitation)
    }

    fn description(&self) -> &'static str {
        match self {
            Self::HighExcitation => "Strong self-exciting feedback: moves amplify rapidly",
            Self::ModerateExcitation => "Some self-exciting behavior: occasional momentum bursts",
            Self::LowExcitation => "Weak self-excitation: moves don't consistently amplify",
            Self::NoExcitation => "No meaningful self-excitation, mean-reversion dominant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfExcitation {
    pub sei: f64,
    pub regime: ExcitationRegime,
    pub description: String,
    pub n_clusters: usize,
    pub avg_cluster_size: f64,
    pub max_cluster_size: usize,
    pub total_excitation_events: usize,
}

impl Default for SelfExcitation {
    fn default() -> Self {
        Self {
            sei: 0.0,
            regime: ExcitationRegime::NoExcitation,
            description: "Insufficient data".to_string(),
            n_clusters: 0,
            avg_cluster_size: 0.0,
            max_cluster_size: 0,
            total_excitation_events: 0,
        }
    }
}

/// Split returns into same-sign runs of qualifying moves (size >= 2)
fn find_clusters(returns: &[f64], threshold: f64) -> Vec<Vec<f64>> {
    fn flush(current: &mut Vec<f64>, clusters: &mut Vec<Vec<f64>>) {
        if current.len() >= 2 {
            clusters.push(std::mem::take(current));
        } else {
            current.clear();
        }
    }

    let mut clusters = Vec::new();
    let mut current: Vec<f64> = Vec::new();
    let mut last_sign = 0i8;

    for &r in returns {
        if r.abs() >= threshold {
            let sign = if r > 0.0 { 1 } else { -1 };
            if sign != last_sign && last_sign != 0 {
                flush(&mut current, &mut clusters);
            }
            current.push(r.abs());
            last_sign = sign;
        } else {
            flush(&mut current, &mut clusters);
            last_sign = 0;
        }
    }
    flush(&mut current, &mut clusters);
    clusters
}

pub fn compute_self_excitation(prices: &[f64], params: &ExcitationParams) -> SelfExcitation {
    let returns = simple_returns(prices);
    if returns.len() < params.min_returns {
        return SelfExcitation::default();
    }

    let clusters = find_clusters(&returns, params.threshold_pct / 100.0);
    if clusters.is_empty() {
        return SelfExcitation::default();
    }

    let n = clusters.len() as f64;
    let sei = clusters
        .iter()
        .map(|c| c.len() as f64 * c.iter().sum::<f64>() * 10_000.0)
        .sum::<f64>()
        / n;
    let total_events: usize = clusters.iter().map(Vec::len).sum();
    let regime = ExcitationRegime::from_sei(sei);

    SelfExcitation {
        sei: round_to(sei, 3),
        regime,
        description: regime.description().to_string(),
        n_clusters: clusters.len(),
        avg_cluster_size: round_to(total_events as f64 / n, 1),
        max_cluster_size: clusters.iter().map(Vec::len).max().unwrap_or(0),
        total_excitation_events: total_events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn prices_from_returns(returns: &[f64]) -> Vec<f64> {
        let mut prices = vec![100.0];
        for r in returns {
            let last = *prices.last().unwrap();
            prices.push(last * (1.0 + r));
        }
        prices
    }

    #[test]
    fn test_too_few_returns() {
        let reading = compute_self_excitation(&[100.0; 10], &ExcitationParams::default());
        assert_eq!(reading.regime, ExcitationRegime::NoExcitation);
        assert_eq!(reading.description, "Insufficient data");
    }

    #[test]
    fn test_cluster_mechanics() {
        // +,+,+ | -, - | tiny | + (singleton dropped)
        let r = [0.002, 0.002, 0.002, -0.002, -0.002, 0.0, 0.002];
        let clusters = find_clusters(&r, 0.001);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 3);
        assert_eq!(clusters[1].len(), 2);
    }

    #[test]
    fn test_trending_series_high_excitation() {
        // Runs of five 0.5% up moves separated by flat bars
        let mut returns = Vec::new();
        for _ in 0..6 {
            returns.extend([0.005; 5]);
            returns.push(0.0);
        }
        let reading = compute_self_excitation(&prices_from_returns(&returns), &ExcitationParams::default());
        assert_eq!(reading.n_clusters, 6);
        assert_eq!(reading.max_cluster_size, 5);
        assert_eq!(reading.total_excitation_events, 30);
        // 5 * 0.025 * 10000 = 1250
        assert_relative_eq!(reading.sei, 1250.0, epsilon = 1.0);
        assert_eq!(reading.regime, ExcitationRegime::HighExcitation);
    }

    #[test]
    fn test_alternating_series_has_no_clusters() {
        let returns: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 0.003 } else { -0.003 }).collect();
        let reading = compute_self_excitation(&prices_from_returns(&returns), &ExcitationParams::default());
        assert_eq!(reading.n_clusters, 0);
        assert_eq!(reading.regime, ExcitationRegime::NoExcitation);
    }

    #[test]
    fn test_regime_thresholds() {
        assert_eq!(ExcitationRegime::from_sei(151.0), ExcitationRegime::HighExcitation);
        assert_eq!(ExcitationRegime::from_sei(150.0), ExcitationRegime::ModerateExcitation);
        assert_eq!(ExcitationRegime::from_sei(41.0), ExcitationRegime::LowExcitation);
        assert_eq!(ExcitationRegime::from_sei(40.0), ExcitationRegime::NoExcitation);
    }
}
