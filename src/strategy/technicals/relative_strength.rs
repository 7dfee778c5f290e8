//! Relative strength and beta against a benchmark

use serde::{Deserialize, Serialize};

use crate::strategy::numeric::{population_variance, round_to, sample_covariance, simple_returns};

/// Benchmark variance below this leaves beta at 1.0
const MIN_BENCH_VARIANCE: f64 = 1e-10;
/// Beta floor used for the ratio adjustment
pub const BETA_FLOOR: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsTrend {
    Improving,
    Deteriorating,
    Stable,
    #[serde(rename = "N/A")]
    NotApplicable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsLabel {
    StrongLeader,
    Outperforming,
    InLine,
    Underperforming,
    StrongLaggard,
    IsBenchmark,
    Unknown,
}

impl RsLabel {
    pub fn from_average(avg_rs: f64) -> Self {
        if avg_rs > 3.0 {
            Self::StrongLeader
        } else if avg_rs > 1.0 {
            Self::Outperforming
        } else if avg_rs > -1.0 {
            Self::InLine
        } else if avg_rs > -3.0 {
            Self::Underperforming
        } else {
            Self::StrongLaggard
        }
    }

    pub fn is_leading(&self) -> bool {
        matches!(self, Self::StrongLeader | Self::Outperforming)
    }

    pub fn is_lagging(&self) -> bool {
        matches!(self, Self::StrongLaggard | Self::Underperforming)
    }

    fn describe(&self, benchmark: &str) -> String {
        match self {
            Self::StrongLeader => format!("Significantly outperforming {}: leadership", benchmark),
            Self::Outperforming => format!("Outperforming {}, relative strength confirmed", benchmark),
            Self::InLine => format!("Performing in line with {}", benchmark),
            Self::Underperforming => format!("Underperforming {}, relative weakness", benchmark),
            Self::StrongLaggard => format!("Significantly underperforming {}: avoid long", benchmark),
            Self::IsBenchmark => "This is the benchmark itself".to_string(),
            Self::Unknown => "Could not compute relative strength".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeStrength {
    pub benchmark: String,
    /// Ticker return minus benchmark return, percent
    pub rs_5d: f64,
    pub rs_20d: f64,
    pub rs_60d: f64,
    pub rs_trend: RsTrend,
    pub rs_label: RsLabel,
    pub rs_desc: String,
    pub beta_60d: f64,
    pub beta_20d: f64,
    /// 1 / max(beta_60d, 0.3)
    pub beta_adj_factor: f64,
}

impl RelativeStrength {
    pub fn empty(benchmark: &str) -> Self {
        Self::neutral(benchmark, RsTrend::Unknown, RsLabel::Unknown)
    }

    fn neutral(benchmark: &str, rs_trend: RsTrend, rs_label: RsLabel) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            rs_5d: 0.0,
            rs_20d: 0.0,
            rs_60d: 0.0,
            rs_trend,
            rs_label,
            rs_desc: rs_label.describe(benchmark),
            beta_60d: 1.0,
            beta_20d: 1.0,
            beta_adj_factor: 1.0,
        }
    }
}

fn window_return(closes: &[f64], days: usize) -> f64 {
    let n = closes.len();
    let base = closes[n - days];
    if base > 0.0 {
        (closes[n - 1] / base - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Beta over the last `window` closes of both aligned series
fn beta(ticker: &[f64], bench: &[f64], window: usize) -> f64 {
    let tr = simple_returns(&ticker[ticker.len() - window..]);
    let br = simple_returns(&bench[bench.len() - window..]);
    let var_b = population_variance(&br);
    if var_b > MIN_BENCH_VARIANCE {
        sample_covariance(&tr, &br) / var_b
    } else {
        1.0
    }
}

pub fn compute_relative_strength(ticker: &str, closes: &[f64], benchmark: &str, bench_closes: &[f64]) -> RelativeStrength {
    if ticker.eq_ignore_ascii_case(benchmark) {
        return RelativeStrength::neutral(benchmark, RsTrend::NotApplicable, RsLabel::IsBenchmark);
    }
    let len = closes.len().min(bench_closes.len());
    if len < 20 {
        return RelativeStrength::empty(benchmark);
    }
    let tc = &closes[closes.len() - len..];
    let bc = &bench_closes[bench_closes.len() - len..];

    let rs = |days: usize| {
        if len >= days {
            round_to(window_return(tc, days) - window_return(bc, days), 2)
        } else {
            0.0
        }
    };
    let (rs_5d, rs_20d, rs_60d) = (rs(5), rs(20), rs(60));

    let beta_60d = if len >= 61 { beta(tc, bc, 61) } else { 1.0 };
    let beta_20d = if len >= 21 { beta(tc, bc, 21) } else { 1.0 };
    let beta_adj_factor = 1.0 / beta_60d.max(BETA_FLOOR);

    let rs_trend = if rs_5d > rs_20d + 1.0 {
        RsTrend::Improving
    } else if rs_5d < rs_20d - 1.0 {
        RsTrend::Deteriorating
    } else {
        RsTrend::Stable
    };
    let rs_label = RsLabel::from_average((rs_5d + rs_20d) / 2.0);

    RelativeStrength {
        benchmark: benchmark.to_string(),
        rs_5d,
        rs_20d,
        rs_60d,
        rs_trend,
        rs_label,
        rs_desc: rs_label.describe(benchmark),
        beta_60d: round_to(beta_60d, 2),
        beta_20d: round_to(beta_20d, 2),
        beta_adj_factor: round_to(beta_adj_factor, 2),
    }
}
