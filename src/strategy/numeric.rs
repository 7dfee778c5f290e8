//! Numeric helpers shared by the analytics components
//!
//! Thin wrappers over `statrs` so every component computes returns,
//! means and dispersion the same way (population statistics throughout).

use statrs::function::erf::erf;
use statrs::statistics::Statistics;

/// Round to `dp` decimal places
pub fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// Simple (percentage-change) returns
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Log returns, skipping non-positive prices
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    }
}

/// Population variance, 0.0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().population_variance()
    }
}

/// Population standard deviation, 0.0 for an empty slice
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Sample covariance (n - 1 denominator), 0.0 when fewer than two points
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    a[..n].iter().covariance(b[..n].iter())
}

/// Least-squares slope of `values` against their index
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let x_mean = mean(&xs);
    let y_mean = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(values) {
        num += (x - x_mean) * (y - y_mean);
        den += (x - x_mean).powi(2);
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Standard normal density
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Standard normal cumulative distribution
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(1.23456, 2), 1.23);
        assert_relative_eq!(round_to(-0.98765, 3), -0.988);
    }

    #[test]
    fn test_returns() {
        let closes = [100.0, 110.0, 99.0];
        let r = simple_returns(&closes);
        assert_relative_eq!(r[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[1], -0.1, epsilon = 1e-12);

        let l = log_returns(&closes);
        assert_relative_eq!(l[0], (1.1f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_population_statistics() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v), 5.0);
        assert_relative_eq!(population_std(&v), 2.0, epsilon = 1e-12);
        assert_eq!(population_std(&[]), 0.0);
    }

    #[test]
    fn test_linear_slope() {
        assert_relative_eq!(linear_slope(&[1.0, 3.0, 5.0, 7.0]), 2.0, epsilon = 1e-12);
        assert_eq!(linear_slope(&[4.0]), 0.0);
    }

    #[test]
    fn test_normal_functions() {
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(norm_cdf(1.96), 0.975, epsilon = 1e-3);
        assert_relative_eq!(norm_pdf(0.0), 0.398_942_28, epsilon = 1e-6);
    }
}
