//! Black-Scholes Greeks
//!
//! Closed-form sensitivities for a single European option:
//! - gamma: dDelta/dSpot (identical for calls and puts)
//! - delta: dPrice/dSpot
//! - charm: dDelta/dTime
//! - vanna: dDelta/dVol
//!
//! Degenerate inputs return 0.0 instead of NaN/inf. Gamma and delta guard
//! on T <= 0; charm and vanna guard on T <= 0.001 where their 1/T terms blow up.

use crate::domain::OptionSide;

use super::numeric::{norm_cdf, norm_pdf};

/// Default annual risk-free rate
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

/// Time floor below which charm/vanna are not evaluated (years)
const MIN_T_SECOND_ORDER: f64 = 0.001;

/// Inputs shared by every Greek
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsInputs {
    pub spot: f64,
    pub strike: f64,
    /// Time to expiry in years
    pub t: f64,
    pub rate: f64,
    pub sigma: f64,
}

impl BsInputs {
    pub fn new(spot: f64, strike: f64, t: f64, rate: f64, sigma: f64) -> Self {
        Self { spot, strike, t, rate, sigma }
    }

    fn is_degenerate(&self, min_t: f64) -> bool {
        self.t <= min_t || self.sigma <= 0.0 || self.spot <= 0.0
    }

    fn d1(&self) -> f64 {
        ((self.spot / self.strike).ln() + (self.rate + 0.5 * self.sigma.powi(2)) * self.t)
            / (self.sigma * self.t.sqrt())
    }

    fn d2(&self) -> f64 {
        self.d1() - self.sigma * self.t.sqrt()
    }
}

pub fn gamma(inp: &BsInputs) -> f64 {
    if inp.is_degenerate(0.0) {
        return 0.0;
    }
    norm_pdf(inp.d1()) / (inp.spot * inp.sigma * inp.t.sqrt())
}

pub fn delta(inp: &BsInputs, side: OptionSide) -> f64 {
    if inp.is_degenerate(0.0) {
        return 0.0;
    }
    let nd1 = norm_cdf(inp.d1());
    match side {
        OptionSide::Call => nd1,
        OptionSide::Put => nd1 - 1.0,
    }
}

pub fn charm(inp: &BsInputs, side: OptionSide) -> f64 {
    if inp.is_degenerate(MIN_T_SECOND_ORDER) {
        return 0.0;
    }
    let sqrt_t = inp.t.sqrt();
    let d1 = inp.d1();
    let d2 = inp.d2();
    let base = -norm_pdf(d1) * (2.0 * inp.rate * inp.t - d2 * inp.sigma * sqrt_t)
        / (2.0 * inp.t * inp.sigma * sqrt_t);
    let carry = inp.rate * (-inp.rate * inp.t).exp();
    match side {
        OptionSide::Put => base + carry * norm_cdf(-d2),
        OptionSide::Call => base - carry * norm_cdf(d2),
    }
}

pub fn vanna(inp: &BsInputs) -> f64 {
    if inp.is_degenerate(MIN_T_SECOND_ORDER) {
        return 0.0;
    }
    -norm_pdf(inp.d1()) * inp.d2() / inp.sigma
}
