//! Regime Detection Module
//!
//! Views of dealer hedging pressure:
//!
//! - **Flow**: speculative near-ATM call flow versus dealer inventory gamma
//! - **ACF**: lag-1 autocorrelation of intraday returns per session
//! - **Phase**: share of recently amplified sessions versus the critical threshold
//! - **Excitation**: clustering of same-direction intraday moves

pub mod acf;
pub mod excitation;
pub mod flow;
pub mod phase;

pub use acf::{
    compute_daily_acf, detect_acf, scan_acf, AcfParams, AcfReading, AcfRegime, AcfStability,
    AcfStatus, AcfTrend, AcfUnavailable, DailyAcf,
};
pub use excitation::{compute_self_excitation, ExcitationParams, ExcitationRegime, SelfExcitation};
pub use flow::{chain_flow, compute_flow, FlowParams, FlowReading, FlowRegime};
pub use phase::{detect_phase_transition, PhaseParams, PhaseReading, PhaseRegime};
