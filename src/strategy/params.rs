//! Analysis Parameters
//!
//! One struct per component, aggregated into `AnalysisParams`. Every
//! section deserializes with defaults so a partial TOML file is enough.

use serde::{Deserialize, Serialize};

use super::directional::DirectionalParams;
use super::exposure::ExposureParams;
use super::levels::ChannelParams;
use super::regime::{AcfParams, FlowParams, PhaseParams};
use super::straddle::StraddleParams;
use super::technicals::TechnicalsParams;

/// Every tunable of the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub exposure: ExposureParams,
    pub channel: ChannelParams,
    pub flow: FlowParams,
    pub acf: AcfParams,
    pub phase: PhaseParams,
    pub technicals: TechnicalsParams,
    pub directional: DirectionalParams,
    pub straddle: StraddleParams,
}

impl AnalysisParams {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.exposure.validate()?;
        self.channel.validate()?;
        self.flow.validate()?;
        self.acf.validate()?;
        self.phase.validate()?;
        self.technicals.validate()?;
        self.directional.validate()?;
        self.straddle.validate()?;
        Ok(())
    }
}

fn fraction(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ParamsError::OutOfRange { name, value, range: "0 < x <= 1" })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ParamsError::OutOfRange { name, value, range: "x > 0" })
    }
}

fn at_least(name: &'static str, value: usize, min: usize) -> Result<(), ParamsError> {
    if value >= min {
        Ok(())
    } else {
        Err(ParamsError::TooSmall { name, value, min })
    }
}

impl ExposureParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..=0.5).contains(&self.risk_free_rate) {
            return Err(ParamsError::OutOfRange {
                name: "exposure.risk_free_rate",
                value: self.risk_free_rate,
                range: "0 <= r <= 0.5",
            });
        }
        positive("exposure.entropy_window_pct", self.entropy_window_pct)?;
        at_least("exposure.entropy_min_strikes", self.entropy_min_strikes, 2)?;
        at_least("exposure.aggregate_max_expirations", self.aggregate_max_expirations, 1)
    }
}

impl ChannelParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        fraction("channel.floor_threshold", self.floor_threshold)?;
        fraction("channel.ceiling_threshold", self.ceiling_threshold)?;
        fraction("channel.fallback_threshold", self.fallback_threshold)?;
        fraction("channel.widen_threshold", self.widen_threshold)?;
        positive("channel.min_width_pct", self.min_width_pct)
    }
}

impl FlowParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        fraction("flow.atm_tolerance", self.atm_tolerance)?;
        positive("flow.transitional_above", self.transitional_above)?;
        positive("flow.ratio_cap", self.ratio_cap)?;
        if self.turbulent_above <= self.transitional_above {
            return Err(ParamsError::Ordering {
                lower: "flow.transitional_above",
                upper: "flow.turbulent_above",
            });
        }
        Ok(())
    }
}

impl AcfParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        at_least("acf.min_session_bars", self.min_session_bars, self.max_lag + 2)?;
        at_least("acf.min_series_bars", self.min_series_bars, self.min_session_bars)?;
        at_least("acf.max_lag", self.max_lag, 1)?;
        fraction("acf.neutral_band", self.neutral_band)?;
        fraction("acf.ceiling_fraction", self.ceiling_fraction)?;
        positive("acf.excitation.threshold_pct", self.excitation.threshold_pct)?;
        at_least("acf.excitation.min_returns", self.excitation.min_returns, 2)
    }
}

impl PhaseParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        at_least("phase.window", self.window, 1)?;
        if !(0.0..=100.0).contains(&self.threshold_pct) {
            return Err(ParamsError::OutOfRange {
                name: "phase.threshold_pct",
                value: self.threshold_pct,
                range: "0 <= x <= 100",
            });
        }
        fraction("phase.approach_fraction", self.approach_fraction)
    }
}

impl TechnicalsParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        at_least("technicals.atr_period", self.atr_period, 1)?;
        at_least("technicals.slope_window", self.slope_window, 1)?;
        at_least("technicals.min_bars", self.min_bars, self.atr_period + 1)?;
        positive("technicals.cross_band_pct", self.cross_band_pct)
    }
}

impl DirectionalParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        positive("directional.pin_ratio", self.pin_ratio)?;
        positive("directional.charm_drift_threshold", self.charm_drift_threshold)?;
        if self.fade_strong_acf >= 0.0 {
            return Err(ParamsError::OutOfRange {
                name: "directional.fade_strong_acf",
                value: self.fade_strong_acf,
                range: "x < 0",
            });
        }
        if self.critical_entropy_ratio <= 1.0 {
            return Err(ParamsError::OutOfRange {
                name: "directional.critical_entropy_ratio",
                value: self.critical_entropy_ratio,
                range: "x > 1",
            });
        }
        Ok(())
    }
}

impl StraddleParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.strangle_otm_pct <= 0.0 || self.strangle_otm_pct >= 50.0 {
            return Err(ParamsError::OutOfRange {
                name: "straddle.strangle_otm_pct",
                value: self.strangle_otm_pct,
                range: "0 < x < 50",
            });
        }
        at_least("straddle.move_lookback_bars", self.move_lookback_bars, 30)?;
        at_least("straddle.theta_max_rows", self.theta_max_rows as usize, 1)?;
        at_least("straddle.expiry_scan_max", self.expiry_scan_max, 1)
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid {name}: {value} (must be {range})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },
    #[error("Invalid {name}: {value} (minimum {min})")]
    TooSmall { name: &'static str, value: usize, min: usize },
    #[error("{lower} must be below {upper}")]
    Ordering { lower: &'static str, upper: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_validate() {
        assert!(AnalysisParams::default().validate().is_ok());
    }

    #[test]
    fn test_flow_ordering() {
        let mut params = AnalysisParams::default();
        params.flow.turbulent_above = 0.5;
        assert!(matches!(params.validate(), Err(ParamsError::Ordering { .. })));
    }

    #[test]
    fn test_invalid_channel_threshold() {
        let mut params = AnalysisParams::default();
        params.channel.floor_threshold = 0.0;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::OutOfRange { name: "channel.floor_threshold", .. })
        ));
    }

    #[test]
    fn test_session_bars_must_cover_lags() {
        let mut params = AnalysisParams::default();
        params.acf.min_session_bars = 4;
        assert!(matches!(params.validate(), Err(ParamsError::TooSmall { min: 7, .. })));
    }

    #[test]
    fn test_fade_threshold_negative() {
        let mut params = AnalysisParams::default();
        params.directional.fade_strong_acf = 0.1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let params: AnalysisParams = toml::from_str(
            r#"
            [flow]
            turbulent_above = 1.2

            [straddle]
            strangle_otm_pct = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(params.flow.turbulent_above, 1.2);
        assert_eq!(params.flow.transitional_above, 0.7);
        assert_eq!(params.straddle.strangle_otm_pct, 4.0);
        assert_eq!(params.technicals.atr_period, 14);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_error_message() {
        let err = ParamsError::TooSmall { name: "phase.window", value: 0, min: 1 };
        assert_eq!(err.to_string(), "Invalid phase.window: 0 (minimum 1)");
    }
}
