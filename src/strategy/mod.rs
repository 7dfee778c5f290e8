//! Strategy Layer - Dealer Hedging Analytics
//!
//! Pure computations over an already-ingested snapshot:
//! - Greeks primitives and the per-strike dealer exposure profile
//! - OI walls, max pain and the gamma channel
//! - Flow turbulence, phase transition and price autocorrelation regimes
//! - Volatility premium context and technical structure
//! - The directional thesis engine and the straddle/strangle scorer
//!
//! Every component takes explicit parameter structs (see `params`) and
//! degrades to a neutral reading instead of failing.

pub mod greeks;
pub mod numeric;
pub mod exposure;
pub mod levels;
pub mod regime;
pub mod volatility;
pub mod technicals;
pub mod directional;
pub mod straddle;
pub mod params;

pub use params::{AnalysisParams, ParamsError};
pub use exposure::{build_profile, chain_profile, ExposureParams, GammaRegime, GexProfile};
pub use levels::{channel_strategy, extract_channel, find_oi_walls, max_pain, GammaChannel, OiWalls};
pub use regime::{chain_flow, detect_acf, detect_phase_transition, AcfReading, FlowReading, PhaseReading};
pub use volatility::{compute_vol_analysis, SizingVolContext, VolAnalysis};
pub use technicals::{compute_technicals, Technicals};
pub use directional::{classify_thesis, DirectionalReading};
pub use straddle::{analyze_straddles, StraddleAnalysis};
