//! Price levels derived from positioning
//!
//! - `walls`: open-interest walls and the max-pain strike (pure OI, no Greeks)
//! - `channel`: gamma floor/ceiling band from the exposure profile

pub mod channel;
pub mod walls;

pub use channel::{channel_strategy, extract_channel, ChannelParams, ChannelPlay, ChannelStrategy, EdgeType, GammaChannel};
pub use walls::{find_oi_walls, max_pain, MaxPain, OiWalls, PainPoint, Wall};
