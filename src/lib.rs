//! Birdlane - stereo bird-call identification game core
//!
//! Core modules:
//! - `sim`: Deterministic scheduling and scoring (seeded RNG, difficulty,
//!   round and infinite schedulers, score engine, round state machine)
//! - `modes`: Daily challenge and endless random mode built on `sim`
//! - `config`: Level/pack catalog loading and species selection
//! - `autoplay`: Seeded simulated player for demos and tests

pub mod autoplay;
pub mod config;
pub mod error;
pub mod highscores;
pub mod modes;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use highscores::HighScores;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use crate::sim::state::Millis;

    /// Nominal driver cadence for rounds (~60 Hz)
    pub const TICK_MS: Millis = 16;

    /// Countdown before a round starts playing
    pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

    /// Perfect-timing tolerance when an event has no override
    pub const DEFAULT_TIMING_TOLERANCE_MS: u32 = 100;

    /// Overlap partners land within ± this offset of their primary event
    pub const OVERLAP_OFFSET_MS: u32 = 200;

    /// Infinite sessions schedule their first event at this elapsed time
    pub const INFINITE_FIRST_EVENT_MS: Millis = 1000;

    /// Points per scoring axis
    pub const SPECIES_POINTS: u32 = 50;
    pub const CHANNEL_POINTS: u32 = 25;
    pub const PERFECT_TIMING_POINTS: u32 = 25;
    pub const PARTIAL_TIMING_POINTS: u32 = 10;
    pub const MAX_EVENT_POINTS: u32 = SPECIES_POINTS + CHANNEL_POINTS + PERFECT_TIMING_POINTS;

    /// Misses allowed in random mode before the session ends
    pub const DEFAULT_MISS_BUDGET: u32 = 3;
}

/// Linear interpolation from `a` to `b` by `t`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
