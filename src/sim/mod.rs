//! Deterministic gameplay module
//!
//! All event generation and grading lives here. This module must be pure and
//! deterministic:
//! - Seeded RNG only, passed in by the caller
//! - Time comes in as arguments, never read from a clock
//! - Stable ordering (by scheduled time, then event id)
//! - No audio, rendering or storage dependencies

pub mod difficulty;
pub mod infinite;
pub mod rng;
pub mod round;
pub mod scheduler;
pub mod scoring;
pub mod state;

pub use difficulty::{DifficultyParams, calculate, select_vocalization_type, validate_params};
pub use infinite::{DifficultyRamp, DifficultyState, InfiniteScheduler, SchedulerPhase};
pub use rng::{RandomSource, SeededRandom};
pub use round::{RoundManager, RoundUpdate};
pub use scheduler::{
    EventCountEstimate, EventScheduler, count_overlaps, count_same_channel_overlaps,
    estimate_event_count, generate_round, has_overlaps,
};
pub use scoring::{ScoreEngine, find_target_event, is_input_in_window};
pub use state::{
    Channel, ClipMetadata, EventDensity, GameEvent, GameMode, LevelConfig, Millis, Pack,
    RoundState, RoundStats, ScoreBreakdown, ScoreState, ScoringInput, ScoringResult,
    SpeciesSelection, SpectrogramMode, TimingAccuracy, VocalizationType, VocalizationWeights,
};
