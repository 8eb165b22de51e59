//! Gameplay data model
//!
//! Level/pack descriptors flow in, events and score values flow out. All of
//! these are plain serializable values; nothing here holds a handle into
//! shared mutable state.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Milliseconds from round (or session) start. Signed because scoring
/// windows of early events can open before zero.
pub type Millis = i64;

/// Stereo lane an event plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];

    pub fn opposite(self) -> Self {
        match self {
            Channel::Left => Channel::Right,
            Channel::Right => Channel::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Left => "left",
            Channel::Right => "right",
        }
    }
}

/// Recording category of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocalizationType {
    Song,
    Call,
}

/// Event density tier; each maps to a fixed inter-event gap range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventDensity {
    Low,
    Medium,
    High,
}

impl EventDensity {
    /// `[min_gap_ms, max_gap_ms]` for this tier
    pub fn gap_range_ms(self) -> (u32, u32) {
        match self {
            EventDensity::Low => (3000, 5000),
            EventDensity::Medium => (1500, 3000),
            EventDensity::High => (800, 1500),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventDensity::Low => "low",
            EventDensity::Medium => "medium",
            EventDensity::High => "high",
        }
    }
}

/// Game mode tag carried by a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Campaign,
    Practice,
    Challenge,
    Random,
}

/// How spectrograms are shown on tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrogramMode {
    #[default]
    Full,
    Fading,
    None,
}

/// Static descriptor of a round's target difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level_id: u32,
    pub pack_id: String,
    #[serde(default)]
    pub mode: GameMode,
    pub round_duration_sec: u32,
    pub species_count: u32,
    pub event_density: EventDensity,
    pub overlap_probability: f64,
    pub scoring_window_ms: u32,
    #[serde(default)]
    pub spectrogram_mode: SpectrogramMode,
}

impl LevelConfig {
    /// Round length in milliseconds
    pub fn duration_ms(&self) -> Millis {
        self.round_duration_sec as Millis * 1000
    }

    /// Check the level invariants; fails fast with the first violation
    pub fn validate(&self) -> Result<()> {
        if self.species_count < 1 {
            return Err(GameError::invalid_level(self.level_id, "species_count must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.overlap_probability) {
            return Err(GameError::invalid_level(
                self.level_id,
                format!("overlap_probability {} outside [0, 1]", self.overlap_probability),
            ));
        }
        if self.round_duration_sec == 0 {
            return Err(GameError::invalid_level(self.level_id, "round_duration_sec must be positive"));
        }
        if self.scoring_window_ms == 0 {
            return Err(GameError::invalid_level(self.level_id, "scoring_window_ms must be positive"));
        }
        Ok(())
    }
}

/// Relative song/call bias. Normalized at use; a zero sum means "song".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocalizationWeights {
    pub song: f64,
    pub call: f64,
}

impl Default for VocalizationWeights {
    fn default() -> Self {
        Self { song: 0.5, call: 0.5 }
    }
}

impl VocalizationWeights {
    /// Normalized probability of drawing a song
    pub fn song_probability(&self) -> f64 {
        let total = self.song + self.call;
        if total <= 0.0 { 1.0 } else { self.song / total }
    }
}

/// Themed species subset plus multiplicative difficulty modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub pack_id: String,
    #[serde(default)]
    pub name: String,
    /// Species codes available in this pack (empty = no restriction)
    #[serde(default)]
    pub species: Vec<String>,
    pub tempo_multiplier: f64,
    pub overlap_multiplier: f64,
    #[serde(default)]
    pub vocalization_weights: VocalizationWeights,
}

impl Pack {
    /// A pack with neutral modifiers
    pub fn neutral(pack_id: impl Into<String>) -> Self {
        Self {
            pack_id: pack_id.into(),
            name: String::new(),
            species: Vec::new(),
            tempo_multiplier: 1.0,
            overlap_multiplier: 1.0,
            vocalization_weights: VocalizationWeights::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tempo_multiplier > 0.0) || !self.tempo_multiplier.is_finite() {
            return Err(GameError::invalid_pack(&self.pack_id, "tempo_multiplier must be > 0"));
        }
        if !(self.overlap_multiplier >= 0.0) || !self.overlap_multiplier.is_finite() {
            return Err(GameError::invalid_pack(&self.pack_id, "overlap_multiplier must be >= 0"));
        }
        let w = self.vocalization_weights;
        if w.song < 0.0 || w.call < 0.0 {
            return Err(GameError::invalid_pack(&self.pack_id, "vocalization weights must be non-negative"));
        }
        Ok(())
    }

    /// Whether `species_code` belongs to this pack
    pub fn includes(&self, species_code: &str) -> bool {
        self.species.is_empty() || self.species.iter().any(|s| s == species_code)
    }
}

/// Metadata for one audio clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub clip_id: String,
    pub species_code: String,
    pub vocalization_type: VocalizationType,
    pub duration_ms: u32,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub spectrogram_path: Option<String>,
}

/// A species in the round's pool with the clips it can play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSelection {
    pub species_code: String,
    #[serde(default)]
    pub common_name: String,
    pub clips: Vec<ClipMetadata>,
}

/// One schedulable gameplay event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub event_id: u32,
    pub clip_id: String,
    pub species_code: String,
    pub channel: Channel,
    pub scheduled_time_ms: Millis,
    pub scoring_window_start_ms: Millis,
    pub scoring_window_end_ms: Millis,
    pub duration_ms: u32,
    pub vocalization_type: Option<VocalizationType>,
    /// Per-event override of the engine's perfect-timing tolerance
    #[serde(default)]
    pub timing_tolerance_ms: Option<u32>,
}

impl GameEvent {
    /// Instant a perfectly timed input lands on
    pub fn perfect_time_ms(&self) -> Millis {
        self.scheduled_time_ms
    }

    /// End of clip playback
    pub fn end_time_ms(&self) -> Millis {
        self.scheduled_time_ms + self.duration_ms as Millis
    }

    pub fn window_width_ms(&self) -> Millis {
        self.scoring_window_end_ms - self.scoring_window_start_ms
    }
}

/// A player's response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringInput {
    pub species_code: Option<String>,
    pub channel: Channel,
    pub timestamp_ms: Millis,
}

/// Timing tier of an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingAccuracy {
    Perfect,
    Partial,
    Miss,
}

/// Result of grading one input against one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub species_correct: bool,
    pub species_points: u32,
    pub channel_correct: bool,
    pub channel_points: u32,
    pub timing_accuracy: TimingAccuracy,
    pub timing_points: u32,
    pub total_points: u32,
}

impl ScoreBreakdown {
    /// Zero-point breakdown for inputs outside the window
    pub fn miss() -> Self {
        Self {
            species_correct: false,
            species_points: 0,
            channel_correct: false,
            channel_points: 0,
            timing_accuracy: TimingAccuracy::Miss,
            timing_points: 0,
            total_points: 0,
        }
    }
}

/// One entry of the scoring history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub event_id: u32,
    pub input: ScoringInput,
    pub breakdown: ScoreBreakdown,
    pub missed: bool,
}

/// Cumulative session score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub total_score: u64,
    pub events_scored: u32,
    pub perfect_count: u32,
    pub species_correct_count: u32,
    pub channel_correct_count: u32,
    pub miss_count: u32,
    pub history: Vec<ScoringResult>,
}

/// Summary handed out when a round ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub total_score: u64,
    pub events_scored: u32,
    pub total_events: u32,
    pub perfect_count: u32,
    pub species_correct_count: u32,
    pub channel_correct_count: u32,
    pub miss_count: u32,
    pub accuracy_percent: f64,
}

/// Round lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundState {
    #[default]
    Idle,
    Countdown,
    Playing,
    Ended,
}
