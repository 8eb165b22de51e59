//! Player gameplay preferences
//!
//! Exported alongside mode state for an external store; the core never
//! reads or writes storage itself.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_COUNTDOWN_SECS, DEFAULT_MISS_BUDGET, DEFAULT_TIMING_TOLERANCE_MS};
use crate::sim::SpectrogramMode;

/// Difficulty presets offered in the settings menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AssistPreset {
    Relaxed,
    #[default]
    Standard,
    Strict,
}

impl AssistPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistPreset::Relaxed => "Relaxed",
            AssistPreset::Standard => "Standard",
            AssistPreset::Strict => "Strict",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(AssistPreset::Relaxed),
            "standard" | "normal" => Some(AssistPreset::Standard),
            "strict" | "hard" => Some(AssistPreset::Strict),
            _ => None,
        }
    }

    /// Perfect-timing tolerance for this preset
    pub fn timing_tolerance_ms(&self) -> u32 {
        match self {
            AssistPreset::Relaxed => 200,
            AssistPreset::Standard => DEFAULT_TIMING_TOLERANCE_MS,
            AssistPreset::Strict => 60,
        }
    }

    /// Misses allowed per random-mode session
    pub fn miss_budget(&self) -> u32 {
        match self {
            AssistPreset::Relaxed => 5,
            AssistPreset::Standard => DEFAULT_MISS_BUDGET,
            AssistPreset::Strict => 1,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub preset: AssistPreset,

    // === Round flow ===
    /// Seconds of countdown before a round plays
    pub countdown_secs: u32,
    /// Start rounds immediately without a countdown
    pub skip_countdown: bool,

    // === Scoring ===
    /// Perfect-timing tolerance handed to the score engine
    pub timing_tolerance_ms: u32,
    /// Misses allowed before a random-mode session ends
    pub miss_budget: u32,

    // === Display ===
    /// Forces a spectrogram mode regardless of the level's own
    #[serde(default)]
    pub spectrogram_override: Option<SpectrogramMode>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: AssistPreset::Standard,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            skip_countdown: false,
            timing_tolerance_ms: DEFAULT_TIMING_TOLERANCE_MS,
            miss_budget: DEFAULT_MISS_BUDGET,
            spectrogram_override: None,
        }
    }
}

impl Settings {
    /// Settings built from a preset (applies preset defaults)
    pub fn from_preset(preset: AssistPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a preset (updates preset-dependent settings)
    pub fn apply_preset(&mut self, preset: AssistPreset) {
        self.preset = preset;
        self.timing_tolerance_ms = preset.timing_tolerance_ms();
        self.miss_budget = preset.miss_budget();
    }

    /// Spectrogram mode to show for a level
    pub fn effective_spectrogram(&self, level_mode: SpectrogramMode) -> SpectrogramMode {
        self.spectrogram_override.unwrap_or(level_mode)
    }
}
