//! Difficulty resolution
//!
//! Merges a level's base difficulty with an optional pack's modifiers. The
//! result is recomputed per round (or per query in infinite mode) and never
//! mutated.

use serde::{Deserialize, Serialize};

use super::state::{EventDensity, LevelConfig, Pack, VocalizationType, VocalizationWeights};

/// Resolved, pack-adjusted difficulty for one round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    pub min_gap_ms: u32,
    pub max_gap_ms: u32,
    pub overlap_probability: f64,
    pub scoring_window_ms: u32,
    pub vocalization_weights: VocalizationWeights,
    pub event_density: EventDensity,
}

/// Divide a gap by the pack tempo, rounding and keeping it positive
pub(crate) fn scale_gap(gap_ms: f64, tempo_multiplier: f64) -> u32 {
    ((gap_ms / tempo_multiplier).round() as u32).max(1)
}

/// Scale an overlap probability, clamped to 1.0
pub(crate) fn scale_overlap(probability: f64, overlap_multiplier: f64) -> f64 {
    (probability * overlap_multiplier).min(1.0)
}

/// Combine a level and optional pack into [`DifficultyParams`]
pub fn calculate(level: &LevelConfig, pack: Option<&Pack>) -> DifficultyParams {
    let (min_gap, max_gap) = level.event_density.gap_range_ms();
    let mut params = DifficultyParams {
        min_gap_ms: min_gap,
        max_gap_ms: max_gap,
        overlap_probability: level.overlap_probability,
        scoring_window_ms: level.scoring_window_ms,
        vocalization_weights: VocalizationWeights::default(),
        event_density: level.event_density,
    };

    if let Some(pack) = pack {
        params.min_gap_ms = scale_gap(min_gap as f64, pack.tempo_multiplier);
        params.max_gap_ms = scale_gap(max_gap as f64, pack.tempo_multiplier);
        params.overlap_probability = scale_overlap(level.overlap_probability, pack.overlap_multiplier);
        params.vocalization_weights = pack.vocalization_weights;
    }

    params
}

/// Weighted coin flip between song and call
///
/// Returns `Song` iff `random_value < song / (song + call)`. Zero-sum weights
/// always pick `Song`.
pub fn select_vocalization_type(weights: &VocalizationWeights, random_value: f64) -> VocalizationType {
    if random_value < weights.song_probability() {
        VocalizationType::Song
    } else {
        VocalizationType::Call
    }
}

/// Structural sanity check on resolved difficulty
pub fn validate_params(params: &DifficultyParams) -> bool {
    let w = params.vocalization_weights;
    params.min_gap_ms > 0
        && params.max_gap_ms > 0
        && params.min_gap_ms <= params.max_gap_ms
        && (0.0..=1.0).contains(&params.overlap_probability)
        && params.scoring_window_ms > 0
        && w.song.is_finite()
        && w.call.is_finite()
        && w.song >= 0.0
        && w.call >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameMode, SpectrogramMode};

    fn level(density: EventDensity, overlap: f64) -> LevelConfig {
        LevelConfig {
            level_id: 1,
            pack_id: "common".into(),
            mode: GameMode::Campaign,
            round_duration_sec: 30,
            species_count: 4,
            event_density: density,
            overlap_probability: overlap,
            scoring_window_ms: 2000,
            spectrogram_mode: SpectrogramMode::Full,
        }
    }

    #[test]
    fn test_no_pack_passes_level_through() {
        let params = calculate(&level(EventDensity::Medium, 0.3), None);
        assert_eq!((params.min_gap_ms, params.max_gap_ms), (1500, 3000));
        assert_eq!(params.overlap_probability, 0.3);
        assert_eq!(params.scoring_window_ms, 2000);
        assert_eq!(params.vocalization_weights, VocalizationWeights::default());
        assert!(validate_params(&params));
    }

    #[test]
    fn test_density_tiers() {
        assert_eq!(calculate(&level(EventDensity::Low, 0.0), None).max_gap_ms, 5000);
        assert_eq!(calculate(&level(EventDensity::High, 0.0), None).min_gap_ms, 800);
    }

    #[test]
    fn test_pack_tempo_divides_gaps() {
        let mut pack = Pack::neutral("fast");
        pack.tempo_multiplier = 1.2;
        let params = calculate(&level(EventDensity::Medium, 0.0), Some(&pack));
        assert_eq!(params.min_gap_ms, 1250);
        assert_eq!(params.max_gap_ms, 2500);
    }

    #[test]
    fn test_pack_overlap_is_clamped() {
        let mut pack = Pack::neutral("busy");
        pack.overlap_multiplier = 2.0;
        let params = calculate(&level(EventDensity::Medium, 0.8), Some(&pack));
        assert_eq!(params.overlap_probability, 1.0);
    }

    #[test]
    fn test_pack_replaces_weights() {
        let mut pack = Pack::neutral("songbirds");
        pack.vocalization_weights = VocalizationWeights { song: 0.9, call: 0.1 };
        let params = calculate(&level(EventDensity::Low, 0.0), Some(&pack));
        assert_eq!(params.vocalization_weights.song, 0.9);
    }

    #[test]
    fn test_select_vocalization_type() {
        let w = VocalizationWeights { song: 0.9, call: 0.1 };
        assert_eq!(select_vocalization_type(&w, 0.5), VocalizationType::Song);
        assert_eq!(select_vocalization_type(&w, 0.95), VocalizationType::Call);

        let zero = VocalizationWeights { song: 0.0, call: 0.0 };
        assert_eq!(select_vocalization_type(&zero, 0.999), VocalizationType::Song);
    }

    #[test]
    fn test_validate_params_rejects_bad_values() {
        let good = calculate(&level(EventDensity::Medium, 0.2), None);

        let mut bad = good;
        bad.min_gap_ms = 4000;
        assert!(!validate_params(&bad));

        let mut bad = good;
        bad.overlap_probability = -0.1;
        assert!(!validate_params(&bad));

        let mut bad = good;
        bad.scoring_window_ms = 0;
        assert!(!validate_params(&bad));

        let mut bad = good;
        bad.vocalization_weights.call = -1.0;
        assert!(!validate_params(&bad));
    }
}
