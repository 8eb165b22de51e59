//! Simulated player
//!
//! Answers events with a configurable skill level. Drives the demo binary
//! and end-to-end tests; deterministic for a given seed.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{GameEvent, Millis, ScoringInput, SpeciesSelection};

/// Worst-case timing spread for a zero-skill player
const MAX_TIMING_SPREAD_MS: f64 = 900.0;
/// Timing spread even a perfect player keeps
const MIN_TIMING_SPREAD_MS: f64 = 40.0;

/// Seeded bot producing inputs for events
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    rng: Pcg32,
    /// 0.0 = guesses everything, 1.0 = always right
    skill: f64,
    species_codes: Vec<String>,
}

impl AutoPlayer {
    pub fn new(seed: u64, skill: f64, species: &[SpeciesSelection]) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            skill: skill.clamp(0.0, 1.0),
            species_codes: species.iter().map(|s| s.species_code.clone()).collect(),
        }
    }

    pub fn skill(&self) -> f64 {
        self.skill
    }

    /// Whether the player notices the event at all
    pub fn notices(&mut self) -> bool {
        self.rng.random_bool(0.5 + self.skill / 2.0)
    }

    /// Produce the player's answer for `event`
    pub fn respond(&mut self, event: &GameEvent) -> ScoringInput {
        let species_code = if self.rng.random_bool(self.skill) || self.species_codes.is_empty() {
            Some(event.species_code.clone())
        } else {
            let i = self.rng.random_range(0..self.species_codes.len());
            Some(self.species_codes[i].clone())
        };

        let channel = if self.rng.random_bool(self.skill) {
            event.channel
        } else {
            event.channel.opposite()
        };

        let spread = MIN_TIMING_SPREAD_MS + (1.0 - self.skill) * (MAX_TIMING_SPREAD_MS - MIN_TIMING_SPREAD_MS);
        let offset = self.rng.random_range(-spread..=spread).round() as Millis;

        ScoringInput {
            species_code,
            channel,
            timestamp_ms: event.perfect_time_ms() + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Channel, ScoreEngine, VocalizationType};

    fn event() -> GameEvent {
        GameEvent {
            event_id: 0,
            clip_id: "amro_0".into(),
            species_code: "amro".into(),
            channel: Channel::Right,
            scheduled_time_ms: 4000,
            scoring_window_start_ms: 3000,
            scoring_window_end_ms: 5000,
            duration_ms: 1500,
            vocalization_type: Some(VocalizationType::Song),
            timing_tolerance_ms: None,
        }
    }

    #[test]
    fn test_perfect_player_hits_species_and_channel() {
        let mut player = AutoPlayer::new(1, 1.0, &[]);
        let engine = ScoreEngine::new();
        for _ in 0..50 {
            let input = player.respond(&event());
            let b = engine.calculate_breakdown(&event(), &input);
            assert!(b.species_correct && b.channel_correct);
            assert!(b.total_points >= 85);
        }
    }

    #[test]
    fn test_same_seed_same_answers() {
        let mut a = AutoPlayer::new(77, 0.5, &[]);
        let mut b = AutoPlayer::new(77, 0.5, &[]);
        for _ in 0..20 {
            assert_eq!(a.respond(&event()), b.respond(&event()));
        }
    }
}
