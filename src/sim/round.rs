//! Round lifecycle
//!
//! Idle -> Countdown -> Playing -> Ended, with `stop_round` forcing Idle from
//! anywhere. The owner drives the round by calling [`RoundManager::advance`]
//! at a steady cadence (nominally every `TICK_MS`) and reacts to the returned
//! [`RoundUpdate`]: newly due events to play, the current state, and the
//! final stats on the update that ends the round.

use std::collections::HashSet;

use super::rng::{SeededRandom, entropy_seed};
use super::scheduler::generate_round;
use super::scoring::{ScoreEngine, find_target_event};
use super::state::{
    GameEvent, LevelConfig, Millis, Pack, RoundState, RoundStats, ScoringInput, ScoringResult,
    SpeciesSelection,
};
use crate::consts::DEFAULT_COUNTDOWN_SECS;
use crate::error::{GameError, Result};
use crate::settings::Settings;

/// Everything that changed on one `advance` call
#[derive(Debug, Clone, PartialEq)]
pub struct RoundUpdate {
    pub state: RoundState,
    /// Round time; zero until playback begins
    pub elapsed_ms: Millis,
    /// Whole seconds left while counting down
    pub countdown_remaining: Option<u32>,
    /// Events whose scheduled time passed since the previous call
    pub due_events: Vec<GameEvent>,
    /// Present only on the call that ends the round
    pub stats: Option<RoundStats>,
}

/// Drives one round at a time over a pre-generated event list
#[derive(Debug, Clone)]
pub struct RoundManager {
    state: RoundState,
    level: Option<LevelConfig>,
    seed: u32,
    events: Vec<GameEvent>,
    /// Index of the first event not yet dispatched
    next_index: usize,
    triggered: HashSet<u32>,
    scored: HashSet<u32>,
    countdown_secs: u32,
    countdown_started_ms: Millis,
    round_start_ms: Option<Millis>,
    score_engine: Option<ScoreEngine>,
    final_stats: Option<RoundStats>,
}

impl Default for RoundManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundManager {
    pub fn new() -> Self {
        Self {
            state: RoundState::Idle,
            level: None,
            seed: 0,
            events: Vec::new(),
            next_index: 0,
            triggered: HashSet::new(),
            scored: HashSet::new(),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            countdown_started_ms: 0,
            round_start_ms: None,
            score_engine: None,
            final_stats: None,
        }
    }

    /// Manager using the countdown length and tolerance from `settings`
    pub fn with_settings(settings: &Settings) -> Self {
        let mut manager = Self::new();
        manager.countdown_secs = settings.countdown_secs;
        manager.attach_score_engine(ScoreEngine::with_tolerance(settings.timing_tolerance_ms));
        manager
    }

    pub fn attach_score_engine(&mut self, engine: ScoreEngine) {
        self.score_engine = Some(engine);
    }

    pub fn detach_score_engine(&mut self) -> Option<ScoreEngine> {
        self.score_engine.take()
    }

    pub fn score_engine(&self) -> Option<&ScoreEngine> {
        self.score_engine.as_ref()
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn level(&self) -> Option<&LevelConfig> {
        self.level.as_ref()
    }

    /// Seed the current event list was generated from
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Full event list for the round, sorted by scheduled time
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn round_start_ms(&self) -> Option<Millis> {
        self.round_start_ms
    }

    pub fn final_stats(&self) -> Option<&RoundStats> {
        self.final_stats.as_ref()
    }

    /// Whether `event_id` has already been dispatched this round
    pub fn is_triggered(&self, event_id: u32) -> bool {
        self.triggered.contains(&event_id)
    }

    /// Generate the event list for a new round
    ///
    /// Rounds with zero overlap probability use the overlap-free generator.
    /// A round in progress is stopped first. Without a seed one is drawn
    /// from OS entropy.
    pub fn setup_round(
        &mut self,
        level: &LevelConfig,
        pack: Option<&Pack>,
        species: &[SpeciesSelection],
        seed: Option<u32>,
    ) -> Result<()> {
        if self.state != RoundState::Idle {
            self.stop_round();
        }

        let seed = seed.unwrap_or_else(entropy_seed);
        let mut rng = SeededRandom::new(seed);
        let mut events = generate_round(level, pack, species, &mut rng)?;
        events.sort_by_key(|e| (e.scheduled_time_ms, e.event_id));

        self.level = Some(level.clone());
        self.seed = seed;
        self.events = events;
        self.next_index = 0;
        self.triggered.clear();
        self.scored.clear();
        self.final_stats = None;
        if let Some(engine) = self.score_engine.as_mut() {
            engine.reset();
        }

        log::info!(
            "Round set up: level {} seed {} with {} events over {}s",
            level.level_id,
            seed,
            self.events.len(),
            level.round_duration_sec
        );
        Ok(())
    }

    /// Begin the round at clock time `now_ms`
    pub fn start_round(&mut self, now_ms: Millis, skip_countdown: bool) -> Result<()> {
        if self.level.is_none() || self.state != RoundState::Idle {
            return Err(GameError::RoundNotSetUp);
        }
        if skip_countdown || self.countdown_secs == 0 {
            self.begin_playing(now_ms);
        } else {
            self.state = RoundState::Countdown;
            self.countdown_started_ms = now_ms;
            log::info!("Countdown started ({}s)", self.countdown_secs);
        }
        Ok(())
    }

    fn begin_playing(&mut self, start_ms: Millis) {
        self.state = RoundState::Playing;
        self.round_start_ms = Some(start_ms);
        log::info!("Round playing from {}ms", start_ms);
    }

    /// Abandon the round. Safe in any state; nothing dispatches afterwards.
    pub fn stop_round(&mut self) {
        if self.state != RoundState::Idle {
            log::info!("Round stopped in state {:?}", self.state);
        }
        self.state = RoundState::Idle;
        self.level = None;
        self.events.clear();
        self.next_index = 0;
        self.triggered.clear();
        self.round_start_ms = None;
    }

    /// Advance to clock time `now_ms`
    pub fn advance(&mut self, now_ms: Millis) -> RoundUpdate {
        let mut update = RoundUpdate {
            state: self.state,
            elapsed_ms: 0,
            countdown_remaining: None,
            due_events: Vec::new(),
            stats: None,
        };

        if self.state == RoundState::Countdown {
            let total_ms = self.countdown_secs as Millis * 1000;
            let counted = now_ms - self.countdown_started_ms;
            if counted < total_ms {
                let remaining = (total_ms - counted + 999) / 1000;
                update.countdown_remaining = Some(remaining as u32);
                return update;
            }
            self.begin_playing(self.countdown_started_ms + total_ms);
        }

        if self.state != RoundState::Playing {
            if self.state == RoundState::Ended {
                update.elapsed_ms = self.level.as_ref().map_or(0, |l| l.duration_ms());
            }
            return update;
        }

        let Some(start) = self.round_start_ms else {
            return update;
        };
        let duration_ms = self.level.as_ref().map_or(0, |l| l.duration_ms());
        let elapsed = (now_ms - start).max(0);

        while let Some(event) = self.events.get(self.next_index) {
            if event.scheduled_time_ms > elapsed {
                break;
            }
            if self.triggered.insert(event.event_id) {
                update.due_events.push(event.clone());
            }
            self.next_index += 1;
        }

        update.elapsed_ms = elapsed.min(duration_ms);
        if elapsed >= duration_ms {
            let stats = self.end_round();
            update.stats = Some(stats);
        }
        update.state = self.state;
        update
    }

    fn end_round(&mut self) -> RoundStats {
        self.state = RoundState::Ended;
        let total_events = self.events.len() as u32;
        let stats = match &self.score_engine {
            Some(engine) => engine.round_stats(total_events),
            None => RoundStats {
                total_events,
                ..Default::default()
            },
        };
        log::info!(
            "Round ended: {} pts, {}/{} events scored, {:.1}% accuracy",
            stats.total_score,
            stats.events_scored,
            stats.total_events,
            stats.accuracy_percent
        );
        self.final_stats = Some(stats.clone());
        stats
    }

    /// Grade an input against the best matching unscored event
    ///
    /// Windows open half a window before an event is dispatched, so early
    /// answers can land on events that have not started playing yet.
    pub fn submit_input(&mut self, input: &ScoringInput) -> Result<ScoringResult> {
        if self.state != RoundState::Playing {
            return Err(GameError::NoTargetEvent(input.timestamp_ms));
        }
        let target = find_target_event(&self.events, input, &self.scored)
            .ok_or(GameError::NoTargetEvent(input.timestamp_ms))?
            .clone();
        let engine = self.score_engine.as_mut().ok_or(GameError::NoScoreEngine)?;
        let result = engine.score_event(&target, input);
        self.scored.insert(target.event_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{
        Channel, ClipMetadata, EventDensity, GameMode, SpectrogramMode, TimingAccuracy,
        VocalizationType,
    };

    fn level(secs: u32, overlap: f64) -> LevelConfig {
        LevelConfig {
            level_id: 7,
            pack_id: "common".into(),
            mode: GameMode::Campaign,
            round_duration_sec: secs,
            species_count: 2,
            event_density: EventDensity::High,
            overlap_probability: overlap,
            scoring_window_ms: 1500,
            spectrogram_mode: SpectrogramMode::Full,
        }
    }

    fn species() -> Vec<SpeciesSelection> {
        ["bcch", "whbn"]
            .iter()
            .map(|code| SpeciesSelection {
                species_code: code.to_string(),
                common_name: String::new(),
                clips: vec![ClipMetadata {
                    clip_id: format!("{code}_0"),
                    species_code: code.to_string(),
                    vocalization_type: VocalizationType::Call,
                    duration_ms: 600,
                    file_path: String::new(),
                    spectrogram_path: None,
                }],
            })
            .collect()
    }

    #[test]
    fn test_start_without_setup_fails() {
        let mut round = RoundManager::new();
        assert!(matches!(round.start_round(0, true), Err(GameError::RoundNotSetUp)));
        assert_eq!(round.advance(1000).state, RoundState::Idle);
    }

    #[test]
    fn test_countdown_then_playing() {
        let mut round = RoundManager::new();
        round.setup_round(&level(10, 0.0), None, &species(), Some(5)).unwrap();
        round.start_round(0, false).unwrap();
        assert_eq!(round.state(), RoundState::Countdown);

        let update = round.advance(100);
        assert_eq!(update.countdown_remaining, Some(3));
        let update = round.advance(2500);
        assert_eq!(update.countdown_remaining, Some(1));
        assert!(update.due_events.is_empty());

        let update = round.advance(3000);
        assert_eq!(update.state, RoundState::Playing);
        assert_eq!(round.round_start_ms(), Some(3000));
        assert_eq!(update.elapsed_ms, 0);
    }

    #[test]
    fn test_each_event_dispatched_once_in_order() {
        let mut round = RoundManager::new();
        round.setup_round(&level(20, 0.6), None, &species(), Some(99)).unwrap();
        let total = round.events().len();
        assert!(total > 0);
        round.start_round(0, true).unwrap();

        let mut seen = Vec::new();
        let mut now = 0;
        let mut stats = None;
        while stats.is_none() {
            let update = round.advance(now);
            // tick twice at the same instant; nothing new should fire
            assert!(round.advance(now).due_events.is_empty());
            seen.extend(update.due_events);
            stats = update.stats;
            now += crate::consts::TICK_MS;
        }

        assert_eq!(seen.len(), total);
        for pair in seen.windows(2) {
            assert!(pair[0].scheduled_time_ms <= pair[1].scheduled_time_ms);
        }
        let stats = stats.unwrap();
        assert_eq!(round.state(), RoundState::Ended);
        assert_eq!(stats.total_events as usize, total);
        assert_eq!(stats.total_score, 0);
        assert_eq!(stats.accuracy_percent, 0.0);
    }

    #[test]
    fn test_large_step_fires_everything_and_ends() {
        let mut round = RoundManager::new();
        round.setup_round(&level(10, 0.0), None, &species(), Some(1)).unwrap();
        round.start_round(1000, true).unwrap();
        let update = round.advance(1000 + 60_000);
        assert_eq!(update.due_events.len(), round.events().len());
        assert_eq!(update.state, RoundState::Ended);
        assert_eq!(update.elapsed_ms, 10_000);
        assert!(round.advance(1000 + 61_000).due_events.is_empty());
    }

    #[test]
    fn test_stop_prevents_dispatch() {
        let mut round = RoundManager::new();
        round.setup_round(&level(10, 0.0), None, &species(), Some(3)).unwrap();
        round.start_round(0, true).unwrap();
        round.stop_round();
        round.stop_round();
        let update = round.advance(20_000);
        assert_eq!(update.state, RoundState::Idle);
        assert!(update.due_events.is_empty());
        assert!(matches!(round.start_round(0, true), Err(GameError::RoundNotSetUp)));
    }

    #[test]
    fn test_setup_while_playing_restarts_cleanly() {
        let mut round = RoundManager::new();
        round.setup_round(&level(10, 0.0), None, &species(), Some(3)).unwrap();
        round.start_round(0, true).unwrap();
        let _ = round.advance(5000);

        round.setup_round(&level(10, 0.0), None, &species(), Some(3)).unwrap();
        assert_eq!(round.state(), RoundState::Idle);
        assert!(round.events().iter().all(|e| !round.is_triggered(e.event_id)));
        assert_eq!(round.seed(), 3);
    }

    #[test]
    fn test_submit_input_scores_event_in_window() {
        let mut round = RoundManager::new();
        round.attach_score_engine(ScoreEngine::new());
        round.setup_round(&level(10, 0.0), None, &species(), Some(8)).unwrap();
        round.start_round(0, true).unwrap();

        let first = round.events()[0].clone();
        let stray = ScoringInput {
            species_code: Some(first.species_code.clone()),
            channel: first.channel,
            timestamp_ms: -5000,
        };
        assert!(matches!(round.submit_input(&stray), Err(GameError::NoTargetEvent(-5000))));

        // answered inside the perfect tolerance, before the clip is dispatched
        let early = ScoringInput {
            timestamp_ms: first.scheduled_time_ms - 50,
            ..stray
        };
        let update = round.advance(early.timestamp_ms);
        assert!(update.due_events.is_empty());
        assert!(!round.is_triggered(first.event_id));

        let result = round.submit_input(&early).unwrap();
        assert_eq!(result.event_id, first.event_id);
        assert_eq!(result.breakdown.timing_accuracy, TimingAccuracy::Perfect);
        assert_eq!(result.breakdown.total_points, 100);
        // the same event cannot be scored twice
        assert!(matches!(round.submit_input(&early), Err(GameError::NoTargetEvent(_))));

        let update = round.advance(60_000);
        assert_eq!(update.due_events[0].event_id, first.event_id);
        let stats = update.stats.unwrap();
        assert_eq!(stats.total_score, 100);
        assert_eq!(stats.events_scored, 1);
        assert_eq!(stats.perfect_count, 1);
    }

    #[test]
    fn test_submit_without_engine() {
        let mut round = RoundManager::new();
        round.setup_round(&level(10, 0.0), None, &species(), Some(8)).unwrap();
        round.start_round(0, true).unwrap();
        let first = round.events()[0].clone();
        let _ = round.advance(first.scheduled_time_ms);
        let input = ScoringInput {
            species_code: None,
            channel: Channel::Left,
            timestamp_ms: first.scheduled_time_ms,
        };
        assert!(matches!(round.submit_input(&input), Err(GameError::NoScoreEngine)));
    }
}
