//! Endless random mode
//!
//! Events come from the [`InfiniteScheduler`] as the session clock advances.
//! Events whose scoring window closes unanswered count as misses, and the
//! session ends once the miss budget from [`Settings`] is spent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::sim::rng::entropy_seed;
use crate::sim::{
    DifficultyRamp, DifficultyState, GameEvent, InfiniteScheduler, Millis, Pack, RoundStats,
    ScoreEngine, ScoringInput, ScoringResult, SeededRandom, SpeciesSelection, find_target_event,
};

/// Persistable random-mode state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomModeState {
    pub high_scores: HighScores,
    pub settings: Settings,
    #[serde(default)]
    pub ramp: DifficultyRamp,
}

/// Result of one `advance` call
#[derive(Debug, Clone, PartialEq)]
pub struct RandomUpdate {
    pub elapsed_ms: Millis,
    pub difficulty: DifficultyState,
    /// Events to start playing now
    pub new_events: Vec<GameEvent>,
    /// Events whose window closed without an answer
    pub expired: Vec<ScoringResult>,
    /// Present only on the call that ends the session
    pub ended: Option<RoundStats>,
}

/// One endless session at a time
#[derive(Debug, Clone)]
pub struct RandomMode {
    scheduler: InfiniteScheduler,
    engine: ScoreEngine,
    rng: SeededRandom,
    species: Vec<SpeciesSelection>,
    settings: Settings,
    high_scores: HighScores,
    pending: Vec<GameEvent>,
    seed: u32,
    events_generated: u32,
    active: bool,
}

impl RandomMode {
    pub fn new(
        species: Vec<SpeciesSelection>,
        pack: Option<Pack>,
        ramp: DifficultyRamp,
        settings: Settings,
    ) -> Self {
        Self {
            scheduler: InfiniteScheduler::new(ramp, pack),
            engine: ScoreEngine::with_tolerance(settings.timing_tolerance_ms),
            rng: SeededRandom::new(0),
            species,
            settings,
            high_scores: HighScores::new(),
            pending: Vec::new(),
            seed: 0,
            events_generated: 0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn score_engine(&self) -> &ScoreEngine {
        &self.engine
    }

    /// Events played but not yet answered or expired
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.pending
    }

    pub fn misses_left(&self) -> u32 {
        self.settings
            .miss_budget
            .saturating_sub(self.engine.state().miss_count)
    }

    pub fn high_score(&self) -> Option<u64> {
        self.high_scores.top_score()
    }

    /// Start a fresh session at clock `now_ms`
    pub fn start(&mut self, now_ms: Millis, seed: Option<u32>) -> Result<()> {
        if self.species.iter().all(|s| s.clips.is_empty()) {
            return Err(GameError::InsufficientSpecies {
                requested: 1,
                available: 0,
            });
        }
        let seed = seed.unwrap_or_else(entropy_seed);
        self.seed = seed;
        self.rng.reseed(seed);
        self.engine = ScoreEngine::with_tolerance(self.settings.timing_tolerance_ms);
        self.pending.clear();
        self.events_generated = 0;
        self.scheduler.start(now_ms);
        self.active = true;
        log::info!(
            "Random session started: seed {}, {} misses allowed",
            seed,
            self.settings.miss_budget
        );
        Ok(())
    }

    /// Advance the session clock
    pub fn advance(&mut self, now_ms: Millis) -> RandomUpdate {
        let elapsed_ms = self.scheduler.elapsed_since_start(now_ms);
        let mut update = RandomUpdate {
            elapsed_ms,
            difficulty: self.scheduler.difficulty_state(elapsed_ms),
            new_events: Vec::new(),
            expired: Vec::new(),
            ended: None,
        };
        if !self.active {
            return update;
        }

        let (expired, pending): (Vec<GameEvent>, Vec<GameEvent>) = self
            .pending
            .drain(..)
            .partition(|e| e.scoring_window_end_ms < elapsed_ms);
        self.pending = pending;
        for event in &expired {
            let no_answer = ScoringInput {
                species_code: None,
                channel: event.channel,
                timestamp_ms: elapsed_ms,
            };
            update.expired.push(self.engine.score_event(event, &no_answer));
        }

        if self.engine.state().miss_count >= self.settings.miss_budget {
            update.ended = Some(self.finish(now_ms));
            return update;
        }

        let batch = self
            .scheduler
            .generate_next_events(elapsed_ms, &self.species, &mut self.rng);
        self.events_generated += batch.len() as u32;
        self.pending.extend(batch.iter().cloned());
        update.new_events = batch;
        update
    }

    /// Grade an answer against the pending events
    pub fn submit_input(&mut self, input: &ScoringInput) -> Result<ScoringResult> {
        if !self.active {
            return Err(GameError::NoTargetEvent(input.timestamp_ms));
        }
        let target = find_target_event(&self.pending, input, &HashSet::new())
            .ok_or(GameError::NoTargetEvent(input.timestamp_ms))?
            .clone();
        self.pending.retain(|e| e.event_id != target.event_id);
        Ok(self.engine.score_event(&target, input))
    }

    /// End the session early; returns stats if one was running
    pub fn stop(&mut self, now_ms: Millis) -> Option<RoundStats> {
        self.active.then(|| self.finish(now_ms))
    }

    fn finish(&mut self, now_ms: Millis) -> RoundStats {
        self.active = false;
        self.scheduler.stop();
        self.pending.clear();
        let stats = self.engine.round_stats(self.events_generated);
        let rank = self.high_scores.add_score(
            stats.total_score,
            stats.accuracy_percent,
            self.seed,
            now_ms as f64,
        );
        log::info!(
            "Random session over: {} pts from {} events (rank {:?})",
            stats.total_score,
            stats.total_events,
            rank
        );
        stats
    }

    pub fn export_state(&self) -> RandomModeState {
        RandomModeState {
            high_scores: self.high_scores.clone(),
            settings: self.settings.clone(),
            ramp: *self.scheduler.ramp(),
        }
    }

    /// Restore persisted state; ignored while a session is running
    pub fn import_state(&mut self, state: RandomModeState) {
        if self.active {
            log::warn!("Ignoring state import during an active session");
            return;
        }
        self.high_scores = state.high_scores;
        self.settings = state.settings;
        self.engine = ScoreEngine::with_tolerance(self.settings.timing_tolerance_ms);
        self.scheduler = InfiniteScheduler::new(state.ramp, self.scheduler.pack().cloned());
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export_state())?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let state: RandomModeState = serde_json::from_str(json)?;
        self.import_state(state);
        Ok(())
    }
}
