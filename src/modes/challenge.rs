//! Daily challenge
//!
//! Everyone playing on the same date gets the same species and the same
//! event list: both are drawn from a seed derived from the date.

use serde::{Deserialize, Serialize};

use crate::config::select_species;
use crate::error::Result;
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::sim::{
    LevelConfig, Millis, Pack, RoundManager, RoundUpdate, ScoringInput, ScoringResult,
    SeededRandom, SpeciesSelection,
};

/// Seed for a calendar date, e.g. 2026-10-16 -> 20261016
pub fn daily_seed(year: u32, month: u32, day: u32) -> u32 {
    year * 10_000 + month * 100 + day
}

/// Persistable challenge progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub high_scores: HighScores,
    pub attempts: u32,
    pub last_seed: Option<u32>,
}

/// One round per day over a fixed level
#[derive(Debug, Clone)]
pub struct ChallengeMode {
    level: LevelConfig,
    pack: Option<Pack>,
    species_pool: Vec<SpeciesSelection>,
    settings: Settings,
    round: RoundManager,
    progress: ChallengeProgress,
    seed: u32,
}

impl ChallengeMode {
    pub fn new(
        level: LevelConfig,
        pack: Option<Pack>,
        species_pool: Vec<SpeciesSelection>,
        settings: Settings,
    ) -> Self {
        let round = RoundManager::with_settings(&settings);
        Self {
            level,
            pack,
            species_pool,
            settings,
            round,
            progress: ChallengeProgress::default(),
            seed: 0,
        }
    }

    pub fn round(&self) -> &RoundManager {
        &self.round
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn high_score(&self) -> Option<u64> {
        self.progress.high_scores.top_score()
    }

    /// Set up and start the challenge round for `seed` at clock `now_ms`
    pub fn begin(&mut self, seed: u32, now_ms: Millis) -> Result<()> {
        let mut species_rng = SeededRandom::new(seed);
        let species = select_species(
            &self.species_pool,
            self.pack.as_ref(),
            self.level.species_count as usize,
            &mut species_rng,
        )?;
        self.round
            .setup_round(&self.level, self.pack.as_ref(), &species, Some(seed))?;
        self.round.start_round(now_ms, self.settings.skip_countdown)?;

        self.seed = seed;
        self.progress.attempts += 1;
        self.progress.last_seed = Some(seed);
        log::info!("Challenge {} started (attempt {})", seed, self.progress.attempts);
        Ok(())
    }

    /// Drive the round; records the result when it ends
    pub fn advance(&mut self, now_ms: Millis) -> RoundUpdate {
        let update = self.round.advance(now_ms);
        if let Some(stats) = &update.stats {
            let _ = self.progress.high_scores.add_score(
                stats.total_score,
                stats.accuracy_percent,
                self.seed,
                now_ms as f64,
            );
        }
        update
    }

    pub fn submit_input(&mut self, input: &ScoringInput) -> Result<ScoringResult> {
        self.round.submit_input(input)
    }

    pub fn stop(&mut self) {
        self.round.stop_round();
    }

    pub fn export_state(&self) -> ChallengeProgress {
        self.progress.clone()
    }

    pub fn import_state(&mut self, progress: ChallengeProgress) {
        self.progress = progress;
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.progress)?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<()> {
        self.progress = serde_json::from_str(json)?;
        Ok(())
    }
}
