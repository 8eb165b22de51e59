//! High score leaderboard
//!
//! Keeps the top 10 session results per mode. Serialized by the owning mode's
//! `export_state`; storage is up to the caller.

use serde::{Deserialize, Serialize};

/// Sessions kept per board
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished session on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Session score
    pub score: u64,
    /// Accuracy percentage for the session
    pub accuracy_percent: f64,
    /// Seed the session was played with (daily challenge seed, etc.)
    pub seed: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Best sessions, highest score first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Whether a finished session earns a slot
    ///
    /// Sessions that scored nothing are never listed. Once the board is full a
    /// session has to strictly beat the current last place.
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        match self.entries.last() {
            Some(last) if self.entries.len() >= MAX_HIGH_SCORES => score > last.score,
            _ => true,
        }
    }

    /// 1-based slot a session would take, or `None` if it misses the board
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        self.qualifies(score).then(|| self.slot_for(score) + 1)
    }

    /// Index where `score` goes; ties land after earlier sessions
    fn slot_for(&self, score: u64) -> usize {
        self.entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len())
    }

    /// Record a finished session, returning its 1-based slot if it made the board
    pub fn add_score(
        &mut self,
        score: u64,
        accuracy_percent: f64,
        seed: u32,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let slot = self.slot_for(score);
        self.entries.insert(
            slot,
            HighScoreEntry {
                score,
                accuracy_percent,
                seed,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        log::info!("Session score {} took slot {}", score, slot + 1);

        Some(slot + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best session score so far
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best accuracy across all entries
    pub fn best_accuracy(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|e| e.accuracy_percent)
            .fold(None, |best, a| Some(best.map_or(a, |b: f64| b.max(a))))
    }
}
