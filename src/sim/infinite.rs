//! Unbounded "random" mode scheduling
//!
//! Events are produced on demand as the caller polls with the session's
//! elapsed time. Difficulty ramps linearly from a start state to a max state.

use serde::{Deserialize, Serialize};

use super::difficulty::{DifficultyParams, scale_gap, scale_overlap};
use super::rng::RandomSource;
use super::scheduler::{draw_event, draw_overlap_offset, make_event, playable};
use super::state::{EventDensity, GameEvent, Millis, Pack, SpeciesSelection, VocalizationWeights};
use crate::consts::INFINITE_FIRST_EVENT_MS;
use crate::lerp;

/// How difficulty interpolates over elapsed session time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRamp {
    /// Lowest density tier the step function may report
    pub start_density: EventDensity,
    /// Highest density tier the step function may report
    pub max_density: EventDensity,
    pub start_overlap_probability: f64,
    pub max_overlap_probability: f64,
    pub ramp_duration_ms: u64,
    pub start_scoring_window_ms: u32,
    pub min_scoring_window_ms: u32,
}

impl Default for DifficultyRamp {
    fn default() -> Self {
        Self {
            start_density: EventDensity::Low,
            max_density: EventDensity::High,
            start_overlap_probability: 0.0,
            max_overlap_probability: 0.5,
            ramp_duration_ms: 300_000, // 5 minutes
            start_scoring_window_ms: 2000,
            min_scoring_window_ms: 800,
        }
    }
}

/// Difficulty at one instant of an infinite session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub elapsed_ms: Millis,
    /// 0.0 at session start, 1.0 once the ramp is complete
    pub ramp_progress: f64,
    pub event_density: EventDensity,
    pub overlap_probability: f64,
    pub scoring_window_ms: u32,
    pub min_gap_ms: u32,
    pub max_gap_ms: u32,
    pub vocalization_weights: VocalizationWeights,
}

impl DifficultyState {
    pub fn as_params(&self) -> DifficultyParams {
        DifficultyParams {
            min_gap_ms: self.min_gap_ms,
            max_gap_ms: self.max_gap_ms,
            overlap_probability: self.overlap_probability,
            scoring_window_ms: self.scoring_window_ms,
            vocalization_weights: self.vocalization_weights,
            event_density: self.event_density,
        }
    }
}

/// Lifecycle of an infinite session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedulerPhase {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// On-demand event generator for unbounded sessions
#[derive(Debug, Clone)]
pub struct InfiniteScheduler {
    ramp: DifficultyRamp,
    pack: Option<Pack>,
    phase: SchedulerPhase,
    session_start_ms: Millis,
    next_event_due_ms: Millis,
    event_index: u32,
}

impl InfiniteScheduler {
    pub fn new(ramp: DifficultyRamp, pack: Option<Pack>) -> Self {
        Self {
            ramp,
            pack,
            phase: SchedulerPhase::Idle,
            session_start_ms: 0,
            next_event_due_ms: INFINITE_FIRST_EVENT_MS,
            event_index: 0,
        }
    }

    pub fn ramp(&self) -> &DifficultyRamp {
        &self.ramp
    }

    pub fn pack(&self) -> Option<&Pack> {
        self.pack.as_ref()
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SchedulerPhase::Running
    }

    pub fn session_start_ms(&self) -> Millis {
        self.session_start_ms
    }

    /// Elapsed session time for an absolute clock reading
    pub fn elapsed_since_start(&self, now_ms: Millis) -> Millis {
        now_ms - self.session_start_ms
    }

    pub fn next_event_due_ms(&self) -> Millis {
        self.next_event_due_ms
    }

    /// Begin a session at `start_ms`. Restarting resets the event index.
    pub fn start(&mut self, start_ms: Millis) {
        self.phase = SchedulerPhase::Running;
        self.session_start_ms = start_ms;
        self.event_index = 0;
        self.next_event_due_ms = INFINITE_FIRST_EVENT_MS;
        log::info!("Infinite session started at {}ms", start_ms);
    }

    /// Halt generation. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.phase == SchedulerPhase::Running {
            log::info!("Infinite session stopped after {} events", self.event_index);
        }
        self.phase = SchedulerPhase::Stopped;
    }

    /// Difficulty at `elapsed_ms`; a pure function of time and configuration
    pub fn difficulty_state(&self, elapsed_ms: Millis) -> DifficultyState {
        let ramp = &self.ramp;
        let progress = if ramp.ramp_duration_ms == 0 {
            1.0
        } else {
            (elapsed_ms as f64 / ramp.ramp_duration_ms as f64).clamp(0.0, 1.0)
        };

        let stepped = if progress < 0.33 {
            EventDensity::Low
        } else if progress < 0.66 {
            EventDensity::Medium
        } else {
            EventDensity::High
        };
        let event_density = stepped.max(ramp.start_density).min(ramp.max_density);

        // Gaps follow the low/high tier constants, not the configured tiers
        let (low_min, low_max) = EventDensity::Low.gap_range_ms();
        let (high_min, high_max) = EventDensity::High.gap_range_ms();
        let min_gap = lerp(low_min as f64, high_min as f64, progress);
        let max_gap = lerp(low_max as f64, high_max as f64, progress);
        let overlap = lerp(
            ramp.start_overlap_probability,
            ramp.max_overlap_probability,
            progress,
        );
        let window = lerp(
            ramp.start_scoring_window_ms as f64,
            ramp.min_scoring_window_ms as f64,
            progress,
        )
        .round() as u32;

        let (min_gap_ms, max_gap_ms, overlap_probability, vocalization_weights) = match &self.pack
        {
            Some(pack) => (
                scale_gap(min_gap, pack.tempo_multiplier),
                scale_gap(max_gap, pack.tempo_multiplier),
                scale_overlap(overlap, pack.overlap_multiplier),
                pack.vocalization_weights,
            ),
            None => (
                min_gap.round() as u32,
                max_gap.round() as u32,
                overlap.clamp(0.0, 1.0),
                VocalizationWeights::default(),
            ),
        };

        DifficultyState {
            elapsed_ms,
            ramp_progress: progress,
            event_density,
            overlap_probability,
            scoring_window_ms: window.max(1),
            min_gap_ms,
            max_gap_ms,
            vocalization_weights,
        }
    }

    /// Emit whatever is due at `elapsed_ms`
    ///
    /// Returns one primary event and possibly an overlap partner on the
    /// opposite lane, then arms the next due time a fresh gap later. Returns
    /// nothing when stopped, when no species can play, or before the due time.
    pub fn generate_next_events<R: RandomSource>(
        &mut self,
        elapsed_ms: Millis,
        species: &[SpeciesSelection],
        rng: &mut R,
    ) -> Vec<GameEvent> {
        if !self.is_running() || elapsed_ms < self.next_event_due_ms {
            return Vec::new();
        }
        let pool = playable(species);
        if pool.is_empty() {
            return Vec::new();
        }

        let difficulty = self.difficulty_state(elapsed_ms);
        let weights = difficulty.vocalization_weights;
        let window = difficulty.scoring_window_ms;
        let mut events = Vec::with_capacity(2);

        let Some(draw) = draw_event(rng, &pool, &weights, None) else {
            return events;
        };
        let primary = make_event(self.event_index, &draw, elapsed_ms, window);
        self.event_index += 1;
        let primary_channel = primary.channel;
        events.push(primary);

        if rng.chance(difficulty.overlap_probability) {
            let offset = draw_overlap_offset(rng);
            if let Some(draw) = draw_event(rng, &pool, &weights, Some(primary_channel.opposite())) {
                let time = (elapsed_ms + offset).max(0);
                events.push(make_event(self.event_index, &draw, time, window));
                self.event_index += 1;
            }
        }

        let gap = rng
            .range(difficulty.min_gap_ms as f64, difficulty.max_gap_ms as f64)
            .floor() as Millis;
        self.next_event_due_ms = elapsed_ms + gap.max(1);
        events
    }

    /// Poll repeatedly across `[start_ms, end_ms)`
    ///
    /// Stops early when a poll produces nothing or the due time fails to
    /// advance.
    pub fn generate_events_for_window<R: RandomSource>(
        &mut self,
        start_ms: Millis,
        end_ms: Millis,
        species: &[SpeciesSelection],
        rng: &mut R,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut cursor = start_ms;
        while self.is_running() {
            cursor = cursor.max(self.next_event_due_ms);
            if cursor >= end_ms {
                break;
            }
            let due_before = self.next_event_due_ms;
            let batch = self.generate_next_events(cursor, species, rng);
            if batch.is_empty() || self.next_event_due_ms <= due_before.max(cursor) {
                events.extend(batch);
                break;
            }
            events.extend(batch);
        }
        events
    }
}
