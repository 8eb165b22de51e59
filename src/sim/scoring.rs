//! Input grading
//!
//! Each input is graded against one event on three independent axes:
//! species (50), channel (25) and timing (25 perfect / 10 partial / 0 miss).
//! [`ScoreEngine::score_event`] is the only path that mutates the running
//! [`ScoreState`].

use std::collections::HashSet;

use super::state::{
    GameEvent, Millis, RoundStats, ScoreBreakdown, ScoreState, ScoringInput, ScoringResult,
    TimingAccuracy,
};
use crate::consts::{
    CHANNEL_POINTS, DEFAULT_TIMING_TOLERANCE_MS, PARTIAL_TIMING_POINTS, PERFECT_TIMING_POINTS,
    SPECIES_POINTS,
};

/// Inclusive window test
pub fn is_input_in_window(event: &GameEvent, input: &ScoringInput) -> bool {
    event.scoring_window_start_ms <= input.timestamp_ms
        && input.timestamp_ms <= event.scoring_window_end_ms
}

/// Grades inputs and keeps the session aggregate
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    state: ScoreState,
    default_tolerance_ms: u32,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreEngine {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_TIMING_TOLERANCE_MS)
    }

    /// Engine whose perfect-timing tolerance defaults to `tolerance_ms`
    pub fn with_tolerance(tolerance_ms: u32) -> Self {
        Self {
            state: ScoreState::default(),
            default_tolerance_ms: tolerance_ms,
        }
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn default_tolerance_ms(&self) -> u32 {
        self.default_tolerance_ms
    }

    pub fn calculate_timing_accuracy(&self, event: &GameEvent, input: &ScoringInput) -> TimingAccuracy {
        if !is_input_in_window(event, input) {
            return TimingAccuracy::Miss;
        }
        let tolerance = event.timing_tolerance_ms.unwrap_or(self.default_tolerance_ms) as Millis;
        if (input.timestamp_ms - event.perfect_time_ms()).abs() <= tolerance {
            TimingAccuracy::Perfect
        } else {
            TimingAccuracy::Partial
        }
    }

    pub fn calculate_breakdown(&self, event: &GameEvent, input: &ScoringInput) -> ScoreBreakdown {
        if !is_input_in_window(event, input) {
            return ScoreBreakdown::miss();
        }

        let species_correct = input.species_code.as_deref() == Some(event.species_code.as_str());
        let channel_correct = input.channel == event.channel;
        let timing_accuracy = self.calculate_timing_accuracy(event, input);

        let species_points = if species_correct { SPECIES_POINTS } else { 0 };
        let channel_points = if channel_correct { CHANNEL_POINTS } else { 0 };
        let timing_points = match timing_accuracy {
            TimingAccuracy::Perfect => PERFECT_TIMING_POINTS,
            TimingAccuracy::Partial => PARTIAL_TIMING_POINTS,
            TimingAccuracy::Miss => 0,
        };

        ScoreBreakdown {
            species_correct,
            species_points,
            channel_correct,
            channel_points,
            timing_accuracy,
            timing_points,
            total_points: species_points + channel_points + timing_points,
        }
    }

    /// Grade `input` against `event` and fold the result into the session
    pub fn score_event(&mut self, event: &GameEvent, input: &ScoringInput) -> ScoringResult {
        let breakdown = self.calculate_breakdown(event, input);
        let missed = breakdown.total_points == 0 && !is_input_in_window(event, input);

        let state = &mut self.state;
        state.total_score += breakdown.total_points as u64;
        state.events_scored += 1;
        if breakdown.timing_accuracy == TimingAccuracy::Perfect {
            state.perfect_count += 1;
        }
        if breakdown.species_correct {
            state.species_correct_count += 1;
        }
        if breakdown.channel_correct {
            state.channel_correct_count += 1;
        }
        if missed {
            state.miss_count += 1;
        }

        let result = ScoringResult {
            event_id: event.event_id,
            input: input.clone(),
            breakdown,
            missed,
        };
        state.history.push(result.clone());
        log::debug!(
            "Scored event {}: {} pts ({:?})",
            event.event_id,
            breakdown.total_points,
            breakdown.timing_accuracy
        );
        result
    }

    /// Percentage of the maximum possible score; 0 before anything is scored
    pub fn accuracy_percent(&self) -> f64 {
        let state = &self.state;
        if state.events_scored == 0 {
            return 0.0;
        }
        let max = state.events_scored as f64 * crate::consts::MAX_EVENT_POINTS as f64;
        state.total_score as f64 / max * 100.0
    }

    /// Snapshot for a round summary covering `total_events` events
    pub fn round_stats(&self, total_events: u32) -> RoundStats {
        let state = &self.state;
        RoundStats {
            total_score: state.total_score,
            events_scored: state.events_scored,
            total_events,
            perfect_count: state.perfect_count,
            species_correct_count: state.species_correct_count,
            channel_correct_count: state.channel_correct_count,
            miss_count: state.miss_count,
            accuracy_percent: self.accuracy_percent(),
        }
    }

    /// Clear the session aggregate
    pub fn reset(&mut self) {
        self.state = ScoreState::default();
    }
}

/// Pick the event an input most plausibly answers
///
/// Candidates are events not yet in `scored` whose window contains the
/// input. Events on the input's lane win; ties go to the one whose perfect
/// time is closest.
pub fn find_target_event<'a>(
    events: impl IntoIterator<Item = &'a GameEvent>,
    input: &ScoringInput,
    scored: &HashSet<u32>,
) -> Option<&'a GameEvent> {
    events
        .into_iter()
        .filter(|e| !scored.contains(&e.event_id) && is_input_in_window(e, input))
        .min_by_key(|e| {
            (
                e.channel != input.channel,
                (input.timestamp_ms - e.perfect_time_ms()).abs(),
                e.event_id,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Channel, VocalizationType};
    use proptest::prelude::*;

    fn event(id: u32, time: Millis, window: u32) -> GameEvent {
        GameEvent {
            event_id: id,
            clip_id: "noca_0".into(),
            species_code: "noca".into(),
            channel: Channel::Left,
            scheduled_time_ms: time,
            scoring_window_start_ms: time - (window / 2) as Millis,
            scoring_window_end_ms: time + (window / 2) as Millis,
            duration_ms: 1500,
            vocalization_type: Some(VocalizationType::Song),
            timing_tolerance_ms: None,
        }
    }

    fn input(species: Option<&str>, channel: Channel, timestamp_ms: Millis) -> ScoringInput {
        ScoringInput {
            species_code: species.map(str::to_string),
            channel,
            timestamp_ms,
        }
    }

    #[test]
    fn test_perfect_input_scores_100() {
        let engine = ScoreEngine::new();
        let e = event(1, 5000, 2000);
        let b = engine.calculate_breakdown(&e, &input(Some("noca"), Channel::Left, e.perfect_time_ms()));
        assert_eq!(b.species_points, 50);
        assert_eq!(b.channel_points, 25);
        assert_eq!(b.timing_points, 25);
        assert_eq!(b.total_points, 100);
        assert_eq!(b.timing_accuracy, TimingAccuracy::Perfect);
    }

    #[test]
    fn test_window_boundaries_inclusive() {
        let engine = ScoreEngine::new();
        let e = event(1, 5000, 2000);
        let start = e.scoring_window_start_ms;
        let end = e.scoring_window_end_ms;

        for t in [start, end] {
            let i = input(Some("noca"), Channel::Left, t);
            assert!(is_input_in_window(&e, &i));
            assert_eq!(engine.calculate_timing_accuracy(&e, &i), TimingAccuracy::Partial);
        }
        for t in [start - 1, end + 1] {
            let i = input(Some("noca"), Channel::Left, t);
            assert!(!is_input_in_window(&e, &i));
            assert_eq!(engine.calculate_breakdown(&e, &i), ScoreBreakdown::miss());
        }
    }

    #[test]
    fn test_tolerance_override() {
        let engine = ScoreEngine::new();
        let mut e = event(1, 5000, 2000);
        let late = input(None, Channel::Right, 5250);
        assert_eq!(engine.calculate_timing_accuracy(&e, &late), TimingAccuracy::Partial);
        e.timing_tolerance_ms = Some(300);
        assert_eq!(engine.calculate_timing_accuracy(&e, &late), TimingAccuracy::Perfect);
    }

    #[test]
    fn test_axes_are_independent() {
        let engine = ScoreEngine::new();
        let e = event(1, 5000, 2000);
        let b = engine.calculate_breakdown(&e, &input(Some("amro"), Channel::Left, 5600));
        assert!(!b.species_correct);
        assert!(b.channel_correct);
        assert_eq!(b.total_points, 25 + 10);

        let b = engine.calculate_breakdown(&e, &input(Some("noca"), Channel::Right, 5050));
        assert_eq!(b.total_points, 50 + 25);
    }

    #[test]
    fn test_score_event_updates_state() {
        let mut engine = ScoreEngine::new();
        let e1 = event(1, 5000, 2000);
        let e2 = event(2, 9000, 2000);
        let e3 = event(3, 13_000, 2000);

        let r1 = engine.score_event(&e1, &input(Some("noca"), Channel::Left, 5000));
        assert!(!r1.missed);
        let r2 = engine.score_event(&e2, &input(Some("noca"), Channel::Left, 20_000));
        assert!(r2.missed);
        // zero points but inside the window is not a miss
        let r3 = engine.score_event(&e3, &input(None, Channel::Right, 12_500));
        assert_eq!(r3.breakdown.total_points, 10);
        assert!(!r3.missed);

        let state = engine.state();
        assert_eq!(state.total_score, 110);
        assert_eq!(state.events_scored, 3);
        assert_eq!(state.perfect_count, 1);
        assert_eq!(state.species_correct_count, 1);
        assert_eq!(state.channel_correct_count, 1);
        assert_eq!(state.miss_count, 1);
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history[1].event_id, 2);

        assert!((engine.accuracy_percent() - 110.0 / 3.0).abs() < 1e-9);

        engine.reset();
        assert_eq!(engine.state(), &ScoreState::default());
        assert_eq!(engine.accuracy_percent(), 0.0);
    }

    #[test]
    fn test_find_target_event_prefers_lane_then_proximity() {
        let mut a = event(1, 5000, 2000);
        a.channel = Channel::Right;
        let b = event(2, 5400, 2000);
        let c = event(3, 4900, 2000);
        let events = vec![a, b, c];
        let mut scored = HashSet::new();

        let i = input(Some("noca"), Channel::Left, 5000);
        assert_eq!(find_target_event(&events, &i, &scored).map(|e| e.event_id), Some(3));

        scored.insert(3);
        assert_eq!(find_target_event(&events, &i, &scored).map(|e| e.event_id), Some(2));

        let far = input(Some("noca"), Channel::Left, 60_000);
        assert!(find_target_event(&events, &far, &scored).is_none());
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_axes(
            offset in -3000i64..3000,
            species_match in any::<bool>(),
            left in any::<bool>(),
            window in 1u32..4000,
        ) {
            let engine = ScoreEngine::new();
            let e = event(1, 10_000, window);
            let i = input(
                if species_match { Some("noca") } else { Some("amro") },
                if left { Channel::Left } else { Channel::Right },
                10_000 + offset,
            );
            let b = engine.calculate_breakdown(&e, &i);
            prop_assert_eq!(b.total_points, b.species_points + b.channel_points + b.timing_points);
            prop_assert!([0, 10, 25, 35, 50, 60, 75, 85, 90, 100].contains(&b.total_points));
            prop_assert!(b.total_points <= 100);
        }
    }
}
