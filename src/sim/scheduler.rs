//! Fixed-duration round scheduling
//!
//! Produces the complete, time-ordered event list for a round before playback
//! begins. Output is a pure function of the generator state, the level, the
//! pack and the species order.

use serde::{Deserialize, Serialize};

use super::difficulty::{self, DifficultyParams};
use super::rng::RandomSource;
use super::state::{
    Channel, ClipMetadata, GameEvent, LevelConfig, Millis, Pack, SpeciesSelection,
    VocalizationWeights,
};
use crate::consts::OVERLAP_OFFSET_MS;
use crate::error::{GameError, Result};

/// Analytic range of events a round is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCountEstimate {
    pub min: u32,
    pub max: u32,
}

/// Species, clip and channel drawn for one event
pub(crate) struct EventDraw<'a> {
    pub species: &'a SpeciesSelection,
    pub clip: &'a ClipMetadata,
    pub channel: Channel,
}

/// Draw the content of one event
///
/// Species is uniform over `pool`, the vocalization type comes from the
/// weighted coin flip, the clip is uniform among that species' clips of the
/// chosen type (all of its clips if none match). A forced channel is used
/// as-is; otherwise the channel is uniform. Species without clips must be
/// filtered out by the caller; an empty pool yields `None`.
pub(crate) fn draw_event<'a, R: RandomSource>(
    rng: &mut R,
    pool: &[&'a SpeciesSelection],
    weights: &VocalizationWeights,
    forced_channel: Option<Channel>,
) -> Option<EventDraw<'a>> {
    if pool.is_empty() {
        return None;
    }
    let species = pool[rng.index(pool.len())];
    let wanted = difficulty::select_vocalization_type(weights, rng.next_unit());

    let matching: Vec<&ClipMetadata> = species
        .clips
        .iter()
        .filter(|c| c.vocalization_type == wanted)
        .collect();
    let clip = if matching.is_empty() {
        let all: Vec<&ClipMetadata> = species.clips.iter().collect();
        if all.is_empty() {
            return None;
        }
        all[rng.index(all.len())]
    } else {
        matching[rng.index(matching.len())]
    };

    let channel = match forced_channel {
        Some(channel) => channel,
        None => Channel::ALL[rng.index(Channel::ALL.len())],
    };

    Some(EventDraw {
        species,
        clip,
        channel,
    })
}

/// Uniform overlap offset in ±`OVERLAP_OFFSET_MS`
pub(crate) fn draw_overlap_offset<R: RandomSource>(rng: &mut R) -> Millis {
    let span = OVERLAP_OFFSET_MS as f64;
    rng.range(-span, span).round() as Millis
}

/// Build an event whose scoring window is centred on `scheduled_time_ms`
pub(crate) fn make_event(
    event_id: u32,
    draw: &EventDraw<'_>,
    scheduled_time_ms: Millis,
    scoring_window_ms: u32,
) -> GameEvent {
    let window_start = scheduled_time_ms - (scoring_window_ms / 2) as Millis;
    GameEvent {
        event_id,
        clip_id: draw.clip.clip_id.clone(),
        species_code: draw.species.species_code.clone(),
        channel: draw.channel,
        scheduled_time_ms,
        scoring_window_start_ms: window_start,
        scoring_window_end_ms: window_start + scoring_window_ms as Millis,
        duration_ms: draw.clip.duration_ms,
        vocalization_type: Some(draw.clip.vocalization_type),
        timing_tolerance_ms: None,
    }
}

/// Species that can actually be scheduled
pub(crate) fn playable(species: &[SpeciesSelection]) -> Vec<&SpeciesSelection> {
    species.iter().filter(|s| !s.clips.is_empty()).collect()
}

/// Event list generator for rounds of known duration
#[derive(Debug, Clone)]
pub struct EventScheduler {
    params: DifficultyParams,
    duration_ms: Millis,
}

impl EventScheduler {
    /// Resolve difficulty for `level` and `pack`, failing on invalid input
    pub fn new(level: &LevelConfig, pack: Option<&Pack>) -> Result<Self> {
        level.validate()?;
        if let Some(pack) = pack {
            pack.validate()?;
        }
        let params = difficulty::calculate(level, pack);
        if !difficulty::validate_params(&params) {
            return Err(GameError::InvalidParams);
        }
        Ok(Self {
            params,
            duration_ms: level.duration_ms(),
        })
    }

    pub fn params(&self) -> &DifficultyParams {
        &self.params
    }

    pub fn duration_ms(&self) -> Millis {
        self.duration_ms
    }

    /// Generate a round where no two events play at once
    pub fn generate_non_overlapping<R: RandomSource>(
        &self,
        species: &[SpeciesSelection],
        rng: &mut R,
    ) -> Result<Vec<GameEvent>> {
        self.generate(species, rng, false)
    }

    /// Generate a round where a second event may join a primary one
    pub fn generate_with_overlaps<R: RandomSource>(
        &self,
        species: &[SpeciesSelection],
        rng: &mut R,
    ) -> Result<Vec<GameEvent>> {
        self.generate(species, rng, true)
    }

    fn generate<R: RandomSource>(
        &self,
        species: &[SpeciesSelection],
        rng: &mut R,
        allow_overlap: bool,
    ) -> Result<Vec<GameEvent>> {
        if species.is_empty() {
            return Err(GameError::InsufficientSpecies {
                requested: 1,
                available: 0,
            });
        }
        if let Some(empty) = species.iter().find(|s| s.clips.is_empty()) {
            return Err(GameError::NoClips(empty.species_code.clone()));
        }
        let pool = playable(species);
        let params = &self.params;
        let weights = params.vocalization_weights;

        let mut events = Vec::new();
        let mut next_id = 0u32;
        let mut previous_time: Millis = 0;
        // Lane of the clips still playing and when the last of them ends.
        // Only tracked without overlaps: a primary that starts while another
        // clip plays joins its lane, so opposite lanes never sound together.
        let mut busy_lane: Option<(Channel, Millis)> = None;

        loop {
            let gap = rng
                .range(params.min_gap_ms as f64, params.max_gap_ms as f64)
                .floor() as Millis;
            let time = previous_time + gap;
            if time >= self.duration_ms {
                break;
            }

            let forced_channel = busy_lane
                .filter(|&(_, end)| !allow_overlap && time < end)
                .map(|(channel, _)| channel);
            let Some(draw) = draw_event(rng, &pool, &weights, forced_channel) else {
                break;
            };
            let primary = make_event(next_id, &draw, time, params.scoring_window_ms);
            next_id += 1;
            previous_time = time;
            if !allow_overlap {
                let end = primary.end_time_ms();
                busy_lane = Some(match busy_lane {
                    Some((channel, busy_until)) if time < busy_until => {
                        (channel, busy_until.max(end))
                    }
                    _ => (primary.channel, end),
                });
            }
            let primary_channel = primary.channel;
            events.push(primary);

            if allow_overlap && rng.chance(params.overlap_probability) {
                let offset = draw_overlap_offset(rng);
                let overlap_time = (time + offset).max(0);
                if let Some(draw) =
                    draw_event(rng, &pool, &weights, Some(primary_channel.opposite()))
                {
                    if overlap_time < self.duration_ms {
                        events.push(make_event(
                            next_id,
                            &draw,
                            overlap_time,
                            params.scoring_window_ms,
                        ));
                        next_id += 1;
                    }
                }
            }
        }

        events.sort_by_key(|e| (e.scheduled_time_ms, e.event_id));
        log::debug!(
            "Generated {} events over {}ms (overlap={}, gaps={}..{}ms)",
            events.len(),
            self.duration_ms,
            allow_overlap,
            params.min_gap_ms,
            params.max_gap_ms
        );
        Ok(events)
    }
}

/// Generate a round for `level`, picking the mode from its overlap probability
pub fn generate_round<R: RandomSource>(
    level: &LevelConfig,
    pack: Option<&Pack>,
    species: &[SpeciesSelection],
    rng: &mut R,
) -> Result<Vec<GameEvent>> {
    let scheduler = EventScheduler::new(level, pack)?;
    if level.overlap_probability == 0.0 {
        scheduler.generate_non_overlapping(species, rng)
    } else {
        scheduler.generate_with_overlaps(species, rng)
    }
}

fn sorted_by_time(events: &[GameEvent]) -> Vec<&GameEvent> {
    let mut sorted: Vec<&GameEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.scheduled_time_ms);
    sorted
}

/// Count pairs whose playback intervals intersect, filtered by `same_channel`
fn count_pairs(events: &[GameEvent], same_channel: bool) -> usize {
    let sorted = sorted_by_time(events);
    let mut count = 0;
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            if b.scheduled_time_ms >= a.end_time_ms() {
                break;
            }
            if (a.channel == b.channel) == same_channel {
                count += 1;
            }
        }
    }
    count
}

/// Number of cross-channel event pairs that play at the same time
pub fn count_overlaps(events: &[GameEvent]) -> usize {
    count_pairs(events, false)
}

/// Whether any two events on opposite channels play at the same time
pub fn has_overlaps(events: &[GameEvent]) -> bool {
    count_overlaps(events) > 0
}

/// Same-channel pairs whose clips run into each other
///
/// Not counted as overlap: a single lane cannot voice two clips at once, so
/// this is reported separately for callers that want to flag it.
pub fn count_same_channel_overlaps(events: &[GameEvent]) -> usize {
    count_pairs(events, true)
}

/// Expected event count range for a round without generating one
pub fn estimate_event_count(level: &LevelConfig, pack: Option<&Pack>) -> EventCountEstimate {
    let params = difficulty::calculate(level, pack);
    let duration = level.duration_ms() as f64;
    let overlap_factor = 1.0 + params.overlap_probability;
    let fewest = (duration / params.max_gap_ms.max(1) as f64).floor();
    let most = (duration / params.min_gap_ms.max(1) as f64).floor();
    EventCountEstimate {
        min: (fewest * overlap_factor).floor() as u32,
        max: (most * overlap_factor).ceil() as u32,
    }
}
