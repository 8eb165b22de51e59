//! End-to-end round flows through the public API

use birdlane::autoplay::AutoPlayer;
use birdlane::config::{LevelCatalog, select_species};
use birdlane::consts::TICK_MS;
use birdlane::sim::{
    ClipMetadata, EventDensity, GameMode, LevelConfig, Millis, Pack, RoundManager, RoundState,
    ScoreEngine, ScoringInput, SeededRandom, SpeciesSelection, SpectrogramMode, TimingAccuracy,
    VocalizationType, calculate, count_overlaps, generate_round,
};
use birdlane::{GameError, Settings};

fn level(window_ms: u32, overlap: f64) -> LevelConfig {
    LevelConfig {
        level_id: 3,
        pack_id: "woodland".into(),
        mode: GameMode::Campaign,
        round_duration_sec: 30,
        species_count: 4,
        event_density: EventDensity::Medium,
        overlap_probability: overlap,
        scoring_window_ms: window_ms,
        spectrogram_mode: SpectrogramMode::Full,
    }
}

fn species(codes: &[&str]) -> Vec<SpeciesSelection> {
    codes
        .iter()
        .map(|code| SpeciesSelection {
            species_code: code.to_string(),
            common_name: String::new(),
            clips: vec![
                ClipMetadata {
                    clip_id: format!("{code}_song"),
                    species_code: code.to_string(),
                    vocalization_type: VocalizationType::Song,
                    duration_ms: 1800,
                    file_path: String::new(),
                    spectrogram_path: None,
                },
                ClipMetadata {
                    clip_id: format!("{code}_call"),
                    species_code: code.to_string(),
                    vocalization_type: VocalizationType::Call,
                    duration_ms: 700,
                    file_path: String::new(),
                    spectrogram_path: None,
                },
            ],
        })
        .collect()
}

#[test]
fn test_overlap_free_round_with_fixed_windows() {
    let pool = species(&["hawo", "dowo", "rbnu", "bcch"]);
    for seed in [1, 42, 9000, 123_456] {
        let events =
            generate_round(&level(2000, 0.0), None, &pool, &mut SeededRandom::new(seed)).unwrap();
        assert!(!events.is_empty());
        assert_eq!(count_overlaps(&events), 0);
        for event in &events {
            assert_eq!(event.window_width_ms(), 2000);
            assert!(event.scheduled_time_ms >= 0 && event.scheduled_time_ms < 30_000);
        }
        assert!(
            events
                .windows(2)
                .all(|w| w[0].scheduled_time_ms <= w[1].scheduled_time_ms)
        );
    }
}

#[test]
fn test_perfect_answer_scores_full_points() {
    let pool = species(&["hawo", "dowo", "rbnu", "bcch"]);
    let events =
        generate_round(&level(1500, 0.0), None, &pool, &mut SeededRandom::new(5)).unwrap();
    let event = &events[0];

    let mut engine = ScoreEngine::new();
    let input = ScoringInput {
        species_code: Some(event.species_code.clone()),
        channel: event.channel,
        timestamp_ms: event.perfect_time_ms(),
    };
    let result = engine.score_event(event, &input);
    let b = result.breakdown;
    assert_eq!(b.species_points, 50);
    assert_eq!(b.channel_points, 25);
    assert_eq!(b.timing_points, 25);
    assert_eq!(b.total_points, 100);
    assert_eq!(b.timing_accuracy, TimingAccuracy::Perfect);
    assert!(!result.missed);
}

#[test]
fn test_pack_overlap_multiplier_clamps() {
    let pack = Pack {
        overlap_multiplier: 2.0,
        ..Pack::neutral("dense")
    };
    let params = calculate(&level(2000, 0.8), Some(&pack));
    assert_eq!(params.overlap_probability, 1.0);
}

#[test]
fn test_catalog_round_is_reproducible() {
    let json = r#"{
        "levels": [{
            "level_id": 9, "pack_id": "woodland",
            "round_duration_sec": 20, "species_count": 3,
            "event_density": "high", "overlap_probability": 0.5,
            "scoring_window_ms": 1000
        }],
        "packs": [{
            "pack_id": "woodland", "species": ["hawo", "dowo", "rbnu", "bcch"],
            "tempo_multiplier": 1.2, "overlap_multiplier": 1.0
        }]
    }"#;
    let catalog = LevelCatalog::from_json(json).unwrap();
    let (level, pack) = catalog.level_with_pack(9).unwrap();
    let pool = species(&["hawo", "dowo", "rbnu", "bcch", "eabl"]);

    let build = || {
        let chosen = select_species(&pool, pack, 3, &mut SeededRandom::new(77)).unwrap();
        let mut round = RoundManager::new();
        round.setup_round(level, pack, &chosen, Some(77)).unwrap();
        round.events().to_vec()
    };
    let first = build();
    assert_eq!(first, build());
    assert!(first.iter().all(|e| e.species_code != "eabl"));
    assert!(matches!(catalog.level(1), Err(GameError::UnknownLevel(1))));
}

#[test]
fn test_countdown_then_full_round_with_autoplayer() {
    let pool = species(&["hawo", "dowo", "rbnu", "bcch"]);
    let settings = Settings::default();
    let mut round = RoundManager::with_settings(&settings);
    round
        .setup_round(&level(1500, 0.3), None, &pool, Some(2024))
        .unwrap();
    round.start_round(10_000, settings.skip_countdown).unwrap();
    assert_eq!(round.state(), RoundState::Countdown);

    let update = round.advance(11_000);
    assert_eq!(update.countdown_remaining, Some(2));
    assert!(update.due_events.is_empty());

    let mut player = AutoPlayer::new(2024, 0.9, &pool);
    let mut dispatched = 0;
    let mut now: Millis = 11_000;
    let stats = loop {
        now += TICK_MS;
        let update = round.advance(now);
        dispatched += update.due_events.len();
        if let Some(stats) = update.stats {
            break stats;
        }
        for event in &update.due_events {
            let input = player.respond(event);
            let _ = round.submit_input(&input);
        }
    };

    assert_eq!(round.state(), RoundState::Ended);
    assert_eq!(dispatched, round.events().len());
    assert_eq!(stats.total_events as usize, round.events().len());
    assert!(stats.events_scored as usize <= dispatched);
    assert!(stats.total_score <= stats.events_scored as u64 * 100);
    assert!((0.0..=100.0).contains(&stats.accuracy_percent));
    assert_eq!(round.final_stats(), Some(&stats));

    // Ended rounds reject input and dispatch nothing further
    assert!(round.advance(now + 10_000).due_events.is_empty());
}
