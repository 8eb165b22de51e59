//! Birdlane demo driver
//!
//! Plays rounds headlessly with a simulated player and prints the summary.
//! Useful for tuning level catalogs without the audio frontend.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use birdlane::autoplay::AutoPlayer;
use birdlane::config::{LevelCatalog, select_species};
use birdlane::consts::TICK_MS;
use birdlane::modes::{ChallengeMode, RandomMode, daily_seed};
use birdlane::settings::AssistPreset;
use birdlane::sim::rng::entropy_seed;
use birdlane::sim::{
    ClipMetadata, DifficultyRamp, GameEvent, Millis, RoundManager, RoundStats, ScoringInput,
    SeededRandom, SpeciesSelection, VocalizationType, count_overlaps, estimate_event_count,
};
use birdlane::{GameError, Result, Settings};

/// Catalog used when no `--catalog` file is given
const DEMO_CATALOG: &str = r#"{
    "levels": [
        {
            "level_id": 1, "pack_id": "backyard", "mode": "campaign",
            "round_duration_sec": 30, "species_count": 3,
            "event_density": "low", "overlap_probability": 0.0,
            "scoring_window_ms": 2000, "spectrogram_mode": "full"
        },
        {
            "level_id": 2, "pack_id": "backyard", "mode": "campaign",
            "round_duration_sec": 60, "species_count": 5,
            "event_density": "high", "overlap_probability": 0.4,
            "scoring_window_ms": 1200, "spectrogram_mode": "fading"
        }
    ],
    "packs": [
        {
            "pack_id": "backyard", "name": "Backyard",
            "species": ["noca", "carw", "blja", "tuti", "amro", "cach"],
            "tempo_multiplier": 1.0, "overlap_multiplier": 1.0,
            "vocalization_weights": { "song": 0.7, "call": 0.3 }
        }
    ]
}"#;

const DEMO_SPECIES: [(&str, &str); 6] = [
    ("noca", "Northern Cardinal"),
    ("carw", "Carolina Wren"),
    ("blja", "Blue Jay"),
    ("tuti", "Tufted Titmouse"),
    ("amro", "American Robin"),
    ("cach", "Carolina Chickadee"),
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless bird-call round simulator", long_about = None)]
struct Cli {
    /// Level catalog JSON (defaults to a built-in demo catalog)
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Simulated player skill, 0.0 to 1.0
    #[arg(short, long, global = true, default_value_t = 0.8)]
    skill: f64,

    /// Assist preset: relaxed, standard or strict
    #[arg(short, long, global = true, default_value = "standard")]
    preset: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one fixed-length round of a catalog level
    Round {
        #[arg(short, long, default_value_t = 1)]
        level: u32,
        /// Round seed (random if omitted)
        #[arg(long)]
        seed: Option<u32>,
    },
    /// Play the daily challenge for a date
    Challenge {
        #[arg(long)]
        year: u32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        day: u32,
        #[arg(short, long, default_value_t = 1)]
        level: u32,
    },
    /// Play an endless session until the miss budget runs out
    Endless {
        #[arg(long)]
        seed: Option<u32>,
        /// Give up after this many seconds of session time
        #[arg(long, default_value_t = 600)]
        max_secs: u32,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_ref())?;
    let preset = AssistPreset::from_str(&cli.preset).unwrap_or_else(|| {
        log::warn!("Unknown preset '{}', using standard", cli.preset);
        AssistPreset::Standard
    });
    let settings = Settings {
        skip_countdown: true,
        ..Settings::from_preset(preset)
    };
    let pool = demo_species();

    let stats = match cli.command {
        Commands::Round { level, seed } => {
            run_round(&catalog, &pool, &settings, level, seed, cli.skill)?
        }
        Commands::Challenge {
            year,
            month,
            day,
            level,
        } => {
            let seed = daily_seed(year, month, day);
            run_challenge(&catalog, &pool, &settings, level, seed, cli.skill)?
        }
        Commands::Endless { seed, max_secs } => {
            run_endless(&pool, &settings, seed, max_secs, cli.skill)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(target_arch = "wasm32")]
fn init_logging() {}

fn load_catalog(path: Option<&PathBuf>) -> Result<LevelCatalog> {
    match path {
        Some(path) => {
            log::info!("Loading catalog from {}", path.display());
            LevelCatalog::from_json(&std::fs::read_to_string(path)?)
        }
        None => LevelCatalog::from_json(DEMO_CATALOG),
    }
}

/// Two clips (song and call) per demo species
fn demo_species() -> Vec<SpeciesSelection> {
    DEMO_SPECIES
        .iter()
        .map(|(code, name)| SpeciesSelection {
            species_code: code.to_string(),
            common_name: name.to_string(),
            clips: [VocalizationType::Song, VocalizationType::Call]
                .iter()
                .enumerate()
                .map(|(i, &vocalization_type)| ClipMetadata {
                    clip_id: format!("{code}_{i}"),
                    species_code: code.to_string(),
                    vocalization_type,
                    duration_ms: 1200 + 300 * i as u32,
                    file_path: format!("clips/{code}_{i}.ogg"),
                    spectrogram_path: None,
                })
                .collect(),
        })
        .collect()
}

/// Answer each due event the way the simulated player would
fn answer<F>(player: &mut AutoPlayer, events: &[GameEvent], mut submit: F)
where
    F: FnMut(&ScoringInput) -> Result<()>,
{
    for event in events {
        if !player.notices() {
            continue;
        }
        let input = player.respond(event);
        match submit(&input) {
            Ok(()) => {}
            Err(GameError::NoTargetEvent(t)) => log::debug!("Input at {}ms hit nothing", t),
            Err(e) => log::warn!("Input rejected: {}", e),
        }
    }
}

fn run_round(
    catalog: &LevelCatalog,
    pool: &[SpeciesSelection],
    settings: &Settings,
    level_id: u32,
    seed: Option<u32>,
    skill: f64,
) -> Result<RoundStats> {
    let (level, pack) = catalog.level_with_pack(level_id)?;
    let estimate = estimate_event_count(level, pack);
    log::info!(
        "Level {}: expecting {}-{} events",
        level.level_id,
        estimate.min,
        estimate.max
    );

    let seed = seed.unwrap_or_else(entropy_seed);
    let species = select_species(
        pool,
        pack,
        level.species_count as usize,
        &mut SeededRandom::new(seed),
    )?;
    let mut round = RoundManager::with_settings(settings);
    round.setup_round(level, pack, &species, Some(seed))?;
    log::info!("{} overlapping pairs", count_overlaps(round.events()));

    let mut player = AutoPlayer::new(seed as u64, skill, &species);
    round.start_round(0, settings.skip_countdown)?;
    let mut now: Millis = 0;
    loop {
        let update = round.advance(now);
        if let Some(stats) = update.stats {
            return Ok(stats);
        }
        answer(&mut player, &update.due_events, |input| {
            round.submit_input(input).map(|_| ())
        });
        now += TICK_MS;
    }
}

fn run_challenge(
    catalog: &LevelCatalog,
    pool: &[SpeciesSelection],
    settings: &Settings,
    level_id: u32,
    seed: u32,
    skill: f64,
) -> Result<RoundStats> {
    let (level, pack) = catalog.level_with_pack(level_id)?;
    let mut challenge =
        ChallengeMode::new(level.clone(), pack.cloned(), pool.to_vec(), settings.clone());
    challenge.begin(seed, 0)?;

    let mut player = AutoPlayer::new(seed as u64, skill, pool);
    let mut now: Millis = 0;
    loop {
        let update = challenge.advance(now);
        if let Some(stats) = update.stats {
            return Ok(stats);
        }
        answer(&mut player, &update.due_events, |input| {
            challenge.submit_input(input).map(|_| ())
        });
        now += TICK_MS;
    }
}

fn run_endless(
    pool: &[SpeciesSelection],
    settings: &Settings,
    seed: Option<u32>,
    max_secs: u32,
    skill: f64,
) -> Result<RoundStats> {
    let mut random = RandomMode::new(
        pool.to_vec(),
        None,
        DifficultyRamp::default(),
        settings.clone(),
    );
    random.start(0, seed)?;

    let mut player = AutoPlayer::new(random.seed() as u64, skill, pool);
    let limit = max_secs as Millis * 1000;
    let mut now: Millis = 0;
    while now <= limit {
        let update = random.advance(now);
        if let Some(stats) = update.ended {
            return Ok(stats);
        }
        answer(&mut player, &update.new_events, |input| {
            random.submit_input(input).map(|_| ())
        });
        now += TICK_MS;
    }

    log::info!("Time limit reached with {} misses left", random.misses_left());
    // Stop only returns None when no session is running
    random.stop(now).ok_or(GameError::RoundNotSetUp)
}
