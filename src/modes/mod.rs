//! Game modes built on the deterministic core
//!
//! - `challenge`: one seeded round per calendar day
//! - `random`: endless ramping session with a miss budget
//!
//! Both expose `export_state` / `import_state` so an external store can
//! persist high scores and settings.

pub mod challenge;
pub mod random;

pub use challenge::{ChallengeMode, ChallengeProgress, daily_seed};
pub use random::{RandomMode, RandomModeState, RandomUpdate};
