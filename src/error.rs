//! Error taxonomy for the gameplay core
//!
//! Configuration and precondition failures are raised at the call that
//! received the bad input. Out-of-window inputs are not errors; they grade as
//! a `miss`.

/// Result alias carrying [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised by the scheduling and scoring core
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A level descriptor violates one of its invariants
    #[error("level {level_id} is invalid: {reason}")]
    InvalidLevel { level_id: u32, reason: String },

    /// A pack violates one of its invariants
    #[error("pack '{pack_id}' is invalid: {reason}")]
    InvalidPack { pack_id: String, reason: String },

    /// Requested level id is not in the catalog
    #[error("unknown level id {0}")]
    UnknownLevel(u32),

    /// Requested pack id is not in the catalog
    #[error("unknown pack '{0}'")]
    UnknownPack(String),

    /// Not enough species available to fill the requested count
    #[error("level needs {requested} species but only {available} are available")]
    InsufficientSpecies { requested: usize, available: usize },

    /// A species in the pool has no clips to schedule
    #[error("species '{0}' has no clips")]
    NoClips(String),

    /// Computed difficulty failed the structural sanity check
    #[error("difficulty parameters failed validation")]
    InvalidParams,

    /// `start_round` called before `setup_round`
    #[error("round has not been set up")]
    RoundNotSetUp,

    /// Inputs were submitted to a round with no score engine attached
    #[error("no score engine attached to the round")]
    NoScoreEngine,

    /// An input arrived with no dispatched event whose window contains it
    #[error("no event accepts input at {0}ms")]
    NoTargetEvent(i64),

    /// Reading a catalog or state file failed
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog or exported state failed to (de)serialize
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameError {
    /// Shorthand for an [`GameError::InvalidLevel`]
    pub fn invalid_level(level_id: u32, reason: impl Into<String>) -> Self {
        Self::InvalidLevel {
            level_id,
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`GameError::InvalidPack`]
    pub fn invalid_pack(pack_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPack {
            pack_id: pack_id.into(),
            reason: reason.into(),
        }
    }
}
