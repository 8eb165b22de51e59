//! Level and pack catalog
//!
//! Loaded once from JSON and read-only afterwards. Lookups for ids that do
//! not exist are hard failures.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::sim::{LevelConfig, Pack, RandomSource, SpeciesSelection};

/// Every level and pack the game knows about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub packs: Vec<Pack>,
}

impl LevelCatalog {
    /// Parse and validate a catalog
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: LevelCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        log::info!(
            "Loaded catalog: {} levels, {} packs",
            catalog.levels.len(),
            catalog.packs.len()
        );
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every level and pack, and that levels reference known packs
    pub fn validate(&self) -> Result<()> {
        for pack in &self.packs {
            pack.validate()?;
        }
        for level in &self.levels {
            level.validate()?;
            if !self.packs.is_empty() && self.pack(&level.pack_id).is_err() {
                return Err(GameError::invalid_level(
                    level.level_id,
                    format!("references unknown pack '{}'", level.pack_id),
                ));
            }
        }
        Ok(())
    }

    pub fn level(&self, level_id: u32) -> Result<&LevelConfig> {
        self.levels
            .iter()
            .find(|l| l.level_id == level_id)
            .ok_or(GameError::UnknownLevel(level_id))
    }

    pub fn pack(&self, pack_id: &str) -> Result<&Pack> {
        self.packs
            .iter()
            .find(|p| p.pack_id == pack_id)
            .ok_or_else(|| GameError::UnknownPack(pack_id.to_string()))
    }

    /// Level plus its pack, if the catalog defines one
    pub fn level_with_pack(&self, level_id: u32) -> Result<(&LevelConfig, Option<&Pack>)> {
        let level = self.level(level_id)?;
        let pack = self.packs.iter().find(|p| p.pack_id == level.pack_id);
        Ok((level, pack))
    }
}

/// Draw `count` distinct species for a round
///
/// Only species with clips that belong to `pack` are eligible. The draw is a
/// partial Fisher-Yates shuffle over the pool order, so the same generator
/// state and pool yield the same selection.
pub fn select_species<R: RandomSource>(
    pool: &[SpeciesSelection],
    pack: Option<&Pack>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<SpeciesSelection>> {
    let mut eligible: Vec<&SpeciesSelection> = pool
        .iter()
        .filter(|s| !s.clips.is_empty())
        .filter(|s| pack.is_none_or(|p| p.includes(&s.species_code)))
        .collect();

    if count == 0 || eligible.len() < count {
        return Err(GameError::InsufficientSpecies {
            requested: count,
            available: eligible.len(),
        });
    }

    for i in 0..count {
        let j = i + rng.index(eligible.len() - i);
        eligible.swap(i, j);
    }
    Ok(eligible.into_iter().take(count).cloned().collect())
}
