//! # Economy Configuration
//!
//! Every balance table in one place, loaded once at startup.
//!
//! ```toml
//! summon_cost = 100
//!
//! [rarity]
//! legendary = 1
//! epic = 9
//! rare = 22
//! common = 68
//!
//! [leveling]
//! exp_required = [20, 40, 60, 100, 160, 260, 420, 680, 1100]
//! level_rewards = [100, 110, 130, 160, 200, 250, 310, 380, 460, 550]
//!
//! [upgrade]
//! success_rates = [90, 70, 50, 30, 10]
//! fragment_threshold = 20
//! cost_step = 100
//! ```
//!
//! Sections left out fall back to the built-in defaults. A loaded config
//! is validated before it is returned and never mutated afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use questpet_shared::SUMMON_COST;

use crate::error::{EconomyError, EconomyResult};
use crate::experience::ExperienceRules;
use crate::leveling::LevelingTable;
use crate::rarity::RarityTable;
use crate::upgrade::UpgradeTable;

/// All balance tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Powder spent per summon.
    pub summon_cost: u64,
    /// Summon rarity weights.
    pub rarity: RarityTable,
    /// Experience thresholds and level rewards.
    pub leveling: LevelingTable,
    /// Upgrade odds, cost and pity threshold.
    pub upgrade: UpgradeTable,
    /// Experience per source and daily caps.
    pub experience: ExperienceRules,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            summon_cost: SUMMON_COST,
            rarity: RarityTable::default(),
            leveling: LevelingTable::default(),
            upgrade: UpgradeTable::default(),
            experience: ExperienceRules::default(),
        }
    }
}

impl EconomyConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on a parse failure or a table that fails validation.
    pub fn from_toml_str(source: &str) -> EconomyResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EconomyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read, parsed or validated.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EconomyError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!("Loaded economy config from {}", path.display());
        Ok(config)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if serialization fails.
    pub fn to_toml_string(&self) -> EconomyResult<String> {
        toml::to_string(self).map_err(|e| EconomyError::InvalidConfig(e.to_string()))
    }

    /// Validates every table.
    ///
    /// # Errors
    ///
    /// Returns the first table's `InvalidConfig`.
    pub fn validate(&self) -> EconomyResult<()> {
        self.rarity.validate()?;
        self.leveling.validate()?;
        self.upgrade.validate()?;
        self.experience.validate()?;
        Ok(())
    }
}
