//! # Rarity Generator
//!
//! **Weighted draw for pet summons.**
//!
//! A summon draws one real in `[0, total_weight)` and walks the tiers from
//! the scarcest up. With the default weights the draw is in `[0, 100)`:
//!
//! ```text
//! [0, 1)    -> legendary   1%
//! [1, 10)   -> epic        9%
//! [10, 32)  -> rare       22%
//! [32, 100) -> common     68%
//! ```
//!
//! The walk is over four entries, so every draw is O(1).

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use questpet_shared::RARITY_WEIGHTS;

use crate::error::{EconomyError, EconomyResult};
use crate::random::UniformSource;

/// Rarity tier of a pet. Fixed at summon time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RarityTier {
    /// Common pets - 68% of summons.
    Common = 0,
    /// Rare pets - 22% of summons.
    Rare = 1,
    /// Epic pets - 9% of summons.
    Epic = 2,
    /// Legendary pets - 1% of summons.
    Legendary = 3,
}

impl RarityTier {
    /// All tiers, scarcest first (the order the draw checks them in).
    pub const SCARCEST_FIRST: [Self; 4] = [Self::Legendary, Self::Epic, Self::Rare, Self::Common];

    /// Converts from the stored tag.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Common),
            1 => Some(Self::Rare),
            2 => Some(Self::Epic),
            3 => Some(Self::Legendary),
            _ => None,
        }
    }

    /// Lowercase name, as stored by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summon weights per tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityTable {
    /// Weight of legendary.
    pub legendary: u32,
    /// Weight of epic.
    pub epic: u32,
    /// Weight of rare.
    pub rare: u32,
    /// Weight of common.
    pub common: u32,
}

impl Default for RarityTable {
    fn default() -> Self {
        let [legendary, epic, rare, common] = RARITY_WEIGHTS;
        Self {
            legendary,
            epic,
            rare,
            common,
        }
    }
}

impl RarityTable {
    /// Weight of a single tier.
    #[inline]
    #[must_use]
    pub const fn weight(&self, tier: RarityTier) -> u32 {
        match tier {
            RarityTier::Common => self.common,
            RarityTier::Rare => self.rare,
            RarityTier::Epic => self.epic,
            RarityTier::Legendary => self.legendary,
        }
    }

    /// Sum of all weights.
    #[inline]
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        RarityTier::SCARCEST_FIRST
            .iter()
            .map(|&tier| u64::from(self.weight(tier)))
            .sum()
    }

    /// Probability of a tier in `[0, 1]`.
    #[must_use]
    pub fn probability(&self, tier: RarityTier) -> f64 {
        let total = self.total_weight();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.weight(tier)) / total as f64
    }

    /// Half-open draw ranges per tier, scarcest first.
    #[must_use]
    pub fn bounds(&self) -> [(RarityTier, Range<u64>); 4] {
        let mut start = 0u64;
        RarityTier::SCARCEST_FIRST.map(|tier| {
            let end = start + u64::from(self.weight(tier));
            let range = start..end;
            start = end;
            (tier, range)
        })
    }

    /// Checks the table is drawable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any weight is zero.
    pub fn validate(&self) -> EconomyResult<()> {
        for tier in RarityTier::SCARCEST_FIRST {
            if self.weight(tier) == 0 {
                return Err(EconomyError::InvalidConfig(format!(
                    "rarity weight for {tier} must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Draws a tier.
    pub fn draw<S: UniformSource>(&self, source: &mut S) -> RarityTier {
        let roll = source.next_uniform() * self.total_weight() as f64;
        self.tier_for_roll(roll)
    }

    /// Maps an explicit draw in `[0, total_weight)` to a tier.
    ///
    /// Rolls past the last bound land on common, the catch-all tier.
    #[must_use]
    pub fn tier_for_roll(&self, roll: f64) -> RarityTier {
        let mut upper = 0.0;
        for tier in RarityTier::SCARCEST_FIRST {
            upper += f64::from(self.weight(tier));
            if roll < upper {
                return tier;
            }
        }
        RarityTier::Common
    }

    /// Runs `iterations` draws and tallies the outcome.
    pub fn run_statistics<S: UniformSource>(&self, source: &mut S, iterations: u32) -> RarityStatistics {
        let mut stats = RarityStatistics::default();
        for _ in 0..iterations {
            stats.record(self.draw(source));
        }
        stats
    }
}

/// Draws a tier from the default table.
pub fn draw_rarity<S: UniformSource>(source: &mut S) -> RarityTier {
    RarityTable::default().draw(source)
}

/// Tallies from a batch of summons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RarityStatistics {
    /// Total number of draws.
    pub total: u64,
    /// Counts indexed by `RarityTier as usize`.
    pub counts: [u64; 4],
}

impl RarityStatistics {
    /// Records one draw.
    pub fn record(&mut self, tier: RarityTier) {
        self.total += 1;
        self.counts[tier as usize] += 1;
    }

    /// Count for one tier.
    #[must_use]
    pub const fn count(&self, tier: RarityTier) -> u64 {
        self.counts[tier as usize]
    }

    /// Observed frequency of a tier in percent.
    #[must_use]
    pub fn percent(&self, tier: RarityTier) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.count(tier) as f64 / self.total as f64) * 100.0
        }
    }
}
