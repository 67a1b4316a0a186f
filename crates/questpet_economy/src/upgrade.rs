//! # Upgrade Engine
//!
//! **Star gacha with a fragment pity fallback.**
//!
//! ## Probabilistic path
//!
//! The caller deducts `upgrade_cost(stars)` powder, then rolls:
//!
//! ```text
//! draw = u * 100            (u in [0, 1))
//! success  <=>  draw < success_rate[stars]
//!
//! success: stars += 1, fragments_gained = 0
//! failure: stars unchanged, fragments_gained = 1
//! ```
//!
//! ## Guaranteed path
//!
//! Once a user holds `fragment_threshold` fragments (20), exactly that many
//! are consumed and the pet gains a star. No roll.
//!
//! ## Tiers past the table
//!
//! The rate table stops at ★4. Any higher tier has a 0% rate: the roll
//! always fails, and progression continues through fragments only.

use serde::{Deserialize, Serialize};

use questpet_shared::{GUARANTEED_UPGRADE_FRAGMENTS, UPGRADE_COST_STEP, UPGRADE_SUCCESS_RATES};

use crate::error::{EconomyError, EconomyResult};
use crate::random::UniformSource;

/// Outcome of one probabilistic attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpgradeAttemptResult {
    /// Whether the pet gains a star.
    pub success: bool,
    /// Fragments to credit. 0 on success, 1 on failure.
    pub fragments_gained: u32,
}

impl UpgradeAttemptResult {
    /// A successful attempt.
    pub const SUCCESS: Self = Self {
        success: true,
        fragments_gained: 0,
    };

    /// A failed attempt.
    pub const FAILURE: Self = Self {
        success: false,
        fragments_gained: 1,
    };
}

/// Outcome of a guaranteed upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteedUpgrade {
    /// Star tier after the upgrade.
    pub new_stars: u32,
    /// Fragments left after consuming the threshold.
    pub remaining_fragments: u32,
}

/// Upgrade odds, cost and pity threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTable {
    /// Success chance in percent, indexed by current star tier.
    pub success_rates: Vec<u8>,
    /// Fragments consumed by a guaranteed upgrade.
    pub fragment_threshold: u32,
    /// Cost per star step in powder.
    pub cost_step: u64,
}

impl Default for UpgradeTable {
    fn default() -> Self {
        Self {
            success_rates: UPGRADE_SUCCESS_RATES.to_vec(),
            fragment_threshold: GUARANTEED_UPGRADE_FRAGMENTS,
            cost_step: UPGRADE_COST_STEP,
        }
    }
}

impl UpgradeTable {
    /// Success chance for `stars` in percent. 0 past the table.
    #[inline]
    #[must_use]
    pub fn success_rate(&self, stars: u32) -> u8 {
        usize::try_from(stars)
            .ok()
            .and_then(|i| self.success_rates.get(i))
            .copied()
            .unwrap_or(0)
    }

    /// True if a probabilistic attempt can ever succeed at this tier.
    #[inline]
    #[must_use]
    pub fn has_probabilistic_upgrade(&self, stars: u32) -> bool {
        self.success_rate(stars) > 0
    }

    /// Powder cost of an attempt from `stars`: `(stars + 1) * cost_step`.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` for absurd tiers.
    pub fn upgrade_cost(&self, stars: u32) -> EconomyResult<u64> {
        (u64::from(stars) + 1)
            .checked_mul(self.cost_step)
            .ok_or(EconomyError::ArithmeticOverflow)
    }

    /// Resolves an attempt against an explicit draw in `[0, 100)`.
    ///
    /// The success boundary is exclusive: `draw < rate`.
    #[inline]
    #[must_use]
    pub fn resolve_roll(&self, stars: u32, draw: f64) -> UpgradeAttemptResult {
        if draw < f64::from(self.success_rate(stars)) {
            UpgradeAttemptResult::SUCCESS
        } else {
            UpgradeAttemptResult::FAILURE
        }
    }

    /// Rolls one probabilistic attempt.
    ///
    /// Does not touch powder: the caller has already paid
    /// `upgrade_cost(stars)`, and that payment stands whatever the outcome.
    pub fn attempt<S: UniformSource>(&self, stars: u32, source: &mut S) -> UpgradeAttemptResult {
        self.resolve_roll(stars, source.next_uniform() * 100.0)
    }

    /// True if `fragments` unlocks the guaranteed path.
    #[inline]
    #[must_use]
    pub const fn can_guarantee(&self, fragments: u32) -> bool {
        fragments >= self.fragment_threshold
    }

    /// Performs a guaranteed upgrade.
    ///
    /// # Errors
    ///
    /// - `InsufficientFragments` below the threshold
    /// - `ArithmeticOverflow` if the tier cannot grow
    pub fn guaranteed_upgrade(&self, stars: u32, fragments: u32) -> EconomyResult<GuaranteedUpgrade> {
        if !self.can_guarantee(fragments) {
            return Err(EconomyError::InsufficientFragments {
                required: self.fragment_threshold,
                available: fragments,
            });
        }
        let new_stars = stars.checked_add(1).ok_or(EconomyError::ArithmeticOverflow)?;
        Ok(GuaranteedUpgrade {
            new_stars,
            remaining_fragments: fragments - self.fragment_threshold,
        })
    }

    /// Checks rates are percentages that strictly fall with tier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violation.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.success_rates.is_empty() {
            return Err(EconomyError::InvalidConfig(
                "at least one upgrade success rate is required".to_string(),
            ));
        }
        if let Some(rate) = self.success_rates.iter().find(|&&r| r > 100) {
            return Err(EconomyError::InvalidConfig(format!(
                "upgrade success rate {rate} exceeds 100%"
            )));
        }
        if let Some(i) = self.success_rates.windows(2).position(|w| w[0] <= w[1]) {
            return Err(EconomyError::InvalidConfig(format!(
                "upgrade success rate does not fall from tier {i} to tier {}",
                i + 1
            )));
        }
        if self.fragment_threshold == 0 {
            return Err(EconomyError::InvalidConfig(
                "fragment threshold must be positive".to_string(),
            ));
        }
        if self.cost_step == 0 {
            return Err(EconomyError::InvalidConfig(
                "upgrade cost step must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rolls one attempt with the default table.
pub fn attempt_upgrade<S: UniformSource>(current_stars: u32, source: &mut S) -> UpgradeAttemptResult {
    UpgradeTable::default().attempt(current_stars, source)
}

/// Cost of an attempt with the default table.
///
/// # Errors
///
/// `ArithmeticOverflow` for absurd tiers.
pub fn upgrade_cost(current_stars: u32) -> EconomyResult<u64> {
    UpgradeTable::default().upgrade_cost(current_stars)
}
