//! # Leveling Engine
//!
//! Turns accumulated experience into level-ups and powder rewards.
//!
//! ## Algorithm
//!
//! ```text
//! exp += delta
//! while level < 10 and exp >= required[level]:
//!     exp   -= required[level]
//!     level += 1
//!     reward += reward_for[level]
//! ```
//!
//! One grant can cross several levels. The loop runs at most nine times.
//! At level 10 there is no threshold, so experience keeps accumulating
//! without further effect.

use serde::{Deserialize, Serialize};

use questpet_shared::{EXP_REQUIRED, LEVEL_REWARDS, MAX_LEVEL, MIN_LEVEL};

use crate::error::{EconomyError, EconomyResult};

/// Number of levels that have an experience threshold.
const THRESHOLD_LEVELS: usize = (MAX_LEVEL - MIN_LEVEL) as usize;

/// Experience and level of one pet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperienceState {
    /// Experience collected towards the next level.
    pub experience: u32,
    /// Current level in `[1, 10]`.
    pub level: u8,
}

impl ExperienceState {
    /// State of a freshly summoned pet.
    pub const NEW_PET: Self = Self {
        experience: 0,
        level: MIN_LEVEL,
    };

    /// Builds a state from signed values read out of storage.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for negative experience or a level outside `[1, 10]`.
    pub fn from_raw(experience: i64, level: i64) -> EconomyResult<Self> {
        let experience = u32::try_from(experience).map_err(|_| {
            EconomyError::InvalidArgument(format!("experience must be in [0, {}], got {experience}", u32::MAX))
        })?;
        let level = u8::try_from(level)
            .ok()
            .filter(|l| (MIN_LEVEL..=MAX_LEVEL).contains(l))
            .ok_or_else(|| level_error(level))?;
        Ok(Self { experience, level })
    }
}

impl Default for ExperienceState {
    fn default() -> Self {
        Self::NEW_PET
    }
}

/// Outcome of one experience grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpResult {
    /// Level after all crossings.
    pub new_level: u8,
    /// Experience left over after paying every crossed threshold.
    pub remaining_experience: u32,
    /// Sum of the rewards for every level entered. Zero if none.
    pub total_reward: u64,
    /// Number of levels crossed.
    pub levels_gained: u8,
}

impl LevelUpResult {
    /// The state to persist.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ExperienceState {
        ExperienceState {
            experience: self.remaining_experience,
            level: self.new_level,
        }
    }

    /// True if at least one level was crossed.
    #[inline]
    #[must_use]
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Experience thresholds and level rewards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelingTable {
    /// Experience needed to leave levels 1 through 9.
    pub exp_required: [u32; THRESHOLD_LEVELS],
    /// Powder for entering levels 1 through 10.
    pub level_rewards: [u64; MAX_LEVEL as usize],
}

impl Default for LevelingTable {
    fn default() -> Self {
        Self {
            exp_required: EXP_REQUIRED,
            level_rewards: LEVEL_REWARDS,
        }
    }
}

impl LevelingTable {
    /// Experience needed to leave `level`. Zero at the level cap.
    #[inline]
    #[must_use]
    pub fn exp_required_for_next_level(&self, level: u8) -> u32 {
        if level >= MAX_LEVEL || level < MIN_LEVEL {
            return 0;
        }
        self.exp_required[usize::from(level - MIN_LEVEL)]
    }

    /// Powder for entering `level`. Zero outside `[1, 10]`.
    #[inline]
    #[must_use]
    pub fn reward_for(&self, level: u8) -> u64 {
        if level < MIN_LEVEL || level > MAX_LEVEL {
            return 0;
        }
        self.level_rewards[usize::from(level - MIN_LEVEL)]
    }

    /// Applies an experience grant.
    ///
    /// Pure: the caller persists the returned state and credits
    /// `total_reward` to the owner's powder separately.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `current_level` is outside `[1, 10]`
    /// - `ArithmeticOverflow` if the experience or reward sum overflows
    pub fn apply_experience(
        &self,
        current_experience: u32,
        current_level: u8,
        experience_delta: u32,
    ) -> EconomyResult<LevelUpResult> {
        check_level(current_level)?;

        let mut level = current_level;
        let mut experience = current_experience
            .checked_add(experience_delta)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let mut total_reward = 0u64;
        let mut levels_gained = 0u8;

        // Bounded by the number of threshold levels.
        for _ in 0..THRESHOLD_LEVELS {
            if level >= MAX_LEVEL {
                break;
            }
            let required = self.exp_required_for_next_level(level);
            if experience < required {
                break;
            }
            experience -= required;
            level += 1;
            levels_gained += 1;
            total_reward = total_reward
                .checked_add(self.reward_for(level))
                .ok_or(EconomyError::ArithmeticOverflow)?;
        }

        Ok(LevelUpResult {
            new_level: level,
            remaining_experience: experience,
            total_reward,
            levels_gained,
        })
    }

    /// Progress towards the next level in percent, `[0, 100]`.
    ///
    /// Always 100 at the level cap.
    #[must_use]
    pub fn exp_progress(&self, current_experience: u32, current_level: u8) -> f64 {
        if current_level >= MAX_LEVEL {
            return 100.0;
        }
        let required = self.exp_required_for_next_level(current_level);
        if required == 0 {
            return 100.0;
        }
        (f64::from(current_experience) / f64::from(required) * 100.0).min(100.0)
    }

    /// Checks thresholds strictly increase and rewards never decrease.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violation.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.exp_required.iter().any(|&exp| exp == 0) {
            return Err(EconomyError::InvalidConfig(
                "experience thresholds must be positive".to_string(),
            ));
        }
        if let Some(i) = self.exp_required.windows(2).position(|w| w[0] >= w[1]) {
            return Err(EconomyError::InvalidConfig(format!(
                "experience threshold for level {} must exceed level {}",
                i + 2,
                i + 1
            )));
        }
        if let Some(i) = self.level_rewards.windows(2).position(|w| w[0] > w[1]) {
            return Err(EconomyError::InvalidConfig(format!(
                "reward for level {} must not be below level {}",
                i + 2,
                i + 1
            )));
        }
        Ok(())
    }
}

/// Applies an experience grant with the default table.
///
/// # Errors
///
/// See [`LevelingTable::apply_experience`].
pub fn apply_experience(
    current_experience: u32,
    current_level: u8,
    experience_delta: u32,
) -> EconomyResult<LevelUpResult> {
    LevelingTable::default().apply_experience(current_experience, current_level, experience_delta)
}

/// Progress percentage with the default table.
#[must_use]
pub fn exp_progress(current_experience: u32, current_level: u8) -> f64 {
    LevelingTable::default().exp_progress(current_experience, current_level)
}

fn check_level(level: u8) -> EconomyResult<()> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(level_error(i64::from(level)))
    }
}

fn level_error(level: i64) -> EconomyError {
    EconomyError::InvalidArgument(format!(
        "level must be in [{MIN_LEVEL}, {MAX_LEVEL}], got {level}"
    ))
}
