//! # Experience Rules
//!
//! How much experience each event grants, and the daily caps on it.
//!
//! ```text
//! pet click : 5 exp, at most 100 exp per user per day
//! post like : 2 exp, at most 100 exp per user per day,
//!                    at most  20 exp per post per day
//! ```
//!
//! A grant that would cross a cap is clamped to what is left of the budget.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use questpet_shared::{DayIndex, ExperienceSource, PostId};

use crate::error::{EconomyError, EconomyResult};

/// Amount and caps for one experience source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRule {
    /// Experience per event.
    pub amount: u32,
    /// Experience per user per day.
    pub daily_limit: u32,
    /// Experience per post per day, for post-bound sources.
    #[serde(default)]
    pub per_post_daily_limit: Option<u32>,
}

impl SourceRule {
    /// Rule built from the shared defaults.
    #[must_use]
    pub const fn default_for(source: ExperienceSource) -> Self {
        Self {
            amount: source.base_experience(),
            daily_limit: source.daily_limit(),
            per_post_daily_limit: source.per_post_daily_limit(),
        }
    }
}

/// Rules for every experience source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRules {
    /// Clicking the main pet.
    pub pet_click: SourceRule,
    /// Likes received on a post.
    pub post_like: SourceRule,
}

impl Default for ExperienceRules {
    fn default() -> Self {
        Self {
            pet_click: SourceRule::default_for(ExperienceSource::PetClick),
            post_like: SourceRule::default_for(ExperienceSource::PostLike),
        }
    }
}

impl ExperienceRules {
    /// Rule for a source.
    #[inline]
    #[must_use]
    pub const fn rule(&self, source: ExperienceSource) -> &SourceRule {
        match source {
            ExperienceSource::PetClick => &self.pet_click,
            ExperienceSource::PostLike => &self.post_like,
        }
    }

    /// Experience still grantable for one event.
    ///
    /// `granted_today` is what this source already gave the user today,
    /// `granted_for_post` what the post already earned today.
    #[must_use]
    pub fn grantable(
        &self,
        source: ExperienceSource,
        granted_today: u32,
        granted_for_post: u32,
    ) -> u32 {
        let rule = self.rule(source);
        let mut left = rule.daily_limit.saturating_sub(granted_today);
        if let Some(post_limit) = rule.per_post_daily_limit {
            left = left.min(post_limit.saturating_sub(granted_for_post));
        }
        rule.amount.min(left)
    }

    /// Checks every source grants something and caps allow at least one event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violation.
    pub fn validate(&self) -> EconomyResult<()> {
        for (name, rule) in [("pet_click", &self.pet_click), ("post_like", &self.post_like)] {
            if rule.amount == 0 {
                return Err(EconomyError::InvalidConfig(format!(
                    "{name}: experience amount must be positive"
                )));
            }
            if rule.daily_limit == 0 || rule.per_post_daily_limit == Some(0) {
                return Err(EconomyError::InvalidConfig(format!(
                    "{name}: daily limits must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Experience one user collected on one day.
///
/// The ledger keeps one per user and resets it when the day changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DailyExperience {
    day: DayIndex,
    pet_click: u32,
    post_like: u32,
    per_post: HashMap<PostId, u32>,
}

impl DailyExperience {
    /// Day this tally belongs to.
    #[must_use]
    pub const fn day(&self) -> DayIndex {
        self.day
    }

    /// Moves the tally forward to `day`, clearing it on a new day.
    ///
    /// Returns `false` for a day before the current one; the tally is left
    /// alone and nothing may be granted for that day.
    #[must_use]
    pub fn roll_to(&mut self, day: DayIndex) -> bool {
        if day < self.day {
            return false;
        }
        if day > self.day {
            *self = Self {
                day,
                ..Self::default()
            };
        }
        true
    }

    /// Experience from `source` so far today.
    #[must_use]
    pub const fn granted(&self, source: ExperienceSource) -> u32 {
        match source {
            ExperienceSource::PetClick => self.pet_click,
            ExperienceSource::PostLike => self.post_like,
        }
    }

    /// Experience `post` earned so far today.
    #[must_use]
    pub fn granted_for_post(&self, post: PostId) -> u32 {
        self.per_post.get(&post).copied().unwrap_or(0)
    }

    /// Records a grant.
    pub fn record(&mut self, source: ExperienceSource, post: Option<PostId>, amount: u32) {
        match source {
            ExperienceSource::PetClick => self.pet_click = self.pet_click.saturating_add(amount),
            ExperienceSource::PostLike => self.post_like = self.post_like.saturating_add(amount),
        }
        if let Some(post) = post {
            let entry = self.per_post.entry(post).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Experience grantable for the next event, given `rules`.
    #[must_use]
    pub fn grantable(&self, rules: &ExperienceRules, source: ExperienceSource, post: Option<PostId>) -> u32 {
        let for_post = post.map_or(0, |p| self.granted_for_post(p));
        rules.grantable(source, self.granted(source), for_post)
    }
}
