//! # QuestPet Shared
//!
//! Balance constants and plain identifiers used by every QuestPet consumer.
//!
//! ## CRITICAL RULE
//!
//! This crate holds numbers, not behavior. Engines that interpret these
//! tables live in `questpet_economy`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod sources;

pub use constants::{
    EXP_REQUIRED, GUARANTEED_UPGRADE_FRAGMENTS, LEVEL_REWARDS, MAX_LEVEL, MIN_LEVEL,
    RARITY_WEIGHTS, SUMMON_COST, UPGRADE_COST_STEP, UPGRADE_SUCCESS_RATES,
};
pub use sources::{DayIndex, ExperienceSource, PetId, PostId, UserId};
