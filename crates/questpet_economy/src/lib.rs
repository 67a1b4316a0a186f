//! # QuestPet Economy
//!
//! Pet progression and gacha-upgrade logic for QuestPet.
//!
//! ## Design Principles
//!
//! 1. **Pure engines** - Rarity, leveling and upgrade math take a random source and return values
//! 2. **Bounded loops** - A grant of any size levels up in at most nine steps
//! 3. **Check, then mutate** - A rejected operation leaves every balance untouched
//! 4. **External configuration** - All balance data in TOML files
//!
//! ## Thread Safety
//!
//! Engines hold no state. The [`Ledger`] serializes all operations on one
//! user, so concurrent likes and upgrade clicks never lose an update.
//!
//! ## Example
//!
//! ```rust,ignore
//! use questpet_economy::{ChaChaSource, EconomyConfig, Ledger};
//!
//! let config = EconomyConfig::from_toml_file("data/economy.toml")?;
//! let ledger = Ledger::new(config, ChaChaSource::from_entropy())?;
//!
//! ledger.register_user(7)?;
//! ledger.credit_powder(7, 300)?;
//! let pet = ledger.summon_pet(7, "Mochi")?;
//! let outcome = ledger.attempt_upgrade(7, pet.id)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod experience;
pub mod journal;
pub mod ledger;
pub mod leveling;
pub mod random;
pub mod rarity;
pub mod raw;
pub mod upgrade;

pub use config::EconomyConfig;
pub use error::{EconomyError, EconomyResult};
pub use experience::{DailyExperience, ExperienceRules, SourceRule};
pub use journal::{Journal, JournalEntry, JournalRecord};
pub use ledger::{
    EconomyEvent, ExperienceGrant, GuaranteedOutcome, Ledger, Pet, UpgradeOutcome, UpgradeQuote,
    Wallet, MAX_PET_NAME_LEN,
};
pub use leveling::{apply_experience, exp_progress, ExperienceState, LevelUpResult, LevelingTable};
pub use random::{ChaChaSource, FixedSource, ScriptedSource, UniformSource};
pub use rarity::{draw_rarity, RarityStatistics, RarityTable, RarityTier};
pub use raw::{fragments_from_raw, powder_from_raw, stars_from_raw};
pub use upgrade::{attempt_upgrade, upgrade_cost, GuaranteedUpgrade, UpgradeAttemptResult, UpgradeTable};

pub use questpet_shared::{DayIndex, ExperienceSource, PetId, PostId, UserId};
