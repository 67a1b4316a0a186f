//! # The Ledger
//!
//! **Nothing changes a wallet or a pet without passing through here.**
//!
//! The engines are pure. The ledger owns the state they read and write:
//!
//! ```text
//! request ──> lock user ──> check preconditions ──> engine call
//!                                                       │
//!                       ┌───────────────────────────────┼──────────────────┐
//!                       ▼                               ▼                  ▼
//!                 Journal entry                  Apply to state       Queue event
//!                 (before apply)                 (wallet + pet)       (for the UI)
//! ```
//!
//! ## Serialization
//!
//! Each user's wallet and pets sit behind one mutex, held for the whole
//! read-check-compute-write cycle. Two likes landing on the same pet, or
//! two upgrade clicks, run one after the other and never lose an update.
//! Different users never contend.
//!
//! ## Failure
//!
//! Every precondition is checked before anything is mutated. A rejected or
//! failed call leaves the wallet, the fragments and the pets untouched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use questpet_shared::{DayIndex, ExperienceSource, PetId, PostId, UserId};

use crate::config::EconomyConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::experience::DailyExperience;
use crate::journal::{Journal, JournalEntry, JournalRecord};
use crate::leveling::{ExperienceState, LevelUpResult};
use crate::random::{ChaChaSource, UniformSource};
use crate::rarity::RarityTier;
use crate::upgrade::UpgradeAttemptResult;

/// Longest accepted pet name in bytes.
pub const MAX_PET_NAME_LEN: usize = 64;

// ============================================================================
// Records
// ============================================================================

/// A user's balances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Powder balance.
    pub powder: u64,
    /// Star fragments from failed upgrades.
    pub star_fragments: u32,
}

/// A collectible pet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Pet identifier.
    pub id: PetId,
    /// Owning user.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// Rarity drawn at summon time.
    pub rarity: RarityTier,
    /// Level in `[1, 10]`.
    pub level: u8,
    /// Experience towards the next level.
    pub experience: u32,
    /// Star tier.
    pub stars: u32,
}

impl Pet {
    /// Experience and level as one value.
    #[inline]
    #[must_use]
    pub const fn experience_state(&self) -> ExperienceState {
        ExperienceState {
            experience: self.experience,
            level: self.level,
        }
    }
}

/// Everything one user owns. Guarded by the user's mutex.
#[derive(Debug, Default)]
struct Account {
    wallet: Wallet,
    pets: BTreeMap<PetId, Pet>,
    daily: DailyExperience,
}

impl Account {
    fn pet(&self, pet_id: PetId) -> EconomyResult<&Pet> {
        self.pets.get(&pet_id).ok_or(EconomyError::PetNotFound(pet_id))
    }

    fn pet_mut(&mut self, pet_id: PetId) -> EconomyResult<&mut Pet> {
        self.pets.get_mut(&pet_id).ok_or(EconomyError::PetNotFound(pet_id))
    }
}

// ============================================================================
// Results and events
// ============================================================================

/// Result of an experience grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExperienceGrant {
    /// Experience actually granted after daily caps. Zero when capped out.
    pub granted: u32,
    /// Leveling outcome.
    pub level_up: LevelUpResult,
    /// Wallet after crediting level rewards.
    pub wallet: Wallet,
}

/// Result of a probabilistic upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpgradeOutcome {
    /// Roll outcome.
    pub attempt: UpgradeAttemptResult,
    /// Powder spent (whatever the outcome).
    pub cost: u64,
    /// Star tier after the attempt.
    pub stars: u32,
    /// Wallet after the attempt.
    pub wallet: Wallet,
}

/// Result of a guaranteed upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuaranteedOutcome {
    /// Star tier after the upgrade.
    pub stars: u32,
    /// Wallet after consuming fragments.
    pub wallet: Wallet,
}

/// What an upgrade from the pet's current tier would take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpgradeQuote {
    /// Current star tier.
    pub stars: u32,
    /// Powder cost of a probabilistic attempt.
    pub cost: u64,
    /// Success chance in percent.
    pub success_rate: u8,
    /// Whether the wallet covers the cost and the tier can roll.
    pub can_attempt: bool,
    /// Whether the fragment balance unlocks the guaranteed path.
    pub can_guarantee: bool,
}

/// Economy event for presentation layers (reveal and upgrade animations).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EconomyEvent {
    /// A pet was summoned.
    PetSummoned {
        /// Owner.
        user_id: UserId,
        /// New pet.
        pet_id: PetId,
        /// Drawn rarity.
        rarity: RarityTier,
    },
    /// A pet crossed one or more levels.
    LevelUp {
        /// Owner.
        user_id: UserId,
        /// Pet.
        pet_id: PetId,
        /// Level reached.
        new_level: u8,
        /// Powder rewarded.
        reward: u64,
    },
    /// A probabilistic upgrade resolved.
    UpgradeResolved {
        /// Owner.
        user_id: UserId,
        /// Pet.
        pet_id: PetId,
        /// Stars after the attempt.
        stars: u32,
        /// Outcome.
        success: bool,
        /// Fragments credited.
        fragments_gained: u32,
    },
    /// Fragments were exchanged for a star.
    GuaranteedUpgrade {
        /// Owner.
        user_id: UserId,
        /// Pet.
        pet_id: PetId,
        /// Stars after the upgrade.
        stars: u32,
    },
    /// Powder was credited from a goal or task.
    PowderCredited {
        /// Recipient.
        user_id: UserId,
        /// Amount.
        amount: u64,
    },
}

// ============================================================================
// The Ledger
// ============================================================================

/// In-process economy ledger.
///
/// ## Thread Safety
///
/// `Ledger` is `Send + Sync` when its random source is `Send`. Lock order:
/// account map (read) -> one account -> random source / journal / events.
pub struct Ledger<R: UniformSource = ChaChaSource> {
    /// Balance tables (immutable).
    config: EconomyConfig,
    /// Accounts by user ID.
    accounts: RwLock<HashMap<UserId, Arc<Mutex<Account>>>>,
    /// Shared random source, locked only for a draw.
    source: Mutex<R>,
    /// Optional durable journal.
    journal: Option<Journal>,
    /// Event buffer for presentation layers.
    events: Mutex<Vec<EconomyEvent>>,
    /// Next pet ID.
    next_pet_id: AtomicU64,
}

impl Ledger<ChaChaSource> {
    /// Creates a ledger with an entropy-seeded ChaCha source.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the config fails validation.
    pub fn with_entropy(config: EconomyConfig) -> EconomyResult<Self> {
        Self::new(config, ChaChaSource::from_entropy())
    }
}

impl<R: UniformSource> Ledger<R> {
    /// Creates an empty ledger without a journal.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the config fails validation.
    pub fn new(config: EconomyConfig, source: R) -> EconomyResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            accounts: RwLock::new(HashMap::new()),
            source: Mutex::new(source),
            journal: None,
            events: Mutex::new(Vec::with_capacity(64)),
            next_pet_id: AtomicU64::new(1),
        })
    }

    /// Rebuilds a ledger from a journal, then keeps journaling to it.
    ///
    /// Wallets, pets and fragments are restored exactly. Daily experience
    /// tallies are not journaled and start empty.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the config fails validation
    /// - `Journal` if the journal cannot be read or does not replay cleanly
    pub fn recover(config: EconomyConfig, source: R, journal: Journal) -> EconomyResult<Self> {
        let mut ledger = Self::new(config, source)?;
        let records = journal.read_all()?;
        ledger.replay(&records)?;
        tracing::info!(
            "Recovered ledger from {} journal entries ({} users)",
            records.len(),
            ledger.accounts.read().len()
        );
        ledger.journal = Some(journal);
        Ok(ledger)
    }

    /// Attaches a journal. Every later operation is written to it first.
    #[must_use]
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Balance tables in use.
    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Registers a user with an empty wallet.
    ///
    /// # Errors
    ///
    /// - `UserExists` if already registered
    /// - `Journal` if the journal write fails
    pub fn register_user(&self, user_id: UserId) -> EconomyResult<()> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&user_id) {
            return Err(EconomyError::UserExists(user_id));
        }
        self.log(&JournalEntry::Register { user_id })?;
        accounts.insert(user_id, Arc::new(Mutex::new(Account::default())));
        tracing::debug!("Registered user {}", user_id);
        Ok(())
    }

    /// Current wallet of a user.
    ///
    /// # Errors
    ///
    /// `UserNotFound` for unknown users.
    pub fn wallet(&self, user_id: UserId) -> EconomyResult<Wallet> {
        Ok(self.account(user_id)?.lock().wallet)
    }

    /// One pet of a user.
    ///
    /// # Errors
    ///
    /// `UserNotFound` or `PetNotFound`.
    pub fn pet(&self, user_id: UserId, pet_id: PetId) -> EconomyResult<Pet> {
        self.account(user_id)?.lock().pet(pet_id).cloned()
    }

    /// All pets of a user, by ID.
    ///
    /// # Errors
    ///
    /// `UserNotFound` for unknown users.
    pub fn pets(&self, user_id: UserId) -> EconomyResult<Vec<Pet>> {
        Ok(self.account(user_id)?.lock().pets.values().cloned().collect())
    }

    /// Level progress of a pet in percent.
    ///
    /// # Errors
    ///
    /// `UserNotFound` or `PetNotFound`.
    pub fn exp_progress(&self, user_id: UserId, pet_id: PetId) -> EconomyResult<f64> {
        let account = self.account(user_id)?;
        let account = account.lock();
        let pet = account.pet(pet_id)?;
        Ok(self.config.leveling.exp_progress(pet.experience, pet.level))
    }

    /// What upgrading a pet would take right now.
    ///
    /// # Errors
    ///
    /// `UserNotFound`, `PetNotFound` or `ArithmeticOverflow`.
    pub fn upgrade_quote(&self, user_id: UserId, pet_id: PetId) -> EconomyResult<UpgradeQuote> {
        let account = self.account(user_id)?;
        let account = account.lock();
        let stars = account.pet(pet_id)?.stars;
        let upgrade = &self.config.upgrade;
        let cost = upgrade.upgrade_cost(stars)?;
        Ok(UpgradeQuote {
            stars,
            cost,
            success_rate: upgrade.success_rate(stars),
            can_attempt: upgrade.has_probabilistic_upgrade(stars) && account.wallet.powder >= cost,
            can_guarantee: upgrade.can_guarantee(account.wallet.star_fragments),
        })
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Credits powder earned outside the pet economy (goals, daily tasks).
    ///
    /// # Errors
    ///
    /// `UserNotFound`, `ArithmeticOverflow` or `Journal`.
    pub fn credit_powder(&self, user_id: UserId, amount: u64) -> EconomyResult<Wallet> {
        let account = self.account(user_id)?;
        let mut account = account.lock();

        let powder = account
            .wallet
            .powder
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        self.log(&JournalEntry::PowderCredit { user_id, amount })?;
        account.wallet.powder = powder;
        self.emit(EconomyEvent::PowderCredited { user_id, amount });
        Ok(account.wallet)
    }

    /// Spends `summon_cost` powder and summons a pet of random rarity.
    ///
    /// The pet starts at level 1 with no experience and no stars.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty or overlong name
    /// - `UserNotFound`, `InsufficientPowder` or `Journal`
    pub fn summon_pet(&self, user_id: UserId, name: &str) -> EconomyResult<Pet> {
        let name = name.trim();
        if name.is_empty() || name.len() > MAX_PET_NAME_LEN {
            return Err(EconomyError::InvalidArgument(format!(
                "pet name must be 1 to {MAX_PET_NAME_LEN} bytes"
            )));
        }

        let account = self.account(user_id)?;
        let mut account = account.lock();

        let cost = self.config.summon_cost;
        if account.wallet.powder < cost {
            tracing::warn!(
                "User {} cannot afford a summon: {} < {}",
                user_id,
                account.wallet.powder,
                cost
            );
            return Err(EconomyError::InsufficientPowder {
                required: cost,
                available: account.wallet.powder,
            });
        }

        let rarity = self.config.rarity.draw(&mut *self.source.lock());
        let pet_id = self.next_pet_id.fetch_add(1, Ordering::Relaxed);

        self.log(&JournalEntry::Summon {
            user_id,
            pet_id,
            name: name.to_string(),
            rarity,
            cost,
        })?;

        let pet = Pet {
            id: pet_id,
            owner: user_id,
            name: name.to_string(),
            rarity,
            level: ExperienceState::NEW_PET.level,
            experience: ExperienceState::NEW_PET.experience,
            stars: 0,
        };
        account.wallet.powder -= cost;
        account.pets.insert(pet_id, pet.clone());

        tracing::info!("User {} summoned {} pet {}", user_id, rarity, pet_id);
        self.emit(EconomyEvent::PetSummoned {
            user_id,
            pet_id,
            rarity,
        });
        Ok(pet)
    }

    /// Grants experience for one event, applying daily caps.
    ///
    /// `post` must be set for post-bound sources (likes) and only for them.
    /// Level rewards are credited to the owner's powder in the same step.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `post` does not match the source
    /// - `UserNotFound`, `PetNotFound`, `ArithmeticOverflow` or `Journal`
    pub fn grant_experience(
        &self,
        user_id: UserId,
        pet_id: PetId,
        source: ExperienceSource,
        day: DayIndex,
        post: Option<PostId>,
    ) -> EconomyResult<ExperienceGrant> {
        let post_bound = self.config.experience.rule(source).per_post_daily_limit.is_some();
        if post_bound != post.is_some() {
            return Err(EconomyError::InvalidArgument(format!(
                "{source:?} {} a post",
                if post_bound { "requires" } else { "does not take" }
            )));
        }

        let account = self.account(user_id)?;
        let mut account = account.lock();
        let state = account.pet(pet_id)?.experience_state();

        let amount = if account.daily.roll_to(day) {
            account.daily.grantable(&self.config.experience, source, post)
        } else {
            tracing::debug!(
                "Ignoring {:?} for user {} on past day {} (tally is on day {})",
                source,
                user_id,
                day,
                account.daily.day()
            );
            0
        };

        if amount == 0 {
            tracing::debug!(
                "Daily {:?} cap reached for user {} on day {}",
                source,
                user_id,
                day
            );
            return Ok(ExperienceGrant {
                granted: 0,
                level_up: self.config.leveling.apply_experience(state.experience, state.level, 0)?,
                wallet: account.wallet,
            });
        }

        let level_up = self
            .config
            .leveling
            .apply_experience(state.experience, state.level, amount)?;
        let powder = account
            .wallet
            .powder
            .checked_add(level_up.total_reward)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        self.log(&JournalEntry::Experience {
            user_id,
            pet_id,
            source,
            amount,
            new_level: level_up.new_level,
            reward: level_up.total_reward,
        })?;

        let pet = account.pet_mut(pet_id)?;
        pet.level = level_up.new_level;
        pet.experience = level_up.remaining_experience;
        account.wallet.powder = powder;
        account.daily.record(source, post, amount);

        tracing::debug!(
            "Pet {} gained {} exp from {:?} (level {}, {} exp)",
            pet_id,
            amount,
            source,
            level_up.new_level,
            level_up.remaining_experience
        );
        if level_up.leveled_up() {
            tracing::info!(
                "Pet {} reached level {} (+{} powder)",
                pet_id,
                level_up.new_level,
                level_up.total_reward
            );
            self.emit(EconomyEvent::LevelUp {
                user_id,
                pet_id,
                new_level: level_up.new_level,
                reward: level_up.total_reward,
            });
        }

        Ok(ExperienceGrant {
            granted: amount,
            level_up,
            wallet: account.wallet,
        })
    }

    /// Pays the upgrade cost and rolls a probabilistic upgrade.
    ///
    /// Powder is spent whatever the outcome. Success adds a star; failure
    /// adds one fragment and leaves the stars alone.
    ///
    /// # Errors
    ///
    /// - `UpgradeUnavailable` at tiers with a 0% rate (nothing is charged)
    /// - `InsufficientPowder` below the cost
    /// - `UserNotFound`, `PetNotFound`, `ArithmeticOverflow` or `Journal`
    pub fn attempt_upgrade(&self, user_id: UserId, pet_id: PetId) -> EconomyResult<UpgradeOutcome> {
        let upgrade = &self.config.upgrade;

        let account = self.account(user_id)?;
        let mut account = account.lock();
        let stars = account.pet(pet_id)?.stars;

        if !upgrade.has_probabilistic_upgrade(stars) {
            tracing::warn!("Pet {} at {} stars has no probabilistic upgrade", pet_id, stars);
            return Err(EconomyError::UpgradeUnavailable { stars });
        }

        let cost = upgrade.upgrade_cost(stars)?;
        if account.wallet.powder < cost {
            tracing::warn!(
                "User {} cannot afford upgrade of pet {}: {} < {}",
                user_id,
                pet_id,
                account.wallet.powder,
                cost
            );
            return Err(EconomyError::InsufficientPowder {
                required: cost,
                available: account.wallet.powder,
            });
        }

        let attempt = upgrade.attempt(stars, &mut *self.source.lock());

        let new_stars = if attempt.success {
            stars.checked_add(1).ok_or(EconomyError::ArithmeticOverflow)?
        } else {
            stars
        };
        let fragments = account
            .wallet
            .star_fragments
            .checked_add(attempt.fragments_gained)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        self.log(&JournalEntry::UpgradeAttempt {
            user_id,
            pet_id,
            current_stars: stars,
            success: attempt.success,
            fragments_gained: attempt.fragments_gained,
            cost,
        })?;

        account.wallet.powder -= cost;
        account.wallet.star_fragments = fragments;
        account.pet_mut(pet_id)?.stars = new_stars;

        tracing::info!(
            "Upgrade of pet {} from {} stars: {} (+{} fragments)",
            pet_id,
            stars,
            if attempt.success { "success" } else { "failure" },
            attempt.fragments_gained
        );
        self.emit(EconomyEvent::UpgradeResolved {
            user_id,
            pet_id,
            stars: new_stars,
            success: attempt.success,
            fragments_gained: attempt.fragments_gained,
        });

        Ok(UpgradeOutcome {
            attempt,
            cost,
            stars: new_stars,
            wallet: account.wallet,
        })
    }

    /// Exchanges exactly `fragment_threshold` fragments for a star.
    ///
    /// # Errors
    ///
    /// - `InsufficientFragments` below the threshold
    /// - `UserNotFound`, `PetNotFound`, `ArithmeticOverflow` or `Journal`
    pub fn guaranteed_upgrade(&self, user_id: UserId, pet_id: PetId) -> EconomyResult<GuaranteedOutcome> {
        let account = self.account(user_id)?;
        let mut account = account.lock();
        let stars = account.pet(pet_id)?.stars;

        let upgrade = self
            .config
            .upgrade
            .guaranteed_upgrade(stars, account.wallet.star_fragments)
            .map_err(|e| {
                tracing::warn!(
                    "User {} lacks fragments for a guaranteed upgrade of pet {}",
                    user_id,
                    pet_id
                );
                e
            })?;

        self.log(&JournalEntry::GuaranteedUpgrade {
            user_id,
            pet_id,
            current_stars: stars,
            fragments_spent: self.config.upgrade.fragment_threshold,
        })?;

        account.wallet.star_fragments = upgrade.remaining_fragments;
        account.pet_mut(pet_id)?.stars = upgrade.new_stars;

        tracing::info!("Guaranteed upgrade of pet {} to {} stars", pet_id, upgrade.new_stars);
        self.emit(EconomyEvent::GuaranteedUpgrade {
            user_id,
            pet_id,
            stars: upgrade.new_stars,
        });

        Ok(GuaranteedOutcome {
            stars: upgrade.new_stars,
            wallet: account.wallet,
        })
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Drains all pending events.
    pub fn drain_events(&self) -> Vec<EconomyEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Pending event count.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.lock().len()
    }

    /// Forces the journal to disk. No-op without a journal.
    ///
    /// # Errors
    ///
    /// `Journal` if the sync fails.
    pub fn flush(&self) -> EconomyResult<()> {
        self.journal.as_ref().map_or(Ok(()), Journal::sync)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn account(&self, user_id: UserId) -> EconomyResult<Arc<Mutex<Account>>> {
        self.accounts
            .read()
            .get(&user_id)
            .cloned()
            .ok_or(EconomyError::UserNotFound(user_id))
    }

    fn log(&self, entry: &JournalEntry) -> EconomyResult<()> {
        if let Some(journal) = &self.journal {
            journal.append(entry)?;
        }
        Ok(())
    }

    fn emit(&self, event: EconomyEvent) {
        self.events.lock().push(event);
    }

    /// Re-applies journaled operations to an empty ledger.
    fn replay(&mut self, records: &[JournalRecord]) -> EconomyResult<()> {
        let accounts = self.accounts.get_mut();
        let mut pet_ids = HashSet::new();
        let mut max_pet_id = 0;

        for record in records {
            let corrupt = |what: &str| {
                EconomyError::Journal(format!("entry {} does not replay: {what}", record.seq))
            };
            let user_id = record.entry.user_id();

            if let JournalEntry::Register { .. } = record.entry {
                if accounts.contains_key(&user_id) {
                    return Err(corrupt("user registered twice"));
                }
                accounts.insert(user_id, Arc::new(Mutex::new(Account::default())));
                continue;
            }

            let mut guard = accounts
                .get(&user_id)
                .ok_or_else(|| corrupt("unknown user"))?
                .lock();
            let account = &mut *guard;

            match &record.entry {
                JournalEntry::Register { .. } => {}
                JournalEntry::PowderCredit { amount, .. } => {
                    account.wallet.powder = account
                        .wallet
                        .powder
                        .checked_add(*amount)
                        .ok_or_else(|| corrupt("powder overflow"))?;
                }
                JournalEntry::Summon { pet_id, name, rarity, cost, .. } => {
                    if *pet_id == 0 || pet_ids.contains(pet_id) {
                        return Err(corrupt("pet summoned twice"));
                    }
                    account.wallet.powder = account
                        .wallet
                        .powder
                        .checked_sub(*cost)
                        .ok_or_else(|| corrupt("summon overdraws powder"))?;
                    account.pets.insert(
                        *pet_id,
                        Pet {
                            id: *pet_id,
                            owner: user_id,
                            name: name.clone(),
                            rarity: *rarity,
                            level: ExperienceState::NEW_PET.level,
                            experience: ExperienceState::NEW_PET.experience,
                            stars: 0,
                        },
                    );
                    pet_ids.insert(*pet_id);
                    max_pet_id = max_pet_id.max(*pet_id);
                }
                JournalEntry::Experience { pet_id, amount, new_level, reward, .. } => {
                    let pet = account.pets.get_mut(pet_id).ok_or_else(|| corrupt("unknown pet"))?;
                    let result = self
                        .config
                        .leveling
                        .apply_experience(pet.experience, pet.level, *amount)
                        .map_err(|e| corrupt(e.to_string().as_str()))?;
                    if result.new_level != *new_level || result.total_reward != *reward {
                        return Err(corrupt("leveling tables changed since the entry was written"));
                    }
                    pet.level = result.new_level;
                    pet.experience = result.remaining_experience;
                    account.wallet.powder = account
                        .wallet
                        .powder
                        .checked_add(result.total_reward)
                        .ok_or_else(|| corrupt("powder overflow"))?;
                }
                JournalEntry::UpgradeAttempt { pet_id, current_stars, success, fragments_gained, cost, .. } => {
                    let pet = account.pets.get_mut(pet_id).ok_or_else(|| corrupt("unknown pet"))?;
                    if pet.stars != *current_stars {
                        return Err(corrupt("star tier mismatch"));
                    }
                    let expected = if *success {
                        UpgradeAttemptResult::SUCCESS
                    } else {
                        UpgradeAttemptResult::FAILURE
                    };
                    if *fragments_gained != expected.fragments_gained {
                        return Err(corrupt("fragments do not match the upgrade outcome"));
                    }
                    account.wallet.powder = account
                        .wallet
                        .powder
                        .checked_sub(*cost)
                        .ok_or_else(|| corrupt("upgrade overdraws powder"))?;
                    account.wallet.star_fragments = account
                        .wallet
                        .star_fragments
                        .checked_add(*fragments_gained)
                        .ok_or_else(|| corrupt("fragment overflow"))?;
                    if *success {
                        pet.stars = pet.stars.checked_add(1).ok_or_else(|| corrupt("star overflow"))?;
                    }
                }
                JournalEntry::GuaranteedUpgrade { pet_id, current_stars, fragments_spent, .. } => {
                    if *fragments_spent != self.config.upgrade.fragment_threshold {
                        return Err(corrupt("fragment threshold changed since the entry was written"));
                    }
                    let pet = account.pets.get_mut(pet_id).ok_or_else(|| corrupt("unknown pet"))?;
                    if pet.stars != *current_stars {
                        return Err(corrupt("star tier mismatch"));
                    }
                    account.wallet.star_fragments = account
                        .wallet
                        .star_fragments
                        .checked_sub(*fragments_spent)
                        .ok_or_else(|| corrupt("guaranteed upgrade overdraws fragments"))?;
                    pet.stars = pet.stars.checked_add(1).ok_or_else(|| corrupt("star overflow"))?;
                }
            }
        }

        *self.next_pet_id.get_mut() = max_pet_id
            .checked_add(1)
            .ok_or_else(|| EconomyError::Journal("pet IDs exhausted".to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedSource, ScriptedSource};

    fn funded(source: FixedSource, powder: u64) -> (Ledger<FixedSource>, PetId) {
        let ledger = Ledger::new(EconomyConfig::default(), source).unwrap();
        ledger.register_user(1).unwrap();
        ledger.credit_powder(1, powder + 100).unwrap();
        let pet = ledger.summon_pet(1, "푸르미").unwrap();
        (ledger, pet.id)
    }

    #[test]
    fn test_summon_spends_powder_and_draws_rarity() {
        let ledger = Ledger::new(EconomyConfig::default(), FixedSource::percent(0.5)).unwrap();
        ledger.register_user(1).unwrap();
        ledger.credit_powder(1, 150).unwrap();

        let pet = ledger.summon_pet(1, "불꽃이").unwrap();
        assert_eq!(pet.rarity, RarityTier::Legendary);
        assert_eq!((pet.level, pet.experience, pet.stars), (1, 0, 0));
        assert_eq!(ledger.wallet(1).unwrap().powder, 50);

        let err = ledger.summon_pet(1, "반짝이").unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientPowder {
                required: 100,
                available: 50
            }
        );
        assert_eq!(ledger.pets(1).unwrap().len(), 1);
    }

    #[test]
    fn test_summon_rejects_bad_names() {
        let (ledger, _) = funded(FixedSource::new(0.5), 1_000);
        assert!(matches!(ledger.summon_pet(1, "   "), Err(EconomyError::InvalidArgument(_))));
        let long = "x".repeat(MAX_PET_NAME_LEN + 1);
        assert!(matches!(ledger.summon_pet(1, &long), Err(EconomyError::InvalidArgument(_))));
    }

    #[test]
    fn test_unknown_user_and_pet() {
        let (ledger, pet) = funded(FixedSource::new(0.5), 0);
        assert_eq!(ledger.wallet(9), Err(EconomyError::UserNotFound(9)));
        assert_eq!(ledger.pet(1, pet + 100), Err(EconomyError::PetNotFound(pet + 100)));
        assert_eq!(ledger.register_user(1), Err(EconomyError::UserExists(1)));
    }

    #[test]
    fn test_click_experience_levels_up_and_pays_reward() {
        let (ledger, pet) = funded(FixedSource::new(0.5), 0);

        // Four clicks: 20 exp, exactly the level 1 threshold.
        let mut last = None;
        for _ in 0..4 {
            last = Some(
                ledger
                    .grant_experience(1, pet, ExperienceSource::PetClick, 19_000, None)
                    .unwrap(),
            );
        }
        let grant = last.unwrap();
        assert_eq!(grant.granted, 5);
        assert_eq!(grant.level_up.new_level, 2);
        assert_eq!(grant.level_up.total_reward, 110);
        assert_eq!(grant.wallet.powder, 110);

        let stored = ledger.pet(1, pet).unwrap();
        assert_eq!((stored.level, stored.experience), (2, 0));
        assert_eq!(ledger.exp_progress(1, pet).unwrap(), 0.0);
    }

    #[test]
    fn test_daily_click_cap() {
        let (ledger, pet) = funded(FixedSource::new(0.5), 0);
        let mut total = 0;
        for _ in 0..30 {
            total += ledger
                .grant_experience(1, pet, ExperienceSource::PetClick, 19_000, None)
                .unwrap()
                .granted;
        }
        assert_eq!(total, 100);

        let next_day = ledger
            .grant_experience(1, pet, ExperienceSource::PetClick, 19_001, None)
            .unwrap();
        assert_eq!(next_day.granted, 5);
    }

    #[test]
    fn test_interleaved_days_keep_the_daily_cap() {
        let (ledger, pet) = funded(FixedSource::new(0.5), 0);
        let mut on_later_day = 0;
        for i in 0..60 {
            let day = if i < 40 && i % 2 == 1 { 99 } else { 100 };
            let grant = ledger
                .grant_experience(1, pet, ExperienceSource::PetClick, day, None)
                .unwrap();
            if day == 100 {
                on_later_day += grant.granted;
            } else {
                assert_eq!(grant.granted, 0);
            }
        }
        assert_eq!(on_later_day, 100);
    }

    #[test]
    fn test_likes_need_a_post() {
        let (ledger, pet) = funded(FixedSource::new(0.5), 0);
        assert!(matches!(
            ledger.grant_experience(1, pet, ExperienceSource::PostLike, 1, None),
            Err(EconomyError::InvalidArgument(_))
        ));
        assert!(matches!(
            ledger.grant_experience(1, pet, ExperienceSource::PetClick, 1, Some(3)),
            Err(EconomyError::InvalidArgument(_))
        ));
        let grant = ledger
            .grant_experience(1, pet, ExperienceSource::PostLike, 1, Some(3))
            .unwrap();
        assert_eq!(grant.granted, 2);
    }

    #[test]
    fn test_failed_upgrade_spends_powder_and_grants_fragment() {
        let (ledger, pet) = funded(FixedSource::percent(95.0), 1_000);

        let outcome = ledger.attempt_upgrade(1, pet).unwrap();
        assert!(!outcome.attempt.success);
        assert_eq!(outcome.cost, 100);
        assert_eq!(outcome.stars, 0);
        assert_eq!(outcome.wallet, Wallet { powder: 900, star_fragments: 1 });
        assert_eq!(ledger.pet(1, pet).unwrap().stars, 0);
    }

    #[test]
    fn test_successful_upgrade_adds_star() {
        let (ledger, pet) = funded(FixedSource::new(0.0), 1_000);

        let first = ledger.attempt_upgrade(1, pet).unwrap();
        assert!(first.attempt.success);
        assert_eq!(first.stars, 1);

        let second = ledger.attempt_upgrade(1, pet).unwrap();
        assert_eq!(second.cost, 200);
        assert_eq!(second.stars, 2);
        assert_eq!(second.wallet, Wallet { powder: 700, star_fragments: 0 });
    }

    #[test]
    fn test_upgrade_rejected_without_powder() {
        let (ledger, pet) = funded(FixedSource::new(0.0), 50);
        let err = ledger.attempt_upgrade(1, pet).unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientPowder {
                required: 100,
                available: 50
            }
        );
        assert_eq!(ledger.wallet(1).unwrap().powder, 50);
        assert_eq!(ledger.pending_event_count(), 2);
    }

    #[test]
    fn test_tier_five_only_upgrades_with_fragments() {
        let (ledger, pet) = funded(FixedSource::new(0.0), 10_000);
        for _ in 0..5 {
            ledger.attempt_upgrade(1, pet).unwrap();
        }
        assert_eq!(ledger.pet(1, pet).unwrap().stars, 5);

        let before = ledger.wallet(1).unwrap();
        assert_eq!(
            ledger.attempt_upgrade(1, pet),
            Err(EconomyError::UpgradeUnavailable { stars: 5 })
        );
        assert_eq!(ledger.wallet(1).unwrap(), before);

        let quote = ledger.upgrade_quote(1, pet).unwrap();
        assert_eq!(quote.success_rate, 0);
        assert_eq!(quote.cost, 600);
        assert!(!quote.can_attempt);
    }

    #[test]
    fn test_guaranteed_upgrade_after_twenty_failures() {
        let (ledger, pet) = funded(FixedSource::percent(99.0), 100 * 20);

        for _ in 0..19 {
            ledger.attempt_upgrade(1, pet).unwrap();
        }
        assert_eq!(
            ledger.guaranteed_upgrade(1, pet),
            Err(EconomyError::InsufficientFragments {
                required: 20,
                available: 19
            })
        );
        assert!(!ledger.upgrade_quote(1, pet).unwrap().can_guarantee);

        ledger.attempt_upgrade(1, pet).unwrap();
        assert!(ledger.upgrade_quote(1, pet).unwrap().can_guarantee);

        let outcome = ledger.guaranteed_upgrade(1, pet).unwrap();
        assert_eq!(outcome.stars, 1);
        assert_eq!(outcome.wallet, Wallet { powder: 0, star_fragments: 0 });
    }

    #[test]
    fn test_events_follow_operations() {
        let ledger = Ledger::new(EconomyConfig::default(), ScriptedSource::new([0.5, 0.0])).unwrap();
        ledger.register_user(4).unwrap();
        ledger.credit_powder(4, 200).unwrap();
        let pet = ledger.summon_pet(4, "구름이").unwrap();
        ledger.attempt_upgrade(4, pet.id).unwrap();

        let events = ledger.drain_events();
        assert_eq!(
            events,
            vec![
                EconomyEvent::PowderCredited { user_id: 4, amount: 200 },
                EconomyEvent::PetSummoned {
                    user_id: 4,
                    pet_id: pet.id,
                    rarity: RarityTier::Common
                },
                EconomyEvent::UpgradeResolved {
                    user_id: 4,
                    pet_id: pet.id,
                    stars: 1,
                    success: true,
                    fragments_gained: 0
                },
            ]
        );
        assert_eq!(ledger.pending_event_count(), 0);
    }

    fn temp_journal_path() -> std::path::PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("test_ledger_{id}.qpj"))
    }

    fn recover_from(entries: &[JournalEntry]) -> EconomyResult<Ledger<FixedSource>> {
        let path = temp_journal_path();
        let journal = Journal::open(&path).unwrap();
        for entry in entries {
            journal.append(entry).unwrap();
        }
        let result = Ledger::recover(EconomyConfig::default(), FixedSource::new(0.5), journal);
        std::fs::remove_file(&path).ok();
        result
    }

    fn summoned(pet_id: PetId) -> [JournalEntry; 3] {
        [
            JournalEntry::Register { user_id: 1 },
            JournalEntry::PowderCredit { user_id: 1, amount: 10_000 },
            JournalEntry::Summon {
                user_id: 1,
                pet_id,
                name: "Nori".to_string(),
                rarity: RarityTier::Rare,
                cost: 100,
            },
        ]
    }

    #[test]
    fn test_replay_rejects_fragments_that_contradict_outcome() {
        let mut entries = summoned(1).to_vec();
        for _ in 0..2 {
            entries.push(JournalEntry::UpgradeAttempt {
                user_id: 1,
                pet_id: 1,
                current_stars: 0,
                success: false,
                fragments_gained: u32::MAX,
                cost: 100,
            });
        }
        assert!(matches!(recover_from(&entries), Err(EconomyError::Journal(_))));

        entries.truncate(3);
        entries.push(JournalEntry::UpgradeAttempt {
            user_id: 1,
            pet_id: 1,
            current_stars: 0,
            success: true,
            fragments_gained: 1,
            cost: 100,
        });
        assert!(matches!(recover_from(&entries), Err(EconomyError::Journal(_))));
    }

    #[test]
    fn test_replay_rejects_duplicate_pet() {
        let mut entries = summoned(3).to_vec();
        entries.push(JournalEntry::Summon {
            user_id: 1,
            pet_id: 3,
            name: "Copy".to_string(),
            rarity: RarityTier::Legendary,
            cost: 100,
        });
        assert!(matches!(recover_from(&entries), Err(EconomyError::Journal(_))));
    }

    #[test]
    fn test_replay_rejects_changed_fragment_threshold() {
        let mut entries = summoned(1).to_vec();
        entries.push(JournalEntry::GuaranteedUpgrade {
            user_id: 1,
            pet_id: 1,
            current_stars: 0,
            fragments_spent: 5,
        });
        assert!(matches!(recover_from(&entries), Err(EconomyError::Journal(_))));
    }

    #[test]
    fn test_replay_of_valid_upgrades() {
        let mut entries = summoned(1).to_vec();
        entries.push(JournalEntry::UpgradeAttempt {
            user_id: 1,
            pet_id: 1,
            current_stars: 0,
            success: false,
            fragments_gained: 1,
            cost: 100,
        });
        entries.push(JournalEntry::UpgradeAttempt {
            user_id: 1,
            pet_id: 1,
            current_stars: 0,
            success: true,
            fragments_gained: 0,
            cost: 100,
        });
        let ledger = recover_from(&entries).unwrap();
        assert_eq!(ledger.pet(1, 1).unwrap().stars, 1);
        assert_eq!(ledger.wallet(1).unwrap(), Wallet { powder: 9_700, star_fragments: 1 });
    }
}
