//! # Balance Constants
//!
//! Default balance for the pet economy.
//!
//! **CRITICAL:** Clients display these numbers (progress bars, upgrade odds,
//! costs). Changing a value here changes what players are promised.

// =============================================================================
// LEVELING
// =============================================================================

/// Level every newly summoned pet starts at.
pub const MIN_LEVEL: u8 = 1;

/// Terminal level. No experience threshold exists past it.
pub const MAX_LEVEL: u8 = 10;

/// Experience needed to leave each level, indexed by `level - 1`.
///
/// Defined for levels 1 through 9. Level 10 is terminal.
pub const EXP_REQUIRED: [u32; 9] = [20, 40, 60, 100, 160, 260, 420, 680, 1100];

/// Powder granted for reaching each level, indexed by `level - 1`.
///
/// The level 1 entry exists for completeness; nobody crosses *into* level 1.
pub const LEVEL_REWARDS: [u64; 10] = [100, 110, 130, 160, 200, 250, 310, 380, 460, 550];

// =============================================================================
// STAR UPGRADES
// =============================================================================

/// Upgrade success chance in percent, indexed by current star tier.
///
/// ```text
/// ★0 -> ★1: 90%
/// ★1 -> ★2: 70%
/// ★2 -> ★3: 50%
/// ★3 -> ★4: 30%
/// ★4 -> ★5: 10%
/// ```
pub const UPGRADE_SUCCESS_RATES: [u8; 5] = [90, 70, 50, 30, 10];

/// Star fragments consumed by one guaranteed upgrade.
pub const GUARANTEED_UPGRADE_FRAGMENTS: u32 = 20;

/// Powder cost per star step: attempting from tier `n` costs `(n + 1) * step`.
pub const UPGRADE_COST_STEP: u64 = 100;

// =============================================================================
// SUMMONING
// =============================================================================

/// Rarity weights in percent: legendary, epic, rare, common.
///
/// Checked in this order against a draw in `[0, 100)`, so the ranges are
/// `[0,1)`, `[1,10)`, `[10,32)` and `[32,100)`.
pub const RARITY_WEIGHTS: [u32; 4] = [1, 9, 22, 68];

/// Powder spent on one pet summon.
pub const SUMMON_COST: u64 = 100;
