//! # Identifiers and Experience Sources
//!
//! Plain identifiers shared between the economy core and whatever stores
//! the records.

use serde::{Deserialize, Serialize};

/// User (account) identifier.
pub type UserId = u64;

/// Pet identifier.
pub type PetId = u64;

/// Feed post identifier.
pub type PostId = u64;

/// Calendar day as days since the Unix epoch.
///
/// Supplied by the caller. The economy core never reads the clock.
pub type DayIndex = u32;

/// Events that grant pet experience.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ExperienceSource {
    /// The owner clicked their main pet.
    PetClick = 0,
    /// Another user liked one of the owner's posts.
    PostLike = 1,
}

impl ExperienceSource {
    /// Experience granted per event before daily caps.
    #[inline]
    #[must_use]
    pub const fn base_experience(self) -> u32 {
        match self {
            Self::PetClick => 5,
            Self::PostLike => 2,
        }
    }

    /// Experience a user can collect from this source per day.
    #[inline]
    #[must_use]
    pub const fn daily_limit(self) -> u32 {
        match self {
            Self::PetClick => 100,
            Self::PostLike => 100,
        }
    }

    /// Per-post daily limit, if this source is post-bound.
    #[inline]
    #[must_use]
    pub const fn per_post_daily_limit(self) -> Option<u32> {
        match self {
            Self::PetClick => None,
            Self::PostLike => Some(20),
        }
    }

    /// Converts from the stored tag.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::PetClick),
            1 => Some(Self::PostLike),
            _ => None,
        }
    }
}
