//! # Random Sources
//!
//! Every probabilistic engine takes its randomness through [`UniformSource`].
//! Production code plugs in [`ChaChaSource`]; tests plug in [`FixedSource`]
//! or [`ScriptedSource`] to force a branch.
//!
//! ## Contract
//!
//! `next_uniform()` returns a value in `[0, 1)`. Engines scale it themselves
//! (`u * 100` for percent draws).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Largest `f64` strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// A single-method source of uniform reals in `[0, 1)`.
pub trait UniformSource {
    /// Returns the next value in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

impl<S: UniformSource + ?Sized> UniformSource for Box<S> {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

/// Production source backed by ChaCha20.
///
/// Seeded from OS entropy for live use, or from a `u64` for replays and
/// simulations.
#[derive(Clone, Debug)]
pub struct ChaChaSource {
    rng: ChaCha20Rng,
}

impl ChaChaSource {
    /// Creates a source seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Creates a deterministic source. Same seed, same sequence.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl UniformSource for ChaChaSource {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        // Standard f64 sampling is already half-open [0, 1).
        self.rng.gen::<f64>()
    }
}

/// Always returns the same value. For forcing a branch in tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSource(f64);

impl FixedSource {
    /// Creates a fixed source. The value is clamped into `[0, 1)`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(clamp_unit(value))
    }

    /// Creates a source whose percent draw (`u * 100`) equals `percent`.
    #[must_use]
    pub fn percent(percent: f64) -> Self {
        Self::new(percent / 100.0)
    }
}

impl UniformSource for FixedSource {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.0
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Creates a scripted source. Values are clamped into `[0, 1)`.
    ///
    /// An empty script behaves like `FixedSource::new(0.0)`.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().map(clamp_unit).collect(),
            cursor: 0,
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.cursor
    }
}

impl UniformSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, BELOW_ONE)
    }
}
