//! Sources of randomness for rule evaluation.
//!
//! Rules never reach for an ambient RNG. Everything stochastic goes through a
//! [`RandomSource`] handed in by the caller, so a run can be replayed exactly
//! from a seed, or driven draw-by-draw from a script in tests.

use crate::error::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

pub trait RandomSource {
    /// Uniform 50/50 choice.
    fn coin_flip(&mut self) -> bool;

    /// Uniform integer in `low..=high`.
    fn uniform_int(&mut self, low: i64, high: i64) -> i64;

    /// Uniform index in `0..len`. Fails with [`Error::EmptyCandidateSet`]
    /// when `len` is zero.
    fn pick_index(&mut self, len: usize) -> Result<usize>;

    /// Uniform pick from a non-empty candidate slice.
    fn pick_one<T: Copy>(&mut self, candidates: &[T]) -> Result<T> {
        let index = self.pick_index(candidates.len())?;
        Ok(candidates[index])
    }
}

/// Draw up to `k` distinct candidates without replacement.
///
/// The draws come from a private copy of `candidates`; each draw removes the
/// picked element from the copy so remaining indices keep their order.
pub fn draw_distinct<R, T>(rng: &mut R, candidates: &[T], k: usize) -> Result<Vec<T>>
where
    R: RandomSource,
    T: Copy,
{
    let mut pool = candidates.to_vec();
    let draws = k.min(pool.len());
    let mut picked = Vec::with_capacity(draws);
    for _ in 0..draws {
        let index = rng.pick_index(pool.len())?;
        picked.push(pool.remove(index));
    }
    Ok(picked)
}

/// Seeded ChaCha8 source used for real runs.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn coin_flip(&mut self) -> bool {
        self.rng.gen::<bool>()
    }

    fn uniform_int(&mut self, low: i64, high: i64) -> i64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        self.rng.gen_range(low..=high)
    }

    fn pick_index(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(Error::EmptyCandidateSet);
        }
        Ok(self.rng.gen_range(0..len))
    }
}

/// Replays queued outcomes, one queue per capability.
///
/// Once a queue runs dry the source falls back to `false` for coins, `low`
/// for integers and index `0` for picks. Scripted integers are clamped into
/// the requested range and scripted indices into the candidate count.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    coins: VecDeque<bool>,
    ints: VecDeque<i64>,
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coins(mut self, coins: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(coins);
        self
    }

    pub fn with_ints(mut self, ints: impl IntoIterator<Item = i64>) -> Self {
        self.ints.extend(ints);
        self
    }

    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    /// True once every scripted outcome has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.coins.is_empty() && self.ints.is_empty() && self.picks.is_empty()
    }
}

impl RandomSource for ScriptedRandom {
    fn coin_flip(&mut self) -> bool {
        self.coins.pop_front().unwrap_or(false)
    }

    fn uniform_int(&mut self, low: i64, high: i64) -> i64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        self.ints.pop_front().map_or(low, |v| v.clamp(low, high))
    }

    fn pick_index(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(Error::EmptyCandidateSet);
        }
        Ok(self.picks.pop_front().map_or(0, |i| i.min(len - 1)))
    }
}
