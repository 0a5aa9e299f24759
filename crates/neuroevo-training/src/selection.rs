//! Roulette-wheel parent selection.
//!
//! Each generation the sorted scores are turned into a [`SamplingTable`] of
//! [`SAMPLING_SLOTS`] slots. Every individual receives `floor(share * 100)`
//! consecutive slots, where `share` is its fraction of the total score, and the fill
//! cursor carries over from one individual to the next. Drawing a uniformly random
//! filled slot then picks individuals with probability proportional to fitness.
//!
//! # Truncation
//!
//! Fractional shares are truncated. Individuals holding less than 1% of the total
//! score get no slot at all and cannot become parents in that generation; this is
//! part of the selection pressure. Slots left unfilled by truncation are never
//! drawn.
//!
//! # Degenerate Scores
//!
//! When the total score is zero, negative, or not finite (or truncation leaves the
//! table empty), the table stays empty and draws fall back to a uniform choice over
//! the whole population.

use arrayvec::ArrayVec;
use rand::Rng;

/// Capacity of the sampling table.
pub const SAMPLING_SLOTS: usize = 100;

const SLOT_SCALE: f64 = 100.0;

/// Fitness-weighted table mapping slots to population indices.
#[derive(Debug, Clone)]
pub struct SamplingTable {
    slots: ArrayVec<usize, SAMPLING_SLOTS>,
    population: usize,
}

impl SamplingTable {
    /// Builds the table from scores sorted in descending order.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 2 scores are given.
    #[must_use]
    pub fn build(sorted_scores: &[f64]) -> Self {
        assert!(sorted_scores.len() >= 2, "selection needs two individuals");
        debug_assert!(sorted_scores.is_sorted_by(|a, b| a.total_cmp(b).is_ge()));

        let mut slots = ArrayVec::new();
        let total = sorted_scores.iter().sum::<f64>();
        if total.is_finite() && total > 0.0 {
            'fill: for (index, score) in sorted_scores.iter().enumerate() {
                let share = score / total * SLOT_SCALE;
                if share < 1.0 {
                    continue;
                }
                #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let count = share as usize;
                for _ in 0..count {
                    if slots.try_push(index).is_err() {
                        break 'fill;
                    }
                }
            }
        }
        if slots.is_empty() {
            tracing::debug!(total, "degenerate scores, sampling uniformly");
        }

        Self {
            slots,
            population: sorted_scores.len(),
        }
    }

    /// Filled slots, in fill order.
    #[must_use]
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Whether draws ignore fitness and pick uniformly over the population.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        self.slots.is_empty()
    }

    /// Draws one population index.
    pub fn draw<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        if self.slots.is_empty() {
            rng.random_range(0..self.population)
        } else {
            self.slots[rng.random_range(0..self.slots.len())]
        }
    }

    /// Draws a partner for `first` from the table.
    ///
    /// If the draw collides with `first`, the partner is redrawn uniformly over the
    /// rest of the population, so the two parents are always distinct.
    pub fn draw_partner<R>(&self, first: usize, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let second = self.draw(rng);
        if second != first {
            return second;
        }
        let other = rng.random_range(0..self.population - 1);
        if other >= first { other + 1 } else { other }
    }

    /// Draws two distinct parents.
    pub fn draw_parents<R>(&self, rng: &mut R) -> (usize, usize)
    where
        R: Rng + ?Sized,
    {
        let first = self.draw(rng);
        (first, self.draw_partner(first, rng))
    }
}
