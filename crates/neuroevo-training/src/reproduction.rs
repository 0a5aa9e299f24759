//! Crossover and mutation over flat parameter vectors.
//!
//! # Segment Crossover
//!
//! Both parents are cut at the same `segments - 1` positions `k * len / segments`,
//! and the offspring takes its segments alternately from parent A and parent B,
//! starting with A. Empty segments (coinciding cut points on short vectors) are
//! skipped and do not count toward the alternation.
//!
//! The operator is positional: neighbouring genes tend to be inherited together.
//! Network models lay out their parameters layer by layer, so a segment usually
//! carries a coherent part of one layer.
//!
//! # Mutation
//!
//! Exactly `max(1, round(rate * len))` distinct genes are moved by `±N(0, strength)`.
//! Resulting values are not clamped; the search space is unbounded.

use rand::{Rng, seq::index};
use rand_distr::Normal;

/// Builds an offspring from contiguous segments of two parents.
///
/// # Panics
///
/// Panics if the parents have different lengths or `segments` is zero.
///
/// # Examples
///
/// ```
/// use neuroevo_training::reproduction::crossover;
///
/// let a = [0.0; 8];
/// let b = [1.0; 8];
/// let child = crossover(&a, &b, 4);
/// assert_eq!(child, [0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
/// ```
#[must_use]
pub fn crossover(parent_a: &[f64], parent_b: &[f64], segments: usize) -> Vec<f64> {
    assert_eq!(parent_a.len(), parent_b.len());
    assert!(segments > 0, "crossover needs at least one segment");

    let len = parent_a.len();
    let mut child = Vec::with_capacity(len);
    let mut start = 0;
    let mut from_a = true;
    for k in 1..=segments {
        let end = k * len / segments;
        if end == start {
            continue;
        }
        let parent = if from_a { parent_a } else { parent_b };
        child.extend_from_slice(&parent[start..end]);
        start = end;
        from_a = !from_a;
    }
    debug_assert_eq!(child.len(), len);
    child
}

/// Gaussian point mutation with a fixed number of perturbed genes.
#[derive(Debug, Clone, Copy)]
pub struct Mutation {
    rate: f64,
    normal: Normal<f64>,
}

impl Mutation {
    /// Creates a mutation operator.
    ///
    /// # Panics
    ///
    /// Panics if `strength` is not a finite, non-negative number. Pool
    /// configuration is validated before this is reached.
    #[must_use]
    pub fn new(rate: f64, strength: f64) -> Self {
        Self {
            rate,
            normal: Normal::new(0.0, strength).unwrap(),
        }
    }

    /// Number of genes a vector of `len` genes gets perturbed.
    ///
    /// # Examples
    ///
    /// ```
    /// use neuroevo_training::reproduction::Mutation;
    ///
    /// let mutation = Mutation::new(0.2, 1.0);
    /// assert_eq!(mutation.genes_to_mutate(10), 2);
    /// assert_eq!(mutation.genes_to_mutate(2), 1);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn genes_to_mutate(&self, len: usize) -> usize {
        let count = (self.rate * len as f64).round() as usize;
        count.clamp(1, len.max(1))
    }

    /// Perturbs genes in place and returns the mutated indices.
    pub fn apply<R>(&self, genes: &mut [f64], rng: &mut R) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        if genes.is_empty() {
            return vec![];
        }
        let indices =
            index::sample(rng, genes.len(), self.genes_to_mutate(genes.len())).into_vec();
        for &i in &indices {
            let delta = rng.sample(self.normal);
            if rng.random_bool(0.5) {
                genes[i] += delta;
            } else {
                genes[i] -= delta;
            }
        }
        indices
    }
}
