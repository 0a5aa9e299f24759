//! Fitness evaluation strategies.
//!
//! Exactly one strategy scores the population each generation:
//!
//! - **Dataset** - every individual runs inference on a fixed labeled dataset and
//!   sums [`label_score`] over the rows.
//! - **Custom** - a caller-supplied [`BatchScorer`] writes every individual's score.
//! - **Challenge** - individuals play pairwise matches through a [`Challenge`]
//!   implementation, paired by [`Pairing`].
//!
//! # Match Protocol
//!
//! Every pairing plays two matches with the move order swapped. With `(s1, s2)` the
//! scores of the first match (A moves first) and `(s3, s4)` of the second (B moves
//! first), A is awarded `(s1 + s4) / 2` and B `(s2 + s3) / 2`. Both individuals
//! count one game. Rewards also accumulate into the cumulative score.
//!
//! # Parallelization
//!
//! Dataset scoring and match playing fan out over scoped worker threads. Each
//! evaluation joins all workers before returning, so selection never sees a
//! partially scored population. Match outcomes are applied in pairing order after
//! the join, which keeps score sums independent of thread scheduling.

use std::{fmt, iter, panic, thread};

use neuroevo_nn::Network;
use rand::{Rng, seq::SliceRandom};

use crate::{config::ConfigError, individual::Individual};

/// Reward of one dataset row.
///
/// Returns `output` for a non-zero target and `1 - output` for a zero target, which
/// rewards confidence toward the labeled class. Near `0.5` the reward does not tell
/// the classes apart.
///
/// # Examples
///
/// ```
/// use neuroevo_training::evaluator::label_score;
///
/// assert_eq!(label_score(0.5, 1.0), 0.5);
/// assert_eq!(label_score(0.25, 0.0), 0.75);
/// ```
#[must_use]
pub fn label_score(output: f64, target: f64) -> f64 {
    if target == 0.0 { 1.0 - output } else { output }
}

/// Input vectors and their target values.
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl Dataset {
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self, ConfigError> {
        if inputs.len() != targets.len() {
            return Err(ConfigError::DatasetLengthMismatch {
                inputs: inputs.len(),
                targets: targets.len(),
            });
        }
        if inputs.is_empty() {
            return Err(ConfigError::EmptyDataset);
        }
        Ok(Self { inputs, targets })
    }

    /// The XOR truth table.
    #[must_use]
    pub fn xor() -> Self {
        Self {
            inputs: vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
            ],
            targets: vec![0.0, 1.0, 1.0, 0.0],
        }
    }

    #[must_use]
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub(crate) fn check_input_width(&self, expected: usize) -> Result<(), ConfigError> {
        match self.inputs.iter().position(|row| row.len() != expected) {
            Some(row) => Err(ConfigError::DatasetInputWidth {
                row,
                actual: self.inputs[row].len(),
                expected,
            }),
            None => Ok(()),
        }
    }

    /// Sums [`label_score`] of the network's first output over all rows.
    pub fn score<N>(&self, network: &N) -> f64
    where
        N: Network + ?Sized,
    {
        iter::zip(&self.inputs, &self.targets)
            .map(|(input, &target)| label_score(network.forward(input)[0], target))
            .sum()
    }
}

/// Scores a whole population at once.
///
/// Implementations must call [`Individual::set_generation_score`] for every
/// individual. Scores left untouched keep their previous value, which the pool
/// cannot detect.
pub trait BatchScorer<N>: Send {
    fn score_batch(&mut self, individuals: &mut [Individual<N>], generation: usize);
}

impl<N, F> BatchScorer<N> for F
where
    F: FnMut(&mut [Individual<N>], usize) + Send,
{
    fn score_batch(&mut self, individuals: &mut [Individual<N>], generation: usize) {
        self(individuals, generation);
    }
}

/// A two-player match between networks.
pub trait Challenge<N>: Send + Sync {
    /// Plays one match with `first` moving first.
    ///
    /// Returns the scores of `first` and `second`, in that order.
    fn play(&self, first: &N, second: &N) -> (f64, f64);
}

impl<N, F> Challenge<N> for F
where
    F: Fn(&N, &N) -> (f64, f64) + Send + Sync,
{
    fn play(&self, first: &N, second: &N) -> (f64, f64) {
        self(first, second)
    }
}

/// Plays both move orders and returns the averaged rewards of `a` and `b`.
pub fn play_pair<N, C>(challenge: &C, a: &N, b: &N) -> (f64, f64)
where
    C: Challenge<N> + ?Sized,
{
    let (s1, s2) = challenge.play(a, b);
    let (s3, s4) = challenge.play(b, a);
    (f64::midpoint(s1, s4), f64::midpoint(s2, s3))
}

/// How individuals are paired in challenge mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Pairing {
    /// Every unordered pair plays once.
    #[default]
    RoundRobin,
    /// Single elimination. The bracket is shuffled each generation, winners are
    /// re-paired in order, an odd survivor gets a bye, and ties go to the first
    /// individual of the pair.
    Bracket,
}

pub(crate) enum Evaluator<N> {
    Dataset(Dataset),
    Custom(Box<dyn BatchScorer<N>>),
    Challenge {
        challenge: Box<dyn Challenge<N>>,
        pairing: Pairing,
    },
}

impl<N> fmt::Debug for Evaluator<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset(dataset) => f.debug_tuple("Dataset").field(&dataset.len()).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").finish_non_exhaustive(),
            Self::Challenge { pairing, .. } => f
                .debug_struct("Challenge")
                .field("pairing", pairing)
                .finish_non_exhaustive(),
        }
    }
}

impl<N> Evaluator<N>
where
    N: Network,
{
    /// Scores every individual. Returns only after all workers have joined.
    pub(crate) fn evaluate<R>(
        &mut self,
        individuals: &mut [Individual<N>],
        generation: usize,
        workers: usize,
        rng: &mut R,
    ) where
        R: Rng + ?Sized,
    {
        match self {
            Self::Dataset(dataset) => evaluate_dataset(dataset, individuals, workers),
            Self::Custom(scorer) => scorer.score_batch(individuals, generation),
            Self::Challenge { challenge, pairing } => {
                for ind in &mut *individuals {
                    ind.reset_generation();
                }
                match pairing {
                    Pairing::RoundRobin => round_robin(&**challenge, individuals, workers),
                    Pairing::Bracket => bracket(&**challenge, individuals, workers, rng),
                }
            }
        }
    }
}

fn evaluate_dataset<N>(dataset: &Dataset, individuals: &mut [Individual<N>], workers: usize)
where
    N: Network,
{
    let chunk_size = individuals.len().div_ceil(workers.max(1)).max(1);
    thread::scope(|s| {
        for chunk in individuals.chunks_mut(chunk_size) {
            s.spawn(move || {
                for ind in chunk {
                    let score = dataset.score(ind.network());
                    ind.set_generation_score(score);
                }
            });
        }
    });
}

/// Plays every pair on the worker threads and returns outcomes in pair order.
fn play_matches<N>(
    challenge: &dyn Challenge<N>,
    individuals: &[Individual<N>],
    pairs: &[(usize, usize)],
    workers: usize,
) -> Vec<(f64, f64)>
where
    N: Network,
{
    if pairs.is_empty() {
        return vec![];
    }
    let chunk_size = pairs.len().div_ceil(workers.max(1));
    thread::scope(|s| {
        let handles = pairs
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|&(a, b)| {
                            play_pair(challenge, individuals[a].network(), individuals[b].network())
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

fn apply_outcomes<N>(
    individuals: &mut [Individual<N>],
    pairs: &[(usize, usize)],
    outcomes: &[(f64, f64)],
) where
    N: Network,
{
    for (&(a, b), &(reward_a, reward_b)) in iter::zip(pairs, outcomes) {
        individuals[a].record_game(reward_a);
        individuals[b].record_game(reward_b);
    }
}

fn round_robin<N>(challenge: &dyn Challenge<N>, individuals: &mut [Individual<N>], workers: usize)
where
    N: Network,
{
    let n = individuals.len();
    let pairs = (0..n)
        .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
        .collect::<Vec<_>>();
    let outcomes = play_matches(challenge, individuals, &pairs, workers);
    apply_outcomes(individuals, &pairs, &outcomes);
}

fn bracket<N, R>(
    challenge: &dyn Challenge<N>,
    individuals: &mut [Individual<N>],
    workers: usize,
    rng: &mut R,
) where
    N: Network,
    R: Rng + ?Sized,
{
    let mut alive = (0..individuals.len()).collect::<Vec<_>>();
    alive.shuffle(rng);

    while alive.len() > 1 {
        let pairs = alive
            .chunks_exact(2)
            .map(|c| (c[0], c[1]))
            .collect::<Vec<_>>();
        let outcomes = play_matches(challenge, individuals, &pairs, workers);
        apply_outcomes(individuals, &pairs, &outcomes);

        let mut next = Vec::with_capacity(alive.len().div_ceil(2));
        // the bye goes first so it is not the odd one out again next round
        if alive.len() % 2 == 1 {
            next.extend(alive.last().copied());
        }
        next.extend(
            iter::zip(&pairs, &outcomes)
                .map(|(&(a, b), &(reward_a, reward_b))| if reward_b > reward_a { b } else { a }),
        );
        alive = next;
    }
}
