//! Evolutionary training of fixed-topology neural networks.
//!
//! This crate searches the weight space of a network with a genetic algorithm
//! instead of gradient descent. A population of networks is scored, the fittest are
//! sampled as parents, and their parameter vectors are recombined and mutated to
//! produce the next generation.
//!
//! # How Training Works
//!
//! 1. **Population** - Create a fixed number of individuals, each owning a network
//!    initialized by the network model itself
//! 2. **Evaluation** - Score every individual with one fitness strategy
//! 3. **Selection** - Build a roulette-wheel sampling table from the scores
//! 4. **Reproduction** - Replace every non-elite individual with the offspring of two
//!    sampled parents (segment crossover, then Gaussian mutation)
//! 5. **Reset** - Clear the per-generation scores and repeat
//!
//! # Architecture
//!
//! ```text
//! Pool (population)
//!     ↓ scored by
//! Evaluator (dataset | custom scorer | pairwise challenge)
//!     ↓ produces
//! Generation scores
//!     ↓ weighted by
//! SamplingTable (roulette wheel, elitism)
//!     ↓ draws parents for
//! crossover + Mutation
//!     ↓ overwrite
//! Network weights (neuroevo-nn)
//! ```
//!
//! # Fitness Strategies
//!
//! - **Dataset** - labeled inputs, rewarded by [`evaluator::label_score`]
//! - **Custom** - a caller-supplied [`evaluator::BatchScorer`]
//! - **Challenge** - pairwise matches through [`evaluator::Challenge`], paired
//!   round-robin or as a single-elimination bracket
//!
//! # Observability
//!
//! [`observer::GenerationObserver`]s see every scored generation.
//! [`observer::TracingReporter`] logs the top individuals and
//! [`checkpoint::CheckpointLog`] appends the best parameter vector to a JSON Lines
//! file.
//!
//! # Current Limitations
//!
//! - **Single objective**: one scalar score per individual
//! - **Fixed operator rates**: mutation rate and strength do not adapt
//! - **No speciation**: diversity comes only from mutation and the optional elite
//!   diversity band
//! - **No early stopping**: a run always completes its generation count unless
//!   cancelled through a [`population::StopToken`]

pub mod checkpoint;
pub mod config;
pub mod evaluator;
pub mod individual;
pub mod observer;
pub mod population;
pub mod reproduction;
pub mod selection;
pub mod stats;

#[cfg(test)]
mod test_util;
