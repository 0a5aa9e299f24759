//! Evolution parameters and their validation.

use std::num::NonZeroUsize;

/// Configuration error, reported before the first generation runs.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be at least 2, got {_0}")]
    PopulationTooSmall(#[error(not(source))] usize),
    #[display("elite count {elite_count} must be smaller than population size {size}")]
    EliteCountTooLarge { elite_count: usize, size: usize },
    #[display("mutation rate must be in [0, 1], got {_0}")]
    MutationRateOutOfRange(#[error(not(source))] f64),
    #[display("mutation strength must be positive and finite, got {_0}")]
    InvalidMutationStrength(#[error(not(source))] f64),
    #[display("crossover needs at least one segment")]
    NoCrossoverSegments,
    #[display("no fitness strategy configured")]
    MissingFitnessStrategy,
    #[display("dataset has {inputs} inputs but {targets} targets")]
    DatasetLengthMismatch { inputs: usize, targets: usize },
    #[display("dataset is empty")]
    EmptyDataset,
    #[display("dataset scoring needs a network with at least one output")]
    NoNetworkOutput,
    #[display("dataset row {row} has {actual} values, network expects {expected}")]
    DatasetInputWidth {
        row: usize,
        actual: usize,
        expected: usize,
    },
}

/// Parameters of the generation loop.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of individuals, fixed for the whole run
    pub size: usize,
    /// Number of top individuals exempt from replacement each generation
    pub elite_count: usize,
    /// Fraction of an offspring's genes perturbed by mutation
    pub mutation_rate: f64,
    /// Standard deviation of the Gaussian mutation
    pub mutation_strength: f64,
    /// Number of contiguous segments parents exchange during crossover
    pub crossover_segments: usize,
    /// Makes the replaced slot one of the parents half of the time
    pub self_breeding: bool,
    /// Re-mutates elite ranks `2..elite_count` after each generation
    pub elite_diversity: bool,
    /// Fitness evaluation threads (defaults to the available parallelism)
    pub workers: Option<NonZeroUsize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 10,
            elite_count: 2,
            mutation_rate: 0.2,
            mutation_strength: 10.0,
            crossover_segments: 4,
            self_breeding: false,
            elite_diversity: false,
            workers: None,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size < 2 {
            return Err(ConfigError::PopulationTooSmall(self.size));
        }
        if self.elite_count >= self.size {
            return Err(ConfigError::EliteCountTooLarge {
                elite_count: self.elite_count,
                size: self.size,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRateOutOfRange(self.mutation_rate));
        }
        if !self.mutation_strength.is_finite() || self.mutation_strength <= 0.0 {
            return Err(ConfigError::InvalidMutationStrength(
                self.mutation_strength,
            ));
        }
        if self.crossover_segments == 0 {
            return Err(ConfigError::NoCrossoverSegments);
        }
        Ok(())
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }
}
