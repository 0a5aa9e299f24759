//! The population and its generation loop.
//!
//! # Generation Cycle
//!
//! Every call to [`Pool::run_generation`] performs, in order:
//!
//! 1. **Evaluate** - the configured strategy scores every individual
//! 2. **Select** - the population is sorted best first and a [`SamplingTable`] is
//!    built from the scores; observers are notified
//! 3. **Reproduce** - every slot after the first `elite_count` is overwritten with an
//!    offspring of two table-drawn parents (segment crossover, then mutation)
//! 4. **Reset** - generation scores and game counts go back to zero; with
//!    `elite_diversity`, elite ranks `2..elite_count` are mutated in place
//!
//! Before reproduction every individual keeps its generation score as its
//! [`last_score`](Individual::last_score). Replacing or mutating the weights clears it.
//!
//! Parents are read from a snapshot taken before the reproduction pass, so an
//! offspring never descends from a slot already replaced in the same generation.
//!
//! [`Pool::evolve`] repeats the cycle a fixed number of times, checking the
//! [`StopToken`] between generations, then sorts the population by last score.
//! The surviving elites lead, best first, followed by the offspring of the final
//! generation, which have not been scored.
//!
//! # Example
//!
//! ```
//! use neuroevo_nn::{FeedForwardNet, Topology};
//! use neuroevo_training::{
//!     config::PoolConfig,
//!     evaluator::Dataset,
//!     population::PoolBuilder,
//! };
//!
//! let topology = Topology::new(2, 2, 3, 1)?;
//! let mut pool = PoolBuilder::new(PoolConfig::default())
//!     .seed(42)
//!     .dataset(Dataset::xor())
//!     .build(|rng| FeedForwardNet::random(topology, rng))?;
//!
//! let summary = pool.evolve(10);
//! assert_eq!(summary.generations_run, 10);
//! let best = pool.best();
//! assert_eq!(best.last_score(), summary.best_scores.last().copied());
//! println!("{} => {:?}", best.name(), best.last_score());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use neuroevo_nn::Network;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{
    config::{ConfigError, PoolConfig},
    evaluator::{BatchScorer, Challenge, Dataset, Evaluator, Pairing},
    individual::{self, Individual},
    observer::{GenerationObserver, GenerationReport},
    reproduction::{self, Mutation},
    selection::SamplingTable,
    stats::ScoreStats,
};

/// Cooperative cancellation flag, checked between generations.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the pool to stop before its next generation.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of [`Pool::evolve`].
#[derive(Debug, Clone, Default)]
pub struct EvolutionSummary {
    pub generations_run: usize,
    pub cancelled: bool,
    /// Best generation score of every generation run.
    pub best_scores: Vec<f64>,
}

/// Collects the configuration of a [`Pool`].
///
/// When more than one fitness strategy is set, a custom scorer wins over a
/// dataset, which wins over a challenge.
pub struct PoolBuilder<N> {
    config: PoolConfig,
    rng: Option<Pcg32>,
    dataset: Option<Dataset>,
    custom: Option<Box<dyn BatchScorer<N>>>,
    challenge: Option<(Box<dyn Challenge<N>>, Pairing)>,
    observers: Vec<Box<dyn GenerationObserver<N>>>,
    stop: StopToken,
}

impl<N> PoolBuilder<N>
where
    N: Network,
{
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            rng: None,
            dataset: None,
            custom: None,
            challenge: None,
            observers: vec![],
            stop: StopToken::new(),
        }
    }

    /// Seeds the pool's random source for a reproducible run.
    #[must_use]
    pub fn seed(self, seed: u64) -> Self {
        self.rng(Pcg32::seed_from_u64(seed))
    }

    #[must_use]
    pub fn rng(mut self, rng: Pcg32) -> Self {
        self.rng = Some(rng);
        self
    }

    #[must_use]
    pub fn dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    #[must_use]
    pub fn custom_scorer<S>(mut self, scorer: S) -> Self
    where
        S: BatchScorer<N> + 'static,
    {
        self.custom = Some(Box::new(scorer));
        self
    }

    #[must_use]
    pub fn challenge<C>(mut self, challenge: C, pairing: Pairing) -> Self
    where
        C: Challenge<N> + 'static,
    {
        self.challenge = Some((Box::new(challenge), pairing));
        self
    }

    #[must_use]
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: GenerationObserver<N> + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    #[must_use]
    pub fn stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    /// Validates the configuration and creates the population.
    ///
    /// `init` creates one network per individual; its parameter initialization is
    /// the network's own policy.
    pub fn build<F>(self, mut init: F) -> Result<Pool<N>, ConfigError>
    where
        F: FnMut(&mut Pcg32) -> N,
    {
        let Self {
            config,
            rng,
            dataset,
            custom,
            challenge,
            observers,
            stop,
        } = self;
        config.validate()?;

        let evaluator = if let Some(scorer) = custom {
            Evaluator::Custom(scorer)
        } else if let Some(dataset) = dataset {
            Evaluator::Dataset(dataset)
        } else if let Some((challenge, pairing)) = challenge {
            Evaluator::Challenge { challenge, pairing }
        } else {
            return Err(ConfigError::MissingFitnessStrategy);
        };

        let mut rng = rng.unwrap_or_else(|| Pcg32::from_rng(&mut rand::rng()));
        let individuals = (0..config.size)
            .map(|i| Individual::new(format!("ai-{i:03}"), init(&mut rng)))
            .collect::<Vec<_>>();

        if let Evaluator::Dataset(dataset) = &evaluator {
            let network = individuals[0].network();
            if network.output_len() == 0 {
                return Err(ConfigError::NoNetworkOutput);
            }
            dataset.check_input_width(network.input_len())?;
        }

        Ok(Pool {
            mutation: Mutation::new(config.mutation_rate, config.mutation_strength),
            config,
            individuals,
            evaluator,
            rng,
            observers,
            stop,
            generation: 0,
        })
    }
}

/// A fixed-size population evolved in place.
pub struct Pool<N> {
    config: PoolConfig,
    individuals: Vec<Individual<N>>,
    evaluator: Evaluator<N>,
    mutation: Mutation,
    rng: Pcg32,
    observers: Vec<Box<dyn GenerationObserver<N>>>,
    stop: StopToken,
    generation: usize,
}

impl<N> fmt::Debug for Pool<N>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config)
            .field("individuals", &self.individuals)
            .field("evaluator", &self.evaluator)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<N> Pool<N>
where
    N: Network,
{
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The population, in its current order.
    #[must_use]
    pub fn individuals(&self) -> &[Individual<N>] {
        &self.individuals
    }

    /// The first individual.
    ///
    /// After [`evolve`](Self::evolve) this is the best individual of the last
    /// generation whose weights survived unchanged.
    #[must_use]
    pub fn best(&self) -> &Individual<N> {
        &self.individuals[0]
    }

    /// Number of generations completed so far.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// A handle that stops [`evolve`](Self::evolve) before its next generation.
    #[must_use]
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Runs `generations` full generations, then sorts the population by
    /// [`last_score`](Individual::last_score).
    ///
    /// Stops early only when the [`StopToken`] is triggered.
    pub fn evolve(&mut self, generations: usize) -> EvolutionSummary {
        let mut summary = EvolutionSummary::default();
        for _ in 0..generations {
            if self.stop.is_stopped() {
                summary.cancelled = true;
                break;
            }
            summary.best_scores.push(self.run_generation());
            summary.generations_run += 1;
        }
        individual::sort_by_last_score_desc(&mut self.individuals);
        summary
    }

    /// Runs one evaluate, select, reproduce, reset cycle.
    ///
    /// Returns the best score of the generation.
    pub fn run_generation(&mut self) -> f64 {
        let generation = self.generation;

        self.evaluate();

        individual::sort_by_score_desc(&mut self.individuals);
        let scores = self
            .individuals
            .iter()
            .map(Individual::generation_score)
            .collect::<Vec<_>>();
        let table = SamplingTable::build(&scores);
        let report = GenerationReport {
            generation,
            ranked: &self.individuals,
            stats: ScoreStats::new(scores.iter().copied()),
            uniform_selection: table.is_uniform(),
        };
        for observer in &mut self.observers {
            observer.observe(&report);
        }

        for ind in &mut self.individuals {
            ind.commit_score();
        }
        self.reproduce(&table);

        for ind in &mut self.individuals {
            ind.reset_generation();
        }
        if self.config.elite_diversity {
            self.mutate_elite_band();
        }

        self.generation += 1;
        scores[0]
    }

    fn evaluate(&mut self) {
        let workers = self.config.worker_count();
        self.evaluator.evaluate(
            &mut self.individuals,
            self.generation,
            workers,
            &mut self.rng,
        );
    }

    fn reproduce(&mut self, table: &SamplingTable) {
        let parents = self
            .individuals
            .iter()
            .map(|ind| ind.weights().to_vec())
            .collect::<Vec<_>>();

        for slot in self.config.elite_count..self.individuals.len() {
            let (a, b) = if self.config.self_breeding && self.rng.random_bool(0.5) {
                (slot, table.draw_partner(slot, &mut self.rng))
            } else {
                table.draw_parents(&mut self.rng)
            };
            let mut child =
                reproduction::crossover(&parents[a], &parents[b], self.config.crossover_segments);
            self.mutation.apply(&mut child, &mut self.rng);
            self.individuals[slot].set_weights(&child);
        }
    }

    /// Mutates elite ranks `2..elite_count`; the top two stay frozen.
    fn mutate_elite_band(&mut self) {
        for ind in self.individuals.iter_mut().take(self.config.elite_count).skip(2) {
            let mut genes = ind.weights().to_vec();
            self.mutation.apply(&mut genes, &mut self.rng);
            ind.set_weights(&genes);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        iter,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use neuroevo_nn::{FeedForwardNet, Topology};
    use rand::Rng;

    use super::*;
    use crate::{checkpoint::CheckpointLog, test_util::StubNet};

    fn config(size: usize, elite_count: usize) -> PoolConfig {
        PoolConfig {
            size,
            elite_count,
            mutation_rate: 0.2,
            mutation_strength: 1.0,
            workers: std::num::NonZeroUsize::new(2),
            ..PoolConfig::default()
        }
    }

    fn random_stub(rng: &mut Pcg32) -> StubNet {
        StubNet::new((0..10).map(|_| rng.random_range(0.0..1.0)).collect())
    }

    /// Scores every individual by its first weight.
    fn first_weight_score(individuals: &mut [Individual<StubNet>], _generation: usize) {
        for ind in individuals {
            let score = ind.weights()[0].abs();
            ind.set_generation_score(score);
        }
    }

    fn bits(weights: &[f64]) -> Vec<u64> {
        weights.iter().map(|w| w.to_bits()).collect()
    }

    /// Records the ranked weights every generation.
    fn recorder(
        seen: &Arc<Mutex<Vec<Vec<Vec<f64>>>>>,
    ) -> impl FnMut(&GenerationReport<'_, StubNet>) + Send + 'static {
        let seen = Arc::clone(seen);
        move |report: &GenerationReport<'_, StubNet>| {
            let weights = report
                .ranked
                .iter()
                .map(|ind| ind.weights().to_vec())
                .collect();
            seen.lock().unwrap().push(weights);
        }
    }

    #[test]
    fn test_missing_strategy() {
        let result = PoolBuilder::<StubNet>::new(config(4, 1)).build(random_stub);
        assert!(matches!(result, Err(ConfigError::MissingFitnessStrategy)));
    }

    #[test]
    fn test_invalid_config_is_reported_before_run() {
        let result = PoolBuilder::<StubNet>::new(config(4, 4))
            .custom_scorer(first_weight_score)
            .build(random_stub);
        assert!(matches!(
            result,
            Err(ConfigError::EliteCountTooLarge { .. })
        ));
    }

    #[test]
    fn test_dataset_width_is_checked() {
        let dataset = Dataset::new(vec![vec![0.0, 1.0, 2.0]], vec![1.0]).unwrap();
        let result = PoolBuilder::new(config(4, 1))
            .dataset(dataset)
            .build(random_stub);
        assert!(matches!(
            result,
            Err(ConfigError::DatasetInputWidth { expected: 2, .. })
        ));
    }

    #[test]
    fn test_dataset_needs_network_output() {
        let result = PoolBuilder::new(config(4, 1))
            .dataset(Dataset::xor())
            .build(|rng| random_stub(rng).with_outputs(0));
        assert!(matches!(result, Err(ConfigError::NoNetworkOutput)));
    }

    #[test]
    fn test_custom_scorer_takes_precedence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut pool = PoolBuilder::new(config(4, 1))
            .seed(1)
            .challenge(|_: &StubNet, _: &StubNet| (1.0, 1.0), Pairing::RoundRobin)
            .dataset(Dataset::xor())
            .custom_scorer(move |individuals: &mut [Individual<StubNet>], generation: usize| {
                counter.fetch_add(1, Ordering::Relaxed);
                first_weight_score(individuals, generation);
            })
            .build(random_stub)
            .unwrap();
        pool.run_generation();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(pool.individuals().iter().all(|ind| ind.games_played() == 0));
    }

    #[test]
    fn test_custom_scorer_sees_generation_index() {
        let seen = Arc::new(Mutex::new(vec![]));
        let log = Arc::clone(&seen);
        let mut pool = PoolBuilder::new(config(3, 1))
            .seed(2)
            .custom_scorer(move |individuals: &mut [Individual<StubNet>], generation: usize| {
                log.lock().unwrap().push(generation);
                first_weight_score(individuals, generation);
            })
            .build(random_stub)
            .unwrap();
        let summary = pool.evolve(3);
        assert_eq!(summary.generations_run, 3);
        assert_eq!(pool.generation(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_elites_survive_bit_identical() {
        let seen = Arc::new(Mutex::new(vec![]));
        let mut pool = PoolBuilder::new(config(8, 3))
            .seed(3)
            .custom_scorer(first_weight_score)
            .observer(recorder(&seen))
            .build(random_stub)
            .unwrap();

        for _ in 0..5 {
            pool.run_generation();
            let ranked = seen.lock().unwrap().pop().unwrap();
            for (before, after) in iter::zip(&ranked[..3], &pool.individuals()[..3]) {
                assert_eq!(bits(before), bits(after.weights()));
            }
            let replaced = iter::zip(&ranked[3..], &pool.individuals()[3..])
                .filter(|(before, after)| bits(before) != bits(after.weights()))
                .count();
            assert!(replaced > 0);
        }
    }

    #[test]
    fn test_elite_diversity_band() {
        let seen = Arc::new(Mutex::new(vec![]));
        let mut pool = PoolBuilder::new(PoolConfig {
            elite_diversity: true,
            ..config(8, 4)
        })
        .seed(4)
        .custom_scorer(first_weight_score)
        .observer(recorder(&seen))
        .build(random_stub)
        .unwrap();

        pool.run_generation();
        let ranked = seen.lock().unwrap().pop().unwrap();
        for i in 0..2 {
            assert_eq!(bits(&ranked[i]), bits(pool.individuals()[i].weights()));
        }
        for i in 2..4 {
            let after = pool.individuals()[i].weights();
            assert_eq!(after.len(), ranked[i].len());
            assert_ne!(bits(&ranked[i]), bits(after));
        }
    }

    #[test]
    fn test_scores_reset_after_generation() {
        let mut pool = PoolBuilder::new(config(5, 1))
            .seed(5)
            .challenge(
                |a: &StubNet, b: &StubNet| (a.weights()[0], b.weights()[0]),
                Pairing::RoundRobin,
            )
            .build(random_stub)
            .unwrap();
        pool.run_generation();
        for ind in pool.individuals() {
            assert_eq!(ind.generation_score(), 0.0);
            assert_eq!(ind.games_played(), 0);
        }
        assert!(pool.individuals().iter().any(|ind| ind.cumulative_score() > 0.0));
    }

    #[test]
    fn test_all_zero_scores_still_breed() {
        let mut pool = PoolBuilder::new(config(6, 2))
            .seed(6)
            .custom_scorer(|individuals: &mut [Individual<StubNet>], _: usize| {
                for ind in individuals {
                    ind.set_generation_score(0.0);
                }
            })
            .observer(|report: &GenerationReport<'_, StubNet>| {
                assert!(report.uniform_selection);
            })
            .build(random_stub)
            .unwrap();

        let before = pool
            .individuals()
            .iter()
            .map(|ind| bits(ind.weights()))
            .collect::<Vec<_>>();
        let summary = pool.evolve(5);
        assert_eq!(summary.best_scores, vec![0.0; 5]);
        assert!(pool.individuals().iter().all(|ind| ind.weights().len() == 10));
        let after = pool
            .individuals()
            .iter()
            .map(|ind| bits(ind.weights()))
            .collect::<Vec<_>>();
        assert_ne!(before, after);
    }

    #[test]
    fn test_stop_token_checked_between_generations() {
        let stop = StopToken::new();
        let trigger = stop.clone();
        let mut pool = PoolBuilder::new(config(4, 1))
            .seed(7)
            .custom_scorer(first_weight_score)
            .observer(move |report: &GenerationReport<'_, StubNet>| {
                if report.generation == 2 {
                    trigger.stop();
                }
            })
            .stop_token(stop)
            .build(random_stub)
            .unwrap();

        let summary = pool.evolve(10);
        assert!(summary.cancelled);
        assert_eq!(summary.generations_run, 3);
        assert_eq!(pool.generation(), 3);
        assert_eq!(pool.best().last_score(), summary.best_scores.last().copied());
    }

    #[test]
    fn test_stopped_before_start() {
        let mut pool = PoolBuilder::new(config(4, 1))
            .seed(8)
            .custom_scorer(first_weight_score)
            .build(random_stub)
            .unwrap();
        pool.stop_token().stop();
        let summary = pool.evolve(10);
        assert!(summary.cancelled);
        assert_eq!(summary.generations_run, 0);
        assert!(summary.best_scores.is_empty());
    }

    #[test]
    fn test_self_breeding_keeps_lengths() {
        let mut pool = PoolBuilder::new(PoolConfig {
            self_breeding: true,
            crossover_segments: 3,
            ..config(6, 1)
        })
        .seed(9)
        .custom_scorer(first_weight_score)
        .build(random_stub)
        .unwrap();
        pool.evolve(10);
        assert!(pool.individuals().iter().all(|ind| ind.weights().len() == 10));
    }

    #[test]
    fn test_bracket_challenge_run() {
        let mut pool = PoolBuilder::new(config(7, 2))
            .seed(10)
            .challenge(
                |a: &StubNet, b: &StubNet| {
                    if a.weights()[0] >= b.weights()[0] {
                        (1.0, 0.0)
                    } else {
                        (0.0, 1.0)
                    }
                },
                Pairing::Bracket,
            )
            .build(random_stub)
            .unwrap();
        pool.evolve(4);
        // 6 matches between 7 entrants per generation, one point per match
        let total = pool
            .individuals()
            .iter()
            .map(Individual::cumulative_score)
            .sum::<f64>();
        assert_eq!(total, 24.0);
        assert!(pool.individuals().iter().all(|ind| ind.games_played() == 0));
    }

    #[test]
    fn test_cumulative_score_counts_run_generations_only() {
        let mut pool = PoolBuilder::new(config(3, 1))
            .seed(12)
            .challenge(|_: &StubNet, _: &StubNet| (1.0, 1.0), Pairing::RoundRobin)
            .build(random_stub)
            .unwrap();
        pool.evolve(2);
        // two opponents per generation, one point per match
        for ind in pool.individuals() {
            assert_eq!(ind.cumulative_score(), 4.0);
        }
    }

    #[test]
    fn test_checkpoint_records_every_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.jsonl");
        let mut pool = PoolBuilder::new(config(5, 1))
            .seed(11)
            .custom_scorer(first_weight_score)
            .observer(CheckpointLog::open(&path))
            .build(random_stub)
            .unwrap();
        let summary = pool.evolve(3);

        let records = CheckpointLog::read(&path).unwrap();
        assert_eq!(records.len(), 3);
        for (i, (record, best)) in iter::zip(&records, &summary.best_scores).enumerate() {
            assert_eq!(record.generation, i);
            assert_eq!(record.score, *best);
            assert_eq!(record.weights.len(), 10);
            assert_eq!(record.weights[0].abs(), record.score);
        }
    }

    #[test]
    fn test_xor_best_score_never_drops() {
        let topology = Topology::new(2, 2, 3, 1).unwrap();
        let mut pool = PoolBuilder::new(PoolConfig {
            size: 10,
            elite_count: 2,
            mutation_rate: 0.2,
            mutation_strength: 10.0,
            ..PoolConfig::default()
        })
        .seed(42)
        .dataset(Dataset::xor())
        .build(|rng| FeedForwardNet::random(topology, rng))
        .unwrap();

        let summary = pool.evolve(50);
        assert_eq!(summary.generations_run, 50);
        assert!(!summary.cancelled);
        assert!(summary.best_scores.is_sorted());

        let last_best = *summary.best_scores.last().unwrap();
        assert_eq!(pool.best().last_score(), Some(last_best));
        let scored = pool
            .individuals()
            .iter()
            .map_while(Individual::last_score)
            .collect::<Vec<_>>();
        assert_eq!(scored.len(), 2);
        assert!(scored.is_sorted_by(|a, b| a >= b));
        assert!(scored.iter().all(|score| (0.0..=4.0).contains(score)));
        for ind in pool.individuals() {
            assert_eq!(ind.weights().len(), topology.param_count());
        }
    }
}
