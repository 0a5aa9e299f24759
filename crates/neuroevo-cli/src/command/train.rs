use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use neuroevo_nn::{FeedForwardNet, Network as _, Topology};
use neuroevo_training::{
    checkpoint::CheckpointLog, config::PoolConfig, observer::TracingReporter,
    population::PoolBuilder,
};

use crate::{
    schema::trained_model::TrainedModel,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of individuals in the population
    #[arg(long, default_value_t = 10)]
    population: usize,
    /// Number of top individuals kept unchanged every generation
    #[arg(long, default_value_t = 2)]
    elite: usize,
    #[arg(long, default_value_t = 100)]
    generations: usize,
    /// Fraction of genes perturbed in each offspring
    #[arg(long, default_value_t = 0.2)]
    mutation_rate: f64,
    /// Standard deviation of the mutation noise
    #[arg(long, default_value_t = 10.0)]
    mutation_strength: f64,
    #[arg(long, default_value_t = 4)]
    crossover_segments: usize,
    /// Let the replaced individual take part in breeding its successor
    #[arg(long)]
    self_breeding: bool,
    /// Re-mutate elites below the top two after each generation
    #[arg(long)]
    elite_diversity: bool,
    /// Neurons per hidden layer
    #[arg(long, default_value_t = 3)]
    hidden: usize,
    /// Number of layers, counting the input and output layers
    #[arg(long, default_value_t = 3)]
    layers: usize,
    /// Fitness evaluation threads
    #[arg(long)]
    workers: Option<NonZeroUsize>,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// Labeled dataset JSON file (XOR truth table when omitted)
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Append the best individual of each generation to this JSON Lines file
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of top individuals logged each generation
    #[arg(long, default_value_t = 5)]
    report_top: usize,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(arg.dataset.as_deref())?;
    let input_len = dataset.inputs().first().map_or(0, Vec::len);
    let topology = Topology::new(input_len, arg.hidden, arg.layers, 1)
        .context("Invalid network topology")?;

    let config = PoolConfig {
        size: arg.population,
        elite_count: arg.elite,
        mutation_rate: arg.mutation_rate,
        mutation_strength: arg.mutation_strength,
        crossover_segments: arg.crossover_segments,
        self_breeding: arg.self_breeding,
        elite_diversity: arg.elite_diversity,
        workers: arg.workers,
    };

    let mut builder = PoolBuilder::<FeedForwardNet>::new(config)
        .dataset(dataset.clone())
        .observer(TracingReporter::new(arg.report_top));
    if let Some(seed) = arg.seed {
        builder = builder.seed(seed);
    }
    if let Some(path) = &arg.checkpoint {
        builder = builder.observer(CheckpointLog::open(path));
    }
    let mut pool = builder
        .build(|rng| FeedForwardNet::random(topology, rng))
        .context("Invalid training configuration")?;

    tracing::info!(
        population = arg.population,
        generations = arg.generations,
        samples = dataset.len(),
        params = topology.param_count(),
        "training started"
    );
    let summary = pool.evolve(arg.generations);

    eprintln!("Best Individuals:");
    for (i, ind) in pool.individuals().iter().take(arg.report_top).enumerate() {
        match ind.last_score() {
            Some(score) => eprintln!("  {i:2}: {} => {score:.3}", ind.name()),
            None => eprintln!("  {i:2}: {} => not scored yet", ind.name()),
        }
    }

    let best = pool.best();
    eprintln!("Predictions of {}:", best.name());
    for (input, target) in dataset.inputs().iter().zip(dataset.targets()) {
        let output = best.network().forward(input);
        eprintln!("  {input:?} => {:.3} (target {target})", output[0]);
    }

    let model = TrainedModel {
        name: best.name().to_owned(),
        trained_at: Utc::now(),
        generations: summary.generations_run,
        final_score: best.last_score(),
        topology,
        weights: best.weights().to_vec(),
    };
    Output::save_json(&model, arg.output.clone())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Generations: {}", model.generations);
    if let Some(score) = model.final_score {
        eprintln!("  Final score: {score:.3}");
    }
    eprintln!("  Weights: {}", model.weights.len());

    Ok(())
}
