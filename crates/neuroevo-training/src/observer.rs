//! Per-generation hooks for reporting and persistence.
//!
//! Observers run once per generation, after the population has been scored and
//! sorted and before offspring replace the non-elite individuals. They see the
//! scores the selection was based on. Nothing an observer does feeds back into the
//! algorithm.

use neuroevo_nn::Network;

use crate::{individual::Individual, stats::ScoreStats};

/// Snapshot of a scored generation.
#[derive(Debug)]
pub struct GenerationReport<'a, N> {
    /// Zero-based generation index.
    pub generation: usize,
    /// The population, best first.
    pub ranked: &'a [Individual<N>],
    /// Statistics of the generation scores.
    pub stats: Option<ScoreStats>,
    /// Whether parents were drawn uniformly because the scores were degenerate.
    pub uniform_selection: bool,
}

impl<N> GenerationReport<'_, N> {
    /// The highest-scoring individual.
    #[must_use]
    pub fn best(&self) -> &Individual<N> {
        &self.ranked[0]
    }
}

/// Receives a [`GenerationReport`] every generation.
pub trait GenerationObserver<N>: Send {
    fn observe(&mut self, report: &GenerationReport<'_, N>);
}

impl<N, F> GenerationObserver<N> for F
where
    F: FnMut(&GenerationReport<'_, N>) + Send,
{
    fn observe(&mut self, report: &GenerationReport<'_, N>) {
        self(report);
    }
}

/// Logs the top individuals of every generation through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingReporter {
    top_k: usize,
}

impl TracingReporter {
    #[must_use]
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for TracingReporter {
    fn default() -> Self {
        Self::new(5)
    }
}

impl<N> GenerationObserver<N> for TracingReporter
where
    N: Network,
{
    fn observe(&mut self, report: &GenerationReport<'_, N>) {
        if let Some(stats) = &report.stats {
            tracing::info!(
                generation = report.generation,
                best = stats.max,
                mean = stats.mean,
                min = stats.min,
                std_dev = stats.std_dev,
                uniform_selection = report.uniform_selection,
                "generation scored"
            );
        }
        for (rank, ind) in report.ranked.iter().take(self.top_k).enumerate() {
            tracing::info!(
                generation = report.generation,
                rank,
                name = ind.name(),
                score = ind.generation_score(),
                average = ind.average_score(),
                cumulative = ind.cumulative_score(),
                "ranked"
            );
        }
    }
}
