//! A single candidate solution and its fitness bookkeeping.

use std::cmp::Ordering;

use neuroevo_nn::Network;

/// One member of the population: a network plus its score counters.
///
/// The parameter vector lives inside the network and keeps its length for the
/// lifetime of the individual. Only the reproduction pass replaces it.
#[derive(Debug, Clone)]
pub struct Individual<N> {
    name: String,
    network: N,
    generation_score: f64,
    games_played: u32,
    cumulative_score: f64,
    last_score: Option<f64>,
}

impl<N> Individual<N>
where
    N: Network,
{
    pub(crate) fn new(name: String, network: N) -> Self {
        Self {
            name,
            network,
            generation_score: 0.0,
            games_played: 0,
            cumulative_score: 0.0,
            last_score: None,
        }
    }

    /// Identifier assigned at creation, used for reporting only.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        self.network.weights()
    }

    pub(crate) fn set_weights(&mut self, weights: &[f64]) {
        self.network.set_weights(weights);
        self.last_score = None;
    }

    /// Fitness accumulated during the current generation.
    #[must_use]
    pub fn generation_score(&self) -> f64 {
        self.generation_score
    }

    /// Overwrites the current generation's fitness.
    ///
    /// Custom scoring functions must call this for every individual.
    pub fn set_generation_score(&mut self, score: f64) {
        self.generation_score = score;
    }

    /// Number of matches that contributed to the current generation's score.
    #[must_use]
    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    /// Score summed over all generations. Reported, never used for selection.
    #[must_use]
    pub fn cumulative_score(&self) -> f64 {
        self.cumulative_score
    }

    /// Score the current weights earned in the last generation they were evaluated.
    ///
    /// `None` until the individual is first scored, and again whenever its weights
    /// are replaced or mutated.
    #[must_use]
    pub fn last_score(&self) -> Option<f64> {
        self.last_score
    }

    /// Generation score divided by games played, or the raw score when no game
    /// was recorded.
    #[must_use]
    pub fn average_score(&self) -> f64 {
        if self.games_played == 0 {
            self.generation_score
        } else {
            self.generation_score / f64::from(self.games_played)
        }
    }

    pub(crate) fn record_game(&mut self, reward: f64) {
        self.generation_score += reward;
        self.cumulative_score += reward;
        self.games_played += 1;
    }

    /// Keeps the generation score as the score of the current weights.
    pub(crate) fn commit_score(&mut self) {
        self.last_score = Some(self.generation_score);
    }

    pub(crate) fn reset_generation(&mut self) {
        self.generation_score = 0.0;
        self.games_played = 0;
    }
}

/// Sorts individuals by generation score, best first.
///
/// The sort is stable, so equal scores keep their previous order.
pub(crate) fn sort_by_score_desc<N>(individuals: &mut [Individual<N>])
where
    N: Network,
{
    individuals.sort_by(|a, b| b.generation_score.total_cmp(&a.generation_score));
}

/// Sorts individuals by [`Individual::last_score`], best first, unscored last.
pub(crate) fn sort_by_last_score_desc<N>(individuals: &mut [Individual<N>])
where
    N: Network,
{
    individuals.sort_by(|a, b| match (a.last_score, b.last_score) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
