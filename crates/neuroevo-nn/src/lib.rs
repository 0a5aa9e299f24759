//! Fixed-topology neural networks whose parameters are exposed as one flat vector.
//!
//! The evolutionary optimizer in `neuroevo-training` never looks inside a network.
//! It only needs to read the parameter vector, overwrite it with an offspring of the
//! same length, and run forward inference. The [`Network`] trait captures exactly
//! that contract; [`FeedForwardNet`] is the fully connected sigmoid network used by
//! the command line trainer and the tests.
//!
//! # Example
//!
//! ```
//! use neuroevo_nn::{FeedForwardNet, Network as _, Topology};
//!
//! let topology = Topology::new(2, 2, 3, 1).unwrap();
//! let mut net = FeedForwardNet::random(topology, &mut rand::rng());
//!
//! // 2 inputs -> 2 hidden -> 1 output, every neuron with a bias
//! assert_eq!(net.param_count(), (2 + 1) * 2 + (2 + 1) * 1);
//!
//! let weights = vec![0.0; net.param_count()];
//! net.set_weights(&weights);
//! assert_eq!(net.forward(&[1.0, 0.0]), vec![0.5]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::feed_forward::FeedForwardNet;

mod feed_forward;

/// A network model whose parameters form a flat, fixed-length vector.
pub trait Network: fmt::Debug + Send + Sync {
    /// Number of values [`forward`](Self::forward) expects.
    fn input_len(&self) -> usize;

    /// Number of values [`forward`](Self::forward) returns.
    fn output_len(&self) -> usize;

    /// Current parameter vector, in the model's own layout.
    fn weights(&self) -> &[f64];

    /// Replaces the parameter vector.
    ///
    /// Passing a vector of a different length is a caller error and panics.
    fn set_weights(&mut self, weights: &[f64]);

    /// Runs inference on one input vector.
    fn forward(&self, input: &[f64]) -> Vec<f64>;

    /// Length of the parameter vector. Constant for the lifetime of the network.
    fn param_count(&self) -> usize {
        self.weights().len()
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TopologyError {
    #[display("network needs at least one input and one output neuron")]
    EmptyBoundaryLayer,
    #[display("network needs at least 2 layers, got {_0}")]
    TooFewLayers(#[error(not(source))] usize),
    #[display("hidden layers need at least one neuron")]
    EmptyHiddenLayer,
}

/// Layer sizes of a fully connected network.
///
/// `layers` counts every layer including the input and output layers, so
/// `layers = 3` describes a network with one hidden layer of `hidden` neurons.
///
/// Deserialization goes through [`Topology::new`], so a stored topology is
/// validated the same way as one built in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TopologyFields")]
pub struct Topology {
    inputs: usize,
    hidden: usize,
    layers: usize,
    outputs: usize,
}

#[derive(Deserialize)]
struct TopologyFields {
    inputs: usize,
    hidden: usize,
    layers: usize,
    outputs: usize,
}

impl TryFrom<TopologyFields> for Topology {
    type Error = TopologyError;

    fn try_from(fields: TopologyFields) -> Result<Self, Self::Error> {
        let TopologyFields {
            inputs,
            hidden,
            layers,
            outputs,
        } = fields;
        Self::new(inputs, hidden, layers, outputs)
    }
}

impl Topology {
    pub fn new(
        inputs: usize,
        hidden: usize,
        layers: usize,
        outputs: usize,
    ) -> Result<Self, TopologyError> {
        if inputs == 0 || outputs == 0 {
            return Err(TopologyError::EmptyBoundaryLayer);
        }
        if layers < 2 {
            return Err(TopologyError::TooFewLayers(layers));
        }
        if layers > 2 && hidden == 0 {
            return Err(TopologyError::EmptyHiddenLayer);
        }
        Ok(Self {
            inputs,
            hidden,
            layers,
            outputs,
        })
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    #[must_use]
    pub fn hidden(&self) -> usize {
        self.hidden
    }

    #[must_use]
    pub fn layers(&self) -> usize {
        self.layers
    }

    #[must_use]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Neuron count of every layer, input layer first.
    #[must_use]
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers);
        sizes.push(self.inputs);
        sizes.extend(std::iter::repeat_n(self.hidden, self.layers - 2));
        sizes.push(self.outputs);
        sizes
    }

    /// Total number of weights and biases.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.layer_sizes()
            .windows(2)
            .map(|w| (w[0] + 1) * w[1])
            .sum()
    }
}
