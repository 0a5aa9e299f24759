use rand::Rng;

use crate::{Network, Topology};

/// Fully connected network with sigmoid activation on every non-input layer.
///
/// Parameters are stored layer by layer. Within a layer, each output neuron owns a
/// contiguous run of `in + 1` values: its incoming weights followed by its bias. This
/// keeps parameters of the same layer close together in the flat vector.
#[derive(Debug, Clone)]
pub struct FeedForwardNet {
    topology: Topology,
    layer_sizes: Vec<usize>,
    weights: Vec<f64>,
}

impl FeedForwardNet {
    /// Creates a network with every parameter drawn uniformly from `[-1, 1]`.
    pub fn random<R>(topology: Topology, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let weights = (0..topology.param_count())
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect();
        Self::with_weights(topology, weights)
    }

    /// Creates a network from an existing parameter vector.
    ///
    /// # Panics
    ///
    /// Panics if `weights` does not have `topology.param_count()` elements.
    #[must_use]
    pub fn with_weights(topology: Topology, weights: Vec<f64>) -> Self {
        assert_eq!(weights.len(), topology.param_count());
        Self {
            topology,
            layer_sizes: topology.layer_sizes(),
            weights,
        }
    }

    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Network for FeedForwardNet {
    fn input_len(&self) -> usize {
        self.topology.inputs()
    }

    fn output_len(&self) -> usize {
        self.topology.outputs()
    }

    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn set_weights(&mut self, weights: &[f64]) {
        assert_eq!(weights.len(), self.weights.len());
        self.weights.copy_from_slice(weights);
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        assert_eq!(input.len(), self.topology.inputs());
        let mut activations = input.to_vec();
        let mut params = self.weights.as_slice();
        for &out_len in &self.layer_sizes[1..] {
            let in_len = activations.len();
            let (layer, rest) = params.split_at((in_len + 1) * out_len);
            params = rest;
            activations = layer
                .chunks_exact(in_len + 1)
                .map(|neuron| {
                    let (weights, bias) = neuron.split_at(in_len);
                    let sum = std::iter::zip(weights, &activations)
                        .map(|(w, a)| w * a)
                        .sum::<f64>();
                    sigmoid(sum + bias[0])
                })
                .collect();
        }
        activations
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_random_weights_within_range() {
        let topology = Topology::new(2, 3, 3, 1).unwrap();
        let net = FeedForwardNet::random(topology, &mut Pcg32::seed_from_u64(1));
        assert_eq!(net.param_count(), topology.param_count());
        assert!(net.weights().iter().all(|w| (-1.0..=1.0).contains(w)));
    }

    #[test]
    fn test_set_weights_replaces_vector() {
        let topology = Topology::new(2, 2, 3, 1).unwrap();
        let mut net = FeedForwardNet::random(topology, &mut Pcg32::seed_from_u64(2));
        let replacement = net.weights().iter().map(|w| w + 5.0).collect::<Vec<_>>();
        net.set_weights(&replacement);
        assert_eq!(net.weights(), replacement.as_slice());
    }

    #[test]
    #[should_panic(expected = "assertion `left == right` failed")]
    fn test_set_weights_rejects_other_length() {
        let topology = Topology::new(2, 2, 3, 1).unwrap();
        let mut net = FeedForwardNet::random(topology, &mut Pcg32::seed_from_u64(3));
        net.set_weights(&[0.0; 3]);
    }

    #[test]
    fn test_forward_hand_computed() {
        // 1 input -> 1 output: out = sigmoid(w * x + b)
        let topology = Topology::new(1, 0, 2, 1).unwrap();
        let net = FeedForwardNet::with_weights(topology, vec![2.0, -1.0]);
        let out = net.forward(&[1.0]);
        assert_eq!(out.len(), 1);
        assert!((out[0] - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_forward_uses_every_layer() {
        // 2 -> 2 -> 1, hidden neurons saturate to ~1 and ~0
        let topology = Topology::new(2, 2, 3, 1).unwrap();
        #[rustfmt::skip]
        let weights = vec![
            50.0, 50.0, 0.0,   // hidden 0
            -50.0, -50.0, 0.0, // hidden 1
            10.0, -10.0, 0.0,  // output
        ];
        let net = FeedForwardNet::with_weights(topology, weights);
        let out = net.forward(&[1.0, 1.0]);
        assert!(out[0] > 0.99);
    }
}
