use neuroevo_nn::Network;

/// Network whose outputs are its leading weights, regardless of input.
#[derive(Debug, Clone)]
pub(crate) struct StubNet {
    inputs: usize,
    outputs: usize,
    weights: Vec<f64>,
}

impl StubNet {
    pub(crate) fn new(weights: Vec<f64>) -> Self {
        Self {
            inputs: 2,
            outputs: 1,
            weights,
        }
    }

    pub(crate) fn zeros(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    pub(crate) fn with_outputs(self, outputs: usize) -> Self {
        Self { outputs, ..self }
    }
}

impl Network for StubNet {
    fn input_len(&self) -> usize {
        self.inputs
    }

    fn output_len(&self) -> usize {
        self.outputs
    }

    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn set_weights(&mut self, weights: &[f64]) {
        assert_eq!(weights.len(), self.weights.len());
        self.weights.copy_from_slice(weights);
    }

    fn forward(&self, _input: &[f64]) -> Vec<f64> {
        self.weights[..self.outputs].to_vec()
    }
}
