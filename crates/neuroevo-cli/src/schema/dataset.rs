use neuroevo_training::{config::ConfigError, evaluator::Dataset};
use serde::{Deserialize, Serialize};

/// Labeled training data: one target per input row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetFile {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl DatasetFile {
    pub(crate) fn into_dataset(self) -> Result<Dataset, ConfigError> {
        Dataset::new(self.inputs, self.targets)
    }
}
