use chrono::{DateTime, Utc};
use neuroevo_nn::{FeedForwardNet, Topology};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainedModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub generations: usize,
    /// Score of the saved weights in the last generation they were evaluated
    pub final_score: Option<f64>,
    pub topology: Topology,
    pub weights: Vec<f64>,
}

impl TrainedModel {
    pub(crate) fn to_network(&self) -> anyhow::Result<FeedForwardNet> {
        anyhow::ensure!(
            self.weights.len() == self.topology.param_count(),
            "Model {} has {} weights, topology {:?} needs {}",
            self.name,
            self.weights.len(),
            self.topology,
            self.topology.param_count()
        );
        Ok(FeedForwardNet::with_weights(
            self.topology,
            self.weights.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use neuroevo_nn::Network as _;

    use super::*;

    fn model(weights: Vec<f64>) -> TrainedModel {
        TrainedModel {
            name: "ai-000".to_owned(),
            trained_at: Utc::now(),
            generations: 10,
            final_score: Some(3.5),
            topology: Topology::new(2, 2, 3, 1).unwrap(),
            weights,
        }
    }

    #[test]
    fn test_to_network() {
        let net = model(vec![0.0; 9]).to_network().unwrap();
        assert_eq!(net.forward(&[1.0, 1.0]), vec![0.5]);
    }

    #[test]
    fn test_weight_count_is_checked() {
        assert!(model(vec![0.0; 8]).to_network().is_err());
    }

    #[test]
    fn test_invalid_topology_is_a_parse_error() {
        let mut json = serde_json::to_value(model(vec![0.0; 9])).unwrap();
        json["topology"]["layers"] = 1.into();
        assert!(serde_json::from_value::<TrainedModel>(json).is_err());
    }

    #[test]
    fn test_json_keeps_weights_exact() {
        let original = model(vec![0.1, -2.75, 1e-9, 0.0, 5.0, -0.3, 7.25, 0.7, -1.0]);
        let json = serde_json::to_string_pretty(&original).unwrap();
        let parsed: TrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.weights, original.weights);
        assert_eq!(parsed.topology, original.topology);
        assert_eq!(parsed.trained_at, original.trained_at);
    }
}
