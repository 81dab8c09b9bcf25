//! Feed-forward network inference.
//!
//! The network is trained offline and shipped as JSON. Only inference lives
//! here; dropout layers used during training are identities at inference time
//! and are therefore absent from the serialized form.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::AppError;

/// Maps a `V`-length feature vector to an `I`-length score vector.
///
/// Implementations must not mutate shared state in `predict`; a single model
/// is read concurrently by every in-flight request.
pub trait IntentModel: Send + Sync {
    /// Width of the expected input vector.
    fn input_width(&self) -> usize;

    /// Width of the produced output vector.
    fn output_width(&self) -> usize;

    /// Evaluate the model on one input vector.
    fn predict(&self, input: &[f32]) -> Result<Vec<f32>, AppError>;
}

/// Activation applied to a layer's pre-activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Softmax,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, values: &mut [f32]) {
        match self {
            Activation::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Sigmoid => values
                .iter_mut()
                .for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Activation::Tanh => values.iter_mut().for_each(|v| *v = v.tanh()),
            Activation::Linear => {}
            Activation::Softmax => {
                let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mut sum = 0.0f32;
                for v in values.iter_mut() {
                    *v = (*v - max).exp();
                    sum += *v;
                }
                if sum > 0.0 {
                    values.iter_mut().for_each(|v| *v /= sum);
                }
            }
        }
    }
}

/// A fully connected layer. `weights` holds one row per output neuron.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn input_width(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    pub fn output_width(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut output: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect();
        self.activation.apply(&mut output);
        output
    }
}

/// Sequential stack of dense layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNetwork {
    layers: Vec<DenseLayer>,
}

impl FeedForwardNetwork {
    /// Build a network, checking that consecutive layer shapes line up.
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, AppError> {
        let network = Self { layers };
        network.validate()?;
        Ok(network)
    }

    /// Load a network from its JSON artifact.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        let network: FeedForwardNetwork = serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!("Invalid network artifact {:?}: {}", path, e))
        })?;
        network.validate()?;
        info!(
            "Loaded network from {:?}: {} layers, {} -> {}",
            path,
            network.layers.len(),
            network.input_width(),
            network.output_width()
        );
        Ok(network)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.layers.is_empty() {
            return Err(AppError::Configuration(
                "Network has no layers".to_string(),
            ));
        }

        let mut expected_input = self.layers[0].input_width();
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.biases.len() {
                return Err(AppError::Configuration(format!(
                    "Layer {}: {} weight rows but {} biases",
                    index,
                    layer.weights.len(),
                    layer.biases.len()
                )));
            }
            if layer.biases.is_empty() {
                return Err(AppError::Configuration(format!("Layer {} has no neurons", index)));
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != expected_input) {
                return Err(AppError::Configuration(format!(
                    "Layer {}: row {} has width {}, expected {}",
                    index,
                    row,
                    layer.weights[row].len(),
                    expected_input
                )));
            }
            let finite = layer
                .weights
                .iter()
                .flatten()
                .chain(&layer.biases)
                .all(|v| v.is_finite());
            if !finite {
                return Err(AppError::Configuration(format!(
                    "Layer {} contains non-finite parameters",
                    index
                )));
            }
            expected_input = layer.output_width();
        }

        if self.input_width() == 0 {
            return Err(AppError::Configuration(
                "Network input width is zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl IntentModel for FeedForwardNetwork {
    fn input_width(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_width)
    }

    fn output_width(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_width)
    }

    fn predict(&self, input: &[f32]) -> Result<Vec<f32>, AppError> {
        if input.len() != self.input_width() {
            return Err(AppError::Classification(format!(
                "Network expects {} inputs, got {}",
                self.input_width(),
                input.len()
            )));
        }

        let mut activations = input.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }

        if activations.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Classification(
                "Network produced a non-finite value".to_string(),
            ));
        }
        Ok(activations)
    }
}
