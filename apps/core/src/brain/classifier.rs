//! Guarded model invocation.
//!
//! Wraps an [`IntentModel`] and refuses to pass on anything that is not a
//! well-formed probability vector: wrong widths, NaN or values outside `[0, 1]`
//! are classification failures, never coerced.

use std::sync::Arc;

use super::network::IntentModel;
use crate::error::AppError;

#[derive(Clone)]
pub struct IntentClassifier {
    model: Arc<dyn IntentModel>,
    input_width: usize,
    output_width: usize,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn IntentModel>, input_width: usize, output_width: usize) -> Self {
        Self {
            model,
            input_width,
            output_width,
        }
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    /// Run the model on a bag-of-words vector and return one probability per intent.
    pub fn predict(&self, vector: &[f32]) -> Result<Vec<f32>, AppError> {
        if vector.len() != self.input_width {
            return Err(AppError::Classification(format!(
                "Input vector has length {}, vocabulary has {} entries",
                vector.len(),
                self.input_width
            )));
        }

        let probabilities = self.model.predict(vector).map_err(|e| match e {
            AppError::Classification(msg) => AppError::Classification(msg),
            other => AppError::Classification(format!("Model evaluation failed: {}", other)),
        })?;

        if probabilities.len() != self.output_width {
            return Err(AppError::Classification(format!(
                "Model returned {} probabilities for {} intents",
                probabilities.len(),
                self.output_width
            )));
        }

        if let Some((index, value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| p.is_nan() || !(0.0..=1.0).contains(*p))
        {
            return Err(AppError::Classification(format!(
                "Model returned invalid probability {} at index {}",
                value, index
            )));
        }

        Ok(probabilities)
    }
}
