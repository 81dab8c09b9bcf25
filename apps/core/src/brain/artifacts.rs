//! Model artifacts: vocabulary, intent table and network.
//!
//! The three are produced together by the offline trainer and must agree with
//! each other. Any disagreement is reported as a configuration error so the
//! process refuses to start instead of misclassifying at runtime.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::network::{FeedForwardNetwork, IntentModel};
use crate::error::AppError;
use crate::fs_manager::{INTENTS_FILENAME, NETWORK_FILENAME, VOCABULARY_FILENAME};

#[derive(Clone)]
pub struct ModelArtifacts {
    vocabulary: Arc<[String]>,
    intents: Arc<[String]>,
    model: Arc<dyn IntentModel>,
}

impl fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("vocabulary", &self.vocabulary.len())
            .field("intents", &self.intents)
            .field("model", &"<model>")
            .finish()
    }
}

impl ModelArtifacts {
    /// Assemble artifacts from parts, e.g. injected in tests.
    pub fn new(
        vocabulary: Vec<String>,
        intents: Vec<String>,
        model: Arc<dyn IntentModel>,
    ) -> Result<Self, AppError> {
        check_ordered_set("Vocabulary", &vocabulary)?;
        check_ordered_set("Intent table", &intents)?;

        if model.input_width() != vocabulary.len() {
            return Err(AppError::Configuration(format!(
                "Network input width {} does not match vocabulary size {}",
                model.input_width(),
                vocabulary.len()
            )));
        }
        if model.output_width() != intents.len() {
            return Err(AppError::Configuration(format!(
                "Network output width {} does not match intent table size {}",
                model.output_width(),
                intents.len()
            )));
        }

        Ok(Self {
            vocabulary: vocabulary.into(),
            intents: intents.into(),
            model,
        })
    }

    /// Load `words.json`, `intents.json` and `perceptron.json` from a directory.
    pub fn load(models_dir: &Path) -> Result<Self, AppError> {
        let vocabulary = load_string_list(&models_dir.join(VOCABULARY_FILENAME))?;
        let intents = load_string_list(&models_dir.join(INTENTS_FILENAME))?;
        let network = FeedForwardNetwork::from_file(&models_dir.join(NETWORK_FILENAME))
            .map_err(|e| match e {
                AppError::Io(io) => AppError::Configuration(format!(
                    "Cannot read {:?}: {}",
                    models_dir.join(NETWORK_FILENAME),
                    io
                )),
                other => other,
            })?;

        let artifacts = Self::new(vocabulary, intents, Arc::new(network))?;
        info!(
            "Model artifacts loaded from {:?}: {} words, {} intents",
            models_dir,
            artifacts.vocabulary.len(),
            artifacts.intents.len()
        );
        Ok(artifacts)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn intents(&self) -> &[String] {
        &self.intents
    }

    pub fn model(&self) -> Arc<dyn IntentModel> {
        Arc::clone(&self.model)
    }
}

fn check_ordered_set(what: &str, items: &[String]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::Configuration(format!("{} is empty", what)));
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.as_str()) {
            return Err(AppError::Configuration(format!(
                "{} contains duplicate entry '{}'",
                what, item
            )));
        }
    }
    Ok(())
}

fn load_string_list(path: &Path) -> Result<Vec<String>, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Configuration(format!("Cannot read {:?}: {}", path, e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Configuration(format!("Invalid artifact {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::network::{Activation, DenseLayer};

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn network(inputs: usize, outputs: usize) -> Arc<FeedForwardNetwork> {
        Arc::new(
            FeedForwardNetwork::new(vec![DenseLayer {
                weights: vec![vec![0.5; inputs]; outputs],
                biases: vec![0.0; outputs],
                activation: Activation::Sigmoid,
            }])
            .unwrap(),
        )
    }

    #[test]
    fn test_consistent_artifacts() {
        let artifacts = ModelArtifacts::new(
            strings(&["привет", "погода", "помощь"]),
            strings(&["greeting", "weather"]),
            network(3, 2),
        )
        .unwrap();

        assert_eq!(artifacts.vocabulary()[1], "погода");
        assert_eq!(artifacts.intents(), &["greeting", "weather"]);
        assert_eq!(artifacts.model().output_width(), 2);
    }

    #[test]
    fn test_width_mismatch_is_fatal() {
        let input = ModelArtifacts::new(strings(&["a1", "b2"]), strings(&["x"]), network(3, 1));
        assert!(matches!(input, Err(AppError::Configuration(_))));

        let output = ModelArtifacts::new(strings(&["a1", "b2"]), strings(&["x"]), network(2, 2));
        assert!(matches!(output, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_duplicates_and_empty_rejected() {
        let duplicate = ModelArtifacts::new(strings(&["a1", "a1"]), strings(&["x"]), network(2, 1));
        assert!(matches!(duplicate, Err(AppError::Configuration(_))));

        let empty = ModelArtifacts::new(vec![], strings(&["x"]), network(1, 1));
        assert!(matches!(empty, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VOCABULARY_FILENAME), r#"["привет", "погода"]"#).unwrap();
        fs::write(dir.path().join(INTENTS_FILENAME), r#"["greeting", "weather"]"#).unwrap();
        let net = FeedForwardNetwork::new(vec![DenseLayer {
            weights: vec![vec![4.0, -4.0], vec![-4.0, 4.0]],
            biases: vec![0.0, 0.0],
            activation: Activation::Softmax,
        }])
        .unwrap();
        fs::write(
            dir.path().join(NETWORK_FILENAME),
            serde_json::to_string(&net).unwrap(),
        )
        .unwrap();

        let artifacts = ModelArtifacts::load(dir.path()).unwrap();
        assert_eq!(artifacts.vocabulary().len(), 2);
        let output = artifacts.model().predict(&[1.0, 0.0]).unwrap();
        assert!(output[0] > 0.99);
    }

    #[test]
    fn test_load_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = ModelArtifacts::load(dir.path());
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
