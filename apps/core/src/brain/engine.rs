//! Intent Engine - orchestrator of the classification pipeline.
//!
//! normalize → correct → vectorize → predict → rank/decide → select reply.
//!
//! The engine is immutable once built and is shared by reference between all
//! in-flight requests. Failures before the model (normalization, correction)
//! are logged as warnings, failures in the model or decision layer as errors;
//! in both cases the user receives a reserve reply.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::artifacts::ModelArtifacts;
use super::classifier::IntentClassifier;
use super::decision::{self, RankedIntent};
use super::lemmatizer::{DictionaryLemmatizer, MorphologicalLemmatizer};
use super::normalizer::Normalizer;
use super::responder::select_response;
use super::typo;
use super::vectorizer::vectorize;
use crate::config::{validate_threshold, BotConfig, Settings};
use crate::error::{AppError, Severity};
use crate::fs_manager::LEMMAS_FILENAME;

/// Result of running the pipeline up to the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Tokens after normalization.
    pub tokens: Vec<String>,
    /// Tokens after typo correction.
    pub corrected: Vec<String>,
    /// Every intent above the threshold, best first.
    pub ranking: Vec<RankedIntent>,
}

impl Classification {
    /// The decided intent, if any.
    pub fn intent(&self) -> Option<&str> {
        self.ranking.first().map(|r| r.intent.as_str())
    }

    pub fn probability(&self) -> Option<f32> {
        self.ranking.first().map(|r| r.probability)
    }
}

/// How a reply was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// An intent cleared the threshold.
    Matched,
    /// Nothing cleared the threshold.
    Unrecognized,
    /// The pipeline failed for this message and a reserve reply was used.
    Recovered,
}

/// A reply ready to be handed to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub intent: Option<String>,
    pub probability: Option<f32>,
    pub outcome: Outcome,
}

pub struct IntentEngine {
    normalizer: Normalizer,
    artifacts: ModelArtifacts,
    classifier: IntentClassifier,
    config: BotConfig,
}

impl IntentEngine {
    /// Build an engine with the default normalizer.
    pub fn new(artifacts: ModelArtifacts, config: BotConfig) -> Result<Self, AppError> {
        Self::with_normalizer(artifacts, config, Normalizer::new())
    }

    pub fn with_normalizer(
        artifacts: ModelArtifacts,
        config: BotConfig,
        normalizer: Normalizer,
    ) -> Result<Self, AppError> {
        config.check()?;
        config.ensure_covers(artifacts.intents())?;

        let classifier = IntentClassifier::new(
            artifacts.model(),
            artifacts.vocabulary().len(),
            artifacts.intents().len(),
        );

        Ok(Self {
            normalizer,
            artifacts,
            classifier,
            config,
        })
    }

    /// Load config and artifacts as described by the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let config = settings.load_bot_config()?;
        let artifacts = ModelArtifacts::load(&settings.models_dir)?;

        let lemmas_path = settings.models_dir.join(LEMMAS_FILENAME);
        let normalizer = if lemmas_path.exists() {
            let lemmatizer =
                DictionaryLemmatizer::from_file(&lemmas_path, Box::new(MorphologicalLemmatizer::new()))?;
            Normalizer::with_lemmatizer(Box::new(lemmatizer))
        } else {
            Normalizer::new()
        };

        let engine = Self::with_normalizer(artifacts, config, normalizer)?;
        info!(
            "Intent engine ready ({} lemmatizer, threshold {})",
            engine.normalizer.lemmatizer_name(),
            engine.config.threshold
        );
        Ok(engine)
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Per-call threshold if given, else the configured one.
    pub fn resolve_threshold(&self, threshold: Option<f32>) -> Result<f32, AppError> {
        match threshold {
            Some(value) => validate_threshold(value),
            None => Ok(self.config.threshold),
        }
    }

    /// Run the pipeline on text, surfacing every failure.
    pub fn classify(&self, text: &str, threshold: f32) -> Result<Classification, AppError> {
        self.classify_tokens(self.normalizer.normalize(text), threshold)
    }

    /// Run the pipeline on raw bytes, surfacing every failure.
    pub fn classify_bytes(&self, bytes: &[u8], threshold: f32) -> Result<Classification, AppError> {
        let tokens = self.normalizer.normalize_bytes(bytes)?;
        self.classify_tokens(tokens, threshold)
    }

    fn classify_tokens(&self, tokens: Vec<String>, threshold: f32) -> Result<Classification, AppError> {
        let vocabulary = self.artifacts.vocabulary();

        let corrected = typo::correct_tokens(&tokens, vocabulary)?;
        let vector = vectorize(&corrected, vocabulary);
        let probabilities = self.classifier.predict(&vector)?;
        let ranking = decision::rank(&probabilities, self.artifacts.intents(), threshold)?;

        debug!(
            ?tokens,
            ?corrected,
            ?probabilities,
            ranked = ranking.len(),
            "Classified message"
        );

        Ok(Classification {
            tokens,
            corrected,
            ranking,
        })
    }

    /// Classify text and pick a reply. Only configuration problems and an
    /// invalid threshold override are returned as errors.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        text: &str,
        threshold: Option<f32>,
        rng: &mut R,
    ) -> Result<Reply, AppError> {
        let threshold = self.resolve_threshold(threshold)?;
        let result = self.classify(text, threshold);
        self.finish(result, rng)
    }

    /// Same as [`respond`](Self::respond) for raw transport bytes.
    pub fn respond_bytes<R: Rng + ?Sized>(
        &self,
        bytes: &[u8],
        threshold: Option<f32>,
        rng: &mut R,
    ) -> Result<Reply, AppError> {
        let threshold = self.resolve_threshold(threshold)?;
        let result = self.classify_bytes(bytes, threshold);
        self.finish(result, rng)
    }

    /// The inbound operation: text in, reply text out.
    pub fn classify_and_respond<R: Rng + ?Sized>(
        &self,
        text: &str,
        threshold: Option<f32>,
        rng: &mut R,
    ) -> Result<String, AppError> {
        Ok(self.respond(text, threshold, rng)?.text)
    }

    /// Log a failure and answer with a reserve phrase.
    pub fn recover<R: Rng + ?Sized>(&self, err: &AppError, rng: &mut R) -> Result<Reply, AppError> {
        match err.severity() {
            Severity::Recoverable => warn!("Message could not be processed: {}", err),
            Severity::Critical | Severity::Fatal => {
                error!("Model or decision layer failure: {}", err)
            }
        }
        Ok(Reply {
            text: select_response(None, &self.config, rng)?,
            intent: None,
            probability: None,
            outcome: Outcome::Recovered,
        })
    }

    fn finish<R: Rng + ?Sized>(
        &self,
        result: Result<Classification, AppError>,
        rng: &mut R,
    ) -> Result<Reply, AppError> {
        let classification = match result {
            Ok(classification) => classification,
            Err(err) => return self.recover(&err, rng),
        };

        let intent = classification.intent();
        Ok(Reply {
            text: select_response(intent, &self.config, rng)?,
            intent: intent.map(str::to_string),
            probability: classification.probability(),
            outcome: if intent.is_some() {
                Outcome::Matched
            } else {
                Outcome::Unrecognized
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::lemmatizer::IdentityLemmatizer;
    use crate::brain::network::IntentModel;
    use crate::config::IntentResponses;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Scores intent `i` with 0.9 when vocabulary word `i` is present.
    struct KeywordModel {
        width: usize,
    }

    impl IntentModel for KeywordModel {
        fn input_width(&self) -> usize {
            self.width
        }

        fn output_width(&self) -> usize {
            self.width
        }

        fn predict(&self, input: &[f32]) -> Result<Vec<f32>, AppError> {
            Ok(input.iter().map(|x| if *x > 0.0 { 0.9 } else { 0.1 }).collect())
        }
    }

    fn engine() -> IntentEngine {
        let artifacts = ModelArtifacts::new(
            vec!["привет".into(), "погода".into()],
            vec!["greeting".into(), "weather".into()],
            Arc::new(KeywordModel { width: 2 }),
        )
        .unwrap();

        let mut intents = BTreeMap::new();
        intents.insert(
            "greeting".to_string(),
            IntentResponses {
                responses: vec!["Привет!".into()],
            },
        );
        intents.insert(
            "weather".to_string(),
            IntentResponses {
                responses: vec!["Солнечно.".into()],
            },
        );
        let config = BotConfig {
            threshold: 0.5,
            intents,
            failure_phrases: vec!["Не понял.".into()],
        };

        IntentEngine::with_normalizer(
            artifacts,
            config,
            Normalizer::with_lemmatizer(Box::new(IdentityLemmatizer)),
        )
        .unwrap()
    }

    #[test]
    fn test_classify_with_typo() {
        let engine = engine();
        let classification = engine.classify("Какая пагода?", 0.5).unwrap();

        assert_eq!(classification.tokens, vec!["пагода"]);
        assert_eq!(classification.corrected, vec!["погода"]);
        assert_eq!(classification.intent(), Some("weather"));
        assert_eq!(classification.probability(), Some(0.9));
    }

    #[test]
    fn test_respond_matched_and_unrecognized() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(1);

        let reply = engine.respond("привет!", None, &mut rng).unwrap();
        assert_eq!(reply.text, "Привет!");
        assert_eq!(reply.outcome, Outcome::Matched);

        let reply = engine.respond("12345", None, &mut rng).unwrap();
        assert_eq!(reply.text, "Не понял.");
        assert_eq!(reply.outcome, Outcome::Unrecognized);
        assert_eq!(reply.intent, None);
    }

    #[test]
    fn test_threshold_override() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(1);

        let reply = engine.respond("привет", Some(0.95), &mut rng).unwrap();
        assert_eq!(reply.outcome, Outcome::Unrecognized);

        let invalid = engine.respond("привет", Some(1.2), &mut rng);
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_invalid_bytes_recovered() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(1);

        let reply = engine.respond_bytes(&[0xc3, 0x28], None, &mut rng).unwrap();
        assert_eq!(reply.outcome, Outcome::Recovered);
        assert_eq!(reply.text, "Не понял.");
    }

    #[test]
    fn test_uncovered_intent_rejected_at_construction() {
        let artifacts = ModelArtifacts::new(
            vec!["привет".into()],
            vec!["greeting".into()],
            Arc::new(KeywordModel { width: 1 }),
        )
        .unwrap();
        let config = BotConfig {
            threshold: 0.5,
            intents: BTreeMap::new(),
            failure_phrases: vec!["Не понял.".into()],
        };

        let result = IntentEngine::new(artifacts, config);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
