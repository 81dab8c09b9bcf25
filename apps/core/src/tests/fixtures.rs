//! Shared test fixtures: a two-intent bot over a small softmax network.

use crate::brain::artifacts::ModelArtifacts;
use crate::brain::engine::IntentEngine;
use crate::brain::lemmatizer::IdentityLemmatizer;
use crate::brain::network::{Activation, DenseLayer, FeedForwardNetwork};
use crate::brain::normalizer::Normalizer;
use crate::config::{BotConfig, IntentResponses};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const GREETINGS: [&str; 2] = ["Привет!", "Здравствуйте!"];
pub const WEATHER: [&str; 1] = ["Сегодня солнечно."];
pub const FAILURE: [&str; 2] = ["Не понял вопрос.", "Переформулируйте, пожалуйста."];

pub fn vocabulary() -> Vec<String> {
    vec!["привет".to_string(), "погода".to_string()]
}

pub fn intents() -> Vec<String> {
    vec!["greeting".to_string(), "weather".to_string()]
}

/// Softmax network: word `i` strongly votes for intent `i`, no words gives 0.5/0.5.
pub fn network() -> FeedForwardNetwork {
    FeedForwardNetwork::new(vec![DenseLayer {
        weights: vec![vec![3.0, -3.0], vec![-3.0, 3.0]],
        biases: vec![0.0, 0.0],
        activation: Activation::Softmax,
    }])
    .unwrap()
}

pub fn bot_config() -> BotConfig {
    let mut intents = BTreeMap::new();
    intents.insert(
        "greeting".to_string(),
        IntentResponses {
            responses: GREETINGS.iter().map(|s| s.to_string()).collect(),
        },
    );
    intents.insert(
        "weather".to_string(),
        IntentResponses {
            responses: WEATHER.iter().map(|s| s.to_string()).collect(),
        },
    );
    BotConfig {
        threshold: 0.5,
        intents,
        failure_phrases: FAILURE.iter().map(|s| s.to_string()).collect(),
    }
}

/// Engine over the fixture network with an identity lemmatizer.
pub fn engine() -> IntentEngine {
    let artifacts = ModelArtifacts::new(vocabulary(), intents(), Arc::new(network())).unwrap();
    IntentEngine::with_normalizer(
        artifacts,
        bot_config(),
        Normalizer::with_lemmatizer(Box::new(IdentityLemmatizer)),
    )
    .unwrap()
}
