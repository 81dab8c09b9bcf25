//! # Brain Module
//!
//! Intent classification pipeline of the chat bot.
//! Turns one incoming message into an intent decision and a reply.
//!
//! ## Components
//! - `normalizer`: garbage stripping, tokenization, lemmatization, stopwords
//! - `typo`: nearest-vocabulary-word correction (Damerau–Levenshtein)
//! - `vectorizer`: bag-of-words presence vector
//! - `network` / `classifier`: feed-forward model and its output checks
//! - `decision`: threshold and ranking
//! - `responder`: random reply selection
//! - `artifacts`: vocabulary, intent table and network loading
//! - `engine`: main orchestrator

pub mod artifacts;
pub mod classifier;
pub mod decision;
pub mod engine;
pub mod lemmatizer;
pub mod network;
pub mod normalizer;
pub mod responder;
pub mod stopwords;
pub mod typo;
pub mod vectorizer;

pub use artifacts::ModelArtifacts;
pub use classifier::IntentClassifier;
pub use decision::RankedIntent;
pub use engine::{Classification, IntentEngine, Outcome, Reply};
pub use network::{FeedForwardNetwork, IntentModel};
pub use normalizer::Normalizer;
