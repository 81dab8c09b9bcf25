//! Lexical normalization of raw user text.
//!
//! Pipeline: strip everything that is not a Latin/Cyrillic letter, hyphen or
//! space, lower-case, split into words, reduce each word to its base form and
//! drop stop words. The output depends only on the input and the static
//! resources held by the normalizer.

use regex::Regex;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

use super::lemmatizer::{Lemmatizer, MorphologicalLemmatizer};
use super::stopwords::is_stopword;
use crate::error::AppError;

/// Tokens shorter than this are dropped before lemmatization.
const MIN_TOKEN_CHARS: usize = 2;

// Compile patterns once at startup
static GARBAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^А-Яа-яЁёA-Za-z\- ]").expect("Invalid regex: garbage pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("Invalid regex: whitespace pattern"));

pub struct Normalizer {
    lemmatizer: Box<dyn Lemmatizer>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a normalizer backed by the morphological lemmatizer.
    pub fn new() -> Self {
        Self::with_lemmatizer(Box::new(MorphologicalLemmatizer::new()))
    }

    pub fn with_lemmatizer(lemmatizer: Box<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }

    pub fn lemmatizer_name(&self) -> &'static str {
        self.lemmatizer.name()
    }

    /// Normalize text into base-form, stop-word-free tokens. May return an empty list.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let cleaned = remove_garbage(text);
        let lowered = cleaned.to_lowercase();

        tokenize(&lowered)
            .into_iter()
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .filter_map(|token| {
                let lemma = self.lemmatizer.lemma(&token);
                if lemma.is_empty() || is_stopword(&lemma) {
                    None
                } else {
                    Some(lemma)
                }
            })
            .collect()
    }

    /// Normalize raw transport bytes. Fails if they are not valid UTF-8.
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<Vec<String>, AppError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            AppError::Normalization(format!("Input is not valid UTF-8: {}", e))
        })?;
        Ok(self.normalize(text))
    }
}

/// Keep only Latin and Cyrillic letters, hyphens and spaces. Other whitespace
/// becomes a plain space so that line breaks still separate words.
fn remove_garbage(text: &str) -> String {
    let spaced = WHITESPACE.replace_all(text, " ");
    GARBAGE.replace_all(&spaced, "").into_owned()
}

/// Split on Unicode word boundaries, keeping hyphenated compounds
/// ("кто-то", "e-mail") as a single token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending_hyphen = false;

    for segment in text.split_word_bounds() {
        if segment.chars().all(char::is_alphabetic) {
            if !current.is_empty() {
                if pending_hyphen {
                    current.push('-');
                } else {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            current.push_str(segment);
            pending_hyphen = false;
        } else if segment == "-" && !current.is_empty() && !pending_hyphen {
            pending_hyphen = true;
        } else {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            pending_hyphen = false;
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
