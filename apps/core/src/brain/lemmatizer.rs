//! Reduction of word forms to a canonical base form.
//!
//! The default lemmatizer runs Cyrillic words through an OpenCorpora-based
//! morphological analyzer and takes the normal form of the most probable
//! parse. Latin words, and Cyrillic words the analyzer has nothing for, fall
//! back to Snowball stemming. A word-form dictionary shipped with the model
//! artifacts can be layered on top to pin lemmas for known forms.

use rsmorphy::prelude::*;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use crate::error::AppError;

/// Trait for base-form reduction algorithms.
pub trait Lemmatizer: Send + Sync {
    /// Reduce a lower-cased word to its base form.
    fn lemma(&self, word: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

/// Returns words unchanged.
#[derive(Debug, Clone, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemma(&self, word: &str) -> String {
        word.to_string()
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Script-aware Snowball reduction for Russian and English.
pub struct SnowballLemmatizer {
    russian: Stemmer,
    english: Stemmer,
}

impl Default for SnowballLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SnowballLemmatizer {
    pub fn new() -> Self {
        Self {
            russian: Stemmer::create(Algorithm::Russian),
            english: Stemmer::create(Algorithm::English),
        }
    }
}

pub(crate) fn is_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

impl Lemmatizer for SnowballLemmatizer {
    fn lemma(&self, word: &str) -> String {
        if word.chars().any(is_cyrillic) {
            self.russian.stem(word).into_owned()
        } else {
            self.english.stem(word).into_owned()
        }
    }

    fn name(&self) -> &'static str {
        "snowball"
    }
}

// Loading the dictionaries takes a while; every normalizer shares one analyzer.
static RUSSIAN_MORPHOLOGY: LazyLock<MorphAnalyzer> = LazyLock::new(|| {
    info!("Loading Russian morphology dictionaries");
    MorphAnalyzer::from_file(rsmorphy_dict_ru::DICT_PATH)
});

/// Dictionary lemmas for Russian, Snowball stems for everything else.
pub struct MorphologicalLemmatizer {
    fallback: SnowballLemmatizer,
}

impl Default for MorphologicalLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphologicalLemmatizer {
    pub fn new() -> Self {
        LazyLock::force(&RUSSIAN_MORPHOLOGY);
        Self {
            fallback: SnowballLemmatizer::new(),
        }
    }

    fn normal_form(word: &str) -> Option<String> {
        let morph = &*RUSSIAN_MORPHOLOGY;
        morph
            .parse(word)
            .first()
            .map(|parsed| parsed.lex.get_normal_form(morph).to_string().to_lowercase())
            .filter(|lemma| !lemma.is_empty())
    }
}

impl Lemmatizer for MorphologicalLemmatizer {
    fn lemma(&self, word: &str) -> String {
        if word.chars().any(is_cyrillic) {
            if let Some(lemma) = Self::normal_form(word) {
                return lemma;
            }
        }
        self.fallback.lemma(word)
    }

    fn name(&self) -> &'static str {
        "morphological"
    }
}

/// Looks word forms up in a form → lemma table and defers to another
/// lemmatizer for unknown forms.
pub struct DictionaryLemmatizer {
    forms: HashMap<String, String>,
    fallback: Box<dyn Lemmatizer>,
}

impl DictionaryLemmatizer {
    pub fn new(forms: HashMap<String, String>, fallback: Box<dyn Lemmatizer>) -> Self {
        let forms = forms
            .into_iter()
            .map(|(form, lemma)| (form.to_lowercase(), lemma.to_lowercase()))
            .collect();
        Self { forms, fallback }
    }

    /// Load a JSON object mapping word forms to lemmas.
    pub fn from_file(path: &Path, fallback: Box<dyn Lemmatizer>) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        let forms: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!("Invalid lemma dictionary {:?}: {}", path, e))
        })?;
        info!("Loaded {} word forms from {:?}", forms.len(), path);
        Ok(Self::new(forms, fallback))
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn lemma(&self, word: &str) -> String {
        match self.forms.get(word) {
            Some(lemma) => lemma.clone(),
            None => self.fallback.lemma(word),
        }
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_identity_lemmatizer() {
        let lemmatizer = IdentityLemmatizer;
        assert_eq!(lemmatizer.lemma("погоды"), "погоды");
        assert_eq!(lemmatizer.name(), "identity");
    }

    #[test]
    fn test_snowball_picks_algorithm_by_script() {
        let lemmatizer = SnowballLemmatizer::new();

        assert_eq!(lemmatizer.lemma("running"), "run");
        assert_eq!(lemmatizer.lemma("привет"), "привет");
        // Inflected forms of the same noun collapse together
        assert_eq!(lemmatizer.lemma("погоды"), lemmatizer.lemma("погоде"));
    }

    #[test]
    fn test_morphology_returns_dictionary_forms() {
        let lemmatizer = MorphologicalLemmatizer::new();

        assert_eq!(lemmatizer.lemma("работать"), "работать");
        assert_eq!(lemmatizer.lemma("работаю"), "работать");
        assert_eq!(lemmatizer.lemma("работы"), "работа");
        assert_eq!(lemmatizer.lemma("дня"), "день");
        assert_eq!(lemmatizer.lemma("люди"), "человек");
        assert_eq!(lemmatizer.lemma("погоду"), "погода");
    }

    #[test]
    fn test_morphology_stems_latin_words() {
        let lemmatizer = MorphologicalLemmatizer::new();

        assert_eq!(lemmatizer.lemma("running"), "run");
        assert_eq!(lemmatizer.name(), "morphological");
    }

    #[test]
    fn test_dictionary_overrides_fallback() {
        let mut forms = HashMap::new();
        forms.insert("Погоды".to_string(), "погода".to_string());
        let lemmatizer = DictionaryLemmatizer::new(forms, Box::new(IdentityLemmatizer));

        assert_eq!(lemmatizer.lemma("погоды"), "погода");
        assert_eq!(lemmatizer.lemma("снег"), "снег");
        assert_eq!(lemmatizer.len(), 1);
    }

    #[test]
    fn test_dictionary_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"люди": "человек", "shoes": "shoe"}}"#).unwrap();

        let lemmatizer =
            DictionaryLemmatizer::from_file(file.path(), Box::new(IdentityLemmatizer)).unwrap();
        assert_eq!(lemmatizer.lemma("люди"), "человек");
        assert_eq!(lemmatizer.lemma("shoes"), "shoe");
    }

    #[test]
    fn test_dictionary_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        let result = DictionaryLemmatizer::from_file(file.path(), Box::new(IdentityLemmatizer));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
