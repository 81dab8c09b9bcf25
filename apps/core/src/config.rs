//! Bot configuration and process settings.
//!
//! `BotConfig` is the JSON file holding the threshold and canned replies.
//! `Settings` gathers everything that comes from the environment (`.env`
//! included) and points at the config file and model artifacts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;

pub const CONFIG_ENV: &str = "CHATBOT_CONFIG";
pub const MODELS_DIR_ENV: &str = "CHATBOT_MODELS_DIR";
pub const THRESHOLD_ENV: &str = "CHATBOT_THRESHOLD";
pub const TIMEOUT_ENV: &str = "CHATBOT_INFERENCE_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "CHATBOT_LOG_FORMAT";

const DEFAULT_INFERENCE_TIMEOUT_MS: u64 = 5_000;

/// Candidate replies for one intent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IntentResponses {
    #[validate(length(min = 1))]
    pub responses: Vec<String>,
}

/// Replies and threshold, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BotConfig {
    /// Minimum probability an intent must strictly exceed.
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f32,
    /// Replies per intent id.
    pub intents: BTreeMap<String, IntentResponses>,
    /// Reserve replies used when no intent clears the threshold.
    #[validate(length(min = 1))]
    pub failure_phrases: Vec<String>,
}

impl BotConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Cannot read config {:?}: {}", path, e))
        })?;
        let config: BotConfig = serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!("Invalid config {:?}: {}", path, e))
        })?;
        config.check()?;
        info!(
            "Loaded bot config from {:?}: {} intents, {} failure phrases, threshold {}",
            path,
            config.intents.len(),
            config.failure_phrases.len(),
            config.threshold
        );
        Ok(config)
    }

    /// Validate field constraints, including the per-intent response lists.
    pub fn check(&self) -> Result<(), AppError> {
        validate_threshold(self.threshold).map_err(|e| match e {
            AppError::Validation(msg) => AppError::Configuration(msg),
            other => other,
        })?;
        self.validate()?;
        for (intent, responses) in &self.intents {
            responses.validate().map_err(|e| {
                AppError::Configuration(format!("Intent '{}': {}", intent, e))
            })?;
        }
        Ok(())
    }

    /// Every intent the model can produce must have replies configured.
    pub fn ensure_covers(&self, intent_table: &[String]) -> Result<(), AppError> {
        let missing: Vec<&str> = intent_table
            .iter()
            .filter(|id| !self.intents.contains_key(id.as_str()))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "No responses configured for intents: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Reject thresholds outside `[0, 1]`, NaN included.
pub fn validate_threshold(threshold: f32) -> Result<f32, AppError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(AppError::Validation(format!(
            "Threshold must be within [0, 1], got {}",
            threshold
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Process settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub models_dir: PathBuf,
    pub journal_path: PathBuf,
    pub threshold_override: Option<f32>,
    pub inference_timeout: Duration,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let config_path = env_path(CONFIG_ENV).unwrap_or_else(PortablePathManager::config_path);
        let models_dir = env_path(MODELS_DIR_ENV).unwrap_or_else(PortablePathManager::models_dir);

        let threshold_override = match env_value(THRESHOLD_ENV) {
            Some(raw) => {
                let value: f32 = raw.parse().map_err(|_| {
                    AppError::Configuration(format!("{} is not a number: {}", THRESHOLD_ENV, raw))
                })?;
                Some(validate_threshold(value).map_err(|e| AppError::Configuration(e.to_string()))?)
            }
            None => None,
        };

        let inference_timeout = match env_value(TIMEOUT_ENV) {
            Some(raw) => {
                let ms: u64 = raw.parse().map_err(|_| {
                    AppError::Configuration(format!("{} is not a number: {}", TIMEOUT_ENV, raw))
                })?;
                if ms == 0 {
                    return Err(AppError::Configuration(format!("{} must be positive", TIMEOUT_ENV)));
                }
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_INFERENCE_TIMEOUT_MS),
        };

        let log_format = match env_value(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            config_path,
            models_dir,
            journal_path: PortablePathManager::journal_path(),
            threshold_override,
            inference_timeout,
            log_format,
        })
    }

    /// Load the bot config, applying the threshold override if one is set.
    pub fn load_bot_config(&self) -> Result<BotConfig, AppError> {
        let mut config = BotConfig::load(&self.config_path)?;
        if let Some(threshold) = self.threshold_override {
            info!("Threshold overridden from environment: {}", threshold);
            config.threshold = threshold;
        }
        Ok(config)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(PathBuf::from)
}
