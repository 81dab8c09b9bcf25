//! Preflight Check System
//!
//! Verifies the configuration and model artifacts before the bot starts
//! serving. Nothing is assumed: every file is read and every cross-file
//! constraint is checked, so a broken deployment fails here instead of on the
//! first message.

use crate::brain::artifacts::ModelArtifacts;
use crate::brain::lemmatizer::{DictionaryLemmatizer, IdentityLemmatizer};
use crate::config::{BotConfig, Settings};
use crate::fs_manager::{INTENTS_FILENAME, LEMMAS_FILENAME, NETWORK_FILENAME, VOCABULARY_FILENAME};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Result of a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete preflight check report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
    pub ready_to_start: bool,
    pub summary: String,
}

impl PreflightReport {
    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Performs all preflight checks and returns a report.
pub fn run_preflight_checks(settings: &Settings) -> PreflightReport {
    info!("Running preflight checks");

    let mut checks = vec![check_directories(settings)];

    let config = match BotConfig::load(&settings.config_path) {
        Ok(config) => {
            checks.push(CheckResult::pass(
                "config",
                &format!("{} intents configured", config.intents.len()),
            ));
            Some(config)
        }
        Err(e) => {
            checks.push(CheckResult::fail(
                "config",
                "Bot config is missing or invalid",
                Some(e.to_string()),
            ));
            None
        }
    };

    let files_check = check_artifact_files(settings);
    let files_present = files_check.passed;
    checks.push(files_check);

    let artifacts = if files_present {
        match ModelArtifacts::load(&settings.models_dir) {
            Ok(artifacts) => {
                checks.push(CheckResult::pass(
                    "artifacts_load",
                    &format!(
                        "{} words, {} intents",
                        artifacts.vocabulary().len(),
                        artifacts.intents().len()
                    ),
                ));
                Some(artifacts)
            }
            Err(e) => {
                checks.push(CheckResult::fail(
                    "artifacts_load",
                    "Model artifacts are inconsistent",
                    Some(e.to_string()),
                ));
                None
            }
        }
    } else {
        checks.push(CheckResult::fail(
            "artifacts_load",
            "Skipped - artifact files missing",
            None,
        ));
        None
    };

    checks.push(match (&config, &artifacts) {
        (Some(config), Some(artifacts)) => match config.ensure_covers(artifacts.intents()) {
            Ok(()) => CheckResult::pass("intent_coverage", "Every intent has responses"),
            Err(e) => CheckResult::fail(
                "intent_coverage",
                "Some intents have no responses",
                Some(e.to_string()),
            ),
        },
        _ => CheckResult::fail(
            "intent_coverage",
            "Skipped - config or artifacts unavailable",
            None,
        ),
    });

    checks.push(check_lemma_dictionary(settings));

    let ready_to_start = checks.iter().all(|c| c.passed);
    let summary = if ready_to_start {
        "All checks passed. Bot ready.".to_string()
    } else {
        format!(
            "{} of {} checks failed. Bot cannot start.",
            checks.iter().filter(|c| !c.passed).count(),
            checks.len()
        )
    };

    for check in &checks {
        if check.passed {
            info!("  [ok] {}: {}", check.name, check.message);
        } else {
            warn!("  [failed] {}: {}", check.name, check.message);
            if let Some(details) = &check.details {
                warn!("      Details: {}", details);
            }
        }
    }
    info!("Summary: {}", summary);

    PreflightReport {
        checks,
        ready_to_start,
        summary,
    }
}

// --- Individual Checks ---

fn check_directories(settings: &Settings) -> CheckResult {
    if !settings.models_dir.is_dir() {
        return CheckResult::fail(
            "directories",
            "Models directory not found",
            Some(format!("{:?}", settings.models_dir)),
        );
    }

    match settings.journal_path.parent() {
        Some(logs) if !logs.exists() => match fs::create_dir_all(logs) {
            Ok(()) => CheckResult::pass(
                "directories",
                &format!("Created logs directory {:?}", logs),
            ),
            Err(e) => CheckResult::fail(
                "directories",
                "Failed to create logs directory",
                Some(e.to_string()),
            ),
        },
        _ => CheckResult::pass("directories", "All directories exist"),
    }
}

fn check_artifact_files(settings: &Settings) -> CheckResult {
    let missing: Vec<&str> = [VOCABULARY_FILENAME, INTENTS_FILENAME, NETWORK_FILENAME]
        .into_iter()
        .filter(|name| !settings.models_dir.join(name).is_file())
        .collect();

    if missing.is_empty() {
        CheckResult::pass("artifact_files", "All artifact files present")
    } else {
        CheckResult::fail(
            "artifact_files",
            "Artifact files missing",
            Some(missing.join(", ")),
        )
    }
}

fn check_lemma_dictionary(settings: &Settings) -> CheckResult {
    let path = settings.models_dir.join(LEMMAS_FILENAME);
    if !path.exists() {
        return CheckResult::pass("lemma_dictionary", "Not present, morphology only");
    }

    match DictionaryLemmatizer::from_file(&path, Box::new(IdentityLemmatizer)) {
        Ok(dictionary) => CheckResult::pass(
            "lemma_dictionary",
            &format!("{} word forms", dictionary.len()),
        ),
        Err(e) => CheckResult::fail(
            "lemma_dictionary",
            "Lemma dictionary is invalid",
            Some(e.to_string()),
        ),
    }
}
