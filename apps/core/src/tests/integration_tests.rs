//! Integration Tests
//!
//! End-to-end tests over a deployment written to disk: settings, preflight,
//! artifact loading, the actor, the console transport and the journal.

use crate::actors::chat_bot::ChatBotHandle;
use crate::brain::engine::{IntentEngine, Outcome};
use crate::config::{LogFormat, Settings};
use crate::console;
use crate::error::AppError;
use crate::fs_manager::{
    CONFIG_FILENAME, INTENTS_FILENAME, LEMMAS_FILENAME, NETWORK_FILENAME, VOCABULARY_FILENAME,
};
use crate::journal::{read_entries, ConversationJournal, JournalHandle};
use crate::preflight::run_preflight_checks;
use crate::tests::fixtures::{self, FAILURE, GREETINGS, WEATHER};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Write a complete deployment under a temp root and return its settings.
fn deployment() -> (TempDir, Settings) {
    let dir = tempdir().expect("Failed to create temp dir");
    let root = dir.path();
    let models = root.join("models");
    let settings_dir = root.join("settings");
    fs::create_dir_all(&models).unwrap();
    fs::create_dir_all(&settings_dir).unwrap();

    write_json(&models.join(VOCABULARY_FILENAME), &fixtures::vocabulary());
    write_json(&models.join(INTENTS_FILENAME), &fixtures::intents());
    write_json(&models.join(NETWORK_FILENAME), &fixtures::network());
    fs::write(
        models.join(LEMMAS_FILENAME),
        r#"{"приветик": "привет", "погоды": "погода", "погоду": "погода", "погода": "погода"}"#,
    )
    .unwrap();
    write_json(&settings_dir.join(CONFIG_FILENAME), &fixtures::bot_config());

    let settings = Settings {
        config_path: settings_dir.join(CONFIG_FILENAME),
        models_dir: models,
        journal_path: root.join("logs").join("incoming.log"),
        threshold_override: None,
        inference_timeout: Duration::from_secs(2),
        log_format: LogFormat::Pretty,
    };
    (dir, settings)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn test_engine_from_disk_uses_lemma_dictionary() {
    let (_dir, settings) = deployment();

    let report = run_preflight_checks(&settings);
    assert!(report.ready_to_start, "{}", report.summary);

    let engine = IntentEngine::from_settings(&settings).unwrap();
    let mut rng = StdRng::seed_from_u64(4);

    let reply = engine.respond("Приветик!", None, &mut rng).unwrap();
    assert_eq!(reply.intent.as_deref(), Some("greeting"));
    assert!(GREETINGS.contains(&reply.text.as_str()));

    let reply = engine.respond("Что с погодой? Какой прогноз погоды", None, &mut rng).unwrap();
    assert_eq!(reply.intent.as_deref(), Some("weather"));
}

#[test]
fn test_threshold_override_applies_to_engine() {
    let (_dir, mut settings) = deployment();
    settings.threshold_override = Some(0.999);

    let engine = IntentEngine::from_settings(&settings).unwrap();
    assert_eq!(engine.config().threshold, 0.999);

    let mut rng = StdRng::seed_from_u64(0);
    let reply = engine.respond("привет", None, &mut rng).unwrap();
    assert_eq!(reply.outcome, Outcome::Unrecognized);
}

#[test]
fn test_inconsistent_deployment_refuses_to_start() {
    let (_dir, settings) = deployment();
    write_json(
        &settings.models_dir.join(VOCABULARY_FILENAME),
        &vec!["привет", "погода", "помощь"],
    );

    assert!(!run_preflight_checks(&settings).ready_to_start);
    assert!(matches!(
        IntentEngine::from_settings(&settings),
        Err(AppError::Configuration(_))
    ));
}

// ============================================================================
// Serving
// ============================================================================

#[tokio::test]
async fn test_console_session_is_journaled() {
    let (_dir, settings) = deployment();

    let engine = Arc::new(IntentEngine::from_settings(&settings).unwrap());
    let journal = JournalHandle::spawn(ConversationJournal::open(&settings.journal_path));
    let bot = ChatBotHandle::new(engine, settings.inference_timeout, Some(journal.clone()));

    let input: &[u8] = "привет\nкакая пагода\n12345\n".as_bytes();
    let mut output = Vec::new();
    let served = console::serve(&bot, input, &mut output).await.unwrap();
    assert_eq!(served, 3);

    let output = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(GREETINGS.contains(&lines[0]));
    assert_eq!(lines[1], WEATHER[0]);
    assert!(FAILURE.contains(&lines[2]));

    journal.flush().await;
    let entries = read_entries(&settings.journal_path);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].intent.as_deref(), Some("greeting"));
    assert_eq!(entries[1].text, "какая пагода");
    assert_eq!(entries[2].outcome, Outcome::Unrecognized);
    assert_ne!(entries[0].request_id, entries[1].request_id);
}
