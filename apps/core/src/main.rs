// Chat bot entry point
// Wires the intent engine to a console transport.

use anyhow::{bail, Context};
use chatbot_core::actors::chat_bot::ChatBotHandle;
use chatbot_core::brain::IntentEngine;
use chatbot_core::config::{LogFormat, Settings};
use chatbot_core::console;
use chatbot_core::fs_manager::PortablePathManager;
use chatbot_core::journal::{ConversationJournal, JournalHandle};
use chatbot_core::preflight::run_preflight_checks;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr; stdout carries replies.
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env().context("Invalid environment settings")?;
    init_tracing(settings.log_format);

    if let Err(e) = PortablePathManager::init() {
        error!("Failed to initialize directories: {}", e);
    }

    let report = run_preflight_checks(&settings);
    if !report.ready_to_start {
        bail!("{}", report.summary);
    }

    let engine = Arc::new(IntentEngine::from_settings(&settings).context("Failed to load intent engine")?);
    let journal = JournalHandle::spawn(ConversationJournal::open(&settings.journal_path));
    let bot = ChatBotHandle::new(engine, settings.inference_timeout, Some(journal.clone()));

    info!("Chat bot ready, reading messages from stdin");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let served = console::serve(&bot, stdin, tokio::io::stdout()).await;

    let _ = bot.shutdown().await;
    journal.flush().await;

    let replies = served.context("Console transport failed")?;
    info!("Chat bot stopped after {} replies", replies);
    Ok(())
}
