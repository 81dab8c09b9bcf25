use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable pointing at the bot's root directory.
pub const HOME_ENV: &str = "CHATBOT_HOME";

pub const VOCABULARY_FILENAME: &str = "words.json";
pub const INTENTS_FILENAME: &str = "intents.json";
pub const NETWORK_FILENAME: &str = "perceptron.json";
pub const LEMMAS_FILENAME: &str = "lemmas.json";
pub const CONFIG_FILENAME: &str = "bot_config.json";
pub const JOURNAL_FILENAME: &str = "incoming.log";

pub struct PortablePathManager;

impl PortablePathManager {
    /// Root directory of the bot: `$CHATBOT_HOME` if set, else the working directory.
    pub fn root_dir() -> PathBuf {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(home);
        }
        match std::env::current_dir() {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to get current directory: {}. Falling back to '.'", e);
                PathBuf::from(".")
            }
        }
    }

    /// Settings directory (./settings).
    pub fn settings_dir() -> PathBuf {
        Self::root_dir().join("settings")
    }

    /// Model artifacts directory (./models).
    pub fn models_dir() -> PathBuf {
        Self::root_dir().join("models")
    }

    /// Log directory (./logs).
    pub fn logs_dir() -> PathBuf {
        Self::root_dir().join("logs")
    }

    pub fn config_path() -> PathBuf {
        Self::settings_dir().join(CONFIG_FILENAME)
    }

    pub fn journal_path() -> PathBuf {
        Self::logs_dir().join(JOURNAL_FILENAME)
    }

    /// Create the writable directories if they are missing.
    pub fn init() -> Result<(), std::io::Error> {
        let logs_path = Self::logs_dir();
        if !logs_path.exists() {
            info!("Creating logs directory: {:?}", logs_path);
            fs::create_dir_all(&logs_path)?;
        }
        Ok(())
    }
}
