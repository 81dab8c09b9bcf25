//! Reply selection for a decided intent.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::BotConfig;
use crate::error::AppError;

/// Pick one reply uniformly at random: from the intent's responses when an
/// intent was decided, from the failure phrases otherwise.
pub fn select_response<R: Rng + ?Sized>(
    intent: Option<&str>,
    config: &BotConfig,
    rng: &mut R,
) -> Result<String, AppError> {
    let candidates = match intent {
        Some(id) => {
            let entry = config.intents.get(id).ok_or_else(|| {
                AppError::Configuration(format!("No responses configured for intent '{}'", id))
            })?;
            &entry.responses
        }
        None => &config.failure_phrases,
    };

    candidates.choose(rng).cloned().ok_or_else(|| {
        AppError::Configuration(match intent {
            Some(id) => format!("Response list for intent '{}' is empty", id),
            None => "Failure phrase list is empty".to_string(),
        })
    })
}
