use tokio::sync::oneshot;
use uuid::Uuid;

use crate::brain::engine::Reply;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ActorError {
    /// The actor's mailbox is closed or the reply channel was dropped.
    #[error("Actor unavailable: {0}")]
    Closed(String),
    /// No reply arrived within the handle's reply window.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("No reply from the actor: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Payload of an incoming message as it arrived from the transport.
#[derive(Debug, Clone)]
pub enum Utterance {
    Text(String),
    Bytes(Vec<u8>),
}

impl Utterance {
    /// Lossy text form, for logs and the journal.
    pub fn display_text(&self) -> String {
        match self {
            Utterance::Text(text) => text.clone(),
            Utterance::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Messages that can be sent to the `ChatBotActor`.
#[derive(Debug)]
pub enum BotMessage {
    /// Classify one incoming message and pick a reply.
    Respond {
        request_id: Uuid,
        utterance: Utterance,
        /// Per-call threshold; the configured one when `None`.
        threshold: Option<f32>,
        /// A channel to send the reply back.
        responder: oneshot::Sender<Result<Reply, AppError>>,
    },
    /// Stop the actor. Requests already in flight still complete.
    Shutdown,
}
