use crate::actors::messages::AppError;
use async_trait::async_trait;

/// Defines the public interface of the chat bot as seen by a transport.
///
/// The transport hands over the text of one incoming message and gets back the
/// reply to deliver. Implemented by `ChatBotHandle`; tests substitute mocks.
#[async_trait]
pub trait ChatResponder: Send + Sync + 'static {
    /// Classify a message and return the reply text.
    async fn classify_and_respond(
        &self,
        text: String,
        threshold: Option<f32>,
    ) -> Result<String, AppError>;

    /// Same as `classify_and_respond` for raw bytes that may not be valid UTF-8.
    async fn respond_bytes(
        &self,
        bytes: Vec<u8>,
        threshold: Option<f32>,
    ) -> Result<String, AppError>;
}
