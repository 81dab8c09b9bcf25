pub mod chat_bot;
pub mod messages;
pub mod traits;
