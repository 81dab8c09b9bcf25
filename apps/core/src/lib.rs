// Chat bot core: intent classification engine and its message-handling actor.

pub mod actors;
pub mod brain;
pub mod config;
pub mod console;
pub mod error;
pub mod fs_manager;
pub mod journal;
pub mod preflight;

#[cfg(test)]
mod tests;
