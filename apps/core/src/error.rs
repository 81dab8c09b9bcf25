use std::io;
use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// The input text could not be turned into tokens (e.g. it is not valid UTF-8).
    #[error("Normalization error: {0}")]
    Normalization(String),

    /// Typo correction or vocabulary lookup failed, usually a sign of a broken vocabulary.
    #[error("Vectorization error: {0}")]
    Vectorization(String),

    /// The network could not be evaluated or produced a malformed output.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Missing or inconsistent configuration, model artifacts included.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents errors specific to the actor system, such as communication failures.
    #[error("Actor error: {0}")]
    Actor(#[from] crate::actors::messages::ActorError),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// How loudly a failure must be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// A single bad message; the user gets a reserve reply.
    Recoverable,
    /// The model or decision layer misbehaved; possibly a corrupted artifact.
    Critical,
    /// The process cannot serve requests with this configuration.
    Fatal,
}

impl AppError {
    pub fn severity(&self) -> Severity {
        match self {
            AppError::Normalization(_) | AppError::Vectorization(_) | AppError::Validation(_) => {
                Severity::Recoverable
            }
            AppError::Classification(_) | AppError::Timeout(_) | AppError::Actor(_) => {
                Severity::Critical
            }
            AppError::Configuration(_) | AppError::Io(_) => Severity::Fatal,
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Normalization(s) => AppError::Normalization(s.clone()),
            AppError::Vectorization(s) => AppError::Vectorization(s.clone()),
            AppError::Classification(s) => AppError::Classification(s.clone()),
            AppError::Configuration(s) => AppError::Configuration(s.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Actor(e) => AppError::Actor(e.clone()),
            AppError::Timeout(s) => AppError::Timeout(s.clone()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(format!("Validation errors: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_levels() {
        assert_eq!(
            AppError::Normalization("bad bytes".into()).severity(),
            Severity::Recoverable
        );
        assert_eq!(
            AppError::Vectorization("empty vocabulary".into()).severity(),
            Severity::Recoverable
        );
        assert_eq!(
            AppError::Classification("NaN".into()).severity(),
            Severity::Critical
        );
        assert_eq!(
            AppError::Configuration("no phrases".into()).severity(),
            Severity::Fatal
        );
        assert!(Severity::Critical > Severity::Recoverable);
    }

    #[test]
    fn test_clone_keeps_message() {
        let err = AppError::Io(io::Error::new(io::ErrorKind::NotFound, "words.json"));
        let cloned = err.clone();
        assert!(cloned.to_string().contains("words.json"));
    }
}
