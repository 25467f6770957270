//! Error types for the chat system.

use thiserror::Error;

use crate::state_machine::TransitionError;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat system errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// The remote model call could not be completed (network, auth, malformed response)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The feedback sink failed to store a record
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM not configured. Set GROQ_API_KEY")]
    LlmNotConfigured,

    /// The session state machine rejected the event
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChatError {
    /// Whether this error came from the remote model provider
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::LlmNotConfigured)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChatError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(format!("invalid YAML: {}", err))
    }
}
