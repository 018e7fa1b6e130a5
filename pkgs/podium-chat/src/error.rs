//! Error types for chat operations

use thiserror::Error;

/// Errors that can occur in chat store operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Rejected input: blank content, unknown sender, no active selection
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    pub(crate) fn conversation_not_found(id: &str) -> Self {
        Self::NotFound(format!("conversation '{}'", id))
    }

    /// True for the caller-facing validation failures
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
