//! Error types for confbook

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for confbook
#[derive(Debug, Error)]
pub enum ConfbookError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Comment not found
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Conference not found
    #[error("Conference not found: {0}")]
    ConferenceNotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transition name not defined by the workflow
    #[error("Unknown transition: {0}")]
    UnknownTransition(String),

    /// Transition not enabled from the current state
    #[error("Transition '{transition}' is not allowed from state '{state}'")]
    IllegalTransition { state: String, transition: String },

    /// Review requested for a comment outside the reviewable states
    #[error("Comment already reviewed or not in the right state.")]
    AlreadyReviewed(String),

    /// Storing an attached photo failed
    #[error("Photo storage error: {0}")]
    PhotoStorage(String),

    /// Handing a message to the outbound queue failed
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Sending a user-facing notification failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// External command error
    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ConfbookError>,
    },
}

impl ConfbookError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ConfbookError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers
    pub fn root(&self) -> &ConfbookError {
        match self {
            ConfbookError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error was caused by the caller rather than the system
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.root(),
            ConfbookError::Validation(_)
                | ConfbookError::UnknownTransition(_)
                | ConfbookError::IllegalTransition { .. }
                | ConfbookError::AlreadyReviewed(_)
        )
    }
}

/// Result type alias for confbook
pub type Result<T> = std::result::Result<T, ConfbookError>;
