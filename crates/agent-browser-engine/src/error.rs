//! Engine error classification.
//!
//! CDP failures come back as free-text messages; the classifier buckets them
//! so callers can decide whether to retry, re-resolve, or give up.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("No element matches '{0}'")]
    NodeNotFound(String),

    /// Layout moved under us, or the node briefly had no geometry. Retryable.
    #[error("Element is not stable: {0}")]
    Transient(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Unknown stealth profile '{0}'. Valid profiles: off, minimal, moderate, maximum")]
    UnknownStealthProfile(String),

    #[error("Browser error: {0}")]
    Cdp(String),
}

impl EngineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Transient(_))
    }

    /// Buckets a raw CDP error message by its content. Chrome does not give
    /// us structured error codes for DOM races, only message text.
    pub fn classify(message: String) -> Self {
        let lower = message.to_lowercase();
        let transient_markers = [
            "box model",
            "detached",
            "node is not",
            "coordinates",
            "cannot find context",
            "no layout",
        ];
        let missing_markers = ["could not find node", "no node with given id", "not found"];

        if transient_markers.iter().any(|m| lower.contains(m)) {
            EngineError::Transient(message)
        } else if missing_markers.iter().any(|m| lower.contains(m)) {
            EngineError::NodeNotFound(message)
        } else {
            EngineError::Cdp(message)
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
