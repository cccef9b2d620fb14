//! Errors raised by a single storage node.

use thiserror::Error;

/// Failure signals a document store distinguishes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The document does not exist (or was deleted).
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The supplied revision does not match the stored one.
    #[error("Update conflict on document: {0}")]
    Conflict(String),

    /// Network failure, timeout, or an unexpected response status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a body that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether the failure may be resolved by asking another node.
    ///
    /// `NotFound` and `Conflict` are authoritative answers about the data.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Decode(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}
