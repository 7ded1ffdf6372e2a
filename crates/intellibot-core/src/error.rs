//! Error taxonomy for the pipeline.
//!
//! An empty document or an empty chunk collection is never an error: it
//! yields an empty retrieval and the query passes through unchanged.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by core operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Segmentation parameters that would produce no chunks or never terminate.
    #[error("invalid chunking parameters (chunk_size={chunk_size}, overlap={overlap}): {reason}")]
    InvalidChunking {
        chunk_size: usize,
        overlap: usize,
        reason: &'static str,
    },

    /// The model endpoint failed during a turn.
    ///
    /// `recorded` tells the caller whether the user's message is already in
    /// the history. Sessions keep the message, so this is `true` for every
    /// failure raised by [`Session::turn`](crate::session::Session::turn).
    #[error("model endpoint failed (user message recorded: {recorded}): {source}")]
    Endpoint {
        recorded: bool,
        #[source]
        source: ModelError,
    },
}

impl ChatError {
    pub fn is_endpoint(&self) -> bool {
        matches!(self, ChatError::Endpoint { .. })
    }
}

/// Failures reported by a [`ChatModel`](crate::session::ChatModel) implementation.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("endpoint returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ModelError {
    /// Whether a collaborator that owns the network call may retry.
    ///
    /// Rate limiting (429), server errors (5xx), timeouts and transport
    /// failures are transient; everything else is not.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Transport(_) | ModelError::Timeout(_) => true,
            ModelError::Api { status, .. } => *status == 429 || *status >= 500,
            ModelError::Auth { .. } | ModelError::Malformed(_) => false,
        }
    }
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
