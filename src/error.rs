//! Error taxonomy for inspector operations.
//!
//! None of these escape to the host: the inspector converts each one into
//! inline state (an error message next to the editor, a missing-record view).

use crate::net::executor::TransportError;

/// Errors produced while fetching, saving, or deleting a record.
#[derive(Debug, thiserror::Error)]
pub enum InspectorError {
    /// The transport could not complete the round trip.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A statement ran and the database rejected it.
    #[error("{message}")]
    Query { message: String },

    /// The transport answered with fewer results than statements sent.
    #[error("expected {expected} statement results, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },

    /// The edited body is not a JSON object.
    #[error("record body is not a valid object")]
    InvalidBody,

    /// The operation needs a targeted record.
    #[error("no record selected")]
    NoRecord,
}

impl InspectorError {
    /// Grepable error code for logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Query { .. } => "E_QUERY",
            Self::MalformedResponse { .. } => "E_MALFORMED_RESPONSE",
            Self::InvalidBody => "E_INVALID_BODY",
            Self::NoRecord => "E_NO_RECORD",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
