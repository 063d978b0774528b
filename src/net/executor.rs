//! Executor trait shared by the inspector and its transports.

use queries::{QueryBatch, QueryError, QueryResponse};

/// Failures below the query layer: the round trip itself did not complete.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Protocol(#[from] QueryError),
    #[error("{0}")]
    Other(String),
}

/// Runs a batch as one round trip.
///
/// Implementations return exactly one [`QueryResponse`] per statement, in
/// statement order. A statement the database rejected is a response with
/// `success == false`, not a `TransportError`.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, batch: &QueryBatch) -> Result<Vec<QueryResponse>, TransportError>;
}
