//! HTTP JSON-RPC executor.
//!
//! Posts each batch as a single `query` call to `<endpoint>/rpc`. Envelope
//! encoding and decoding live in the `queries` crate; this file only owns
//! the HTTP client and request headers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use queries::{QueryBatch, QueryResponse};

use super::executor::{QueryExecutor, TransportError};
use crate::config::ConnectionConfig;

const NAMESPACE_HEADER: &str = "surreal-ns";
const DATABASE_HEADER: &str = "surreal-db";

// =============================================================================
// CLIENT
// =============================================================================

pub struct RpcExecutor {
    http: reqwest::Client,
    url: String,
    config: ConnectionConfig,
    next_id: AtomicU64,
}

impl RpcExecutor {
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ConnectionConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { http, url: rpc_url(&config.endpoint), config, next_id: AtomicU64::new(1) })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl QueryExecutor for RpcExecutor {
    async fn execute(&self, batch: &QueryBatch) -> Result<Vec<QueryResponse>, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = queries::encode_rpc_request(id, batch);

        let mut request = self
            .http
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(NAMESPACE_HEADER, &self.config.namespace)
            .header(DATABASE_HEADER, &self.config.database)
            .json(&body);
        if let Some(user) = &self.config.username {
            request = request.basic_auth(user, self.config.password.as_ref());
        }

        tracing::debug!(id, statements = batch.len(), url = %self.url, "rpc query");
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if status != 200 {
            return Err(TransportError::Status { status, body: text });
        }

        Ok(queries::decode_rpc_response(&text, batch.len())?)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// `<endpoint>/rpc`, tolerating a trailing slash or an endpoint that already
/// names the rpc path.
#[must_use]
pub fn rpc_url(endpoint: &str) -> String {
    let base = endpoint.trim().trim_end_matches('/');
    if base.ends_with("/rpc") { base.to_owned() } else { format!("{base}/rpc") }
}

#[cfg(test)]
#[path = "rpc_test.rs"]
mod tests;
