//! Statement batches and the JSON-RPC envelope for the remote query transport.
//!
//! This crate owns the wire representation shared by the inspector and the
//! transports that execute its statements. A batch is an ordered list of
//! statements plus named bindings; the server answers with one
//! [`QueryResponse`] per statement, in statement order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wrapper the database prepends to statement error messages.
pub const DATABASE_ERROR_PREFIX: &str = "There was a problem with the database: ";

/// Binding name used for record content in update statements.
pub const BODY_BINDING: &str = "body";

/// Error returned by [`decode_rpc_response`].
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The response body is not a valid RPC envelope.
    #[error("failed to decode rpc response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The server rejected the whole request.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The envelope carried neither a result nor an error.
    #[error("rpc response has no result")]
    MissingResult,
    /// The number of statement results does not match the batch.
    #[error("expected {expected} statement results, got {actual}")]
    StatementCount { expected: usize, actual: usize },
}

/// Ordered statements submitted together as one round trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryBatch {
    statements: Vec<String>,
    bindings: Map<String, Value>,
}

impl QueryBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement to the batch.
    #[must_use]
    pub fn statement(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Bind a named variable referenced as `$name` by the statements.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    #[must_use]
    pub fn bindings(&self) -> &Map<String, Value> {
        &self.bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render the batch as a single `;`-separated query string.
    #[must_use]
    pub fn render(&self) -> String {
        self.statements.join(";")
    }
}

/// Outcome of one statement in a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub result: Value,
}

impl QueryResponse {
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self { success: true, result }
    }

    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self { success: false, result: Value::String(message.into()) }
    }

    /// Display message for a failed statement, without the database wrapper.
    ///
    /// Returns `None` for successful statements.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        let message = match &self.result {
            Value::String(text) => strip_error_prefix(text).to_owned(),
            Value::Null => "query failed".to_owned(),
            other => other.to_string(),
        };
        Some(message)
    }
}

/// Strip the database wrapper prefix from an error message, if present.
#[must_use]
pub fn strip_error_prefix(message: &str) -> &str {
    message.strip_prefix(DATABASE_ERROR_PREFIX).unwrap_or(message)
}

// =============================================================================
// STATEMENTS
// =============================================================================

/// Content, inbound links, and outbound links of one record, in that order.
#[must_use]
pub fn fetch_record_batch(record: &str) -> QueryBatch {
    QueryBatch::new()
        .statement(format!("SELECT * FROM ONLY {record}"))
        .statement(format!("SELECT VALUE <-? FROM ONLY {record}"))
        .statement(format!("SELECT VALUE ->? FROM ONLY {record}"))
}

/// Replace the content of one record with `body`.
#[must_use]
pub fn update_content_batch(record: &str, body: Value) -> QueryBatch {
    QueryBatch::new()
        .statement(format!("UPDATE {record} CONTENT ${BODY_BINDING}"))
        .bind(BODY_BINDING, body)
}

#[must_use]
pub fn delete_record_batch(record: &str) -> QueryBatch {
    QueryBatch::new().statement(format!("DELETE {record}"))
}

// =============================================================================
// RPC ENVELOPE
// =============================================================================

#[derive(Serialize)]
struct RpcRequest<'a> {
    id: u64,
    method: &'static str,
    params: (String, &'a Map<String, Value>),
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Deserialize)]
struct RpcFault {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct StatementResult {
    status: String,
    #[serde(default)]
    result: Value,
}

/// Encode a batch as a JSON-RPC `query` call.
#[must_use]
pub fn encode_rpc_request(id: u64, batch: &QueryBatch) -> Value {
    let request = RpcRequest { id, method: "query", params: (batch.render(), batch.bindings()) };
    serde_json::to_value(request).unwrap_or(Value::Null)
}

/// Decode a JSON-RPC response into one [`QueryResponse`] per statement.
///
/// # Errors
///
/// Returns [`QueryError::Rpc`] when the server rejected the request,
/// [`QueryError::StatementCount`] when the result count differs from
/// `expected`, and [`QueryError::Decode`] for malformed bodies.
pub fn decode_rpc_response(body: &str, expected: usize) -> Result<Vec<QueryResponse>, QueryError> {
    let envelope: RpcEnvelope = serde_json::from_str(body)?;
    if let Some(fault) = envelope.error {
        return Err(QueryError::Rpc { code: fault.code, message: fault.message });
    }
    let result = envelope.result.ok_or(QueryError::MissingResult)?;
    let statements: Vec<StatementResult> = serde_json::from_value(result)?;
    if statements.len() != expected {
        return Err(QueryError::StatementCount { expected, actual: statements.len() });
    }

    Ok(statements
        .into_iter()
        .map(|s| QueryResponse { success: s.status.eq_ignore_ascii_case("ok"), result: s.result })
        .collect())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
