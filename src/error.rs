//! Error taxonomy for the relay pipeline.
//!
//! Each stage returns one of these kinds to the session driver rather than a
//! bare `anyhow::Error`; the driver needs to know both the JSON-RPC code to
//! emit on exhaustion and whether the kind is worth retrying at all.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RelayError {
    /// Bad path or (structurally) malformed request. Not retried — a retry
    /// would just fail to parse the same path again.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The selector returned nothing for this chain. Not retried — retrying
    /// would only reselect from the same empty set.
    #[error("no upstream available for chain")]
    NoUpstream,

    /// Connection error, timeout, or DNS failure reaching the upstream.
    #[error("upstream transport error: {0}")]
    UpstreamTransport(String),

    /// Non-2xx, 429, or a blocked status class (401/403/502).
    #[error("upstream status {status}")]
    UpstreamStatus { status: u16, body: Option<String> },

    /// Response had a non-JSON content-type on a non-whitelisted chain.
    #[error("unexpected upstream content-type: {0}")]
    UpstreamContentType(String),

    /// Response body parsed as JSON with a top-level `error` key.
    #[error("upstream reported a JSON-RPC error: {0}")]
    UpstreamLogicalError(String),

    /// Sentinel: terminate the driver loop successfully (OPTIONS preflight).
    #[error("must-return sentinel")]
    MustReturn,

    /// Caught panic or other unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// JSON-RPC error code for the final, exhausted-retries response.
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            RelayError::InvalidRequest(_) => -32600,
            _ => -32000,
        }
    }

    /// Whether the driver should retry this kind (bounded by `max_retries`).
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RelayError::InvalidRequest(_) | RelayError::NoUpstream | RelayError::MustReturn
        )
    }

    /// Raw HTTP status to mirror on the client's final, failed attempt, if
    /// this error kind carries one.
    pub fn raw_http_status(&self) -> Option<u16> {
        match self {
            RelayError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
