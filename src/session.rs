//! Per-request session state.
//!
//! A `Session` is created once per inbound HTTP request and carries every
//! piece of mutable state a stage might touch: the parsed JSON-RPC request,
//! the currently-selected node, the attempt counter, and a config snapshot
//! cloned at init time so a concurrent config reload can never tear a
//! running relay.

use crate::config::AggregatorConfig;
use crate::error::RelayError;
use crate::types::JsonRpcRequest;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub struct Session {
    pub id: u64,
    pub http_method: String,
    pub path: String,
    pub chain: String,
    pub rpc: JsonRpcRequest,
    pub raw_body: Vec<u8>,
    pub node_name: Option<String>,
    pub node_endpoint: Option<String>,
    pub is_write_rpc_method: bool,
    pub tries: u32,
    pub cfg: AggregatorConfig,
    /// Set by the validator stage; carried through to the relay stage's
    /// outbound request.
    pub accept_header: String,
    /// Populated by the relay stage on success.
    pub response_body: Option<Vec<u8>>,
    pub response_status: u16,
}

impl Session {
    /// Parses `path` as exactly `/<chain-tag>`; any other shape is an
    /// invalid request. The chain tag is trimmed but otherwise unchanged —
    /// case is preserved.
    pub fn init(
        http_method: &str,
        path: &str,
        raw_body: Vec<u8>,
        cfg: AggregatorConfig,
    ) -> Result<Self, RelayError> {
        let chain = parse_chain_tag(path)?;
        let rpc = JsonRpcRequest::parse_lenient(&raw_body);

        Ok(Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            http_method: http_method.to_string(),
            path: path.to_string(),
            chain,
            rpc,
            raw_body,
            node_name: None,
            node_endpoint: None,
            is_write_rpc_method: false,
            tries: 0,
            cfg,
            accept_header: String::new(),
            response_body: None,
            response_status: 0,
        })
    }

    pub fn rpc_method(&self) -> &str {
        &self.rpc.method
    }

    pub fn rpc_id(&self) -> serde_json::Value {
        self.rpc.id.clone()
    }
}

/// Splits `path` on `/` and requires exactly one non-empty segment.
fn parse_chain_tag(path: &str) -> Result<String, RelayError> {
    let segments: Vec<&str> = path.trim().trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [tag] if !tag.is_empty() => Ok(tag.trim().to_string()),
        _ => Err(RelayError::InvalidRequest(format!(
            "expected path of the form /<chain-tag>, got {path:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AggregatorConfig {
        AggregatorConfig::default()
    }

    #[test]
    fn parses_single_segment_path() {
        let s = Session::init("POST", "/eth", b"{}".to_vec(), cfg()).unwrap();
        assert_eq!(s.chain, "eth");
    }

    #[test]
    fn rejects_empty_path() {
        assert!(Session::init("POST", "/", b"{}".to_vec(), cfg()).is_err());
    }

    #[test]
    fn rejects_multi_segment_path() {
        assert!(Session::init("POST", "/eth/extra", b"{}".to_vec(), cfg()).is_err());
    }

    #[test]
    fn lenient_parse_defaults_on_garbage_body() {
        let s = Session::init("POST", "/eth", b"not json".to_vec(), cfg()).unwrap();
        assert_eq!(s.rpc_method(), "");
        assert_eq!(s.rpc_id(), serde_json::Value::from(1));
    }

    #[test]
    fn session_ids_are_monotonically_assigned() {
        let a = Session::init("POST", "/eth", b"{}".to_vec(), cfg()).unwrap();
        let b = Session::init("POST", "/eth", b"{}".to_vec(), cfg()).unwrap();
        assert!(b.id > a.id);
    }
}
