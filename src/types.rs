//! Wire data model — JSON-RPC framing and the node/chain-pool shape.
//!
//! The engine never interprets anything inside `params`; it only ever reads
//! `method` (for write-method classification) and echoes `id` back on error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single upstream JSON-RPC endpoint.
///
/// A node with an empty endpoint, non-positive weight, or `disabled = true`
/// is ineligible for selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub disabled: bool,
}

impl Node {
    pub fn is_eligible(&self) -> bool {
        !self.disabled && self.weight > 0 && !self.endpoint.is_empty()
    }
}

/// `chain-tag -> ordered sequence of Node`.
pub type ChainPool = HashMap<String, Vec<Node>>;

/// Inbound JSON-RPC 2.0 request. `id` is left untyped (number, string, or
/// null are all legal) and `params` is never more strongly typed than
/// `Value` since the engine doesn't interpret it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_jsonrpc_version() -> String {
    "2.0".to_string()
}

impl JsonRpcRequest {
    /// Lenient parse: an unparsable body yields a request with an empty
    /// method and id `1` rather than rejecting the request outright.
    pub fn parse_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|_| JsonRpcRequest {
            jsonrpc: default_jsonrpc_version(),
            id: serde_json::Value::from(1),
            method: String::new(),
            params: serde_json::Value::Null,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorObj {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObj>,
}

impl JsonRpcResponse {
    pub fn error(id: serde_json::Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcErrorObj {
                code,
                message: message.into(),
            }),
        }
    }
}
