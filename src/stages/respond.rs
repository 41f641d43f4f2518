//! Response stage: decorates the outgoing HTTP response with CORS headers
//! and the selected-node header, and serializes a JSON-RPC error body when
//! the driver exhausted its retries without success.

use crate::error::RelayError;
use crate::session::Session;
use crate::types::JsonRpcResponse;
use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;

const CORS_METHODS: &str = "POST, GET, PUT, DELETE, OPTIONS";

/// `outcome` is the final result of the attempt loop: `Ok` means the relay
/// stage populated `session.response_body`/`response_status`; `Err` carries
/// the last stage failure, already retried out or an immediate
/// `MustReturn`/`InvalidRequest`.
pub fn build(session: &Session, outcome: Result<(), RelayError>) -> Response {
    let mut builder = Response::builder()
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", CORS_METHODS)
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Credentials", "true");

    if let Some(node) = &session.node_name {
        if let Ok(value) = HeaderValue::from_str(node) {
            builder = builder.header("X-Relay-Node", value);
        }
    }

    if session.http_method.eq_ignore_ascii_case("OPTIONS") {
        return builder
            .header("Access-Control-Max-Age", "86400")
            .status(StatusCode::OK)
            .body(Body::empty())
            .unwrap_or_else(|_| Response::new(Body::empty()));
    }

    match outcome {
        Ok(()) => {
            let status =
                StatusCode::from_u16(session.response_status).unwrap_or(StatusCode::OK);
            let body = session.response_body.clone().unwrap_or_default();
            builder
                .status(status)
                .body(Body::from(body))
                .unwrap_or_else(|_| Response::new(Body::empty()))
        }
        Err(err) => {
            let status = err
                .raw_http_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::OK);
            let rpc_error =
                JsonRpcResponse::error(session.rpc_id(), err.jsonrpc_code(), err.to_string());
            let body = serde_json::to_vec(&rpc_error).unwrap_or_default();
            builder
                .status(status)
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap_or_else(|_| Response::new(Body::empty()))
        }
    }
}
