//! Ingress HTTP handler: turns an inbound axum request into a `Session`,
//! runs it through the driver, and returns whatever the respond stage
//! built. Routing itself is a single catch-all — the chain tag lives in
//! the path, not in axum's router table, so config reloads never require
//! re-registering routes.

use crate::config::AggregatorConfig;
use crate::driver;
use crate::error::RelayError;
use crate::session::Session;
use crate::stages::respond;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::response::Response;
use axum::Router;
use std::sync::Arc;

/// A single catch-all fallback handles every path and method: with no
/// other routes registered, everything lands here regardless of verb,
/// which is exactly what a chain-tag-in-the-path router needs.
pub fn router(state: Arc<AppState>, base_cfg: Arc<AggregatorConfig>) -> Router {
    Router::new()
        .fallback(handle)
        .with_state((state, base_cfg))
}

async fn handle(
    State((state, base_cfg)): State<(Arc<AppState>, Arc<AggregatorConfig>)>,
    method: Method,
    uri: axum::http::Uri,
    body: Bytes,
) -> Response {
    let cfg = (*base_cfg).clone();
    match Session::init(method.as_str(), uri.path(), body.to_vec(), cfg) {
        Ok(session) => driver::handle(session, &state).await,
        Err(err @ RelayError::InvalidRequest(_)) => invalid_request_response(err),
        Err(_) => unreachable!("Session::init only ever returns InvalidRequest"),
    }
}

fn invalid_request_response(err: RelayError) -> Response {
    let placeholder = Session::init("POST", "/placeholder", Vec::new(), AggregatorConfig::default())
        .expect("placeholder path is always valid");
    respond::build(&placeholder, Err(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::LogAlertSink;
    use crate::http_client::{HttpClientSettings, SharedHttpClient};
    use crate::types::ChainPool;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn settings() -> HttpClientSettings {
        HttpClientSettings {
            request_timeout: std::time::Duration::from_secs(5),
            proxy: None,
            insecure_tls: false,
        }
    }

    #[tokio::test]
    async fn unroutable_path_returns_well_formed_jsonrpc_error() {
        let state = Arc::new(
            AppState::new(ChainPool::new(), Arc::new(SharedHttpClient::new(&settings()).unwrap()), Box::new(LogAlertSink)).unwrap(),
        );
        let app = router(state, Arc::new(AggregatorConfig::default()));

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn options_preflight_is_handled_without_a_configured_chain() {
        let state = Arc::new(
            AppState::new(ChainPool::new(), Arc::new(SharedHttpClient::new(&settings()).unwrap()), Box::new(LogAlertSink)).unwrap(),
        );
        let app = router(state, Arc::new(AggregatorConfig::default()));

        let request = axum::http::Request::builder()
            .method("OPTIONS")
            .uri("/eth")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("Access-Control-Max-Age"));
    }
}
