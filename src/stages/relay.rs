//! HTTP proxy stage: the relay core. Dials the selected node under its
//! circuit breaker, classifies the response, and attributes health state
//! back onto the node before returning control to the driver.

use crate::error::RelayError;
use crate::health::NodeHealth;
use crate::http_client::HttpClientSettings;
use crate::session::Session;
use crate::state::AppState;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Instant;

const MAX_RESELECT_ATTEMPTS: u32 = 3;

pub async fn run(session: &mut Session, state: &AppState) -> Result<(), RelayError> {
    let (node_name, endpoint, health) = resolve_eligible_node(session, state)?;
    session.node_name = Some(node_name.clone());
    session.node_endpoint = Some(endpoint.clone());

    if !health.breaker.allow_request() {
        return Err(RelayError::UpstreamTransport(
            "circuit open, skipping dial".to_string(),
        ));
    }

    let client_settings = HttpClientSettings {
        request_timeout: session.cfg.request_timeout,
        proxy: session.cfg.proxy.clone(),
        insecure_tls: session.cfg.insecure_tls,
    };
    let client = state
        .http_client
        .get(&client_settings)
        .await
        .map_err(|e| RelayError::Internal(e.to_string()))?;

    let outcome = client
        .post(&endpoint)
        .header("Accept", session.accept_header.as_str())
        .header("User-Agent", "Mozilla/5.0 (compatible; chain-relay/0.1)")
        .body(session.raw_body.clone())
        .send()
        .await;

    let response = match outcome {
        Ok(resp) => resp,
        Err(err) => {
            health.breaker.record_failure();
            alert_if_due(state, &health, &node_name, "upstream transport error").await;
            return Err(RelayError::UpstreamTransport(err.to_string()));
        }
    };

    // The breaker tracks exceptions on the dial itself, not the HTTP status
    // the dial comes back with — a completed exchange is a breaker success
    // regardless of what status/body classification decides afterward.
    health.breaker.record_success();

    let status = response.status().as_u16();

    if matches!(status, 401 | 403 | 502) {
        health.mark_disabled();
        alert_if_due(state, &health, &node_name, &format!("node disabled: status {status}")).await;
        return Err(RelayError::UpstreamStatus { status, body: None });
    }

    if !(200..300).contains(&status) || status == 429 {
        return Err(RelayError::UpstreamStatus { status, body: None });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let whitelisted = session.cfg.content_type_whitelist.contains(&session.chain);
    if !whitelisted && !content_type.contains("application/json") {
        health.mark_disabled();
        alert_if_due(state, &health, &node_name, "unexpected content-type").await;
        return Err(RelayError::UpstreamContentType(content_type));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| RelayError::UpstreamTransport(e.to_string()))?;

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) {
        if value.get("error").is_some_and(|e| !e.is_null()) {
            alert_if_due(state, &health, &node_name, "upstream reported a JSON-RPC error").await;
            return Err(RelayError::UpstreamLogicalError(value["error"].to_string()));
        }
    }

    session.response_status = status;
    session.response_body = Some(body.to_vec());
    Ok(())
}

/// Steps 1–2 of the relay core: if the node currently selected is disabled,
/// reselect up to three times before giving up.
fn resolve_eligible_node(
    session: &Session,
    state: &AppState,
) -> Result<(String, String, Arc<NodeHealth>), RelayError> {
    let mut node_name = session
        .node_name
        .clone()
        .ok_or_else(|| RelayError::Internal("relay stage ran before select stage".to_string()))?;
    let mut endpoint = session.node_endpoint.clone().unwrap_or_default();
    let mut health = state.health.get_or_create(&node_name);

    let mut reselects = 0;
    while health.is_disabled(session.cfg.disabled_until_ttl) {
        if reselects >= MAX_RESELECT_ATTEMPTS {
            return Err(RelayError::NoUpstream);
        }
        reselects += 1;
        let alternative = state
            .selectors
            .next_node(&session.chain)
            .ok_or(RelayError::NoUpstream)?;
        node_name = alternative.name;
        endpoint = alternative.endpoint;
        health = state.health.get_or_create(&node_name);
    }

    Ok((node_name, endpoint, health))
}

async fn alert_if_due(state: &AppState, health: &NodeHealth, node_name: &str, message: &str) {
    if health.should_alert(Instant::now()) {
        state
            .alert_sink
            .send(&format!("[{node_name}] {message}"))
            .await;
    }
}
