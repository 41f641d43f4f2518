//! Outbound operator alerts, fired when a node's circuit opens.
//!
//! The sink is a trait so the default (structured log line) can be swapped
//! for a webhook without touching callers. Delivery is fire-and-forget:
//! alerting failures are logged and never propagate into the relay path.

use crate::http_client::{HttpClientSettings, SharedHttpClient};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str);
}

/// Default sink: just a structured warning line. Always available, no
/// configuration required.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn send(&self, message: &str) {
        warn!(alert = message, "node alert");
    }
}

/// Posts the message as a Discord-style `{"content": "..."}` webhook body.
///
/// Rides the same renewable, pooled client the relay stage dials upstreams
/// with rather than opening its own `reqwest::Client`.
pub struct WebhookAlertSink {
    http_client: Arc<SharedHttpClient>,
    http_settings: HttpClientSettings,
    webhook_url: String,
}

impl WebhookAlertSink {
    pub fn new(
        webhook_url: impl Into<String>,
        http_client: Arc<SharedHttpClient>,
        http_settings: HttpClientSettings,
    ) -> Self {
        Self {
            http_client,
            http_settings,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn send(&self, message: &str) {
        let client = match self.http_client.get(&self.http_settings).await {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "failed to acquire http client for webhook alert");
                return;
            }
        };
        let body = serde_json::json!({ "content": message });
        if let Err(err) = client.post(&self.webhook_url).json(&body).send().await {
            warn!(error = %err, "failed to deliver webhook alert");
        }
    }
}

/// Builds the configured sink: a webhook sink when `AGGREGATOR_ALERT_WEBHOOK_URL`
/// is set in the environment, the log sink otherwise.
pub fn sink_from_env(
    http_client: Arc<SharedHttpClient>,
    http_settings: HttpClientSettings,
) -> Box<dyn AlertSink> {
    match std::env::var("AGGREGATOR_ALERT_WEBHOOK_URL") {
        Ok(url) if !url.is_empty() => {
            Box::new(WebhookAlertSink::new(url, http_client, http_settings))
        }
        _ => Box::new(LogAlertSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_never_panics_on_send() {
        let sink = LogAlertSink;
        sink.send("node eth-1 circuit opened").await;
    }

    #[test]
    fn sink_from_env_defaults_to_log_sink_when_unset() {
        std::env::remove_var("AGGREGATOR_ALERT_WEBHOOK_URL");
        let settings = HttpClientSettings {
            request_timeout: std::time::Duration::from_secs(5),
            proxy: None,
            insecure_tls: false,
        };
        let client = Arc::new(SharedHttpClient::new(&settings).unwrap());
        let _sink: Box<dyn AlertSink> = sink_from_env(client, settings);
    }
}
