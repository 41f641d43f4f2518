use anyhow::{Context, Result};
use chain_relay::alert;
use chain_relay::config::AggregatorConfig;
use chain_relay::http_client::{HttpClientSettings, SharedHttpClient};
use chain_relay::ingress;
use chain_relay::state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AggregatorConfig::from_env().context("loading aggregator configuration")?;
    let bind_addr =
        std::env::var("AGGREGATOR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let http_settings = HttpClientSettings {
        request_timeout: cfg.request_timeout,
        proxy: cfg.proxy.clone(),
        insecure_tls: cfg.insecure_tls,
    };
    let http_client = Arc::new(SharedHttpClient::new(&http_settings)?);
    let alert_sink = alert::sink_from_env(http_client.clone(), http_settings);
    let state = Arc::new(AppState::new(cfg.nodes.clone(), http_client, alert_sink)?);

    let app = ingress::router(state, Arc::new(cfg)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "chain-relay listening");
    axum::serve(listener, app).await.context("serving http")?;

    Ok(())
}
