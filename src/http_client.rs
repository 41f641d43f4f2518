//! Shared outbound HTTP client.
//!
//! A single reusable, keep-alive client per process, renewed every 60
//! seconds so connection-pool pathologies self-heal. Renewal swaps the
//! `Arc<Client>` under a mutex; in-flight requests keep their own captured
//! `Arc` clone and are unaffected by a renewal happening underneath them.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const RENEW_INTERVAL: Duration = Duration::from_secs(60);
/// reqwest doesn't expose a hard per-host connection cap, only an idle-pool
/// size, so we size the idle pool generously instead of capping outright.
const MAX_IDLE_CONNS_PER_HOST: usize = 8_192;

pub struct HttpClientSettings {
    pub request_timeout: Duration,
    pub proxy: Option<String>,
    pub insecure_tls: bool,
}

fn build_client(settings: &HttpClientSettings) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .pool_max_idle_per_host(MAX_IDLE_CONNS_PER_HOST)
        .danger_accept_invalid_certs(settings.insecure_tls)
        .user_agent("Mozilla/5.0 (compatible; chain-relay/0.1)");

    if let Some(proxy_url) = &settings.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .with_context(|| format!("invalid proxy url {proxy_url}"))?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("building outbound http client")
}

/// The `(client, created_at)` pair, renewed wholesale every 60 seconds.
pub struct SharedHttpClient {
    inner: Mutex<(Arc<reqwest::Client>, Instant)>,
}

impl SharedHttpClient {
    pub fn new(settings: &HttpClientSettings) -> Result<Self> {
        let client = Arc::new(build_client(settings)?);
        Ok(Self {
            inner: Mutex::new((client, Instant::now())),
        })
    }

    /// Returns the current client, renewing it first if it's older than the
    /// renewal interval. Renewal never blocks a request already holding an
    /// `Arc` to the old client.
    pub async fn get(&self, settings: &HttpClientSettings) -> Result<Arc<reqwest::Client>> {
        let mut guard = self.inner.lock().await;
        if guard.1.elapsed() > RENEW_INTERVAL {
            debug!("renewing outbound http client");
            let fresh = Arc::new(build_client(settings)?);
            *guard = (fresh, Instant::now());
        }
        Ok(guard.0.clone())
    }
}
