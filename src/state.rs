//! Process-wide shared state: everything a stage needs that outlives a
//! single session. Built once at startup and handed to every request as
//! an `Arc<AppState>`.

use crate::alert::AlertSink;
use crate::health::NodeHealthStore;
use crate::http_client::{HttpClientSettings, SharedHttpClient};
use crate::registry::NodeRegistry;
use crate::selector::SelectorRegistry;
use crate::types::ChainPool;
use std::sync::Arc;

pub struct AppState {
    pub registry: NodeRegistry,
    pub selectors: SelectorRegistry,
    pub health: NodeHealthStore,
    pub http_client: Arc<SharedHttpClient>,
    pub alert_sink: Box<dyn AlertSink>,
}

impl AppState {
    /// `http_client` is built by the caller and shared with the alert sink
    /// (`alert::sink_from_env`) so a webhook alert rides the same renewable,
    /// pooled client as outbound relay calls rather than opening its own.
    pub fn new(
        nodes: ChainPool,
        http_client: Arc<SharedHttpClient>,
        alert_sink: Box<dyn AlertSink>,
    ) -> anyhow::Result<Self> {
        let selectors = SelectorRegistry::new();
        selectors.rebuild(&nodes);

        Ok(Self {
            registry: NodeRegistry::new(nodes),
            selectors,
            health: NodeHealthStore::new(),
            http_client,
            alert_sink,
        })
    }

    /// Replace the chain pool and rebuild every selector to match.
    pub fn set_nodes(&self, nodes: ChainPool) {
        self.selectors.rebuild(&nodes);
        self.registry.set_nodes(nodes);
    }
}
