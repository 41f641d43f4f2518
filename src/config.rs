//! Configuration for the relay engine.
//!
//! Covers request timeout, max retries, proxy, nodes, and phishing/authority
//! db lists, loaded from environment variables plus an optional on-disk
//! nodes file rather than a remote config service — config persistence and
//! the management API that would mutate it live outside this core.

use crate::types::ChainPool;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::time::Duration;

/// An opaque authority-database entry, carried but never interpreted by the
/// core.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct AuthorityDbEntry {
    pub name: String,
    pub url: String,
    pub enable: bool,
}

/// Suffixes that classify an RPC method as a write (state-changing) method.
/// Exposed as configuration rather than hard-coded, the same way the
/// content-type whitelist below is.
#[derive(Debug, Clone)]
pub struct WriteMethodSuffixes(pub Vec<String>);

impl Default for WriteMethodSuffixes {
    fn default() -> Self {
        Self(
            [
                "_call",
                "_sendrawtransaction",
                "_sendtransaction",
                "_sendtransactionasfeepayer",
                "sui_devinspecttransactionblock",
                "sui_dryruntransactionblock",
                "sui_executetransactionblock",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }
}

impl WriteMethodSuffixes {
    pub fn matches(&self, method: &str) -> bool {
        if method.is_empty() {
            return false;
        }
        let lower = method.to_lowercase();
        self.0.iter().any(|suffix| lower.ends_with(suffix.as_str()))
    }
}

/// Snapshot-style aggregator configuration. Cloned into every session at
/// init time so mid-request config reloads can never tear a running relay.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub proxy: Option<String>,
    pub nodes: ChainPool,
    pub content_type_whitelist: HashSet<String>,
    pub write_method_suffixes: WriteMethodSuffixes,
    pub phishing_db: Vec<String>,
    pub authority_db: Vec<AuthorityDbEntry>,
    /// `None` means a disabled-until marker never expires on its own.
    /// `Some(ttl)` makes expiry an explicit, opt-in policy.
    pub disabled_until_ttl: Option<Duration>,
    /// Defaults to verifying upstream TLS certificates; requires explicit
    /// opt-out.
    pub insecure_tls: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        let mut content_type_whitelist = HashSet::new();
        content_type_whitelist.insert("sui".to_string());
        content_type_whitelist.insert("solana".to_string());

        Self {
            request_timeout: Duration::from_secs(90),
            max_retries: 3,
            proxy: None,
            nodes: ChainPool::new(),
            content_type_whitelist,
            write_method_suffixes: WriteMethodSuffixes::default(),
            phishing_db: Vec::new(),
            authority_db: Vec::new(),
            disabled_until_ttl: None,
            insecure_tls: false,
        }
    }
}

impl AggregatorConfig {
    pub fn has_chain(&self, chain: &str) -> bool {
        self.nodes.get(chain).is_some_and(|nodes| !nodes.is_empty())
    }

    /// Load configuration from the process environment plus an optional
    /// on-disk nodes file. Write-back (persisting edits) is out of scope
    /// for this core.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AggregatorConfig::default();

        if let Ok(secs) = std::env::var("AGGREGATOR_REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(
                secs.parse()
                    .context("invalid AGGREGATOR_REQUEST_TIMEOUT_SECS")?,
            );
        }
        if let Ok(retries) = std::env::var("AGGREGATOR_MAX_RETRIES") {
            cfg.max_retries = retries.parse().context("invalid AGGREGATOR_MAX_RETRIES")?;
        }
        cfg.proxy = std::env::var("AGGREGATOR_PROXY")
            .ok()
            .filter(|s| !s.is_empty());
        cfg.insecure_tls = std::env::var("AGGREGATOR_INSECURE_TLS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);
        if let Ok(secs) = std::env::var("AGGREGATOR_DISABLED_UNTIL_TTL_SECS") {
            let secs: u64 = secs
                .parse()
                .context("invalid AGGREGATOR_DISABLED_UNTIL_TTL_SECS")?;
            cfg.disabled_until_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Ok(list) = std::env::var("AGGREGATOR_CONTENT_TYPE_WHITELIST") {
            cfg.content_type_whitelist = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(path) = std::env::var("AGGREGATOR_NODES_FILE") {
            let data =
                fs::read_to_string(&path).with_context(|| format!("reading nodes file {path}"))?;
            cfg.nodes = serde_json::from_str(&data)
                .with_context(|| format!("parsing nodes file {path}"))?;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Node;

    #[test]
    fn write_method_suffix_matching_is_case_insensitive() {
        let s = WriteMethodSuffixes::default();
        assert!(s.matches("eth_sendRawTransaction"));
        assert!(s.matches("ETH_CALL"));
        assert!(s.matches("sui_executeTransactionBlock"));
        assert!(!s.matches("eth_blockNumber"));
        assert!(!s.matches(""));
    }

    #[test]
    fn default_whitelist_contains_sui_and_solana() {
        let cfg = AggregatorConfig::default();
        assert!(cfg.content_type_whitelist.contains("sui"));
        assert!(cfg.content_type_whitelist.contains("solana"));
    }

    #[test]
    fn has_chain_requires_nonempty_node_list() {
        let mut cfg = AggregatorConfig::default();
        assert!(!cfg.has_chain("eth"));
        cfg.nodes.insert("eth".to_string(), vec![]);
        assert!(!cfg.has_chain("eth"));
        cfg.nodes.insert(
            "eth".to_string(),
            vec![Node {
                name: "eth-1".into(),
                endpoint: "https://rpc".into(),
                weight: 1,
                disabled: false,
            }],
        );
        assert!(cfg.has_chain("eth"));
    }
}
