//! Per-node health state: circuit breaker, disabled-until marker, and the
//! last-alert timestamp used to rate-limit outbound alerts to at most one
//! per hour per node.
//!
//! Entries are created lazily on first selection of a node and live for the
//! process lifetime — they are never removed. A sharded concurrent map
//! (`dashmap`) backs the store so lookups and inserts never contend across
//! unrelated node names.

use crate::breaker::CircuitBreaker;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

const ALERT_RATE_LIMIT: Duration = Duration::from_secs(60 * 60);

pub struct NodeHealth {
    pub breaker: CircuitBreaker,
    disabled_until: RwLock<Option<Instant>>,
    last_alert: RwLock<Option<Instant>>,
}

impl Default for NodeHealth {
    fn default() -> Self {
        Self {
            breaker: CircuitBreaker::default(),
            disabled_until: RwLock::new(None),
            last_alert: RwLock::new(None),
        }
    }
}

impl NodeHealth {
    /// Whether the node currently carries a disabled-until marker.
    ///
    /// With `ttl = None` the marker persists until cleared explicitly.
    /// With `ttl = Some(d)` a marker older than `d` is treated as expired
    /// and ignored.
    pub fn is_disabled(&self, ttl: Option<Duration>) -> bool {
        match *self.disabled_until.read() {
            None => false,
            Some(marked_at) => match ttl {
                None => true,
                Some(ttl) => marked_at.elapsed() < ttl,
            },
        }
    }

    /// Place the disabled-until marker, keeping any pre-existing marker
    /// rather than overwriting its timestamp.
    pub fn mark_disabled(&self) {
        let mut guard = self.disabled_until.write();
        if guard.is_none() {
            *guard = Some(Instant::now());
        }
    }

    pub fn clear_disabled(&self) {
        *self.disabled_until.write() = None;
    }

    /// Returns true and stamps `now` iff the last alert for this node was
    /// more than an hour ago (or never).
    pub fn should_alert(&self, now: Instant) -> bool {
        let mut guard = self.last_alert.write();
        let should = match *guard {
            None => true,
            Some(last) => now.duration_since(last) >= ALERT_RATE_LIMIT,
        };
        if should {
            *guard = Some(now);
        }
        should
    }
}

#[derive(Default)]
pub struct NodeHealthStore {
    entries: DashMap<String, Arc<NodeHealth>>,
}

impl NodeHealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, node_name: &str) -> Arc<NodeHealth> {
        self.entries
            .entry(node_name.to_string())
            .or_insert_with(|| Arc::new(NodeHealth::default()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_marker_persists_without_ttl() {
        let h = NodeHealth::default();
        assert!(!h.is_disabled(None));
        h.mark_disabled();
        assert!(h.is_disabled(None));
    }

    #[test]
    fn disabled_marker_keeps_first_timestamp() {
        let h = NodeHealth::default();
        h.mark_disabled();
        let first = *h.disabled_until.read();
        h.mark_disabled();
        assert_eq!(first, *h.disabled_until.read());
    }

    #[test]
    fn disabled_marker_expires_with_ttl() {
        let h = NodeHealth::default();
        h.mark_disabled();
        assert!(h.is_disabled(Some(Duration::from_secs(3600))));
        assert!(!h.is_disabled(Some(Duration::from_nanos(1))));
    }

    #[test]
    fn alert_rate_limited_to_once_per_hour() {
        let h = NodeHealth::default();
        let t0 = Instant::now();
        assert!(h.should_alert(t0));
        assert!(!h.should_alert(t0 + Duration::from_secs(60)));
        assert!(h.should_alert(t0 + Duration::from_secs(3601)));
    }

    #[test]
    fn store_creates_entries_lazily_and_reuses_them() {
        let store = NodeHealthStore::new();
        let a = store.get_or_create("node-a");
        a.mark_disabled();
        let a_again = store.get_or_create("node-a");
        assert!(a_again.is_disabled(None));
        let b = store.get_or_create("node-b");
        assert!(!b.is_disabled(None));
    }
}
