//! Authoritative node registry: the chain pool, swapped atomically whenever
//! configuration changes.
//!
//! Readers take an `Arc` snapshot with no locking on the hot path; writers
//! publish a whole new snapshot. Grounded in the `arc_swap::ArcSwap`
//! snapshot-publish pattern used for similar traffic-routing state
//! elsewhere in the ecosystem.

use crate::types::ChainPool;
use arc_swap::ArcSwap;
use std::sync::Arc;

pub struct NodeRegistry {
    pool: ArcSwap<ChainPool>,
}

impl NodeRegistry {
    pub fn new(initial: ChainPool) -> Self {
        Self {
            pool: ArcSwap::from_pointee(initial),
        }
    }

    /// Take a cheap, consistent snapshot of the current chain pool.
    pub fn snapshot(&self) -> Arc<ChainPool> {
        self.pool.load_full()
    }

    /// Replace the whole chain pool. Nodes are created when configuration
    /// loads and destroyed wholesale when configuration is replaced.
    pub fn set_nodes(&self, nodes: ChainPool) {
        self.pool.store(Arc::new(nodes));
    }

    pub fn chains(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().keys().cloned().collect();
        names.sort();
        names
    }
}
