//! Weighted-random node selection, one selector per chain.
//!
//! `next_node` draws an integer uniformly from `[0, W)` and walks the stored
//! node order, returning the first node whose running weight sum is `>=`
//! the draw *after* adding its own weight. This intentionally biases the
//! first node in the list by one unit of weight, and that behavior is
//! preserved rather than "fixed."

use crate::types::Node;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use tracing::warn;

struct SelectorState {
    nodes: Vec<Node>,
    sum_weight: i64,
}

/// A single chain's weighted-random selector. Holds its own mutex so
/// `set_nodes` and `next_node` are mutually exclusive.
pub struct WeightedSelector {
    state: Mutex<SelectorState>,
}

impl Default for WeightedSelector {
    fn default() -> Self {
        Self {
            state: Mutex::new(SelectorState {
                nodes: Vec::new(),
                sum_weight: 0,
            }),
        }
    }
}

impl WeightedSelector {
    /// Rebuild the selectable set from a chain's configured node list.
    /// Ineligible nodes (disabled, non-positive weight, empty endpoint) are
    /// dropped and logged, not selected.
    pub fn set_nodes(&self, nodes: &[Node]) {
        let mut selected = Vec::with_capacity(nodes.len());
        let mut sum_weight: i64 = 0;
        for node in nodes {
            if node.disabled {
                warn!(node = %node.name, endpoint = %node.endpoint, "node disabled, excluded from selection");
                continue;
            }
            if node.weight > 0 && !node.endpoint.is_empty() {
                sum_weight += node.weight;
                selected.push(node.clone());
            } else {
                warn!(node = %node.name, endpoint = %node.endpoint, "node not eligible for selection (weight/endpoint)");
            }
        }
        let mut state = self.state.lock();
        state.nodes = selected;
        state.sum_weight = sum_weight;
    }

    pub fn sum_weight(&self) -> i64 {
        self.state.lock().sum_weight
    }

    /// Draw a node with probability proportional to its weight. Returns
    /// `None` when the enabled set's total weight is zero.
    pub fn next_node(&self) -> Option<Node> {
        let state = self.state.lock();
        if state.sum_weight <= 0 {
            return None;
        }
        let r = rand::thread_rng().gen_range(0..state.sum_weight);
        let mut running = 0i64;
        for node in &state.nodes {
            running += node.weight;
            if running >= r {
                return Some(node.clone());
            }
        }
        None
    }
}

/// Per-chain registry of selectors, rebuilt whenever the backing chain
/// pool changes.
#[derive(Default)]
pub struct SelectorRegistry {
    selectors: DashMap<String, Arc<WeightedSelector>>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&self, pool: &crate::types::ChainPool) {
        for (chain, nodes) in pool {
            self.selectors
                .entry(chain.clone())
                .or_default()
                .set_nodes(nodes);
        }
        self.selectors.retain(|chain, _| pool.contains_key(chain));
    }

    pub fn next_node(&self, chain: &str) -> Option<Node> {
        self.selectors.get(chain).and_then(|s| s.next_node())
    }

    pub fn sum_weight(&self, chain: &str) -> i64 {
        self.selectors.get(chain).map(|s| s.sum_weight()).unwrap_or(0)
    }
}
