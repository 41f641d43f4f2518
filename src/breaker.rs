//! Per-node circuit breaker.
//!
//! Three states — closed, open, half-open — gating whether the relay stage
//! is even allowed to dial a node. 3 consecutive failures opens the
//! circuit, it stays open for 1 minute, and 2 consecutive successes in the
//! half-open state closes it again.
//!
//! Adapted from the consecutive-failure breaker pattern used for upstream
//! RPC nodes elsewhere in the ecosystem (parking_lot + atomics, no external
//! breaker crate) rather than a sliding-window-percentage breaker, since
//! these thresholds are consecutive-count based, not rate based.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_duration: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration: Duration::from_secs(60),
            success_threshold: 2,
        }
    }
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: RwLock<CircuitState>,
    failure_count: AtomicU32,
    success_count: AtomicU32,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            opened_at: RwLock::new(None),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.check_and_update_state();
        *self.state.read()
    }

    /// Whether a call is currently permitted (open = no, half-open = yes,
    /// to allow one trial call through).
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        }
    }

    /// Record a successful outbound call. Holds the state write lock across
    /// the whole read-modify-write so a concurrent failure can't interleave
    /// between the state check and the counter update.
    pub fn record_success(&self) {
        let state = self.state.write();
        self.failure_count.store(0, Ordering::SeqCst);

        if *state == CircuitState::HalfOpen {
            let successes = self.success_count.fetch_add(1, Ordering::SeqCst) + 1;
            if successes >= self.config.success_threshold {
                drop(state);
                self.transition_to(CircuitState::Closed);
            }
        }
    }

    /// Record a failed outbound call (network error, timeout — not a
    /// 2xx/non-2xx status, which the caller classifies separately).
    pub fn record_failure(&self) {
        let state = self.state.write();
        self.success_count.store(0, Ordering::SeqCst);

        match *state {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    drop(state);
                    self.transition_to(CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                drop(state);
                self.transition_to(CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn check_and_update_state(&self) {
        let state = *self.state.read();
        if state == CircuitState::Open {
            if let Some(opened_at) = *self.opened_at.read() {
                if opened_at.elapsed() >= self.config.open_duration {
                    self.transition_to(CircuitState::HalfOpen);
                }
            }
        }
    }

    fn transition_to(&self, new_state: CircuitState) {
        let mut state = self.state.write();
        if *state == new_state {
            return;
        }
        *state = new_state;
        match new_state {
            CircuitState::Open => {
                *self.opened_at.write() = Some(Instant::now());
                self.success_count.store(0, Ordering::SeqCst);
            }
            CircuitState::HalfOpen => {
                self.success_count.store(0, Ordering::SeqCst);
            }
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::SeqCst);
                *self.opened_at.write() = None;
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::default();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::default();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            open_duration: Duration::from_millis(1),
            success_threshold: 2,
        });
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.allow_request());
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_reopens_on_any_failure() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            open_duration: Duration::from_millis(1),
            success_threshold: 2,
        });
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
