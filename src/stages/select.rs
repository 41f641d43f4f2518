//! Load-balance stage: picks one node for this attempt and points the
//! session at its endpoint. Runs once per attempt — a retry re-enters this
//! stage and may land on a different node.

use crate::error::RelayError;
use crate::session::Session;
use crate::state::AppState;

pub fn run(session: &mut Session, state: &AppState) -> Result<(), RelayError> {
    let node = state
        .selectors
        .next_node(&session.chain)
        .ok_or(RelayError::NoUpstream)?;

    session.node_name = Some(node.name);
    session.node_endpoint = Some(node.endpoint);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;
    use crate::http_client::{HttpClientSettings, SharedHttpClient};
    use crate::types::{ChainPool, Node};
    use std::sync::Arc;

    fn settings() -> HttpClientSettings {
        HttpClientSettings {
            request_timeout: std::time::Duration::from_secs(5),
            proxy: None,
            insecure_tls: false,
        }
    }

    fn node(name: &str) -> Node {
        Node {
            name: name.into(),
            endpoint: format!("https://{name}.example"),
            weight: 1,
            disabled: false,
        }
    }

    #[test]
    fn selects_a_node_and_records_its_endpoint() {
        let mut pool = ChainPool::new();
        pool.insert("eth".to_string(), vec![node("eth-1")]);
        let state = AppState::new(pool, Arc::new(SharedHttpClient::new(&settings()).unwrap()), Box::new(crate::alert::LogAlertSink)).unwrap();

        let mut session =
            Session::init("POST", "/eth", b"{}".to_vec(), AggregatorConfig::default()).unwrap();
        run(&mut session, &state).unwrap();

        assert_eq!(session.node_name.as_deref(), Some("eth-1"));
        assert_eq!(session.node_endpoint.as_deref(), Some("https://eth-1.example"));
    }

    #[test]
    fn fails_with_no_upstream_when_chain_is_empty() {
        let state = AppState::new(ChainPool::new(), Arc::new(SharedHttpClient::new(&settings()).unwrap()), Box::new(crate::alert::LogAlertSink))
            .unwrap();
        let mut session =
            Session::init("POST", "/eth", b"{}".to_vec(), AggregatorConfig::default()).unwrap();
        assert!(matches!(run(&mut session, &state), Err(RelayError::NoUpstream)));
    }
}
