//! Request validator: the first stage of every attempt.

use crate::error::RelayError;
use crate::session::Session;
use crate::state::AppState;

/// Classifies a method as a write (state-changing) call by configured
/// suffix match, case-insensitively.
pub fn run(session: &mut Session, _state: &AppState) -> Result<(), RelayError> {
    if session.http_method.eq_ignore_ascii_case("OPTIONS") {
        return Err(RelayError::MustReturn);
    }

    session.accept_header = "application/json".to_string();
    session.is_write_rpc_method = session.cfg.write_method_suffixes.matches(session.rpc_method());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;
    use crate::http_client::SharedHttpClient;
    use std::sync::Arc;

    fn session_with(method: &str, rpc_method: &str) -> Session {
        let mut s = Session::init(method, "/eth", b"{}".to_vec(), AggregatorConfig::default())
            .unwrap();
        s.rpc.method = rpc_method.to_string();
        s
    }

    fn state() -> AppState {
        let settings = crate::http_client::HttpClientSettings {
            request_timeout: std::time::Duration::from_secs(5),
            proxy: None,
            insecure_tls: false,
        };
        AppState::new(
            Default::default(),
            Arc::new(SharedHttpClient::new(&settings).unwrap()),
            Box::new(crate::alert::LogAlertSink),
        )
        .unwrap()
    }

    #[test]
    fn options_short_circuits_with_must_return() {
        let mut s = session_with("OPTIONS", "");
        assert!(matches!(run(&mut s, &state()), Err(RelayError::MustReturn)));
    }

    #[test]
    fn sets_accept_header_and_write_flag() {
        let mut s = session_with("POST", "eth_sendRawTransaction");
        run(&mut s, &state()).unwrap();
        assert_eq!(s.accept_header, "application/json");
        assert!(s.is_write_rpc_method);
    }

    #[test]
    fn read_method_is_not_a_write_method() {
        let mut s = session_with("POST", "eth_blockNumber");
        run(&mut s, &state()).unwrap();
        assert!(!s.is_write_rpc_method);
    }
}
