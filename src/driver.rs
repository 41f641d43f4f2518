//! Session driver: runs the fixed stage sequence for one inbound request,
//! retrying on recoverable stage failure up to `max_retries` attempts, and
//! always producing a response via the respond stage.

use crate::error::RelayError;
use crate::session::Session;
use crate::stages::{relay, respond, SYNC_STAGES};
use crate::state::AppState;
use axum::response::Response;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{info_span, warn, Instrument};

pub async fn handle(mut session: Session, state: &AppState) -> Response {
    let span = info_span!("session", id = session.id, chain = %session.chain);
    let outcome = run_attempts(&mut session, state).instrument(span).await;
    respond::build(&session, outcome)
}

async fn run_attempts(session: &mut Session, state: &AppState) -> Result<(), RelayError> {
    loop {
        session.tries += 1;
        let result = run_one_attempt(session, state).await;

        match result {
            Ok(()) => return Ok(()),
            Err(RelayError::MustReturn) => return Err(RelayError::MustReturn),
            Err(err) => {
                if !err.is_retryable() || session.tries >= session.cfg.max_retries {
                    return Err(err);
                }
            }
        }
    }
}

async fn run_one_attempt(session: &mut Session, state: &AppState) -> Result<(), RelayError> {
    for stage in SYNC_STAGES {
        stage(session, state)?;
    }

    let relay_future = AssertUnwindSafe(relay::run(session, state));
    match relay_future.catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(error = %message, "relay stage panicked, recovering as internal error");
            Err(RelayError::Internal(message))
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
