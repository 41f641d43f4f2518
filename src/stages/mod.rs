//! The relay pipeline: a fixed ordered sequence of stage functions rather
//! than pluggable middleware objects. The driver dispatches
//! `VALIDATE -> SELECT -> RELAY` in order on every attempt; `RESPOND` runs
//! once, after the loop finishes (success or retries exhausted).

pub mod relay;
pub mod respond;
pub mod select;
pub mod validate;

use crate::error::RelayError;
use crate::session::Session;
use crate::state::AppState;

pub type SyncStageFn = fn(&mut Session, &AppState) -> Result<(), RelayError>;

/// The synchronous stages run, in order, on every attempt. `relay::run` is
/// async (it performs the outbound HTTP call) and is invoked separately by
/// the driver after these.
pub const SYNC_STAGES: &[SyncStageFn] = &[validate::run, select::run];
