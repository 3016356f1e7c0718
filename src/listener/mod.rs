//! # Completion Listening
//!
//! `CompletionListener` turns notifications into task state changes and
//! reconciliation; `ListenerSupervisor` keeps it subscribed.

pub mod completion_listener;
pub mod supervisor;

pub use completion_listener::{CompletionListener, DropReason, ListenerStats, MessageOutcome};
pub use supervisor::ListenerSupervisor;

use crate::cache::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to subscribe to completion channel: {0}")]
    Subscribe(#[from] CacheError),

    #[error("Listener crashed: {0}")]
    Crashed(String),
}
