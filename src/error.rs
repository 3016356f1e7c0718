//! Crate-level error type.
//!
//! Each subsystem owns a focused `thiserror` enum; `CoordinatorError` is the
//! umbrella used at bootstrap and by the binaries.

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigurationError;
use crate::dispatch::DispatchError;
use crate::listener::ListenerError;
use crate::messaging::MessagingError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;
