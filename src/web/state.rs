//! # Web Application State
//!
//! Shared handles for request handlers. Built once by the bootstrap and
//! cloned into the router as `Arc<AppState>`.

use crate::cache::CacheProvider;
use crate::dispatch::ReportDispatcher;
use crate::messaging::BrokerProvider;
use crate::store::ReportStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ReportDispatcher>,
    pub store: Arc<dyn ReportStore>,
    pub broker: Arc<BrokerProvider>,
    pub cache: CacheProvider,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend_name())
            .field("broker", &self.broker.provider_name())
            .field("cache", &self.cache.provider_name())
            .finish()
    }
}
