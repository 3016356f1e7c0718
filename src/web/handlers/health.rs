//! # Health Check Handler
//!
//! The store and the broker are required; the cache is optional and only
//! reported. An unreachable cache never makes the service unhealthy.

use crate::web::response_types::{ApiError, ApiResponse, ApiResult};
use crate::web::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ComponentHealth {
    pub provider: &'static str,
    pub healthy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: ComponentHealth,
    pub store: ComponentHealth,
    pub broker: ComponentHealth,
}

/// Health check endpoint: GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let cache = ComponentHealth {
        provider: state.cache.provider_name(),
        healthy: state.cache.health_check().await.unwrap_or(false),
    };
    let store = ComponentHealth {
        provider: state.store.backend_name(),
        healthy: state.store.health_check().await.is_ok(),
    };
    let broker = ComponentHealth {
        provider: state.broker.provider_name(),
        healthy: state.broker.health_check().await.unwrap_or(false),
    };

    let up = store.healthy && broker.healthy;
    let response = HealthResponse {
        status: if up { "UP" } else { "DOWN" },
        cache,
        store,
        broker,
    };

    if up {
        Ok(Json(ApiResponse::ok(response)))
    } else {
        Err(ApiError::ServiceUnavailable {
            detail: serde_json::to_value(&response)
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheProvider, MemoryCacheService};
    use crate::config::TopicsConfig;
    use crate::dispatch::ReportDispatcher;
    use crate::messaging::{BrokerProvider, InMemoryBroker};
    use crate::store::InMemoryReportStore;
    use axum::http::StatusCode;

    fn state(store: Arc<InMemoryReportStore>, cache: CacheProvider) -> Arc<AppState> {
        let broker = Arc::new(BrokerProvider::InMemory(InMemoryBroker::new()));
        Arc::new(AppState {
            dispatcher: Arc::new(ReportDispatcher::new(
                store.clone(),
                Arc::clone(&broker),
                TopicsConfig::default(),
            )),
            store,
            broker,
            cache,
        })
    }

    #[tokio::test]
    async fn test_up_even_when_cache_is_down() {
        let memory = MemoryCacheService::new();
        memory.set_available(false);
        let state = state(
            Arc::new(InMemoryReportStore::new()),
            CacheProvider::memory(memory),
        );

        let Json(response) = health_check(State(state)).await.unwrap();

        assert!(response.is_success);
        assert_eq!(response.result.status, "UP");
        assert_eq!(response.result.cache.provider, "memory");
        assert!(!response.result.cache.healthy);
    }

    #[tokio::test]
    async fn test_down_when_store_unavailable() {
        let store = Arc::new(InMemoryReportStore::new());
        store.set_available(false);
        let state = state(store, CacheProvider::noop());

        let error = health_check(State(state)).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
