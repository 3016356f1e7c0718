//! No-op cache provider
//!
//! Used when caching is disabled or the cache store is unreachable at startup.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::{CacheService, PayloadStream};
use std::time::Duration;

/// Cache service that never caches anything
///
/// Reads miss, writes succeed silently, lock acquisition never succeeds.
#[derive(Debug, Clone, Default)]
pub struct NoOpCacheService;

impl NoOpCacheService {
    pub fn new() -> Self {
        Self
    }
}

impl CacheService for NoOpCacheService {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<bool> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn delete_if_equals(&self, _key: &str, _expected: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn publish(&self, _channel: &str, _payload: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn subscribe(&self, _channel: &str) -> CacheResult<PayloadStream> {
        Err(CacheError::Unsupported {
            provider: "noop",
            operation: "subscribe",
        })
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_get_returns_none() {
        let svc = NoOpCacheService::new();
        assert_eq!(svc.get("any_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_noop_never_grants_lock() {
        let svc = NoOpCacheService::new();
        let acquired = svc
            .set_if_absent("lock", "1", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(!acquired);
    }

    #[tokio::test]
    async fn test_noop_subscribe_is_unsupported() {
        let svc = NoOpCacheService::new();
        assert!(matches!(
            svc.subscribe("complete").await,
            Err(CacheError::Unsupported { .. })
        ));
    }
}
