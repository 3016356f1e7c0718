//! Cache store adapter
//!
//! `CacheProvider` is the single handle every component uses to reach the
//! cache store. It is built once at bootstrap and cloned into dependents;
//! there is no process-global instance. Dispatch over backends is an enum
//! (no vtable), and a backend that cannot be reached at startup degrades to
//! the no-op provider instead of failing the process.

use super::errors::CacheResult;
use super::providers::{MemoryCacheService, NoOpCacheService};
use super::traits::{CacheService, PayloadStream};
use crate::config::CacheConfig;
use std::time::Duration;
use tracing::{info, warn};

#[cfg(feature = "cache-redis")]
use super::providers::RedisCacheService;

#[derive(Debug, Clone)]
enum CacheBackend {
    /// Redis cache provider (boxed to reduce enum size)
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisCacheService>),

    /// In-process store with pub/sub bus
    Memory(MemoryCacheService),

    /// Always miss, always succeed
    NoOp(NoOpCacheService),
}

impl CacheBackend {
    fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            Self::Memory(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            Self::Memory(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set(key, value, ttl).await,
            Self::Memory(s) => s.set(key, value, ttl).await,
            Self::NoOp(s) => s.set(key, value, ttl).await,
        }
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set_if_absent(key, value, ttl).await,
            Self::Memory(s) => s.set_if_absent(key, value, ttl).await,
            Self::NoOp(s) => s.set_if_absent(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete(key).await,
            Self::Memory(s) => s.delete(key).await,
            Self::NoOp(s) => s.delete(key).await,
        }
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete_if_equals(key, expected).await,
            Self::Memory(s) => s.delete_if_equals(key, expected).await,
            Self::NoOp(s) => s.delete_if_equals(key, expected).await,
        }
    }

    async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.publish(channel, payload).await,
            Self::Memory(s) => s.publish(channel, payload).await,
            Self::NoOp(s) => s.publish(channel, payload).await,
        }
    }

    async fn subscribe(&self, channel: &str) -> CacheResult<PayloadStream> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.subscribe(channel).await,
            Self::Memory(s) => s.subscribe(channel).await,
            Self::NoOp(s) => s.subscribe(channel).await,
        }
    }

    async fn health_check(&self) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            Self::Memory(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
        }
    }
}

/// Shared handle to the cache store
///
/// ## Backends
///
/// - **Redis**: shared across every process (API servers and remote workers)
/// - **Memory**: in-process only, for development and tests
/// - **NoOp**: caching disabled; reads miss, writes vanish
///
/// Cloning is cheap and every clone talks to the same backend.
#[derive(Debug, Clone)]
pub struct CacheProvider {
    backend: CacheBackend,
}

impl CacheProvider {
    /// Create a cache provider from configuration with graceful degradation
    ///
    /// If the configured backend cannot be reached, logs a warning and
    /// returns a NoOp provider. The process never fails to start because
    /// of the cache.
    pub async fn from_config_graceful(config: &CacheConfig) -> Self {
        let backend = Self::create_backend(config).await;
        info!(
            provider = backend.provider_name(),
            enabled = backend.is_enabled(),
            "Cache provider ready"
        );
        Self { backend }
    }

    async fn create_backend(config: &CacheConfig) -> CacheBackend {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return CacheBackend::NoOp(NoOpCacheService::new());
        }

        match config.backend.as_str() {
            "redis" => Self::create_redis_backend(config).await,
            "memory" | "in-memory" => CacheBackend::Memory(MemoryCacheService::new()),
            "none" | "noop" => CacheBackend::NoOp(NoOpCacheService::new()),
            other => {
                warn!(backend = other, "Unknown cache backend, falling back to NoOp");
                CacheBackend::NoOp(NoOpCacheService::new())
            }
        }
    }

    #[cfg(feature = "cache-redis")]
    async fn create_redis_backend(config: &CacheConfig) -> CacheBackend {
        let Some(redis_config) = &config.redis else {
            warn!("Redis cache enabled but no [cache.redis] config found, falling back to NoOp");
            return CacheBackend::NoOp(NoOpCacheService::new());
        };

        match RedisCacheService::from_config(redis_config).await {
            Ok(service) => {
                info!(backend = "redis", "✅ Redis cache connected");
                CacheBackend::Redis(Box::new(service))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "⚠️ Failed to connect to Redis, running without cache (caching disabled)"
                );
                CacheBackend::NoOp(NoOpCacheService::new())
            }
        }
    }

    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis_backend(_config: &CacheConfig) -> CacheBackend {
        warn!("Redis cache backend requested but 'cache-redis' feature not enabled, using NoOp");
        CacheBackend::NoOp(NoOpCacheService::new())
    }

    /// Provider that never caches
    pub fn noop() -> Self {
        Self {
            backend: CacheBackend::NoOp(NoOpCacheService::new()),
        }
    }

    /// Provider backed by the given in-memory store
    pub fn memory(service: MemoryCacheService) -> Self {
        Self {
            backend: CacheBackend::Memory(service),
        }
    }

    /// Whether caching is actually enabled (not NoOp)
    pub fn is_enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.backend.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.backend.set(key, value, ttl).await
    }

    /// Atomic `SET key value NX EX ttl`; `true` when this caller created the key
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        self.backend.set_if_absent(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.backend.delete(key).await
    }

    pub async fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        self.backend.delete_if_equals(key, expected).await
    }

    pub async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()> {
        self.backend.publish(channel, payload).await
    }

    pub async fn subscribe(&self, channel: &str) -> CacheResult<PayloadStream> {
        self.backend.subscribe(channel).await
    }

    pub async fn health_check(&self) -> CacheResult<bool> {
        self.backend.health_check().await
    }
}
