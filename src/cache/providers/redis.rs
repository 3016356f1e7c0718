//! Redis cache provider
//!
//! Uses `redis::aio::ConnectionManager` for multiplexed commands with automatic
//! reconnection, and a dedicated pub/sub connection per subscription.
//! Requires the `cache-redis` feature flag.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::{CacheService, PayloadStream};
use crate::config::loader::redact_credentials;
use crate::config::RedisConfig;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, warn};

const COMPARE_AND_DELETE: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

/// Redis-backed cache service
#[derive(Clone)]
pub struct RedisCacheService {
    client: redis::Client,
    connection_manager: redis::aio::ConnectionManager,
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

impl RedisCacheService {
    /// Connect and verify the server answers `PING`
    pub async fn from_config(config: &RedisConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let connect_timeout = Duration::from_secs(config.connection_timeout_seconds);
        let connection_manager = tokio::time::timeout(
            connect_timeout,
            redis::aio::ConnectionManager::new(client.clone()),
        )
        .await
        .map_err(|_| {
            CacheError::Timeout(format!(
                "Redis connect exceeded {}s",
                config.connection_timeout_seconds
            ))
        })?
        .map_err(|e| CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e)))?;

        let service = Self {
            client,
            connection_manager,
        };

        if !service.health_check().await? {
            return Err(CacheError::ConnectionError(
                "Redis PING returned an unexpected reply".to_string(),
            ));
        }

        debug!(url = %redact_credentials(&config.url), "Redis cache service connected");
        Ok(service)
    }
}

impl CacheService for RedisCacheService {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection_manager.clone();
        let result: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis GET failed: {}", e)))?;

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis SETEX failed: {}", e)))?;

        debug!(key = key, ttl_seconds = ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        let mut conn = self.connection_manager.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        // SET key value NX EX ttl replies OK when written, nil when the key exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis SET NX failed: {}", e)))?;

        let acquired = reply.is_some();
        debug!(key = key, acquired = acquired, "Cache SET NX");
        Ok(acquired)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis DEL failed: {}", e)))?;

        debug!(key = key, "Cache DEL");
        Ok(())
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        let mut conn = self.connection_manager.clone();

        let removed: i64 = redis::cmd("EVAL")
            .arg(COMPARE_AND_DELETE)
            .arg(1)
            .arg(key)
            .arg(expected)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                CacheError::BackendError(format!("Redis compare-and-DEL failed: {}", e))
            })?;

        debug!(key = key, removed = removed == 1, "Cache DEL IFEQ");
        Ok(removed == 1)
    }

    async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();

        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis PUBLISH failed: {}", e)))?;

        debug!(channel = channel, receivers = receivers, "Redis PUBLISH");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> CacheResult<PayloadStream> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to open Redis pub/sub connection: {}", e))
        })?;

        pubsub.subscribe(channel).await.map_err(|e| {
            CacheError::BackendError(format!("Redis SUBSCRIBE {} failed: {}", channel, e))
        })?;

        debug!(channel = channel, "Redis SUBSCRIBE");

        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                match msg.get_payload::<String>() {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        warn!(error = %e, "Dropping non-UTF-8 pub/sub payload");
                        None
                    }
                }
            });

        Ok(stream.boxed())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection_manager.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG")
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}
