//! Cache service trait definition

use super::errors::CacheResult;
use futures::stream::BoxStream;
use std::time::Duration;

/// Stream of raw payloads received on a pub/sub channel
pub type PayloadStream = BoxStream<'static, String>;

/// Operations a cache store backend must provide
///
/// Mirrors the subset of the Redis protocol the coordination layer relies on:
/// `GET`, `SETEX`, `SET NX EX`, `DEL`, `PUBLISH` and `SUBSCRIBE`.
pub trait CacheService: Send + Sync {
    /// Get a value by key. `Ok(None)` on miss or expiry.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    /// Unconditionally set a value with a TTL
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Atomically set a value only if the key is absent.
    ///
    /// Returns `true` when this caller created the key.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    /// Delete a key (missing keys are not an error)
    fn delete(&self, key: &str) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Delete a key only while it still holds `expected`.
    ///
    /// Returns `true` when the key was removed.
    fn delete_if_equals(
        &self,
        key: &str,
        expected: &str,
    ) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    /// Publish a payload on a channel
    fn publish(
        &self,
        channel: &str,
        payload: &str,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Subscribe to a channel, yielding each message payload
    fn subscribe(
        &self,
        channel: &str,
    ) -> impl std::future::Future<Output = CacheResult<PayloadStream>> + Send;

    /// Check if the backend is reachable
    fn health_check(&self) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    /// Name of the provider, for logs and health output
    fn provider_name(&self) -> &'static str;
}
