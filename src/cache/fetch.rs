//! Stampede-safe read-through cache
//!
//! `FetchCache::get_or_fetch` serves a cached value when present. On a miss
//! exactly one caller (the one that wins `SET lock NX EX`) runs the upstream
//! fetch and writes the result; everyone else polls the value key at a fixed
//! interval and only fetches on their own once the poll bound is exhausted.
//!
//! The cache is strictly an optimization: any error talking to the store
//! turns the call into a plain, uncached fetch.

use super::errors::{CacheError, CacheResult};
use super::provider::CacheProvider;
use crate::config::{CacheClassConfig, CacheConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

static LOCK_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Value stored under a stampede lock, unique to one leader
///
/// Release compares against it, so a leader whose lock already expired
/// cannot delete the lock a later leader acquired.
fn lock_token() -> String {
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let sequence = LOCK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", std::process::id(), started, sequence)
}

/// Kinds of cached upstream data, each with its own key space and tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheClass {
    /// Volatile video metadata (statistics change), short TTL
    VideoDetail,
    /// Immutable transcripts, long TTL and expensive to fetch
    Transcript,
}

impl CacheClass {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::VideoDetail => "video_detail",
            Self::Transcript => "transcript",
        }
    }

    /// Value key, e.g. `transcript:dQw4w9WgXcQ`
    pub fn key(&self, subject: &str) -> String {
        format!("{}:{}", self.prefix(), subject)
    }

    /// Stampede lock key, e.g. `transcript:lock:dQw4w9WgXcQ`
    pub fn lock_key(&self, subject: &str) -> String {
        format!("{}:lock:{}", self.prefix(), subject)
    }
}

impl fmt::Display for CacheClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Timing policy for one cache class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime of a cached value
    pub ttl: Duration,
    /// Lifetime of the stampede lock; bounds how long a crashed holder blocks others.
    /// A fetch that outlives it loses exclusivity, but its release never
    /// removes a newer holder's lock.
    pub lock_ttl: Duration,
    /// Delay between polls while another caller holds the lock
    pub poll_interval: Duration,
    /// Number of polls before giving up and fetching directly
    pub poll_attempts: u32,
}

impl From<&CacheClassConfig> for CachePolicy {
    fn from(config: &CacheClassConfig) -> Self {
        Self {
            ttl: config.ttl(),
            lock_ttl: config.lock_ttl(),
            poll_interval: config.poll_interval(),
            poll_attempts: config.poll_attempts,
        }
    }
}

/// Outcome of the cache coordination phase, before any upstream call
enum Coordination<T> {
    Hit(T),
    Leader { token: String },
    WaitExhausted,
}

/// Read-through cache with stampede protection
#[derive(Debug, Clone)]
pub struct FetchCache {
    provider: CacheProvider,
    video_detail: CachePolicy,
    transcript: CachePolicy,
}

impl FetchCache {
    pub fn new(provider: CacheProvider, config: &CacheConfig) -> Self {
        Self {
            provider,
            video_detail: CachePolicy::from(&config.video_detail),
            transcript: CachePolicy::from(&config.transcript),
        }
    }

    /// Override the policy for one class
    pub fn with_policy(mut self, class: CacheClass, policy: CachePolicy) -> Self {
        match class {
            CacheClass::VideoDetail => self.video_detail = policy,
            CacheClass::Transcript => self.transcript = policy,
        }
        self
    }

    pub fn policy(&self, class: CacheClass) -> CachePolicy {
        match class {
            CacheClass::VideoDetail => self.video_detail,
            CacheClass::Transcript => self.transcript,
        }
    }

    pub fn provider(&self) -> &CacheProvider {
        &self.provider
    }

    /// Return the cached value for `subject`, or fetch (and cache) it
    ///
    /// `fetch` is invoked at most once per call. Its error is returned as-is
    /// and nothing is cached on failure. Cache store errors never surface.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        class: CacheClass,
        subject: &str,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.provider.is_enabled() {
            warn!(class = %class, subject = subject, "⚠️ Cache disabled, fetching directly");
            return fetch().await;
        }

        let policy = self.policy(class);
        let key = class.key(subject);
        let lock_key = class.lock_key(subject);

        match self.coordinate::<T>(&key, &lock_key, &policy).await {
            Ok(Coordination::Hit(value)) => Ok(value),
            Ok(Coordination::Leader { token }) => {
                let lock = LockGuard::new(self.provider.clone(), &lock_key, token);
                self.fetch_as_leader(&key, lock, &policy, fetch).await
            }
            Ok(Coordination::WaitExhausted) => {
                warn!(
                    key = %key,
                    attempts = policy.poll_attempts,
                    "⏰ Timed out waiting for another fetcher, fetching directly"
                );
                fetch().await
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache unusable for this call, fetching directly");
                fetch().await
            }
        }
    }

    async fn coordinate<T: DeserializeOwned>(
        &self,
        key: &str,
        lock_key: &str,
        policy: &CachePolicy,
    ) -> CacheResult<Coordination<T>> {
        if let Some(value) = self.read(key).await? {
            info!(key = key, "✅ Cache hit");
            return Ok(Coordination::Hit(value));
        }

        let token = lock_token();
        if self
            .provider
            .set_if_absent(lock_key, &token, policy.lock_ttl)
            .await?
        {
            info!(key = key, "🔒 Lock acquired, fetching from upstream");
            return Ok(Coordination::Leader { token });
        }

        info!(key = key, "⏳ Another caller is fetching, waiting for its result");
        for attempt in 1..=policy.poll_attempts {
            tokio::time::sleep(policy.poll_interval).await;
            if let Some(value) = self.read(key).await? {
                info!(key = key, attempt = attempt, "✅ Cache hit after waiting");
                return Ok(Coordination::Hit(value));
            }
        }

        Ok(Coordination::WaitExhausted)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.provider.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::SerializationError(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    async fn fetch_as_leader<T, E, F, Fut>(
        &self,
        key: &str,
        lock: LockGuard,
        policy: &CachePolicy,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let result = fetch().await;

        if let Ok(value) = &result {
            match serde_json::to_string(value) {
                Ok(raw) => match self.provider.set(key, &raw, policy.ttl).await {
                    Ok(()) => info!(
                        key = key,
                        ttl_seconds = policy.ttl.as_secs(),
                        "💾 Cached upstream result"
                    ),
                    Err(e) => warn!(key = key, error = %e, "Failed to write cache entry"),
                },
                Err(e) => warn!(key = key, error = %e, "Failed to serialize value for cache"),
            }
        }

        // Value (if any) is written before the lock goes away
        lock.release().await;
        result
    }
}

/// Releases a stampede lock on every exit path
///
/// Release only deletes the lock while it still holds this guard's token.
/// The normal path awaits `release`. If the owning future is dropped mid-fetch
/// the guard spawns the release on the current runtime; failing that, the
/// lock's own TTL reclaims it.
struct LockGuard {
    provider: CacheProvider,
    key: String,
    token: String,
    released: bool,
}

impl LockGuard {
    fn new(provider: CacheProvider, key: &str, token: String) -> Self {
        Self {
            provider,
            key: key.to_string(),
            token,
            released: false,
        }
    }

    async fn release(mut self) {
        self.released = true;
        match self.provider.delete_if_equals(&self.key, &self.token).await {
            Ok(true) => debug!(key = %self.key, "🔓 Lock released"),
            Ok(false) => warn!(
                key = %self.key,
                "Lock expired before release and may belong to another fetcher, left in place"
            ),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to release lock, it will expire by TTL")
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let provider = self.provider.clone();
            let key = std::mem::take(&mut self.key);
            let token = std::mem::take(&mut self.token);
            handle.spawn(async move {
                if let Err(e) = provider.delete_if_equals(&key, &token).await {
                    warn!(key = %key, error = %e, "Failed to release abandoned lock");
                }
            });
        }
    }
}
