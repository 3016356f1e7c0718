//! In-process cache provider
//!
//! A TTL-honoring key/value map with an atomic set-if-absent and an in-process
//! pub/sub bus. Behaves like a single Redis node shared by every clone of the
//! service, which makes it suitable for local development and for exercising
//! the coordination layer in tests. Expiry uses `tokio::time::Instant`, so
//! paused-clock tests observe TTLs deterministically.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::{CacheService, PayloadStream};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

const BUS_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug)]
struct MemoryInner {
    entries: DashMap<String, MemoryEntry>,
    bus: broadcast::Sender<(String, String)>,
    available: AtomicBool,
    operations: AtomicU64,
}

/// Shared in-memory cache store
#[derive(Debug, Clone)]
pub struct MemoryCacheService {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryCacheService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCacheService {
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                entries: DashMap::new(),
                bus,
                available: AtomicBool::new(true),
                operations: AtomicU64::new(0),
            }),
        }
    }

    /// Simulate the store going away (or coming back)
    ///
    /// While unavailable every operation fails with a connection error.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Number of store operations attempted so far
    pub fn operation_count(&self) -> u64 {
        self.inner.operations.load(Ordering::Relaxed)
    }

    /// Number of live (unexpired) keys
    pub fn live_keys(&self) -> usize {
        let now = Instant::now();
        self.inner
            .entries
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .count()
    }

    fn ensure_available(&self, operation: &str) -> CacheResult<()> {
        self.inner.operations.fetch_add(1, Ordering::Relaxed);
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::ConnectionError(format!(
                "in-memory store unavailable during {operation}"
            )))
        }
    }
}

impl CacheService for MemoryCacheService {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_available("GET")?;
        let now = Instant::now();

        let live = match self.inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };

        if live.is_none() {
            self.inner
                .entries
                .remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(live)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.ensure_available("SETEX")?;
        self.inner.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        self.ensure_available("SET NX")?;
        let now = Instant::now();
        let fresh = MemoryEntry {
            value: value.to_string(),
            expires_at: now + ttl,
        };

        let created = match self.inner.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    false
                } else {
                    occupied.insert(fresh);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                true
            }
        };
        Ok(created)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.ensure_available("DEL")?;
        self.inner.entries.remove(key);
        Ok(())
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        self.ensure_available("DEL IFEQ")?;
        let now = Instant::now();
        let removed = self
            .inner
            .entries
            .remove_if(key, |_, entry| entry.is_live(now) && entry.value == expected);
        Ok(removed.is_some())
    }

    async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()> {
        self.ensure_available("PUBLISH")?;
        // No subscribers is not an error, same as Redis returning 0 receivers
        let receivers = self
            .inner
            .bus
            .send((channel.to_string(), payload.to_string()))
            .unwrap_or(0);
        debug!(channel = channel, receivers = receivers, "In-memory PUBLISH");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> CacheResult<PayloadStream> {
        self.ensure_available("SUBSCRIBE")?;
        let receiver = self.inner.bus.subscribe();
        let channel = channel.to_string();

        let stream = futures::stream::unfold(receiver, move |mut receiver| {
            let channel = channel.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok((published_on, payload)) if published_on == channel => {
                            return Some((payload, receiver));
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                channel = %channel,
                                skipped = skipped,
                                "Subscriber lagged, messages skipped"
                            );
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(self.ensure_available("PING").is_ok())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
