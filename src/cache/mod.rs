//! # Cache Module
//!
//! Shared key/value store with TTLs, an atomic set-if-absent, and pub/sub.
//! Used for two things: the stampede-safe fetch cache in front of upstream
//! calls, and the completion channel workers publish to.
//!
//! ## Architecture
//!
//! ```text
//! CacheProvider (enum)            <- Zero-cost dispatch, no vtable
//!   ├── Redis(RedisCacheService)    <- ConnectionManager + dedicated pub/sub connection
//!   ├── Memory(MemoryCacheService)  <- In-process map and broadcast bus
//!   └── NoOp(NoOpCacheService)      <- Always-miss, always-succeed fallback
//!
//! FetchCache                      <- get_or_fetch over a CacheProvider
//! ```
//!
//! ## Design Decisions
//!
//! - **Graceful degradation**: Redis failure at startup → NoOp, never blocks startup
//! - **Best-effort reads and writes**: cache errors turn into direct upstream fetches
//! - **One leader per key**: `SET lock NX EX` elects the fetcher, others poll

pub mod errors;
pub mod fetch;
pub mod provider;
pub mod providers;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use fetch::{CacheClass, CachePolicy, FetchCache};
pub use provider::CacheProvider;
pub use providers::{MemoryCacheService, NoOpCacheService};
pub use traits::{CacheService, PayloadStream};

#[cfg(feature = "cache-redis")]
pub use providers::RedisCacheService;
