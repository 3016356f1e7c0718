//! Stampede-safe fetch cache behavior against the in-memory cache store

mod common;

use common::{memory_fetch_cache, policy, CountingUpstream};
use report_coordinator::cache::{CacheClass, CacheService};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_upstream_fetch() {
    let (cache, _memory) = memory_fetch_cache(policy(300, 30));
    let upstream = CountingUpstream::new(Duration::from_secs(3));

    let callers: Vec<_> = (0..20)
        .map(|_| {
            let cache = cache.clone();
            let upstream = upstream.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch(CacheClass::VideoDetail, "abc", || upstream.fetch("abc"))
                    .await
            })
        })
        .collect();

    let mut values = Vec::new();
    for caller in callers {
        values.push(caller.await.unwrap().unwrap());
    }

    assert_eq!(upstream.calls(), 1);
    assert!(values.iter().all(|value| value == "abc#1"));
}

#[tokio::test(start_paused = true)]
async fn waiter_gives_up_after_poll_budget_and_fetches_once() {
    let (cache, _memory) = memory_fetch_cache(policy(300, 3));
    let upstream = CountingUpstream::new(Duration::from_secs(60));

    let leader = {
        let cache = cache.clone();
        let upstream = upstream.clone();
        tokio::spawn(async move {
            cache
                .get_or_fetch(CacheClass::Transcript, "slow", || upstream.fetch("slow"))
                .await
        })
    };
    // Let the leader take the lock first
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let started = tokio::time::Instant::now();
    let waiter = cache
        .get_or_fetch(CacheClass::Transcript, "slow", || upstream.fetch("slow"))
        .await
        .unwrap();

    assert_eq!(waiter, "slow#2");
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(leader.await.unwrap().unwrap(), "slow#1");
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn values_expire_after_ttl() {
    let (cache, _memory) = memory_fetch_cache(policy(300, 30));
    let upstream = CountingUpstream::new(Duration::ZERO);

    let first = cache
        .get_or_fetch(CacheClass::VideoDetail, "vid", || upstream.fetch("vid"))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(299)).await;
    let within_ttl = cache
        .get_or_fetch(CacheClass::VideoDetail, "vid", || upstream.fetch("vid"))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(2)).await;
    let after_ttl = cache
        .get_or_fetch(CacheClass::VideoDetail, "vid", || upstream.fetch("vid"))
        .await
        .unwrap();

    assert_eq!(first, "vid#1");
    assert_eq!(within_ttl, "vid#1");
    assert_eq!(after_ttl, "vid#2");
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_degrades_to_direct_fetch() {
    let (cache, memory) = memory_fetch_cache(policy(300, 30));
    memory.set_available(false);
    let upstream = CountingUpstream::new(Duration::ZERO);

    let first = cache
        .get_or_fetch(CacheClass::Transcript, "v", || upstream.fetch("v"))
        .await;
    let second = cache
        .get_or_fetch(CacheClass::Transcript, "v", || upstream.fetch("v"))
        .await;

    assert_eq!(first.unwrap(), "v#1");
    assert_eq!(second.unwrap(), "v#2");
    assert_eq!(memory.live_keys(), 0);
}

#[tokio::test(start_paused = true)]
async fn classes_do_not_share_entries() {
    let (cache, memory) = memory_fetch_cache(policy(300, 30));
    let upstream = CountingUpstream::new(Duration::ZERO);

    cache
        .get_or_fetch(CacheClass::VideoDetail, "same", || upstream.fetch("same"))
        .await
        .unwrap();
    cache
        .get_or_fetch(CacheClass::Transcript, "same", || upstream.fetch("same"))
        .await
        .unwrap();

    assert_eq!(upstream.calls(), 2);
    assert!(memory.get("video_detail:same").await.unwrap().is_some());
    assert!(memory.get("transcript:same").await.unwrap().is_some());
    assert!(memory.get("transcript:lock:same").await.unwrap().is_none());
}
