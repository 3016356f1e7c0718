//! Shared fixtures for integration tests
#![allow(dead_code)]

use report_coordinator::cache::{
    CacheClass, CachePolicy, CacheProvider, FetchCache, MemoryCacheService,
};
use report_coordinator::config::CacheConfig;
use report_coordinator::listener::{CompletionListener, MessageOutcome};
use report_coordinator::models::{ReportLog, Step};
use report_coordinator::notifications::CompletionNotifier;
use report_coordinator::reconcile::UpdateSummaryReconciler;
use report_coordinator::store::{InMemoryReportStore, ReportStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fetch cache over a fresh in-memory store with one policy for every class
pub fn memory_fetch_cache(policy: CachePolicy) -> (FetchCache, MemoryCacheService) {
    let memory = MemoryCacheService::new();
    let cache = FetchCache::new(CacheProvider::memory(memory.clone()), &CacheConfig::default())
        .with_policy(CacheClass::VideoDetail, policy)
        .with_policy(CacheClass::Transcript, policy);
    (cache, memory)
}

pub fn policy(ttl_secs: u64, poll_attempts: u32) -> CachePolicy {
    CachePolicy {
        ttl: Duration::from_secs(ttl_secs),
        lock_ttl: Duration::from_secs(30),
        poll_interval: Duration::from_secs(1),
        poll_attempts,
    }
}

/// Counts upstream calls; every call sleeps `latency` then answers
#[derive(Clone)]
pub struct CountingUpstream {
    calls: Arc<AtomicUsize>,
    latency: Duration,
}

impl CountingUpstream {
    pub fn new(latency: Duration) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            latency,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn fetch(&self, subject: &str) -> Result<String, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.latency).await;
        Ok(format!("{subject}#{call}"))
    }
}

pub struct ListenerFixture {
    pub store: Arc<InMemoryReportStore>,
    pub listener: CompletionListener,
}

impl ListenerFixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryReportStore::new());
        let reconciler = Arc::new(UpdateSummaryReconciler::with_metric_diff(store.clone()));
        let listener = CompletionListener::new(store.clone(), reconciler);
        Self { store, listener }
    }

    /// A second listener process sharing the same store
    pub fn peer(&self) -> CompletionListener {
        let reconciler = Arc::new(UpdateSummaryReconciler::with_metric_diff(self.store.clone()));
        CompletionListener::new(self.store.clone(), reconciler)
    }

    pub async fn dispatched_report(&self, video_id: i64) -> i64 {
        self.store
            .create_unit_of_work(video_id)
            .await
            .expect("unit of work")
            .report
            .id
    }
}

pub fn success(report_id: i64, step: Step) -> String {
    CompletionNotifier::encode("user-1", report_id, step, true)
}

pub fn failure(report_id: i64, step: Step) -> String {
    CompletionNotifier::encode("user-1", report_id, step, false)
}

pub fn reconciled_count(outcomes: &[MessageOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|outcome| matches!(outcome, MessageOutcome::Reconciled { .. }))
        .count()
}

pub fn previous_log(id: i64, video_id: i64, view: i64) -> ReportLog {
    ReportLog {
        id,
        report_id: None,
        video_id: Some(video_id),
        title: Some("Old title".to_string()),
        summary: None,
        view: Some(view),
        like_count: Some(10),
        comment: Some(1),
        logged_at: None,
        created_at: None,
    }
}
