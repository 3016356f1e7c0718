//! Cached upstream services over the in-memory cache store

mod common;

use async_trait::async_trait;
use common::{memory_fetch_cache, policy};
use report_coordinator::cache::CacheService;
use report_coordinator::services::{
    CaptionSnippet, TranscriptService, TranscriptSource, UpstreamError, VideoDetailService,
    VideoDetailSource, VideoDetails,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeTranscripts {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch_captions(
        &self,
        _video_id: &str,
        languages: &[&str],
    ) -> Result<Vec<CaptionSnippet>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(languages, ["ko", "en"]);
        if self.fail {
            return Err(UpstreamError::Connection("refused".to_string()));
        }
        Ok(vec![
            CaptionSnippet {
                text: "intro".to_string(),
                start: 0.0,
                duration: 4.5,
            },
            CaptionSnippet {
                text: "main point".to_string(),
                start: 65.0,
                duration: 10.0,
            },
        ])
    }
}

struct FakeDetails {
    calls: AtomicUsize,
}

#[async_trait]
impl VideoDetailSource for FakeDetails {
    async fn fetch_details(&self, _video_id: &str) -> Result<VideoDetails, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(VideoDetails {
            title: "A video".to_string(),
            view_count: 1234,
            ..VideoDetails::default()
        })
    }
}

#[tokio::test]
async fn transcript_is_fetched_once_and_formatted() {
    let (cache, memory) = memory_fetch_cache(policy(2_592_000, 30));
    let source = Arc::new(FakeTranscripts::default());
    let service = TranscriptService::new(cache, source.clone());

    let formatted = service.get_formatted_transcript("vid").await.unwrap();
    let structured = service.get_structured_transcript("vid").await.unwrap();

    assert_eq!(formatted, "intro (0:00 - 0:04)\nmain point (1:05 - 1:15)");
    assert_eq!(structured.len(), 2);
    assert_eq!(structured[1].end_time, 75.0);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(memory.get("transcript:vid").await.unwrap().is_some());
}

#[tokio::test]
async fn failed_transcript_fetch_is_not_cached() {
    let (cache, memory) = memory_fetch_cache(policy(2_592_000, 30));
    let source = Arc::new(FakeTranscripts {
        fail: true,
        ..FakeTranscripts::default()
    });
    let service = TranscriptService::new(cache, source.clone());

    assert!(service.get_structured_transcript("vid").await.is_err());
    assert!(service.get_structured_transcript("vid").await.is_err());

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert!(memory.get("transcript:vid").await.unwrap().is_none());
    assert!(memory.get("transcript:lock:vid").await.unwrap().is_none());
}

#[tokio::test]
async fn video_details_are_cached_per_video() {
    let (cache, _memory) = memory_fetch_cache(policy(300, 30));
    let source = Arc::new(FakeDetails {
        calls: AtomicUsize::new(0),
    });
    let service = VideoDetailService::new(cache, source.clone());

    let first = service.get_video_details("a").await.unwrap();
    let again = service.get_video_details("a").await.unwrap();
    service.get_video_details("b").await.unwrap();

    assert_eq!(first, again);
    assert_eq!(first.view_count, 1234);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}
