//! Cached video transcripts
//!
//! Transcripts never change once published and are slow to fetch, so they
//! live in the long-TTL cache class behind the stampede lock.

use super::errors::UpstreamError;
use crate::cache::{CacheClass, FetchCache};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One caption as delivered by the transcript provider
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSnippet {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl From<CaptionSnippet> for TranscriptLine {
    fn from(snippet: CaptionSnippet) -> Self {
        Self {
            end_time: snippet.start + snippet.duration,
            start_time: snippet.start,
            text: snippet.text,
        }
    }
}

/// Raw transcript provider
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Captions in the first available language of `languages`
    async fn fetch_captions(
        &self,
        video_id: &str,
        languages: &[&str],
    ) -> Result<Vec<CaptionSnippet>, UpstreamError>;
}

pub const DEFAULT_LANGUAGES: [&str; 2] = ["ko", "en"];

pub struct TranscriptService {
    cache: FetchCache,
    source: Arc<dyn TranscriptSource>,
}

impl TranscriptService {
    pub fn new(cache: FetchCache, source: Arc<dyn TranscriptSource>) -> Self {
        Self { cache, source }
    }

    pub async fn get_structured_transcript(
        &self,
        video_id: &str,
    ) -> Result<Vec<TranscriptLine>, UpstreamError> {
        self.cache
            .get_or_fetch(CacheClass::Transcript, video_id, || async {
                let captions = self
                    .source
                    .fetch_captions(video_id, &DEFAULT_LANGUAGES)
                    .await?;
                Ok(captions.into_iter().map(TranscriptLine::from).collect())
            })
            .await
    }

    /// One `text (m:ss - m:ss)` line per caption; empty when there are none
    pub async fn get_formatted_transcript(&self, video_id: &str) -> Result<String, UpstreamError> {
        let lines = self.get_structured_transcript(video_id).await?;
        Ok(format_transcript(&lines))
    }
}

pub fn format_transcript(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "{} ({} - {})",
                line.text,
                format_time(line.start_time),
                format_time(line.end_time)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
