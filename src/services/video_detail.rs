//! Cached video metadata
//!
//! Statistics move quickly, so details use the short-TTL cache class.

use super::errors::UpstreamError;
use crate::cache::{CacheClass, FetchCache};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub published_at: String,
    pub channel_id: String,
    pub channel_title: String,
    pub duration: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
}

/// Raw metadata provider
#[async_trait]
pub trait VideoDetailSource: Send + Sync {
    async fn fetch_details(&self, video_id: &str) -> Result<VideoDetails, UpstreamError>;
}

pub struct VideoDetailService {
    cache: FetchCache,
    source: Arc<dyn VideoDetailSource>,
}

impl VideoDetailService {
    pub fn new(cache: FetchCache, source: Arc<dyn VideoDetailSource>) -> Self {
        Self { cache, source }
    }

    pub async fn get_video_details(&self, video_id: &str) -> Result<VideoDetails, UpstreamError> {
        self.cache
            .get_or_fetch(CacheClass::VideoDetail, video_id, || {
                self.source.fetch_details(video_id)
            })
            .await
    }
}
