//! Viewer retention analysis
//!
//! The analyzer is an external call that routinely times out. Network
//! failures are retried with linear backoff and, once exhausted, the report
//! stores a placeholder so the step can still complete.

use super::errors::UpstreamError;
use crate::resilience::{call_with_retry, RetryPolicy};
use crate::store::{ReportStore, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

pub const RETENTION_PLACEHOLDER: &str = "Viewer retention analysis failed (network timeout)";

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait RetentionAnalyzer: Send + Sync {
    async fn analyze(&self, video_id: &str, access_token: &str) -> Result<String, UpstreamError>;
}

pub struct RetentionAnalysisService {
    analyzer: Arc<dyn RetentionAnalyzer>,
    store: Arc<dyn ReportStore>,
    policy: RetryPolicy,
}

impl RetentionAnalysisService {
    pub fn new(
        analyzer: Arc<dyn RetentionAnalyzer>,
        store: Arc<dyn ReportStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            analyzer,
            store,
            policy,
        }
    }

    /// Analyze without persisting
    pub async fn analyze(
        &self,
        video_id: &str,
        access_token: &str,
    ) -> Result<String, UpstreamError> {
        call_with_retry(
            &self.policy,
            "retention_analysis",
            RETENTION_PLACEHOLDER.to_string(),
            || self.analyzer.analyze(video_id, access_token),
        )
        .await
    }

    /// Analyze and store the result (or the placeholder) on the report
    #[instrument(skip(self, access_token))]
    pub async fn analyze_and_store(
        &self,
        report_id: i64,
        video_id: &str,
        access_token: &str,
    ) -> Result<String, RetentionError> {
        let analysis = self.analyze(video_id, access_token).await?;
        self.store.save_leave_analysis(report_id, &analysis).await?;
        info!(report_id = report_id, "📊 Retention analysis stored");
        Ok(analysis)
    }
}
