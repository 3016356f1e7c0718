//! # Reconciliation
//!
//! The action run once per unit of work after both steps completed: compare
//! the new report with the most recent archived report for the same video and
//! store an update summary.

pub mod summarizer;

pub use summarizer::{MetricDiffSummarizer, SummaryGenerator};

use crate::store::{ReportStore, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Report {0} not found")]
    ReportNotFound(i64),

    #[error("Store error during reconciliation: {0}")]
    Store(#[from] StoreError),

    #[error("Summary generation failed: {0}")]
    Generation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// First report for this video; nothing to compare against
    NoPreviousReport,
    Summarized { summary: String },
}

/// Downstream action triggered by the completion listener
#[async_trait]
pub trait Reconciler: Send + Sync {
    async fn reconcile(&self, report_id: i64) -> Result<ReconcileOutcome, ReconcileError>;
}

pub struct UpdateSummaryReconciler {
    store: Arc<dyn ReportStore>,
    generator: Arc<dyn SummaryGenerator>,
}

impl UpdateSummaryReconciler {
    pub fn new(store: Arc<dyn ReportStore>, generator: Arc<dyn SummaryGenerator>) -> Self {
        Self { store, generator }
    }

    /// Reconciler backed by the built-in metric diff
    pub fn with_metric_diff(store: Arc<dyn ReportStore>) -> Self {
        Self::new(store, Arc::new(MetricDiffSummarizer))
    }
}

#[async_trait]
impl Reconciler for UpdateSummaryReconciler {
    async fn reconcile(&self, report_id: i64) -> Result<ReconcileOutcome, ReconcileError> {
        info!(report_id = report_id, "🔄 Generating update summary");

        let report = self
            .store
            .find_report(report_id)
            .await?
            .ok_or(ReconcileError::ReportNotFound(report_id))?;

        let Some(previous) = self.store.find_latest_report_log(report.video_id).await? else {
            info!(
                report_id = report_id,
                video_id = report.video_id,
                "No previous report for video, skipping update summary"
            );
            return Ok(ReconcileOutcome::NoPreviousReport);
        };

        let summary = self.generator.create_update_summary(&previous, &report).await?;
        self.store.save_update_summary(report_id, &summary).await?;

        Ok(ReconcileOutcome::Summarized { summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportLog;
    use crate::store::InMemoryReportStore;

    #[tokio::test]
    async fn test_missing_report_is_error() {
        let store = Arc::new(InMemoryReportStore::new());
        let reconciler = UpdateSummaryReconciler::with_metric_diff(store);
        assert!(matches!(
            reconciler.reconcile(404).await,
            Err(ReconcileError::ReportNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_first_report_has_nothing_to_compare() {
        let store = Arc::new(InMemoryReportStore::new());
        let report_id = store.create_unit_of_work(5).await.unwrap().report.id;
        let reconciler = UpdateSummaryReconciler::with_metric_diff(store.clone());

        assert_eq!(
            reconciler.reconcile(report_id).await.unwrap(),
            ReconcileOutcome::NoPreviousReport
        );
        let report = store.find_report(report_id).await.unwrap().unwrap();
        assert_eq!(report.update_summary, None);
    }

    #[tokio::test]
    async fn test_summary_is_persisted() {
        let store = Arc::new(InMemoryReportStore::new());
        let report_id = store.create_unit_of_work(5).await.unwrap().report.id;
        store.update_report(report_id, |r| r.view = Some(150));
        store.insert_report_log(ReportLog {
            id: 1,
            report_id: Some(99),
            video_id: Some(5),
            title: None,
            summary: None,
            view: Some(100),
            like_count: None,
            comment: None,
            logged_at: None,
            created_at: None,
        });

        let reconciler = UpdateSummaryReconciler::with_metric_diff(store.clone());
        let outcome = reconciler.reconcile(report_id).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Summarized {
                summary: "views: 100 → 150 (+50)".to_string()
            }
        );
        let report = store.find_report(report_id).await.unwrap().unwrap();
        assert_eq!(report.update_summary.as_deref(), Some("views: 100 → 150 (+50)"));
    }
}
