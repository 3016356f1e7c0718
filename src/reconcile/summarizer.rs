//! Update-summary generation

use super::ReconcileError;
use crate::models::{Report, ReportLog};
use async_trait::async_trait;

/// Produces the "what changed since last time" text for a report
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn create_update_summary(
        &self,
        previous: &ReportLog,
        current: &Report,
    ) -> Result<String, ReconcileError>;
}

/// Deterministic field-by-field comparison
///
/// One line per metric (`views: 1200 → 1530 (+330)`) followed by notes on
/// changed text fields. Fields missing on either side are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricDiffSummarizer;

impl MetricDiffSummarizer {
    fn metric_line(label: &str, before: Option<i64>, after: Option<i64>) -> Option<String> {
        let (before, after) = (before?, after?);
        let delta = after - before;
        Some(format!("{label}: {before} → {after} ({delta:+})"))
    }

    fn text_line(label: &str, before: Option<&str>, after: Option<&str>) -> Option<String> {
        match (before, after) {
            (Some(before), Some(after)) if before.trim() != after.trim() => {
                Some(format!("{label} changed"))
            }
            _ => None,
        }
    }

    pub fn summarize(previous: &ReportLog, current: &Report) -> String {
        let lines: Vec<String> = [
            Self::metric_line("views", previous.view, current.view),
            Self::metric_line("likes", previous.like_count, current.like_count),
            Self::metric_line("comments", previous.comment, current.comment),
            Self::text_line("title", previous.title.as_deref(), current.title.as_deref()),
            Self::text_line(
                "summary",
                previous.summary.as_deref(),
                current.summary.as_deref(),
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        if lines.is_empty() {
            "No comparable changes since the previous report".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[async_trait]
impl SummaryGenerator for MetricDiffSummarizer {
    async fn create_update_summary(
        &self,
        previous: &ReportLog,
        current: &Report,
    ) -> Result<String, ReconcileError> {
        Ok(Self::summarize(previous, current))
    }
}
