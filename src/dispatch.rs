//! # Work Dispatcher
//!
//! Creates a unit of work (report + task) and fans its two steps out to the
//! broker, one message per step topic.
//!
//! Persistence happens first. If publishing then fails for one of the steps
//! the unit of work stays in the store with that step pending forever; the
//! error names the step so operators can re-publish it. No compensation is
//! attempted here.

use crate::config::TopicsConfig;
use crate::messaging::{token_preview, BrokerProvider, DispatchMessage, MessagingError};
use crate::models::Step;
use crate::store::{ReportStore, StoreError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to persist unit of work: {0}")]
    Store(#[from] StoreError),

    /// The report exists but `step` (and any later step) was never published
    #[error("Report {report_id} persisted but publishing step '{step}' failed: {source}")]
    Publish {
        report_id: i64,
        task_id: i64,
        step: Step,
        #[source]
        source: MessagingError,
    },
}

/// Pipeline version requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchVariant {
    V1,
    /// Workers skip writing to the vector store
    V2,
}

impl DispatchVariant {
    pub fn topic<'a>(&self, topics: &'a TopicsConfig, step: Step) -> &'a str {
        match (self, step) {
            (Self::V1, Step::Overview) => &topics.overview,
            (Self::V1, Step::Analysis) => &topics.analysis,
            (Self::V2, Step::Overview) => &topics.overview_v2,
            (Self::V2, Step::Analysis) => &topics.analysis_v2,
        }
    }

    pub fn skip_vector_save(&self) -> bool {
        matches!(self, Self::V2)
    }
}

impl fmt::Display for DispatchVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    pub task_id: i64,
    pub report_id: i64,
    pub variant: DispatchVariant,
}

pub struct ReportDispatcher {
    store: Arc<dyn ReportStore>,
    broker: Arc<BrokerProvider>,
    topics: TopicsConfig,
}

impl ReportDispatcher {
    pub fn new(
        store: Arc<dyn ReportStore>,
        broker: Arc<BrokerProvider>,
        topics: TopicsConfig,
    ) -> Self {
        Self {
            store,
            broker,
            topics,
        }
    }

    /// Persist a new unit of work and publish its overview then analysis step
    pub async fn create_report(
        &self,
        video_id: i64,
        google_access_token: &str,
        variant: DispatchVariant,
    ) -> Result<DispatchReceipt, DispatchError> {
        info!(
            video_id = video_id,
            variant = %variant,
            token = %token_preview(google_access_token),
            "📝 Creating report"
        );

        let work = self.store.create_unit_of_work(video_id).await?;
        let receipt = DispatchReceipt {
            task_id: work.task.id,
            report_id: work.report.id,
            variant,
        };

        for step in Step::TRACKED {
            let topic = variant.topic(&self.topics, step);
            let message = DispatchMessage {
                task_id: receipt.task_id,
                report_id: receipt.report_id,
                step,
                google_access_token: google_access_token.to_string(),
                skip_vector_save: variant.skip_vector_save(),
            };

            if let Err(source) = self.broker.publish(topic, &message).await {
                error!(
                    report_id = receipt.report_id,
                    task_id = receipt.task_id,
                    step = %step,
                    topic = topic,
                    error = %source,
                    "❌ Dispatch publish failed; unit of work left with unpublished step"
                );
                return Err(DispatchError::Publish {
                    report_id: receipt.report_id,
                    task_id: receipt.task_id,
                    step,
                    source,
                });
            }

            info!(
                report_id = receipt.report_id,
                step = %step,
                topic = topic,
                "📤 Step dispatched"
            );
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_topics() {
        let topics = TopicsConfig::default();
        assert_eq!(DispatchVariant::V1.topic(&topics, Step::Overview), "overview-topic");
        assert_eq!(DispatchVariant::V1.topic(&topics, Step::Analysis), "analysis-topic");
        assert_eq!(DispatchVariant::V2.topic(&topics, Step::Overview), "overview-topic-v2");
        assert_eq!(DispatchVariant::V2.topic(&topics, Step::Analysis), "analysis-topic-v2");
        assert!(!DispatchVariant::V1.skip_vector_save());
        assert!(DispatchVariant::V2.skip_vector_save());
    }
}
