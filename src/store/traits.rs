//! Persistence seam for reports and tasks

use super::errors::StoreResult;
use crate::models::{Report, ReportLog, Step, StepStatus, TaskRecord, UnitOfWork};
use async_trait::async_trait;

/// Result of a monotonic step transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpdate {
    /// Task state after the attempt
    pub task: TaskRecord,
    /// `false` when the step was already terminal (duplicate or late notification)
    pub changed: bool,
}

/// Reports, tasks and archived report logs
///
/// Every state-changing method is a single conditional write, so concurrent
/// listeners (in one process or many) cannot interleave a read-modify-write.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report and its task (tracked steps pending)
    async fn create_unit_of_work(&self, video_id: i64) -> StoreResult<UnitOfWork>;

    async fn find_task_by_report(&self, report_id: i64) -> StoreResult<Option<TaskRecord>>;

    /// Move `step` from pending to `status`
    ///
    /// Returns `None` when no task exists for the report. A step that is
    /// already terminal is left untouched and reported with `changed = false`.
    async fn mark_step(
        &self,
        report_id: i64,
        step: Step,
        status: StepStatus,
    ) -> StoreResult<Option<StepUpdate>>;

    /// Atomically claim the right to run reconciliation
    ///
    /// Succeeds (returns `true`) for exactly one caller per task, and only
    /// once every tracked step is completed.
    async fn claim_reconciliation(&self, report_id: i64) -> StoreResult<bool>;

    async fn find_report(&self, report_id: i64) -> StoreResult<Option<Report>>;

    /// Most recent archived report for a video, by creation time
    async fn find_latest_report_log(&self, video_id: i64) -> StoreResult<Option<ReportLog>>;

    async fn save_update_summary(&self, report_id: i64, summary: &str) -> StoreResult<()>;

    async fn save_leave_analysis(&self, report_id: i64, analysis: &str) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
