//! In-process report store
//!
//! Same semantics as the PostgreSQL store, with every operation applied under
//! one lock. Used for local development and tests.

use super::errors::{StoreError, StoreResult};
use super::traits::{ReportStore, StepUpdate};
use crate::models::{Report, ReportLog, Step, StepStatus, TaskRecord, UnitOfWork};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct MemoryState {
    next_report_id: i64,
    next_task_id: i64,
    reports: HashMap<i64, Report>,
    /// Keyed by report id
    tasks: HashMap<i64, TaskRecord>,
    logs: Vec<ReportLog>,
}

#[derive(Debug)]
pub struct InMemoryReportStore {
    state: Mutex<MemoryState>,
    available: AtomicBool,
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the database going away
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Archive a previous report snapshot
    pub fn insert_report_log(&self, log: ReportLog) {
        self.state.lock().logs.push(log);
    }

    /// Mutate a stored report in place (what the step workers do remotely)
    pub fn update_report<F>(&self, report_id: i64, update: F) -> bool
    where
        F: FnOnce(&mut Report),
    {
        match self.state.lock().reports.get_mut(&report_id) {
            Some(report) => {
                update(report);
                true
            }
            None => false,
        }
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store disabled".to_string()))
        }
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create_unit_of_work(&self, video_id: i64) -> StoreResult<UnitOfWork> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        state.next_report_id += 1;
        state.next_task_id += 1;
        let report = Report::new(state.next_report_id, video_id);
        let task = TaskRecord::new_pending(state.next_task_id, report.id);

        state.reports.insert(report.id, report.clone());
        state.tasks.insert(report.id, task.clone());

        Ok(UnitOfWork { report, task })
    }

    async fn find_task_by_report(&self, report_id: i64) -> StoreResult<Option<TaskRecord>> {
        self.ensure_available()?;
        Ok(self.state.lock().tasks.get(&report_id).cloned())
    }

    async fn mark_step(
        &self,
        report_id: i64,
        step: Step,
        status: StepStatus,
    ) -> StoreResult<Option<StepUpdate>> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        Ok(state.tasks.get_mut(&report_id).map(|task| {
            let changed = task.apply(step, status);
            StepUpdate {
                task: task.clone(),
                changed,
            }
        }))
    }

    async fn claim_reconciliation(&self, report_id: i64) -> StoreResult<bool> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        match state.tasks.get_mut(&report_id) {
            Some(task) if task.all_completed() && !task.reconciliation_triggered => {
                task.reconciliation_triggered = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_report(&self, report_id: i64) -> StoreResult<Option<Report>> {
        self.ensure_available()?;
        Ok(self.state.lock().reports.get(&report_id).cloned())
    }

    async fn find_latest_report_log(&self, video_id: i64) -> StoreResult<Option<ReportLog>> {
        self.ensure_available()?;
        let state = self.state.lock();

        Ok(state
            .logs
            .iter()
            .filter(|log| log.video_id == Some(video_id))
            .max_by_key(|log| (log.created_at, log.id))
            .cloned())
    }

    async fn save_update_summary(&self, report_id: i64, summary: &str) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let report = state.reports.get_mut(&report_id).ok_or(StoreError::NotFound {
            entity: "report",
            id: report_id,
        })?;
        report.update_summary = Some(summary.to_string());
        Ok(())
    }

    async fn save_leave_analysis(&self, report_id: i64, analysis: &str) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let report = state.reports.get_mut(&report_id).ok_or(StoreError::NotFound {
            entity: "report",
            id: report_id,
        })?;
        report.leave_analyze = Some(analysis.to_string());
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.ensure_available()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn log(id: i64, video_id: i64, age_days: i64) -> ReportLog {
        ReportLog {
            id,
            report_id: Some(id),
            video_id: Some(video_id),
            title: None,
            summary: None,
            view: None,
            like_count: None,
            comment: None,
            logged_at: None,
            created_at: Some(Utc::now() - Duration::days(age_days)),
        }
    }

    #[tokio::test]
    async fn test_unit_of_work_ids_are_linked() {
        let store = InMemoryReportStore::new();
        let first = store.create_unit_of_work(42).await.unwrap();
        let second = store.create_unit_of_work(42).await.unwrap();

        assert_eq!(first.task.report_id, first.report.id);
        assert_ne!(first.report.id, second.report.id);
        assert_eq!(first.report.video_id, 42);
    }

    #[tokio::test]
    async fn test_mark_step_is_monotonic() {
        let store = InMemoryReportStore::new();
        let work = store.create_unit_of_work(1).await.unwrap();
        let report_id = work.report.id;

        let first = store
            .mark_step(report_id, Step::Overview, StepStatus::Failed)
            .await
            .unwrap()
            .unwrap();
        assert!(first.changed);

        let second = store
            .mark_step(report_id, Step::Overview, StepStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert!(!second.changed);
        assert_eq!(second.task.overview_status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn test_unknown_report_has_no_update() {
        let store = InMemoryReportStore::new();
        let update = store
            .mark_step(999, Step::Analysis, StepStatus::Completed)
            .await
            .unwrap();
        assert!(update.is_none());
    }

    #[tokio::test]
    async fn test_claim_requires_both_steps_and_succeeds_once() {
        let store = InMemoryReportStore::new();
        let report_id = store.create_unit_of_work(1).await.unwrap().report.id;

        store
            .mark_step(report_id, Step::Overview, StepStatus::Completed)
            .await
            .unwrap();
        assert!(!store.claim_reconciliation(report_id).await.unwrap());

        store
            .mark_step(report_id, Step::Analysis, StepStatus::Completed)
            .await
            .unwrap();
        assert!(store.claim_reconciliation(report_id).await.unwrap());
        assert!(!store.claim_reconciliation(report_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_latest_log_is_newest_for_video() {
        let store = InMemoryReportStore::new();
        store.insert_report_log(log(1, 7, 30));
        store.insert_report_log(log(2, 7, 1));
        store.insert_report_log(log(3, 8, 0));

        let latest = store.find_latest_report_log(7).await.unwrap().unwrap();
        assert_eq!(latest.id, 2);
        assert!(store.find_latest_report_log(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = InMemoryReportStore::new();
        store.set_available(false);
        assert!(matches!(
            store.create_unit_of_work(1).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.health_check().await.is_err());
    }
}
