//! PostgreSQL report store
//!
//! Step transitions and the reconciliation claim are single conditional
//! `UPDATE ... WHERE` statements, so they stay correct with any number of
//! listener processes.

use super::errors::{StoreError, StoreResult};
use super::traits::{ReportStore, StepUpdate};
use crate::config::DatabaseConfig;
use crate::config::loader::redact_credentials;
use crate::models::{Report, ReportLog, Step, StepStatus, TaskRecord, UnitOfWork};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const TASK_COLUMNS: &str =
    "id, report_id, overview_status, analysis_status, idea_status, reconciliation_triggered";

const REPORT_COLUMNS: &str = "id, video_id, title, summary, leave_analyze, optimization, view, \
     like_count, comment, update_summary, created_at";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    report_id: i64,
    overview_status: String,
    analysis_status: String,
    idea_status: String,
    reconciliation_triggered: bool,
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            report_id: row.report_id,
            overview_status: parse_status("task.overview_status", &row.overview_status)?,
            analysis_status: parse_status("task.analysis_status", &row.analysis_status)?,
            idea_status: parse_status("task.idea_status", &row.idea_status)?,
            reconciliation_triggered: row.reconciliation_triggered,
        })
    }
}

fn parse_status(field: &'static str, raw: &str) -> StoreResult<StepStatus> {
    raw.parse()
        .map_err(|reason| StoreError::Serialization { field, reason })
}

#[derive(Debug, Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool and optionally apply embedded migrations
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config.url.as_deref().ok_or_else(|| {
            StoreError::Unavailable("database.url is not configured".to_string())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .test_before_acquire(true)
            .connect(url)
            .await?;

        if config.run_migrations {
            MIGRATOR.run(&pool).await?;
            debug!("Database migrations applied");
        }

        info!(
            url = %redact_credentials(url),
            max_connections = config.max_connections,
            "✅ PostgreSQL report store connected"
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn create_unit_of_work(&self, video_id: i64) -> StoreResult<UnitOfWork> {
        let mut tx = self.pool.begin().await?;

        let report: Report = sqlx::query_as(&format!(
            "INSERT INTO report (video_id) VALUES ($1) RETURNING {REPORT_COLUMNS}"
        ))
        .bind(video_id)
        .fetch_one(&mut *tx)
        .await?;

        let task: TaskRow = sqlx::query_as(&format!(
            "INSERT INTO task (report_id, overview_status, analysis_status, idea_status) \
             VALUES ($1, $2, $3, $4) RETURNING {TASK_COLUMNS}"
        ))
        .bind(report.id)
        .bind(StepStatus::Pending.as_str())
        .bind(StepStatus::Pending.as_str())
        .bind(StepStatus::Completed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UnitOfWork {
            report,
            task: task.try_into()?,
        })
    }

    async fn find_task_by_report(&self, report_id: i64) -> StoreResult<Option<TaskRecord>> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE report_id = $1"
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskRecord::try_from).transpose()
    }

    async fn mark_step(
        &self,
        report_id: i64,
        step: Step,
        status: StepStatus,
    ) -> StoreResult<Option<StepUpdate>> {
        if StepStatus::Pending.advance(status).is_none() {
            return Ok(self
                .find_task_by_report(report_id)
                .await?
                .map(|task| StepUpdate {
                    task,
                    changed: false,
                }));
        }

        let column = step.status_column();
        let updated: Option<TaskRow> = sqlx::query_as(&format!(
            "UPDATE task SET {column} = $1 \
             WHERE report_id = $2 AND {column} = 'pending' \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok(Some(StepUpdate {
                task: row.try_into()?,
                changed: true,
            })),
            None => Ok(self
                .find_task_by_report(report_id)
                .await?
                .map(|task| StepUpdate {
                    task,
                    changed: false,
                })),
        }
    }

    async fn claim_reconciliation(&self, report_id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE task SET reconciliation_triggered = TRUE \
             WHERE report_id = $1 \
               AND reconciliation_triggered = FALSE \
               AND overview_status = 'completed' \
               AND analysis_status = 'completed'",
        )
        .bind(report_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_report(&self, report_id: i64) -> StoreResult<Option<Report>> {
        let report = sqlx::query_as(&format!(
            "SELECT {REPORT_COLUMNS} FROM report WHERE id = $1"
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    async fn find_latest_report_log(&self, video_id: i64) -> StoreResult<Option<ReportLog>> {
        let log = sqlx::query_as(
            "SELECT id, report_id, video_id, title, summary, view, like_count, comment, \
                    logged_at, created_at \
             FROM report_log \
             WHERE video_id = $1 \
             ORDER BY created_at DESC NULLS LAST, id DESC \
             LIMIT 1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(log)
    }

    async fn save_update_summary(&self, report_id: i64, summary: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE report SET update_summary = $1 WHERE id = $2")
            .bind(summary)
            .bind(report_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "report",
                id: report_id,
            });
        }
        Ok(())
    }

    async fn save_leave_analysis(&self, report_id: i64, analysis: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE report SET leave_analyze = $1 WHERE id = $2")
            .bind(analysis)
            .bind(report_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "report",
                id: report_id,
            });
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(overview: &str) -> TaskRow {
        TaskRow {
            id: 1,
            report_id: 2,
            overview_status: overview.to_string(),
            analysis_status: "pending".to_string(),
            idea_status: "completed".to_string(),
            reconciliation_triggered: false,
        }
    }

    #[test]
    fn test_task_row_maps_statuses() {
        let task = TaskRecord::try_from(row("completed")).unwrap();
        assert_eq!(task.overview_status, StepStatus::Completed);
        assert_eq!(task.analysis_status, StepStatus::Pending);
    }

    #[test]
    fn test_unknown_status_text_is_corrupt() {
        assert!(matches!(
            TaskRecord::try_from(row("COMPLETED")),
            Err(StoreError::Serialization {
                field: "task.overview_status",
                ..
            })
        ));
    }
}
