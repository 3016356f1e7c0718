//! # Data Models
//!
//! Rows the coordination layer reads and writes. A dispatched report is a
//! unit of work: one `Report` row plus one `TaskRecord` tracking its steps.

pub mod report;
pub mod task;

pub use report::{Report, ReportLog};
pub use task::{Step, StepStatus, TaskRecord};

use serde::{Deserialize, Serialize};

/// Report and task created together by a dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfWork {
    pub report: Report,
    pub task: TaskRecord,
}
