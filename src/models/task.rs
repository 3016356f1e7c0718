//! # Task Model
//!
//! Per-report progress record. A task tracks the two independently processed
//! steps of a report (`overview` and `analysis`) plus the legacy `idea` step,
//! which is created already completed and never tracked.
//!
//! ## Status transitions
//!
//! ```text
//! pending ──► completed
//!    └──────► failed
//! ```
//!
//! Terminal statuses never change again. A late or duplicated notification
//! for a step that is already terminal is a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dispatched, independently processed unit of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Overview,
    Analysis,
}

impl Step {
    /// Steps whose completion gates reconciliation
    pub const TRACKED: [Step; 2] = [Step::Overview, Step::Analysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Analysis => "analysis",
        }
    }

    /// Column holding this step's status
    pub fn status_column(&self) -> &'static str {
        match self {
            Self::Overview => "overview_status",
            Self::Analysis => "analysis_status",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overview" => Ok(Self::Overview),
            "analysis" => Ok(Self::Analysis),
            other => Err(format!("unknown step '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The status after attempting to move to `target`
    ///
    /// Returns `None` when the transition is not allowed: leaving a terminal
    /// status, or "advancing" to `Pending`.
    pub fn advance(self, target: StepStatus) -> Option<StepStatus> {
        match (self, target) {
            (Self::Pending, Self::Completed | Self::Failed) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown step status '{other}'")),
        }
    }
}

/// Task row: one per report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub report_id: i64,
    pub overview_status: StepStatus,
    pub analysis_status: StepStatus,
    pub idea_status: StepStatus,
    /// Set exactly once, by whoever claims reconciliation
    pub reconciliation_triggered: bool,
}

impl TaskRecord {
    /// A freshly dispatched task: tracked steps pending, idea already done
    pub fn new_pending(id: i64, report_id: i64) -> Self {
        Self {
            id,
            report_id,
            overview_status: StepStatus::Pending,
            analysis_status: StepStatus::Pending,
            idea_status: StepStatus::Completed,
            reconciliation_triggered: false,
        }
    }

    pub fn status(&self, step: Step) -> StepStatus {
        match step {
            Step::Overview => self.overview_status,
            Step::Analysis => self.analysis_status,
        }
    }

    /// Apply a monotonic transition; `true` when the status changed
    pub fn apply(&mut self, step: Step, target: StepStatus) -> bool {
        let Some(next) = self.status(step).advance(target) else {
            return false;
        };
        match step {
            Step::Overview => self.overview_status = next,
            Step::Analysis => self.analysis_status = next,
        }
        true
    }

    pub fn all_completed(&self) -> bool {
        Step::TRACKED
            .iter()
            .all(|step| self.status(*step) == StepStatus::Completed)
    }

    pub fn is_settled(&self) -> bool {
        Step::TRACKED.iter().all(|step| self.status(*step).is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_never_move() {
        for terminal in [StepStatus::Completed, StepStatus::Failed] {
            for target in [StepStatus::Pending, StepStatus::Completed, StepStatus::Failed] {
                assert_eq!(terminal.advance(target), None);
            }
        }
        assert_eq!(StepStatus::Pending.advance(StepStatus::Pending), None);
    }

    #[test]
    fn test_new_task_shape() {
        let task = TaskRecord::new_pending(1, 10);
        assert_eq!(task.overview_status, StepStatus::Pending);
        assert_eq!(task.analysis_status, StepStatus::Pending);
        assert_eq!(task.idea_status, StepStatus::Completed);
        assert!(!task.is_settled());
        assert!(!task.all_completed());
    }

    #[test]
    fn test_settled_with_failure_is_not_all_completed() {
        let mut task = TaskRecord::new_pending(1, 10);
        assert!(task.apply(Step::Overview, StepStatus::Completed));
        assert!(task.apply(Step::Analysis, StepStatus::Failed));
        assert!(task.is_settled());
        assert!(!task.all_completed());
        assert!(!task.apply(Step::Analysis, StepStatus::Completed));
    }

    #[test]
    fn test_step_wire_names() {
        assert_eq!(serde_json::to_string(&Step::Overview).unwrap(), "\"overview\"");
        assert_eq!("analysis".parse::<Step>().unwrap(), Step::Analysis);
        assert!("idea".parse::<Step>().is_err());
        assert_eq!(
            serde_json::to_string(&StepStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
