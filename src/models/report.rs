//! # Report Models
//!
//! `Report` is the live analytical report for a video. `ReportLog` is an
//! archived snapshot of an earlier report for the same video; the newest log
//! is "the previous report" that update summaries compare against.
//!
//! Only the columns read or written by the coordination layer are mapped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: i64,
    pub video_id: i64,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub leave_analyze: Option<String>,
    pub optimization: Option<String>,
    pub view: Option<i64>,
    pub like_count: Option<i64>,
    pub comment: Option<i64>,
    pub update_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// An empty report row as created at dispatch time
    pub fn new(id: i64, video_id: i64) -> Self {
        Self {
            id,
            video_id,
            title: None,
            summary: None,
            leave_analyze: None,
            optimization: None,
            view: None,
            like_count: None,
            comment: None,
            update_summary: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReportLog {
    pub id: i64,
    pub report_id: Option<i64>,
    pub video_id: Option<i64>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub view: Option<i64>,
    pub like_count: Option<i64>,
    pub comment: Option<i64>,
    pub logged_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}
