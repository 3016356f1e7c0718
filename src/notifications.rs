//! # Completion Notifications
//!
//! Workers announce step outcomes on a single pub/sub channel using a
//! two-level envelope: the outer object's `message` field is itself a JSON
//! string.
//!
//! ```json
//! {"userId": "42", "message": "{\"status\":\"success\",\"step\":\"overview\",\"report\":17}"}
//! ```

use crate::cache::{CacheProvider, CacheResult};
use crate::models::Step;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILURE: &str = "failure";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("envelope is not valid JSON: {0}")]
    InvalidEnvelope(String),

    #[error("envelope has no message")]
    MissingMessage,

    #[error("message is not valid JSON: {0}")]
    InvalidMessage(String),

    #[error("message has no usable report id")]
    MissingReport,
}

/// Outer envelope as published on the channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEnvelope {
    #[serde(rename = "userId", default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    step: Option<String>,
    #[serde(default, alias = "report_id")]
    report: Option<Value>,
}

/// A decoded completion notification
///
/// Status and step are kept as received; deciding whether they are relevant
/// is the listener's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub user_id: Option<String>,
    pub report_id: i64,
    pub status: Option<String>,
    pub step: Option<String>,
}

impl CompletionNotice {
    /// Decode both envelope levels
    pub fn decode(raw: &str) -> Result<Self, NotificationError> {
        let envelope: CompletionEnvelope = serde_json::from_str(raw)
            .map_err(|e| NotificationError::InvalidEnvelope(e.to_string()))?;

        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or(NotificationError::MissingMessage)?;

        let payload: CompletionPayload = serde_json::from_str(&message)
            .map_err(|e| NotificationError::InvalidMessage(e.to_string()))?;

        let report_id = payload
            .report
            .as_ref()
            .and_then(report_id_from_value)
            .ok_or(NotificationError::MissingReport)?;

        Ok(Self {
            user_id: envelope.user_id,
            report_id,
            status: payload.status,
            step: payload.step,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// The tracked step this notice is about, if any
    pub fn tracked_step(&self) -> Option<Step> {
        self.step.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Report ids arrive as numbers, occasionally as numeric strings
fn report_id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Publishes completion notifications (the worker side of the channel)
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    cache: CacheProvider,
    channel: String,
}

impl CompletionNotifier {
    pub fn new(cache: CacheProvider, channel: impl Into<String>) -> Self {
        Self {
            cache,
            channel: channel.into(),
        }
    }

    /// Build the wire form of a notification
    pub fn encode(user_id: &str, report_id: i64, step: Step, succeeded: bool) -> String {
        let status = if succeeded {
            STATUS_SUCCESS
        } else {
            STATUS_FAILURE
        };
        let inner = serde_json::json!({
            "status": status,
            "step": step.as_str(),
            "report": report_id,
        });
        serde_json::json!({
            "userId": user_id,
            "message": inner.to_string(),
        })
        .to_string()
    }

    pub async fn notify(
        &self,
        user_id: &str,
        report_id: i64,
        step: Step,
        succeeded: bool,
    ) -> CacheResult<()> {
        let payload = Self::encode(user_id, report_id, step, succeeded);
        self.cache.publish(&self.channel, &payload).await?;
        debug!(
            channel = %self.channel,
            report_id = report_id,
            step = %step,
            succeeded = succeeded,
            "📣 Completion notification published"
        );
        Ok(())
    }
}
