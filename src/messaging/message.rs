//! # Dispatch Messages
//!
//! Wire format of the per-step work messages consumed by remote workers.

use super::errors::MessagingError;
use crate::models::Step;
use serde::{Deserialize, Serialize};

/// Anything that can travel over the broker
pub trait QueueMessage: Send + Sync + Clone + 'static {
    fn to_bytes(&self) -> Result<Vec<u8>, MessagingError>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, MessagingError>
    where
        Self: Sized;
}

/// JSON encoding for every serde-compatible type
impl<T> QueueMessage for T
where
    T: Serialize + serde::de::DeserializeOwned + Send + Sync + Clone + 'static,
{
    fn to_bytes(&self) -> Result<Vec<u8>, MessagingError> {
        serde_json::to_vec(self).map_err(|e| MessagingError::message_serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, MessagingError> {
        serde_json::from_slice(bytes)
            .map_err(|e| MessagingError::message_deserialization(e.to_string()))
    }
}

/// One step of one report, as handed to a worker
///
/// Carries everything the worker needs; no further coordination happens
/// until the worker publishes its completion notification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub task_id: i64,
    pub report_id: i64,
    pub step: Step,
    pub google_access_token: String,
    /// Only present (and `true`) for the v2 pipeline
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_vector_save: bool,
}

impl std::fmt::Debug for DispatchMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMessage")
            .field("task_id", &self.task_id)
            .field("report_id", &self.report_id)
            .field("step", &self.step)
            .field("google_access_token", &token_preview(&self.google_access_token))
            .field("skip_vector_save", &self.skip_vector_save)
            .finish()
    }
}

/// First 20 characters of a credential, for logs
pub fn token_preview(token: &str) -> String {
    let preview: String = token.chars().take(20).collect();
    if preview.len() < token.len() {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_message_omits_skip_flag() {
        let message = DispatchMessage {
            task_id: 3,
            report_id: 9,
            step: Step::Overview,
            google_access_token: "ya29.token".to_string(),
            skip_vector_save: false,
        };
        let value: serde_json::Value =
            serde_json::from_slice(&message.to_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "task_id": 3,
                "report_id": 9,
                "step": "overview",
                "google_access_token": "ya29.token"
            })
        );
    }

    #[test]
    fn test_v2_message_carries_skip_flag() {
        let message = DispatchMessage {
            task_id: 3,
            report_id: 9,
            step: Step::Analysis,
            google_access_token: "t".to_string(),
            skip_vector_save: true,
        };
        let value: serde_json::Value =
            serde_json::from_slice(&message.to_bytes().unwrap()).unwrap();
        assert_eq!(value["skip_vector_save"], json!(true));
        assert_eq!(value["step"], json!("analysis"));
    }

    #[test]
    fn test_debug_never_prints_full_token() {
        let message = DispatchMessage {
            task_id: 1,
            report_id: 1,
            step: Step::Overview,
            google_access_token: "ya29.a0AfB_byC-very-long-secret-token".to_string(),
            skip_vector_save: false,
        };
        let rendered = format!("{message:?}");
        assert!(!rendered.contains("very-long-secret-token"));
        assert!(rendered.contains("ya29.a0AfB_byC-very"));
    }
}
