//! # Broker Service Trait

use super::errors::MessagingError;
use super::message::QueueMessage;
use async_trait::async_trait;

/// Topic-based publish operations a broker backend must provide
///
/// Delivery is at-least-once; consumers never rely on deduplication here.
#[async_trait]
pub trait BrokerService: Send + Sync + 'static {
    /// Declare topics (idempotent) so messages published before any worker
    /// connects are retained
    async fn ensure_topics(&self, topics: &[String]) -> Result<(), MessagingError>;

    /// Publish one message, returning once the broker has accepted it
    async fn publish<T: QueueMessage>(&self, topic: &str, message: &T)
        -> Result<(), MessagingError>;

    async fn health_check(&self) -> Result<bool, MessagingError>;

    fn provider_name(&self) -> &'static str;
}
