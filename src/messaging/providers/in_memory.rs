//! # In-Memory Broker
//!
//! Records published messages per topic. Individual topics can be made to
//! reject publishes, which is how partial dispatch failures are exercised.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::messaging::errors::MessagingError;
use crate::messaging::message::QueueMessage;
use crate::messaging::traits::BrokerService;

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Vec<Vec<u8>>>,
    failing: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<RwLock<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish to `topic` fail until cleared
    pub async fn fail_topic(&self, topic: &str) {
        self.state.write().await.failing.insert(topic.to_string());
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failing.clear();
    }

    /// Decode every message published to `topic`, in publish order
    pub async fn messages<T: QueueMessage>(&self, topic: &str) -> Result<Vec<T>, MessagingError> {
        let state = self.state.read().await;
        state
            .topics
            .get(topic)
            .map(|payloads| payloads.iter().map(|bytes| T::from_bytes(bytes)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    pub async fn published_count(&self) -> usize {
        self.state.read().await.topics.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl BrokerService for InMemoryBroker {
    async fn ensure_topics(&self, topics: &[String]) -> Result<(), MessagingError> {
        let mut state = self.state.write().await;
        for topic in topics {
            state.topics.entry(topic.clone()).or_default();
        }
        Ok(())
    }

    async fn publish<T: QueueMessage>(
        &self,
        topic: &str,
        message: &T,
    ) -> Result<(), MessagingError> {
        let bytes = message.to_bytes()?;
        let mut state = self.state.write().await;
        if state.failing.contains(topic) {
            return Err(MessagingError::publish(topic, "broker rejected publish"));
        }
        state.topics.entry(topic.to_string()).or_default().push(bytes);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}
