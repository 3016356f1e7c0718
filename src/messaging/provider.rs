//! # Broker Provider Enum
//!
//! Enum dispatch over broker backends, avoiding trait objects for the
//! generic `publish`.

use super::errors::MessagingError;
use super::message::QueueMessage;
use super::providers::InMemoryBroker;
use super::traits::BrokerService;
use crate::config::BrokerConfig;
use tracing::info;

#[cfg(feature = "broker-rabbitmq")]
use super::providers::RabbitMqBroker;

#[derive(Debug)]
pub enum BrokerProvider {
    /// RabbitMQ via lapin (boxed to reduce enum size)
    #[cfg(feature = "broker-rabbitmq")]
    RabbitMq(Box<RabbitMqBroker>),

    /// In-process recorder for development and tests
    InMemory(InMemoryBroker),
}

impl BrokerProvider {
    /// Connect the configured backend and declare every configured topic
    ///
    /// Unlike the cache, a broker failure is fatal: work cannot be dispatched
    /// without it.
    pub async fn from_config(config: &BrokerConfig) -> Result<Self, MessagingError> {
        let provider = match config.backend.as_str() {
            "memory" => Self::InMemory(InMemoryBroker::new()),
            "rabbitmq" => Self::connect_rabbitmq(config).await?,
            other => {
                return Err(MessagingError::configuration(
                    "broker",
                    format!("unknown broker backend '{other}'"),
                ))
            }
        };

        let topics: Vec<String> = config.topics.all().iter().map(|t| t.to_string()).collect();
        provider.ensure_topics(&topics).await?;

        info!(
            provider = provider.provider_name(),
            topics = ?topics,
            "Broker ready"
        );
        Ok(provider)
    }

    #[cfg(feature = "broker-rabbitmq")]
    async fn connect_rabbitmq(config: &BrokerConfig) -> Result<Self, MessagingError> {
        Ok(Self::RabbitMq(Box::new(RabbitMqBroker::from_config(config).await?)))
    }

    #[cfg(not(feature = "broker-rabbitmq"))]
    async fn connect_rabbitmq(_config: &BrokerConfig) -> Result<Self, MessagingError> {
        Err(MessagingError::configuration(
            "broker",
            "rabbitmq backend requested but the 'broker-rabbitmq' feature is not enabled",
        ))
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "broker-rabbitmq")]
            Self::RabbitMq(s) => s.provider_name(),
            Self::InMemory(s) => s.provider_name(),
        }
    }

    pub async fn ensure_topics(&self, topics: &[String]) -> Result<(), MessagingError> {
        match self {
            #[cfg(feature = "broker-rabbitmq")]
            Self::RabbitMq(s) => s.ensure_topics(topics).await,
            Self::InMemory(s) => s.ensure_topics(topics).await,
        }
    }

    pub async fn publish<T: QueueMessage>(
        &self,
        topic: &str,
        message: &T,
    ) -> Result<(), MessagingError> {
        match self {
            #[cfg(feature = "broker-rabbitmq")]
            Self::RabbitMq(s) => s.publish(topic, message).await,
            Self::InMemory(s) => s.publish(topic, message).await,
        }
    }

    pub async fn health_check(&self) -> Result<bool, MessagingError> {
        match self {
            #[cfg(feature = "broker-rabbitmq")]
            Self::RabbitMq(s) => s.health_check().await,
            Self::InMemory(s) => s.health_check().await,
        }
    }
}
