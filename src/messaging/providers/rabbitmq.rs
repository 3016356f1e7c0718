//! # RabbitMQ Broker
//!
//! Topic-exchange publisher on top of `lapin`.
//!
//! ## Topology
//!
//! ```text
//! exchange (topic, durable)
//!   ├── routing key "overview-topic"    → queue "overview-topic"
//!   ├── routing key "analysis-topic"    → queue "analysis-topic"
//!   └── ...one durable queue per configured topic
//! ```
//!
//! The channel runs in confirm mode: `publish` returns only after the broker
//! acknowledges the message, and a nack is reported as a publish error.

use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{debug, info};

use crate::config::loader::redact_credentials;
use crate::config::BrokerConfig;
use crate::messaging::errors::MessagingError;
use crate::messaging::message::QueueMessage;
use crate::messaging::traits::BrokerService;

#[derive(Debug)]
pub struct RabbitMqBroker {
    connection: Connection,
    channel: Channel,
    exchange: String,
}

impl RabbitMqBroker {
    /// Connect, enable publisher confirms and declare the exchange
    pub async fn from_config(config: &BrokerConfig) -> Result<Self, MessagingError> {
        let connection = Connection::connect(
            &config.url,
            ConnectionProperties::default().with_connection_name("report-coordinator".into()),
        )
        .await
        .map_err(|e| MessagingError::connection(format!("RabbitMQ connection failed: {}", e)))?;

        let channel = connection.create_channel().await.map_err(|e| {
            MessagingError::connection(format!("RabbitMQ channel creation failed: {}", e))
        })?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| {
                MessagingError::configuration(
                    "rabbitmq",
                    format!("Failed to enable publisher confirms: {}", e),
                )
            })?;

        channel
            .exchange_declare(
                &config.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                MessagingError::topology(
                    &config.exchange,
                    format!("Exchange declare failed: {}", e),
                )
            })?;

        info!(
            url = %redact_credentials(&config.url),
            exchange = %config.exchange,
            "✅ RabbitMQ broker connected"
        );

        Ok(Self {
            connection,
            channel,
            exchange: config.exchange.clone(),
        })
    }
}

#[async_trait]
impl BrokerService for RabbitMqBroker {
    async fn ensure_topics(&self, topics: &[String]) -> Result<(), MessagingError> {
        for topic in topics {
            self.channel
                .queue_declare(
                    topic,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await
                .map_err(|e| {
                    MessagingError::topology(topic, format!("Queue declare failed: {}", e))
                })?;

            self.channel
                .queue_bind(
                    topic,
                    &self.exchange,
                    topic,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(|e| MessagingError::topology(topic, format!("Queue bind failed: {}", e)))?;

            debug!(topic = %topic, exchange = %self.exchange, "Topic queue ready");
        }
        Ok(())
    }

    async fn publish<T: QueueMessage>(
        &self,
        topic: &str,
        message: &T,
    ) -> Result<(), MessagingError> {
        let bytes = message.to_bytes()?;

        let confirm = self
            .channel
            .basic_publish(
                &self.exchange,
                topic, // Routing key = topic
                BasicPublishOptions::default(),
                &bytes,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| MessagingError::publish(topic, format!("Publish failed: {}", e)))?;

        let confirmation = confirm.await.map_err(|e| {
            MessagingError::publish(topic, format!("Publish confirmation failed: {}", e))
        })?;

        if let Confirmation::Nack(_) = confirmation {
            return Err(MessagingError::publish(topic, "Broker nacked the message"));
        }

        debug!(topic = topic, bytes = bytes.len(), "Message published");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        if self.connection.status().connected() {
            Ok(true)
        } else {
            Err(MessagingError::health_check("RabbitMQ connection is not connected"))
        }
    }

    fn provider_name(&self) -> &'static str {
        "rabbitmq"
    }
}
