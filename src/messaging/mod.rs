//! # Messaging Module
//!
//! Topic-based work dispatch to remote step workers.
//!
//! ```text
//! BrokerProvider (enum)
//!   ├── RabbitMq(RabbitMqBroker)  <- topic exchange, durable queues, publisher confirms
//!   └── InMemory(InMemoryBroker)  <- per-topic recorder for development and tests
//! ```

pub mod errors;
pub mod message;
pub mod provider;
pub mod providers;
pub mod traits;

pub use errors::MessagingError;
pub use message::{token_preview, DispatchMessage, QueueMessage};
pub use provider::BrokerProvider;
pub use providers::InMemoryBroker;
pub use traits::BrokerService;

#[cfg(feature = "broker-rabbitmq")]
pub use providers::RabbitMqBroker;
