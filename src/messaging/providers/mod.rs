//! Broker provider implementations

pub mod in_memory;

#[cfg(feature = "broker-rabbitmq")]
pub mod rabbitmq;

pub use in_memory::InMemoryBroker;

#[cfg(feature = "broker-rabbitmq")]
pub use rabbitmq::RabbitMqBroker;
