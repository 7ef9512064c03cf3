// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Named RabbitMQ clients with idempotent exchange/queue declaration and JSON
//! publishing on top of an injectable connection manager.

mod otel;

pub mod client;
pub mod config;
pub mod connection;
pub mod errors;
pub mod exchange;
pub mod message;
pub mod observer;
pub mod queue;
pub mod registry;
pub mod setup;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::RabbitClient;
pub use config::RabbitClientConfig;
pub use connection::LapinConnectionManager;
pub use errors::AmqpError;
pub use exchange::{ExchangeAction, ExchangeChannel, ExchangeConfig, ExchangeKind};
pub use message::{ConsumeOptions, PublishOptions};
pub use queue::{BindQueueConfig, CreateQueueConfig, QueueChannel, QueueConfig, QueueOptions};
pub use registry::ClientRegistry;
