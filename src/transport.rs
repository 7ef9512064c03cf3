// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Connection Manager Interface
//!
//! The client never talks to the network directly. It goes through a connection
//! manager that owns the (possibly auto-recovering) connection and hands out managed
//! channels. `LapinConnectionManager` in the `connection` module is the implementation
//! shipped with the crate; tests plug in mocks of these traits.

use crate::{
    config::ConnectionOptions,
    errors::AmqpError,
    exchange::{ExchangeKind, ExchangeOptions},
    message::{ConsumeOptions, PublishOptions},
    queue::QueueOptions,
    setup::ChannelSetup,
};
use async_trait::async_trait;
use lapin::{message::Delivery, types::FieldTable};
use std::{future::Future, sync::Arc};

/// Lifecycle notifications emitted by a managed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt failed.
    ConnectFailed(String),
    /// An established connection was lost.
    Disconnected(String),
    /// The broker stopped accepting publishes, with its reason. Only emitted by
    /// managers whose client library reports flow control.
    Blocked(String),
    /// The broker accepts publishes again.
    Unblocked,
}

/// Callback receiving connection lifecycle events.
pub type ConnectionEventListener = Arc<dyn Fn(ConnectionEvent) + Send + Sync>;

/// Callback receiving errors raised on a channel after it was declared.
pub type ChannelErrorListener = Arc<dyn Fn(AmqpError) + Send + Sync>;

/// Broker reply to a queue declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAssertion {
    /// Queue name as known by the broker; generated when an empty name was declared.
    pub queue: String,
    pub message_count: u32,
    pub consumer_count: u32,
}

/// Per-delivery callback registered with `consume_messages`.
///
/// Deliveries are not acknowledged automatically unless the consumer was registered
/// with `no_ack`; the handler acks or nacks through the delivery.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, delivery: Delivery);
}

#[async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(Delivery) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn on_message(&self, delivery: Delivery) {
        (self)(delivery).await
    }
}

/// Entry point of a connection manager.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionManager: Send + Sync {
    /// Returns a managed connection for `uri`.
    ///
    /// Must not wait for the network: readiness is awaited per channel through
    /// `ManagedChannel::wait_for_connect`. Fails only when the URI is malformed.
    fn connect(
        &self,
        uri: &str,
        options: &ConnectionOptions,
    ) -> Result<Arc<dyn ManagedConnection>, AmqpError>;
}

/// A connection shared by all channels of one client.
#[cfg_attr(test, mockall::automock)]
pub trait ManagedConnection: Send + Sync {
    /// Creates a managed channel. `setup` runs when the transport channel opens,
    /// before the channel reports itself usable.
    fn create_channel(&self, setup: ChannelSetup) -> Arc<dyn ManagedChannel>;

    /// Subscribes to lifecycle events of this connection.
    fn on_event(&self, listener: ConnectionEventListener);
}

/// A channel whose transport is opened and set up by the connection manager.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagedChannel: Send + Sync {
    /// Suspends until the channel is open and its setup has been applied.
    async fn wait_for_connect(&self) -> Result<(), AmqpError>;

    /// Passive existence check. `Ok(false)` when the broker reports the exchange absent.
    async fn check_exchange(&self, name: &str) -> Result<bool, AmqpError>;

    /// Declares the exchange, creating it when missing.
    async fn assert_exchange(
        &self,
        name: &str,
        kind: &ExchangeKind,
        options: &ExchangeOptions,
    ) -> Result<bool, AmqpError>;

    /// Passive existence check. `Ok(false)` when the broker reports the queue absent.
    async fn check_queue(&self, name: &str) -> Result<bool, AmqpError>;

    /// Declares the queue, creating it when missing. An empty name asks the broker
    /// to generate one.
    async fn assert_queue(
        &self,
        name: &str,
        options: &QueueOptions,
    ) -> Result<Option<QueueAssertion>, AmqpError>;

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        pattern: &str,
        args: &FieldTable,
    ) -> Result<(), AmqpError>;

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        options: &PublishOptions,
    ) -> Result<(), AmqpError>;

    async fn send_to_queue(
        &self,
        queue: &str,
        payload: &[u8],
        options: &PublishOptions,
    ) -> Result<(), AmqpError>;

    /// Registers `handler` for deliveries from `source` and returns the consumer tag.
    /// Returns once the broker acknowledged the registration.
    async fn consume(
        &self,
        source: &str,
        handler: Arc<dyn MessageHandler>,
        options: &ConsumeOptions,
    ) -> Result<String, AmqpError>;

    /// Subscribes to errors raised on this channel after it was opened.
    fn on_error(&self, listener: ChannelErrorListener);

    /// Closes the transport channel and forgets its error listeners.
    async fn close(&self) -> Result<(), AmqpError>;
}
