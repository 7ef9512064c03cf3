// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the RabbitMQ Client
//!
//! Every fallible operation in this crate returns `AmqpError`. The variants follow
//! the order in which things can go wrong: bad configuration is rejected before any
//! network call, registry lookups fail synchronously, channel guards fail when a
//! channel is used before it was declared, and broker/transport failures carry the
//! message reported by the connection manager.

use thiserror::Error;

/// Represents errors that can occur while declaring, binding, publishing or consuming.
///
/// Payloads are plain strings so the error can be cloned and handed to several
/// listeners at once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmqpError {
    /// Internal errors that don't fit into other categories
    #[error("internal error")]
    InternalError,

    /// A required configuration field is missing or has the wrong shape
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),

    /// The connection URI was rejected before any connection attempt
    #[error("invalid connection uri: {0}")]
    InvalidUri(String),

    /// Error establishing a connection to the RabbitMQ server
    #[error("failure to connect: {0}")]
    ConnectionError(String),

    /// The client was used before `connect` was called
    #[error("connection of client `{0}` not established. Did you call .connect()?")]
    NotConnected(String),

    /// Error creating a channel from an established connection
    #[error("failure to create a channel: {0}")]
    ChannelError(String),

    /// The exchange channel was used before it was declared
    #[error("exchange channel `{0}` not established. Did you call .declare_exchange()?")]
    ExchangeNotEstablished(String),

    /// The queue channel was used before it was declared or bound
    #[error("queue channel `{0}` not established. Did you call .declare_queue() or .bind_queue()?")]
    QueueNotEstablished(String),

    /// A passive check reported the exchange as absent
    #[error("could not connect to exchange `{0}`: exchange does not exist or is not reachable")]
    ExchangeNotFound(String),

    /// A passive check reported the queue as absent
    #[error("could not connect to queue `{0}`: queue does not exist or is not reachable")]
    QueueNotFound(String),

    /// No client registered under that name
    #[error("client connection `{name}` does not exist. Available ones are: {available}")]
    UnknownClient { name: String, available: String },

    /// No exchange channel registered under that name on the client
    #[error("exchange `{0}` does not exist")]
    UnknownExchange(String),

    /// No queue channel registered under that name on the client
    #[error("queue `{0}` does not exist")]
    UnknownQueue(String),

    /// Error declaring an exchange with the given name
    #[error("failure to declare an exchange `{0}`: {1}")]
    DeclareExchangeError(String, String),

    /// Error declaring a queue with the given name
    #[error("failure to declare a queue `{0}`: {1}")]
    DeclareQueueError(String, String),

    /// Error binding a queue to an exchange with a routing pattern
    #[error("failure to bind queue `{queue}` to exchange `{exchange}` with pattern `{pattern}`: {reason}")]
    BindingExchangeToQueueError {
        queue: String,
        exchange: String,
        pattern: String,
        reason: String,
    },

    /// Error publishing a message
    #[error("failure to publish: {0}")]
    PublishingError(String),

    /// Error serializing a message payload
    #[error("failure to serialize payload: {0}")]
    SerializationError(String),

    /// Error configuring Quality of Service parameters
    #[error("failure to configure qos `{0}`")]
    QoSDeclarationError(String),

    /// Error registering or running a consumer
    #[error("failure to consume message `{0}`")]
    ConsumerError(String),
}

impl From<serde_json::Error> for AmqpError {
    fn from(err: serde_json::Error) -> Self {
        AmqpError::SerializationError(err.to_string())
    }
}
