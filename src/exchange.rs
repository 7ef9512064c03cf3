// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Exchange Channels
//!
//! An `ExchangeChannel` owns one logical exchange: it either declares the exchange or
//! verifies that it already exists, and afterwards publishes to it and consumes from
//! it over its own transport channel.

use crate::{
    errors::AmqpError,
    message::{encode_json, ConsumeOptions, PublishOptions},
    setup::ChannelSetup,
    transport::{ManagedChannel, ManagedConnection, MessageHandler},
};
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

/// Constant for the header field used to specify the delayed exchange type
pub const AMQP_HEADERS_DELAYED_EXCHANGE_TYPE: &str = "x-delayed-type";

/// Represents the types of exchanges available in RabbitMQ.
///
/// - Direct: exact match on the routing key
/// - Fanout: every bound queue, routing key ignored
/// - Topic: wildcard pattern match on the routing key
/// - Headers: match on message headers
/// - XMessageDelayed: delayed delivery, requires the delayed message plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExchangeKind {
    #[default]
    Direct,
    Fanout,
    Topic,
    Headers,
    XMessageDelayed,
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Topic => "topic",
            ExchangeKind::Headers => "headers",
            ExchangeKind::XMessageDelayed => "x-delayed-message",
        }
    }
}

impl From<&ExchangeKind> for lapin::ExchangeKind {
    fn from(kind: &ExchangeKind) -> Self {
        match kind {
            ExchangeKind::Direct => lapin::ExchangeKind::Direct,
            ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
            ExchangeKind::Headers => lapin::ExchangeKind::Headers,
            ExchangeKind::Topic => lapin::ExchangeKind::Topic,
            ExchangeKind::XMessageDelayed => lapin::ExchangeKind::Custom(kind.as_str().to_owned()),
        }
    }
}

/// Broker-side declaration options of an exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeOptions {
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub params: BTreeMap<ShortString, AMQPValue>,
}

impl ExchangeOptions {
    pub fn arguments(&self) -> FieldTable {
        FieldTable::from(self.params.clone())
    }
}

/// Whether `declare_exchange` creates the exchange or attaches to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeAction {
    /// Declare the exchange; the broker creates it if missing.
    Create,
    /// Passive check; fails if the exchange does not exist.
    Connect,
}

/// Configuration of one logical exchange. Frozen once handed to an `ExchangeChannel`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeConfig {
    pub name: String,
    pub kind: ExchangeKind,
    /// Prefetch limit for consumers on this exchange's channel.
    pub concurrent_message_limit: Option<u16>,
    pub options: ExchangeOptions,
}

impl ExchangeConfig {
    /// Creates a direct exchange configuration with default options.
    ///
    /// # Parameters
    /// * `name` - The name of the exchange
    ///
    /// # Returns
    /// A new exchange configuration with default settings
    pub fn new(name: &str) -> ExchangeConfig {
        ExchangeConfig {
            name: name.to_owned(),
            kind: ExchangeKind::Direct,
            concurrent_message_limit: None,
            options: ExchangeOptions::default(),
        }
    }

    /// Sets the exchange type.
    ///
    /// # Parameters
    /// * `kind` - The exchange type
    ///
    /// # Returns
    /// Self for method chaining
    pub fn kind(mut self, kind: ExchangeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn topic(self) -> Self {
        self.kind(ExchangeKind::Topic)
    }

    pub fn fanout(self) -> Self {
        self.kind(ExchangeKind::Fanout)
    }

    pub fn headers(self) -> Self {
        self.kind(ExchangeKind::Headers)
    }

    /// Turns the exchange into a delayed exchange routing like `routing`.
    ///
    /// Requires the x-delayed-message plugin on the broker.
    ///
    /// # Parameters
    /// * `routing` - How the exchange routes once the delay expired
    ///
    /// # Returns
    /// Self for method chaining
    pub fn delayed(mut self, routing: ExchangeKind) -> Self {
        self.options.params.insert(
            ShortString::from(AMQP_HEADERS_DELAYED_EXCHANGE_TYPE),
            AMQPValue::LongString(LongString::from(routing.as_str())),
        );
        self.kind = ExchangeKind::XMessageDelayed;
        self
    }

    /// Sets the prefetch limit of the exchange's channel.
    ///
    /// # Parameters
    /// * `limit` - Maximum number of unacknowledged deliveries, ignored when 0
    ///
    /// # Returns
    /// Self for method chaining
    pub fn concurrent_message_limit(mut self, limit: u16) -> Self {
        self.concurrent_message_limit = Some(limit);
        self
    }

    /// Makes the exchange durable, persisting across broker restarts.
    ///
    /// # Returns
    /// Self for method chaining
    pub fn durable(mut self) -> Self {
        self.options.durable = true;
        self
    }

    pub fn auto_delete(mut self) -> Self {
        self.options.auto_delete = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.options.internal = true;
        self
    }

    /// Adds a single declaration argument.
    ///
    /// # Parameters
    /// * `key` - The argument name
    /// * `value` - The argument value
    ///
    /// # Returns
    /// Self for method chaining
    pub fn param(mut self, key: &str, value: AMQPValue) -> Self {
        self.options.params.insert(ShortString::from(key), value);
        self
    }
}

enum ChannelState {
    Unestablished,
    Established(Arc<dyn ManagedChannel>),
}

/// One logical exchange and its transport channel.
pub struct ExchangeChannel {
    config: ExchangeConfig,
    connection: Arc<dyn ManagedConnection>,
    state: RwLock<ChannelState>,
}

impl ExchangeChannel {
    /// Creates an unestablished channel; call `create` or `connect` before using it.
    pub fn new(connection: Arc<dyn ManagedConnection>, config: ExchangeConfig) -> Self {
        ExchangeChannel {
            config,
            connection,
            state: RwLock::new(ChannelState::Unestablished),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn is_established(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, ChannelState::Established(_))
    }

    /// Declares the exchange with its kind and options.
    ///
    /// # Errors
    /// `ExchangeNotFound` when the broker does not acknowledge the declaration,
    /// otherwise whatever the connection manager reports.
    pub async fn create(&self) -> Result<(), AmqpError> {
        let transport = self.open_transport().await?;

        debug!("declaring exchange: {}", self.config.name);
        let acknowledged = transport
            .assert_exchange(&self.config.name, &self.config.kind, &self.config.options)
            .await?;

        self.establish(transport, acknowledged)
    }

    /// Attaches to an exchange that must already exist on the broker.
    ///
    /// # Errors
    /// `ExchangeNotFound` when the passive check reports the exchange absent.
    pub async fn connect(&self) -> Result<(), AmqpError> {
        let transport = self.open_transport().await?;

        debug!("checking exchange: {}", self.config.name);
        let exists = transport.check_exchange(&self.config.name).await?;

        self.establish(transport, exists)
    }

    /// Publishes `message` as JSON.
    ///
    /// Content type and encoding are forced to JSON/utf-8 and `persistent` overrides
    /// whatever `options` carries; every other option is kept.
    pub async fn send_json_message<T>(
        &self,
        routing_key: &str,
        message: &T,
        options: PublishOptions,
        persistent: bool,
    ) -> Result<(), AmqpError>
    where
        T: Serialize + ?Sized,
    {
        let payload = encode_json(message)?;
        self.send_message(routing_key, &payload, options.with_json_defaults(persistent))
            .await
    }

    /// Publishes raw bytes to this exchange under `routing_key`.
    ///
    /// # Parameters
    /// * `routing_key` - Routing key of the message
    /// * `payload` - Message body, sent as is
    /// * `options` - Message properties
    ///
    /// # Errors
    /// `ExchangeNotEstablished` before `create` or `connect`, otherwise
    /// `PublishingError` from the transport.
    pub async fn send_message(
        &self,
        routing_key: &str,
        payload: &[u8],
        options: PublishOptions,
    ) -> Result<(), AmqpError> {
        self.transport()?
            .publish(&self.config.name, routing_key, payload, &options)
            .await
    }

    /// Registers `handler` for deliveries on this exchange.
    ///
    /// # Parameters
    /// * `handler` - Called once per delivery, in its own task
    /// * `options` - Consumer tag, acknowledgement mode and arguments
    ///
    /// # Returns
    /// The consumer tag the broker registered
    pub async fn consume_messages(
        &self,
        handler: Arc<dyn MessageHandler>,
        options: ConsumeOptions,
    ) -> Result<String, AmqpError> {
        self.transport()?
            .consume(&self.config.name, handler, &options)
            .await
    }

    /// Closes the transport channel. The exchange must be declared again before
    /// further use.
    ///
    /// # Errors
    /// `ExchangeNotEstablished` when there is nothing to close, otherwise whatever the
    /// connection manager reports while closing.
    pub async fn close(&self) -> Result<(), AmqpError> {
        let transport = self.transport()?;
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = ChannelState::Unestablished;
        }

        debug!("closing exchange channel: {}", self.config.name);
        transport.close().await
    }

    /// The transport channel, available once `create` or `connect` succeeded.
    pub fn transport(&self) -> Result<Arc<dyn ManagedChannel>, AmqpError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            ChannelState::Established(transport) => Ok(transport.clone()),
            ChannelState::Unestablished => {
                Err(AmqpError::ExchangeNotEstablished(self.config.name.clone()))
            }
        }
    }

    async fn open_transport(&self) -> Result<Arc<dyn ManagedChannel>, AmqpError> {
        if self.config.name.is_empty() {
            return Err(AmqpError::ConfigurationError(
                "exchange name is required".to_owned(),
            ));
        }

        let transport = self
            .connection
            .create_channel(ChannelSetup::from_limit(self.config.concurrent_message_limit));
        transport.wait_for_connect().await?;

        Ok(transport)
    }

    fn establish(
        &self,
        transport: Arc<dyn ManagedChannel>,
        acknowledged: bool,
    ) -> Result<(), AmqpError> {
        if !acknowledged {
            return Err(AmqpError::ExchangeNotFound(self.config.name.clone()));
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = ChannelState::Established(transport);
        debug!("exchange: {} established", self.config.name);

        Ok(())
    }
}
