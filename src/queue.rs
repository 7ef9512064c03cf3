// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Queue Channels
//!
//! A `QueueChannel` owns one logical queue. It is set up in one of two modes:
//!
//! - creation: the queue is declared with the configured options;
//! - binding: the queue is checked (or auto-declared under a broker generated name)
//!   and bound to an exchange once per routing pattern, in order.
//!
//! The logical name is the registry key. The name used on the wire is
//! `real_queue_name`, which differs only for auto-named queues.

use crate::{
    errors::AmqpError,
    message::{encode_json, ConsumeOptions, PublishOptions},
    setup::ChannelSetup,
    transport::{ManagedChannel, ManagedConnection, MessageHandler},
};
use lapin::types::{AMQPValue, FieldTable, LongInt, LongString, ShortString};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

/// Constant for the header field used to specify a dead letter exchange
pub const AMQP_HEADERS_DEAD_LETTER_EXCHANGE: &str = "x-dead-letter-exchange";
/// Constant for the header field used to specify a dead letter routing key
pub const AMQP_HEADERS_DEAD_LETTER_ROUTING_KEY: &str = "x-dead-letter-routing-key";
/// Constant for the header field used to specify message TTL
pub const AMQP_HEADERS_MESSAGE_TTL: &str = "x-message-ttl";
/// Constant for the header field used to specify maximum queue length
pub const AMQP_HEADERS_MAX_LENGTH: &str = "x-max-length";
/// Constant for the header field used to specify maximum queue size in bytes
pub const AMQP_HEADERS_MAX_LENGTH_BYTES: &str = "x-max-length-bytes";

/// Broker-side declaration options of a queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueOptions {
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
    /// Message TTL in milliseconds.
    pub ttl: Option<i32>,
    pub max_length: Option<i32>,
    pub max_length_bytes: Option<i32>,
    pub dead_letter_exchange: Option<String>,
    pub dead_letter_routing_key: Option<String>,
    pub params: BTreeMap<ShortString, AMQPValue>,
}

impl QueueOptions {
    /// Options forced on auto-named queues.
    pub(crate) fn auto_named() -> Self {
        QueueOptions {
            durable: false,
            auto_delete: true,
            ..Default::default()
        }
    }

    /// Builds the `x-` argument table sent with the declaration.
    pub fn arguments(&self) -> FieldTable {
        let mut args = self.params.clone();

        if let Some(ttl) = self.ttl {
            args.insert(
                ShortString::from(AMQP_HEADERS_MESSAGE_TTL),
                AMQPValue::LongInt(LongInt::from(ttl)),
            );
        }

        if let Some(max) = self.max_length {
            args.insert(
                ShortString::from(AMQP_HEADERS_MAX_LENGTH),
                AMQPValue::LongInt(LongInt::from(max)),
            );
        }

        if let Some(max_bytes) = self.max_length_bytes {
            args.insert(
                ShortString::from(AMQP_HEADERS_MAX_LENGTH_BYTES),
                AMQPValue::LongInt(LongInt::from(max_bytes)),
            );
        }

        if let Some(exchange) = &self.dead_letter_exchange {
            args.insert(
                ShortString::from(AMQP_HEADERS_DEAD_LETTER_EXCHANGE),
                AMQPValue::LongString(LongString::from(exchange.as_str())),
            );
        }

        if let Some(key) = &self.dead_letter_routing_key {
            args.insert(
                ShortString::from(AMQP_HEADERS_DEAD_LETTER_ROUTING_KEY),
                AMQPValue::LongString(LongString::from(key.as_str())),
            );
        }

        FieldTable::from(args)
    }
}

/// How a queue channel is set up.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueMode {
    /// Declare the queue with `options`.
    Create { options: QueueOptions },
    /// Bind the queue to `exchange_name` once per pattern.
    Bind {
        exchange_name: String,
        patterns: Vec<String>,
        args: FieldTable,
        /// Declare an auto-delete, non-durable queue under this name instead of
        /// checking for an existing one. Empty lets the broker pick the name.
        real_name: Option<String>,
    },
}

/// Configuration of one logical queue. Frozen once handed to a `QueueChannel`.
///
/// Built through `QueueConfig::create` or `QueueConfig::bind`, whose builders only
/// offer the settings of their own mode.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    pub name: String,
    /// Prefetch limit for consumers on this queue's channel.
    pub concurrent_message_limit: Option<u16>,
    pub mode: QueueMode,
}

impl QueueConfig {
    /// Starts a creation-mode configuration with default (transient) options.
    ///
    /// # Parameters
    /// * `name` - The logical name, also used as the queue name on the broker
    ///
    /// # Returns
    /// A builder for a queue declared with its own options
    pub fn create(name: &str) -> CreateQueueConfig {
        CreateQueueConfig {
            name: name.to_owned(),
            concurrent_message_limit: None,
            options: QueueOptions::default(),
        }
    }

    /// Starts a binding-mode configuration for `exchange_name`, without patterns yet.
    ///
    /// # Parameters
    /// * `name` - The logical name of the queue
    /// * `exchange_name` - The exchange the queue is bound to
    ///
    /// # Returns
    /// A builder for a queue bound to an existing exchange
    pub fn bind(name: &str, exchange_name: &str) -> BindQueueConfig {
        BindQueueConfig {
            name: name.to_owned(),
            concurrent_message_limit: None,
            exchange_name: exchange_name.to_owned(),
            patterns: vec![],
            args: FieldTable::default(),
            real_name: None,
        }
    }
}

/// Builder of a creation-mode `QueueConfig`.
///
/// Binding settings belong to `BindQueueConfig` and are not offered here:
///
/// ```compile_fail
/// use rabbit_client::QueueConfig;
///
/// let _ = QueueConfig::create("orders").pattern("order.*");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CreateQueueConfig {
    name: String,
    concurrent_message_limit: Option<u16>,
    options: QueueOptions,
}

impl CreateQueueConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the prefetch limit of the queue's channel.
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

    /// Replaces the declaration options.
    ///
    /// # Parameters
    /// * `options` - Durability, TTL, length limits and dead-lettering of the queue
    ///
    /// # Returns
    /// Self for method chaining
    pub fn options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<CreateQueueConfig> for QueueConfig {
    fn from(config: CreateQueueConfig) -> Self {
        QueueConfig {
            name: config.name,
            concurrent_message_limit: config.concurrent_message_limit,
            mode: QueueMode::Create {
                options: config.options,
            },
        }
    }
}

/// Builder of a binding-mode `QueueConfig`.
///
/// ```compile_fail
/// use rabbit_client::{QueueConfig, QueueOptions};
///
/// let _ = QueueConfig::bind("jobs", "events").options(QueueOptions::default());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BindQueueConfig {
    name: String,
    concurrent_message_limit: Option<u16>,
    exchange_name: String,
    patterns: Vec<String>,
    args: FieldTable,
    real_name: Option<String>,
}

impl BindQueueConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exchange_name(&self) -> &str {
        &self.exchange_name
    }

    /// Sets the prefetch limit of the queue's channel.
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

    /// Appends one routing pattern.
    ///
    /// # Parameters
    /// * `pattern` - Routing key pattern of one binding
    ///
    /// # Returns
    /// Self for method chaining
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.patterns.push(pattern.to_owned());
        self
    }

    /// Appends routing patterns, keeping their order.
    ///
    /// # Returns
    /// Self for method chaining
    pub fn patterns<I, S>(mut self, more: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(more.into_iter().map(Into::into));
        self
    }

    /// Sets the arguments sent with every binding.
    ///
    /// # Returns
    /// Self for method chaining
    pub fn args(mut self, table: FieldTable) -> Self {
        self.args = table;
        self
    }

    /// Requests a broker-named, auto-delete queue.
    ///
    /// # Returns
    /// Self for method chaining
    pub fn auto_named(self) -> Self {
        self.real_name("")
    }

    /// Requests an auto-delete queue declared under `name` instead of checking for
    /// an existing one.
    ///
    /// # Parameters
    /// * `name` - Queue name on the broker; empty lets the broker pick it
    ///
    /// # Returns
    /// Self for method chaining
    pub fn real_name(mut self, name: &str) -> Self {
        self.real_name = Some(name.to_owned());
        self
    }
}

impl From<BindQueueConfig> for QueueConfig {
    fn from(config: BindQueueConfig) -> Self {
        QueueConfig {
            name: config.name,
            concurrent_message_limit: config.concurrent_message_limit,
            mode: QueueMode::Bind {
                exchange_name: config.exchange_name,
                patterns: config.patterns,
                args: config.args,
                real_name: config.real_name,
            },
        }
    }
}

enum ChannelState {
    Unestablished,
    Established {
        transport: Arc<dyn ManagedChannel>,
        real_queue_name: String,
    },
}

/// One logical queue and its transport channel.
pub struct QueueChannel {
    config: QueueConfig,
    connection: Arc<dyn ManagedConnection>,
    state: RwLock<ChannelState>,
}

impl QueueChannel {
    /// Creates an unestablished channel; call `create` or `bind_to_exchange` before
    /// using it.
    pub fn new(connection: Arc<dyn ManagedConnection>, config: impl Into<QueueConfig>) -> Self {
        QueueChannel {
            config: config.into(),
            connection,
            state: RwLock::new(ChannelState::Unestablished),
        }
    }

    /// Logical name, used for registry lookups.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Name of the queue on the broker.
    ///
    /// Equals the logical name until an auto-named queue has been declared.
    pub fn real_queue_name(&self) -> String {
        self.established_name()
            .unwrap_or_else(|| self.config.name.clone())
    }

    pub fn is_established(&self) -> bool {
        self.established_name().is_some()
    }

    /// Declares the queue. Requires a creation-mode configuration.
    pub async fn create(&self) -> Result<(), AmqpError> {
        let QueueMode::Create { options } = &self.config.mode else {
            return Err(AmqpError::ConfigurationError(format!(
                "queue `{}` is configured for binding, not creation",
                self.config.name
            )));
        };

        let transport = self.open_transport().await?;
        let real_queue_name = self.real_queue_name();

        debug!("declaring queue: {}", real_queue_name);
        if transport
            .assert_queue(&real_queue_name, options)
            .await?
            .is_none()
        {
            return Err(AmqpError::DeclareQueueError(
                self.config.name.clone(),
                "declaration was not acknowledged".to_owned(),
            ));
        }

        self.establish(transport, real_queue_name);
        Ok(())
    }

    /// Binds the queue to its exchange, once per pattern and in order.
    ///
    /// Without auto-naming the queue must already exist. With auto-naming it is
    /// declared auto-delete and non-durable, and the broker's name is adopted; a
    /// channel that already resolved its name keeps it. A failing bind aborts the
    /// remaining patterns; binds already made stay in place.
    pub async fn bind_to_exchange(&self) -> Result<(), AmqpError> {
        let QueueMode::Bind {
            exchange_name,
            patterns,
            args,
            real_name,
        } = &self.config.mode
        else {
            return Err(AmqpError::ConfigurationError(format!(
                "queue `{}` is configured for creation, not binding",
                self.config.name
            )));
        };

        if exchange_name.is_empty() {
            return Err(AmqpError::ConfigurationError(
                "exchange name is required".to_owned(),
            ));
        }
        if patterns.is_empty() {
            return Err(AmqpError::ConfigurationError(format!(
                "queue `{}` needs at least one pattern",
                self.config.name
            )));
        }

        let transport = self.open_transport().await?;
        let real_queue_name = match (self.established_name(), real_name) {
            (Some(resolved), _) => resolved,
            (None, None) => {
                if !transport.check_queue(&self.config.name).await? {
                    return Err(AmqpError::QueueNotFound(self.config.name.clone()));
                }
                self.config.name.clone()
            }
            (None, Some(requested)) => {
                let assertion = transport
                    .assert_queue(requested, &QueueOptions::auto_named())
                    .await?
                    .ok_or_else(|| {
                        AmqpError::DeclareQueueError(
                            self.config.name.clone(),
                            "declaration was not acknowledged".to_owned(),
                        )
                    })?;
                let resolved = assertion.queue.trim().to_owned();
                debug!("queue: {} resolved to {}", self.config.name, resolved);
                resolved
            }
        };

        for pattern in patterns {
            debug!(
                "binding queue: {} to the exchange: {} with the key: {}",
                real_queue_name, exchange_name, pattern
            );
            transport
                .bind_queue(&real_queue_name, exchange_name, pattern, args)
                .await?;
        }

        self.establish(transport, real_queue_name);
        Ok(())
    }

    /// Publishes `message` as JSON directly to the queue.
    pub async fn send_json_message<T>(
        &self,
        message: &T,
        options: PublishOptions,
        persistent: bool,
    ) -> Result<(), AmqpError>
    where
        T: Serialize + ?Sized,
    {
        let payload = encode_json(message)?;
        self.send_message(&payload, options.with_json_defaults(persistent))
            .await
    }

    /// Publishes raw bytes directly to the queue.
    ///
    /// # Parameters
    /// * `payload` - Message body, sent as is
    /// * `options` - Message properties
    ///
    /// # Errors
    /// `QueueNotEstablished` before the queue was declared or bound.
    pub async fn send_message(
        &self,
        payload: &[u8],
        options: PublishOptions,
    ) -> Result<(), AmqpError> {
        let (transport, queue) = self.established()?;
        transport.send_to_queue(&queue, payload, &options).await
    }

    /// Registers `handler` for deliveries on the queue.
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
        let (transport, queue) = self.established()?;
        transport.consume(&queue, handler, &options).await
    }

    /// Closes the transport channel. The queue must be declared or bound again
    /// before further use.
    ///
    /// # Errors
    /// `QueueNotEstablished` when there is nothing to close, otherwise whatever the
    /// connection manager reports while closing.
    pub async fn close(&self) -> Result<(), AmqpError> {
        let transport = self.transport()?;
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = ChannelState::Unestablished;
        }

        debug!("closing queue channel: {}", self.config.name);
        transport.close().await
    }

    /// The transport channel, available once `create` or `bind_to_exchange` succeeded.
    pub fn transport(&self) -> Result<Arc<dyn ManagedChannel>, AmqpError> {
        self.established().map(|(transport, _)| transport)
    }

    fn established(&self) -> Result<(Arc<dyn ManagedChannel>, String), AmqpError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            ChannelState::Established {
                transport,
                real_queue_name,
            } => Ok((transport.clone(), real_queue_name.clone())),
            ChannelState::Unestablished => {
                Err(AmqpError::QueueNotEstablished(self.config.name.clone()))
            }
        }
    }

    fn established_name(&self) -> Option<String> {
        self.established().ok().map(|(_, name)| name)
    }

    async fn open_transport(&self) -> Result<Arc<dyn ManagedChannel>, AmqpError> {
        if self.config.name.is_empty() {
            return Err(AmqpError::ConfigurationError(
                "queue name is required".to_owned(),
            ));
        }

        let transport = self
            .connection
            .create_channel(ChannelSetup::from_limit(self.config.concurrent_message_limit));
        transport.wait_for_connect().await?;

        Ok(transport)
    }

    fn establish(&self, transport: Arc<dyn ManagedChannel>, real_queue_name: String) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = ChannelState::Established {
            transport,
            real_queue_name,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connection_with, noop_handler};
    use crate::transport::{MockManagedChannel, MockManagedConnection, QueueAssertion};
    use mockall::Sequence;
    use serde_json::json;

    fn ready_channel() -> MockManagedChannel {
        let mut channel = MockManagedChannel::new();
        channel.expect_wait_for_connect().returning(|| Ok(()));
        channel
    }

    fn assertion(queue: &str) -> Option<QueueAssertion> {
        Some(QueueAssertion {
            queue: queue.to_owned(),
            message_count: 0,
            consumer_count: 0,
        })
    }

    #[tokio::test]
    async fn patterns_are_bound_in_order_after_existence_check() {
        let mut seq = Sequence::new();
        let mut channel = ready_channel();
        channel
            .expect_check_queue()
            .withf(|name| name == "jobs")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        channel
            .expect_bind_queue()
            .withf(|queue, exchange, pattern, _| {
                queue == "jobs" && exchange == "events" && pattern == "a.*"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        channel
            .expect_bind_queue()
            .withf(|queue, exchange, pattern, _| {
                queue == "jobs" && exchange == "events" && pattern == "b.#"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));

        let queue = QueueChannel::new(
            connection_with(channel, None),
            QueueConfig::bind("jobs", "events").patterns(["a.*", "b.#"]),
        );

        queue.bind_to_exchange().await.unwrap();
        assert!(queue.is_established());
        assert_eq!(queue.real_queue_name(), "jobs");
    }

    #[tokio::test]
    async fn failing_bind_stops_remaining_patterns() {
        let mut seq = Sequence::new();
        let mut channel = ready_channel();
        channel.expect_check_queue().returning(|_| Ok(true));
        channel
            .expect_bind_queue()
            .withf(|_, _, pattern, _| pattern == "a.*")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        channel
            .expect_bind_queue()
            .withf(|_, _, pattern, _| pattern == "b.#")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|queue, exchange, pattern, _| {
                Err(AmqpError::BindingExchangeToQueueError {
                    queue: queue.to_owned(),
                    exchange: exchange.to_owned(),
                    pattern: pattern.to_owned(),
                    reason: "ACCESS_REFUSED".to_owned(),
                })
            });

        let queue = QueueChannel::new(
            connection_with(channel, None),
            QueueConfig::bind("jobs", "events").patterns(["a.*", "b.#", "c"]),
        );

        let err = queue.bind_to_exchange().await.unwrap_err();
        assert!(matches!(
            err,
            AmqpError::BindingExchangeToQueueError { ref pattern, .. } if pattern == "b.#"
        ));
        assert!(!queue.is_established());
    }

    #[tokio::test]
    async fn missing_queue_is_not_bound() {
        let mut channel = ready_channel();
        channel.expect_check_queue().returning(|_| Ok(false));

        let queue = QueueChannel::new(
            connection_with(channel, None),
            QueueConfig::bind("jobs", "events").pattern("#"),
        );

        let err = queue.bind_to_exchange().await.unwrap_err();
        assert_eq!(err, AmqpError::QueueNotFound("jobs".to_owned()));
    }

    #[tokio::test]
    async fn auto_named_queue_adopts_broker_name() {
        let mut channel = ready_channel();
        channel
            .expect_assert_queue()
            .withf(|name, options| {
                name.is_empty() && options.auto_delete && !options.durable
            })
            .times(1)
            .returning(|_, _| Ok(assertion("  amq.gen-XYZ \n")));
        channel
            .expect_bind_queue()
            .withf(|queue, _, _, _| queue == "amq.gen-XYZ")
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        channel
            .expect_send_to_queue()
            .withf(|queue, payload, options| {
                queue == "amq.gen-XYZ"
                    && payload == br#"{"a":1}"#
                    && options.persistent == Some(true)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        channel
            .expect_consume()
            .withf(|source, _, _| source == "amq.gen-XYZ")
            .times(1)
            .returning(|_, _, _| Ok("ctag".to_owned()));

        let queue = QueueChannel::new(
            connection_with(channel, None),
            QueueConfig::bind("updates", "events")
                .pattern("user.*")
                .auto_named(),
        );

        queue.bind_to_exchange().await.unwrap();
        assert_eq!(queue.name(), "updates");
        assert_eq!(queue.real_queue_name(), "amq.gen-XYZ");

        queue
            .send_json_message(&json!({"a": 1}), PublishOptions::new(), true)
            .await
            .unwrap();
        queue
            .consume_messages(noop_handler(), ConsumeOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resolved_name_is_not_resolved_again() {
        let mut channel = ready_channel();
        channel
            .expect_assert_queue()
            .times(1)
            .returning(|_, _| Ok(assertion("amq.gen-1")));
        channel
            .expect_bind_queue()
            .withf(|queue, _, _, _| queue == "amq.gen-1")
            .times(2)
            .returning(|_, _, _, _| Ok(()));

        let shared: Arc<MockManagedChannel> = Arc::new(channel);
        let mut connection = MockManagedConnection::new();
        connection.expect_create_channel().times(2).returning(move |_| {
            let channel: Arc<dyn ManagedChannel> = shared.clone();
            channel
        });

        let queue = QueueChannel::new(
            Arc::new(connection),
            QueueConfig::bind("updates", "events").pattern("#").auto_named(),
        );

        queue.bind_to_exchange().await.unwrap();
        queue.bind_to_exchange().await.unwrap();
        assert_eq!(queue.real_queue_name(), "amq.gen-1");
    }

    #[tokio::test]
    async fn create_declares_with_options() {
        let mut channel = ready_channel();
        channel
            .expect_assert_queue()
            .withf(|name, options| {
                name == "orders" && options.durable && options.ttl == Some(60_000)
            })
            .times(1)
            .returning(|_, _| Ok(assertion("orders")));

        let options = QueueOptions {
            durable: true,
            ttl: Some(60_000),
            ..Default::default()
        };
        let queue = QueueChannel::new(
            connection_with(channel, Some(10)),
            QueueConfig::create("orders")
                .options(options)
                .concurrent_message_limit(10),
        );

        queue.create().await.unwrap();
        assert!(queue.is_established());
        assert_eq!(queue.real_queue_name(), "orders");
    }

    #[tokio::test]
    async fn unacknowledged_declaration_fails() {
        let mut channel = ready_channel();
        channel.expect_assert_queue().returning(|_, _| Ok(None));

        let queue = QueueChannel::new(
            connection_with(channel, None),
            QueueConfig::create("orders"),
        );

        let err = queue.create().await.unwrap_err();
        assert!(matches!(err, AmqpError::DeclareQueueError(ref name, _) if name == "orders"));
    }

    #[tokio::test]
    async fn mode_mismatch_is_a_configuration_error() {
        let connection: Arc<dyn ManagedConnection> = Arc::new(MockManagedConnection::new());

        let bind_only = QueueChannel::new(
            connection.clone(),
            QueueConfig::bind("jobs", "events").pattern("#"),
        );
        assert!(matches!(
            bind_only.create().await,
            Err(AmqpError::ConfigurationError(_))
        ));

        let create_only = QueueChannel::new(connection.clone(), QueueConfig::create("jobs"));
        assert!(matches!(
            create_only.bind_to_exchange().await,
            Err(AmqpError::ConfigurationError(_))
        ));

        let no_patterns = QueueChannel::new(connection, QueueConfig::bind("jobs", "events"));
        assert!(matches!(
            no_patterns.bind_to_exchange().await,
            Err(AmqpError::ConfigurationError(_))
        ));
    }

    #[test]
    fn builders_produce_the_matching_mode() {
        let bound: QueueConfig = QueueConfig::bind("updates", "events")
            .pattern("a.*")
            .patterns(["b.#"])
            .auto_named()
            .concurrent_message_limit(3)
            .into();
        assert_eq!(bound.concurrent_message_limit, Some(3));
        assert_eq!(
            bound.mode,
            QueueMode::Bind {
                exchange_name: "events".to_owned(),
                patterns: vec!["a.*".to_owned(), "b.#".to_owned()],
                args: FieldTable::default(),
                real_name: Some(String::new()),
            }
        );

        let options = QueueOptions {
            durable: true,
            ..Default::default()
        };
        let created: QueueConfig = QueueConfig::create("orders").options(options.clone()).into();
        assert_eq!(created.name, "orders");
        assert_eq!(created.mode, QueueMode::Create { options });
    }

    #[tokio::test]
    async fn send_before_declare_names_the_queue() {
        let queue = QueueChannel::new(
            Arc::new(MockManagedConnection::new()),
            QueueConfig::create("orders"),
        );

        let err = queue
            .send_message(b"payload", PublishOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err, AmqpError::QueueNotEstablished("orders".to_owned()));
        assert!(err.to_string().contains("orders"));
    }

    #[test]
    fn options_become_queue_arguments() {
        let options = QueueOptions {
            ttl: Some(1000),
            max_length: Some(10),
            dead_letter_exchange: Some("dlx".to_owned()),
            ..Default::default()
        };
        let args = options.arguments();
        let inner = args.inner();

        assert_eq!(
            inner.get(&ShortString::from(AMQP_HEADERS_MESSAGE_TTL)),
            Some(&AMQPValue::LongInt(1000))
        );
        assert_eq!(
            inner.get(&ShortString::from(AMQP_HEADERS_MAX_LENGTH)),
            Some(&AMQPValue::LongInt(10))
        );
        assert_eq!(
            inner.get(&ShortString::from(AMQP_HEADERS_DEAD_LETTER_EXCHANGE)),
            Some(&AMQPValue::LongString(LongString::from("dlx")))
        );
        assert!(!inner.contains_key(&ShortString::from(AMQP_HEADERS_MAX_LENGTH_BYTES)));
    }
}
