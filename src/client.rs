// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Client
//!
//! `RabbitClient` owns one logical broker connection and the exchange and queue
//! channels declared on it. Declarations are idempotent per logical name: declaring
//! a name that is already registered hands back the registered channel without
//! touching the broker.
//!
//! ```ignore
//! let client = registry.client(RabbitClientConfig::new("localhost").name("billing"), manager)?;
//! client.connect()?;
//!
//! let events = client
//!     .declare_exchange(ExchangeAction::Create, ExchangeConfig::new("events").topic())
//!     .await?;
//! events.send_json_message("invoice.paid", &invoice, PublishOptions::new(), true).await?;
//! ```

use crate::{
    config::RabbitClientConfig,
    errors::AmqpError,
    exchange::{ExchangeAction, ExchangeChannel, ExchangeConfig},
    observer::{EventObserver, TracingObserver},
    queue::{BindQueueConfig, CreateQueueConfig, QueueChannel, QueueConfig},
    transport::{ConnectionManager, ManagedChannel, ManagedConnection},
};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

/// One logical broker connection with its registered channels.
pub struct RabbitClient {
    name: String,
    config: RabbitClientConfig,
    manager: Arc<dyn ConnectionManager>,
    observer: Arc<dyn EventObserver>,
    connection: RwLock<Option<Arc<dyn ManagedConnection>>>,
    exchanges: RwLock<HashMap<String, Arc<ExchangeChannel>>>,
    queues: RwLock<HashMap<String, Arc<QueueChannel>>>,
}

impl RabbitClient {
    /// Creates a client that reports asynchronous events through `tracing`.
    ///
    /// Nothing is sent to the broker until `connect` is called.
    pub fn new(config: RabbitClientConfig, manager: Arc<dyn ConnectionManager>) -> Arc<Self> {
        Self::with_observer(config, manager, Arc::new(TracingObserver))
    }

    /// Creates a client reporting connection events and channel errors to `observer`.
    pub fn with_observer(
        config: RabbitClientConfig,
        manager: Arc<dyn ConnectionManager>,
        observer: Arc<dyn EventObserver>,
    ) -> Arc<Self> {
        Arc::new(RabbitClient {
            name: config.client_name().to_owned(),
            config,
            manager,
            observer,
            connection: RwLock::new(None),
            exchanges: RwLock::new(HashMap::new()),
            queues: RwLock::new(HashMap::new()),
        })
    }

    /// Logical name of the client.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RabbitClientConfig {
        &self.config
    }

    /// Acquires the connection handle from the connection manager.
    ///
    /// Returns without waiting for the broker: each channel waits for the connection
    /// when it is declared. Lifecycle events of the connection are forwarded to the
    /// observer.
    ///
    /// # Errors
    /// Whatever the connection manager reports synchronously, typically `InvalidUri`.
    pub fn connect(&self) -> Result<(), AmqpError> {
        debug!(client = self.name, "creating amqp connection...");
        let connection = self
            .manager
            .connect(&self.config.uri(), &self.config.connection_options())?;

        let observer = self.observer.clone();
        let client = self.name.clone();
        connection.on_event(Arc::new(move |event| {
            observer.connection_event(&client, &event)
        }));

        let mut current = self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Some(connection);

        Ok(())
    }

    /// The connection handle, available after `connect`.
    pub fn connection(&self) -> Result<Arc<dyn ManagedConnection>, AmqpError> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| AmqpError::NotConnected(self.name.clone()))
    }

    /// Declares (`Create`) or attaches to (`Connect`) an exchange.
    ///
    /// An exchange already registered under `config.name` is returned as is and
    /// the broker is not contacted. When two declarations of the same name overlap,
    /// the first one registered is returned to both callers and the other channel
    /// is closed.
    ///
    /// # Parameters
    /// * `action` - Whether to declare the exchange or require it to exist
    /// * `config` - Name, kind and options of the exchange
    ///
    /// # Returns
    /// The registered exchange channel
    ///
    /// # Errors
    /// * `ConfigurationError` - empty name
    /// * `NotConnected` - `connect` was not called
    /// * `ExchangeNotFound` - `Connect` against an exchange the broker does not know
    pub async fn declare_exchange(
        &self,
        action: ExchangeAction,
        config: ExchangeConfig,
    ) -> Result<Arc<ExchangeChannel>, AmqpError> {
        if config.name.is_empty() {
            return Err(AmqpError::ConfigurationError(
                "exchange name is required".to_owned(),
            ));
        }

        if let Some(existing) = self.registered_exchange(&config.name) {
            warn!(
                name = config.name,
                "exchange already declared, reusing the existing channel"
            );
            return Ok(existing);
        }

        let exchange = Arc::new(ExchangeChannel::new(self.connection()?, config));
        match action {
            ExchangeAction::Create => exchange.create().await?,
            ExchangeAction::Connect => exchange.connect().await?,
        }

        let registered = self.register_exchange(exchange.clone());
        if Arc::ptr_eq(&registered, &exchange) {
            self.forward_errors(exchange.name(), &exchange.transport()?);
        } else {
            warn!(
                name = exchange.name(),
                "exchange declared concurrently, closing the duplicate channel"
            );
            if let Err(err) = exchange.close().await {
                warn!(error = err.to_string(), "error to close the duplicate channel");
            }
        }

        Ok(registered)
    }

    /// Binds a queue to an exchange with every configured pattern.
    ///
    /// A queue already registered under the same logical name is returned as is.
    ///
    /// # Parameters
    /// * `config` - Queue name, target exchange, patterns and naming of the queue
    ///
    /// # Returns
    /// The registered queue channel
    ///
    /// # Errors
    /// * `ConfigurationError` - empty queue or exchange name, or no pattern
    /// * `QueueNotFound` - the queue does not exist and auto-naming was not requested
    /// * `BindingExchangeToQueueError` - the first binding the broker refused
    pub async fn bind_queue(
        &self,
        config: BindQueueConfig,
    ) -> Result<Arc<QueueChannel>, AmqpError> {
        if config.exchange_name().is_empty() {
            return Err(AmqpError::ConfigurationError(
                "exchange name is required".to_owned(),
            ));
        }

        self.declare_queue_channel(config.into(), true).await
    }

    /// Declares a queue with the configured options.
    ///
    /// A queue already registered under the same name is returned as is.
    ///
    /// # Parameters
    /// * `config` - Queue name and declaration options
    ///
    /// # Returns
    /// The registered queue channel
    pub async fn declare_queue(
        &self,
        config: CreateQueueConfig,
    ) -> Result<Arc<QueueChannel>, AmqpError> {
        self.declare_queue_channel(config.into(), false).await
    }

    /// Looks up a registered exchange channel.
    ///
    /// # Errors
    /// `UnknownExchange` when nothing is registered under `name`.
    pub fn exchange(&self, name: &str) -> Result<Arc<ExchangeChannel>, AmqpError> {
        self.registered_exchange(name)
            .ok_or_else(|| AmqpError::UnknownExchange(name.to_owned()))
    }

    /// Looks up a registered queue channel by logical name.
    pub fn queue(&self, name: &str) -> Result<Arc<QueueChannel>, AmqpError> {
        self.registered_queue(name)
            .ok_or_else(|| AmqpError::UnknownQueue(name.to_owned()))
    }

    /// Names of the registered exchanges, sorted.
    pub fn exchanges(&self) -> Vec<String> {
        let exchanges = self.exchanges.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = exchanges.keys().cloned().collect();
        names.sort();
        names
    }

    /// Logical names of the registered queues, sorted.
    pub fn queues(&self) -> Vec<String> {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = queues.keys().cloned().collect();
        names.sort();
        names
    }

    async fn declare_queue_channel(
        &self,
        config: QueueConfig,
        bind: bool,
    ) -> Result<Arc<QueueChannel>, AmqpError> {
        if config.name.is_empty() {
            return Err(AmqpError::ConfigurationError(
                "queue name is required".to_owned(),
            ));
        }

        if let Some(existing) = self.registered_queue(&config.name) {
            warn!(
                name = config.name,
                "queue already declared, reusing the existing channel"
            );
            return Ok(existing);
        }

        let queue = Arc::new(QueueChannel::new(self.connection()?, config));
        if bind {
            queue.bind_to_exchange().await?;
        } else {
            queue.create().await?;
        }

        let registered = self.register_queue(queue.clone());
        if Arc::ptr_eq(&registered, &queue) {
            self.forward_errors(queue.name(), &queue.transport()?);
        } else {
            warn!(
                name = queue.name(),
                "queue declared concurrently, closing the duplicate channel"
            );
            if let Err(err) = queue.close().await {
                warn!(error = err.to_string(), "error to close the duplicate channel");
            }
        }

        Ok(registered)
    }

    /// Registers `exchange` unless its name is taken, returning the registered one.
    fn register_exchange(&self, exchange: Arc<ExchangeChannel>) -> Arc<ExchangeChannel> {
        let mut exchanges = self.exchanges.write().unwrap_or_else(PoisonError::into_inner);
        let registered = exchanges
            .entry(exchange.name().to_owned())
            .or_insert(exchange)
            .clone();
        registered
    }

    fn register_queue(&self, queue: Arc<QueueChannel>) -> Arc<QueueChannel> {
        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        let registered = queues
            .entry(queue.name().to_owned())
            .or_insert(queue)
            .clone();
        registered
    }

    fn registered_exchange(&self, name: &str) -> Option<Arc<ExchangeChannel>> {
        self.exchanges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn registered_queue(&self, name: &str) -> Option<Arc<QueueChannel>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn forward_errors(&self, channel: &str, transport: &Arc<dyn ManagedChannel>) {
        let observer = self.observer.clone();
        let client = self.name.clone();
        let channel = channel.to_owned();
        transport.on_error(Arc::new(move |err| {
            observer.channel_error(&client, &channel, &err)
        }));
    }
}
