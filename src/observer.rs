// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Event Observer
//!
//! Receives what happens after the caller stopped awaiting: connection lifecycle
//! events and errors raised on channels that were already declared.

use crate::{errors::AmqpError, transport::ConnectionEvent};
use tracing::{error, info, warn};

/// Sink for asynchronous connection events and channel errors.
///
/// Implementations must not block; they are called from the connection manager's
/// callbacks.
pub trait EventObserver: Send + Sync {
    fn connection_event(&self, client: &str, event: &ConnectionEvent);

    fn channel_error(&self, client: &str, channel: &str, error: &AmqpError);
}

/// Observer writing everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn connection_event(&self, client: &str, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::ConnectFailed(err) => {
                error!(client = client, error = err, "connection attempt failed")
            }
            ConnectionEvent::Disconnected(err) => {
                error!(client = client, error = err, "connection lost")
            }
            ConnectionEvent::Blocked(reason) => {
                warn!(client = client, reason = reason, "connection blocked by broker")
            }
            ConnectionEvent::Unblocked => info!(client = client, "connection unblocked"),
        }
    }

    fn channel_error(&self, client: &str, channel: &str, error: &AmqpError) {
        error!(
            client = client,
            channel = channel,
            error = error.to_string(),
            "channel error"
        );
    }
}
