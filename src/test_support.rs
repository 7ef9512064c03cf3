// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

use crate::{
    errors::AmqpError,
    observer::EventObserver,
    transport::{
        ConnectionEvent, ManagedChannel, ManagedConnection, MessageHandler, MockManagedChannel,
        MockManagedConnection,
    },
};
use lapin::message::Delivery;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// A connection that hands out `channel` exactly once, checking the requested prefetch.
pub(crate) fn connection_with(
    channel: MockManagedChannel,
    prefetch: Option<u16>,
) -> Arc<dyn ManagedConnection> {
    let mut connection = MockManagedConnection::new();
    connection
        .expect_create_channel()
        .withf(move |setup| setup.prefetch() == prefetch)
        .times(1)
        .return_once(move |_| -> Arc<dyn ManagedChannel> { Arc::new(channel) });
    Arc::new(connection)
}

/// A connection that hands out `channels` in order, one per `create_channel` call.
pub(crate) fn connection_serving(channels: Vec<MockManagedChannel>) -> MockManagedConnection {
    let count = channels.len();
    let pending = Mutex::new(VecDeque::from(channels));

    let mut connection = MockManagedConnection::new();
    connection
        .expect_create_channel()
        .times(count)
        .returning(move |_| -> Arc<dyn ManagedChannel> {
            Arc::new(pending.lock().unwrap().pop_front().unwrap())
        });
    connection.expect_on_event().return_const(());
    connection
}

pub(crate) fn noop_handler() -> Arc<dyn MessageHandler> {
    Arc::new(|_delivery: Delivery| async {})
}

/// Observer keeping everything it receives.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub(crate) events: Mutex<Vec<(String, ConnectionEvent)>>,
    pub(crate) errors: Mutex<Vec<(String, String, AmqpError)>>,
}

impl EventObserver for RecordingObserver {
    fn connection_event(&self, client: &str, event: &ConnectionEvent) {
        self.events
            .lock()
            .unwrap()
            .push((client.to_owned(), event.clone()));
    }

    fn channel_error(&self, client: &str, channel: &str, error: &AmqpError) {
        self.errors
            .lock()
            .unwrap()
            .push((client.to_owned(), channel.to_owned(), error.clone()));
    }
}
