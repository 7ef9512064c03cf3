// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Channel Setup Policy
//!
//! Maps the `concurrent_message_limit` of an exchange or queue configuration to the
//! actions a connection manager runs once, right after opening the transport channel
//! and before anything else is sent on it.

/// Setup actions for a transport channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSetup {
    prefetch: Option<u16>,
}

impl ChannelSetup {
    /// Builds the setup for a configured message limit.
    ///
    /// A limit of at least one becomes the channel prefetch; zero or no limit leaves
    /// the broker default in place.
    pub fn from_limit(concurrent_message_limit: Option<u16>) -> Self {
        ChannelSetup {
            prefetch: concurrent_message_limit.filter(|limit| *limit >= 1),
        }
    }

    /// Prefetch count to apply with `basic.qos`, if any.
    pub fn prefetch(&self) -> Option<u16> {
        self.prefetch
    }
}
