// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Message Options
//!
//! Publish and consume options shared by exchange and queue channels, plus the JSON
//! encoding used by `send_json_message`.

use crate::errors::AmqpError;
use lapin::types::FieldTable;
use serde::Serialize;

/// Default content type for JSON messages
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Default content encoding for JSON messages
pub const JSON_CONTENT_ENCODING: &str = "utf-8";

/// Per-message publish options. Unset fields are left out of the AMQP properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishOptions {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    /// Maps to delivery mode 2 when `true`.
    pub persistent: Option<bool>,
    pub headers: Option<FieldTable>,
    pub message_id: Option<String>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    /// Per-message TTL in milliseconds, as AMQP expects it: a decimal string.
    pub expiration: Option<String>,
    pub priority: Option<u8>,
    pub msg_type: Option<String>,
    pub mandatory: bool,
}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = Some(persistent);
        self
    }

    pub fn headers(mut self, headers: FieldTable) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.correlation_id = Some(id.to_owned());
        self
    }

    pub fn reply_to(mut self, queue: &str) -> Self {
        self.reply_to = Some(queue.to_owned());
        self
    }

    pub fn msg_type(mut self, kind: &str) -> Self {
        self.msg_type = Some(kind.to_owned());
        self
    }

    pub fn expiration_ms(mut self, ttl: u64) -> Self {
        self.expiration = Some(ttl.to_string());
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Applies the JSON defaults on top of the caller's options.
    ///
    /// Content type and encoding always describe the JSON payload; `persistent`
    /// comes from the explicit argument. Everything else is kept as given.
    pub(crate) fn with_json_defaults(mut self, persistent: bool) -> Self {
        self.content_encoding = Some(JSON_CONTENT_ENCODING.to_owned());
        self.content_type = Some(JSON_CONTENT_TYPE.to_owned());
        self.persistent = Some(persistent);
        self
    }
}

/// Options for registering a consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumeOptions {
    /// Generated when empty.
    pub consumer_tag: Option<String>,
    pub no_ack: bool,
    pub exclusive: bool,
    pub arguments: FieldTable,
}

impl ConsumeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consumer_tag(mut self, tag: &str) -> Self {
        self.consumer_tag = Some(tag.to_owned());
        self
    }

    pub fn no_ack(mut self) -> Self {
        self.no_ack = true;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}

/// Serializes `message` into a UTF-8 JSON payload.
pub(crate) fn encode_json<T>(message: &T) -> Result<Vec<u8>, AmqpError>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_vec(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_payload_is_compact_utf8() {
        let payload = encode_json(&json!({"a": 1})).unwrap();
        assert_eq!(payload, br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn json_defaults_keep_caller_fields() {
        let opts = PublishOptions::new()
            .correlation_id("abc")
            .msg_type("order.created")
            .with_json_defaults(true);

        assert_eq!(opts.content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(opts.content_encoding.as_deref(), Some(JSON_CONTENT_ENCODING));
        assert_eq!(opts.persistent, Some(true));
        assert_eq!(opts.correlation_id.as_deref(), Some("abc"));
        assert_eq!(opts.msg_type.as_deref(), Some("order.created"));
    }

    #[test]
    fn json_defaults_honor_non_persistent() {
        let opts = PublishOptions::new().persistent(true).with_json_defaults(false);
        assert_eq!(opts.persistent, Some(false));
    }
}
