//! The chat service as seen by the runtime.
//!
//! The runtime never talks to a chat network directly. It consumes a stream
//! of [`InboundMessage`]s and replies through a [`Transport`]. Connecting,
//! reconnecting and the wire protocol belong to the transport
//! implementation.

pub mod console;

use crate::error::TransportError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Opaque identity of a message author.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

/// Opaque reply target (a channel, a direct conversation, a thread).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One message received from the chat service.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Raw message text.
    pub text: String,
    /// Who sent it.
    pub author: UserId,
    /// Where replies should go.
    pub channel: ChannelId,
    /// When the transport received it.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    /// Build a message stamped with the current time.
    pub fn new(author: impl Into<String>, channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: UserId::new(author),
            channel: ChannelId::new(channel),
            received_at: Utc::now(),
        }
    }
}

/// Outbound half of the chat service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `text` to `target`.
    async fn send(&self, target: &ChannelId, text: &str) -> Result<(), TransportError>;
}
