//! Handles given to plugin code.

use super::registry::PluginRegistry;
use crate::dispatch::waiters::{ReplyWaiters, WaitOutcome};
use crate::error::{HandlerError, TransportError};
use crate::transport::{ChannelId, InboundMessage, Transport, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runtime services shared by the registry, the dispatcher and every
/// plugin.
pub struct Services {
    /// Outbound half of the chat service.
    pub transport: Arc<dyn Transport>,
    /// Outstanding follow-up waits.
    pub waiters: ReplyWaiters,
    /// Command prefix, e.g. `!`.
    pub prefix: String,
    /// The privileged identity, if configured.
    pub owner: Option<UserId>,
    /// Cancelled on shutdown. Every plugin token is a child of it.
    pub shutdown: CancellationToken,
}

impl Services {
    pub fn new(transport: Arc<dyn Transport>, prefix: impl Into<String>, owner: Option<UserId>) -> Self {
        Self {
            transport,
            waiters: ReplyWaiters::new(),
            prefix: prefix.into(),
            owner,
            shutdown: CancellationToken::new(),
        }
    }

    #[inline]
    pub fn is_owner(&self, user: &UserId) -> bool {
        self.owner.as_ref() == Some(user)
    }
}

/// What a plugin sees of the runtime.
///
/// Cheap to clone. The cancellation token is the plugin's own: it fires
/// when the plugin is unloaded or reloaded, or when the runtime shuts down.
#[derive(Clone)]
pub struct PluginContext {
    plugin: String,
    services: Arc<Services>,
    registry: Arc<PluginRegistry>,
    cancel: CancellationToken,
}

impl PluginContext {
    pub(crate) fn new(
        plugin: impl Into<String>,
        services: Arc<Services>,
        registry: Arc<PluginRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            services,
            registry,
            cancel,
        }
    }

    /// Name of the plugin this context belongs to.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn prefix(&self) -> &str {
        &self.services.prefix
    }

    pub fn is_owner(&self, user: &UserId) -> bool {
        self.services.is_owner(user)
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Fires when this plugin instance goes away.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Send `text` to `target`.
    pub async fn send(&self, target: &ChannelId, text: &str) -> Result<(), TransportError> {
        self.services.transport.send(target, text).await
    }

    /// Wait for the next message matching `filter`.
    ///
    /// Ends with [`HandlerError::ReplyTimeout`] after `timeout`, or with
    /// [`HandlerError::Cancelled`] if the plugin is unloaded meanwhile.
    pub async fn wait_for<F>(&self, filter: F, timeout: Duration) -> Result<InboundMessage, HandlerError>
    where
        F: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
    {
        match self
            .services
            .waiters
            .wait_for(filter, timeout, &self.cancel)
            .await
        {
            WaitOutcome::Reply(msg) => Ok(msg),
            WaitOutcome::TimedOut => Err(HandlerError::ReplyTimeout),
            WaitOutcome::Cancelled => Err(HandlerError::Cancelled),
        }
    }
}
