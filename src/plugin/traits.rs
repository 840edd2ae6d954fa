//! The plugin trait.

use super::context::PluginContext;
use super::state::PluginState;
use crate::command::Registrar;
use crate::error::RegistrationError;
use crate::transport::InboundMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// Which optional lifecycle hooks a plugin implements.
///
/// The registry only calls hooks that are declared here, so an undeclared
/// hook is never invoked even if the trait method is overridden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hooks {
    /// Call [`Plugin::on_ready`] once the runtime is up.
    pub ready: bool,
    /// Call [`Plugin::on_message`] for every non-empty message.
    pub message: bool,
    /// Call [`Plugin::save`] from autosave, unload, reload and shutdown.
    pub save: bool,
    /// Carry state across a reload with [`Plugin::snapshot`] and
    /// [`Plugin::restore`].
    pub reload: bool,
}

impl Hooks {
    pub const NONE: Self = Self {
        ready: false,
        message: false,
        save: false,
        reload: false,
    };

    pub const fn ready(mut self) -> Self {
        self.ready = true;
        self
    }

    pub const fn message(mut self) -> Self {
        self.message = true;
        self
    }

    pub const fn save(mut self) -> Self {
        self.save = true;
        self
    }

    pub const fn reload(mut self) -> Self {
        self.reload = true;
        self
    }
}

/// An independently loadable unit contributing commands and hooks.
///
/// A fresh instance is created for every load, so anything kept in the
/// plugin struct starts over on reload unless it is carried through
/// [`snapshot`](Self::snapshot) / [`restore`](Self::restore).
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Register every command of this plugin.
    ///
    /// Takes `Arc<Self>` so handlers can keep a reference to the plugin.
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError>;

    /// Hooks this plugin implements.
    fn hooks(&self) -> Hooks {
        Hooks::NONE
    }

    /// Runs once, in its own task, after the runtime is ready (or right
    /// after load when loaded later).
    async fn on_ready(&self, _ctx: PluginContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Observes every non-empty message, command or not.
    async fn on_message(&self, _ctx: PluginContext, _msg: InboundMessage) -> anyhow::Result<()> {
        Ok(())
    }

    /// Persist plugin state.
    async fn save(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Capture transient state right before a reload tears this instance
    /// down.
    fn snapshot(&self) -> anyhow::Result<Option<PluginState>> {
        Ok(None)
    }

    /// Re-inject a snapshot into the freshly loaded instance, before it
    /// becomes visible to dispatch.
    fn restore(&self, _state: PluginState) -> anyhow::Result<()> {
        Ok(())
    }
}
