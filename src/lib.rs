//! plugbot - plugin-hosting command runtime for chat bots.
//!
//! Inbound chat messages are tokenized, matched against the commands that
//! loaded plugins registered, coerced into typed arguments and handed to the
//! matching handler as an independent tokio task. Plugins can be loaded,
//! unloaded and hot-reloaded at runtime; a background loop periodically asks
//! them to persist their state.
//!
//! The chat service itself is consumed through [`transport::Transport`] and
//! a stream of [`transport::InboundMessage`]s.

pub mod bot;
pub mod command;
pub mod config;
pub mod dashmap_ext;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod metrics;
pub mod plugin;
pub mod plugins;
pub mod scheduler;
pub mod telemetry;
pub mod transport;

pub use bot::Bot;
pub use command::{CommandId, Registrar, bind};
pub use dispatch::{Dispatcher, Invocation, Outcome};
pub use error::{HandlerError, HandlerResult, RegistrationError, RegistryError};
pub use plugin::{Hooks, Plugin, PluginCatalog, PluginContext, PluginRegistry, PluginState};
pub use plugbot_args::{Args, Coercion, Param, Value};
pub use transport::{ChannelId, InboundMessage, Transport, UserId};
