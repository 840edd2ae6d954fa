//! Plugins and their lifecycle.
//!
//! This module is split into logical submodules:
//! - [`traits`]: the `Plugin` trait and its optional `Hooks`
//! - [`catalog`]: the name -> factory table `load` instantiates from
//! - [`context`]: handles given to plugin code (`PluginContext`, `Services`)
//! - [`state`]: the opaque snapshot carried across a reload
//! - [`registry`]: load / unload / reload / save_all

pub mod catalog;
pub mod context;
pub mod registry;
pub mod state;
pub mod traits;

pub use catalog::{PluginCatalog, PluginFactory};
pub use context::{PluginContext, Services};
pub use registry::{LoadedPlugin, PluginInfo, PluginRegistry, SaveReport};
pub use state::PluginState;
pub use traits::{Hooks, Plugin};
