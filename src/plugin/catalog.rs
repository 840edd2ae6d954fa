//! Plugin catalog: where `load(name)` finds things to instantiate.

use super::traits::Plugin;
use crate::error::RegistryError;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Builds a fresh plugin instance.
pub type PluginFactory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn Plugin>> + Send + Sync>;

/// Known plugins by name.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: HashMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Arc<dyn Plugin>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Plugin>> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Add a plugin built with `Default::default()`.
    pub fn with_default<P>(self, name: impl Into<String>) -> Self
    where
        P: Plugin + Default,
    {
        self.with(name, || Ok(Arc::new(P::default()) as Arc<dyn Plugin>))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Catalog names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a new instance of `name`. A factory that errors or panics is
    /// reported as [`RegistryError::Init`].
    pub(crate) fn instantiate(&self, name: &str) -> Result<Arc<dyn Plugin>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))?;

        match catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(plugin)) => Ok(plugin),
            Ok(Err(e)) => Err(RegistryError::Init {
                name: name.to_owned(),
                reason: format!("{e:#}"),
            }),
            Err(_) => Err(RegistryError::Init {
                name: name.to_owned(),
                reason: "panicked during initialization".to_owned(),
            }),
        }
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("plugins", &self.names())
            .finish()
    }
}
