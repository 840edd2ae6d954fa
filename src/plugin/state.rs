//! State carried across a plugin reload.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Opaque snapshot produced by [`Plugin::snapshot`](super::Plugin::snapshot)
/// and handed back to [`Plugin::restore`](super::Plugin::restore).
///
/// The registry never looks inside; the plugin picks the shape.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginState(serde_json::Value);

impl PluginState {
    /// Capture any serializable value.
    pub fn capture<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    /// Turn the snapshot back into a typed value.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.0)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for PluginState {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
