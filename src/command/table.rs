//! Global command name index.
//!
//! Maps every top-level command name (and alias) to the plugins providing
//! it, in load order. The index only stores plugin names; the commands
//! themselves stay owned by their plugin. When two plugins claim the same
//! name the one loaded first wins until it is unloaded.

use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CommandTable {
    index: RwLock<HashMap<String, Vec<String>>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `names` for `plugin`. Returns `(name, current_owner)` for every
    /// name another plugin already provides.
    pub fn insert(&self, plugin: &str, names: &[String]) -> Vec<(String, String)> {
        let mut index = self.index.write();
        let mut clashes = Vec::new();
        for name in names {
            let owners = index.entry(name.clone()).or_default();
            if let Some(first) = owners.first()
                && first != plugin
            {
                clashes.push((name.clone(), first.clone()));
            }
            if !owners.iter().any(|o| o == plugin) {
                owners.push(plugin.to_owned());
            }
        }
        clashes
    }

    /// Drop every entry for `plugin`.
    pub fn remove(&self, plugin: &str) {
        let mut index = self.index.write();
        index.retain(|_, owners| {
            owners.retain(|o| o != plugin);
            !owners.is_empty()
        });
    }

    /// Plugin currently answering to `name`.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.index.read().get(name).and_then(|o| o.first().cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.read().contains_key(name)
    }

    /// All indexed names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Names provided by `plugin`, sorted.
    pub fn names_for(&self, plugin: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .index
            .read()
            .iter()
            .filter(|(_, owners)| owners.iter().any(|o| o == plugin))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
