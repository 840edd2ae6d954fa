//! The plugin registry.
//!
//! Owns every loaded plugin and, through them, every registered command.
//! All mutation goes through [`load`](PluginRegistry::load),
//! [`unload`](PluginRegistry::unload) and
//! [`reload`](PluginRegistry::reload), which are serialised per plugin
//! name. Operations on different names run concurrently.
//!
//! A loaded plugin is published as one immutable [`LoadedPlugin`]; reload
//! replaces it wholesale, so dispatch either sees the old instance or the
//! new one, never a mix.

use super::catalog::PluginCatalog;
use super::context::{PluginContext, Services};
use super::state::PluginState;
use super::traits::{Hooks, Plugin};
use crate::command::{CommandId, CommandSet, CommandTable, Registrar};
use crate::dashmap_ext::DashMapExt;
use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::FutureExt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One published plugin instance.
pub struct LoadedPlugin {
    pub name: String,
    pub plugin: Arc<dyn Plugin>,
    pub commands: CommandSet,
    pub hooks: Hooks,
    pub loaded_at: DateTime<Utc>,
    pub(crate) cancel: CancellationToken,
    ready_started: AtomicBool,
}

impl LoadedPlugin {
    /// Token cancelled when this instance is torn down.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Summary row for listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    /// Full paths of every command, nested ones included.
    pub commands: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Result of [`PluginRegistry::save_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: Vec<String>,
    pub failed: Vec<String>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct PluginRegistry {
    catalog: PluginCatalog,
    services: Arc<Services>,
    plugins: DashMap<String, Arc<LoadedPlugin>>,
    table: CommandTable,
    name_locks: DashMap<String, Arc<Mutex<()>>>,
    ready: AtomicBool,
}

impl PluginRegistry {
    pub fn new(catalog: PluginCatalog, services: Arc<Services>) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            services,
            plugins: DashMap::new(),
            table: CommandTable::new(),
            name_locks: DashMap::new(),
            ready: AtomicBool::new(false),
        })
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// The published instance of `name`.
    pub fn get(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.plugins.get_cloned(name)
    }

    /// Every loaded plugin, sorted by name.
    pub fn loaded(&self) -> Vec<Arc<LoadedPlugin>> {
        self.plugins.values_sorted_by_key(|_| true)
    }

    /// Plugins observing every message.
    pub fn observers(&self) -> Vec<Arc<LoadedPlugin>> {
        self.plugins.values_sorted_by_key(|p| p.hooks.message)
    }

    pub fn list(&self) -> Vec<PluginInfo> {
        self.loaded()
            .iter()
            .map(|p| PluginInfo {
                name: p.name.clone(),
                commands: p.commands.all_paths(),
                loaded_at: p.loaded_at,
            })
            .collect()
    }

    /// Resolve `words` to the deepest matching command.
    ///
    /// The first word picks the plugin through the command table; the rest
    /// descend through that plugin's sub-commands. Returns the plugin, the
    /// command and how many words named it.
    pub fn find_command(&self, words: &[&str]) -> Option<(Arc<LoadedPlugin>, CommandId, usize)> {
        let first = words.first()?.to_lowercase();
        let owner = self.table.lookup(&first)?;
        let plugin = self.get(&owner)?;
        let (id, used) = plugin.commands.walk(words.iter().copied())?;
        Some((plugin, id, used))
    }

    /// Context handed to code of the plugin `loaded`.
    pub fn context_for(self: &Arc<Self>, loaded: &LoadedPlugin) -> PluginContext {
        PluginContext::new(
            loaded.name.clone(),
            Arc::clone(&self.services),
            Arc::clone(self),
            loaded.cancel.clone(),
        )
    }

    /// Lock serialising lifecycle operations on `name`. Only catalog names
    /// get one; nothing else can ever be loaded.
    fn name_lock(&self, name: &str) -> Option<Arc<Mutex<()>>> {
        if !self.catalog.contains(name) {
            return None;
        }
        Some(Arc::clone(self.name_locks.entry(name.to_owned()).or_default().value()))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Instantiate `name` from the catalog and publish its commands.
    ///
    /// Either every command of the plugin becomes visible or none does; on
    /// error the registry is unchanged.
    pub async fn load(self: &Arc<Self>, name: &str) -> Result<(), RegistryError> {
        let res = match self.name_lock(name) {
            None => Err(RegistryError::NotFound(name.to_owned())),
            Some(lock) => {
                let _guard = lock.lock().await;
                self.load_locked(name, None)
            }
        };
        record_op("load", &res);
        if let Err(e) = &res {
            error!(plugin = %name, error = %e, "Failed to load plugin");
        }
        res
    }

    /// Save and tear down `name`. Returns `false` if it was not loaded.
    pub async fn unload(&self, name: &str) -> bool {
        let Some(lock) = self.name_lock(name) else {
            crate::metrics::record_plugin_op("unload", "not_loaded");
            return false;
        };
        let _guard = lock.lock().await;
        let unloaded = self.unload_locked(name).await.is_some();
        crate::metrics::record_plugin_op("unload", if unloaded { "ok" } else { "not_loaded" });
        unloaded
    }

    /// Save, tear down and load `name` again.
    ///
    /// If the plugin declares [`Hooks::reload`], its state is captured with
    /// [`Plugin::snapshot`] before teardown and handed to the new instance
    /// through [`Plugin::restore`] before the new commands are published.
    /// If the fresh load fails the plugin stays unloaded.
    pub async fn reload(self: &Arc<Self>, name: &str) -> Result<(), RegistryError> {
        let res = match self.name_lock(name) {
            None => Err(RegistryError::NotLoaded(name.to_owned())),
            Some(lock) => {
                let _guard = lock.lock().await;
                match self.get(name) {
                    None => Err(RegistryError::NotLoaded(name.to_owned())),
                    Some(old) => {
                        let state = snapshot(&old);
                        drop(old);
                        self.unload_locked(name).await;
                        self.load_locked(name, state)
                    }
                }
            }
        };
        record_op("reload", &res);
        match &res {
            Ok(()) => info!(plugin = %name, "Plugin reloaded"),
            Err(e) => error!(plugin = %name, error = %e, "Failed to reload plugin"),
        }
        res
    }

    /// Run the save hook of every plugin that declares one.
    ///
    /// A failing or panicking hook is logged and reported; it never stops
    /// the others.
    pub async fn save_all(&self) -> SaveReport {
        let mut report = SaveReport::default();
        for loaded in self.plugins.values_sorted_by_key(|p| p.hooks.save) {
            if save_plugin(&loaded).await {
                report.saved.push(loaded.name.clone());
            } else {
                report.failed.push(loaded.name.clone());
            }
        }
        debug!(saved = report.saved.len(), failed = report.failed.len(), "save_all finished");
        report
    }

    /// Mark the runtime as ready and start every `on_ready` hook. Plugins
    /// loaded afterwards get theirs started right after load.
    pub fn mark_ready(self: &Arc<Self>) {
        if self.ready.swap(true, Ordering::AcqRel) {
            return;
        }
        for loaded in self.plugins.values_sorted_by_key(|p| p.hooks.ready) {
            self.spawn_ready(loaded);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn load_locked(self: &Arc<Self>, name: &str, state: Option<PluginState>) -> Result<(), RegistryError> {
        if self.plugins.contains_key(name) {
            return Err(RegistryError::AlreadyLoaded(name.to_owned()));
        }

        let plugin = self.catalog.instantiate(name)?;
        let commands = register(name, &plugin)?;
        let hooks = plugin.hooks();

        if let Some(state) = state {
            match catch_unwind(AssertUnwindSafe(|| plugin.restore(state))) {
                Ok(Ok(())) => debug!(plugin = %name, "Restored state"),
                Ok(Err(e)) => warn!(plugin = %name, error = %e, "Failed to restore state"),
                Err(_) => warn!(plugin = %name, "restore panicked"),
            }
        }

        let loaded = Arc::new(LoadedPlugin {
            name: name.to_owned(),
            plugin,
            commands,
            hooks,
            loaded_at: Utc::now(),
            cancel: self.services.shutdown.child_token(),
            ready_started: AtomicBool::new(false),
        });
        let top = loaded.commands.top_level_names();

        self.plugins.insert(name.to_owned(), Arc::clone(&loaded));
        for (command, owner) in self.table.insert(name, &top) {
            warn!(plugin = %name, command = %command, provided_by = %owner, "Command name already taken, keeping the earlier plugin");
        }
        crate::metrics::set_plugins_loaded(self.plugins.len());

        info!(plugin = %name, commands = loaded.commands.len(), "Plugin loaded");

        if hooks.ready && self.is_ready() {
            self.spawn_ready(loaded);
        }
        Ok(())
    }

    async fn unload_locked(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        let loaded = self.get(name)?;

        if loaded.hooks.save {
            save_plugin(&loaded).await;
        }

        self.table.remove(name);
        self.plugins.remove(name);
        loaded.cancel.cancel();
        crate::metrics::set_plugins_loaded(self.plugins.len());

        info!(plugin = %name, "Plugin unloaded");
        Some(loaded)
    }

    /// Start `on_ready` for `loaded` unless it already started. A load
    /// racing [`mark_ready`](Self::mark_ready) may reach here twice.
    fn spawn_ready(self: &Arc<Self>, loaded: Arc<LoadedPlugin>) {
        if loaded.ready_started.swap(true, Ordering::AcqRel) {
            return;
        }
        let ctx = self.context_for(&loaded);
        tokio::spawn(async move {
            let cancel = loaded.cancel.clone();
            let name = loaded.name.clone();
            let ready = AssertUnwindSafe(loaded.plugin.on_ready(ctx)).catch_unwind();
            tokio::select! {
                _ = cancel.cancelled() => debug!(plugin = %name, "on_ready cancelled"),
                res = ready => match res {
                    Ok(Ok(())) => debug!(plugin = %name, "on_ready finished"),
                    Ok(Err(e)) => warn!(plugin = %name, error = %e, "on_ready failed"),
                    Err(_) => error!(plugin = %name, "on_ready panicked"),
                },
            }
        });
    }
}

fn register(name: &str, plugin: &Arc<dyn Plugin>) -> Result<CommandSet, RegistryError> {
    let mut reg = Registrar::new(name);
    let res = catch_unwind(AssertUnwindSafe(|| Arc::clone(plugin).register(&mut reg)));
    match res {
        Ok(Ok(())) => Ok(reg.into_commands()),
        Ok(Err(source)) => Err(RegistryError::Registration {
            name: name.to_owned(),
            source,
        }),
        Err(_) => Err(RegistryError::Init {
            name: name.to_owned(),
            reason: "panicked while registering commands".to_owned(),
        }),
    }
}

fn snapshot(loaded: &LoadedPlugin) -> Option<PluginState> {
    if !loaded.hooks.reload {
        return None;
    }
    match catch_unwind(AssertUnwindSafe(|| loaded.plugin.snapshot())) {
        Ok(Ok(state)) => state,
        Ok(Err(e)) => {
            warn!(plugin = %loaded.name, error = %e, "Failed to snapshot state, reloading without it");
            None
        }
        Err(_) => {
            warn!(plugin = %loaded.name, "snapshot panicked, reloading without state");
            None
        }
    }
}

/// Run one save hook. Returns `true` on success.
async fn save_plugin(loaded: &LoadedPlugin) -> bool {
    let res = AssertUnwindSafe(loaded.plugin.save()).catch_unwind().await;
    let ok = match res {
        Ok(Ok(())) => {
            debug!(plugin = %loaded.name, "Saved");
            true
        }
        Ok(Err(e)) => {
            error!(plugin = %loaded.name, error = %e, "Save failed");
            false
        }
        Err(_) => {
            error!(plugin = %loaded.name, "Save panicked");
            false
        }
    };
    crate::metrics::record_save(&loaded.name, ok);
    ok
}

fn record_op(op: &str, res: &Result<(), RegistryError>) {
    let result = match res {
        Ok(()) => "ok",
        Err(e) => e.error_code(),
    };
    crate::metrics::record_plugin_op(op, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Invocation;
    use crate::error::{HandlerResult, RegistrationError, TransportError};
    use crate::transport::{ChannelId, Transport};
    use async_trait::async_trait;

    struct Sink;

    #[async_trait]
    impl Transport for Sink {
        async fn send(&self, _target: &ChannelId, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    async fn noop(_inv: Invocation) -> HandlerResult {
        Ok(())
    }

    #[derive(Default)]
    struct Ping;

    impl Plugin for Ping {
        fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
            let ping = reg.command("ping", noop).finish()?;
            reg.command("loud", noop).parent(ping).finish()?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Broken;

    impl Plugin for Broken {
        fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
            reg.command("a", noop).finish()?;
            reg.command("a", noop).finish()?;
            Ok(())
        }
    }

    struct Ready {
        runs: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for Ready {
        fn register(self: Arc<Self>, _reg: &mut Registrar) -> Result<(), RegistrationError> {
            Ok(())
        }

        fn hooks(&self) -> Hooks {
            Hooks::NONE.ready()
        }

        async fn on_ready(&self, _ctx: PluginContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry() -> Arc<PluginRegistry> {
        let catalog = PluginCatalog::new()
            .with_default::<Ping>("ping")
            .with_default::<Broken>("broken");
        PluginRegistry::new(catalog, Arc::new(Services::new(Arc::new(Sink), "!", None)))
    }

    #[tokio::test]
    async fn test_load_and_unload() {
        let reg = registry();
        reg.load("ping").await.unwrap();
        assert!(reg.is_loaded("ping"));
        assert!(matches!(
            reg.load("ping").await,
            Err(RegistryError::AlreadyLoaded(_))
        ));

        let (plugin, id, used) = reg.find_command(&["PING", "loud"]).unwrap();
        assert_eq!(plugin.name, "ping");
        assert_eq!(plugin.commands.path(id), "ping loud");
        assert_eq!(used, 2);

        let token = plugin.cancellation().clone();
        assert!(reg.unload("ping").await);
        assert!(token.is_cancelled());
        assert!(!reg.unload("ping").await);
        assert!(reg.find_command(&["ping"]).is_none());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_nothing_behind() {
        let reg = registry();
        let err = reg.load("broken").await.unwrap_err();
        assert_eq!(err.error_code(), "registration_failed");
        assert!(!reg.is_loaded("broken"));
        assert!(reg.table().names().is_empty());

        assert!(matches!(
            reg.load("missing").await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_reload_unknown() {
        let reg = registry();
        reg.load("ping").await.unwrap();
        let list = reg.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].commands, vec!["ping".to_owned(), "ping loud".to_owned()]);

        assert!(matches!(
            reg.reload("broken").await,
            Err(RegistryError::NotLoaded(_))
        ));
    }

    #[tokio::test]
    async fn test_on_ready_starts_once_per_instance() {
        let runs = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let r = Arc::clone(&runs);
        let catalog = PluginCatalog::new().with("ready", move || {
            Ok(Arc::new(Ready { runs: Arc::clone(&r) }) as Arc<dyn Plugin>)
        });
        let reg = PluginRegistry::new(catalog, Arc::new(Services::new(Arc::new(Sink), "!", None)));

        reg.load("ready").await.unwrap();
        reg.mark_ready();
        // a load that published just before mark_ready flipped the flag
        reg.spawn_ready(reg.get("ready").unwrap());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // a fresh instance gets its own run
        reg.reload("ready").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_names_leave_no_lock_behind() {
        let reg = registry();
        assert!(matches!(reg.load("typo").await, Err(RegistryError::NotFound(_))));
        assert!(!reg.unload("typo").await);
        assert!(matches!(reg.reload("typo").await, Err(RegistryError::NotLoaded(_))));
        assert!(reg.name_locks.is_empty());

        reg.load("ping").await.unwrap();
        assert!(reg.unload("ping").await);
        assert_eq!(reg.name_locks.len(), 1);
    }
}
