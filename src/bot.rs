//! Runtime wiring.
//!
//! [`Bot`] ties the registry, the dispatcher and the autosave loop to a
//! transport and runs the inbound event loop.

use crate::config::Config;
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::RegistryError;
use crate::plugin::{Plugin, PluginCatalog, PluginRegistry, SaveReport, Services};
use crate::plugins::{ADMIN_PLUGIN, AdminPlugin};
use crate::scheduler::spawn_autosave;
use crate::transport::{InboundMessage, Transport};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Bot {
    config: Config,
    registry: Arc<PluginRegistry>,
    dispatcher: Dispatcher,
    autosave: Mutex<Option<JoinHandle<()>>>,
}

impl Bot {
    /// Build a runtime around `catalog`. The admin plugin is added to the
    /// catalog unless it already provides one under that name.
    pub fn new(config: Config, mut catalog: PluginCatalog, transport: Arc<dyn Transport>) -> Self {
        if !catalog.contains(ADMIN_PLUGIN) {
            catalog.register(ADMIN_PLUGIN, || Ok(Arc::new(AdminPlugin) as Arc<dyn Plugin>));
        }
        let services = Arc::new(Services::new(
            transport,
            config.bot.prefix.clone(),
            config.bot.owner_id(),
        ));
        let registry = PluginRegistry::new(catalog, services);
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        Self {
            config,
            registry,
            dispatcher,
            autosave: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.registry.services().shutdown.clone()
    }

    /// Load the admin plugin and every autoload plugin, start `on_ready`
    /// hooks and the autosave loop.
    ///
    /// Only a failure to load the admin plugin is an error; autoload
    /// failures are logged and skipped.
    pub async fn start(&self) -> Result<(), RegistryError> {
        self.registry.load(ADMIN_PLUGIN).await?;

        let mut failed = 0;
        for name in &self.config.plugins.autoload {
            if name == ADMIN_PLUGIN {
                continue;
            }
            if self.registry.load(name).await.is_err() {
                failed += 1;
            }
        }

        self.registry.mark_ready();

        let handle = spawn_autosave(
            Arc::clone(&self.registry),
            self.config.autosave.interval(),
            self.shutdown_token(),
        );
        *self.autosave.lock() = Some(handle);

        info!(
            plugins = self.registry.len(),
            failed,
            prefix = %self.config.bot.prefix,
            "Runtime ready"
        );
        Ok(())
    }

    /// Dispatch one message.
    pub async fn handle(&self, message: InboundMessage) -> Outcome {
        self.dispatcher.dispatch(message).await
    }

    /// Dispatch messages from `inbound` until it closes or shutdown is
    /// requested.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundMessage>) {
        let shutdown = self.shutdown_token();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested, leaving event loop");
                    break;
                }
                msg = inbound.recv() => match msg {
                    Some(msg) => {
                        self.handle(msg).await;
                    }
                    None => {
                        debug!("Inbound stream closed");
                        break;
                    }
                },
            }
        }
    }

    /// Stop background work and save every plugin once.
    pub async fn shutdown(&self) -> SaveReport {
        info!("Shutting down");
        self.registry.services().shutdown.cancel();

        let handle = self.autosave.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Autosave task ended abnormally");
        }

        let report = self.registry.save_all().await;
        info!(saved = report.saved.len(), failed = report.failed.len(), "Final save complete");
        report
    }
}
