//! Integration test common infrastructure.
//!
//! Provides a recording transport, a set of small test plugins and a
//! harness that wires them into a [`Bot`].

#![allow(dead_code)]

pub mod plugins;
pub mod transport;

use parking_lot::Mutex;
use plugbot::config::Config;
use plugbot::plugin::PluginCatalog;
use plugbot::{Args, Bot, InboundMessage, Outcome, Plugin};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize};

pub use plugins::*;
pub use transport::RecordingTransport;

pub const OWNER: &str = "owner";
pub const GUEST: &str = "guest";
pub const CHANNEL: &str = "chan";

/// `(command path, arguments)` of every handler run.
pub type Calls = Arc<Mutex<Vec<(String, Args)>>>;

pub struct Harness {
    pub bot: Bot,
    pub transport: Arc<RecordingTransport>,
    pub calls: Calls,
    pub saves: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<String>>>,
    pub ready: Arc<AtomicBool>,
}

impl Harness {
    /// A bot owned by [`OWNER`] whose catalog holds every test plugin.
    pub fn new() -> Self {
        let mut config = Config::default();
        config.bot.owner = Some(OWNER.to_owned());
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let transport = Arc::new(RecordingTransport::default());
        let calls: Calls = Arc::default();
        let saves = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ready = Arc::new(AtomicBool::new(false));

        let mut catalog = PluginCatalog::new()
            .with_default::<ConfirmPlugin>("confirm")
            .with_default::<BrokenPlugin>("broken")
            .with_default::<FaultyPlugin>("faulty")
            .with_default::<PanickyPlugin>("panicky")
            .with_default::<PingA>("ping_a")
            .with_default::<PingB>("ping_b");
        {
            let calls = Arc::clone(&calls);
            catalog.register("tools", move || {
                Ok(Arc::new(ToolsPlugin::new(Arc::clone(&calls))) as Arc<dyn Plugin>)
            });
        }
        {
            let saves = Arc::clone(&saves);
            catalog.register("sessions", move || {
                Ok(Arc::new(SessionPlugin::new(Arc::clone(&saves))) as Arc<dyn Plugin>)
            });
        }
        {
            let seen = Arc::clone(&seen);
            let ready = Arc::clone(&ready);
            catalog.register("observer", move || {
                Ok(Arc::new(ObserverPlugin::new(Arc::clone(&seen), Arc::clone(&ready))) as Arc<dyn Plugin>)
            });
        }
        catalog.register("failing_init", || Err(anyhow::anyhow!("missing api key")));

        let bot = Bot::new(config, catalog, transport.clone());
        Self {
            bot,
            transport,
            calls,
            saves,
            seen,
            ready,
        }
    }

    /// Start the bot with `autoload` as the startup plugin list.
    pub async fn started(autoload: &[&str]) -> Self {
        let mut config = Config::default();
        config.bot.owner = Some(OWNER.to_owned());
        config.plugins.autoload = autoload.iter().map(|s| s.to_string()).collect();
        let h = Self::with_config(config);
        h.bot.start().await.expect("admin plugin loads");
        h
    }

    /// Dispatch `text` from `author` in [`CHANNEL`].
    pub async fn send(&self, author: &str, text: &str) -> Outcome {
        self.send_in(author, CHANNEL, text).await
    }

    pub async fn send_in(&self, author: &str, channel: &str, text: &str) -> Outcome {
        self.bot
            .handle(InboundMessage::new(author, channel, text))
            .await
    }

    /// Dispatch and wait for the handler to finish. Returns the path that
    /// ran.
    pub async fn run(&self, author: &str, text: &str) -> String {
        self.run_in(author, CHANNEL, text).await
    }

    pub async fn run_in(&self, author: &str, channel: &str, text: &str) -> String {
        match self.send_in(author, channel, text).await {
            Outcome::Dispatched { path, task } => {
                task.await.expect("handler task joins");
                path
            }
            other => panic!("expected {text:?} to dispatch, got {other:?}"),
        }
    }

    /// Paths of every handler run so far.
    pub fn call_paths(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Arguments of the most recent handler run.
    pub fn last_args(&self) -> Args {
        self.calls
            .lock()
            .last()
            .map(|(_, a)| a.clone())
            .expect("a handler ran")
    }
}
