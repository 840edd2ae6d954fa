//! Plugins used by the integration tests.

use super::Calls;
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use plugbot::{
    Coercion, HandlerError, HandlerResult, Hooks, InboundMessage, Invocation, Param, Plugin,
    PluginContext, PluginState, Registrar, RegistrationError, bind,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// tools: sub-commands, continuation, owner gate, custom errors
// ============================================================================

pub struct ToolsPlugin {
    calls: Calls,
}

impl ToolsPlugin {
    pub fn new(calls: Calls) -> Self {
        Self { calls }
    }

    async fn record(&self, inv: Invocation) -> HandlerResult {
        self.calls.lock().push((inv.path.clone(), inv.args.clone()));
        inv.reply(format!("ran {}", inv.path)).await
    }
}

async fn explode(_inv: Invocation) -> HandlerResult {
    panic!("handler exploded")
}

async fn fail(_inv: Invocation) -> HandlerResult {
    Err(anyhow!("upstream unavailable").into())
}

impl Plugin for ToolsPlugin {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        let foo = reg
            .command("foo", bind(&self, |me, inv| async move { me.record(inv).await }))
            .description("Foo things")
            .param(Param::required("arg", Coercion::Str))
            .finish()?;
        reg.command("bar", bind(&self, |me, inv| async move { me.record(inv).await }))
            .parent(foo)
            .param(Param::required("n", Coercion::Str))
            .finish()?;
        reg.command("baz", bind(&self, |me, inv| async move { me.record(inv).await }))
            .parent(foo)
            .finish()?;

        let reminders = reg
            .command("reminders", bind(&self, |me, inv| async move { me.record(inv).await }))
            .description("List reminders")
            .finish()?;
        reg.command("remind", bind(&self, |me, inv| async move { me.record(inv).await }))
            .param(Param::required("minutes", Coercion::Int))
            .param(Param::required("what", Coercion::Rest))
            .fallback(reminders)
            .finish()?;

        reg.command("strict", bind(&self, |me, inv| async move { me.record(inv).await }))
            .description("Needs an x")
            .param(Param::required("x", Coercion::Str))
            .finish()?;

        reg.command("roll", bind(&self, |me, inv| async move { me.record(inv).await }))
            .param(Param::optional("sides", Coercion::Int, 6i64))
            .error("Roll needs a number of sides.")
            .finish()?;

        reg.command("add", bind(&self, |me, inv| async move { me.record(inv).await }))
            .param(Param::required("a", Coercion::Int))
            .param(Param::required("b", Coercion::Int))
            .finish()?;

        let admin = reg
            .command("secret", bind(&self, |me, inv| async move { me.record(inv).await }))
            .owner_only()
            .param(Param::required("code", Coercion::Int))
            .finish()?;
        reg.command("peek", bind(&self, |me, inv| async move { me.record(inv).await }))
            .parent(admin)
            .finish()?;

        reg.command("boom", explode).hidden().finish()?;
        reg.command("fail", fail).hidden().finish()?;
        Ok(())
    }
}

// ============================================================================
// sessions: state carried across reload, save hook
// ============================================================================

pub struct SessionPlugin {
    active: Mutex<BTreeSet<String>>,
    saves: Arc<AtomicUsize>,
}

impl SessionPlugin {
    pub fn new(saves: Arc<AtomicUsize>) -> Self {
        Self {
            active: Mutex::new(BTreeSet::new()),
            saves,
        }
    }

    async fn start(&self, inv: Invocation) -> HandlerResult {
        self.active.lock().insert(inv.channel().to_string());
        inv.reply("started").await
    }

    async fn list(&self, inv: Invocation) -> HandlerResult {
        let text = {
            let active = self.active.lock();
            if active.is_empty() {
                "none".to_owned()
            } else {
                active.iter().cloned().collect::<Vec<_>>().join(",")
            }
        };
        inv.reply(text).await
    }
}

#[async_trait]
impl Plugin for SessionPlugin {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        reg.command("start", bind(&self, |me, inv| async move { me.start(inv).await }))
            .finish()?;
        reg.command("sessions", bind(&self, |me, inv| async move { me.list(inv).await }))
            .finish()?;
        Ok(())
    }

    fn hooks(&self) -> Hooks {
        Hooks::NONE.save().reload()
    }

    async fn save(&self) -> anyhow::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn snapshot(&self) -> anyhow::Result<Option<PluginState>> {
        Ok(Some(PluginState::capture(&*self.active.lock())?))
    }

    fn restore(&self, state: PluginState) -> anyhow::Result<()> {
        *self.active.lock() = state.into_typed()?;
        Ok(())
    }
}

// ============================================================================
// observer: on_message and on_ready
// ============================================================================

pub struct ObserverPlugin {
    seen: Arc<Mutex<Vec<String>>>,
    ready: Arc<AtomicBool>,
}

impl ObserverPlugin {
    pub fn new(seen: Arc<Mutex<Vec<String>>>, ready: Arc<AtomicBool>) -> Self {
        Self { seen, ready }
    }
}

#[async_trait]
impl Plugin for ObserverPlugin {
    fn register(self: Arc<Self>, _reg: &mut Registrar) -> Result<(), RegistrationError> {
        Ok(())
    }

    fn hooks(&self) -> Hooks {
        Hooks::NONE.ready().message()
    }

    async fn on_ready(&self, _ctx: PluginContext) -> anyhow::Result<()> {
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn on_message(&self, _ctx: PluginContext, msg: InboundMessage) -> anyhow::Result<()> {
        self.seen.lock().push(msg.text);
        Ok(())
    }
}

// ============================================================================
// confirm: follow-up waits
// ============================================================================

#[derive(Default)]
pub struct ConfirmPlugin;

async fn confirm(inv: Invocation) -> HandlerResult {
    let millis = inv.args.int("millis").unwrap_or(5_000);
    inv.reply("Type go to confirm").await?;
    match inv
        .wait_for_reply(Duration::from_millis(millis.max(0) as u64))
        .await
    {
        Ok(reply) if reply.text.trim() == "go" => inv.reply("confirmed").await,
        Ok(_) => inv.reply("aborted").await,
        Err(HandlerError::ReplyTimeout) => inv.reply("timed out").await,
        Err(HandlerError::Cancelled) => inv.reply("cancelled").await,
        Err(e) => Err(e),
    }
}

impl Plugin for ConfirmPlugin {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        reg.command("confirm", confirm)
            .param(Param::optional("millis", Coercion::Int, 5_000i64))
            .finish()?;
        Ok(())
    }
}

// ============================================================================
// failure modes
// ============================================================================

async fn noop(_inv: Invocation) -> HandlerResult {
    Ok(())
}

/// Registers the same name twice.
#[derive(Default)]
pub struct BrokenPlugin;

impl Plugin for BrokenPlugin {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        reg.command("dup", noop).finish()?;
        reg.command("other", noop).finish()?;
        reg.command("dup", noop).finish()?;
        Ok(())
    }
}

/// Save hook always errors.
#[derive(Default)]
pub struct FaultyPlugin;

#[async_trait]
impl Plugin for FaultyPlugin {
    fn register(self: Arc<Self>, _reg: &mut Registrar) -> Result<(), RegistrationError> {
        Ok(())
    }

    fn hooks(&self) -> Hooks {
        Hooks::NONE.save()
    }

    async fn save(&self) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
}

/// Save hook panics.
#[derive(Default)]
pub struct PanickyPlugin;

#[async_trait]
impl Plugin for PanickyPlugin {
    fn register(self: Arc<Self>, _reg: &mut Registrar) -> Result<(), RegistrationError> {
        Ok(())
    }

    fn hooks(&self) -> Hooks {
        Hooks::NONE.save()
    }

    async fn save(&self) -> anyhow::Result<()> {
        panic!("save exploded")
    }
}

// ============================================================================
// ping_a / ping_b: same top-level name in two plugins
// ============================================================================

async fn pong_a(inv: Invocation) -> HandlerResult {
    inv.reply("pong from a").await
}

async fn pong_b(inv: Invocation) -> HandlerResult {
    inv.reply("pong from b").await
}

#[derive(Default)]
pub struct PingA;

impl Plugin for PingA {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        reg.command("ping", pong_a).finish()?;
        Ok(())
    }
}

#[derive(Default)]
pub struct PingB;

impl Plugin for PingB {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        reg.command("ping", pong_b).finish()?;
        reg.command("pingb", pong_b).finish()?;
        Ok(())
    }
}
