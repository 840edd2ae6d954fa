//! The per-message state machine.
//!
//! ```text
//! Idle -> Tokenized -> CommandMatched -> ArgumentsResolving -> Dispatched
//!                                                           -> Fallback
//!                                                           -> Rejected
//! ```
//!
//! Every non-empty message is first offered to pending reply waits and to
//! every plugin observing messages, whether or not it turns out to be a
//! command. Handlers run in their own tasks; the dispatcher never waits for
//! one to finish.

use super::context::{DispatchContext, Invocation};
use super::help;
use crate::command::CommandId;
use crate::plugin::{LoadedPlugin, PluginRegistry};
use crate::telemetry::{CommandTimer, LOG_EXCERPT_CHARS, spans, truncate};
use crate::transport::InboundMessage;
use futures_util::FutureExt;
use plugbot_args::{ArgError, resolve};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

/// Text sent when a non-owner invokes an owner-only command without a
/// custom error.
pub const PERMISSION_DENIED: &str = "You do not have permission to use this command.";

/// Why a matched command did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    PermissionDenied,
    InvalidArgument(ArgError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::InvalidArgument(e) => write!(f, "{e}"),
        }
    }
}

/// Terminal state of one dispatch.
#[derive(Debug)]
pub enum Outcome {
    /// Empty message.
    Ignored,
    /// The first token does not carry the command prefix.
    NotCommand,
    /// No loaded plugin provides the command.
    Miss { name: String },
    /// The handler was spawned.
    Dispatched { path: String, task: JoinHandle<()> },
    /// Arguments were incomplete and no continuation applied; usage was
    /// shown.
    Fallback { path: String },
    /// The command refused the invocation.
    Rejected { path: String, reason: Rejection },
}

impl Outcome {
    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::NotCommand => "not_command",
            Self::Miss { .. } => "miss",
            Self::Dispatched { .. } => "dispatched",
            Self::Fallback { .. } => "fallback",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Command path for matched outcomes.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Dispatched { path, .. } | Self::Fallback { path } | Self::Rejected { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Result of walking the continuation chain.
enum Resolution {
    Ready(CommandId, plugbot_args::Args),
    Incomplete,
    Rejected(CommandId, Rejection),
}

pub struct Dispatcher {
    registry: Arc<PluginRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Handle one inbound message.
    ///
    /// Usage and rejection replies are sent before this returns; the
    /// handler of a dispatched command is not awaited.
    pub async fn dispatch(&self, message: InboundMessage) -> Outcome {
        let outcome = self.dispatch_inner(message).await;
        crate::metrics::record_dispatch(outcome.label());
        outcome
    }

    async fn dispatch_inner(&self, message: InboundMessage) -> Outcome {
        if message.text.trim().is_empty() {
            return Outcome::Ignored;
        }
        let services = Arc::clone(self.registry.services());

        let fed = services.waiters.feed(&message);
        if fed > 0 {
            debug!(waits = fed, "Message satisfied pending waits");
        }
        self.notify_observers(&message);

        let is_owner = services.is_owner(&message.author);
        let ctx = DispatchContext::new(message, is_owner);
        let excerpt = truncate(&ctx.message.text, LOG_EXCERPT_CHARS);
        if ctx.tokens.is_degraded() {
            debug!(text = %excerpt, "Unterminated quote, fell back to plain split");
        }

        let Some(name) = ctx.command_word(&services.prefix) else {
            return Outcome::NotCommand;
        };
        let words = ctx.words(name);
        let Some((plugin, matched, used)) = self.registry.find_command(&words) else {
            debug!(command = %name, text = %excerpt, "No such command");
            return Outcome::Miss {
                name: name.to_lowercase(),
            };
        };
        let path = plugin.commands.path(matched);

        match resolve_chain(&plugin, matched, &ctx, used) {
            Resolution::Ready(target, args) => {
                let target_path = plugin.commands.path(target);
                if target != matched {
                    debug!(path = %path, continued_as = %target_path, "Continued resolution");
                }
                info!(path = %target_path, plugin = %plugin.name, author = %ctx.message.author, text = %excerpt, "Dispatching command");
                let task = self.spawn_handler(&plugin, target, target_path.clone(), args, ctx);
                Outcome::Dispatched {
                    path: target_path,
                    task,
                }
            }
            Resolution::Incomplete => {
                info!(path = %path, text = %excerpt, "Incomplete arguments, showing usage");
                let text = help::render_command(&services.prefix, &plugin.commands, matched);
                self.send(&ctx, &text).await;
                Outcome::Fallback { path }
            }
            Resolution::Rejected(at, reason) => {
                let at_path = plugin.commands.path(at);
                info!(path = %at_path, reason = %reason, author = %ctx.message.author, text = %excerpt, "Rejected command");
                let text = rejection_text(&services.prefix, &plugin, at, &reason);
                self.send(&ctx, &text).await;
                Outcome::Rejected {
                    path: at_path,
                    reason,
                }
            }
        }
    }

    fn notify_observers(&self, message: &InboundMessage) {
        for loaded in self.registry.observers() {
            let ctx = self.registry.context_for(&loaded);
            let msg = message.clone();
            let span = spans::observer(&loaded.name);
            tokio::spawn(
                async move {
                    let res = AssertUnwindSafe(loaded.plugin.on_message(ctx, msg))
                        .catch_unwind()
                        .await;
                    match res {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(error = %e, "on_message failed"),
                        Err(_) => error!("on_message panicked"),
                    }
                }
                .instrument(span),
            );
        }
    }

    fn spawn_handler(
        &self,
        plugin: &Arc<LoadedPlugin>,
        id: CommandId,
        path: String,
        args: plugbot_args::Args,
        ctx: DispatchContext,
    ) -> JoinHandle<()> {
        let handler = match plugin.commands.get(id) {
            Some(cmd) => cmd.handler(),
            None => return tokio::spawn(async {}),
        };
        let plugin_ctx = self.registry.context_for(plugin);
        let inv = Invocation::new(args, ctx.message, path.clone(), ctx.is_owner, plugin_ctx);
        let span = spans::invocation(&inv.id, &plugin.name, &path, inv.author().as_str());

        tokio::spawn(
            async move {
                let _timer = CommandTimer::new(path.as_str());
                match AssertUnwindSafe(handler.call(inv)).catch_unwind().await {
                    Ok(Ok(())) => debug!("Handler finished"),
                    Ok(Err(e)) => {
                        warn!(error = %e, code = e.error_code(), "Handler failed");
                        crate::metrics::record_handler_fault(&path, e.error_code());
                    }
                    Err(_) => {
                        error!("Handler panicked");
                        crate::metrics::record_handler_fault(&path, "panic");
                    }
                }
            }
            .instrument(span),
        )
    }

    async fn send(&self, ctx: &DispatchContext, text: &str) {
        let transport = &self.registry.services().transport;
        if let Err(e) = transport.send(&ctx.message.channel, text).await {
            warn!(channel = %ctx.message.channel, error = %e, "Failed to send reply");
        }
    }
}

/// `true` if `id` or any enclosing command is owner-only.
fn requires_owner(plugin: &LoadedPlugin, id: CommandId) -> bool {
    let mut cursor = Some(id);
    while let Some(cmd) = cursor.and_then(|c| plugin.commands.get(c)) {
        if cmd.owner_only {
            return true;
        }
        cursor = cmd.parent;
    }
    false
}

/// Resolve arguments for `start`, following continuation targets while the
/// argument list stays incomplete. Every target resolves from the same
/// token position.
fn resolve_chain(plugin: &LoadedPlugin, start: CommandId, ctx: &DispatchContext, pos: usize) -> Resolution {
    let mut current = start;
    // Targets must be registered before the commands naming them, so a
    // chain is never longer than the set.
    for _ in 0..=plugin.commands.len() {
        let Some(cmd) = plugin.commands.get(current) else {
            break;
        };
        if !ctx.is_owner && requires_owner(plugin, current) {
            return Resolution::Rejected(current, Rejection::PermissionDenied);
        }
        match resolve(&cmd.params, &ctx.tokens, pos, &ctx.message.text) {
            Ok(args) => return Resolution::Ready(current, args),
            Err(ArgError::Incomplete { param }) => match cmd.fallback {
                Some(next) => {
                    debug!(param = %param, "Incomplete, trying continuation");
                    current = next;
                }
                None => return Resolution::Incomplete,
            },
            Err(e) => return Resolution::Rejected(current, Rejection::InvalidArgument(e)),
        }
    }
    Resolution::Incomplete
}

fn rejection_text(prefix: &str, plugin: &LoadedPlugin, id: CommandId, reason: &Rejection) -> String {
    if let Some(custom) = plugin.commands.get(id).and_then(|c| c.error.clone()) {
        return custom;
    }
    match reason {
        Rejection::PermissionDenied => PERMISSION_DENIED.to_owned(),
        Rejection::InvalidArgument(_) => format!(
            "Invalid parameters. Usage: {}",
            help::usage_line(prefix, &plugin.commands, id)
        ),
    }
}
