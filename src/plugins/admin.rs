//! Operator meta-commands.
//!
//! `plugins`, `load`, `unload`, `reload` and `save` drive the registry and
//! are restricted to the owner. `help` is public.

use crate::command::{Registrar, bind};
use crate::dispatch::Invocation;
use crate::dispatch::help::{render_command, render_index};
use crate::error::{HandlerResult, RegistrationError};
use crate::plugin::Plugin;
use plugbot_args::{Coercion, Param};
use std::sync::Arc;

/// Catalog name of the admin plugin.
pub const ADMIN_PLUGIN: &str = "admin";

#[derive(Debug, Default)]
pub struct AdminPlugin;

impl Plugin for AdminPlugin {
    fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
        reg.command("plugins", bind(&self, |me, inv| async move { me.list(inv).await }))
            .description("List loaded and available plugins")
            .owner_only()
            .finish()?;

        reg.command("load", bind(&self, |me, inv| async move { me.load(inv).await }))
            .description("Load a plugin")
            .param(Param::required("name", Coercion::Lower))
            .owner_only()
            .finish()?;

        reg.command("unload", bind(&self, |me, inv| async move { me.unload(inv).await }))
            .description("Save and unload a plugin")
            .param(Param::required("name", Coercion::Lower))
            .owner_only()
            .finish()?;

        reg.command("reload", bind(&self, |me, inv| async move { me.reload(inv).await }))
            .description("Reload a plugin, keeping its session state")
            .param(Param::required("name", Coercion::Lower))
            .owner_only()
            .finish()?;

        reg.command("save", bind(&self, |me, inv| async move { me.save(inv).await }))
            .description("Save every plugin now")
            .owner_only()
            .finish()?;

        reg.command("help", bind(&self, |me, inv| async move { me.help(inv).await }))
            .alias("commands")
            .description("Show commands, or the usage of one command")
            .param(Param::optional("command", Coercion::Rest, ""))
            .finish()?;

        Ok(())
    }
}

impl AdminPlugin {
    async fn list(&self, inv: Invocation) -> HandlerResult {
        let registry = inv.registry();
        let mut lines: Vec<String> = registry
            .list()
            .into_iter()
            .map(|p| {
                format!(
                    "{} ({} commands, loaded {})",
                    p.name,
                    p.commands.len(),
                    p.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            })
            .collect();

        let available: Vec<String> = registry
            .catalog()
            .names()
            .into_iter()
            .filter(|n| !registry.is_loaded(n))
            .collect();
        if !available.is_empty() {
            lines.push(format!("Available: {}", available.join(", ")));
        }
        inv.reply(lines.join("\n")).await
    }

    async fn load(&self, inv: Invocation) -> HandlerResult {
        let name = inv.args.str("name").unwrap_or_default();
        let text = match inv.registry().load(name).await {
            Ok(()) => format!("Loaded {name}."),
            Err(e) => format!("Failed to load {name}: {e}"),
        };
        inv.reply(text).await
    }

    async fn unload(&self, inv: Invocation) -> HandlerResult {
        let name = inv.args.str("name").unwrap_or_default();
        let text = if name == ADMIN_PLUGIN {
            "The admin plugin cannot unload itself.".to_owned()
        } else if inv.registry().unload(name).await {
            format!("Unloaded {name}.")
        } else {
            format!("{name} is not loaded.")
        };
        inv.reply(text).await
    }

    async fn reload(&self, inv: Invocation) -> HandlerResult {
        let name = inv.args.str("name").unwrap_or_default();
        let text = match inv.registry().reload(name).await {
            Ok(()) => format!("Reloaded {name}."),
            Err(e) => format!("Failed to reload {name}: {e}"),
        };
        inv.reply(text).await
    }

    async fn save(&self, inv: Invocation) -> HandlerResult {
        let report = inv.registry().save_all().await;
        let text = if report.is_clean() {
            format!("Saved {} plugin(s).", report.saved.len())
        } else {
            format!(
                "Saved {} plugin(s); failed: {}.",
                report.saved.len(),
                report.failed.join(", ")
            )
        };
        inv.reply(text).await
    }

    async fn help(&self, inv: Invocation) -> HandlerResult {
        let registry = inv.registry();
        let prefix = inv.ctx().prefix();
        let query = inv.args.str("command").unwrap_or_default().trim();

        if query.is_empty() {
            return inv.reply(render_index(prefix, &registry.loaded())).await;
        }

        let mut words: Vec<&str> = query.split_whitespace().collect();
        if let Some(first) = words.first_mut() {
            let word: &str = *first;
            *first = word.strip_prefix(prefix).unwrap_or(word);
        }
        let text = match registry.find_command(&words) {
            Some((plugin, id, _)) if plugin.commands.get(id).is_some_and(|c| !c.hidden) => {
                render_command(prefix, &plugin.commands, id)
            }
            _ => format!("No command named '{query}'."),
        };
        inv.reply(text).await
    }
}
