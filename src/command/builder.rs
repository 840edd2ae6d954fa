//! Registration surface for plugin authors.
//!
//! ```ignore
//! fn register(self: Arc<Self>, reg: &mut Registrar) -> Result<(), RegistrationError> {
//!     let tag = reg
//!         .command("tag", bind(&self, |me, inv| async move { me.show(inv).await }))
//!         .description("Show a tag")
//!         .param(Param::required("name", Coercion::Lower))
//!         .finish()?;
//!
//!     reg.command("add", bind(&self, |me, inv| async move { me.add(inv).await }))
//!         .parent(tag)
//!         .param(Param::required("name", Coercion::Lower))
//!         .param(Param::required("content", Coercion::Rest))
//!         .finish()?;
//!     Ok(())
//! }
//! ```
//!
//! All invariants (unique sibling names, known parent and fallback,
//! parameter ordering) are checked in [`CommandBuilder::finish`], so a
//! plugin either registers completely or fails to load.

use super::handler::CommandHandler;
use super::set::{Command, CommandId, CommandSet};
use crate::error::RegistrationError;
use plugbot_args::Param;
use std::sync::Arc;
use tracing::trace;

/// Collects the commands of one plugin during load.
pub struct Registrar {
    plugin: String,
    set: CommandSet,
}

impl Registrar {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            set: CommandSet::default(),
        }
    }

    /// Name of the plugin being registered.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Commands registered so far.
    pub fn commands(&self) -> &CommandSet {
        &self.set
    }

    /// Start declaring a command.
    pub fn command<H>(&mut self, name: &str, handler: H) -> CommandBuilder<'_>
    where
        H: CommandHandler + 'static,
    {
        CommandBuilder {
            reg: self,
            name: name.to_lowercase(),
            aliases: Vec::new(),
            usage: None,
            description: String::new(),
            params: Vec::new(),
            hidden: false,
            error: None,
            owner_only: false,
            parent: None,
            fallback: None,
            handler: Arc::new(handler),
        }
    }

    pub(crate) fn into_commands(self) -> CommandSet {
        self.set
    }
}

/// Options for one command. Nothing is registered until
/// [`finish`](Self::finish).
#[must_use = "a command is only registered by calling finish()"]
pub struct CommandBuilder<'r> {
    reg: &'r mut Registrar,
    name: String,
    aliases: Vec<String>,
    usage: Option<String>,
    description: String,
    params: Vec<Param>,
    hidden: bool,
    error: Option<String>,
    owner_only: bool,
    parent: Option<CommandId>,
    fallback: Option<CommandId>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandBuilder<'_> {
    /// Another name for this command.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    /// Parameter template shown after the command path. Generated from the
    /// parameters when not set.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Keep this command out of help listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Message sent instead of the generic notice when the command rejects
    /// an invocation.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Restrict to the bot owner.
    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    /// Register as a sub-command of `parent`.
    pub fn parent(mut self, parent: CommandId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Continue argument resolution against `target` when this command's
    /// parameters cannot be satisfied. `target` must already be registered.
    pub fn fallback(mut self, target: CommandId) -> Self {
        self.fallback = Some(target);
        self
    }

    /// Validate and register the command.
    pub fn finish(self) -> Result<CommandId, RegistrationError> {
        let Self {
            reg,
            name,
            aliases,
            usage,
            description,
            params,
            hidden,
            error,
            owner_only,
            parent,
            fallback,
            handler,
        } = self;

        for word in std::iter::once(&name).chain(aliases.iter()) {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                return Err(RegistrationError::InvalidName(word.clone()));
            }
        }
        if let Some(p) = parent
            && reg.set.get(p).is_none()
        {
            return Err(RegistrationError::UnknownParent(p.index()));
        }
        if let Some(f) = fallback
            && reg.set.get(f).is_none()
        {
            return Err(RegistrationError::UnknownFallback(f.index()));
        }
        check_params(&name, &params)?;
        check_unique(&reg.set, parent, &name, &aliases)?;

        let usage = usage.unwrap_or_else(|| {
            params
                .iter()
                .map(Param::usage)
                .collect::<Vec<_>>()
                .join(" ")
        });

        let id = reg.set.push(Command {
            name,
            aliases,
            usage,
            description,
            params,
            hidden,
            error,
            owner_only,
            parent,
            sub_commands: Vec::new(),
            fallback,
            handler,
        });
        trace!(plugin = %reg.plugin, path = %reg.set.path(id), "Registered command");
        Ok(id)
    }
}

fn check_params(command: &str, params: &[Param]) -> Result<(), RegistrationError> {
    let mut seen_optional = false;
    for (i, param) in params.iter().enumerate() {
        if param.rule.is_rest() && i + 1 != params.len() {
            return Err(RegistrationError::RestNotLast {
                command: command.to_owned(),
                param: param.name.clone(),
            });
        }
        if param.is_required() && seen_optional {
            return Err(RegistrationError::RequiredAfterOptional {
                command: command.to_owned(),
                param: param.name.clone(),
            });
        }
        seen_optional |= !param.is_required();
    }
    Ok(())
}

fn check_unique(
    set: &CommandSet,
    parent: Option<CommandId>,
    name: &str,
    aliases: &[String],
) -> Result<(), RegistrationError> {
    let scope = || match parent {
        Some(p) => format!("'{}'", set.path(p)),
        None => "top level".to_owned(),
    };
    let new_names: Vec<&str> = std::iter::once(name)
        .chain(aliases.iter().map(String::as_str))
        .collect();

    for (i, word) in new_names.iter().enumerate() {
        let repeated = new_names[..i].contains(word);
        let taken = set
            .siblings(parent)
            .iter()
            .filter_map(|id| set.get(*id))
            .any(|sibling| sibling.answers_to(word));
        if repeated || taken {
            return Err(RegistrationError::DuplicateName {
                name: (*word).to_owned(),
                scope: scope(),
            });
        }
    }
    Ok(())
}
