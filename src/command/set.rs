//! Per-plugin command arena.
//!
//! All commands a plugin registers, including nested sub-commands, live in
//! one `CommandSet` and refer to each other by [`CommandId`]. The set is
//! built once by a [`Registrar`](super::Registrar) and never mutated after
//! the plugin is published; a reload builds a fresh one.

use super::handler::CommandHandler;
use plugbot_args::Param;
use std::fmt;
use std::sync::Arc;

/// Index of a command inside its plugin's [`CommandSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) usize);

impl CommandId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One invocable action.
pub struct Command {
    /// Canonical name, lower-case.
    pub name: String,
    /// Extra names, lower-case. Share the sibling namespace with `name`.
    pub aliases: Vec<String>,
    /// Parameter template shown after the command path.
    pub usage: String,
    /// Help text.
    pub description: String,
    /// Declared parameters, in order.
    pub params: Vec<Param>,
    /// Left out of help listings.
    pub hidden: bool,
    /// Custom rejection message.
    pub error: Option<String>,
    /// Only the owner may invoke it.
    pub owner_only: bool,
    /// Enclosing command, `None` at top level.
    pub parent: Option<CommandId>,
    /// Nested commands, in registration order.
    pub sub_commands: Vec<CommandId>,
    /// Where argument resolution continues when `params` cannot be
    /// satisfied.
    pub fallback: Option<CommandId>,
    pub(crate) handler: Arc<dyn CommandHandler>,
}

impl Command {
    /// `true` if `word` (already lower-cased) names this command.
    pub fn answers_to(&self, word: &str) -> bool {
        self.name == word || self.aliases.iter().any(|a| a == word)
    }

    /// The name and all aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("usage", &self.usage)
            .field("params", &self.params)
            .field("hidden", &self.hidden)
            .field("owner_only", &self.owner_only)
            .field("parent", &self.parent)
            .field("sub_commands", &self.sub_commands)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// All commands of one plugin.
#[derive(Debug, Default)]
pub struct CommandSet {
    commands: Vec<Command>,
    top_level: Vec<CommandId>,
}

impl CommandSet {
    pub(crate) fn push(&mut self, command: Command) -> CommandId {
        let id = CommandId(self.commands.len());
        let parent = command.parent;
        self.commands.push(command);
        match parent {
            Some(p) => self.commands[p.0].sub_commands.push(id),
            None => self.top_level.push(id),
        }
        id
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.0)
    }

    /// Number of commands, nested ones included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Ids of the direct children of `parent`, or of the top level.
    pub fn siblings(&self, parent: Option<CommandId>) -> &[CommandId] {
        match parent.and_then(|p| self.get(p)) {
            Some(cmd) => &cmd.sub_commands,
            None => &self.top_level,
        }
    }

    /// Top-level command answering to `word`.
    pub fn find_top(&self, word: &str) -> Option<CommandId> {
        self.find_in(&self.top_level, word)
    }

    /// Sub-command of `parent` answering to `word`.
    pub fn find_sub(&self, parent: CommandId, word: &str) -> Option<CommandId> {
        let cmd = self.get(parent)?;
        self.find_in(&cmd.sub_commands, word)
    }

    fn find_in(&self, ids: &[CommandId], word: &str) -> Option<CommandId> {
        ids.iter()
            .copied()
            .find(|id| self.commands[id.0].answers_to(word))
    }

    /// Walk `words` from the top level, descending through sub-commands as
    /// far as they match. Returns the deepest match and how many words it
    /// used, or `None` if the first word matches nothing.
    pub fn walk<'w>(&self, words: impl IntoIterator<Item = &'w str>) -> Option<(CommandId, usize)> {
        let mut words = words.into_iter();
        let mut id = self.find_top(&words.next()?.to_lowercase())?;
        let mut used = 1;
        for word in words {
            match self.find_sub(id, &word.to_lowercase()) {
                Some(sub) => {
                    id = sub;
                    used += 1;
                }
                None => break,
            }
        }
        Some((id, used))
    }

    /// Top-level command ids, in registration order.
    pub fn top_level(&self) -> &[CommandId] {
        &self.top_level
    }

    /// Every name (and alias) reachable at top level.
    pub fn top_level_names(&self) -> Vec<String> {
        self.top_level
            .iter()
            .flat_map(|id| self.commands[id.0].names().map(str::to_owned))
            .collect()
    }

    /// Full space-separated path of canonical names, e.g. `"tag add"`.
    pub fn path(&self, id: CommandId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(cur) = cursor.and_then(|c| self.get(c)) {
            parts.push(cur.name.as_str());
            cursor = cur.parent;
        }
        parts.reverse();
        parts.join(" ")
    }

    /// Full paths of every command, nested ones included.
    pub fn all_paths(&self) -> Vec<String> {
        (0..self.commands.len())
            .map(|i| self.path(CommandId(i)))
            .collect()
    }
}
