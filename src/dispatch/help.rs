//! Usage text.

use crate::command::{CommandId, CommandSet};
use crate::plugin::LoadedPlugin;

/// `"{prefix}{path} {usage}"`, without trailing space.
pub fn usage_line(prefix: &str, set: &CommandSet, id: CommandId) -> String {
    let path = set.path(id);
    match set.get(id) {
        Some(cmd) if !cmd.usage.is_empty() => format!("{prefix}{path} {}", cmd.usage),
        _ => format!("{prefix}{path}"),
    }
}

/// Usage line, description and visible sub-commands of one command.
pub fn render_command(prefix: &str, set: &CommandSet, id: CommandId) -> String {
    let mut out = usage_line(prefix, set, id);
    let Some(cmd) = set.get(id) else {
        return out;
    };
    if !cmd.description.is_empty() {
        out.push('\n');
        out.push_str(&cmd.description);
    }
    let subs: Vec<&str> = cmd
        .sub_commands
        .iter()
        .filter_map(|s| set.get(*s))
        .filter(|s| !s.hidden)
        .map(|s| s.name.as_str())
        .collect();
    if !subs.is_empty() {
        out.push_str("\nSub-commands: ");
        out.push_str(&subs.join(", "));
    }
    out
}

/// One line per plugin listing its visible top-level commands.
pub fn render_index(prefix: &str, plugins: &[std::sync::Arc<LoadedPlugin>]) -> String {
    let mut lines = Vec::new();
    for plugin in plugins {
        let names: Vec<String> = plugin
            .commands
            .top_level()
            .iter()
            .filter_map(|id| plugin.commands.get(*id))
            .filter(|cmd| !cmd.hidden)
            .map(|cmd| format!("{prefix}{}", cmd.name))
            .collect();
        if !names.is_empty() {
            lines.push(format!("{}: {}", plugin.name, names.join(" ")));
        }
    }
    if lines.is_empty() {
        return "No commands available.".to_owned();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Registrar;
    use crate::dispatch::Invocation;
    use crate::error::HandlerResult;
    use plugbot_args::{Coercion, Param};

    async fn noop(_inv: Invocation) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn test_render_command() {
        let mut reg = Registrar::new("tags");
        let tag = reg
            .command("tag", noop)
            .description("Show a tag")
            .param(Param::required("name", Coercion::Lower))
            .finish()
            .unwrap();
        let add = reg
            .command("add", noop)
            .parent(tag)
            .param(Param::required("name", Coercion::Lower))
            .param(Param::required("content", Coercion::Rest))
            .finish()
            .unwrap();
        reg.command("purge", noop).parent(tag).hidden().finish().unwrap();
        let set = reg.into_commands();

        assert_eq!(
            render_command("!", &set, tag),
            "!tag <name>\nShow a tag\nSub-commands: add"
        );
        assert_eq!(usage_line("!", &set, add), "!tag add <name> <content...>");
    }

    #[test]
    fn test_usage_without_params() {
        let mut reg = Registrar::new("p");
        let ping = reg.command("ping", noop).finish().unwrap();
        let set = reg.into_commands();
        assert_eq!(render_command("?", &set, ping), "?ping");
    }
}
