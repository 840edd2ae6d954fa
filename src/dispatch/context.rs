//! Dispatch-time state and the handler's view of an invocation.

use crate::error::HandlerError;
use crate::plugin::{PluginContext, PluginRegistry};
use crate::transport::{ChannelId, InboundMessage, UserId};
use plugbot_args::{Args, Tokens, tokenize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Everything the dispatcher knows about one inbound message.
///
/// Created when the message arrives and dropped once dispatch reaches a
/// terminal state.
#[derive(Debug)]
pub struct DispatchContext {
    pub message: InboundMessage,
    pub tokens: Tokens,
    pub is_owner: bool,
}

impl DispatchContext {
    pub fn new(message: InboundMessage, is_owner: bool) -> Self {
        let tokens = tokenize(&message.text);
        Self {
            message,
            tokens,
            is_owner,
        }
    }

    /// The command name if the first token carries `prefix`.
    pub fn command_word(&self, prefix: &str) -> Option<&str> {
        let first = self.tokens.first()?.as_str();
        first.strip_prefix(prefix).filter(|rest| !rest.is_empty())
    }

    /// Words used to walk the command table: the command name followed by
    /// every later token.
    pub fn words<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        std::iter::once(name)
            .chain(self.tokens.iter().skip(1).map(|t| t.as_str()))
            .collect()
    }
}

/// One running command.
///
/// Owned by the handler task. Replies go to the channel the command came
/// from.
pub struct Invocation {
    /// Coerced arguments.
    pub args: Args,
    /// The message that triggered the command.
    pub message: InboundMessage,
    /// Full command path, e.g. `"tag add"`.
    pub path: String,
    /// Correlates log lines of this invocation.
    pub id: Uuid,
    is_owner: bool,
    ctx: PluginContext,
}

impl Invocation {
    pub(crate) fn new(
        args: Args,
        message: InboundMessage,
        path: String,
        is_owner: bool,
        ctx: PluginContext,
    ) -> Self {
        Self {
            args,
            message,
            path,
            id: Uuid::new_v4(),
            is_owner,
            ctx,
        }
    }

    pub fn author(&self) -> &UserId {
        &self.message.author
    }

    pub fn channel(&self) -> &ChannelId {
        &self.message.channel
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    /// The owning plugin's context.
    pub fn ctx(&self) -> &PluginContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        self.ctx.registry()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        self.ctx.cancellation()
    }

    /// Send `text` to the channel the command came from.
    pub async fn reply(&self, text: impl AsRef<str>) -> Result<(), HandlerError> {
        self.ctx.send(&self.message.channel, text.as_ref()).await?;
        Ok(())
    }

    /// Wait for the invoking user's next message in the same channel.
    pub async fn wait_for_reply(&self, timeout: Duration) -> Result<InboundMessage, HandlerError> {
        let author = self.message.author.clone();
        let channel = self.message.channel.clone();
        self.ctx
            .wait_for(
                move |m| m.author == author && m.channel == channel,
                timeout,
            )
            .await
    }

    /// Wait for the next message matching `filter`.
    pub async fn wait_for<F>(&self, filter: F, timeout: Duration) -> Result<InboundMessage, HandlerError>
    where
        F: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
    {
        self.ctx.wait_for(filter, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_word() {
        let ctx = DispatchContext::new(InboundMessage::new("u", "c", "!roll 2 d6"), false);
        assert_eq!(ctx.command_word("!"), Some("roll"));
        assert_eq!(ctx.words("roll"), vec!["roll", "2", "d6"]);
        assert_eq!(ctx.command_word("?"), None);

        let bare = DispatchContext::new(InboundMessage::new("u", "c", "! roll"), false);
        assert_eq!(bare.command_word("!"), None);

        let empty = DispatchContext::new(InboundMessage::new("u", "c", "   "), false);
        assert!(empty.tokens.is_empty());
        assert_eq!(empty.command_word("!"), None);
    }

    #[test]
    fn test_multi_char_prefix() {
        let ctx = DispatchContext::new(InboundMessage::new("u", "c", "bot:help me"), false);
        assert_eq!(ctx.command_word("bot:"), Some("help"));
    }
}
